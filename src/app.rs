//! Application controller shared by the interactive front end and the command line
//!
//! Turns packager and player results into user-facing notifications. Errors
//! end the triggering operation only; the controller stays usable.

use std::path::{Path, PathBuf};

use log::debug;

use crate::audio::{AudioSink, PlaybackEvent, Player};
use crate::config::Config;
use crate::container::{PackageReport, Packager, default_destination};
use crate::dispatch::{Route, normalize_dropped_path, route};
use crate::error::{CwavError, Result};

/// Presentation seam: status dialogs
pub trait Notifier {
    fn info(&mut self, title: &str, message: &str);
    fn error(&mut self, title: &str, message: &str);
}

/// What happened to a picked or dropped path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Empty selection, nothing done
    Cancelled,
    /// Audio source accepted; the caller must now pick a destination
    Package { source: PathBuf, suggested: PathBuf },
    /// Container playback started
    Playing,
    /// Error already shown to the user
    Rejected,
}

pub struct App<S: AudioSink, N: Notifier> {
    config: Config,
    packager: Packager,
    player: Player<S>,
    notifier: N,
}

impl<S: AudioSink, N: Notifier> App<S, N> {
    pub fn new(config: Config, sink: S, notifier: N) -> Self {
        Self {
            packager: Packager::new(&config),
            player: Player::new(&config, sink),
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn player(&self) -> &Player<S> {
        &self.player
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Drop target: route any path by its extension
    pub fn open(&mut self, raw: &str) -> Dispatch {
        match normalize_dropped_path(raw) {
            Some(path) => self.dispatch(path, None),
            None => Dispatch::Cancelled,
        }
    }

    /// Picker restricted to one kind of file; `None` means the picker was cancelled
    pub fn choose(&mut self, picked: Option<&str>, expected: Route) -> Dispatch {
        match picked.and_then(normalize_dropped_path) {
            Some(path) => self.dispatch(path, Some(expected)),
            None => {
                debug!("Selection cancelled");
                Dispatch::Cancelled
            }
        }
    }

    /// Package `source`; a `None` destination means the save dialog was cancelled
    pub fn create_container(&mut self, source: &Path, destination: Option<&Path>) -> Option<PackageReport> {
        let Some(destination) = destination else {
            debug!("Destination selection cancelled");
            return None;
        };

        match self.packager.pack(source, destination) {
            Ok(report) => {
                let message = format!("Created: {}", report.destination.display());
                self.notifier.info("Success", &message);
                Some(report)
            }
            Err(e) => {
                let message = format!("Failed to create .{}:\n{}", self.config.container_extension(), e);
                self.notifier.error("Error", &message);
                None
            }
        }
    }

    pub fn play_container(&mut self, container: &Path) -> bool {
        match self.player.play(container) {
            Ok(_) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// One completion check; shows the outcome when the session just ended
    pub fn tick(&mut self) -> Option<PlaybackEvent> {
        let event = self.player.poll()?;
        self.announce(&event);
        Some(event)
    }

    /// Block until the current session ends, checking every poll interval
    pub fn wait_for_completion(&mut self) -> Option<PlaybackEvent> {
        let event = self.player.wait(self.config.poll_interval())?;
        self.announce(&event);
        Some(event)
    }

    /// Suggested destination for packaging `source`
    pub fn suggest_destination(&self, source: &Path) -> PathBuf {
        default_destination(source, self.config.container_extension())
    }

    fn dispatch(&mut self, path: PathBuf, expected: Option<Route>) -> Dispatch {
        match self.classify(&path, expected) {
            Ok(Route::Package) => {
                let suggested = self.suggest_destination(&path);
                Dispatch::Package { source: path, suggested }
            }
            Ok(Route::Play) => {
                if self.play_container(&path) {
                    Dispatch::Playing
                } else {
                    Dispatch::Rejected
                }
            }
            Err(e) => {
                self.report(&e);
                Dispatch::Rejected
            }
        }
    }

    fn classify(&self, path: &Path, expected: Option<Route>) -> Result<Route> {
        let actual = route(path, &self.config)?;
        match expected {
            Some(expected) if expected != actual => {
                let ext = match expected {
                    Route::Package => self.config.source_extension(),
                    Route::Play => self.config.container_extension(),
                };
                Err(CwavError::UnexpectedFile { path: path.to_path_buf(), expected: ext.to_string() })
            }
            _ => Ok(actual),
        }
    }

    fn announce(&mut self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Finished { .. } => self.notifier.info("Done", "Playback finished."),
            PlaybackEvent::Failed { message } => {
                self.notifier.error("Playback Error", &format!("Playback failed: {}", message))
            }
        }
    }

    fn report(&mut self, err: &CwavError) {
        debug!("Operation failed: {:?}", err);
        self.notifier.error(err.title(), &err.to_string());
    }
}
