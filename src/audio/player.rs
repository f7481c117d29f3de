//! Container playback

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::output::{AudioSink, SinkStatus};
use super::wav::DecodedAudio;
use crate::config::Config;
use crate::container::ContainerReader;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loaded,
    Playing,
    Finished,
    Failed,
}

/// One play invocation
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub container: PathBuf,
    pub entry_name: String,
    pub duration: Duration,
    state: SessionState,
    started_at: Option<Instant>,
}

impl PlaybackSession {
    fn loaded(container: &Path, entry_name: String, audio: &DecodedAudio) -> Self {
        Self {
            container: container.to_path_buf(),
            entry_name,
            duration: Duration::from_secs_f64(audio.duration().max(0.0)),
            state: SessionState::Loaded,
            started_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}

/// Reported once per session when it leaves `Playing`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Finished { entry_name: String },
    Failed { message: String },
}

pub struct Player<S: AudioSink> {
    reader: ContainerReader,
    sink: S,
    volume: f32,
    session: Option<PlaybackSession>,
}

impl<S: AudioSink> Player<S> {
    pub fn new(config: &Config, sink: S) -> Self {
        Self {
            reader: ContainerReader::from_config(config),
            sink,
            volume: config.volume(),
            session: None,
        }
    }

    /// Extract the first audio entry of `container`, decode it and start playback.
    ///
    /// Nothing reaches the output unless extraction and decoding succeed. A
    /// started request replaces any session still playing. When the output
    /// refuses to start, the previous session keeps playing only if the output
    /// still reports it; otherwise it is marked `Failed` without an event.
    pub fn play(&mut self, container: &Path) -> Result<&PlaybackSession> {
        let entry = self.reader.extract_audio(container)?;
        let audio = DecodedAudio::from_bytes(&entry.bytes)?;
        let mut session = PlaybackSession::loaded(container, entry.name, &audio);
        debug!(
            "Loaded '{}': {} Hz, {} ch, {}, {:.2}s",
            session.entry_name,
            audio.sample_rate(),
            audio.channels(),
            audio.format().name(),
            audio.duration()
        );

        if let Some(previous) = self.session.as_ref().filter(|s| s.is_playing()) {
            info!("Replacing playback of '{}'", previous.entry_name);
        }

        if let Err(e) = self.sink.start(&audio, self.volume) {
            self.settle_previous();
            return Err(e);
        }
        session.state = SessionState::Playing;
        session.started_at = Some(Instant::now());
        info!("Playing '{}' from {}", session.entry_name, container.display());

        Ok(&*self.session.insert(session))
    }

    /// Check the output once; returns an event when the session just ended
    pub fn poll(&mut self) -> Option<PlaybackEvent> {
        let session = self.session.as_mut().filter(|s| s.is_playing())?;
        match self.sink.status() {
            SinkStatus::Playing => None,
            SinkStatus::Idle => {
                session.state = SessionState::Finished;
                info!("Playback of '{}' finished after {:.2}s", session.entry_name, session.elapsed().as_secs_f64());
                Some(PlaybackEvent::Finished { entry_name: session.entry_name.clone() })
            }
            SinkStatus::Failed(message) => {
                session.state = SessionState::Failed;
                warn!("Playback of '{}' failed: {}", session.entry_name, message);
                Some(PlaybackEvent::Failed { message })
            }
        }
    }

    fn settle_previous(&mut self) {
        let Some(previous) = self.session.as_mut().filter(|s| s.is_playing()) else {
            return;
        };
        if self.sink.status() != SinkStatus::Playing {
            warn!("Output lost while replacing '{}'", previous.entry_name);
            previous.state = SessionState::Failed;
        }
    }

    /// Poll every `interval` until the current session ends
    pub fn wait(&mut self, interval: Duration) -> Option<PlaybackEvent> {
        while self.is_playing() {
            if let Some(event) = self.poll() {
                return Some(event);
            }
            std::thread::sleep(interval);
        }
        None
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_playing())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::container::Packager;
    use crate::error::CwavError;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Sink that reports `Playing` for a fixed number of polls
    #[derive(Default)]
    pub(crate) struct ScriptedSink {
        pub starts: usize,
        pub last_frames: usize,
        pub polls_until_idle: usize,
        pub fail_with: Option<String>,
        /// Refuse the n-th start (1-based)
        pub refuse_start: Option<usize>,
        /// Drop the current output before a refused start
        pub stop_on_refusal: bool,
        remaining: Cell<usize>,
    }

    impl ScriptedSink {
        pub(crate) fn with_polls(polls: usize) -> Self {
            Self { polls_until_idle: polls, ..Default::default() }
        }
    }

    impl AudioSink for ScriptedSink {
        fn start(&mut self, audio: &DecodedAudio, _volume: f32) -> Result<()> {
            self.starts += 1;
            if self.refuse_start == Some(self.starts) {
                if self.stop_on_refusal {
                    self.remaining.set(0);
                }
                return Err(CwavError::playback("No output device available"));
            }
            self.last_frames = audio.total_frames();
            self.remaining.set(self.polls_until_idle);
            Ok(())
        }

        fn status(&self) -> SinkStatus {
            if let Some(message) = &self.fail_with {
                return SinkStatus::Failed(message.clone());
            }
            match self.remaining.get() {
                0 => SinkStatus::Idle,
                n => {
                    self.remaining.set(n - 1);
                    SinkStatus::Playing
                }
            }
        }
    }

    pub(crate) fn make_container(dir: &Path, stem: &str, frames: usize) -> PathBuf {
        let source = dir.join(format!("{}.wav", stem));
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&source, spec).unwrap();
        for i in 0..frames {
            writer.write_sample((i as i16).wrapping_mul(97)).unwrap();
        }
        writer.finalize().unwrap();
        Packager::new(&Config::default())
            .pack(&source, &dir.join(format!("{}.cwav", stem)))
            .unwrap()
            .destination
    }

    #[test]
    fn test_play_until_finished() {
        let dir = TempDir::new().unwrap();
        let container = make_container(dir.path(), "song", 800);

        let mut player = Player::new(&Config::default(), ScriptedSink::with_polls(2));
        let session = player.play(&container).unwrap();
        assert_eq!(session.entry_name, "song.wav");
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.duration, Duration::from_millis(100));
        assert_eq!(player.sink().last_frames, 800);

        assert_eq!(player.poll(), None);
        assert_eq!(player.poll(), None);
        assert_eq!(
            player.poll(),
            Some(PlaybackEvent::Finished { entry_name: "song.wav".into() })
        );
        assert_eq!(player.session().unwrap().state(), SessionState::Finished);
        // Reported once
        assert_eq!(player.poll(), None);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_invalid_container_starts_nothing() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.cwav");
        std::fs::write(&broken, b"not a zip at all").unwrap();

        let mut player = Player::new(&Config::default(), ScriptedSink::default());
        let err = player.play(&broken).unwrap_err();
        assert_eq!(err.to_string(), "Invalid .cwav file.");
        assert_eq!(player.sink().starts, 0);
        assert!(player.session().is_none());
    }

    #[test]
    fn test_undecodable_entry_starts_nothing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("fake.wav");
        std::fs::write(&source, b"plain text pretending to be audio").unwrap();
        let container = Packager::new(&Config::default())
            .pack(&source, &dir.path().join("fake.cwav"))
            .unwrap()
            .destination;

        let mut player = Player::new(&Config::default(), ScriptedSink::default());
        assert!(matches!(player.play(&container), Err(CwavError::Audio { .. })));
        assert_eq!(player.sink().starts, 0);
    }

    #[test]
    fn test_new_request_replaces_session() {
        let dir = TempDir::new().unwrap();
        let first = make_container(dir.path(), "first", 100);
        let second = make_container(dir.path(), "second", 200);

        let mut player = Player::new(&Config::default(), ScriptedSink::with_polls(5));
        player.play(&first).unwrap();
        assert_eq!(player.poll(), None);
        player.play(&second).unwrap();

        assert_eq!(player.sink().starts, 2);
        assert_eq!(player.session().unwrap().entry_name, "second.wav");
        assert_eq!(
            player.wait(Duration::from_millis(1)),
            Some(PlaybackEvent::Finished { entry_name: "second.wav".into() })
        );
    }

    #[test]
    fn test_refused_start_after_output_stopped() {
        let dir = TempDir::new().unwrap();
        let first = make_container(dir.path(), "first", 100);
        let second = make_container(dir.path(), "second", 200);

        let sink = ScriptedSink {
            refuse_start: Some(2),
            stop_on_refusal: true,
            ..ScriptedSink::with_polls(5)
        };
        let mut player = Player::new(&Config::default(), sink);
        player.play(&first).unwrap();
        assert!(matches!(player.play(&second), Err(CwavError::Playback { .. })));

        let session = player.session().unwrap();
        assert_eq!(session.entry_name, "first.wav");
        assert_eq!(session.state(), SessionState::Failed);
        assert!(!player.is_playing());
        // No completion for audio that was cut off
        assert_eq!(player.poll(), None);
    }

    #[test]
    fn test_refused_start_keeps_current_playback() {
        let dir = TempDir::new().unwrap();
        let first = make_container(dir.path(), "first", 100);
        let second = make_container(dir.path(), "second", 200);

        let sink = ScriptedSink {
            refuse_start: Some(2),
            ..ScriptedSink::with_polls(3)
        };
        let mut player = Player::new(&Config::default(), sink);
        player.play(&first).unwrap();
        assert!(player.play(&second).is_err());

        assert!(player.is_playing());
        assert_eq!(player.sink().last_frames, 100);
        assert_eq!(
            player.wait(Duration::from_millis(1)),
            Some(PlaybackEvent::Finished { entry_name: "first.wav".into() })
        );
    }

    #[test]
    fn test_output_failure_ends_session() {
        let dir = TempDir::new().unwrap();
        let container = make_container(dir.path(), "song", 10);

        let sink = ScriptedSink {
            fail_with: Some("stream invalidated".into()),
            ..ScriptedSink::with_polls(10)
        };
        let mut player = Player::new(&Config::default(), sink);
        player.play(&container).unwrap();
        assert_eq!(
            player.poll(),
            Some(PlaybackEvent::Failed { message: "stream invalidated".into() })
        );
        assert_eq!(player.session().unwrap().state(), SessionState::Failed);
        assert_eq!(player.wait(Duration::from_millis(1)), None);
    }
}
