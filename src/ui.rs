//! Interactive terminal front end
//!
//! A menu with the three actions, optional drop target (a path dragged or
//! pasted into the terminal), and status lines in place of dialogs. Input is
//! read on a separate thread; the main loop wakes every poll interval to
//! check playback, so the menu stays responsive while audio plays.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use log::{debug, warn};

use crate::app::{App, Dispatch, Notifier};
use crate::audio::AudioSink;
use crate::dispatch::{Route, normalize_dropped_path};
use crate::error::Result;

/// Status dialogs rendered as terminal lines
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&mut self, title: &str, message: &str) {
        println!("[{}] {}", title, message);
    }

    fn error(&mut self, title: &str, message: &str) {
        eprintln!("[{}] {}", title, message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Menu,
    Source,
    Container,
    Destination { source: PathBuf, suggested: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(String),
    Closed,
}

/// Apply one line of input to the current prompt
pub fn handle_line<S: AudioSink, N: Notifier>(
    app: &mut App<S, N>,
    prompt: Prompt,
    line: &str,
    drop_target: bool,
) -> (Prompt, Flow) {
    let input = line.trim();
    match prompt {
        Prompt::Menu => match input {
            "" => (Prompt::Menu, Flow::Continue),
            "1" => (Prompt::Source, Flow::Continue),
            "2" => (Prompt::Container, Flow::Continue),
            "3" | "q" | "quit" => (Prompt::Menu, Flow::Quit),
            _ if drop_target => (after_dispatch(app.open(input)), Flow::Continue),
            _ => {
                app.notifier_mut().error("Error", &format!("Unknown choice: {}", input));
                (Prompt::Menu, Flow::Continue)
            }
        },
        Prompt::Source => {
            let picked = (!input.is_empty()).then_some(input);
            (after_dispatch(app.choose(picked, Route::Package)), Flow::Continue)
        }
        Prompt::Container => {
            let picked = (!input.is_empty()).then_some(input);
            (after_dispatch(app.choose(picked, Route::Play)), Flow::Continue)
        }
        Prompt::Destination { source, suggested } => {
            let destination = match input {
                "-" => None,
                "" => Some(suggested),
                other => Some(normalize_dropped_path(other).unwrap_or(suggested)),
            };
            app.create_container(&source, destination.as_deref());
            (Prompt::Menu, Flow::Continue)
        }
    }
}

fn after_dispatch(dispatch: Dispatch) -> Prompt {
    match dispatch {
        Dispatch::Package { source, suggested } => Prompt::Destination { source, suggested },
        Dispatch::Cancelled | Dispatch::Playing | Dispatch::Rejected => Prompt::Menu,
    }
}

fn render(prompt: &Prompt, drop_target: bool, ext: (&str, &str)) {
    let (source_ext, container_ext) = ext;
    match prompt {
        Prompt::Menu => {
            println!();
            println!("  1) Create .{} from .{}", container_ext, source_ext);
            println!("  2) Play .{} file", container_ext);
            println!("  3) Quit");
            if drop_target {
                println!("  Drag & drop .{} or .{} file here", source_ext, container_ext);
            }
            print!("> ");
        }
        Prompt::Source => print!("Path to .{} file (empty to cancel): ", source_ext),
        Prompt::Container => print!("Path to .{} file (empty to cancel): ", container_ext),
        Prompt::Destination { suggested, .. } => {
            print!("Save as [{}] ('-' to cancel): ", suggested.display())
        }
    }
    let _ = io::stdout().flush();
}

fn spawn_stdin_reader() -> Result<Receiver<Input>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(Input::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
            let _ = tx.send(Input::Closed);
        })?;
    Ok(rx)
}

/// Run the menu until the user quits or input ends (after any playback finishes)
pub fn run_interactive<S: AudioSink, N: Notifier>(app: &mut App<S, N>) -> Result<()> {
    let drop_target = app.config().interactive.drop_target && io::stdin().is_terminal();
    let interval = app.config().poll_interval();
    let source_ext = app.config().source_extension().to_string();
    let container_ext = app.config().container_extension().to_string();
    let ext = (source_ext.as_str(), container_ext.as_str());
    debug!("Interactive mode, drop target {}", if drop_target { "enabled" } else { "disabled" });

    println!("=== Compressed Waveform (.{}) Tool ===", ext.1);
    let input = spawn_stdin_reader()?;
    let mut prompt = Prompt::Menu;
    let mut closed = false;
    render(&prompt, drop_target, ext);

    loop {
        if closed {
            if !app.is_playing() {
                break;
            }
            thread::sleep(interval);
        } else {
            match input.recv_timeout(interval) {
                Ok(Input::Line(line)) => {
                    let (next, flow) = handle_line(app, prompt, &line, drop_target);
                    if flow == Flow::Quit {
                        break;
                    }
                    prompt = next;
                    render(&prompt, drop_target, ext);
                }
                Ok(Input::Closed) | Err(RecvTimeoutError::Disconnected) => {
                    closed = true;
                    println!();
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        if app.tick().is_some() && !closed {
            render(&prompt, drop_target, ext);
        }
    }

    Ok(())
}
