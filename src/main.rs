//! cwav - Compressed Waveform (.cwav) Tool

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use cwav::audio::{AudioSink, CpalOutput, PlaybackEvent};
use cwav::container::ContainerReader;
use cwav::dispatch::Route;
use cwav::ui::{ConsoleNotifier, run_interactive};
use cwav::{App, Args, Command, Config, Dispatch, Notifier, init_logging};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns whether the requested operation succeeded
fn run(args: Args) -> anyhow::Result<bool> {
    let config = Config::from_args(&args).context("Invalid configuration")?;
    if config.verbose {
        println!("{}", cwav::get_library_info());
    }

    let mut app = App::new(config, CpalOutput::new(), ConsoleNotifier);

    let ok = match args.command {
        None => {
            run_interactive(&mut app).context("Interactive session failed")?;
            true
        }
        Some(Command::Pack { source, output }) => {
            let picked = source.to_string_lossy();
            match app.choose(Some(picked.as_ref()), Route::Package) {
                Dispatch::Package { source, suggested } => package(&mut app, &source, output, suggested),
                _ => false,
            }
        }
        Some(Command::Play { container }) => {
            let picked = container.to_string_lossy();
            app.choose(Some(picked.as_ref()), Route::Play) == Dispatch::Playing && wait_for_playback(&mut app)
        }
        Some(Command::Open { path, output }) => match app.open(&path) {
            Dispatch::Package { source, suggested } => package(&mut app, &source, output, suggested),
            Dispatch::Playing => wait_for_playback(&mut app),
            Dispatch::Cancelled => true,
            Dispatch::Rejected => false,
        },
        Some(Command::Info { container }) => show_info(&mut app, &container),
    };

    Ok(ok)
}

fn package<S: AudioSink, N: Notifier>(
    app: &mut App<S, N>,
    source: &Path,
    output: Option<PathBuf>,
    suggested: PathBuf,
) -> bool {
    let destination = output.unwrap_or(suggested);
    app.create_container(source, Some(&destination)).is_some()
}

fn wait_for_playback<S: AudioSink, N: Notifier>(app: &mut App<S, N>) -> bool {
    !matches!(app.wait_for_completion(), Some(PlaybackEvent::Failed { .. }))
}

fn show_info<S: AudioSink, N: Notifier>(app: &mut App<S, N>, container: &Path) -> bool {
    let reader = ContainerReader::from_config(app.config());
    match reader.list_entries(container) {
        Ok(entries) => {
            println!("{}: {} entr{}", container.display(), entries.len(), if entries.len() == 1 { "y" } else { "ies" });
            for entry in &entries {
                println!(
                    "  {}  {} -> {} bytes  crc32 {:08x}",
                    entry.name, entry.size, entry.compressed_size, entry.crc32
                );
            }
            true
        }
        Err(e) => {
            app.notifier_mut().error(e.title(), &e.to_string());
            false
        }
    }
}
