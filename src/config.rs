//! Configuration management for packaging and playback

use crate::error::{CwavError, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub container: ContainerConfig,
    pub playback: PlaybackConfig,
    pub interactive: InteractiveConfig,
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Extension of the uncompressed audio files, without the dot
    pub source_extension: String,
    /// Extension of the compressed containers, without the dot
    pub container_extension: String,
    /// Deflate level; `None` leaves the archive writer's default
    pub compression_level: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub poll_interval_ms: u64,
    pub volume: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveConfig {
    pub drop_target: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            source_extension: "wav".to_string(),
            container_extension: "cwav".to_string(),
            compression_level: None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            volume: 1.0,
        }
    }
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self { drop_target: true }
    }
}

impl Config {
    pub fn source_extension(&self) -> &str {
        &self.container.source_extension
    }

    pub fn container_extension(&self) -> &str {
        &self.container.container_extension
    }

    pub fn compression_level(&self) -> Option<i64> {
        self.container.compression_level
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.playback.poll_interval_ms)
    }

    pub fn volume(&self) -> f32 {
        self.playback.volume
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "cwav", about = "Compressed Waveform (.cwav) Tool", version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(short = 'c', long = "config", global = true, help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", global = true, help = "Enable verbose output mode")]
    pub verbose: bool,

    #[arg(long = "level", global = true, help = "Deflate compression level (0 - 9)")]
    pub compression_level: Option<i64>,

    #[arg(long = "volume", global = true, help = "Playback volume (0.0 - 1.0)")]
    pub volume: Option<f32>,

    #[arg(long = "no-drop", global = true, help = "Disable the drop target in interactive mode")]
    pub no_drop: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a .cwav container from a .wav file
    Pack {
        source: PathBuf,
        #[arg(short = 'o', long = "output", help = "Destination container path")]
        output: Option<PathBuf>,
    },
    /// Play the audio stored in a .cwav container
    Play { container: PathBuf },
    /// Pack or play depending on the file extension
    Open {
        path: String,
        #[arg(short = 'o', long = "output", help = "Destination container path when packing")]
        output: Option<PathBuf>,
    },
    /// List the entries of a .cwav container
    Info { container: PathBuf },
}

impl Config {
    /// Create config from command line arguments and config file
    pub fn from_args(args: &Args) -> Result<Self> {
        // File first, flags override
        let mut config = if let Some(config_path) = &args.config_file {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        if args.verbose {
            config.verbose = true;
        }
        if let Some(level) = args.compression_level {
            config.container.compression_level = Some(level);
        }
        if let Some(volume) = args.volume {
            config.playback.volume = volume;
        }
        if args.no_drop {
            config.interactive.drop_target = false;
        }

        config.validate()?;

        Ok(config)
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CwavError::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| CwavError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Validate configuration parameter validity
    pub fn validate(&self) -> Result<()> {
        for ext in [self.source_extension(), self.container_extension()] {
            if ext.is_empty() {
                return Err(CwavError::config("Extensions cannot be empty"));
            }
            if ext.contains('.') || ext.contains(std::path::is_separator) {
                return Err(CwavError::config(format!(
                    "Extension must be a bare name without dots or separators: {}", ext
                )));
            }
        }
        if self.source_extension().eq_ignore_ascii_case(self.container_extension()) {
            return Err(CwavError::config("Source and container extensions must differ"));
        }

        if let Some(level) = self.compression_level() {
            if !(0..=9).contains(&level) {
                return Err(CwavError::config("Compression level must be in range [0, 9]"));
            }
        }

        if self.playback.poll_interval_ms < 10 || self.playback.poll_interval_ms > 1000 {
            return Err(CwavError::config("Poll interval must be in range [10, 1000] ms"));
        }

        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err(CwavError::config("Volume must be in range [0.0, 1.0]"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source_extension(), "wav");
        assert_eq!(config.container_extension(), "cwav");
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.volume(), 1.0);
        assert!(config.interactive.drop_target);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.container.container_extension = "WAV".into();
        assert!(config.validate().is_err());
        config.container.container_extension = ".cwav".into();
        assert!(config.validate().is_err());
        config.container.container_extension = "cwav".into();

        config.container.compression_level = Some(12);
        assert!(config.validate().is_err());
        config.container.compression_level = Some(9);
        assert!(config.validate().is_ok());

        config.playback.poll_interval_ms = 0;
        assert!(config.validate().is_err());
        config.playback.poll_interval_ms = 100;

        config.playback.volume = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cwav.toml");
        std::fs::write(&config_path, "[playback]\npoll_interval_ms = 250\n").unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.playback.poll_interval_ms, 250);
        assert_eq!(config.volume(), 1.0);
        assert_eq!(config.container_extension(), "cwav");
    }

    #[test]
    fn test_args_override_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cwav.toml");
        std::fs::write(&config_path, "[container]\ncompression_level = 3\n").unwrap();

        let args = Args::parse_from([
            "cwav", "-c", config_path.to_str().unwrap(), "--level", "9", "--no-drop", "info", "a.cwav",
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.compression_level(), Some(9));
        assert!(!config.interactive.drop_target);
        assert!(matches!(args.command, Some(Command::Info { .. })));
    }

    #[test]
    fn test_unreadable_config_file() {
        let err = Config::from_file("/nonexistent/cwav.toml").unwrap_err();
        assert!(matches!(err, CwavError::Config { .. }));
    }
}
