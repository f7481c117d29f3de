//! Container reader

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use zip::ZipArchive;

use super::has_extension;
use crate::config::Config;
use crate::error::{CwavError, Result};

/// Central-directory record of one archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub crc32: u32,
}

/// Audio entry extracted fully into memory
#[derive(Debug, Clone)]
pub struct AudioEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ContainerReader {
    container_extension: String,
    source_extension: String,
}

impl ContainerReader {
    pub fn new<C: Into<String>, S: Into<String>>(container_extension: C, source_extension: S) -> Self {
        Self {
            container_extension: container_extension.into(),
            source_extension: source_extension.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.container_extension(), config.source_extension())
    }

    /// List all entries in central-directory order
    pub fn list_entries(&self, path: &Path) -> Result<Vec<ContainerEntry>> {
        let mut archive = self.open(path)?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index).map_err(|e| self.invalid(e))?;
            entries.push(ContainerEntry {
                name: entry.name().to_string(),
                size: entry.size(),
                compressed_size: entry.compressed_size(),
                crc32: entry.crc32(),
            });
        }
        Ok(entries)
    }

    /// Read the first entry whose name carries the audio extension
    pub fn extract_audio(&self, path: &Path) -> Result<AudioEntry> {
        let mut archive = self.open(path)?;

        let index = (0..archive.len())
            .find(|&i| {
                archive
                    .name_for_index(i)
                    .is_some_and(|name| has_extension(name, &self.source_extension))
            })
            .ok_or_else(|| CwavError::no_audio_entry(&self.source_extension))?;

        let mut entry = archive.by_index(index).map_err(|e| self.invalid(e))?;
        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        // CRC mismatches and truncated data surface here
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| self.invalid(format!("reading '{}': {}", name, e)))?;

        debug!("Extracted '{}' ({} bytes) from {}", name, bytes.len(), path.display());
        Ok(AudioEntry { name, bytes })
    }

    fn open(&self, path: &Path) -> Result<ZipArchive<BufReader<File>>> {
        let file = File::open(path)
            .map_err(|e| CwavError::io(format!("Cannot open {}: {}", path.display(), e)))?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| self.invalid(e))
    }

    fn invalid<R: ToString>(&self, reason: R) -> CwavError {
        let reason = reason.to_string();
        debug!("Rejecting container: {}", reason);
        CwavError::invalid_container(&self.container_extension, reason)
    }
}
