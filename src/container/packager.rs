//! Container writer

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::path_has_extension;
use crate::config::Config;
use crate::error::{CwavError, Result};

/// Outcome of a successful [`Packager::pack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub destination: PathBuf,
    pub entry_name: String,
    pub original_size: u64,
    pub container_size: u64,
}

impl PackageReport {
    /// Container size as a fraction of the original size
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.container_size as f64 / self.original_size as f64
    }
}

#[derive(Debug, Clone)]
pub struct Packager {
    container_extension: String,
    compression_level: Option<i64>,
}

impl Packager {
    pub fn new(config: &Config) -> Self {
        Self {
            container_extension: config.container_extension().to_string(),
            compression_level: config.compression_level(),
        }
    }

    pub fn container_extension(&self) -> &str {
        &self.container_extension
    }

    /// Store `source` unchanged as the single deflated entry of a new container.
    ///
    /// The container extension is appended to `destination` when missing. A
    /// destination created by this call is removed again if writing fails.
    pub fn pack(&self, source: &Path, destination: &Path) -> Result<PackageReport> {
        let destination = with_container_extension(destination, &self.container_extension);

        let entry_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| CwavError::io(format!("Not a file path: {}", source.display())))?;

        // Opened before the destination exists so a bad source leaves nothing behind
        let source_file = File::open(source)
            .map_err(|e| CwavError::io(format!("Cannot open {}: {}", source.display(), e)))?;
        let metadata = source_file.metadata()?;
        if !metadata.is_file() {
            return Err(CwavError::io(format!("Not a regular file: {}", source.display())));
        }
        if is_same_file(source, &destination) {
            return Err(CwavError::io("Destination must differ from the source file"));
        }

        debug!("Packing {} as entry '{}' into {}", source.display(), entry_name, destination.display());
        let container_size = self.create_container(source_file, metadata.len(), &destination, &entry_name)?;

        let report = PackageReport {
            destination,
            entry_name,
            original_size: metadata.len(),
            container_size,
        };
        info!(
            "Created {} ({} -> {} bytes, {:.1}%)",
            report.destination.display(),
            report.original_size,
            report.container_size,
            report.ratio() * 100.0
        );
        Ok(report)
    }

    /// Create `destination` and write the archive; the file is removed again on failure
    fn create_container<R: Read>(
        &self,
        source: R,
        source_len: u64,
        destination: &Path,
        entry_name: &str,
    ) -> Result<u64> {
        let dest_file = File::create(destination)
            .map_err(|e| CwavError::io(format!("Cannot create {}: {}", destination.display(), e)))?;

        self.write_archive(source, source_len, dest_file, entry_name)
            .inspect_err(|_| {
                if let Err(rm) = std::fs::remove_file(destination) {
                    warn!("Failed to remove partial container {}: {}", destination.display(), rm);
                }
            })
    }

    fn write_archive<R: Read>(&self, source: R, source_len: u64, dest: File, entry_name: &str) -> Result<u64> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level)
            .large_file(source_len >= u32::MAX as u64);

        let mut writer = ZipWriter::new(BufWriter::new(dest));
        writer.start_file(entry_name, options)?;

        let mut reader = BufReader::new(source);
        let copied = io::copy(&mut reader, &mut writer)?;
        if copied != source_len {
            return Err(CwavError::io(format!(
                "Source changed while packing: expected {} bytes, read {}", source_len, copied
            )));
        }

        let mut buffered = writer.finish()?;
        buffered.flush()?;
        let file = buffered
            .into_inner()
            .map_err(|e| CwavError::io(e.error().to_string()))?;
        file.sync_all()?;

        Ok(file.metadata()?.len())
    }
}

/// Append the container extension unless the path already carries it
pub fn with_container_extension(path: &Path, ext: &str) -> PathBuf {
    if path_has_extension(path, ext) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// `<stem>.<ext>` next to the source file
pub fn default_destination(source: &Path, ext: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    let mut name = stem;
    name.push(".");
    name.push(ext);
    source.with_file_name(name)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
