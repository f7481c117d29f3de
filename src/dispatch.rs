//! Extension-based routing of picked or dropped paths

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::container::path_has_extension;
use crate::error::{CwavError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Uncompressed audio: ask for a destination, then package
    Package,
    /// Compressed container: play it
    Play,
}

pub fn route(path: &Path, config: &Config) -> Result<Route> {
    if path_has_extension(path, config.source_extension()) {
        Ok(Route::Package)
    } else if path_has_extension(path, config.container_extension()) {
        Ok(Route::Play)
    } else {
        Err(CwavError::UnsupportedFile {
            path: path.to_path_buf(),
            source_extension: config.source_extension().to_string(),
            container_extension: config.container_extension().to_string(),
        })
    }
}

/// Clean up a path as delivered by a drop or a paste.
///
/// Strips whitespace, Tk-style `{...}` braces and matching quotes. A
/// `file://` URI is turned back into a plain path with its percent escapes
/// decoded. Returns `None` for empty input.
pub fn normalize_dropped_path(raw: &str) -> Option<PathBuf> {
    let mut s = raw.trim();

    if let Some(inner) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        s = inner;
    }
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            s = &s[1..s.len() - 1];
        }
    }
    let path = match s.strip_prefix("file://") {
        Some(uri_path) => decode_uri_path(uri_path.strip_prefix("localhost").unwrap_or(uri_path)),
        None => s.to_string(),
    };

    let path = path.trim();
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// `%XX` escapes of a `file://` URI; text that does not decode to UTF-8 is kept as is
fn decode_uri_path(uri_path: &str) -> String {
    match urlencoding::decode(uri_path) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::debug!("Keeping undecodable URI path '{}': {}", uri_path, e);
            uri_path.to_string()
        }
    }
}
