//! Compressed Container Module
//!
//! Writes and reads `.cwav` containers: a plain ZIP archive holding a single
//! deflate-compressed `.wav` entry named after the original file.

pub mod packager;
pub mod reader;

pub use packager::{Packager, PackageReport, default_destination, with_container_extension};
pub use reader::{AudioEntry, ContainerEntry, ContainerReader};

use std::path::Path;

/// ASCII case-insensitive check that `name` ends with `.ext`
pub fn has_extension(name: &str, ext: &str) -> bool {
    let name = name.as_bytes();
    let ext = ext.as_bytes();
    if name.len() <= ext.len() {
        return false;
    }
    let dot = name.len() - ext.len() - 1;
    name[dot] == b'.' && name[dot + 1..].eq_ignore_ascii_case(ext)
}

/// Same as [`has_extension`] for filesystem paths; non-UTF-8 names never match
pub fn path_has_extension(path: &Path, ext: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| has_extension(name, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension() {
        assert!(has_extension("song.wav", "wav"));
        assert!(has_extension("SONG.WAV", "wav"));
        assert!(has_extension("dir/take.Wav", "wav"));
        assert!(!has_extension("song.cwav", "wav"));
        assert!(!has_extension("wav", "wav"));
        assert!(has_extension(".wav", "wav"));
        assert!(!has_extension("songwav", "wav"));
    }

    #[test]
    fn test_path_has_extension() {
        assert!(path_has_extension(Path::new("/tmp/x/song.CWAV"), "cwav"));
        assert!(!path_has_extension(Path::new("/tmp/x/"), "cwav"));
    }
}
