//! Pre-separated stem directories
//!
//! Reads `<stem>.wav` files written by an external separator. Separators
//! usually nest their output one level deep (`out/<track>/vocals.wav`), so the
//! search descends two levels.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use super::{Stem, StemSeparator, StemSet};
use crate::engine::import_audio;
use crate::error::{Result, StemweaveError};

/// `<dir>/<stem>.wav` or `<dir>/<track>/<stem>.wav`
const MAX_DEPTH: usize = 2;

/// Loads stems from a directory of WAV files
#[derive(Debug, Clone)]
pub struct StemDirectory {
    wanted: Option<BTreeSet<Stem>>,
}

impl StemDirectory {
    pub fn new() -> Self {
        Self { wanted: None }
    }

    /// Only load the given stems
    pub fn only(mut self, stems: impl IntoIterator<Item = Stem>) -> Self {
        self.wanted = Some(stems.into_iter().collect());
        self
    }

    /// Find stem files without decoding them
    pub fn discover(&self, dir: &Path) -> Result<Vec<(Stem, PathBuf)>> {
        if !dir.is_dir() {
            return Err(StemweaveError::FileNotFound {
                path: dir.display().to_string(),
                source: None,
            });
        }

        let mut found: Vec<(Stem, PathBuf)> = Vec::new();
        let walker = WalkDir::new(dir)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                StemweaveError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(stem) = stem_for_file(path) else {
                continue;
            };
            if self.wanted.as_ref().is_some_and(|w| !w.contains(&stem)) {
                continue;
            }

            match found.iter().find(|(s, _)| *s == stem) {
                Some((_, first)) => warn!(
                    "Ignoring {}: stem '{}' already found at {}",
                    path.display(),
                    stem,
                    first.display()
                ),
                None => found.push((stem, path.to_path_buf())),
            }
        }

        Ok(found)
    }
}

impl Default for StemDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl StemSeparator for StemDirectory {
    fn separate(&self, input: &Path) -> Result<StemSet> {
        let mut stems = StemSet::new();
        for (stem, path) in self.discover(input)? {
            debug!("Loading stem '{}' from {}", stem, path.display());
            stems.insert(stem, import_audio(&path)?);
        }

        info!(
            "Loaded {} stem(s) from {}: {}",
            stems.len(),
            input.display(),
            stems
                .available()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(stems)
    }
}

/// `vocals.wav` → `Stem::Vocals`; extension match is case-insensitive
fn stem_for_file(path: &Path) -> Option<Stem> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case("wav") {
        return None;
    }
    Stem::from_name(path.file_stem()?.to_str()?)
}
