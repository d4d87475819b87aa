//! Separated Stems
//!
//! The five primitive sources a recipe can read, the [`StemSet`] produced by
//! separation, and the [`StemSeparator`] seam through which stems enter the
//! pipeline.

mod directory;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::AudioBuffer;
use crate::error::Result;

pub use directory::StemDirectory;

/// A primitive source track produced by separation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    Bass,
    Drums,
    Other,
    Piano,
    Vocals,
}

impl Stem {
    pub const ALL: [Stem; 5] = [Stem::Bass, Stem::Drums, Stem::Other, Stem::Piano, Stem::Vocals];

    /// Reserved recipe name of this stem
    pub fn name(&self) -> &'static str {
        match self {
            Stem::Bass => "bass",
            Stem::Drums => "drums",
            Stem::Other => "other",
            Stem::Piano => "piano",
            Stem::Vocals => "vocals",
        }
    }

    /// Case-sensitive lookup by recipe name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Buffers produced by one separation run
#[derive(Debug, Clone, Default)]
pub struct StemSet {
    stems: BTreeMap<Stem, AudioBuffer>,
}

impl StemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stem: Stem, buffer: AudioBuffer) -> Option<AudioBuffer> {
        self.stems.insert(stem, buffer)
    }

    pub fn with(mut self, stem: Stem, buffer: AudioBuffer) -> Self {
        self.insert(stem, buffer);
        self
    }

    /// Remove a stem, handing its buffer to the caller
    pub fn take(&mut self, stem: Stem) -> Option<AudioBuffer> {
        self.stems.remove(&stem)
    }

    pub fn contains(&self, stem: Stem) -> bool {
        self.stems.contains_key(&stem)
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Stems present, in name order
    pub fn available(&self) -> impl Iterator<Item = Stem> + '_ {
        self.stems.keys().copied()
    }
}

impl IntoIterator for StemSet {
    type Item = (Stem, AudioBuffer);
    type IntoIter = std::collections::btree_map::IntoIter<Stem, AudioBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.stems.into_iter()
    }
}

impl FromIterator<(Stem, AudioBuffer)> for StemSet {
    fn from_iter<I: IntoIterator<Item = (Stem, AudioBuffer)>>(iter: I) -> Self {
        Self {
            stems: iter.into_iter().collect(),
        }
    }
}

/// Turns one input track into separated stems
///
/// Stems the separator cannot produce are left out of the set; a recipe that
/// reads one fails at execution time.
pub trait StemSeparator {
    fn separate(&self, input: &Path) -> Result<StemSet>;
}

impl<F> StemSeparator for F
where
    F: Fn(&Path) -> Result<StemSet>,
{
    fn separate(&self, input: &Path) -> Result<StemSet> {
        self(input)
    }
}
