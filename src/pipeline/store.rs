//! Buffer store
//!
//! Holds the stems and the sink buffers that later statements still need.
//! Each slot carries the number of reads left; the last read moves the
//! buffer out and frees the slot, earlier reads clone it.

use std::collections::BTreeMap;

use log::debug;

use crate::engine::AudioBuffer;
use crate::plan::ResolvedSource;
use crate::stems::{Stem, StemSet};

#[derive(Debug)]
struct Slot {
    buffer: AudioBuffer,
    readers: usize,
}

impl Slot {
    /// Hand out the buffer, consuming one read
    fn read(&mut self) -> ReadOutcome {
        self.readers = self.readers.saturating_sub(1);
        if self.readers == 0 {
            ReadOutcome::Last
        } else {
            ReadOutcome::Shared(self.buffer.clone())
        }
    }
}

enum ReadOutcome {
    Shared(AudioBuffer),
    Last,
}

#[derive(Debug)]
struct SinkSlot {
    name: String,
    /// Already copied into the mix, so never logged as released
    retained: bool,
    slot: Slot,
}

/// Live buffers during execution
#[derive(Debug, Default)]
pub struct BufferStore {
    stems: BTreeMap<Stem, Slot>,
    /// Indexed by defining statement
    sinks: Vec<Option<SinkSlot>>,
    live: usize,
    peak_live: usize,
    released: Vec<String>,
}

impl BufferStore {
    /// Seed the store with the stems some statement reads
    ///
    /// Stems absent from `stem_readers` are dropped here.
    pub fn new(stems: StemSet, stem_readers: &BTreeMap<Stem, usize>, statements: usize) -> Self {
        let mut store = Self {
            sinks: (0..statements).map(|_| None).collect(),
            ..Self::default()
        };

        for (stem, buffer) in stems {
            match stem_readers.get(&stem) {
                Some(&readers) if readers > 0 => {
                    store.stems.insert(stem, Slot { buffer, readers });
                    store.live += 1;
                }
                _ => debug!("Stem '{}' is never read, dropping it", stem),
            }
        }
        store.peak_live = store.live;
        store
    }

    /// Take the input buffer for a statement
    ///
    /// Returns `None` when the source is not in the store.
    pub fn read(&mut self, source: &ResolvedSource) -> Option<AudioBuffer> {
        match source {
            ResolvedSource::Stem(stem) => {
                let outcome = self.stems.get_mut(stem)?.read();
                match outcome {
                    ReadOutcome::Shared(buffer) => Some(buffer),
                    ReadOutcome::Last => {
                        let slot = self.stems.remove(stem)?;
                        self.live -= 1;
                        debug!("Released stem '{}'", stem);
                        Some(slot.buffer)
                    }
                }
            }
            ResolvedSource::Sink { statement, .. } => {
                let entry = self.sinks.get_mut(*statement)?;
                let outcome = entry.as_mut()?.slot.read();
                match outcome {
                    ReadOutcome::Shared(buffer) => Some(buffer),
                    ReadOutcome::Last => {
                        let sink = entry.take()?;
                        self.live -= 1;
                        if sink.retained {
                            debug!("Dropped working copy of saved sink '{}'", sink.name);
                        } else {
                            self.release(sink.name);
                        }
                        Some(sink.slot.buffer)
                    }
                }
            }
        }
    }

    /// Keep a sink buffer for `readers` later statements
    ///
    /// A sink nobody reads is released straight away.
    pub fn insert(&mut self, statement: usize, name: &str, buffer: AudioBuffer, readers: usize) {
        if readers == 0 {
            self.release(name.to_string());
            return;
        }
        self.hold(statement, name, buffer, readers, false);
    }

    /// Keep the working copy of a saved sink for `readers` later statements
    ///
    /// Saved sinks are part of the mix and never show up in [`released`](Self::released).
    pub fn insert_retained(
        &mut self,
        statement: usize,
        name: &str,
        buffer: AudioBuffer,
        readers: usize,
    ) {
        if readers > 0 {
            self.hold(statement, name, buffer, readers, true);
        }
    }

    fn hold(
        &mut self,
        statement: usize,
        name: &str,
        buffer: AudioBuffer,
        readers: usize,
        retained: bool,
    ) {
        if statement >= self.sinks.len() {
            self.sinks.resize_with(statement + 1, || None);
        }
        self.sinks[statement] = Some(SinkSlot {
            name: name.to_string(),
            retained,
            slot: Slot { buffer, readers },
        });
        self.live += 1;
        self.peak_live = self.peak_live.max(self.live);
    }

    fn release(&mut self, name: String) {
        debug!("Released sink '{}'", name);
        self.released.push(name);
    }

    /// Buffers currently held
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    /// Non-retained sink names, in release order
    pub fn released(&self) -> &[String] {
        &self.released
    }

    pub fn into_released(self) -> Vec<String> {
        self.released
    }
}
