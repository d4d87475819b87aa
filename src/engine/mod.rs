//! Audio Engine Module
//!
//! - Audio buffer type shared by stems, sinks and the final mix
//! - WAV file I/O and output checksums

pub mod buffer;
pub mod io;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use io::{export_audio, file_checksum, generate_test_tone, import_audio, ExportFormat};
