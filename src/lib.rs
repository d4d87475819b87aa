//! Stemweave - Stem Recipe Compiler and Pipeline Executor
//!
//! Stemweave takes a short recipe describing how separated stems (bass,
//! drums, other, piano, vocals) are transformed and recombined:
//!
//! ```text
//! vocals -> flat -> early -> save(newVocals);
//! bass -> late -> lateBass;
//! lateBass -> octavedown -> save(subBass);
//! drums -> save(drums);
//! ```
//!
//! # Architecture
//!
//! Evaluation is a one-way pipeline:
//! - [`recipe`]: text to an ordered list of statements
//! - [`plan`]: name resolution and validation into an execution plan
//! - [`pipeline`]: execution against the stems, then mixing of saved sinks
//!
//! Separation and the transforms themselves are collaborators behind the
//! [`stems::StemSeparator`] and [`transforms::ApplyTransform`] traits.

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod recipe;
pub mod render;
pub mod stems;
pub mod transforms;

pub mod cli;

pub use config::RenderConfig;
pub use error::{Result, StemweaveError};
pub use render::{compile, Renderer, RunReport};
