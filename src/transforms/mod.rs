//! Audio Transforms
//!
//! One transform per recipe action: time shifts for `early` / `late`, pitch
//! shifts for the rest. The [`TransformRegistry`] binds actions to them.

pub mod pitch;
pub mod registry;
pub mod time;
pub mod transform;

pub use pitch::PitchShift;
pub use registry::TransformRegistry;
pub use time::TimeShift;
pub use transform::{ApplyTransform, Transform};
