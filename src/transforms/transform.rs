//! Transform trait definition

use crate::engine::AudioBuffer;
use crate::error::TransformError;
use crate::recipe::ActionName;

/// An audio transform bound to one recipe action
///
/// Transforms take ownership of the buffer and return the processed one.
/// They must keep the sample rate; length may change only where documented.
pub trait Transform: Send + Sync {
    /// Process a buffer
    fn process(&self, buffer: AudioBuffer) -> Result<AudioBuffer, TransformError>;

    /// Get the transform type identifier
    fn transform_type(&self) -> &'static str;

    /// Get human-readable display name
    fn display_name(&self) -> String;
}

/// Applies the transform bound to an action
///
/// The executor only sees this trait, so tests can pass a closure in place
/// of a [`TransformRegistry`](super::TransformRegistry).
pub trait ApplyTransform {
    fn apply(
        &self,
        action: ActionName,
        buffer: AudioBuffer,
    ) -> Result<AudioBuffer, TransformError>;
}

impl<F> ApplyTransform for F
where
    F: Fn(ActionName, AudioBuffer) -> Result<AudioBuffer, TransformError>,
{
    fn apply(
        &self,
        action: ActionName,
        buffer: AudioBuffer,
    ) -> Result<AudioBuffer, TransformError> {
        self(action, buffer)
    }
}
