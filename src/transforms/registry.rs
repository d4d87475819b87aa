//! Transform registry
//!
//! Binds each recipe action to the transform that implements it.

use std::collections::HashMap;
use std::sync::Arc;

use log::trace;

use super::{ApplyTransform, PitchShift, TimeShift, Transform};
use crate::config::RenderConfig;
use crate::engine::AudioBuffer;
use crate::error::TransformError;
use crate::recipe::ActionName;

/// Registry of action implementations
pub struct TransformRegistry {
    transforms: HashMap<ActionName, Arc<dyn Transform>>,
}

impl TransformRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Registry with every action bound, using default settings
    pub fn with_defaults() -> Self {
        Self::from_config(&RenderConfig::default())
    }

    /// Registry with every action bound, using the given settings
    pub fn from_config(config: &RenderConfig) -> Self {
        let shift = config.time_shift_samples;
        let window = config.pitch_window;

        let mut registry = Self::new();
        registry.register(ActionName::Early, Arc::new(TimeShift::early(shift)));
        registry.register(ActionName::Late, Arc::new(TimeShift::late(shift)));
        registry.register(ActionName::Flat, Arc::new(PitchShift::semitones(-1.0, window)));
        registry.register(ActionName::Sharp, Arc::new(PitchShift::semitones(1.0, window)));
        registry.register(
            ActionName::HalfFlat,
            Arc::new(PitchShift::quarter_tones(-1.0, window)),
        );
        registry.register(
            ActionName::HalfSharp,
            Arc::new(PitchShift::quarter_tones(1.0, window)),
        );
        registry.register(
            ActionName::OctaveUp,
            Arc::new(PitchShift::semitones(12.0, window)),
        );
        registry.register(
            ActionName::OctaveDown,
            Arc::new(PitchShift::semitones(-12.0, window)),
        );
        registry
    }

    /// Bind an action, replacing any previous binding
    pub fn register(&mut self, action: ActionName, transform: Arc<dyn Transform>) {
        self.transforms.insert(action, transform);
    }

    pub fn get(&self, action: ActionName) -> Option<Arc<dyn Transform>> {
        self.transforms.get(&action).cloned()
    }

    pub fn contains(&self, action: ActionName) -> bool {
        self.transforms.contains_key(&action)
    }

    /// Bound actions, in keyword order
    pub fn actions(&self) -> Vec<ActionName> {
        ActionName::ALL
            .iter()
            .copied()
            .filter(|a| self.contains(*a))
            .collect()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ApplyTransform for TransformRegistry {
    fn apply(
        &self,
        action: ActionName,
        buffer: AudioBuffer,
    ) -> Result<AudioBuffer, TransformError> {
        let transform = self
            .transforms
            .get(&action)
            .ok_or_else(|| TransformError::Failed(format!("no transform bound to '{}'", action)))?;
        trace!("{}: {}", action, transform.display_name());
        transform.process(buffer)
    }
}
