//! Time shift
//!
//! Rotates every channel by a fixed number of samples. Audio pushed past one
//! end wraps around to the other, so length is preserved.

use super::Transform;
use crate::engine::AudioBuffer;
use crate::error::TransformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeShift {
    /// Positive moves audio later, negative earlier
    offset: isize,
}

impl TimeShift {
    pub fn new(offset: isize) -> Self {
        Self { offset }
    }

    /// Shift earlier by `samples`
    pub fn early(samples: usize) -> Self {
        Self::new(-saturating_offset(samples))
    }

    /// Shift later by `samples`
    pub fn late(samples: usize) -> Self {
        Self::new(saturating_offset(samples))
    }

    pub fn offset(&self) -> isize {
        self.offset
    }
}

/// Offsets past `isize::MAX` clamp instead of wrapping negative
fn saturating_offset(samples: usize) -> isize {
    isize::try_from(samples).unwrap_or(isize::MAX)
}

impl Transform for TimeShift {
    fn process(&self, mut buffer: AudioBuffer) -> Result<AudioBuffer, TransformError> {
        let len = buffer.len();
        if len == 0 {
            return Ok(buffer);
        }

        let shift = self.offset.rem_euclid(len as isize) as usize;
        for channel in &mut buffer.samples {
            channel.rotate_right(shift);
        }
        Ok(buffer)
    }

    fn transform_type(&self) -> &'static str {
        "time_shift"
    }

    fn display_name(&self) -> String {
        format!("Time shift ({:+} samples)", self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> AudioBuffer {
        AudioBuffer::from_channels(vec![(0..len).map(|i| i as f32).collect()], 44100).unwrap()
    }

    #[test]
    fn test_late_moves_audio_forward() {
        let out = TimeShift::late(2).process(ramp(5)).unwrap();
        assert_eq!(out.channel(0), &[3.0, 4.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_early_moves_audio_back() {
        let out = TimeShift::early(2).process(ramp(5)).unwrap();
        assert_eq!(out.channel(0), &[2.0, 3.0, 4.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shift_longer_than_buffer_wraps() {
        let out = TimeShift::late(7).process(ramp(5)).unwrap();
        assert_eq!(out.channel(0), &[3.0, 4.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_early_then_late_is_identity() {
        let original = ramp(100).to_stereo();
        let shifted = TimeShift::early(30).process(original.clone()).unwrap();
        let restored = TimeShift::late(30).process(shifted).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_huge_shift_keeps_direction() {
        assert_eq!(TimeShift::late(usize::MAX).offset(), isize::MAX);
        assert_eq!(TimeShift::early(usize::MAX).offset(), -isize::MAX);
        assert!(TimeShift::late(usize::MAX).offset() > 0);
    }

    #[test]
    fn test_empty_buffer() {
        let out = TimeShift::late(1500).process(AudioBuffer::default()).unwrap();
        assert!(out.is_empty());
    }
}
