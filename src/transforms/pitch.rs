//! Pitch shift
//!
//! Time-domain shifter with two read heads sweeping through a window of
//! `window` samples at the pitch ratio, crossfaded with complementary
//! sin²/cos² gains. Duration and sample rate are unchanged; the heads are
//! centred on the output position so the shifted audio does not lag.

use std::f64::consts::PI;

use super::Transform;
use crate::engine::AudioBuffer;
use crate::error::TransformError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchShift {
    steps: f64,
    bins_per_octave: f64,
    window: usize,
}

impl PitchShift {
    /// Shift by `steps` divisions of an octave split into `bins_per_octave`
    pub fn new(steps: f64, bins_per_octave: f64, window: usize) -> Self {
        Self {
            steps,
            bins_per_octave,
            window,
        }
    }

    pub fn semitones(steps: f64, window: usize) -> Self {
        Self::new(steps, 12.0, window)
    }

    pub fn quarter_tones(steps: f64, window: usize) -> Self {
        Self::new(steps, 24.0, window)
    }

    /// Frequency multiplier
    pub fn ratio(&self) -> f64 {
        2.0_f64.powf(self.steps / self.bins_per_octave)
    }

    fn shift_channel(&self, input: &[f32], ratio: f64) -> Vec<f32> {
        let window = self.window as f64;
        let half = window / 2.0;
        let drift = 1.0 - ratio;

        (0..input.len())
            .map(|n| {
                let n = n as f64;
                let d1 = (n * drift).rem_euclid(window);
                let d2 = (d1 + half).rem_euclid(window);
                let g1 = (PI * d1 / window).sin().powi(2);
                let g2 = (PI * d2 / window).sin().powi(2);
                (g1 * read(input, n + half - d1) + g2 * read(input, n + half - d2)) as f32
            })
            .collect()
    }
}

/// Linearly interpolated sample, silence outside the signal
fn read(input: &[f32], pos: f64) -> f64 {
    if pos < 0.0 {
        return 0.0;
    }
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = input.get(idx).copied().unwrap_or(0.0) as f64;
    let b = input.get(idx + 1).copied().unwrap_or(0.0) as f64;
    a + (b - a) * frac
}

impl Transform for PitchShift {
    fn process(&self, mut buffer: AudioBuffer) -> Result<AudioBuffer, TransformError> {
        if buffer.sample_rate == 0 {
            return Err(TransformError::UnsupportedSampleRate(0));
        }
        if self.window < 2 {
            return Err(TransformError::Failed(format!(
                "pitch window of {} samples is too small",
                self.window
            )));
        }

        let ratio = self.ratio();
        if (ratio - 1.0).abs() < f64::EPSILON || buffer.is_empty() {
            return Ok(buffer);
        }

        for channel in &mut buffer.samples {
            *channel = self.shift_channel(channel, ratio);
        }
        Ok(buffer)
    }

    fn transform_type(&self) -> &'static str {
        "pitch_shift"
    }

    fn display_name(&self) -> String {
        format!("Pitch shift ({:+}/{} octave)", self.steps, self.bins_per_octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use approx::assert_relative_eq;

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[test]
    fn test_ratios() {
        assert_relative_eq!(PitchShift::semitones(12.0, 2048).ratio(), 2.0);
        assert_relative_eq!(PitchShift::semitones(-12.0, 2048).ratio(), 0.5);
        assert_relative_eq!(
            PitchShift::quarter_tones(1.0, 2048).ratio(),
            2.0_f64.powf(1.0 / 24.0)
        );
    }

    #[test]
    fn test_preserves_length_and_rate() {
        let tone = generate_test_tone(440.0, 0.5, 22050).to_stereo();
        let out = PitchShift::semitones(-1.0, 1024).process(tone.clone()).unwrap();
        assert_eq!(out.len(), tone.len());
        assert_eq!(out.channels(), 2);
        assert_eq!(out.sample_rate, 22050);
        assert!(out.is_finite());
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let tone = generate_test_tone(220.0, 1.0, 48000);
        let before = zero_crossings(tone.channel(0)) as f64;

        let out = PitchShift::semitones(12.0, 2048).process(tone).unwrap();
        let after = zero_crossings(out.channel(0)) as f64;

        let ratio = after / before;
        assert!((1.7..2.3).contains(&ratio), "crossing ratio {}", ratio);
    }

    #[test]
    fn test_octave_down_halves_frequency() {
        let tone = generate_test_tone(880.0, 1.0, 48000);
        let before = zero_crossings(tone.channel(0)) as f64;

        let out = PitchShift::semitones(-12.0, 2048).process(tone).unwrap();
        let after = zero_crossings(out.channel(0)) as f64;

        let ratio = after / before;
        assert!((0.4..0.6).contains(&ratio), "crossing ratio {}", ratio);
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let tone = generate_test_tone(440.0, 0.1, 44100);
        let out = PitchShift::semitones(0.0, 2048).process(tone.clone()).unwrap();
        assert_eq!(out, tone);
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        let mut tone = generate_test_tone(440.0, 0.1, 44100);
        tone.sample_rate = 0;
        let err = PitchShift::semitones(1.0, 2048).process(tone).unwrap_err();
        assert_eq!(err, TransformError::UnsupportedSampleRate(0));
    }
}
