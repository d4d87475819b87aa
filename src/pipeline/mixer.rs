//! Mixer
//!
//! Sums the retained buffers into one track. Shorter buffers are padded
//! with silence so the mix is as long as the longest input.

use log::{debug, info, warn};

use super::NamedBuffer;
use crate::engine::buffer::{linear_to_db, peak_amplitude};
use crate::engine::AudioBuffer;
use crate::error::RuntimeError;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MixOptions {
    /// Scale the mix down uniformly if its peak exceeds this linear level
    pub normalize_ceiling: Option<f32>,
}

impl MixOptions {
    pub fn normalized(ceiling: f32) -> Self {
        Self {
            normalize_ceiling: Some(ceiling),
        }
    }
}

/// The mixed output of a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct FinalTrack {
    pub buffer: AudioBuffer,
    /// Contributing sinks, in document order
    pub sources: Vec<String>,
    /// Linear gain applied by normalization (1.0 when untouched)
    pub gain: f32,
}

/// Mix retained buffers into a single track
pub fn mix(retained: Vec<NamedBuffer>, options: &MixOptions) -> Result<FinalTrack, RuntimeError> {
    let first = retained.first().ok_or(RuntimeError::NothingToMix)?;
    let sample_rate = first.buffer.sample_rate;

    if let Some(other) = retained.iter().find(|b| b.buffer.sample_rate != sample_rate) {
        return Err(RuntimeError::IncompatibleSampleRate {
            context: format!("mix of '{}' and '{}'", first.name, other.name),
            expected: sample_rate,
            found: other.buffer.sample_rate,
        });
    }

    // Longest channel of any buffer, not just the first channel
    let length = retained
        .iter()
        .flat_map(|b| b.buffer.samples.iter().map(Vec::len))
        .max()
        .unwrap_or(0);
    let channels = retained.iter().map(|b| b.buffer.channels()).max().unwrap_or(1);
    debug!(
        "Mixing {} buffers: {} samples, {} channels",
        retained.len(),
        length,
        channels
    );

    let mut sum = vec![vec![0.0_f32; length]; channels];
    let mut sources = Vec::with_capacity(retained.len());
    for named in retained {
        let mut buffer = if named.buffer.channels() < channels {
            named.buffer.to_stereo()
        } else {
            named.buffer
        };
        buffer.pad_to(length);

        for (acc, channel) in sum.iter_mut().zip(buffer.samples.iter()) {
            for (a, s) in acc.iter_mut().zip(channel.iter()) {
                *a += *s;
            }
        }
        sources.push(named.name);
    }

    let mut buffer = AudioBuffer {
        samples: sum,
        sample_rate,
    };

    let mut gain = 1.0;
    let peak = peak_amplitude(&buffer);
    if let Some(ceiling) = options.normalize_ceiling {
        if peak > ceiling {
            gain = ceiling / peak;
            buffer.scale(gain);
            info!("Normalized mix by {:.2} dB", linear_to_db(gain));
        }
    } else if peak > 1.0 {
        warn!(
            "Mix peaks at {:.2} dBFS and will clip on export",
            linear_to_db(peak)
        );
    }

    Ok(FinalTrack {
        buffer,
        sources,
        gain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn named(name: &str, samples: Vec<Vec<f32>>, sample_rate: u32) -> NamedBuffer {
        NamedBuffer::new(name, AudioBuffer::from_channels(samples, sample_rate).unwrap())
    }

    #[test]
    fn test_sums_and_pads() {
        let track = mix(
            vec![
                named("a", vec![vec![0.1, 0.2, 0.3]], 44100),
                named("b", vec![vec![0.1]], 44100),
            ],
            &MixOptions::default(),
        )
        .unwrap();

        assert_eq!(track.buffer.len(), 3);
        assert_relative_eq!(track.buffer.channel(0)[0], 0.2);
        assert_relative_eq!(track.buffer.channel(0)[2], 0.3);
        assert_eq!(track.sources, vec!["a", "b"]);
    }

    #[test]
    fn test_mono_upmixed_with_stereo() {
        let track = mix(
            vec![
                named("mono", vec![vec![0.5, 0.5]], 48000),
                named("stereo", vec![vec![0.1, 0.1], vec![-0.1, -0.1]], 48000),
            ],
            &MixOptions::default(),
        )
        .unwrap();

        assert_eq!(track.buffer.channels(), 2);
        assert_relative_eq!(track.buffer.channel(0)[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(track.buffer.channel(1)[0], 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_length_covers_every_channel() {
        let ragged = NamedBuffer::new(
            "ragged",
            AudioBuffer {
                samples: vec![vec![0.1; 4], vec![0.1; 8]],
                sample_rate: 44100,
            },
        );
        let track = mix(vec![ragged], &MixOptions::default()).unwrap();

        assert_eq!(track.buffer.len(), 8);
        assert_eq!(&track.buffer.channel(0)[4..], &[0.0; 4]);
        assert_relative_eq!(track.buffer.channel(1)[7], 0.1);
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let err = mix(
            vec![
                named("a", vec![vec![0.0]], 44100),
                named("b", vec![vec![0.0]], 48000),
            ],
            &MixOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::IncompatibleSampleRate {
                expected: 44100,
                found: 48000,
                ..
            }
        ));
    }

    #[test]
    fn test_nothing_to_mix() {
        assert_eq!(
            mix(Vec::new(), &MixOptions::default()).unwrap_err(),
            RuntimeError::NothingToMix
        );
    }

    #[test]
    fn test_normalize_only_above_ceiling() {
        let loud = vec![
            named("a", vec![vec![0.8, -0.2]], 44100),
            named("b", vec![vec![0.8, 0.2]], 44100),
        ];
        let track = mix(loud, &MixOptions::normalized(1.0)).unwrap();
        assert_relative_eq!(track.gain, 1.0 / 1.6);
        assert_relative_eq!(track.buffer.channel(0)[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(track.buffer.channel(0)[1], 0.0);

        let quiet = vec![named("a", vec![vec![0.3]], 44100)];
        let track = mix(quiet, &MixOptions::normalized(1.0)).unwrap();
        assert_relative_eq!(track.gain, 1.0);
        assert_relative_eq!(track.buffer.channel(0)[0], 0.3);
    }
}
