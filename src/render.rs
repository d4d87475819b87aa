//! Render facade
//!
//! Wires the stages together: parse, build the plan, separate, execute, mix
//! and export. Nothing is written unless every stage succeeds.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RenderConfig;
use crate::engine::buffer::{calculate_peak, calculate_rms};
use crate::engine::{export_audio, file_checksum};
use crate::error::Result;
use crate::pipeline::{execute, mix, ExecutionStats, FinalTrack, MixOptions};
use crate::plan::{self, ExecutionPlan};
use crate::recipe::parse;
use crate::stems::StemSeparator;
use crate::transforms::TransformRegistry;

/// Parse and validate a recipe
pub fn compile(text: &str) -> Result<ExecutionPlan> {
    let document = parse(text)?;
    let plan = plan::build(&document)?;
    Ok(plan)
}

/// Summary of one render, written next to the output on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub input: PathBuf,
    pub output: PathBuf,
    pub statements: usize,
    pub retained: Vec<String>,
    pub released: Vec<String>,
    pub transforms_applied: usize,
    pub peak_live_buffers: usize,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: usize,
    pub normalization_gain: f32,
    /// Output level, `None` for silence
    pub peak_db: Option<f32>,
    pub rms_db: Option<f32>,
    /// SHA-256 of the written file
    pub checksum: String,
}

impl RunReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Result of running a recipe in memory
#[derive(Debug)]
pub struct Rendered {
    pub track: FinalTrack,
    pub stats: ExecutionStats,
    pub statements: usize,
}

/// Runs recipes against one separator with one transform registry
pub struct Renderer<S: StemSeparator> {
    separator: S,
    transforms: TransformRegistry,
    config: RenderConfig,
}

impl<S: StemSeparator> Renderer<S> {
    pub fn new(separator: S, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            separator,
            transforms: TransformRegistry::from_config(&config),
            config,
        })
    }

    /// Replace the transform registry
    pub fn with_transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn mix_options(&self) -> MixOptions {
        MixOptions {
            normalize_ceiling: self.config.normalize.then_some(self.config.normalize_ceiling),
        }
    }

    /// Run a recipe and return the mixed track
    ///
    /// The recipe is validated before the separator runs.
    pub fn render(&self, recipe: &str, input: &Path) -> Result<Rendered> {
        let plan = compile(recipe)?;
        info!(
            "Recipe compiled: {} statements, saving {}",
            plan.len(),
            plan.retained.join(", ")
        );

        let stems = self.separator.separate(input)?;
        info!("Separated {} stems from {}", stems.len(), input.display());

        let output = execute(&plan, stems, &self.transforms)?;
        let track = mix(output.retained, &self.mix_options())?;

        Ok(Rendered {
            track,
            stats: output.stats,
            statements: plan.len(),
        })
    }

    /// Run a recipe and write the mix to `output`
    pub fn render_to_file(&self, recipe: &str, input: &Path, output: &Path) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Render {} started", run_id);

        let rendered = self.render(recipe, input)?;
        let buffer = &rendered.track.buffer;
        export_audio(buffer, output, self.config.export_format())?;
        let checksum = file_checksum(output)?;
        info!("Wrote {} ({:.2}s)", output.display(), buffer.duration_secs());

        Ok(RunReport {
            run_id,
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            statements: rendered.statements,
            retained: rendered.track.sources.clone(),
            released: rendered.stats.released.clone(),
            transforms_applied: rendered.stats.transforms_applied,
            peak_live_buffers: rendered.stats.peak_live_buffers,
            duration_secs: buffer.duration_secs(),
            sample_rate: buffer.sample_rate,
            channels: buffer.channels(),
            normalization_gain: rendered.track.gain,
            peak_db: Some(calculate_peak(buffer)).filter(|db| db.is_finite()),
            rms_db: Some(calculate_rms(buffer)).filter(|db| db.is_finite()),
            checksum,
        })
    }
}
