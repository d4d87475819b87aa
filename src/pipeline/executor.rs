//! Plan executor
//!
//! Runs the statements of an [`ExecutionPlan`] in order, folding each
//! statement's actions over its input buffer.

use log::{debug, info};
use serde::Serialize;

use super::store::BufferStore;
use crate::engine::AudioBuffer;
use crate::error::{RuntimeError, TransformError};
use crate::plan::{ExecutionPlan, PlannedStatement, ResolvedSource};
use crate::stems::StemSet;
use crate::transforms::ApplyTransform;

/// A buffer tagged with the sink that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBuffer {
    pub name: String,
    pub buffer: AudioBuffer,
}

impl NamedBuffer {
    pub fn new(name: impl Into<String>, buffer: AudioBuffer) -> Self {
        Self {
            name: name.into(),
            buffer,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    pub statements_run: usize,
    pub transforms_applied: usize,
    /// Most buffers held by the store at once, retained output excluded
    pub peak_live_buffers: usize,
    /// Non-retained sinks, in release order
    pub released: Vec<String>,
}

#[derive(Debug)]
pub struct ExecutionOutput {
    /// Retained sinks in document order
    pub retained: Vec<NamedBuffer>,
    pub stats: ExecutionStats,
}

impl ExecutionOutput {
    pub fn retained_names(&self) -> Vec<&str> {
        self.retained.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Execute a plan against separated stems
pub fn execute<T>(
    plan: &ExecutionPlan,
    stems: StemSet,
    transforms: &T,
) -> Result<ExecutionOutput, RuntimeError>
where
    T: ApplyTransform + ?Sized,
{
    info!(
        "Executing {} statements ({} transforms)",
        plan.len(),
        plan.transform_count()
    );

    let mut store = BufferStore::new(stems, &plan.stem_readers, plan.len());
    let mut retained = Vec::with_capacity(plan.retained.len());
    let mut stats = ExecutionStats::default();

    for statement in &plan.statements {
        let input = store.read(&statement.source).ok_or_else(|| missing(statement))?;
        let output = run_statement(statement, input, transforms)?;
        stats.statements_run += 1;
        stats.transforms_applied += statement.actions.len();

        let name = statement.sink.name.as_str();
        if statement.sink.retained {
            if statement.readers > 0 {
                retained.push(NamedBuffer::new(name, output.clone()));
                store.insert_retained(statement.index, name, output, statement.readers);
            } else {
                retained.push(NamedBuffer::new(name, output));
            }
        } else {
            store.insert(statement.index, name, output, statement.readers);
        }
    }

    stats.peak_live_buffers = store.peak_live();
    stats.released = store.into_released();
    info!(
        "Executed {} statements, {} buffers retained",
        stats.statements_run,
        retained.len()
    );

    Ok(ExecutionOutput { retained, stats })
}

fn run_statement<T>(
    statement: &PlannedStatement,
    input: AudioBuffer,
    transforms: &T,
) -> Result<AudioBuffer, RuntimeError>
where
    T: ApplyTransform + ?Sized,
{
    let sample_rate = input.sample_rate;
    let mut buffer = input;

    for &action in &statement.actions {
        debug!("Statement {}: applying {}", statement.index, action);
        let fail = |source| RuntimeError::TransformFailed {
            statement: statement.index,
            action,
            source,
        };

        buffer = transforms.apply(action, buffer).map_err(fail)?;
        if buffer.sample_rate != sample_rate {
            return Err(RuntimeError::IncompatibleSampleRate {
                context: format!("statement {} after '{}'", statement.index, action),
                expected: sample_rate,
                found: buffer.sample_rate,
            });
        }
        if let Some(problem) = buffer.layout_problem() {
            return Err(fail(TransformError::InvalidLayout(problem)));
        }
        if !buffer.is_finite() {
            return Err(fail(TransformError::NonFinite));
        }
    }

    Ok(buffer)
}

fn missing(statement: &PlannedStatement) -> RuntimeError {
    match &statement.source {
        ResolvedSource::Stem(stem) => RuntimeError::MissingStem {
            stem: *stem,
            statement: statement.index,
        },
        ResolvedSource::Sink { name, .. } => RuntimeError::MissingSink {
            name: name.clone(),
            statement: statement.index,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan;
    use crate::recipe::{parse, ActionName};
    use crate::stems::Stem;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn constant(value: f32) -> AudioBuffer {
        AudioBuffer::from_channels(vec![vec![value; 8]], 44100).unwrap()
    }

    fn all_stems() -> StemSet {
        Stem::ALL
            .iter()
            .enumerate()
            .map(|(i, stem)| (*stem, constant(i as f32 * 0.1)))
            .collect()
    }

    /// Adds a per-action offset so results show which actions ran
    fn marking(action: ActionName, mut buffer: AudioBuffer) -> Result<AudioBuffer, TransformError> {
        let offset = (ActionName::ALL.iter().position(|a| *a == action).unwrap_or(0) + 1) as f32;
        for channel in &mut buffer.samples {
            for s in channel.iter_mut() {
                *s = *s * 10.0 + offset;
            }
        }
        Ok(buffer)
    }

    fn run(text: &str, stems: StemSet) -> Result<ExecutionOutput, RuntimeError> {
        let plan = plan::build(&parse(text).unwrap()).unwrap();
        execute(&plan, stems, &marking)
    }

    #[test]
    fn test_actions_fold_left_to_right() {
        let seen = RefCell::new(Vec::new());
        let record = |action: ActionName, buffer: AudioBuffer| {
            seen.borrow_mut().push(action);
            Ok::<_, TransformError>(buffer)
        };
        let plan = plan::build(&parse("vocals -> flat -> early -> save(v);").unwrap()).unwrap();

        let output = execute(&plan, all_stems(), &record).unwrap();
        assert_eq!(seen.into_inner(), vec![ActionName::Flat, ActionName::Early]);
        assert_eq!(output.retained_names(), vec!["v"]);
    }

    #[test]
    fn test_sink_reads_see_producer_output() {
        let output = run("bass -> late -> b; b -> flat -> save(x);", all_stems()).unwrap();
        // bass = 0.0, late = 2, flat = 3
        assert_eq!(output.retained[0].buffer.channel(0)[0], 23.0);
        assert_eq!(output.stats.released, vec!["b"]);
    }

    #[test]
    fn test_retained_sink_is_snapshot() {
        let output = run("vocals -> save(v); v -> flat -> save(w);", all_stems()).unwrap();
        let v = &output.retained[0].buffer;
        let w = &output.retained[1].buffer;
        assert!((v.channel(0)[0] - 0.4).abs() < 1e-6);
        assert!((w.channel(0)[0] - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_stem() {
        let stems = StemSet::new().with(Stem::Vocals, constant(0.1));
        let err = run("vocals -> save(v); piano -> save(p);", stems).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::MissingStem {
                stem: Stem::Piano,
                statement: 1
            }
        );
    }

    #[test]
    fn test_transform_failure_aborts() {
        let failing = |action: ActionName, buffer: AudioBuffer| {
            match action {
                ActionName::Sharp => Err(TransformError::Failed("boom".to_string())),
                _ => Ok::<_, TransformError>(buffer),
            }
        };
        let plan =
            plan::build(&parse("vocals -> flat -> sharp -> save(v);").unwrap()).unwrap();

        let err = execute(&plan, all_stems(), &failing).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::TransformFailed {
                statement: 0,
                action: ActionName::Sharp,
                ..
            }
        ));
    }

    #[test]
    fn test_sample_rate_change_rejected() {
        let resample = |_: ActionName, mut buffer: AudioBuffer| {
            buffer.sample_rate = 22050;
            Ok::<_, TransformError>(buffer)
        };
        let plan = plan::build(&parse("vocals -> octavedown -> save(v);").unwrap()).unwrap();

        let err = execute(&plan, all_stems(), &resample).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::IncompatibleSampleRate {
                expected: 44100,
                found: 22050,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_output_rejected() {
        let nan = |_: ActionName, mut buffer: AudioBuffer| {
            buffer.samples[0][0] = f32::NAN;
            Ok::<_, TransformError>(buffer)
        };
        let plan = plan::build(&parse("drums -> late -> save(d);").unwrap()).unwrap();

        let err = execute(&plan, all_stems(), &nan).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::TransformFailed {
                source: TransformError::NonFinite,
                ..
            }
        ));
    }

    #[test]
    fn test_ragged_output_rejected() {
        let lengthen_right = |_: ActionName, mut buffer: AudioBuffer| {
            buffer = buffer.to_stereo();
            buffer.samples[1].extend([0.1; 4]);
            Ok::<_, TransformError>(buffer)
        };
        let plan = plan::build(&parse("vocals -> late -> save(v);").unwrap()).unwrap();

        let err = execute(&plan, all_stems(), &lengthen_right).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::TransformFailed {
                statement: 0,
                action: ActionName::Late,
                source: TransformError::InvalidLayout(_),
            }
        ));
    }

    #[test]
    fn test_extra_channels_rejected() {
        let surround = |_: ActionName, mut buffer: AudioBuffer| {
            let channel = buffer.samples[0].clone();
            buffer.samples = vec![channel; 6];
            Ok::<_, TransformError>(buffer)
        };
        let plan = plan::build(&parse("bass -> flat -> save(b);").unwrap()).unwrap();

        let err = execute(&plan, all_stems(), &surround).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::TransformFailed {
                source: TransformError::InvalidLayout(_),
                ..
            }
        ));
    }

    #[test]
    fn test_retained_sink_read_later_not_released() {
        let output = run("vocals -> save(v); v -> flat -> save(w);", all_stems()).unwrap();
        assert_eq!(output.retained_names(), vec!["v", "w"]);
        assert!(output.stats.released.is_empty());

        let output = run("vocals -> save(v); v -> tmp; tmp -> save(w);", all_stems()).unwrap();
        assert_eq!(output.stats.released, vec!["tmp"]);
    }

    #[test]
    fn test_working_set_stays_bounded() {
        let text = "
            vocals -> a;
            a -> flat -> b;
            b -> flat -> c;
            c -> flat -> d;
            d -> flat -> save(e);
        ";
        let output = run(text, all_stems()).unwrap();
        assert_eq!(output.stats.peak_live_buffers, 1);
        assert_eq!(output.stats.released, vec!["a", "b", "c", "d"]);
        assert_eq!(output.stats.statements_run, 5);
        assert_eq!(output.stats.transforms_applied, 4);
    }

    #[test]
    fn test_dead_sink_released_immediately() {
        let output = run("vocals -> flat -> scratch; bass -> save(b);", all_stems()).unwrap();
        assert_eq!(output.stats.released, vec!["scratch"]);
        assert_eq!(output.retained_names(), vec!["b"]);
    }
}
