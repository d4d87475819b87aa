//! Recipe Tests
//!
//! Parse, validate and execute recipes through the public API, with closure
//! transforms standing in for the audio processing.

use std::cell::RefCell;

use pretty_assertions::assert_eq;
use test_case::test_case;

use stemweave::engine::AudioBuffer;
use stemweave::error::{RuntimeError, SemanticError, TransformError};
use stemweave::pipeline::{execute, mix, MixOptions};
use stemweave::plan::{self, ResolvedSource};
use stemweave::recipe::{parse, ActionName, SourceRef};
use stemweave::stems::{Stem, StemSet};
use stemweave::{compile, StemweaveError};

const MULTI: &str = "
vocals -> save(vocals1);
vocals -> octaveup -> save(vocals2);
bass -> late -> lateBass;
lateBass -> flat -> save(flatBass);
lateBass -> halfflat -> save(halfFlatBass);
drums -> save(drums);
other -> save(other);
piano -> save(piano);
";

fn stems(len: usize) -> StemSet {
    Stem::ALL
        .iter()
        .map(|stem| {
            let buffer = AudioBuffer::from_channels(vec![vec![0.01; len]], 44100).unwrap();
            (*stem, buffer)
        })
        .collect()
}

fn passthrough(_: ActionName, buffer: AudioBuffer) -> Result<AudioBuffer, TransformError> {
    Ok(buffer)
}

#[test]
fn test_canonical_form_reparses_to_same_document() {
    let document = parse(MULTI).unwrap();
    let reparsed = parse(&document.to_string()).unwrap();
    assert_eq!(reparsed, document);
}

#[test]
fn test_actions_apply_in_written_order() {
    let plan = compile("vocals -> flat -> early -> save(newVocals);").unwrap();
    let statement = &plan.statements[0];
    assert_eq!(statement.source, ResolvedSource::Stem(Stem::Vocals));
    assert_eq!(statement.actions, vec![ActionName::Flat, ActionName::Early]);
    assert_eq!(plan.retained, vec!["newVocals"]);

    let applied = RefCell::new(Vec::new());
    let record = |action: ActionName, buffer: AudioBuffer| {
        applied.borrow_mut().push(action);
        Ok::<_, TransformError>(buffer)
    };
    let output = execute(&plan, stems(16), &record).unwrap();

    assert_eq!(applied.into_inner(), vec![ActionName::Flat, ActionName::Early]);
    assert_eq!(output.retained_names(), vec!["newVocals"]);
}

#[test]
fn test_multi_statement_recipe_mixes_seven_buffers() {
    let plan = compile(MULTI).unwrap();
    let output = execute(&plan, stems(32), &passthrough).unwrap();

    assert_eq!(
        output.retained_names(),
        vec!["vocals1", "vocals2", "flatBass", "halfFlatBass", "drums", "other", "piano"]
    );
    assert_eq!(output.stats.released, vec!["lateBass"]);

    let track = mix(output.retained, &MixOptions::default()).unwrap();
    assert_eq!(track.sources.len(), 7);
    assert!(!track.sources.contains(&"lateBass".to_string()));
    assert!((track.buffer.channel(0)[0] - 0.07).abs() < 1e-5);
}

#[test]
fn test_temporary_sink_read_by_later_statements() {
    let document = parse(MULTI).unwrap();
    let statements: Vec<_> = document.iter().collect();
    assert_eq!(statements[3].source, SourceRef::Defined("lateBass".to_string()));

    let plan = plan::build(&document).unwrap();
    assert_eq!(plan.statements[2].readers, 2);
    assert!(!plan.retained.contains(&"lateBass".to_string()));
}

#[test]
fn test_forward_reference_rejected() {
    let err = compile("x -> save(y); vocals -> x;").unwrap_err();
    assert!(matches!(
        err,
        StemweaveError::Semantic(SemanticError::UnknownReference { ref name, statement: 0 })
            if name == "x"
    ));
}

#[test]
fn test_identical_redefinition_rejected() {
    let err = compile("bass -> late -> b; bass -> late -> b; b -> save(out);").unwrap_err();
    assert_eq!(err.error_code(), "DUPLICATE_NAME");
}

#[test]
fn test_only_temporary_sinks_is_empty_output() {
    let err = compile("vocals -> flat -> a; a -> sharp -> b;").unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_OUTPUT");
}

#[test_case("vocals -> -> save(x);" ; "empty step")]
#[test_case("vocals -> save(x) -> flat;" ; "save before the end")]
#[test_case("vocals -> x -> flat;" ; "sink before the end")]
#[test_case("vocals -> flat;" ; "action as sink")]
#[test_case("flat -> save(x);" ; "action as source")]
#[test_case("vocals -> save(x)" ; "missing semicolon")]
#[test_case("vocals -> save();" ; "empty save")]
#[test_case("vocals => save(x);" ; "bad arrow")]
#[test_case("   " ; "blank recipe")]
fn test_malformed_recipe(text: &str) {
    let err = compile(text).unwrap_err();
    assert!(matches!(err, StemweaveError::Syntax(_)), "{}", err);
}

#[test]
fn test_mixing_pads_to_longest() {
    let mut stems = stems(10);
    stems.insert(
        Stem::Drums,
        AudioBuffer::from_channels(vec![vec![0.5; 25]], 44100).unwrap(),
    );

    let plan = compile("vocals -> save(v); drums -> save(d);").unwrap();
    let output = execute(&plan, stems, &passthrough).unwrap();
    let track = mix(output.retained, &MixOptions::default()).unwrap();

    assert_eq!(track.buffer.len(), 25);
    assert!((track.buffer.channel(0)[24] - 0.5).abs() < 1e-6);
}

#[test]
fn test_missing_stem_only_fails_when_read() {
    let mut four_stems = stems(8);
    four_stems.take(Stem::Piano);

    let plan = compile("vocals -> save(v); bass -> save(b);").unwrap();
    assert!(execute(&plan, four_stems.clone(), &passthrough).is_ok());

    let plan = compile("piano -> save(p);").unwrap();
    let err = execute(&plan, four_stems, &passthrough).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::MissingStem {
            stem: Stem::Piano,
            statement: 0
        }
    );
}

#[test]
fn test_dropped_statements_do_not_run() {
    let applied = RefCell::new(0);
    let count = |_: ActionName, buffer: AudioBuffer| {
        *applied.borrow_mut() += 1;
        Ok::<_, TransformError>(buffer)
    };

    let plan = compile("vocals -> octaveup -> drop; vocals -> save(v);").unwrap();
    execute(&plan, stems(4), &count).unwrap();
    assert_eq!(applied.into_inner(), 0);
}
