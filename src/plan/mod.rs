//! Semantic Validation and Plan Building
//!
//! Walks a [`RecipeDocument`] in order, resolving every source against the
//! stems and the sinks defined so far. The resulting [`ExecutionPlan`] also
//! records how many statements read each buffer, which is all the executor
//! needs to release buffers as soon as their last reader has run.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use serde::Serialize;

use crate::error::SemanticError;
use crate::recipe::{ActionName, RecipeDocument, SinkSpec, SourceRef};
use crate::stems::Stem;

/// Where a planned statement takes its input from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolvedSource {
    Stem(Stem),
    /// Sink produced by the statement at `statement`
    Sink { name: String, statement: usize },
}

impl std::fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedSource::Stem(stem) => write!(f, "{} (stem)", stem),
            ResolvedSource::Sink { name, statement } => write!(f, "{} (#{})", name, statement),
        }
    }
}

/// A validated statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStatement {
    /// Position in document order
    pub index: usize,
    pub source: ResolvedSource,
    pub actions: Vec<ActionName>,
    pub sink: SinkSpec,
    /// Later statements reading this sink
    pub readers: usize,
}

impl PlannedStatement {
    /// Neither saved nor read by anything
    pub fn is_dead(&self) -> bool {
        !self.sink.retained && self.readers == 0
    }
}

/// Validated, linearly ordered recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub statements: Vec<PlannedStatement>,
    /// Retained sink names in document order
    pub retained: Vec<String>,
    /// Statements reading each stem; stems absent here are never read
    pub stem_readers: BTreeMap<Stem, usize>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Stems some statement reads
    pub fn required_stems(&self) -> BTreeSet<Stem> {
        self.stem_readers.keys().copied().collect()
    }

    /// Non-retained sinks nothing reads
    pub fn dead_sinks(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter(|s| s.is_dead())
            .map(|s| s.sink.name.as_str())
            .collect()
    }

    /// Total number of transform applications
    pub fn transform_count(&self) -> usize {
        self.statements.iter().map(|s| s.actions.len()).sum()
    }
}

struct Definition {
    statement: usize,
}

/// Validate a document and build its execution plan
///
/// Names are checked in document order, so a sink can only be read by
/// statements after the one defining it.
pub fn build(document: &RecipeDocument) -> Result<ExecutionPlan, SemanticError> {
    let mut known: HashMap<&str, Definition> = HashMap::new();
    let mut retapped: HashMap<Stem, usize> = HashMap::new();
    let mut statements: Vec<PlannedStatement> = Vec::with_capacity(document.len());
    let mut stem_readers: BTreeMap<Stem, usize> = BTreeMap::new();

    for (index, statement) in document.iter().enumerate() {
        let source = match &statement.source {
            SourceRef::Primitive(stem) => {
                *stem_readers.entry(*stem).or_insert(0) += 1;
                ResolvedSource::Stem(*stem)
            }
            SourceRef::Defined(name) => {
                let definition = known.get(name.as_str()).ok_or_else(|| {
                    SemanticError::UnknownReference {
                        name: name.clone(),
                        statement: index,
                    }
                })?;
                statements[definition.statement].readers += 1;
                ResolvedSource::Sink {
                    name: name.clone(),
                    statement: definition.statement,
                }
            }
        };

        let sink_name = statement.sink.name.as_str();
        if let Some(stem) = Stem::from_name(sink_name) {
            // `drums -> ... -> save(drums);` re-taps a stem under its own name
            if statement.source != SourceRef::Primitive(stem) {
                return Err(SemanticError::ReservedName {
                    name: sink_name.to_string(),
                    statement: index,
                });
            }
            if let Some(&first_defined) = retapped.get(&stem) {
                return Err(SemanticError::DuplicateName {
                    name: sink_name.to_string(),
                    statement: index,
                    first_defined,
                });
            }
            retapped.insert(stem, index);
        } else if let Some(first) = known.get(sink_name) {
            return Err(SemanticError::DuplicateName {
                name: sink_name.to_string(),
                statement: index,
                first_defined: first.statement,
            });
        } else {
            known.insert(sink_name, Definition { statement: index });
        }

        debug!("Planned statement {}: {} -> {}", index, source, statement.sink);
        statements.push(PlannedStatement {
            index,
            source,
            actions: statement.actions.clone(),
            sink: statement.sink.clone(),
            readers: 0,
        });
    }

    let retained: Vec<String> = statements
        .iter()
        .filter(|s| s.sink.retained)
        .map(|s| s.sink.name.clone())
        .collect();
    if retained.is_empty() {
        return Err(SemanticError::EmptyOutput);
    }

    let plan = ExecutionPlan {
        statements,
        retained,
        stem_readers,
    };
    for name in plan.dead_sinks() {
        warn!("Sink '{}' is neither saved nor used by a later statement", name);
    }

    Ok(plan)
}
