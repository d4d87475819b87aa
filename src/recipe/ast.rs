//! Parsed recipe structure
//!
//! A [`RecipeDocument`] is the ordered list of statements exactly as written.
//! Its `Display` impl is the canonical form: one statement per line.

use serde::{Deserialize, Serialize};

use super::token::Span;
use crate::stems::Stem;

/// The closed action vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionName {
    Early,
    Late,
    Flat,
    Sharp,
    HalfFlat,
    HalfSharp,
    OctaveUp,
    OctaveDown,
}

impl ActionName {
    /// Every action, in keyword order
    pub const ALL: [ActionName; 8] = [
        ActionName::Early,
        ActionName::Late,
        ActionName::Flat,
        ActionName::Sharp,
        ActionName::HalfFlat,
        ActionName::HalfSharp,
        ActionName::OctaveUp,
        ActionName::OctaveDown,
    ];

    /// Recipe keyword for this action
    pub fn keyword(&self) -> &'static str {
        match self {
            ActionName::Early => "early",
            ActionName::Late => "late",
            ActionName::Flat => "flat",
            ActionName::Sharp => "sharp",
            ActionName::HalfFlat => "halfflat",
            ActionName::HalfSharp => "halfsharp",
            ActionName::OctaveUp => "octaveup",
            ActionName::OctaveDown => "octavedown",
        }
    }

    /// Look up an action by its keyword (case-sensitive)
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.keyword() == word)
    }

    /// Short human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ActionName::Early => "shift the track earlier in time",
            ActionName::Late => "shift the track later in time",
            ActionName::Flat => "lower the pitch by one semitone",
            ActionName::Sharp => "raise the pitch by one semitone",
            ActionName::HalfFlat => "lower the pitch by a quarter tone",
            ActionName::HalfSharp => "raise the pitch by a quarter tone",
            ActionName::OctaveUp => "raise the pitch by an octave",
            ActionName::OctaveDown => "lower the pitch by an octave",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Where a statement reads its starting audio from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceRef {
    /// One of the separated stems
    Primitive(Stem),
    /// A sink defined by an earlier statement
    Defined(String),
}

impl SourceRef {
    pub fn name(&self) -> &str {
        match self {
            SourceRef::Primitive(stem) => stem.name(),
            SourceRef::Defined(name) => name,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The named result of a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkSpec {
    pub name: String,
    /// Written as `save(name)`; included in the final mix
    pub retained: bool,
}

impl std::fmt::Display for SinkSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.retained {
            write!(f, "save({})", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// One `source -> action ... -> sink;` clause
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatement {
    pub source: SourceRef,
    pub actions: Vec<ActionName>,
    pub sink: SinkSpec,
    /// Position of the source token
    pub span: Span,
}

/// Structural equality; positions are ignored
impl PartialEq for PipelineStatement {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.actions == other.actions && self.sink == other.sink
    }
}

impl Eq for PipelineStatement {}

impl std::fmt::Display for PipelineStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)?;
        for action in &self.actions {
            write!(f, " -> {}", action)?;
        }
        write!(f, " -> {};", self.sink)
    }
}

/// Ordered statements of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RecipeDocument {
    pub statements: Vec<PipelineStatement>,
}

impl RecipeDocument {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineStatement> {
        self.statements.iter()
    }
}

impl std::fmt::Display for RecipeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_keywords_roundtrip() {
        for action in ActionName::ALL {
            assert_eq!(ActionName::from_keyword(action.keyword()), Some(action));
        }
        assert_eq!(ActionName::from_keyword("Flat"), None);
        assert_eq!(ActionName::from_keyword("drop"), None);
    }

    #[test]
    fn test_statement_display() {
        let statement = PipelineStatement {
            source: SourceRef::Primitive(Stem::Vocals),
            actions: vec![ActionName::Flat, ActionName::Early],
            sink: SinkSpec {
                name: "newVocals".to_string(),
                retained: true,
            },
            span: Span::default(),
        };
        assert_eq!(statement.to_string(), "vocals -> flat -> early -> save(newVocals);");
    }

    #[test]
    fn test_passthrough_display() {
        let statement = PipelineStatement {
            source: SourceRef::Defined("lateBass".to_string()),
            actions: Vec::new(),
            sink: SinkSpec {
                name: "copy".to_string(),
                retained: false,
            },
            span: Span::default(),
        };
        assert_eq!(statement.to_string(), "lateBass -> copy;");
    }
}
