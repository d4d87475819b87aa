//! Error handling for Stemweave
//!
//! Recipe evaluation fails in one of three classes, each aborting the whole run:
//! - [`SyntaxError`]: the recipe text does not match the grammar
//! - [`SemanticError`]: the statements break a naming rule
//! - [`RuntimeError`]: execution or mixing failed
//!
//! [`StemweaveError`] wraps all three together with the file and audio
//! errors raised by the I/O collaborators.

use thiserror::Error;

use crate::recipe::{ActionName, Span};
use crate::stems::Stem;

/// Result type alias for Stemweave operations
pub type Result<T> = std::result::Result<T, StemweaveError>;

// ============================================================================
// Syntax errors
// ============================================================================

/// What went wrong while tokenizing or parsing a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// The recipe contains no statements
    EmptyDocument,
    /// A character outside the recipe alphabet
    UnexpectedChar(char),
    /// A token that cannot appear here
    UnexpectedToken { found: String, expected: &'static str },
    /// Input ended in the middle of a statement
    UnexpectedEof { expected: &'static str },
    /// A statement with a source but no steps
    MissingSink,
    /// `->` followed directly by another `->` or `;`
    EmptyStep,
    /// An action keyword in the terminal sink position
    ActionAsSink(ActionName),
    /// An action keyword in the source position
    ActionAsSource(ActionName),
    /// A sink (or unknown word) followed by more steps
    SinkMidChain(String),
    /// `save(` with no identifier inside
    EmptySaveName,
}

impl std::fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxErrorKind::EmptyDocument => write!(f, "recipe contains no statements"),
            SyntaxErrorKind::UnexpectedChar(c) => write!(f, "unexpected character '{}'", c),
            SyntaxErrorKind::UnexpectedToken { found, expected } => {
                write!(f, "unexpected '{}', expected {}", found, expected)
            }
            SyntaxErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of recipe, expected {}", expected)
            }
            SyntaxErrorKind::MissingSink => write!(f, "statement has no sink"),
            SyntaxErrorKind::EmptyStep => write!(f, "empty step between arrows"),
            SyntaxErrorKind::ActionAsSink(action) => {
                write!(f, "action '{}' cannot end a statement, a sink is required", action)
            }
            SyntaxErrorKind::ActionAsSource(action) => {
                write!(f, "action '{}' cannot be used as a source", action)
            }
            SyntaxErrorKind::SinkMidChain(name) => write!(
                f,
                "'{}' is not an action; a sink must be the last step of a statement",
                name
            ),
            SyntaxErrorKind::EmptySaveName => write!(f, "save() requires a sink name"),
        }
    }
}

/// Malformed recipe text, reported at the first offending token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at {span}: {kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ============================================================================
// Semantic errors
// ============================================================================

/// A well-formed recipe that breaks a naming rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("statement {statement}: '{name}' is not a stem or an earlier sink")]
    UnknownReference { name: String, statement: usize },

    #[error("statement {statement}: sink '{name}' is already defined by statement {first_defined}")]
    DuplicateName {
        name: String,
        statement: usize,
        first_defined: usize,
    },

    #[error("statement {statement}: '{name}' is a reserved stem name")]
    ReservedName { name: String, statement: usize },

    #[error("recipe saves nothing; wrap at least one sink in save(...)")]
    EmptyOutput,
}

impl SemanticError {
    /// Statement index the error points at, if any
    pub fn statement(&self) -> Option<usize> {
        match self {
            SemanticError::UnknownReference { statement, .. }
            | SemanticError::DuplicateName { statement, .. }
            | SemanticError::ReservedName { statement, .. } => Some(*statement),
            SemanticError::EmptyOutput => None,
        }
    }
}

// ============================================================================
// Runtime errors
// ============================================================================

/// Failure raised by a transform implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("transform produced invalid audio (NaN/Inf)")]
    NonFinite,

    #[error("transform returned a malformed buffer: {0}")]
    InvalidLayout(String),

    #[error("{0}")]
    Failed(String),
}

/// Failure while executing a plan or mixing its output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("statement {statement}: stem '{stem}' was not produced by separation")]
    MissingStem { stem: Stem, statement: usize },

    /// Only reachable with a plan built from a different document
    #[error("statement {statement}: sink '{name}' is no longer available")]
    MissingSink { name: String, statement: usize },

    #[error("statement {statement}: action '{action}' failed: {source}")]
    TransformFailed {
        statement: usize,
        action: ActionName,
        #[source]
        source: TransformError,
    },

    #[error("incompatible sample rate in {context}: expected {expected} Hz, found {found} Hz")]
    IncompatibleSampleRate {
        context: String,
        expected: u32,
        found: u32,
    },

    #[error("no retained buffers to mix")]
    NothingToMix,
}

// ============================================================================
// Crate error
// ============================================================================

/// Main error type for Stemweave operations
#[derive(Error, Debug)]
pub enum StemweaveError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StemweaveError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StemweaveError::Syntax(_) => "SYNTAX_ERROR",
            StemweaveError::Semantic(SemanticError::UnknownReference { .. }) => "UNKNOWN_REFERENCE",
            StemweaveError::Semantic(SemanticError::DuplicateName { .. }) => "DUPLICATE_NAME",
            StemweaveError::Semantic(SemanticError::ReservedName { .. }) => "RESERVED_NAME",
            StemweaveError::Semantic(SemanticError::EmptyOutput) => "EMPTY_OUTPUT",
            StemweaveError::Runtime(RuntimeError::MissingStem { .. }) => "MISSING_STEM",
            StemweaveError::Runtime(RuntimeError::MissingSink { .. }) => "MISSING_SINK",
            StemweaveError::Runtime(RuntimeError::TransformFailed { .. }) => "TRANSFORM_FAILED",
            StemweaveError::Runtime(RuntimeError::IncompatibleSampleRate { .. }) => {
                "INCOMPATIBLE_SAMPLE_RATE"
            }
            StemweaveError::Runtime(RuntimeError::NothingToMix) => "NOTHING_TO_MIX",
            StemweaveError::FileNotFound { .. } => "FILE_NOT_FOUND",
            StemweaveError::InvalidAudio { .. } => "INVALID_AUDIO",
            StemweaveError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            StemweaveError::EmptyAudio => "EMPTY_AUDIO",
            StemweaveError::Config { .. } => "CONFIG_ERROR",
            StemweaveError::Io(_) => "IO_ERROR",
            StemweaveError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the error comes from the recipe text rather than the audio
    pub fn is_recipe_error(&self) -> bool {
        matches!(self, StemweaveError::Syntax(_) | StemweaveError::Semantic(_))
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StemweaveError::Syntax(_) => vec![
                "Every statement has the form: source -> action ... -> sink;",
                "Only the last step of a statement may be a sink",
                "Run 'stemweave-cli actions' to list valid actions",
            ],
            StemweaveError::Semantic(SemanticError::UnknownReference { .. }) => vec![
                "Sources must be a stem (bass, drums, other, piano, vocals)",
                "Or a sink defined by an earlier statement",
            ],
            StemweaveError::Semantic(SemanticError::DuplicateName { .. }) => {
                vec!["Give each sink a unique name"]
            }
            StemweaveError::Semantic(SemanticError::ReservedName { .. }) => {
                vec!["Stem names cannot be reused as sink names"]
            }
            StemweaveError::Semantic(SemanticError::EmptyOutput) => {
                vec!["Wrap at least one sink in save(...) to include it in the output"]
            }
            StemweaveError::Runtime(RuntimeError::MissingStem { .. }) => vec![
                "Check the stems directory contains <stem>.wav for every stem used",
                "2- and 4-stem separations do not produce piano",
            ],
            StemweaveError::Runtime(RuntimeError::IncompatibleSampleRate { .. }) => {
                vec!["Re-export all stems at the same sample rate"]
            }
            StemweaveError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "The file may be corrupted - try re-exporting from source",
            ],
            StemweaveError::UnsupportedFormat { .. } => {
                vec!["Only mono or stereo 8/16/24/32-bit WAV files are supported"]
            }
            _ => vec![],
        }
    }
}
