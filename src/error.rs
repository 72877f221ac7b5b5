// ABOUTME: Error taxonomy for the reader, analyzer, and evaluator

use thiserror::Error;

// ===== Arity constant strings (shared across reader/analyzer/evaluator) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ZERO_OR_ONE: &str = "0-1";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";
pub const ARITY_TWO_OR_MORE: &str = "at least 2";

/// Reader-stage failure: source text never made it to a Raw AST.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("read error at {line}:{col}: {message}")]
pub struct ReadError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ReadError {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        ReadError {
            message: message.into(),
            line,
            col,
        }
    }
}

/// Analyzer-stage failure: a Raw AST node didn't lower to a valid Core node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid form: {0}")]
    InvalidForm(String),

    #[error("{form}: expected {expected} argument{}, got {actual}", if expected == "1" { "" } else { "s" })]
    InvalidArity {
        form: String,
        expected: String,
        actual: usize,
    },

    #[error("invalid where form: {0}")]
    InvalidWhereForm(String),

    #[error("invalid where operator: {0}")]
    InvalidWhereOperator(String),

    #[error("invalid call-tool name: {0}")]
    InvalidCallToolName(String),

    #[error("invalid cond form: {0}")]
    InvalidCondForm(String),

    #[error("invalid thread form: {0}")]
    InvalidThreadForm(String),

    #[error("unsupported binding pattern: {0}")]
    UnsupportedPattern(String),

    #[error("invalid placeholder: {0}")]
    InvalidPlaceholder(String),
}

impl AnalysisError {
    pub fn arity(form: &str, expected: impl Into<String>, actual: usize) -> Self {
        AnalysisError::InvalidArity {
            form: form.to_string(),
            expected: expected.into(),
            actual,
        }
    }
}

/// Evaluator-stage failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("unbound var: {0}")]
    UnboundVar(String),

    #[error("value of type {0} is not callable")]
    NotCallable(String),

    #[error("{function}: expected {expected} argument{}, got {got}", if expected == "1" { "" } else { "s" })]
    ArityMismatch {
        function: String,
        expected: String,
        got: usize,
    },

    #[error("{function}: expected {expected}, got {actual}")]
    TypeError {
        function: String,
        expected: String,
        actual: String,
    },

    #[error("tool '{name}' failed: {reason}")]
    ToolError { name: String, reason: String },

    #[error("invalid keyword call: {0}")]
    InvalidKeywordCall(String),

    #[error("{0}")]
    ArityError(String),

    #[error("{0}")]
    Custom(String),
}

impl RuntimeError {
    pub fn type_error(function: &str, expected: &str, actual: &crate::value::Value) -> Self {
        RuntimeError::TypeError {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    pub fn arity_error(function: &str, expected: impl Into<String>, got: usize) -> Self {
        RuntimeError::ArityMismatch {
            function: function.to_string(),
            expected: expected.into(),
            got,
        }
    }
}

/// The top-level, host-visible outcome of a program (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Read(ReadError),
    Analysis(AnalysisError),
    Runtime(RuntimeError),
    /// The program explicitly called `(fail reason)`.
    Fail(crate::value::Value),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Read(e) => write!(f, "{e}"),
            Failure::Analysis(e) => write!(f, "{e}"),
            Failure::Runtime(e) => write!(f, "{e}"),
            Failure::Fail(v) => write!(f, "program failed: {v}"),
        }
    }
}

impl From<ReadError> for Failure {
    fn from(e: ReadError) -> Self {
        Failure::Read(e)
    }
}

impl From<AnalysisError> for Failure {
    fn from(e: AnalysisError) -> Self {
        Failure::Analysis(e)
    }
}

impl From<RuntimeError> for Failure {
    fn from(e: RuntimeError) -> Self {
        Failure::Runtime(e)
    }
}
