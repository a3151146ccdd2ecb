//! The typed error model.
//!
//! Every failure the interpreter raises is a [`LampError`]: an [`ErrorKind`]
//! tag plus the identity of the file (or REPL session) it came from. Nothing
//! recovers internally — errors unwind through ordinary `Result` returns to
//! the driver, which either formats them or re-raises them raw.

use thiserror::Error;

/// Result alias used across the interpreter crates.
pub type LampResult<T> = Result<T, LampError>;

/// The failure kinds the interpreter can raise.
///
/// The `#[error]` strings are the user-facing messages; [`ErrorKind::name`]
/// supplies the `(<Kind>)` tag in the formatted report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// Read of an unbound variable name.
    #[error("Variable not found: {0}")]
    InvalidVariable(String),

    /// A source or import file could not be opened.
    #[error("File {0} was not found, try checking if you included the file extension")]
    MissingFile(String),

    /// Call-site argument count does not match the declared parameter count.
    #[error("{func} takes {expected} arguments but {received} were given")]
    ArgumentError {
        received: usize,
        expected: usize,
        func: String,
    },

    /// No function record matches the requested (namespace,) name.
    #[error("Function not found: {0}")]
    InvalidFunction(String),

    /// Struct member access for a member the type does not declare.
    #[error("{struct_id} has no property named {member}")]
    InvalidProperty { member: String, struct_id: String },

    /// Import path names an unrecognized provider prefix before `:`.
    #[error("Unknown package provider: {0}")]
    InvalidPackageProvider(String),

    /// An operator or block received operands outside its defined type pairs.
    #[error("{0}")]
    TypeMismatch(String),

    /// A foreign callable raised on the other side of the boundary.
    #[error("{0}")]
    ForeignError(String),

    /// Parse failure, as rendered by the external parser (expected-token
    /// set, line, column).
    #[error("{0}")]
    Syntax(String),
}

impl ErrorKind {
    /// The kind tag printed inside `ERROR (<Kind>)`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidVariable(_) => "InvalidVariable",
            Self::MissingFile(_) => "MissingFile",
            Self::ArgumentError { .. } => "ArgumentError",
            Self::InvalidFunction(_) => "InvalidFunction",
            Self::InvalidProperty { .. } => "InvalidProperty",
            Self::InvalidPackageProvider(_) => "InvalidPackageProvider",
            Self::TypeMismatch(_) => "TypeMismatch",
            Self::ForeignError(_) => "ForeignError",
            Self::Syntax(_) => "Syntax",
        }
    }
}

/// A typed failure carrying the file identity it originated from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("On file: {file}\nERROR ({}): {kind}", .kind.name())]
pub struct LampError {
    pub kind: ErrorKind,
    pub file: String,
}

impl LampError {
    pub fn new(kind: ErrorKind, file: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_format() {
        let err = LampError::new(ErrorKind::InvalidVariable("x".into()), "main.lmp");
        assert_eq!(
            err.to_string(),
            "On file: main.lmp\nERROR (InvalidVariable): Variable not found: x"
        );
    }

    #[test]
    fn argument_error_carries_counts() {
        let err = ErrorKind::ArgumentError {
            received: 1,
            expected: 2,
            func: "add".into(),
        };
        assert_eq!(err.to_string(), "add takes 2 arguments but 1 were given");
    }
}
