use std::fmt;
use thiserror::Error;

/// Why a requirement line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("no version operator found (expected one of ==, ~=, >=, <=, >, <, !=)")]
    MissingOperator,
    #[error("requirement has an empty tool name")]
    EmptyName,
    #[error("invalid tool name '{0}'")]
    InvalidName(String),
    #[error("invalid extra '{0}'")]
    InvalidExtra(String),
    #[error("unbalanced extras brackets")]
    UnbalancedExtras,
    #[error("requirement has an empty version")]
    EmptyVersion,
    #[error("invalid version '{0}'")]
    InvalidVersion(String),
}

/// A manifest line that failed to parse.
///
/// Parsing never stops at the first bad line; every malformed line is
/// collected so the caller can decide what is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: {reason}: '{text}'")]
    MalformedLine {
        /// 1-based line number in the source text.
        line: usize,
        /// The raw line as it appeared in the source.
        text: String,
        reason: MalformedReason,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedLine { line, .. } => *line,
        }
    }
}

/// All malformed lines of a manifest, returned when a caller asks for a strict parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} malformed line(s) in manifest", .0.len())]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }
}

/// Non-fatal observations made while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// The same tool (after name normalisation) is declared more than once.
    DuplicateEntry {
        name: String,
        first_line: usize,
        line: usize,
        /// True when the repeated declaration uses a different operator or version.
        conflicting: bool,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::DuplicateEntry {
                name,
                first_line,
                line,
                conflicting,
            } => {
                let kind = if *conflicting {
                    "conflicting duplicate"
                } else {
                    "duplicate"
                };
                write!(
                    f,
                    "line {line}: {kind} entry for '{name}' (first declared on line {first_line})"
                )
            }
        }
    }
}
