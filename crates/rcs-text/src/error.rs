//! Errors for reading and writing RCS text.

use std::{fmt, io};

use rcs_core::{EncodingError, RevisionId, StructuralError};
use thiserror::Error;

/// Errors that can occur while reading or writing an RCS file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("line {line}: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: EncodingError,
    },

    #[error("line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },

    #[error("input is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("formatting error: {0}")]
    Format(#[from] fmt::Error),
}

/// What went wrong at a particular line of the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found:?}")]
    Expected { expected: String, found: String },

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    #[error("unknown keyword {0:?}")]
    UnknownKeyword(String),

    #[error("invalid revision id {0:?}")]
    InvalidId(String),

    #[error("content entry for {found} out of order, expected {expected}")]
    ContentOutOfOrder {
        expected: RevisionId,
        found: RevisionId,
    },

    #[error("content entry for {0} has no index entry")]
    UnexpectedContent(RevisionId),

    #[error("revision {0} has no content entry")]
    MissingContent(RevisionId),
}

impl Error {
    /// Line number the error was detected on, if it came from input text.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Encoding { line, .. } | Error::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
