// This module defines the error types raised while decoding mangled symbol names, using the
// thiserror crate. DemangleError covers every way a decode can fail: input that ends in the
// middle of a production, a byte that does not match what the grammar requires, a value
// that violates a structural rule, a missing integer, a marker that never shows up where
// the grammar looks for it and integer overflow. Each variant records the byte offset at which the failure was
// detected so callers can report where decoding stopped. DemangleResult<T> is the
// convenience alias used throughout the scanner, the text decoder and the grammar.

//! Error types for the demangler.
//!
//! Decoding is all-or-nothing: the first error aborts the whole decode.

use thiserror::Error;

/// Main error type for decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DemangleError {
    #[error("input ended prematurely at offset {pos}")]
    EndedPrematurely { pos: usize },

    #[error("expected {expected} at offset {pos}")]
    MatchFailed { pos: usize, expected: String },

    #[error("unexpected structure at offset {pos}")]
    Unexpected { pos: usize },

    #[error("expected an integer at offset {pos}")]
    ExpectedInt { pos: usize },

    #[error("no {target} found at offset {pos}")]
    SearchFailed { pos: usize, target: String },

    #[error("integer overflow at offset {pos}")]
    IntegerOverflow { pos: usize },
}

impl DemangleError {
    /// Byte offset at which the error was detected.
    pub fn position(&self) -> usize {
        match self {
            DemangleError::EndedPrematurely { pos }
            | DemangleError::MatchFailed { pos, .. }
            | DemangleError::Unexpected { pos }
            | DemangleError::ExpectedInt { pos }
            | DemangleError::SearchFailed { pos, .. }
            | DemangleError::IntegerOverflow { pos } => *pos,
        }
    }
}

/// Result type alias for decode operations.
pub type DemangleResult<T> = Result<T, DemangleError>;
