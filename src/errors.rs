//! Error and warning types for the PGN pipeline.

use std::fmt;

use thiserror::Error;

/// Classifies a [`PgnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgnErrorKind {
    /// The underlying byte source failed, or the input ended inside a token.
    InputError,
    /// A character that has no meaning at the current position.
    UnexpectedChar,
    /// A well-formed token that is not allowed at the current position.
    UnexpectedToken,
    /// A SAN string that could not be interpreted, or a tree node whose move
    /// is not legal in its position.
    InvalidMove,
    /// A syntactically valid SAN that matches no legal move.
    IllegalMove,
    /// A SAN that matches more than one legal move.
    AmbiguousMove,
    /// A token that looks like a game result but is none of the four markers.
    InvalidGameResult,
    /// A variation was opened at a node without a parent.
    CannotStartRav,
    /// A variation was closed while none was open.
    NoPendingRav,
    /// The input ended in the middle of a game.
    EndOfInput,
}

impl fmt::Display for PgnErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            PgnErrorKind::InputError => "input error",
            PgnErrorKind::UnexpectedChar => "unexpected character",
            PgnErrorKind::UnexpectedToken => "unexpected token",
            PgnErrorKind::InvalidMove => "invalid move",
            PgnErrorKind::IllegalMove => "illegal move",
            PgnErrorKind::AmbiguousMove => "ambiguous move",
            PgnErrorKind::InvalidGameResult => "invalid game result",
            PgnErrorKind::CannotStartRav => "cannot start variation",
            PgnErrorKind::NoPendingRav => "no pending variation",
            PgnErrorKind::EndOfInput => "end of input",
        })
    }
}

/// Error while reading or writing PGN data.
///
/// Carries the kind of failure, the 1-based line number of the offending
/// input (0 when no line applies, e.g. for writer errors) and a free-form
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}: {message}")]
pub struct PgnError {
    pub kind: PgnErrorKind,
    pub line: u32,
    pub message: String,
}

impl PgnError {
    pub fn new(kind: PgnErrorKind, line: u32, message: impl Into<String>) -> PgnError {
        PgnError {
            kind,
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(err: std::io::Error, line: u32) -> PgnError {
        PgnError::new(PgnErrorKind::InputError, line, err.to_string())
    }
}

/// Classifies a [`PgnWarning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgnWarningKind {
    /// Stray punctuation in movetext that was skipped.
    UnexpectedChar,
    /// A capture written without the `x` marker.
    MoveMissingCapture,
    /// A piece move written without its piece letter.
    MoveMissingPieceType,
}

impl fmt::Display for PgnWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            PgnWarningKind::UnexpectedChar => "unexpected character",
            PgnWarningKind::MoveMissingCapture => "move missing capture marker",
            PgnWarningKind::MoveMissingPieceType => "move missing piece type",
        })
    }
}

/// Non-fatal defect noticed while parsing. Collected out-of-band by the
/// parser; never aborts the game being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnWarning {
    pub kind: PgnWarningKind,
    pub line: u32,
    pub message: String,
}

impl PgnWarning {
    pub fn new(kind: PgnWarningKind, line: u32, message: impl Into<String>) -> PgnWarning {
        PgnWarning {
            kind,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for PgnWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}: {}", self.kind, self.line, self.message)
    }
}
