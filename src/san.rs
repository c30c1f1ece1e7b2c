//! Read and generate Standard Algebraic Notation.
//!
//! [`parse_san`] turns the textual form of a move into a structured
//! [`SanMove`]; [`generate_san_move`] goes the other way, producing the
//! minimally disambiguated text for a legal move in the context of the full
//! legal move list.
//!
//! # Examples
//!
//! ```
//! use pgn_tree::san::parse_san;
//! use shakmaty::{Color, Role, Square};
//!
//! let san = parse_san("Nf3", Color::White)?;
//! assert_eq!(san.piece.role, Role::Knight);
//! assert_eq!(san.to, Square::F3);
//! assert!(!san.capturing);
//! # Ok::<_, pgn_tree::san::SanError>(())
//! ```

use std::fmt;

use shakmaty::{Color, File, Move, MoveList, Piece, Position, Rank, Role, Square};
use thiserror::Error;

use crate::nag::Nag;

/// Whether a move gives check or checkmate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CheckState {
    #[default]
    None,
    Check,
    Checkmate,
}

impl CheckState {
    /// Reads the check state off a position, i.e. the state of the side to
    /// move after the move in question has been played.
    pub fn from_position<P: Position>(pos: &P) -> CheckState {
        if pos.is_checkmate() {
            CheckState::Checkmate
        } else if pos.is_check() {
            CheckState::Check
        } else {
            CheckState::None
        }
    }

    /// The `+` or `#` marker, if any.
    pub const fn as_str(self) -> &'static str {
        match self {
            CheckState::None => "",
            CheckState::Check => "+",
            CheckState::Checkmate => "#",
        }
    }
}

/// The possible suffix annotations of a SAN move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuffixAnnotation {
    /// `!`
    GoodMove,
    /// `?`
    PoorMove,
    /// `!!`
    VeryGoodMove,
    /// `??`
    VeryPoorMove,
    /// `!?`
    SpeculativeMove,
    /// `?!`
    QuestionableMove,
}

impl SuffixAnnotation {
    pub fn from_ascii(s: &[u8]) -> Option<SuffixAnnotation> {
        match s {
            b"!" => Some(SuffixAnnotation::GoodMove),
            b"?" => Some(SuffixAnnotation::PoorMove),
            b"!!" => Some(SuffixAnnotation::VeryGoodMove),
            b"??" => Some(SuffixAnnotation::VeryPoorMove),
            b"!?" => Some(SuffixAnnotation::SpeculativeMove),
            b"?!" => Some(SuffixAnnotation::QuestionableMove),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SuffixAnnotation::GoodMove => "!",
            SuffixAnnotation::PoorMove => "?",
            SuffixAnnotation::VeryGoodMove => "!!",
            SuffixAnnotation::VeryPoorMove => "??",
            SuffixAnnotation::SpeculativeMove => "!?",
            SuffixAnnotation::QuestionableMove => "?!",
        }
    }

    /// The equivalent numeric annotation glyph.
    pub const fn nag(self) -> Nag {
        match self {
            SuffixAnnotation::GoodMove => Nag::GOOD_MOVE,
            SuffixAnnotation::PoorMove => Nag::MISTAKE,
            SuffixAnnotation::VeryGoodMove => Nag::BRILLIANT_MOVE,
            SuffixAnnotation::VeryPoorMove => Nag::BLUNDER,
            SuffixAnnotation::SpeculativeMove => Nag::SPECULATIVE_MOVE,
            SuffixAnnotation::QuestionableMove => Nag::DUBIOUS_MOVE,
        }
    }
}

impl From<SuffixAnnotation> for Nag {
    fn from(annotation: SuffixAnnotation) -> Nag {
        annotation.nag()
    }
}

impl fmt::Display for SuffixAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A move in Standard Algebraic Notation, decomposed.
///
/// At most one of `disambiguation_file` and `disambiguation_rank` is set on
/// its own; both are set for full-square disambiguation. A SAN describing a
/// pawn capture always carries the pawn's source file as
/// `disambiguation_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanMove {
    /// The original (or generated) textual form, without check markers or
    /// suffix annotation.
    pub san: String,
    /// The moving piece, with color.
    pub piece: Piece,
    /// Target square. For castling this is the king's destination.
    pub to: Square,
    pub capturing: bool,
    pub promotion: Option<Role>,
    pub check_state: CheckState,
    pub disambiguation_file: Option<File>,
    pub disambiguation_rank: Option<Rank>,
    pub suffix: Option<SuffixAnnotation>,
}

impl fmt::Display for SanMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.san, self.check_state.as_str())?;
        if let Some(suffix) = self.suffix {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

/// Error while parsing a SAN string. Carries the offending text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanError {
    #[error("unexpected token in `{san}`")]
    UnexpectedToken { san: String },
    #[error("unexpected characters at the end of `{san}`")]
    UnexpectedCharsAtEnd { san: String },
    #[error("invalid suffix annotation in `{san}`")]
    InvalidSuffixAnnotation { san: String },
    #[error("both check and checkmate in `{san}`")]
    CheckAndCheckmate { san: String },
    #[error("missing piece type in `{san}`")]
    MissingPieceType { san: String },
    #[error("missing rank in `{san}`")]
    MissingRank { san: String },
    #[error("missing file in `{san}`")]
    MissingFile { san: String },
}

/// One lexical element of a SAN string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SanToken {
    PieceType(Role),
    FileChar(File),
    RankChar(Rank),
    Capture,
    Check,
    Checkmate,
    Promotion,
    /// `!` or `?`, with the number of bytes the annotation spans.
    Suffix(usize),
    End,
    Invalid,
}

fn classify(rest: &[u8]) -> SanToken {
    let Some(&byte) = rest.first() else {
        return SanToken::End;
    };
    match byte {
        b'P' => SanToken::PieceType(Role::Pawn),
        b'R' => SanToken::PieceType(Role::Rook),
        b'N' => SanToken::PieceType(Role::Knight),
        b'B' => SanToken::PieceType(Role::Bishop),
        b'Q' => SanToken::PieceType(Role::Queen),
        b'K' => SanToken::PieceType(Role::King),
        b'a'..=b'h' => SanToken::FileChar(File::new(u32::from(byte - b'a'))),
        b'1'..=b'8' => SanToken::RankChar(Rank::new(u32::from(byte - b'1'))),
        b'x' => SanToken::Capture,
        b'+' => SanToken::Check,
        b'#' => SanToken::Checkmate,
        b'=' => SanToken::Promotion,
        b'!' | b'?' => SanToken::Suffix(if rest.len() >= 2 { 2 } else { 1 }),
        _ => SanToken::Invalid,
    }
}

/// Consumes `+`, `#` and a suffix annotation at the end of a SAN.
fn parse_suffixes(
    san: &str,
    rest: &mut &[u8],
    check_state: &mut CheckState,
) -> Result<Option<SuffixAnnotation>, SanError> {
    let mut token = classify(*rest);
    if token == SanToken::Check {
        *check_state = CheckState::Check;
        *rest = &rest[1..];
        token = classify(*rest);
    }
    if token == SanToken::Checkmate {
        if *check_state != CheckState::None {
            return Err(SanError::CheckAndCheckmate { san: san.into() });
        }
        *check_state = CheckState::Checkmate;
        *rest = &rest[1..];
        token = classify(*rest);
    }
    if token == SanToken::Check {
        if *check_state != CheckState::None {
            return Err(SanError::CheckAndCheckmate { san: san.into() });
        }
        *check_state = CheckState::Check;
        *rest = &rest[1..];
        token = classify(*rest);
    }
    if let SanToken::Suffix(len) = token {
        let annotation = SuffixAnnotation::from_ascii(&rest[..len])
            .ok_or_else(|| SanError::InvalidSuffixAnnotation { san: san.into() })?;
        *rest = &rest[len..];
        return Ok(Some(annotation));
    }
    Ok(None)
}

const LONG_CASTLING: &str = "O-O-O";
const SHORT_CASTLING: &str = "O-O";

fn parse_castling(san: &str, side_to_move: Color) -> Result<SanMove, SanError> {
    let (to, consumed) = if san.starts_with(LONG_CASTLING) {
        let to = match side_to_move {
            Color::White => Square::C1,
            Color::Black => Square::C8,
        };
        (to, LONG_CASTLING.len())
    } else {
        let to = match side_to_move {
            Color::White => Square::G1,
            Color::Black => Square::G8,
        };
        (to, SHORT_CASTLING.len())
    };
    let mut rest = &san.as_bytes()[consumed..];
    let mut check_state = CheckState::None;
    let suffix = parse_suffixes(san, &mut rest, &mut check_state)?;
    if !rest.is_empty() {
        return Err(SanError::UnexpectedCharsAtEnd { san: san.into() });
    }
    Ok(SanMove {
        san: san.to_owned(),
        piece: Piece {
            color: side_to_move,
            role: Role::King,
        },
        to,
        capturing: false,
        promotion: None,
        check_state,
        disambiguation_file: None,
        disambiguation_rank: None,
        suffix,
    })
}

/// Parses a SAN string into a [`SanMove`].
///
/// The side to move is needed to color the moving piece and to resolve
/// castling targets.
///
/// # Errors
///
/// Returns a [`SanError`] describing the first defect found.
pub fn parse_san(san: &str, side_to_move: Color) -> Result<SanMove, SanError> {
    if san.starts_with(SHORT_CASTLING) {
        return parse_castling(san, side_to_move);
    }

    let mut rest = san.as_bytes();
    let mut token = classify(rest);
    if token == SanToken::Invalid || token == SanToken::End {
        return Err(SanError::UnexpectedToken { san: san.into() });
    }

    // Moving piece; a missing piece letter implies a pawn.
    let role = if let SanToken::PieceType(role) = token {
        rest = &rest[1..];
        token = classify(rest);
        role
    } else {
        Role::Pawn
    };

    // Disambiguation characters. A file+rank pair is only tentatively a
    // target square; a later `x` or second square commits it as the source.
    let mut disambiguation_file = None;
    let mut disambiguation_rank = None;
    let mut tentative_target: Option<Square> = None;
    match token {
        SanToken::FileChar(file) => {
            if let SanToken::RankChar(rank) = classify(&rest[1..]) {
                tentative_target = Some(Square::from_coords(file, rank));
                rest = &rest[2..];
            } else {
                disambiguation_file = Some(file);
                rest = &rest[1..];
            }
            token = classify(rest);
        }
        SanToken::RankChar(rank) => {
            disambiguation_rank = Some(rank);
            rest = &rest[1..];
            token = classify(rest);
        }
        _ => (),
    }

    let mut capturing = false;
    if token == SanToken::Capture {
        capturing = true;
        rest = &rest[1..];
        token = classify(rest);
        if let Some(square) = tentative_target.take() {
            disambiguation_file = Some(square.file());
            disambiguation_rank = Some(square.rank());
        }
    }

    let to = match token {
        SanToken::FileChar(file) => {
            if let SanToken::RankChar(rank) = classify(&rest[1..]) {
                if let Some(square) = tentative_target.take() {
                    disambiguation_file = Some(square.file());
                    disambiguation_rank = Some(square.rank());
                }
                rest = &rest[2..];
                token = classify(rest);
                Square::from_coords(file, rank)
            } else {
                return Err(SanError::MissingRank { san: san.into() });
            }
        }
        _ => match tentative_target.take() {
            Some(square) => square,
            None => return Err(SanError::MissingFile { san: san.into() }),
        },
    };

    let mut promotion = None;
    if token == SanToken::Promotion {
        rest = &rest[1..];
        token = classify(rest);
        match token {
            SanToken::PieceType(role) => {
                promotion = Some(role);
                rest = &rest[1..];
            }
            _ => return Err(SanError::MissingPieceType { san: san.into() }),
        }
    }

    let mut check_state = CheckState::None;
    let suffix = parse_suffixes(san, &mut rest, &mut check_state)?;

    if !rest.is_empty() {
        return Err(SanError::UnexpectedCharsAtEnd { san: san.into() });
    }

    Ok(SanMove {
        san: san.to_owned(),
        piece: Piece {
            color: side_to_move,
            role,
        },
        to,
        capturing,
        promotion,
        check_state,
        disambiguation_file,
        disambiguation_rank,
        suffix,
    })
}

/// Picks the minimal disambiguation for `m` among candidate moves of the same
/// piece to the same target: by file if the candidate source files are all
/// distinct, else by rank if the source ranks are all distinct, else both.
fn determine_disambiguation(m: Move, candidates: &[Move]) -> (Option<File>, Option<Rank>) {
    let mut files: Vec<File> = Vec::new();
    let mut ranks: Vec<Rank> = Vec::new();
    for candidate in candidates {
        if let Some(from) = candidate.from() {
            if !files.contains(&from.file()) {
                files.push(from.file());
            }
            if !ranks.contains(&from.rank()) {
                ranks.push(from.rank());
            }
        }
    }
    let Some(from) = m.from() else {
        return (None, None);
    };
    if files.len() == candidates.len() {
        (Some(from.file()), None)
    } else if ranks.len() == candidates.len() {
        (None, Some(from.rank()))
    } else {
        (Some(from.file()), Some(from.rank()))
    }
}

/// Produces the minimally disambiguated SAN for `m`, or `None` if `m` is not
/// contained in `legal` (by full-move equality).
///
/// Castling yields the literal `O-O` / `O-O-O`. Pawn moves carry the source
/// file only on captures. The result's check state is left at
/// [`CheckState::None`]; determining it needs the position after the move,
/// which is the caller's business.
pub fn generate_san_move(m: Move, legal: &MoveList, side_to_move: Color) -> Option<SanMove> {
    if !legal.contains(&m) {
        return None;
    }

    if let Move::Castle { king, rook } = m {
        let (text, file) = if king < rook {
            (SHORT_CASTLING, File::G)
        } else {
            (LONG_CASTLING, File::C)
        };
        return Some(SanMove {
            san: text.to_owned(),
            piece: Piece {
                color: side_to_move,
                role: Role::King,
            },
            to: Square::from_coords(file, king.rank()),
            capturing: false,
            promotion: None,
            check_state: CheckState::None,
            disambiguation_file: None,
            disambiguation_rank: None,
            suffix: None,
        });
    }

    let role = m.role();
    let candidates: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|c| !c.is_castle() && c.role() == role && c.to() == m.to())
        .collect();

    let mut san = String::new();
    let mut disambiguation_file = None;
    let mut disambiguation_rank = None;
    if role != Role::Pawn {
        san.push(role.upper_char());
        if candidates.len() > 1 {
            (disambiguation_file, disambiguation_rank) = determine_disambiguation(m, &candidates);
            if let Some(file) = disambiguation_file {
                san.push(file.char());
            }
            if let Some(rank) = disambiguation_rank {
                san.push(rank.char());
            }
        }
    } else if m.capture().is_some() {
        if let Some(from) = m.from() {
            san.push(from.file().char());
        }
    }
    if m.capture().is_some() {
        san.push('x');
    }
    san.push_str(&m.to().to_string());
    if let Some(promotion) = m.promotion() {
        san.push('=');
        san.push(promotion.upper_char());
    }

    Some(SanMove {
        san,
        piece: Piece {
            color: side_to_move,
            role,
        },
        to: m.to(),
        capturing: m.capture().is_some(),
        promotion: m.promotion(),
        check_state: CheckState::None,
        disambiguation_file,
        disambiguation_rank,
        suffix: None,
    })
}
