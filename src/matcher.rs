//! Resolving a [`SanMove`] against a list of legal moves.

use shakmaty::{File, Move, MoveList, Square};

use crate::san::SanMove;

/// Like [`san_matches_move`], but without the piece type check. Used as a
/// fallback for SANs that omit the piece letter.
pub fn san_matches_move_any_piece(san: &SanMove, m: Move) -> bool {
    if let Move::Castle { king, rook } = m {
        let file = if king < rook { File::G } else { File::C };
        return san.to == Square::from_coords(file, king.rank())
            && !san.capturing
            && san.promotion.is_none()
            && san.disambiguation_file.is_none()
            && san.disambiguation_rank.is_none();
    }
    if san.to != m.to() {
        return false;
    }
    if let Some(file) = san.disambiguation_file {
        if m.from().map(Square::file) != Some(file) {
            return false;
        }
    }
    if let Some(rank) = san.disambiguation_rank {
        if m.from().map(Square::rank) != Some(rank) {
            return false;
        }
    }
    if san.capturing != m.capture().is_some() {
        return false;
    }
    san.promotion == m.promotion()
}

/// The exact predicate: piece type, target square, disambiguation, capture
/// flag and promotion all have to agree.
pub fn san_matches_move(san: &SanMove, m: Move) -> bool {
    san.piece.role == m.role() && san_matches_move_any_piece(san, m)
}

/// All moves in `moves` that the SAN describes exactly.
pub fn match_list(san: &SanMove, moves: &MoveList) -> MoveList {
    moves
        .iter()
        .copied()
        .filter(|&m| san_matches_move(san, m))
        .collect()
}

/// All moves in `moves` that the SAN describes when the piece type is
/// ignored.
pub fn match_list_wildcard_piece(san: &SanMove, moves: &MoveList) -> MoveList {
    moves
        .iter()
        .copied()
        .filter(|&m| san_matches_move_any_piece(san, m))
        .collect()
}
