//! Read, represent and write chess games in Portable Game Notation.
//!
//! The pipeline: bytes go through the [`Lexer`] into [`Token`]s, the
//! [`PgnParser`] interprets them — consulting the SAN analyzer
//! ([`san::parse_san`]), the move matcher ([`matcher::match_list`]) and the
//! chess rules engine ([`shakmaty`]) — into a [`Game`]: a richly branched
//! tree of positions with metadata, comments, numeric annotation glyphs and
//! recursive annotation variations. The [`PgnWriter`] walks a tree back out
//! to conformant PGN, with canonical tag ordering, minimal SAN
//! disambiguation, correct move numbering inside variations and a line
//! width budget.
//!
//! # Examples
//!
//! Read a game and inspect its main line:
//!
//! ```
//! use pgn_tree::parse_pgn;
//! use shakmaty::{Role, Square};
//!
//! let pgn = "[Event \"Test\"]\n[Site \"?\"]\n\n1. e4 e5 2. Nf3 Nc6 1/2-1/2";
//! let mut parser = parse_pgn(std::io::Cursor::new(pgn));
//! let game = parser.read_game()?.expect("a game");
//!
//! assert_eq!(game.mainline().count(), 4);
//! let first = game.cursor().child(0).expect("first move");
//! let m = first.played_move().expect("move");
//! assert_eq!(m.role(), Role::Pawn);
//! assert_eq!(m.to(), Square::E4);
//! # Ok::<_, pgn_tree::PgnError>(())
//! ```
//!
//! Write it back:
//!
//! ```
//! # use pgn_tree::parse_pgn;
//! use pgn_tree::write_pgn;
//! # let pgn = "[Event \"Test\"]\n[Site \"?\"]\n\n1. e4 e5 2. Nf3 Nc6 1/2-1/2";
//! # let mut parser = parse_pgn(std::io::Cursor::new(pgn));
//! # let game = parser.read_game()?.expect("a game");
//! let mut out = Vec::new();
//! write_pgn(&game, &mut out)?;
//! assert!(String::from_utf8_lossy(&out).contains("1. e4 e5 2. Nf3 Nc6"));
//! # Ok::<_, pgn_tree::PgnError>(())
//! ```

#![warn(missing_debug_implementations)]

pub mod cursor;
pub mod errors;
pub mod game;
pub mod lexer;
pub mod matcher;
pub mod metadata;
pub mod nag;
pub mod parser;
pub mod san;
pub mod token;
pub mod tree;
pub mod writer;

pub use cursor::{Cursor, CursorMut};
pub use errors::{PgnError, PgnErrorKind, PgnWarning, PgnWarningKind};
pub use game::{Game, Mainline};
pub use lexer::Lexer;
pub use metadata::{Metadata, Tag, STR_TAGS};
pub use nag::{InvalidNag, Nag};
pub use parser::{parse_pgn, Games, PgnParser};
pub use san::{generate_san_move, parse_san, CheckState, SanError, SanMove, SuffixAnnotation};
pub use shakmaty;
pub use token::{Token, TokenKind};
pub use tree::{GameNode, NodeId};
pub use writer::{write_pgn, PgnWriter, WriterConfig};
