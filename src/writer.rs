//! Serializing a game tree back to conformant PGN.

use std::io::{self, Write};

use shakmaty::{Chess, Color, Position};

use crate::errors::{PgnError, PgnErrorKind};
use crate::game::Game;
use crate::metadata::{Metadata, Tag, STR_TAGS};
use crate::san::{generate_san_move, CheckState};
use crate::tree::NodeId;

/// Output knobs for [`PgnWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Maximum length of an output line. Token-internal content is never
    /// broken, so a single oversized token still exceeds this.
    ///
    /// Defaults to `79`.
    pub max_line_width: usize,
}

impl Default for WriterConfig {
    fn default() -> WriterConfig {
        WriterConfig { max_line_width: 79 }
    }
}

/// What was last written, deciding whether the next token needs a space
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputToken {
    MoveNumber,
    Move,
    CommentWord,
    Nag,
    RavOpen,
    RavClose,
    Termination,
}

impl OutputToken {
    fn needs_space_after(self) -> bool {
        !matches!(self, OutputToken::RavOpen)
    }
}

/// Emits tokens within a line-width budget. Wrapping happens between
/// tokens; the inter-token space is suppressed at a line break.
#[derive(Debug)]
struct TokenWriter<W> {
    sink: W,
    width: usize,
    line_len: usize,
    needs_space: bool,
}

impl<W: Write> TokenWriter<W> {
    fn new(sink: W, width: usize) -> TokenWriter<W> {
        TokenWriter {
            sink,
            width,
            line_len: 0,
            needs_space: false,
        }
    }

    fn token(&mut self, text: &str, kind: OutputToken) -> io::Result<()> {
        let separator = usize::from(self.needs_space && self.line_len > 0);
        if self.line_len > 0 && self.line_len + separator + text.len() > self.width {
            self.sink.write_all(b"\n")?;
            self.line_len = 0;
        } else if separator == 1 {
            self.sink.write_all(b" ")?;
            self.line_len += 1;
        }
        self.sink.write_all(text.as_bytes())?;
        self.line_len += text.len();
        self.needs_space = kind.needs_space_after();
        Ok(())
    }

    /// Terminates the current line, if one is open.
    fn finish_line(&mut self) -> io::Result<()> {
        if self.line_len > 0 {
            self.sink.write_all(b"\n")?;
            self.line_len = 0;
            self.needs_space = false;
        }
        Ok(())
    }

    fn raw(&mut self, text: &str) -> io::Result<()> {
        debug_assert_eq!(self.line_len, 0);
        self.sink.write_all(text.as_bytes())
    }
}

/// Writes games as PGN: metadata, movetext with correct move numbering
/// across variations, comments, NAGs and the termination marker.
#[derive(Debug)]
pub struct PgnWriter<W> {
    tw: TokenWriter<W>,
}

impl<W: Write> PgnWriter<W> {
    pub fn new(sink: W) -> PgnWriter<W> {
        PgnWriter::with_config(sink, WriterConfig::default())
    }

    pub fn with_config(sink: W, config: WriterConfig) -> PgnWriter<W> {
        PgnWriter {
            tw: TokenWriter::new(sink, config.max_line_width),
        }
    }

    pub fn into_inner(self) -> W {
        self.tw.sink
    }

    /// Serializes one game, followed by a blank line.
    ///
    /// # Errors
    ///
    /// [`PgnErrorKind::InvalidMove`] if a node's move is not legal in its
    /// parent's position (a corrupted tree), [`PgnErrorKind::CannotStartRav`]
    /// if a variation head has no parent, and [`PgnErrorKind::InputError`]
    /// for sink failures.
    pub fn write_game(&mut self, game: &Game) -> Result<(), PgnError> {
        self.write_metadata(game.metadata()).map_err(io_error)?;

        let root = game.node(NodeId::ROOT).ok_or_else(|| {
            PgnError::new(PgnErrorKind::InputError, 0, "game without a root node")
        })?;
        if !root.comment().is_empty() {
            self.write_comment(root.comment()).map_err(io_error)?;
            self.tw.finish_line().map_err(io_error)?;
            self.tw.raw("\n").map_err(io_error)?;
        }

        let position = game.position_of(NodeId::ROOT)?;
        self.write_line(game, NodeId::ROOT, position, true)?;

        let termination = game.metadata().get("Result").unwrap_or("?");
        self.tw
            .token(termination, OutputToken::Termination)
            .map_err(io_error)?;
        self.tw.finish_line().map_err(io_error)?;
        self.tw.raw("\n").map_err(io_error)?;
        Ok(())
    }

    /// Tag section: the Seven Tag Roster in canonical order with `?` for
    /// missing values, then all remaining tags sorted by name, then a blank
    /// line.
    fn write_metadata(&mut self, metadata: &Metadata) -> io::Result<()> {
        for name in STR_TAGS {
            let value = metadata.get(name).unwrap_or("?");
            self.tw.raw(&format!("[{name} \"{value}\"]\n"))?;
        }
        let mut remaining: Vec<&Tag> = metadata
            .iter()
            .filter(|tag| !Metadata::is_str_tag(&tag.name))
            .collect();
        remaining.sort_by(|a, b| a.name.cmp(&b.name));
        for tag in remaining {
            self.tw.raw(&format!("[{} \"{}\"]\n", tag.name, tag.value))?;
        }
        self.tw.raw("\n")
    }

    /// A `{ ... }` block, split into words so line wrapping stays clean. The
    /// opening brace attaches to the first word, the closing brace to the
    /// last.
    fn write_comment(&mut self, comment: &str) -> io::Result<()> {
        let words: Vec<&str> = comment.split_whitespace().collect();
        match words.as_slice() {
            [] => self.tw.token("{}", OutputToken::CommentWord),
            [only] => self.tw.token(&format!("{{{only}}}"), OutputToken::CommentWord),
            [first, middle @ .., last] => {
                self.tw.token(&format!("{{{first}"), OutputToken::CommentWord)?;
                for word in middle {
                    self.tw.token(word, OutputToken::CommentWord)?;
                }
                self.tw.token(&format!("{last}}}"), OutputToken::CommentWord)
            }
        }
    }

    /// Walks the main line from `parent`: writes the main move with its
    /// annotations, then every additional child as a parenthesized
    /// variation, then advances.
    fn write_line(
        &mut self,
        game: &Game,
        parent: NodeId,
        mut position: Chess,
        mut force_number: bool,
    ) -> Result<(), PgnError> {
        let mut parent = parent;
        loop {
            let parent_node = game.node(parent).ok_or_else(|| {
                PgnError::new(PgnErrorKind::InputError, 0, format!("unknown node {parent}"))
            })?;
            let Some(main) = parent_node.child(0) else {
                break;
            };
            force_number = self.write_single_move(game, main, &position, force_number)?;

            for &variation in parent_node.children().iter().skip(1) {
                self.tw.token("(", OutputToken::RavOpen).map_err(io_error)?;
                self.write_variation(game, variation, position.clone())?;
                self.tw.token(")", OutputToken::RavClose).map_err(io_error)?;
                force_number = true;
            }

            let m = game
                .node(main)
                .and_then(|node| node.played_move())
                .ok_or_else(|| {
                    PgnError::new(PgnErrorKind::InvalidMove, 0, "tree node without a move")
                })?;
            position.play_unchecked(m);
            parent = main;
        }
        Ok(())
    }

    /// One variation: its head move, then the rest of its line.
    fn write_variation(
        &mut self,
        game: &Game,
        head: NodeId,
        position: Chess,
    ) -> Result<(), PgnError> {
        let node = game.node(head).ok_or_else(|| {
            PgnError::new(PgnErrorKind::InputError, 0, format!("unknown node {head}"))
        })?;
        if node.parent().is_none() {
            return Err(PgnError::new(
                PgnErrorKind::CannotStartRav,
                0,
                "variation head without a parent",
            ));
        }
        let force_number = self.write_single_move(game, head, &position, true)?;
        let m = node.played_move().ok_or_else(|| {
            PgnError::new(PgnErrorKind::InvalidMove, 0, "tree node without a move")
        })?;
        let mut after = position;
        after.play_unchecked(m);
        self.write_line(game, head, after, force_number)
    }

    /// One move with everything attached to it: pre-move comment, move
    /// number, SAN with check marker, NAGs, post-move comment. Returns
    /// whether the next move needs an explicit move number.
    fn write_single_move(
        &mut self,
        game: &Game,
        id: NodeId,
        position_before: &Chess,
        force_number: bool,
    ) -> Result<bool, PgnError> {
        let node = game.node(id).ok_or_else(|| {
            PgnError::new(PgnErrorKind::InputError, 0, format!("unknown node {id}"))
        })?;
        let mut force_number = force_number;

        if !node.premove_comment().is_empty() {
            self.write_comment(node.premove_comment()).map_err(io_error)?;
            force_number = true;
        }

        if position_before.turn() == Color::White {
            let number = format!("{}.", position_before.fullmoves());
            self.tw
                .token(&number, OutputToken::MoveNumber)
                .map_err(io_error)?;
        } else if force_number {
            let number = format!("{}...", position_before.fullmoves());
            self.tw
                .token(&number, OutputToken::MoveNumber)
                .map_err(io_error)?;
        }

        let m = node.played_move().ok_or_else(|| {
            PgnError::new(PgnErrorKind::InvalidMove, 0, "tree node without a move")
        })?;
        let legal = position_before.legal_moves();
        let san = generate_san_move(m, &legal, position_before.turn()).ok_or_else(|| {
            PgnError::new(
                PgnErrorKind::InvalidMove,
                0,
                format!("move at node {id} is not legal in its position"),
            )
        })?;

        let mut after = position_before.clone();
        after.play_unchecked(m);
        let mut text = san.san;
        text.push_str(CheckState::from_position(&after).as_str());
        self.tw.token(&text, OutputToken::Move).map_err(io_error)?;

        for nag in node.nags() {
            self.tw
                .token(&nag.to_string(), OutputToken::Nag)
                .map_err(io_error)?;
        }

        if node.comment().is_empty() {
            Ok(false)
        } else {
            self.write_comment(node.comment()).map_err(io_error)?;
            Ok(true)
        }
    }
}

fn io_error(err: io::Error) -> PgnError {
    PgnError::io(err, 0)
}

/// Serializes `game` to `sink` as PGN.
///
/// # Errors
///
/// See [`PgnWriter::write_game`].
pub fn write_pgn<W: Write>(game: &Game, sink: W) -> Result<(), PgnError> {
    PgnWriter::new(sink).write_game(game)
}
