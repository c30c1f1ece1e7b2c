//! Token-driven PGN parser.
//!
//! [`PgnParser`] reads one [`Game`] per call to [`PgnParser::read_game`],
//! maintaining a cursor stack whose top is the insertion point for the next
//! move; entering a recursive annotation variation pushes a cursor, leaving
//! one pops it. Tolerated malformations are collected as [`PgnWarning`]s and
//! can be inspected after each game.

use std::io::Read;

use shakmaty::{Chess, Move, Position};

use crate::errors::{PgnError, PgnErrorKind, PgnWarning, PgnWarningKind};
use crate::game::Game;
use crate::lexer::Lexer;
use crate::matcher::{match_list, match_list_wildcard_piece};
use crate::metadata::Metadata;
use crate::nag::Nag;
use crate::san::{parse_san, SanMove};
use crate::token::{Token, TokenKind};
use crate::tree::NodeId;

/// Creates a parser over a byte source.
///
/// # Examples
///
/// ```
/// use pgn_tree::parse_pgn;
///
/// let pgn = "[Event \"?\"]\n[Site \"?\"]\n\n1. e4 e5 2. Nf3 *";
/// let mut parser = parse_pgn(std::io::Cursor::new(pgn));
/// let game = parser.read_game()?.expect("one game");
/// assert_eq!(game.mainline().count(), 3);
/// # Ok::<_, pgn_tree::PgnError>(())
/// ```
pub fn parse_pgn<R: Read>(reader: R) -> PgnParser<R> {
    PgnParser::new(reader)
}

/// State of one recursive annotation variation being parsed: whether a move
/// has been placed in it yet, and the comment buffered for its first move.
#[derive(Debug, Default)]
struct RavFrame {
    has_move: bool,
    premove_comment: Option<String>,
}

/// Streaming parser producing [`Game`] values.
#[derive(Debug)]
pub struct PgnParser<R> {
    lexer: Lexer<R>,
    peeked: Option<Token>,
    warnings: Vec<PgnWarning>,
}

impl<R: Read> PgnParser<R> {
    pub fn new(reader: R) -> PgnParser<R> {
        PgnParser {
            lexer: Lexer::new(reader),
            peeked: None,
            warnings: Vec::new(),
        }
    }

    /// The warnings collected while reading the most recent game.
    pub fn warnings(&self) -> &[PgnWarning] {
        &self.warnings
    }

    /// Adapts the parser into an iterator over games.
    pub fn games(self) -> Games<R> {
        Games {
            parser: self,
            done: false,
        }
    }

    fn next_token(&mut self) -> Result<Token, PgnError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, PgnError> {
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(PgnError::new(
                PgnErrorKind::UnexpectedToken,
                token.line,
                format!("expected {context}, found {:?} `{}`", token.kind, token.value),
            ))
        }
    }

    fn warn(&mut self, kind: PgnWarningKind, line: u32, message: String) {
        tracing::debug!(?kind, line, %message, "pgn warning");
        self.warnings.push(PgnWarning::new(kind, line, message));
    }

    /// Reads the next game from the stream.
    ///
    /// Returns `Ok(None)` once the input is exhausted. Games tagged with
    /// `Variant "Chess960"` are skipped transparently.
    ///
    /// # Errors
    ///
    /// Any structural failure aborts the current game; see [`PgnErrorKind`]
    /// for the taxonomy. Tolerated defects are reported through
    /// [`PgnParser::warnings`] instead.
    pub fn read_game(&mut self) -> Result<Option<Game>, PgnError> {
        loop {
            self.warnings.clear();
            let token = self.next_token()?;
            match token.kind {
                TokenKind::EndOfInput => return Ok(None),
                TokenKind::OpenBracket => (),
                _ => {
                    return Err(PgnError::new(
                        PgnErrorKind::UnexpectedToken,
                        token.line,
                        format!("expected tag section, found {:?} `{}`", token.kind, token.value),
                    ));
                }
            }

            let (metadata, game_comment) = self.read_metadata()?;

            if metadata
                .get("Variant")
                .is_some_and(|variant| variant.to_lowercase() == "chess960")
            {
                tracing::debug!(line = self.lexer.line_number(), "skipping chess960 game");
                if !self.skip_movetext()? {
                    return Ok(None);
                }
                continue;
            }

            let mut game = Game::from_metadata(metadata).map_err(|mut err| {
                err.line = self.lexer.line_number();
                err
            })?;
            if let Some(comment) = game_comment {
                if let Some(root) = game.node_mut(NodeId::ROOT) {
                    root.append_comment(&comment);
                }
            }

            self.read_movetext(&mut game)?;
            tracing::debug!(
                nodes = game.node_count(),
                warnings = self.warnings.len(),
                "finished reading game"
            );
            return Ok(Some(game));
        }
    }

    /// Reads `Symbol String ]` tag pairs, each introduced by `[`. The first
    /// `[` has already been consumed. A comment directly after the tag
    /// section is returned as the game's overall pre-move comment.
    fn read_metadata(&mut self) -> Result<(Metadata, Option<String>), PgnError> {
        let mut metadata = Metadata::new();
        loop {
            let name = self.expect(TokenKind::Symbol, "tag name")?;
            let value = self.expect(TokenKind::String, "tag value")?;
            self.expect(TokenKind::CloseBracket, "`]`")?;
            metadata.push(name.value, value.value);

            let token = self.next_token()?;
            match token.kind {
                TokenKind::OpenBracket => (),
                TokenKind::Comment => return Ok((metadata, Some(token.value))),
                _ => {
                    self.peeked = Some(token);
                    return Ok((metadata, None));
                }
            }
        }
    }

    /// Discards movetext up to and including the game result. Returns
    /// `false` if the input ended first. Running into the next game's `[`
    /// unreads it so the following [`PgnParser::read_game`] starts clean.
    fn skip_movetext(&mut self) -> Result<bool, PgnError> {
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::GameResult => return Ok(true),
                TokenKind::EndOfInput => return Ok(false),
                TokenKind::OpenBracket => {
                    self.lexer.skip_back();
                    return Ok(true);
                }
                _ => (),
            }
        }
    }

    fn read_movetext(&mut self, game: &mut Game) -> Result<(), PgnError> {
        let mut cursors: Vec<NodeId> = vec![NodeId::ROOT];
        let mut ravs: Vec<RavFrame> = Vec::new();
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::Number => {
                    // a move number indicator `N.`, `N..`, `N...`; the value
                    // and the dots carry no information
                    loop {
                        let next = self.next_token()?;
                        if next.kind != TokenKind::Dot {
                            self.peeked = Some(next);
                            break;
                        }
                    }
                }
                TokenKind::Dot => {
                    self.warn(
                        PgnWarningKind::UnexpectedChar,
                        token.line,
                        "stray `.` in movetext".to_owned(),
                    );
                }
                TokenKind::Symbol => self.apply_san(game, &mut cursors, &mut ravs, &token)?,
                TokenKind::Nag => {
                    let nag = Nag::from_ascii(token.value.as_bytes()).map_err(|_| {
                        PgnError::new(
                            PgnErrorKind::UnexpectedToken,
                            token.line,
                            format!("invalid NAG `${}`", token.value),
                        )
                    })?;
                    if let Some(node) = game.node_mut(top(&cursors)) {
                        node.add_nag(nag);
                    }
                }
                TokenKind::Comment => match ravs.last_mut() {
                    Some(rav) if !rav.has_move => match &mut rav.premove_comment {
                        Some(buffered) => {
                            buffered.push(' ');
                            buffered.push_str(&token.value);
                        }
                        None => rav.premove_comment = Some(token.value),
                    },
                    _ => {
                        if let Some(node) = game.node_mut(top(&cursors)) {
                            node.append_comment(&token.value);
                        }
                    }
                },
                TokenKind::OpenParen => {
                    let current = top(&cursors);
                    let parent = game
                        .node(current)
                        .and_then(|node| node.parent())
                        .ok_or_else(|| {
                            PgnError::new(
                                PgnErrorKind::CannotStartRav,
                                token.line,
                                "cannot start a variation before any move",
                            )
                        })?;
                    cursors.push(parent);
                    ravs.push(RavFrame::default());
                }
                TokenKind::CloseParen => {
                    if ravs.pop().is_none() {
                        return Err(PgnError::new(
                            PgnErrorKind::NoPendingRav,
                            token.line,
                            "unmatched `)` in movetext",
                        ));
                    }
                    cursors.pop();
                }
                TokenKind::GameResult => break,
                TokenKind::Invalid if token.value == "," || token.value == "}" => {
                    self.warn(
                        PgnWarningKind::UnexpectedChar,
                        token.line,
                        format!("stray `{}` in movetext", token.value),
                    );
                }
                TokenKind::Invalid
                    if token.value.len() > 1
                        && token.value.as_bytes().first().is_some_and(u8::is_ascii_digit) =>
                {
                    return Err(PgnError::new(
                        PgnErrorKind::InvalidGameResult,
                        token.line,
                        format!("malformed game result `{}`", token.value),
                    ));
                }
                TokenKind::Invalid => {
                    return Err(PgnError::new(
                        PgnErrorKind::UnexpectedChar,
                        token.line,
                        format!("unexpected character `{}`", token.value),
                    ));
                }
                TokenKind::EndOfInput => {
                    return Err(PgnError::new(
                        PgnErrorKind::EndOfInput,
                        token.line,
                        "movetext ended without a game result",
                    ));
                }
                TokenKind::OpenBracket | TokenKind::CloseBracket | TokenKind::String => {
                    return Err(PgnError::new(
                        PgnErrorKind::UnexpectedToken,
                        token.line,
                        format!("unexpected {:?} in movetext", token.kind),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Interprets a symbol as a SAN move: parse, resolve against the legal
    /// moves at the cursor, append to the tree and advance.
    fn apply_san(
        &mut self,
        game: &mut Game,
        cursors: &mut [NodeId],
        ravs: &mut [RavFrame],
        token: &Token,
    ) -> Result<(), PgnError> {
        let current = top(cursors);
        let position = game.position_of(current).map_err(|mut err| {
            err.line = token.line;
            err
        })?;
        let san = parse_san(&token.value, position.turn())
            .map_err(|err| PgnError::new(PgnErrorKind::InvalidMove, token.line, err.to_string()))?;
        let m = self.find_legal_move(&san, &position, token.line)?;

        let child = game.add_node(current, m).ok_or_else(|| {
            PgnError::new(PgnErrorKind::InputError, token.line, "lost the cursor node")
        })?;

        let mut after = position;
        after.play_unchecked(m);
        game.cache_position(child, after);

        if let Some(node) = game.node_mut(child) {
            if let Some(suffix) = san.suffix {
                node.add_nag(suffix.nag());
            }
            if let Some(rav) = ravs.last_mut() {
                if !rav.has_move {
                    rav.has_move = true;
                    if let Some(comment) = rav.premove_comment.take() {
                        node.append_premove_comment(&comment);
                    }
                }
            }
        }

        if let Some(slot) = cursors.last_mut() {
            *slot = child;
        }
        Ok(())
    }

    /// Resolves a [`SanMove`] to a unique legal move, with the tolerant
    /// fallbacks for a missing piece letter and a missing capture marker.
    fn find_legal_move(
        &mut self,
        san: &SanMove,
        position: &Chess,
        line: u32,
    ) -> Result<Move, PgnError> {
        let legal = position.legal_moves();
        if legal.is_empty() {
            return Err(PgnError::new(
                PgnErrorKind::IllegalMove,
                line,
                format!("`{}` played in a final position", san.san),
            ));
        }

        let strict = match_list(san, &legal);
        if let [only] = strict.as_slice() {
            return Ok(*only);
        }
        if strict.len() > 1 {
            return Err(PgnError::new(
                PgnErrorKind::AmbiguousMove,
                line,
                format!("`{}` matches more than one legal move", san.san),
            ));
        }

        let wildcard = match_list_wildcard_piece(san, &legal);
        if let [only] = wildcard.as_slice() {
            self.warn(
                PgnWarningKind::MoveMissingPieceType,
                line,
                format!("`{}` omits its piece letter", san.san),
            );
            return Ok(*only);
        }

        if wildcard.is_empty() && !san.capturing {
            let mut with_capture = san.clone();
            with_capture.capturing = true;
            let captures = match_list(&with_capture, &legal);
            if let [only] = captures.as_slice() {
                self.warn(
                    PgnWarningKind::MoveMissingCapture,
                    line,
                    format!("`{}` omits its capture marker", san.san),
                );
                return Ok(*only);
            }
        }

        Err(PgnError::new(
            PgnErrorKind::IllegalMove,
            line,
            format!("`{}` is not a legal move", san.san),
        ))
    }
}

/// The insertion point: the top of the cursor stack. The stack is never
/// empty; the bottom entry is only replaced, never popped.
fn top(cursors: &[NodeId]) -> NodeId {
    cursors.last().copied().unwrap_or(NodeId::ROOT)
}

/// Iterator over all games of a stream. See [`PgnParser::games`].
#[derive(Debug)]
pub struct Games<R> {
    parser: PgnParser<R>,
    done: bool,
}

impl<R: Read> Games<R> {
    /// The warnings collected for the most recently yielded game.
    pub fn warnings(&self) -> &[PgnWarning] {
        self.parser.warnings()
    }
}

impl<R: Read> Iterator for Games<R> {
    type Item = Result<Game, PgnError>;

    fn next(&mut self) -> Option<Result<Game, PgnError>> {
        if self.done {
            return None;
        }
        match self.parser.read_game() {
            Ok(Some(game)) => Some(Ok(game)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
