//! A chess game: metadata plus the tree of positions.

use shakmaty::{CastlingMode, Chess, Move, Position};

use crate::cursor::{Cursor, CursorMut};
use crate::errors::{PgnError, PgnErrorKind};
use crate::metadata::Metadata;
use crate::tree::{GameNode, NodeId};

/// A game of chess.
///
/// Owns its node storage exclusively. Nodes are only appended, never
/// removed; appending a move that already exists as a child returns the
/// existing child, so transpositions along one line never duplicate
/// subtrees.
#[derive(Debug, Clone)]
pub struct Game {
    metadata: Metadata,
    nodes: Vec<GameNode>,
}

impl Game {
    /// A new game from the standard starting position, without metadata.
    pub fn new() -> Game {
        let mut root = GameNode::new(NodeId::ROOT, None, None);
        root.set_position(Chess::default());
        Game {
            metadata: Metadata::new(),
            nodes: vec![root],
        }
    }

    /// A new game carrying the given metadata. The root position is taken
    /// from the `FEN` tag if present, otherwise it is the standard starting
    /// position.
    ///
    /// # Errors
    ///
    /// Fails with [`PgnErrorKind::InputError`] if the `FEN` tag does not
    /// describe a legal position.
    pub fn from_metadata(metadata: Metadata) -> Result<Game, PgnError> {
        let position = match metadata.get("FEN") {
            Some(fen) => fen
                .parse::<shakmaty::fen::Fen>()
                .map_err(|e| {
                    PgnError::new(PgnErrorKind::InputError, 0, format!("bad FEN `{fen}`: {e}"))
                })?
                .into_position::<Chess>(CastlingMode::Standard)
                .map_err(|e| {
                    PgnError::new(PgnErrorKind::InputError, 0, format!("bad FEN `{fen}`: {e}"))
                })?,
            None => Chess::default(),
        };
        let mut root = GameNode::new(NodeId::ROOT, None, None);
        root.set_position(position);
        Ok(Game {
            metadata,
            nodes: vec![root],
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// The root node id. Every game has a root.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&GameNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut GameNode> {
        self.nodes.get_mut(id.index())
    }

    /// The id the next allocated node will get.
    pub fn next_node_id(&self) -> NodeId {
        NodeId::from_index(self.nodes.len())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a child reached by `m` to `parent`, deduplicating by move
    /// equality: if such a child already exists it is returned and nothing
    /// is allocated. Returns `None` if `parent` is not a node of this game.
    pub fn add_node(&mut self, parent: NodeId, m: Move) -> Option<NodeId> {
        let children: Vec<NodeId> = self.node(parent)?.children().to_vec();
        for child in children {
            if self.node(child)?.played_move() == Some(m) {
                return Some(child);
            }
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(GameNode::new(id, Some(m), Some(parent)));
        self.node_mut(parent)?.push_child(id);
        Some(id)
    }

    pub(crate) fn cache_position(&mut self, id: NodeId, position: Chess) {
        if let Some(node) = self.node_mut(id) {
            if node.position().is_none() {
                node.set_position(position);
            }
        }
    }

    /// The position at a node: the cached one if present, otherwise derived
    /// by replaying the move sequence from the nearest ancestor that has a
    /// cached position.
    ///
    /// # Errors
    ///
    /// Fails if `id` is unknown or no ancestor carries a position.
    pub fn position_of(&self, id: NodeId) -> Result<Chess, PgnError> {
        let mut replay: Vec<Move> = Vec::new();
        let mut current = self
            .node(id)
            .ok_or_else(|| PgnError::new(PgnErrorKind::InputError, 0, format!("unknown node {id}")))?;
        loop {
            if let Some(position) = current.position() {
                let mut position = position.clone();
                for &m in replay.iter().rev() {
                    position.play_unchecked(m);
                }
                return Ok(position);
            }
            let Some(parent) = current.parent() else {
                return Err(PgnError::new(
                    PgnErrorKind::InputError,
                    0,
                    "no ancestor with a cached position",
                ));
            };
            if let Some(m) = current.played_move() {
                replay.push(m);
            }
            current = self.node(parent).ok_or_else(|| {
                PgnError::new(PgnErrorKind::InputError, 0, format!("unknown node {parent}"))
            })?;
        }
    }

    /// A read-only cursor at the root.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::at_root(self)
    }

    /// A mutable cursor at the root.
    pub fn cursor_mut(&mut self) -> CursorMut<'_> {
        CursorMut::at_root(self)
    }

    /// A read-only cursor at an arbitrary node, if the node exists.
    pub fn cursor_at(&self, id: NodeId) -> Option<Cursor<'_>> {
        Cursor::new(self, id)
    }

    /// A mutable cursor at an arbitrary node, if the node exists.
    pub fn cursor_at_mut(&mut self, id: NodeId) -> Option<CursorMut<'_>> {
        CursorMut::new(self, id)
    }

    /// Walks the main line from the root, yielding a cursor for every node
    /// reached by a move.
    pub fn mainline(&self) -> Mainline<'_> {
        Mainline {
            game: self,
            next: self.node(NodeId::ROOT).and_then(|root| root.child(0)),
        }
    }
}

impl Default for Game {
    fn default() -> Game {
        Game::new()
    }
}

/// Iterator over the main line of a game. See [`Game::mainline`].
#[derive(Debug, Clone)]
pub struct Mainline<'a> {
    game: &'a Game,
    next: Option<NodeId>,
}

impl<'a> Iterator for Mainline<'a> {
    type Item = Cursor<'a>;

    fn next(&mut self) -> Option<Cursor<'a>> {
        let id = self.next.take()?;
        let cursor = Cursor::new(self.game, id)?;
        self.next = cursor.node().child(0);
        Some(cursor)
    }
}
