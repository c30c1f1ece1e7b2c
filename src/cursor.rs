//! Navigation and editing points in a game tree.

use shakmaty::{Chess, Color, Move, Position};

use crate::errors::{PgnError, PgnErrorKind};
use crate::game::Game;
use crate::nag::Nag;
use crate::tree::{GameNode, NodeId};

/// A read-only cursor into a game.
///
/// Lightweight; copying is free. Two cursors compare equal iff they refer
/// to the same game and the same node.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    game: &'a Game,
    node: &'a GameNode,
}

impl<'a> Cursor<'a> {
    /// A cursor at `id`, or `None` if the game has no such node.
    pub fn new(game: &'a Game, id: NodeId) -> Option<Cursor<'a>> {
        Some(Cursor {
            game,
            node: game.node(id)?,
        })
    }

    pub(crate) fn at_root(game: &'a Game) -> Cursor<'a> {
        Cursor {
            game,
            node: match game.node(NodeId::ROOT) {
                Some(root) => root,
                // a Game is constructed with its root; this cannot be reached
                None => unreachable!("game without root"),
            },
        }
    }

    pub fn game(&self) -> &'a Game {
        self.game
    }

    pub fn node(&self) -> &'a GameNode {
        self.node
    }

    pub fn node_id(&self) -> NodeId {
        self.node.id()
    }

    /// Cursor at the parent node, if this is not the root.
    pub fn parent(&self) -> Option<Cursor<'a>> {
        Cursor::new(self.game, self.node.parent()?)
    }

    /// Cursor at the child with the given index; index 0 is the main line.
    pub fn child(&self, index: usize) -> Option<Cursor<'a>> {
        Cursor::new(self.game, self.node.child(index)?)
    }

    pub fn child_count(&self) -> usize {
        self.node.child_count()
    }

    /// The move that reached this node; `None` at the root.
    pub fn played_move(&self) -> Option<Move> {
        self.node.played_move()
    }

    pub fn comment(&self) -> &'a str {
        self.node.comment()
    }

    pub fn premove_comment(&self) -> &'a str {
        self.node.premove_comment()
    }

    pub fn nags(&self) -> &'a [Nag] {
        self.node.nags()
    }

    /// The position at this node, cached or derived. See
    /// [`Game::position_of`].
    pub fn position(&self) -> Result<Chess, PgnError> {
        self.game.position_of(self.node.id())
    }

    pub fn side_to_move(&self) -> Result<Color, PgnError> {
        self.position().map(|position| position.turn())
    }

    /// Whether alternatives to the main continuation exist here.
    pub fn has_variations(&self) -> bool {
        self.node.child_count() > 1
    }

    /// Whether this node is the first move of a variation rather than the
    /// main continuation of its parent.
    pub fn starts_variation(&self) -> bool {
        self.variation_number().is_some_and(|number| number > 0)
    }

    /// The index of this node among its parent's children; `None` at the
    /// root.
    pub fn variation_number(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent
            .node()
            .children()
            .iter()
            .position(|&child| child == self.node.id())
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Cursor<'_>) -> bool {
        std::ptr::eq(self.game, other.game) && self.node.id() == other.node.id()
    }
}

impl Eq for Cursor<'_> {}

/// A mutable cursor: the insertion point for moves, variations and
/// annotations.
#[derive(Debug)]
pub struct CursorMut<'a> {
    game: &'a mut Game,
    node: NodeId,
}

impl<'a> CursorMut<'a> {
    /// A mutable cursor at `id`, or `None` if the game has no such node.
    pub fn new(game: &'a mut Game, id: NodeId) -> Option<CursorMut<'a>> {
        game.node(id)?;
        Some(CursorMut { game, node: id })
    }

    pub(crate) fn at_root(game: &'a mut Game) -> CursorMut<'a> {
        CursorMut {
            game,
            node: NodeId::ROOT,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The read-only view of this cursor.
    pub fn as_cursor(&self) -> Cursor<'_> {
        match Cursor::new(self.game, self.node) {
            Some(cursor) => cursor,
            // the node was validated at construction and nodes are never
            // removed
            None => unreachable!("cursor node disappeared"),
        }
    }

    /// Appends `m` at the current node and advances to the resulting child.
    /// Appending an existing continuation advances without allocating.
    pub fn play_move(&mut self, m: Move) -> Result<NodeId, PgnError> {
        let child = self.game.add_node(self.node, m).ok_or_else(|| {
            PgnError::new(PgnErrorKind::InputError, 0, "cursor points at an unknown node")
        })?;
        self.node = child;
        Ok(child)
    }

    /// Starts a variation: appends `m` to the parent of the current node
    /// and advances to the new line.
    ///
    /// # Errors
    ///
    /// Fails with [`PgnErrorKind::CannotStartRav`] at the root.
    pub fn add_variation(&mut self, m: Move) -> Result<NodeId, PgnError> {
        let parent = self
            .game
            .node(self.node)
            .and_then(GameNode::parent)
            .ok_or_else(|| {
                PgnError::new(
                    PgnErrorKind::CannotStartRav,
                    0,
                    "cannot start a variation before any move",
                )
            })?;
        let child = self.game.add_node(parent, m).ok_or_else(|| {
            PgnError::new(PgnErrorKind::InputError, 0, "cursor points at an unknown node")
        })?;
        self.node = child;
        Ok(child)
    }

    pub fn set_comment(&mut self, comment: &str) {
        if let Some(node) = self.game.node_mut(self.node) {
            node.set_comment(comment);
        }
    }

    pub fn append_comment(&mut self, comment: &str) {
        if let Some(node) = self.game.node_mut(self.node) {
            node.append_comment(comment);
        }
    }

    pub fn set_premove_comment(&mut self, comment: &str) {
        if let Some(node) = self.game.node_mut(self.node) {
            node.set_premove_comment(comment);
        }
    }

    pub fn append_premove_comment(&mut self, comment: &str) {
        if let Some(node) = self.game.node_mut(self.node) {
            node.append_premove_comment(comment);
        }
    }

    pub fn add_nag(&mut self, nag: Nag) {
        if let Some(node) = self.game.node_mut(self.node) {
            node.add_nag(nag);
        }
    }

    pub fn position(&self) -> Result<Chess, PgnError> {
        self.game.position_of(self.node)
    }

    pub fn side_to_move(&self) -> Result<Color, PgnError> {
        self.position().map(|position| position.turn())
    }
}

impl<'a> From<&'a CursorMut<'_>> for Cursor<'a> {
    fn from(cursor: &'a CursorMut<'_>) -> Cursor<'a> {
        cursor.as_cursor()
    }
}

impl PartialEq for CursorMut<'_> {
    fn eq(&self, other: &CursorMut<'_>) -> bool {
        std::ptr::eq(self.game as *const Game, other.game as *const Game) && self.node == other.node
    }
}

#[cfg(test)]
mod tests {
    use shakmaty::Square;

    use super::*;

    fn legal(game: &Game, at: NodeId, from: Square, to: Square) -> Move {
        game.position_of(at)
            .expect("position")
            .legal_moves()
            .iter()
            .copied()
            .find(|m| m.from() == Some(from) && m.to() == to)
            .expect("legal move")
    }

    #[test]
    fn play_move_advances() {
        let mut game = Game::new();
        let e4 = legal(&game, NodeId::ROOT, Square::E2, Square::E4);
        let mut cursor = game.cursor_mut();
        let child = cursor.play_move(e4).expect("played");
        assert_eq!(cursor.node_id(), child);
        assert_eq!(
            cursor.side_to_move().expect("side"),
            shakmaty::Color::Black
        );
    }

    #[test]
    fn add_variation_fails_at_the_root() {
        let mut game = Game::new();
        let e4 = legal(&game, NodeId::ROOT, Square::E2, Square::E4);
        let mut cursor = game.cursor_mut();
        let err = cursor.add_variation(e4).expect_err("no parent");
        assert_eq!(err.kind, PgnErrorKind::CannotStartRav);
    }

    #[test]
    fn add_variation_branches_from_the_parent() {
        let mut game = Game::new();
        let e4 = legal(&game, NodeId::ROOT, Square::E2, Square::E4);
        let d4 = legal(&game, NodeId::ROOT, Square::D2, Square::D4);
        let mut cursor = game.cursor_mut();
        cursor.play_move(e4).expect("mainline");
        cursor.add_variation(d4).expect("variation");

        let variation = game.cursor().child(1).expect("child 1");
        assert_eq!(variation.played_move().map(|m| m.to()), Some(Square::D4));
        assert!(variation.starts_variation());
        assert_eq!(variation.variation_number(), Some(1));
        assert!(!game.cursor().child(0).expect("child 0").starts_variation());
    }

    #[test]
    fn cursors_compare_by_game_and_node() {
        let mut game = Game::new();
        let e4 = legal(&game, NodeId::ROOT, Square::E2, Square::E4);
        game.add_node(NodeId::ROOT, e4).expect("node");

        let a = game.cursor();
        let b = game.cursor();
        assert_eq!(a, b);
        let child = a.child(0).expect("child");
        assert_ne!(a, child);

        let other = game.clone();
        assert_ne!(other.cursor(), game.cursor());
    }

    #[test]
    fn has_variations_counts_children() {
        let mut game = Game::new();
        let e4 = legal(&game, NodeId::ROOT, Square::E2, Square::E4);
        let d4 = legal(&game, NodeId::ROOT, Square::D2, Square::D4);
        game.add_node(NodeId::ROOT, e4).expect("first");
        assert!(!game.cursor().has_variations());
        game.add_node(NodeId::ROOT, d4).expect("second");
        assert!(game.cursor().has_variations());
    }
}
