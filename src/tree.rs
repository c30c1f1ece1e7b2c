//! The game tree: nodes in an arena, addressed by stable ids.

use std::fmt;

use shakmaty::{Chess, Move};

use crate::nag::Nag;

/// Identifier of a node within one game. Not a global identifier.
///
/// Id 1 is reserved for the root; ids are allocated strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node of every game.
    pub const ROOT: NodeId = NodeId(1);

    pub(crate) fn from_index(index: usize) -> NodeId {
        NodeId(index as u32 + 1)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// The numeric value of the id.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position reached after exactly one move from its parent.
///
/// The root carries the initial position and no move. Children are ordered:
/// index 0 is the main continuation, indices ≥ 1 are variations in insertion
/// order.
#[derive(Debug, Clone)]
pub struct GameNode {
    id: NodeId,
    played: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    comment: String,
    premove_comment: String,
    nags: Vec<Nag>,
    position: Option<Chess>,
}

impl GameNode {
    pub(crate) fn new(id: NodeId, played: Option<Move>, parent: Option<NodeId>) -> GameNode {
        GameNode {
            id,
            played,
            parent,
            children: Vec::new(),
            comment: String::new(),
            premove_comment: String::new(),
            nags: Vec::new(),
            position: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The move that reached this node; `None` for the root.
    pub fn played_move(&self) -> Option<Move> {
        self.played
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The child at the given index; index 0 is the main line.
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied()
    }

    /// The comment following the move in PGN output.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The comment shown before the move in PGN output.
    pub fn premove_comment(&self) -> &str {
        &self.premove_comment
    }

    pub fn nags(&self) -> &[Nag] {
        &self.nags
    }

    /// The cached position, if any. Use [`crate::Game::position_of`] to
    /// derive an uncached one.
    pub fn position(&self) -> Option<&Chess> {
        self.position.as_ref()
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_owned();
    }

    pub(crate) fn append_comment(&mut self, comment: &str) {
        if !self.comment.is_empty() {
            self.comment.push(' ');
        }
        self.comment.push_str(comment);
    }

    pub(crate) fn set_premove_comment(&mut self, comment: &str) {
        self.premove_comment = comment.to_owned();
    }

    pub(crate) fn append_premove_comment(&mut self, comment: &str) {
        if !self.premove_comment.is_empty() {
            self.premove_comment.push(' ');
        }
        self.premove_comment.push_str(comment);
    }

    pub(crate) fn add_nag(&mut self, nag: Nag) {
        self.nags.push(nag);
    }

    pub(crate) fn set_position(&mut self, position: Chess) {
        self.position = Some(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids() {
        assert_eq!(NodeId::ROOT.value(), 1);
        assert_eq!(NodeId::from_index(0), NodeId::ROOT);
        assert_eq!(NodeId::from_index(4).value(), 5);
        assert_eq!(NodeId::from_index(4).index(), 4);
        assert_eq!(NodeId::from_index(2).to_string(), "#3");
    }

    #[test]
    fn comments_append_with_a_joining_space() {
        let mut node = GameNode::new(NodeId::ROOT, None, None);
        node.append_comment("first");
        node.append_comment("second");
        assert_eq!(node.comment(), "first second");

        node.set_comment("reset");
        assert_eq!(node.comment(), "reset");

        node.append_premove_comment("pre");
        assert_eq!(node.premove_comment(), "pre");
    }
}
