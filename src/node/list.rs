//! Ordered node list with optional source positions.

use std::fmt;

use super::MarkupNode;

/// 1-based line and column in a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line.
    pub line: u32,
    /// Column.
    pub column: u32,
}

/// Nodes in document order. Never reordered once pushed.
#[derive(Debug, Clone, Default)]
pub struct NodeList {
    nodes: Vec<MarkupNode>,
    positions: Vec<Option<Position>>,
}

impl NodeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node without a position.
    pub fn push(&mut self, node: MarkupNode) {
        self.nodes.push(node);
        self.positions.push(None);
    }

    /// Append a node read from `position`.
    pub fn push_at(&mut self, node: MarkupNode, position: Position) {
        self.nodes.push(node);
        self.positions.push(Some(position));
    }

    /// The nodes.
    pub fn nodes(&self) -> &[MarkupNode] {
        &self.nodes
    }

    /// Source position of the node at `index`.
    pub fn position(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied().flatten()
    }

    /// Iterate nodes.
    pub fn iter(&self) -> std::slice::Iter<'_, MarkupNode> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a MarkupNode;
    type IntoIter = std::slice::Iter<'a, MarkupNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for NodeList {
    /// One node per line, indented by nesting depth.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0usize;
        for node in &self.nodes {
            if matches!(node, MarkupNode::EndObject | MarkupNode::EndMember) {
                depth = depth.saturating_sub(1);
            }
            writeln!(f, "{:indent$}{node}", "", indent = depth * 2)?;
            if matches!(
                node,
                MarkupNode::StartObject(_) | MarkupNode::GetObject | MarkupNode::StartMember(_)
            ) {
                depth += 1;
            }
        }
        Ok(())
    }
}
