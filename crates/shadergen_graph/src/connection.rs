// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::node::NodeId;
use crate::slot::SlotId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed connection from an output slot to an input slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Source node ID
    pub src_node: NodeId,
    /// Source output slot
    pub src_slot: SlotId,
    /// Destination node ID
    pub dst_node: NodeId,
    /// Destination input slot
    pub dst_slot: SlotId,
}

impl Edge {
    /// Create a new edge
    pub fn new(
        src_node: NodeId,
        src_slot: impl Into<SlotId>,
        dst_node: NodeId,
        dst_slot: impl Into<SlotId>,
    ) -> Self {
        Self {
            src_node,
            src_slot: src_slot.into(),
            dst_node,
            dst_slot: dst_slot.into(),
        }
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.src_node == node_id || self.dst_node == node_id
    }

    /// Check if this edge ends at a specific input slot
    pub fn targets(&self, node_id: NodeId, slot: &str) -> bool {
        self.dst_node == node_id && self.dst_slot == *slot
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.src_node, self.src_slot, self.dst_node, self.dst_slot
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_display_and_queries() {
        let edge = Edge::new(NodeId(2), "out", NodeId(5), "a");
        assert_eq!(edge.to_string(), "#2.out -> #5.a");
        assert!(edge.involves_node(NodeId(2)));
        assert!(edge.involves_node(NodeId(5)));
        assert!(!edge.involves_node(NodeId(3)));
        assert!(edge.targets(NodeId(5), "a"));
        assert!(!edge.targets(NodeId(5), "b"));
    }
}
