// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rank-layered auto layout.
//!
//! Each node is placed in the column of its longest-path depth from the
//! graph's sources, growing towards negative x. Nodes sharing a rank are
//! stacked in creation order. Ranks are recomputed from the document every
//! time, so nothing carries over between builds.

use crate::graph::{CycleError, GraphDocument};
use crate::node::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default horizontal distance between ranks
pub const COLUMN_SPACING: f32 = 200.0;

/// Default vertical distance between nodes of one rank
pub const ROW_SPACING: f32 = 150.0;

/// Spacing used by the rank layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankLayout {
    /// Horizontal distance between ranks
    pub column_spacing: f32,
    /// Vertical distance between nodes of one rank
    pub row_spacing: f32,
}

impl Default for RankLayout {
    fn default() -> Self {
        Self {
            column_spacing: COLUMN_SPACING,
            row_spacing: ROW_SPACING,
        }
    }
}

impl RankLayout {
    /// Longest-path depth of every node, in creation order
    pub fn ranks(doc: &GraphDocument) -> Result<IndexMap<NodeId, usize>, CycleError> {
        let order = doc.topological_order()?;
        let mut predecessors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for edge in doc.edges() {
            predecessors.entry(edge.dst_node).or_default().push(edge.src_node);
        }

        let mut depth: HashMap<NodeId, usize> = HashMap::with_capacity(order.len());
        for node_id in order {
            let rank = predecessors
                .get(&node_id)
                .into_iter()
                .flatten()
                .filter_map(|src| depth.get(src))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node_id, rank);
        }

        Ok(doc
            .node_ids()
            .map(|id| (id, depth.get(&id).copied().unwrap_or(0)))
            .collect())
    }

    /// Position every node of the document
    pub fn apply(&self, doc: &mut GraphDocument) -> Result<(), CycleError> {
        let ranks = Self::ranks(doc)?;
        let mut rows: HashMap<usize, usize> = HashMap::new();

        for (node_id, rank) in ranks {
            let row = rows.entry(rank).or_insert(0);
            let x = 0.0 - rank as f32 * self.column_spacing;
            let y = *row as f32 * self.row_spacing;
            *row += 1;
            doc.set_position(node_id, x, y);
        }

        tracing::debug!(nodes = doc.node_count(), "applied rank layout");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{slots, NodeKind, Position};

    #[test]
    fn test_chain_ranks() {
        let mut doc = GraphDocument::new();
        let value = doc.add_node(NodeKind::ScalarConstant { value: 2.0 }).unwrap();
        let multiply = doc.add_node(NodeKind::Multiply).unwrap();
        let master = doc.add_node(NodeKind::MasterOutput).unwrap();
        doc.connect(value, slots::VALUE, multiply, slots::A).unwrap();
        doc.connect(multiply, slots::OUT, master, slots::BASE_COLOR).unwrap();

        let ranks = RankLayout::ranks(&doc).unwrap();
        assert_eq!(ranks.get(&value), Some(&0));
        assert_eq!(ranks.get(&multiply), Some(&1));
        assert_eq!(ranks.get(&master), Some(&2));
    }

    #[test]
    fn test_longest_path_wins() {
        let mut doc = GraphDocument::new();
        let a = doc.add_node(NodeKind::ScalarConstant { value: 1.0 }).unwrap();
        let b = doc.add_node(NodeKind::Multiply).unwrap();
        let c = doc.add_node(NodeKind::Multiply).unwrap();
        doc.connect(a, slots::VALUE, b, slots::A).unwrap();
        doc.connect(a, slots::VALUE, c, slots::A).unwrap();
        doc.connect(b, slots::OUT, c, slots::B).unwrap();

        let ranks = RankLayout::ranks(&doc).unwrap();
        assert_eq!(ranks.get(&c), Some(&2));
    }

    #[test]
    fn test_siblings_stack_vertically() {
        let mut doc = GraphDocument::new();
        let a = doc.add_node(NodeKind::ScalarConstant { value: 1.0 }).unwrap();
        let b = doc.add_node(NodeKind::ScalarConstant { value: 2.0 }).unwrap();
        let multiply = doc.add_node(NodeKind::Multiply).unwrap();
        doc.connect(a, slots::VALUE, multiply, slots::A).unwrap();
        doc.connect(b, slots::VALUE, multiply, slots::B).unwrap();

        RankLayout::default().apply(&mut doc).unwrap();
        assert_eq!(doc.node(a).unwrap().position, Position::new(0.0, 0.0));
        assert_eq!(doc.node(b).unwrap().position, Position::new(0.0, 150.0));
        assert_eq!(doc.node(multiply).unwrap().position, Position::new(-200.0, 0.0));
    }

    #[test]
    fn test_cycle_blocks_layout() {
        let mut doc = GraphDocument::new();
        let a = doc.add_node(NodeKind::Multiply).unwrap();
        let b = doc.add_node(NodeKind::Multiply).unwrap();
        doc.connect(a, slots::OUT, b, slots::A).unwrap();
        doc.connect(b, slots::OUT, a, slots::A).unwrap();
        assert!(RankLayout::default().apply(&mut doc).is_err());
    }
}
