// SPDX-License-Identifier: MIT OR Apache-2.0
//! Human-readable recipe of a graph document.
//!
//! The recipe lists what an artist would have to recreate by hand in the
//! host's graph editor: the blackboard properties, every node in dependency
//! order with its incoming wires, and the bound output.

use crate::graph::GraphDocument;
use crate::node::{Node, NodeKind};
use std::fmt::Write;

fn describe(doc: &GraphDocument, node: &Node) -> String {
    match &node.kind {
        NodeKind::PropertyReference { guid, kind } => match doc.property(*guid) {
            Some(p) => format!("Property '{}' ({})", p.display_name, p.reference_name),
            None => format!("Property {guid} ({kind}, missing)"),
        },
        NodeKind::TextureSample => "Sample Texture 2D".to_string(),
        NodeKind::CubemapSample => "Sample Cubemap".to_string(),
        NodeKind::NormalVector { space } => format!("Normal Vector ({space:?} space)"),
        NodeKind::Multiply => "Multiply".to_string(),
        NodeKind::ScalarConstant { value } => format!("Float constant {value:?}"),
        NodeKind::MasterOutput => "Master Output".to_string(),
    }
}

/// Render the recipe for a document.
///
/// Nodes are listed in topological order; a cyclic document falls back to
/// creation order.
pub fn render_guide(doc: &GraphDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Shader graph conversion guide");
    let _ = writeln!(out, "=============================");

    let _ = writeln!(out, "\nProperties:");
    if doc.property_count() == 0 {
        let _ = writeln!(out, "  (none)");
    }
    for property in doc.properties() {
        let _ = writeln!(
            out,
            "  - {} -> Reference: {} ({}, default {})",
            property.display_name,
            property.reference_name,
            property.kind(),
            property.default_value
        );
    }

    let order = doc
        .topological_order()
        .unwrap_or_else(|_| doc.node_ids().collect());

    let _ = writeln!(out, "\nNodes:");
    for (step, node_id) in order.iter().enumerate() {
        let Some(node) = doc.node(*node_id) else {
            continue;
        };
        let _ = writeln!(out, "  {}. {} {}", step + 1, node.id, describe(doc, node));
        for slot in node.kind.inputs() {
            if let Some(edge) = doc.incoming_edge(node.id, slot.id) {
                let _ = writeln!(
                    out,
                    "       {} <- {}.{}",
                    slot.id, edge.src_node, edge.src_slot
                );
            }
        }
    }

    let _ = writeln!(out, "\nOutput:");
    match doc.output_binding() {
        Some(binding) => {
            let _ = writeln!(out, "  {}.{}", binding.node_id, binding.slot_id);
        }
        None => {
            let _ = writeln!(out, "  (unbound)");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_legacy_formula;

    #[test]
    fn test_legacy_guide() {
        let guide = render_guide(&build_legacy_formula());
        assert!(guide.contains("Main Color -> Reference: _Color (Color, default (0.5, 0.5, 0.5, 1))"));
        assert!(guide.contains("Normal Vector (View space)"));
        assert!(guide.contains("Float constant 2.0"));
        assert!(guide.contains("base_color <- #9.out"));
        assert!(guide.trim_end().ends_with("#10.base_color"));

        let sample = guide.find("Sample Cubemap").unwrap();
        let master = guide.find("Master Output").unwrap();
        assert!(sample < master);
    }

    #[test]
    fn test_empty_guide() {
        let guide = render_guide(&GraphDocument::new());
        assert!(guide.contains("(none)"));
        assert!(guide.contains("(unbound)"));
    }
}
