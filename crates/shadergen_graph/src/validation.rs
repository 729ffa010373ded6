// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural validation of graph documents.
//!
//! Validation runs on demand, never implicitly, so partially built graphs
//! stay inspectable. Checks run in a fixed order and the first failure is
//! reported:
//!
//! 1. edge endpoints reference existing nodes
//! 2. edge slots exist and have the right direction
//! 3. no input slot has more than one incoming edge
//! 4. edge endpoint types are compatible
//! 5. the edge graph is acyclic
//! 6. exactly one master output exists and the binding names one of its inputs
//! 7. every property reference resolves to a property of the same kind
//! 8. every stored number is finite

use crate::connection::Edge;
use crate::graph::GraphDocument;
use crate::node::{NodeId, NodeKind};
use crate::property::{PropertyGuid, PropertyKind, PropertyValue};
use crate::slot::{compatible, SlotDirection, SlotId, SlotType};
use std::collections::HashMap;
use std::ops::Deref;

/// Check a document against every structural invariant
pub fn validate(doc: &GraphDocument) -> Result<(), ValidationError> {
    check_references(doc)?;
    check_slots(doc)?;
    check_cardinality(doc)?;
    check_types(doc)?;
    check_acyclic(doc)?;
    check_master_output(doc)?;
    check_properties(doc)?;
    check_finite(doc)?;
    Ok(())
}

/// A document that passed [`validate`].
///
/// Holding one borrows the document immutably, so it cannot change between
/// validation and serialization.
#[derive(Debug, Clone, Copy)]
pub struct Validated<'a> {
    doc: &'a GraphDocument,
}

impl<'a> Validated<'a> {
    /// Validate and wrap a document
    pub fn new(doc: &'a GraphDocument) -> Result<Self, ValidationError> {
        validate(doc)?;
        Ok(Self { doc })
    }

    /// The validated document
    pub fn document(&self) -> &'a GraphDocument {
        self.doc
    }
}

impl Deref for Validated<'_> {
    type Target = GraphDocument;

    fn deref(&self) -> &GraphDocument {
        self.doc
    }
}

fn check_references(doc: &GraphDocument) -> Result<(), ValidationError> {
    for edge in doc.edges() {
        for node in [edge.src_node, edge.dst_node] {
            if doc.node(node).is_none() {
                return Err(ValidationError::UnknownReference {
                    edge: edge.clone(),
                    node,
                });
            }
        }
    }
    Ok(())
}

fn check_slots(doc: &GraphDocument) -> Result<(), ValidationError> {
    for edge in doc.edges() {
        let endpoints = [
            (edge.src_node, &edge.src_slot, SlotDirection::Output),
            (edge.dst_node, &edge.dst_slot, SlotDirection::Input),
        ];
        for (node_id, slot_id, expected) in endpoints {
            let slot = doc
                .node(node_id)
                .and_then(|n| n.slot(slot_id.as_str()))
                .ok_or_else(|| ValidationError::UnknownSlot {
                    node: node_id,
                    slot: slot_id.clone(),
                })?;
            if slot.direction != expected {
                return Err(ValidationError::DirectionMismatch {
                    edge: edge.clone(),
                    expected,
                });
            }
        }
    }
    Ok(())
}

fn check_cardinality(doc: &GraphDocument) -> Result<(), ValidationError> {
    let mut incoming: HashMap<(NodeId, &SlotId), usize> = HashMap::new();
    for edge in doc.edges() {
        *incoming.entry((edge.dst_node, &edge.dst_slot)).or_default() += 1;
    }

    // Report in edge order so the failure is deterministic.
    for edge in doc.edges() {
        let count = incoming.get(&(edge.dst_node, &edge.dst_slot)).copied().unwrap_or(0);
        if count > 1 {
            return Err(ValidationError::CardinalityViolation {
                node: edge.dst_node,
                slot: edge.dst_slot.clone(),
                count,
            });
        }
    }
    Ok(())
}

fn check_types(doc: &GraphDocument) -> Result<(), ValidationError> {
    for edge in doc.edges() {
        let from = doc.slot_type(edge.src_node, edge.src_slot.as_str());
        let to = doc.slot_type(edge.dst_node, edge.dst_slot.as_str());
        if let (Some(from), Some(to)) = (from, to) {
            if !compatible(from, to) {
                return Err(ValidationError::TypeMismatch {
                    edge: edge.clone(),
                    from,
                    to,
                });
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

struct CycleSearch {
    successors: HashMap<NodeId, Vec<NodeId>>,
    marks: HashMap<NodeId, Mark>,
}

impl CycleSearch {
    fn mark(&self, node_id: NodeId) -> Mark {
        self.marks.get(&node_id).copied().unwrap_or(Mark::Unvisited)
    }

    /// Depth-first walk from `root` with an explicit stack of
    /// `(node, next successor index)` frames.
    fn visit(&mut self, root: NodeId) -> Result<(), Vec<NodeId>> {
        if self.mark(root) != Mark::Unvisited {
            return Ok(());
        }
        self.marks.insert(root, Mark::OnStack);
        let mut frames: Vec<(NodeId, usize)> = vec![(root, 0)];

        while let Some((node_id, next)) = frames.last_mut() {
            let node_id = *node_id;
            let successor = self
                .successors
                .get(&node_id)
                .and_then(|targets| targets.get(*next))
                .copied();
            *next += 1;

            let Some(successor) = successor else {
                frames.pop();
                self.marks.insert(node_id, Mark::Done);
                continue;
            };

            match self.mark(successor) {
                Mark::Done => {}
                Mark::OnStack => {
                    let start = frames
                        .iter()
                        .position(|(n, _)| *n == successor)
                        .unwrap_or(0);
                    return Err(frames[start..].iter().map(|(n, _)| *n).collect());
                }
                Mark::Unvisited => {
                    self.marks.insert(successor, Mark::OnStack);
                    frames.push((successor, 0));
                }
            }
        }
        Ok(())
    }
}

fn check_acyclic(doc: &GraphDocument) -> Result<(), ValidationError> {
    let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edge in doc.edges() {
        successors.entry(edge.src_node).or_default().push(edge.dst_node);
    }
    for targets in successors.values_mut() {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut search = CycleSearch {
        successors,
        marks: HashMap::with_capacity(doc.node_count()),
    };
    for node_id in doc.node_ids() {
        search
            .visit(node_id)
            .map_err(|nodes| ValidationError::CycleDetected { nodes })?;
    }
    Ok(())
}

fn check_master_output(doc: &GraphDocument) -> Result<(), ValidationError> {
    let masters: Vec<NodeId> = doc
        .nodes()
        .filter(|n| n.kind.is_master_output())
        .map(|n| n.id)
        .collect();

    let master = match masters.len() {
        0 => return Err(ValidationError::MissingMasterOutput),
        1 => masters[0],
        _ => return Err(ValidationError::MultipleMasterOutputs { nodes: masters }),
    };

    let binding = doc.output_binding().ok_or(ValidationError::UnboundOutput)?;
    let bound_input = binding.node_id == master
        && doc
            .node(master)
            .and_then(|n| n.slot(binding.slot_id.as_str()))
            .is_some_and(|s| s.is_input());
    if !bound_input {
        return Err(ValidationError::InvalidBinding {
            node: binding.node_id,
            slot: binding.slot_id.clone(),
        });
    }
    Ok(())
}

fn check_properties(doc: &GraphDocument) -> Result<(), ValidationError> {
    for node in doc.nodes() {
        if let NodeKind::PropertyReference { guid, kind } = node.kind {
            let property = doc.property(guid).ok_or(ValidationError::UnknownProperty {
                node: node.id,
                guid,
            })?;
            if property.kind() != kind {
                return Err(ValidationError::PropertyKindMismatch {
                    node: node.id,
                    guid,
                    expected: property.kind(),
                    found: kind,
                });
            }
        }
    }
    Ok(())
}

fn check_finite(doc: &GraphDocument) -> Result<(), ValidationError> {
    for property in doc.properties() {
        let finite = match &property.default_value {
            PropertyValue::Color(rgba) => rgba.iter().all(|c| c.is_finite()),
            PropertyValue::Scalar(value) => value.is_finite(),
            PropertyValue::Texture2D(_) | PropertyValue::Cubemap(_) => true,
        };
        if !finite {
            return Err(ValidationError::NonFiniteDefault {
                guid: property.guid,
            });
        }
    }

    for node in doc.nodes() {
        if let NodeKind::ScalarConstant { value } = node.kind {
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteNumber {
                    node: node.id,
                    field: "value",
                });
            }
        }
        if !(node.position.x.is_finite() && node.position.y.is_finite()) {
            return Err(ValidationError::NonFiniteNumber {
                node: node.id,
                field: "position",
            });
        }
    }
    Ok(())
}

/// Reason a document failed validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// An edge names a node that is not in the document
    #[error("Edge {edge} references unknown node {node}")]
    UnknownReference {
        /// Offending edge
        edge: Edge,
        /// Missing node
        node: NodeId,
    },

    /// An edge names a slot its node's variant does not define
    #[error("Unknown slot '{slot}' on node {node}")]
    UnknownSlot {
        /// Node
        node: NodeId,
        /// Missing slot
        slot: SlotId,
    },

    /// An edge starts at an input or ends at an output
    #[error("Edge {edge} has an endpoint that is not an {expected}")]
    DirectionMismatch {
        /// Offending edge
        edge: Edge,
        /// Direction the endpoint needed to have
        expected: SlotDirection,
    },

    /// An input slot has more than one incoming edge
    #[error("Input '{slot}' on node {node} has {count} incoming edges")]
    CardinalityViolation {
        /// Node
        node: NodeId,
        /// Input slot
        slot: SlotId,
        /// Number of incoming edges
        count: usize,
    },

    /// An edge joins slots with no implicit conversion
    #[error("Edge {edge} connects {from} to {to}")]
    TypeMismatch {
        /// Offending edge
        edge: Edge,
        /// Source type
        from: SlotType,
        /// Destination type
        to: SlotType,
    },

    /// The edges form a cycle
    #[error("Cycle detected through nodes {nodes:?}")]
    CycleDetected {
        /// Nodes on the cycle, in edge order
        nodes: Vec<NodeId>,
    },

    /// No master output node exists
    #[error("Document has no master output")]
    MissingMasterOutput,

    /// More than one master output node exists
    #[error("Document has {} master outputs: {nodes:?}", .nodes.len())]
    MultipleMasterOutputs {
        /// All master output nodes
        nodes: Vec<NodeId>,
    },

    /// No output binding is set
    #[error("Master output is not bound")]
    UnboundOutput,

    /// The binding does not name an input slot of the master output
    #[error("Output binding {node}.{slot} is not a master output input")]
    InvalidBinding {
        /// Bound node
        node: NodeId,
        /// Bound slot
        slot: SlotId,
    },

    /// A property reference names a property that does not exist
    #[error("Node {node} references unknown property {guid}")]
    UnknownProperty {
        /// Reference node
        node: NodeId,
        /// Missing property
        guid: PropertyGuid,
    },

    /// A property reference disagrees with its property's kind
    #[error("Node {node} expects a {found} property but {guid} is {expected}")]
    PropertyKindMismatch {
        /// Reference node
        node: NodeId,
        /// Referenced property
        guid: PropertyGuid,
        /// Kind of the property
        expected: PropertyKind,
        /// Kind recorded on the node
        found: PropertyKind,
    },

    /// A property default holds NaN or an infinity
    #[error("Property {guid} has a non-finite default value")]
    NonFiniteDefault {
        /// Offending property
        guid: PropertyGuid,
    },

    /// A node parameter or position holds NaN or an infinity
    #[error("Node {node} has a non-finite {field}")]
    NonFiniteNumber {
        /// Offending node
        node: NodeId,
        /// `value` or `position`
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::slots;

    fn bound_master() -> (GraphDocument, NodeId) {
        let mut doc = GraphDocument::new();
        let master = doc.add_node(NodeKind::MasterOutput).unwrap();
        doc.bind_output(slots::BASE_COLOR).unwrap();
        (doc, master)
    }

    #[test]
    fn test_minimal_document_is_valid() {
        let (mut doc, master) = bound_master();
        let two = doc.add_node(NodeKind::ScalarConstant { value: 2.0 }).unwrap();
        doc.connect(two, slots::VALUE, master, slots::BASE_COLOR).unwrap();
        assert_eq!(validate(&doc), Ok(()));
        assert!(Validated::new(&doc).is_ok());
    }

    #[test]
    fn test_cycle_detected() {
        let (mut doc, master) = bound_master();
        let a = doc.add_node(NodeKind::Multiply).unwrap();
        let b = doc.add_node(NodeKind::Multiply).unwrap();
        doc.connect(a, slots::OUT, b, slots::A).unwrap();
        doc.connect(b, slots::OUT, a, slots::A).unwrap();
        doc.connect(b, slots::OUT, master, slots::BASE_COLOR).unwrap();

        match validate(&doc) {
            Err(ValidationError::CycleDetected { nodes }) => {
                assert_eq!(nodes.len(), 2);
                assert!(nodes.contains(&a));
                assert!(nodes.contains(&b));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_master_output() {
        let mut doc = GraphDocument::new();
        doc.add_node(NodeKind::Multiply).unwrap();
        assert_eq!(validate(&doc), Err(ValidationError::MissingMasterOutput));
    }

    #[test]
    fn test_multiple_master_outputs() {
        let (mut doc, master) = bound_master();
        let second = doc.add_node(NodeKind::MasterOutput).unwrap();
        assert_eq!(
            validate(&doc),
            Err(ValidationError::MultipleMasterOutputs {
                nodes: vec![master, second]
            })
        );
    }

    #[test]
    fn test_unbound_output() {
        let mut doc = GraphDocument::new();
        doc.add_node(NodeKind::MasterOutput).unwrap();
        assert_eq!(validate(&doc), Err(ValidationError::UnboundOutput));
    }

    #[test]
    fn test_unknown_property_reference() {
        let (mut doc, _) = bound_master();
        let guid = PropertyGuid::new();
        let node = doc.add_node(NodeKind::PropertyReference {
            guid,
            kind: PropertyKind::Color,
        }).unwrap();
        assert_eq!(
            validate(&doc),
            Err(ValidationError::UnknownProperty { node, guid })
        );
    }

    #[test]
    fn test_property_kind_mismatch() {
        let (mut doc, _) = bound_master();
        let guid = doc.add_property("Color", "_Color", PropertyValue::MID_GRAY);
        let node = doc.add_node(NodeKind::PropertyReference {
            guid,
            kind: PropertyKind::Cubemap,
        }).unwrap();
        assert_eq!(
            validate(&doc),
            Err(ValidationError::PropertyKindMismatch {
                node,
                guid,
                expected: PropertyKind::Color,
                found: PropertyKind::Cubemap,
            })
        );
    }

    #[test]
    fn test_cycle_reported_before_master_checks() {
        let mut doc = GraphDocument::new();
        let a = doc.add_node(NodeKind::Multiply).unwrap();
        doc.connect(a, slots::OUT, a, slots::B).unwrap();
        assert_eq!(
            validate(&doc),
            Err(ValidationError::CycleDetected { nodes: vec![a] })
        );
    }

    #[test]
    fn test_deep_chain_is_checked_without_recursion() {
        let (mut doc, master) = bound_master();
        let mut previous = doc.add_node(NodeKind::Multiply).unwrap();
        for _ in 0..100_000 {
            let next = doc.add_node(NodeKind::Multiply).unwrap();
            doc.connect(previous, slots::OUT, next, slots::A).unwrap();
            previous = next;
        }
        doc.connect(previous, slots::OUT, master, slots::BASE_COLOR).unwrap();
        assert_eq!(validate(&doc), Ok(()));

        let first = NodeId(1);
        doc.connect(previous, slots::OUT, first, slots::A).unwrap();
        match validate(&doc) {
            Err(ValidationError::CycleDetected { nodes }) => {
                assert_eq!(nodes.len(), 100_001);
                assert_eq!(nodes.first(), Some(&first));
                assert_eq!(nodes.last(), Some(&previous));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_scalar_constant() {
        let (mut doc, master) = bound_master();
        let value = doc.add_node(NodeKind::ScalarConstant { value: f32::INFINITY }).unwrap();
        doc.connect(value, slots::VALUE, master, slots::ALPHA).unwrap();
        assert_eq!(
            validate(&doc),
            Err(ValidationError::NonFiniteNumber {
                node: value,
                field: "value"
            })
        );
        assert!(Validated::new(&doc).is_err());
    }

    #[test]
    fn test_non_finite_property_default() {
        let (mut doc, _) = bound_master();
        let guid = doc.add_property("Color", "_Color", PropertyValue::Color([0.5, f32::NAN, 0.5, 1.0]));
        assert_eq!(validate(&doc), Err(ValidationError::NonFiniteDefault { guid }));

        let (mut doc, _) = bound_master();
        let guid = doc.add_property("Shininess", "_Shininess", PropertyValue::Scalar(f32::NEG_INFINITY));
        assert_eq!(validate(&doc), Err(ValidationError::NonFiniteDefault { guid }));
    }
}
