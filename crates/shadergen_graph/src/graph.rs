// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph document: properties, nodes, edges and the output binding.
//!
//! Documents are append-only during construction. Nodes and properties are
//! never removed, node ids are handed out from a monotonic counter, and all
//! mutation goes through the methods here so the structural checks in
//! [`GraphDocument::connect`] cannot be bypassed.

use crate::connection::Edge;
use crate::node::{Node, NodeId, NodeKind, Position};
use crate::property::{Property, PropertyGuid, PropertyValue};
use crate::slot::{compatible, SlotDirection, SlotId, SlotType};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// The input slot of the master output that receives the final result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputBinding {
    /// Master output node
    pub node_id: NodeId,
    /// Bound input slot
    pub slot_id: SlotId,
}

/// A shader graph document
#[derive(Debug, Clone)]
pub struct GraphDocument {
    /// Namespace property guids are derived from
    namespace: Uuid,
    /// Properties by guid
    properties: IndexMap<PropertyGuid, Property>,
    /// Nodes in creation order
    nodes: IndexMap<NodeId, Node>,
    /// Edges between slots
    edges: IndexSet<Edge>,
    /// Edge feeding each connected input slot
    inputs: HashMap<NodeId, HashMap<SlotId, Edge>>,
    /// Final result slot
    output_binding: Option<OutputBinding>,
    /// Next node id to hand out, `None` once every id has been used
    next_node_id: Option<u32>,
    /// Number of guids allocated so far
    next_property_index: u32,
}

impl GraphDocument {
    /// Create an empty document with a fresh guid namespace
    pub fn new() -> Self {
        Self::with_namespace(Uuid::new_v4())
    }

    /// Create an empty document whose property guids derive from `namespace`.
    ///
    /// Two documents built with the same namespace and the same sequence of
    /// calls are identical, guids included.
    pub fn with_namespace(namespace: Uuid) -> Self {
        Self {
            namespace,
            properties: IndexMap::new(),
            nodes: IndexMap::new(),
            edges: IndexSet::new(),
            inputs: HashMap::new(),
            output_binding: None,
            next_node_id: Some(0),
            next_property_index: 0,
        }
    }

    /// Reassemble a document from already-checked parts.
    ///
    /// Allocation resumes after the highest loaded id. A document holding
    /// id `u32::MAX` loads fine but cannot grow.
    pub(crate) fn from_parts(
        properties: IndexMap<PropertyGuid, Property>,
        nodes: IndexMap<NodeId, Node>,
        edges: IndexSet<Edge>,
        output_binding: Option<OutputBinding>,
    ) -> Self {
        let next_node_id = nodes
            .keys()
            .map(|id| id.0)
            .max()
            .map_or(Some(0), |max| max.checked_add(1));
        let next_property_index = u32::try_from(properties.len()).unwrap_or(u32::MAX);

        let mut inputs: HashMap<NodeId, HashMap<SlotId, Edge>> = HashMap::new();
        for edge in &edges {
            inputs
                .entry(edge.dst_node)
                .or_default()
                .entry(edge.dst_slot.clone())
                .or_insert_with(|| edge.clone());
        }

        Self {
            namespace: Uuid::new_v4(),
            properties,
            nodes,
            edges,
            inputs,
            output_binding,
            next_node_id,
            next_property_index,
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Register a property and return its freshly allocated guid.
    ///
    /// The property kind is the kind of `default_value`.
    pub fn add_property(
        &mut self,
        display_name: impl Into<String>,
        reference_name: impl Into<String>,
        default_value: PropertyValue,
    ) -> PropertyGuid {
        let mut guid = PropertyGuid::derive(&self.namespace, self.next_property_index);
        self.next_property_index = self.next_property_index.saturating_add(1);
        while self.properties.contains_key(&guid) {
            guid = PropertyGuid::new();
        }

        let property = Property {
            guid,
            display_name: display_name.into(),
            reference_name: reference_name.into(),
            default_value,
        };
        tracing::debug!(%guid, name = %property.display_name, kind = %property.kind(), "added property");
        self.properties.insert(guid, property);
        guid
    }

    /// Get a property by guid
    pub fn property(&self, guid: PropertyGuid) -> Option<&Property> {
        self.properties.get(&guid)
    }

    /// Get all properties
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Get the number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Add a node at the origin and return its id.
    ///
    /// Ids are never reused, so allocation fails once `u32::MAX` is taken.
    pub fn add_node(&mut self, kind: NodeKind) -> Result<NodeId, AddNodeError> {
        let raw = self.next_node_id.ok_or(AddNodeError::IdsExhausted)?;
        let id = NodeId(raw);
        self.next_node_id = raw.checked_add(1);
        tracing::debug!(%id, variant = kind.tag(), "added node");
        self.nodes.insert(id, Node::new(id, kind));
        Ok(id)
    }

    /// Add a reference node for an existing property
    pub fn add_property_reference(&mut self, guid: PropertyGuid) -> Result<NodeId, AddNodeError> {
        let kind = self
            .properties
            .get(&guid)
            .ok_or(AddNodeError::UnknownProperty(guid))?
            .kind();
        self.add_node(NodeKind::PropertyReference { guid, kind })
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get all nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First master output node in creation order
    pub fn master_output(&self) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|n| n.kind.is_master_output())
            .map(|n| n.id)
    }

    /// Move a node. Unknown ids and non-finite coordinates are ignored
    /// since layout carries no meaning.
    pub fn set_position(&mut self, node_id: NodeId, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            tracing::warn!(%node_id, x, y, "ignored non-finite position");
            return;
        }
        match self.nodes.get_mut(&node_id) {
            Some(node) => node.position = Position::new(x, y),
            None => tracing::debug!(%node_id, "ignored position for unknown node"),
        }
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Connect an output slot to an input slot.
    ///
    /// Acyclicity is not checked here; run the validator once construction
    /// is done. A failed call leaves the document untouched.
    pub fn connect(
        &mut self,
        src_node: NodeId,
        src_slot: &str,
        dst_node: NodeId,
        dst_slot: &str,
    ) -> Result<(), ConnectError> {
        let source = self
            .nodes
            .get(&src_node)
            .ok_or(ConnectError::UnknownNode(src_node))?;
        let target = self
            .nodes
            .get(&dst_node)
            .ok_or(ConnectError::UnknownNode(dst_node))?;

        let source_slot = source.slot(src_slot).ok_or_else(|| ConnectError::UnknownSlot {
            node: src_node,
            slot: src_slot.into(),
        })?;
        let target_slot = target.slot(dst_slot).ok_or_else(|| ConnectError::UnknownSlot {
            node: dst_node,
            slot: dst_slot.into(),
        })?;

        if source_slot.direction != SlotDirection::Output {
            return Err(ConnectError::DirectionMismatch {
                node: src_node,
                slot: src_slot.into(),
                expected: SlotDirection::Output,
            });
        }
        if target_slot.direction != SlotDirection::Input {
            return Err(ConnectError::DirectionMismatch {
                node: dst_node,
                slot: dst_slot.into(),
                expected: SlotDirection::Input,
            });
        }

        if self.incoming_edge(dst_node, dst_slot).is_some() {
            return Err(ConnectError::SlotOccupied {
                node: dst_node,
                slot: dst_slot.into(),
            });
        }

        if !compatible(source_slot.slot_type, target_slot.slot_type) {
            return Err(ConnectError::TypeMismatch {
                from: source_slot.slot_type,
                to: target_slot.slot_type,
            });
        }

        let edge = Edge::new(src_node, src_slot, dst_node, dst_slot);
        tracing::debug!(%edge, "connected");
        self.inputs
            .entry(dst_node)
            .or_default()
            .insert(edge.dst_slot.clone(), edge.clone());
        self.edges.insert(edge);
        Ok(())
    }

    /// Remove an existing edge
    pub fn disconnect(
        &mut self,
        src_node: NodeId,
        src_slot: &str,
        dst_node: NodeId,
        dst_slot: &str,
    ) -> Result<(), ConnectError> {
        let edge = Edge::new(src_node, src_slot, dst_node, dst_slot);
        if self.edges.shift_remove(&edge) {
            if let Some(inputs) = self.inputs.get_mut(&dst_node) {
                if inputs.get(dst_slot) == Some(&edge) {
                    inputs.remove(dst_slot);
                }
            }
            tracing::debug!(%edge, "disconnected");
            Ok(())
        } else {
            Err(ConnectError::EdgeNotFound(edge))
        }
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edge feeding a given input slot, if any
    pub fn incoming_edge(&self, node_id: NodeId, slot: &str) -> Option<&Edge> {
        self.inputs.get(&node_id)?.get(slot)
    }

    /// Edges ending at a node
    pub fn incoming(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.dst_node == node_id)
    }

    /// Edges leaving a node
    pub fn outgoing(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.src_node == node_id)
    }

    // ------------------------------------------------------------------
    // Output binding
    // ------------------------------------------------------------------

    /// Designate the master output input slot that receives the result
    pub fn bind_output(&mut self, slot_id: &str) -> Result<(), BindError> {
        let master = self.master_output().ok_or(BindError::NoMasterOutput)?;
        let is_input = self
            .nodes
            .get(&master)
            .and_then(|n| n.slot(slot_id))
            .is_some_and(|s| s.is_input());
        if !is_input {
            return Err(BindError::UnknownSlot(slot_id.into()));
        }

        tracing::debug!(node = %master, slot = slot_id, "bound output");
        self.output_binding = Some(OutputBinding {
            node_id: master,
            slot_id: slot_id.into(),
        });
        Ok(())
    }

    /// Current output binding
    pub fn output_binding(&self) -> Option<&OutputBinding> {
        self.output_binding.as_ref()
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Nodes ordered so every edge points forward (Kahn's algorithm).
    ///
    /// Ties are broken by creation order, so the result is deterministic.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut in_degree: HashMap<NodeId, usize> = self.nodes.keys().map(|&id| (id, 0)).collect();
        let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for edge in &self.edges {
            if let Some(degree) = in_degree.get_mut(&edge.dst_node) {
                *degree += 1;
            }
            successors.entry(edge.src_node).or_default().push(edge.dst_node);
        }
        for targets in successors.values_mut() {
            targets.sort_by_key(|id| self.nodes.get_index_of(id));
        }

        let mut queue: VecDeque<NodeId> = self
            .nodes
            .keys()
            .filter(|id| in_degree.get(*id) == Some(&0))
            .copied()
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node_id) = queue.pop_front() {
            order.push(node_id);
            for &successor in successors.get(&node_id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(&successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(successor);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let remaining = self
                .nodes
                .keys()
                .filter(|id| in_degree.get(*id).is_some_and(|d| *d > 0))
                .copied()
                .collect();
            return Err(CycleError { nodes: remaining });
        }

        Ok(order)
    }

    /// Type carried by a slot, if the node and slot exist
    pub fn slot_type(&self, node_id: NodeId, slot: &str) -> Option<SlotType> {
        self.nodes.get(&node_id)?.slot(slot).map(|s| s.slot_type)
    }
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same properties, nodes, edges and binding.
///
/// Iteration order and the guid namespace are not significant.
impl PartialEq for GraphDocument {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
            && self.nodes == other.nodes
            && self.edges == other.edges
            && self.output_binding == other.output_binding
    }
}

/// Error when creating or removing an edge
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectError {
    /// Node not found
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Slot not defined for the node's variant
    #[error("Unknown slot '{slot}' on node {node}")]
    UnknownSlot {
        /// Node
        node: NodeId,
        /// Requested slot
        slot: SlotId,
    },

    /// Source is not an output or destination is not an input
    #[error("Slot '{slot}' on node {node} is not an {expected}")]
    DirectionMismatch {
        /// Node
        node: NodeId,
        /// Offending slot
        slot: SlotId,
        /// Direction the slot needed to have
        expected: SlotDirection,
    },

    /// Destination input already has an incoming edge
    #[error("Input '{slot}' on node {node} is already connected")]
    SlotOccupied {
        /// Node
        node: NodeId,
        /// Occupied input
        slot: SlotId,
    },

    /// No implicit conversion between the slot types
    #[error("Cannot connect {from} output to {to} input")]
    TypeMismatch {
        /// Source type
        from: SlotType,
        /// Destination type
        to: SlotType,
    },

    /// Edge to remove does not exist
    #[error("Edge not found: {0}")]
    EdgeNotFound(Edge),
}

/// Error when adding a node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddNodeError {
    /// Reference to a property that was never registered
    #[error("Unknown property: {0}")]
    UnknownProperty(PropertyGuid),

    /// Every node id has been handed out
    #[error("Node ids exhausted")]
    IdsExhausted,
}

/// Error when binding the output slot
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    /// The document has no master output node
    #[error("Document has no master output")]
    NoMasterOutput,

    /// The slot is not an input of the master output
    #[error("Master output has no input slot '{0}'")]
    UnknownSlot(SlotId),
}

/// Error when the graph contains a cycle
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Graph contains a cycle through {nodes:?}")]
pub struct CycleError {
    /// Nodes that could not be ordered
    pub nodes: Vec<NodeId>,
}
