// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph construction.
//!
//! [`GraphBuilder`] is a thin imperative layer over [`GraphDocument`] that
//! finishes with an auto layout. [`LegacyToonFormula`] uses it to assemble
//! the legacy toon shading formula:
//!
//! ```text
//! result = 2 * cubemapSample(viewNormal) * (color * textureSample(uv))
//! ```

use crate::graph::{AddNodeError, BindError, ConnectError, CycleError, GraphDocument};
use crate::layout::RankLayout;
use crate::node::{slots, CoordinateSpace, NodeId, NodeKind};
use crate::property::{PropertyGuid, PropertyValue};
use uuid::Uuid;

/// Guid namespace of the legacy formula, fixed so rebuilds are identical
pub const LEGACY_FORMULA_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b7e_93d4_4a58_b0e1_7c3a_5d29_e846);

/// Imperative graph construction with layout on completion
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    doc: GraphDocument,
    layout: RankLayout,
}

impl GraphBuilder {
    /// Start an empty graph with a fresh guid namespace
    pub fn new() -> Self {
        Self::from_document(GraphDocument::new())
    }

    /// Start an empty graph with deterministic guids
    pub fn with_namespace(namespace: Uuid) -> Self {
        Self::from_document(GraphDocument::with_namespace(namespace))
    }

    fn from_document(doc: GraphDocument) -> Self {
        Self {
            doc,
            layout: RankLayout::default(),
        }
    }

    /// Use a custom layout spacing
    pub fn with_layout(mut self, layout: RankLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Register a property
    pub fn property(
        &mut self,
        display_name: impl Into<String>,
        reference_name: impl Into<String>,
        default_value: PropertyValue,
    ) -> PropertyGuid {
        self.doc.add_property(display_name, reference_name, default_value)
    }

    /// Add a reference node for a registered property
    pub fn property_node(&mut self, guid: PropertyGuid) -> Result<NodeId, BuildError> {
        Ok(self.doc.add_property_reference(guid)?)
    }

    /// Add a node
    pub fn node(&mut self, kind: NodeKind) -> Result<NodeId, BuildError> {
        Ok(self.doc.add_node(kind)?)
    }

    /// Connect an output slot to an input slot
    pub fn connect(
        &mut self,
        src_node: NodeId,
        src_slot: &str,
        dst_node: NodeId,
        dst_slot: &str,
    ) -> Result<(), BuildError> {
        Ok(self.doc.connect(src_node, src_slot, dst_node, dst_slot)?)
    }

    /// Bind a master output input as the graph result
    pub fn bind_output(&mut self, slot_id: &str) -> Result<(), BuildError> {
        Ok(self.doc.bind_output(slot_id)?)
    }

    /// The document built so far
    pub fn document(&self) -> &GraphDocument {
        &self.doc
    }

    /// Lay the graph out and hand back the document.
    ///
    /// The document is not validated; run the validator before persisting.
    pub fn finish(mut self) -> Result<GraphDocument, BuildError> {
        self.layout.apply(&mut self.doc)?;
        Ok(self.doc)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembly of the legacy toon shading formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyToonFormula {
    /// Namespace the property guids derive from
    pub namespace: Uuid,
    /// Layout spacing
    pub layout: RankLayout,
}

impl Default for LegacyToonFormula {
    fn default() -> Self {
        Self {
            namespace: LEGACY_FORMULA_NAMESPACE,
            layout: RankLayout::default(),
        }
    }
}

impl LegacyToonFormula {
    /// Assemble the formula into a laid-out document
    pub fn build(&self) -> Result<GraphDocument, BuildError> {
        let mut b = GraphBuilder::with_namespace(self.namespace).with_layout(self.layout);

        let color = b.property("Main Color", "_Color", PropertyValue::MID_GRAY);
        let main_tex = b.property("Base (RGB)", "_MainTex", PropertyValue::Texture2D(None));
        let toon_shade = b.property(
            "ToonShader Cubemap(RGB)",
            "_ToonShade",
            PropertyValue::Cubemap(None),
        );

        let color_ref = b.property_node(color)?;
        let texture_ref = b.property_node(main_tex)?;
        let cubemap_ref = b.property_node(toon_shade)?;
        let texture_sample = b.node(NodeKind::TextureSample)?;
        let cubemap_sample = b.node(NodeKind::CubemapSample)?;
        // View-space normal stands in for a reflection vector, as in the legacy shader.
        let normal = b.node(NodeKind::NormalVector {
            space: CoordinateSpace::View,
        })?;
        let tinted = b.node(NodeKind::Multiply)?;
        let shaded = b.node(NodeKind::Multiply)?;
        let two = b.node(NodeKind::ScalarConstant { value: 2.0 })?;
        let doubled = b.node(NodeKind::Multiply)?;
        let master = b.node(NodeKind::MasterOutput)?;

        b.connect(texture_ref, slots::PROPERTY_OUT, texture_sample, slots::TEXTURE)?;
        b.connect(cubemap_ref, slots::PROPERTY_OUT, cubemap_sample, slots::CUBEMAP)?;
        b.connect(normal, slots::NORMAL, cubemap_sample, slots::DIRECTION)?;
        b.connect(color_ref, slots::PROPERTY_OUT, tinted, slots::A)?;
        b.connect(texture_sample, slots::RGBA, tinted, slots::B)?;
        b.connect(cubemap_sample, slots::RGBA, shaded, slots::A)?;
        b.connect(tinted, slots::OUT, shaded, slots::B)?;
        b.connect(two, slots::VALUE, doubled, slots::A)?;
        b.connect(shaded, slots::OUT, doubled, slots::B)?;
        b.connect(doubled, slots::OUT, master, slots::BASE_COLOR)?;
        b.bind_output(slots::BASE_COLOR)?;

        let doc = b.finish()?;
        tracing::info!(
            nodes = doc.node_count(),
            edges = doc.edge_count(),
            "assembled legacy toon formula"
        );
        Ok(doc)
    }
}

/// Assemble the legacy formula with default settings
pub fn try_build_legacy_formula() -> Result<GraphDocument, BuildError> {
    LegacyToonFormula::default().build()
}

/// Assemble the legacy formula with default settings.
///
/// Every slot and node in the formula is known statically, so a failure
/// here is a bug in the formula itself.
pub fn build_legacy_formula() -> GraphDocument {
    match try_build_legacy_formula() {
        Ok(doc) => doc,
        Err(err) => unreachable!("legacy formula is statically well-formed: {err}"),
    }
}

/// Error while building a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Edge rejected
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Output binding rejected
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Layout impossible because of a cycle
    #[error(transparent)]
    Layout(#[from] CycleError),

    /// Node rejected
    #[error(transparent)]
    Node(#[from] AddNodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Position;
    use crate::property::PropertyKind;
    use crate::validation::validate;

    #[test]
    fn test_legacy_formula_validates() {
        let doc = try_build_legacy_formula().unwrap();
        assert_eq!(validate(&doc), Ok(()));
        assert_eq!(doc.property_count(), 3);
        assert_eq!(doc.node_count(), 11);
        assert_eq!(doc.edge_count(), 10);
    }

    #[test]
    fn test_legacy_formula_is_deterministic() {
        let first = build_legacy_formula();
        let second = build_legacy_formula();
        assert_eq!(first, second);

        let first_ids: Vec<_> = first.node_ids().collect();
        let second_ids: Vec<_> = second.node_ids().collect();
        assert_eq!(first_ids, second_ids);
        for (a, b) in first.nodes().zip(second.nodes()) {
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn test_legacy_formula_properties() {
        let doc = build_legacy_formula();
        let props: Vec<_> = doc.properties().collect();
        assert_eq!(props[0].reference_name, "_Color");
        assert_eq!(props[0].default_value, PropertyValue::Color([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(props[1].kind(), PropertyKind::Texture2D);
        assert_eq!(props[2].kind(), PropertyKind::Cubemap);
    }

    #[test]
    fn test_legacy_formula_binding() {
        let doc = build_legacy_formula();
        let master = doc.master_output().unwrap();
        let binding = doc.output_binding().unwrap();
        assert_eq!(binding.node_id, master);
        assert_eq!(binding.slot_id.as_str(), slots::BASE_COLOR);

        let feeding = doc.incoming_edge(master, slots::BASE_COLOR).unwrap();
        let final_multiply = doc.node(feeding.src_node).unwrap();
        assert_eq!(final_multiply.kind, NodeKind::Multiply);
        let scale = doc.incoming_edge(feeding.src_node, slots::A).unwrap();
        assert_eq!(
            doc.node(scale.src_node).unwrap().kind,
            NodeKind::ScalarConstant { value: 2.0 }
        );
    }

    #[test]
    fn test_legacy_formula_layout() {
        let doc = build_legacy_formula();
        let positions: Vec<Position> = doc.nodes().map(|n| n.position).collect();
        // color, texture and cubemap references, then samplers, normal,
        // multiplies, constant, final multiply and master output
        let expected = [
            Position::new(0.0, 0.0),
            Position::new(0.0, 150.0),
            Position::new(0.0, 300.0),
            Position::new(-200.0, 0.0),
            Position::new(-200.0, 150.0),
            Position::new(0.0, 450.0),
            Position::new(-400.0, 0.0),
            Position::new(-600.0, 0.0),
            Position::new(0.0, 600.0),
            Position::new(-800.0, 0.0),
            Position::new(-1000.0, 0.0),
        ];
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_builder_rejects_unknown_property() {
        let mut b = GraphBuilder::new();
        let guid = PropertyGuid::new();
        assert_eq!(
            b.property_node(guid),
            Err(BuildError::Node(AddNodeError::UnknownProperty(guid)))
        );
    }

    #[test]
    fn test_builder_leaves_partial_graph_inspectable() {
        let mut b = GraphBuilder::new();
        let a = b.node(NodeKind::Multiply).unwrap();
        let c = b.node(NodeKind::Multiply).unwrap();
        b.connect(a, slots::OUT, c, slots::A).unwrap();
        assert_eq!(b.document().edge_count(), 1);
        assert!(validate(b.document()).is_err());
        assert!(b.finish().is_ok());
    }

    #[test]
    fn test_custom_spacing() {
        let formula = LegacyToonFormula {
            layout: RankLayout {
                column_spacing: 300.0,
                row_spacing: 100.0,
            },
            ..LegacyToonFormula::default()
        };
        let doc = formula.build().unwrap();
        let master = doc.master_output().unwrap();
        assert_eq!(doc.node(master).unwrap().position, Position::new(-1500.0, 0.0));
    }
}
