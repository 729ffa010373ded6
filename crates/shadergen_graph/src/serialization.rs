// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persisted graph document format.
//!
//! A document is written as a versioned record of properties, nodes, edges
//! and the output binding, encoded as RON or JSON. Reading a document back
//! always re-runs the validator, so a file that parses but breaks a graph
//! invariant is rejected as a validation failure.

use crate::connection::Edge;
use crate::graph::{GraphDocument, OutputBinding};
use crate::node::{CoordinateSpace, Node, NodeId, NodeKind, Position};
use crate::property::{Property, PropertyGuid, PropertyKind, PropertyValue};
use crate::validation::{validate, Validated, ValidationError};
use indexmap::{IndexMap, IndexSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Current graph document format version
pub const FORMAT_VERSION: u32 = 1;

/// Text encoding of a persisted document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// Rusty Object Notation
    #[default]
    Ron,
    /// JSON
    Json,
}

impl Encoding {
    /// Guess the encoding of a document from its first significant byte
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Json,
            _ => Self::Ron,
        }
    }

    /// Parse an encoding name (`ron` or `json`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ron" => Some(Self::Ron),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Lowercase encoding name
    pub fn name(self) -> &'static str {
        match self {
            Self::Ron => "ron",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphFile {
    version: u32,
    properties: Vec<PropertyRecord>,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    #[serde(default)]
    output_binding: Option<BindingRecord>,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyRecord {
    guid: PropertyGuid,
    kind: PropertyKind,
    display_name: String,
    #[serde(default)]
    reference_name: String,
    default_value: PropertyValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    variant: String,
    #[serde(default)]
    params: NodeParams,
    position: Position,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    guid: Option<PropertyGuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<PropertyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    space: Option<CoordinateSpace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRecord {
    src_node: NodeId,
    src_slot: String,
    dst_node: NodeId,
    dst_slot: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BindingRecord {
    node_id: NodeId,
    slot_id: String,
}

impl From<&Property> for PropertyRecord {
    fn from(property: &Property) -> Self {
        Self {
            guid: property.guid,
            kind: property.kind(),
            display_name: property.display_name.clone(),
            reference_name: property.reference_name.clone(),
            default_value: property.default_value.clone(),
        }
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let mut params = NodeParams::default();
        match node.kind {
            NodeKind::PropertyReference { guid, kind } => {
                params.guid = Some(guid);
                params.kind = Some(kind);
            }
            NodeKind::NormalVector { space } => params.space = Some(space),
            NodeKind::ScalarConstant { value } => params.value = Some(value),
            NodeKind::TextureSample
            | NodeKind::CubemapSample
            | NodeKind::Multiply
            | NodeKind::MasterOutput => {}
        }
        Self {
            id: node.id,
            variant: node.kind.tag().to_string(),
            params,
            position: node.position,
        }
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(edge: &Edge) -> Self {
        Self {
            src_node: edge.src_node,
            src_slot: edge.src_slot.to_string(),
            dst_node: edge.dst_node,
            dst_slot: edge.dst_slot.to_string(),
        }
    }
}

impl NodeRecord {
    fn kind(&self) -> Result<NodeKind, DeserializeError> {
        let missing = |param: &str| {
            DeserializeError::MalformedStructure(format!(
                "node {} ({}) is missing parameter `{param}`",
                self.id, self.variant
            ))
        };

        let kind = match self.variant.as_str() {
            "PropertyReference" => NodeKind::PropertyReference {
                guid: self.params.guid.ok_or_else(|| missing("guid"))?,
                kind: self.params.kind.ok_or_else(|| missing("kind"))?,
            },
            "TextureSample" => NodeKind::TextureSample,
            "CubemapSample" => NodeKind::CubemapSample,
            "NormalVector" => NodeKind::NormalVector {
                space: self.params.space.ok_or_else(|| missing("space"))?,
            },
            "Multiply" => NodeKind::Multiply,
            "ScalarConstant" => NodeKind::ScalarConstant {
                value: self.params.value.ok_or_else(|| missing("value"))?,
            },
            "MasterOutput" => NodeKind::MasterOutput,
            other => return Err(DeserializeError::UnknownVariantTag(other.to_string())),
        };
        Ok(kind)
    }
}

fn encode<T: Serialize>(value: &T, encoding: Encoding) -> Result<Vec<u8>, SerializeError> {
    match encoding {
        Encoding::Ron => {
            let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
            Ok(text.into_bytes())
        }
        Encoding::Json => Ok(serde_json::to_vec_pretty(value)?),
    }
}

fn decode<T: DeserializeOwned>(text: &str, encoding: Encoding) -> Result<T, DeserializeError> {
    let result = match encoding {
        Encoding::Ron => ron::from_str(text).map_err(|e| e.to_string()),
        Encoding::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
    };
    result.map_err(DeserializeError::MalformedStructure)
}

/// Encode a validated document
pub fn serialize(doc: &Validated<'_>, encoding: Encoding) -> Result<Vec<u8>, SerializeError> {
    let file = GraphFile {
        version: FORMAT_VERSION,
        properties: doc.properties().map(PropertyRecord::from).collect(),
        nodes: doc.nodes().map(NodeRecord::from).collect(),
        edges: doc.edges().map(EdgeRecord::from).collect(),
        output_binding: doc.output_binding().map(|b| BindingRecord {
            node_id: b.node_id,
            slot_id: b.slot_id.to_string(),
        }),
    };
    let bytes = encode(&file, encoding)?;
    tracing::debug!(bytes = bytes.len(), encoding = encoding.name(), "serialized graph");
    Ok(bytes)
}

/// Decode and validate a document
pub fn deserialize(bytes: &[u8], encoding: Encoding) -> Result<GraphDocument, DeserializeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DeserializeError::MalformedStructure(format!("not UTF-8: {e}")))?;

    let probe: VersionProbe = decode(text, encoding)?;
    if probe.version != FORMAT_VERSION {
        return Err(DeserializeError::UnsupportedVersion {
            found: probe.version,
            supported: FORMAT_VERSION,
        });
    }

    let file: GraphFile = decode(text, encoding)?;
    let doc = assemble(file)?;
    validate(&doc)?;
    Ok(doc)
}

/// Decode a document, detecting its encoding
pub fn deserialize_any(bytes: &[u8]) -> Result<GraphDocument, DeserializeError> {
    deserialize(bytes, Encoding::sniff(bytes))
}

fn assemble(file: GraphFile) -> Result<GraphDocument, DeserializeError> {
    let mut properties = IndexMap::with_capacity(file.properties.len());
    for record in file.properties {
        if record.default_value.kind() != record.kind {
            return Err(DeserializeError::MalformedStructure(format!(
                "property {} is declared {} but its default is {}",
                record.guid,
                record.kind,
                record.default_value.kind()
            )));
        }
        let property = Property {
            guid: record.guid,
            display_name: record.display_name,
            reference_name: record.reference_name,
            default_value: record.default_value,
        };
        if properties.insert(record.guid, property).is_some() {
            return Err(DeserializeError::MalformedStructure(format!(
                "duplicate property {}",
                record.guid
            )));
        }
    }

    let mut nodes = IndexMap::with_capacity(file.nodes.len());
    for record in &file.nodes {
        let node = Node {
            id: record.id,
            kind: record.kind()?,
            position: record.position,
        };
        if nodes.insert(record.id, node).is_some() {
            return Err(DeserializeError::MalformedStructure(format!(
                "duplicate node {}",
                record.id
            )));
        }
    }

    let mut edges = IndexSet::with_capacity(file.edges.len());
    for record in file.edges {
        let edge = Edge::new(record.src_node, record.src_slot, record.dst_node, record.dst_slot);
        if !edges.insert(edge) {
            return Err(DeserializeError::MalformedStructure(
                "duplicate edge".to_string(),
            ));
        }
    }

    let output_binding = file.output_binding.map(|b| OutputBinding {
        node_id: b.node_id,
        slot_id: b.slot_id.into(),
    });

    Ok(GraphDocument::from_parts(properties, nodes, edges, output_binding))
}

/// Error while encoding a document
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// RON encoder failure
    #[error("RON encoding failed: {0}")]
    Ron(#[from] ron::Error),

    /// JSON encoder failure
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error while decoding a document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeserializeError {
    /// The document was written by an incompatible format version
    #[error("Unsupported graph format version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Version this build reads
        supported: u32,
    },

    /// The document does not match the expected structure
    #[error("Malformed graph document: {0}")]
    MalformedStructure(String),

    /// A node names a variant that does not exist
    #[error("Unknown node variant '{0}'")]
    UnknownVariantTag(String),

    /// The document parsed but breaks a graph invariant
    #[error("Invalid graph document: {0}")]
    Invalid(#[from] ValidationError),
}
