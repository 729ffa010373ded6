// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the shader graph.
//!
//! The variant set is closed: every [`NodeKind`] has a fixed slot shape
//! returned by [`NodeKind::slots`], so a node never grows or loses slots.

use crate::property::{PropertyGuid, PropertyKind};
use crate::slot::{SlotDirection, SlotSpec, SlotType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot ids shared by the node variants
pub mod slots {
    /// Output of a property reference
    pub const PROPERTY_OUT: &str = "out";
    /// Texture object input of a texture sample
    pub const TEXTURE: &str = "texture";
    /// Sampled color output of texture and cubemap samples
    pub const RGBA: &str = "rgba";
    /// Cubemap object input of a cubemap sample
    pub const CUBEMAP: &str = "cubemap";
    /// Lookup direction input of a cubemap sample
    pub const DIRECTION: &str = "direction";
    /// Output of a normal vector node
    pub const NORMAL: &str = "normal";
    /// First multiply operand
    pub const A: &str = "a";
    /// Second multiply operand
    pub const B: &str = "b";
    /// Multiply result
    pub const OUT: &str = "out";
    /// Scalar constant output
    pub const VALUE: &str = "value";
    /// Base color input of the master output
    pub const BASE_COLOR: &str = "base_color";
    /// Alpha input of the master output
    pub const ALPHA: &str = "alpha";
}

/// Identifier of a node, unique within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layout coordinate, advisory only
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Position {
    /// Create a position
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Coordinate space of a normal vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateSpace {
    /// Object space
    Object,
    /// View (camera) space
    View,
    /// World space
    World,
    /// Tangent space
    Tangent,
}

const COLOR_REFERENCE: &[SlotSpec] = &[SlotSpec::output(slots::PROPERTY_OUT, SlotType::Vector4)];
const TEXTURE_REFERENCE: &[SlotSpec] =
    &[SlotSpec::output(slots::PROPERTY_OUT, SlotType::Texture2D)];
const CUBEMAP_REFERENCE: &[SlotSpec] = &[SlotSpec::output(slots::PROPERTY_OUT, SlotType::Cubemap)];
const SCALAR_REFERENCE: &[SlotSpec] = &[SlotSpec::output(slots::PROPERTY_OUT, SlotType::Scalar)];

const TEXTURE_SAMPLE: &[SlotSpec] = &[
    SlotSpec::input(slots::TEXTURE, SlotType::Texture2D),
    SlotSpec::output(slots::RGBA, SlotType::Vector4),
];

const CUBEMAP_SAMPLE: &[SlotSpec] = &[
    SlotSpec::input(slots::CUBEMAP, SlotType::Cubemap),
    SlotSpec::input(slots::DIRECTION, SlotType::Direction),
    SlotSpec::output(slots::RGBA, SlotType::Vector4),
];

const NORMAL_VECTOR: &[SlotSpec] = &[SlotSpec::output(slots::NORMAL, SlotType::Direction)];

const MULTIPLY: &[SlotSpec] = &[
    SlotSpec::input(slots::A, SlotType::Vector4),
    SlotSpec::input(slots::B, SlotType::Vector4),
    SlotSpec::output(slots::OUT, SlotType::Vector4),
];

const SCALAR_CONSTANT: &[SlotSpec] = &[SlotSpec::output(slots::VALUE, SlotType::Scalar)];

const MASTER_OUTPUT: &[SlotSpec] = &[
    SlotSpec::input(slots::BASE_COLOR, SlotType::Vector3),
    SlotSpec::input(slots::ALPHA, SlotType::Scalar),
];

/// Node variant with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Reads a document property
    PropertyReference {
        /// Referenced property
        guid: PropertyGuid,
        /// Kind of the referenced property, which fixes the output type
        kind: PropertyKind,
    },
    /// Samples a 2D texture at the mesh's first UV channel
    TextureSample,
    /// Samples a cubemap along a direction
    CubemapSample,
    /// Surface normal in a fixed space
    NormalVector {
        /// Space the normal is expressed in
        space: CoordinateSpace,
    },
    /// Component-wise product of two vectors
    Multiply,
    /// Constant float
    ScalarConstant {
        /// Constant value
        value: f32,
    },
    /// Terminal node receiving the final result
    MasterOutput,
}

impl NodeKind {
    /// Ordered slot shape of this variant
    pub fn slots(&self) -> &'static [SlotSpec] {
        match self {
            Self::PropertyReference { kind, .. } => match kind {
                PropertyKind::Color => COLOR_REFERENCE,
                PropertyKind::Texture2D => TEXTURE_REFERENCE,
                PropertyKind::Cubemap => CUBEMAP_REFERENCE,
                PropertyKind::Scalar => SCALAR_REFERENCE,
            },
            Self::TextureSample => TEXTURE_SAMPLE,
            Self::CubemapSample => CUBEMAP_SAMPLE,
            Self::NormalVector { .. } => NORMAL_VECTOR,
            Self::Multiply => MULTIPLY,
            Self::ScalarConstant { .. } => SCALAR_CONSTANT,
            Self::MasterOutput => MASTER_OUTPUT,
        }
    }

    /// Look up a slot by id
    pub fn slot(&self, id: &str) -> Option<&'static SlotSpec> {
        self.slots().iter().find(|s| s.id == id)
    }

    /// Input slots in declaration order
    pub fn inputs(&self) -> impl Iterator<Item = &'static SlotSpec> {
        self.slots().iter().filter(|s| s.direction == SlotDirection::Input)
    }

    /// Output slots in declaration order
    pub fn outputs(&self) -> impl Iterator<Item = &'static SlotSpec> {
        self.slots().iter().filter(|s| s.direction == SlotDirection::Output)
    }

    /// Persisted variant tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PropertyReference { .. } => "PropertyReference",
            Self::TextureSample => "TextureSample",
            Self::CubemapSample => "CubemapSample",
            Self::NormalVector { .. } => "NormalVector",
            Self::Multiply => "Multiply",
            Self::ScalarConstant { .. } => "ScalarConstant",
            Self::MasterOutput => "MasterOutput",
        }
    }

    /// Whether this is the master output variant
    pub fn is_master_output(&self) -> bool {
        matches!(self, Self::MasterOutput)
    }
}

/// Ordered `(slot id, direction, type)` shape of a variant
pub fn types_of(kind: &NodeKind) -> Vec<(&'static str, SlotDirection, SlotType)> {
    kind.slots()
        .iter()
        .map(|s| (s.id, s.direction, s.slot_type))
        .collect()
}

/// A node instance in a document
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identity within the document
    pub id: NodeId,
    /// Variant and parameters
    pub kind: NodeKind,
    /// Layout position
    pub position: Position,
}

impl Node {
    /// Create a node at the origin
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            position: Position::default(),
        }
    }

    /// Look up a slot by id
    pub fn slot(&self, id: &str) -> Option<&'static SlotSpec> {
        self.kind.slot(id)
    }
}
