// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions: typed, directional connection points on nodes.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a slot, unique within its node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub String);

impl SlotId {
    /// Borrow the slot id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SlotId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for SlotId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SlotId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot, accepts at most one incoming edge
    Input,
    /// Output slot, may feed any number of edges
    Output,
}

impl fmt::Display for SlotDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Data type that can flow through a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotType {
    /// Single float
    Scalar,
    /// 3-component vector
    Vector3,
    /// 4-component vector / color
    Vector4,
    /// 2D texture object
    Texture2D,
    /// Cubemap texture object
    Cubemap,
    /// Normalized direction vector
    Direction,
}

impl SlotType {
    /// Check if a value of this type can feed a slot of `other`'s type.
    ///
    /// Scalars broadcast to vectors and `Vector4` truncates to `Vector3`;
    /// every other pair must match exactly.
    pub fn can_connect_to(self, other: SlotType) -> bool {
        if self == other {
            return true;
        }

        matches!(
            (self, other),
            (Self::Scalar, Self::Vector3 | Self::Vector4) | (Self::Vector4, Self::Vector3)
        )
    }

    /// Display name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Vector3 => "Vector3",
            Self::Vector4 => "Vector4",
            Self::Texture2D => "Texture2D",
            Self::Cubemap => "Cubemap",
            Self::Direction => "Direction",
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether an edge from a `src` slot into a `dst` slot is type-correct
pub fn compatible(src: SlotType, dst: SlotType) -> bool {
    src.can_connect_to(dst)
}

/// Static description of one slot on a node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    /// Slot id, unique within the node
    pub id: &'static str,
    /// Slot direction
    pub direction: SlotDirection,
    /// Data type
    pub slot_type: SlotType,
}

impl SlotSpec {
    /// Describe an input slot
    pub const fn input(id: &'static str, slot_type: SlotType) -> Self {
        Self {
            id,
            direction: SlotDirection::Input,
            slot_type,
        }
    }

    /// Describe an output slot
    pub const fn output(id: &'static str, slot_type: SlotType) -> Self {
        Self {
            id,
            direction: SlotDirection::Output,
            slot_type,
        }
    }

    /// Whether this is an input slot
    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }
}
