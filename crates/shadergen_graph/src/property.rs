// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph properties: named inputs exposed for external binding.

use crate::slot::SlotType;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Globally unique identifier of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyGuid(pub Uuid);

impl PropertyGuid {
    /// Create a new random guid
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive the guid allocated at `index` within `namespace`.
    ///
    /// The same namespace and index always yield the same guid, and distinct
    /// namespaces never collide in practice.
    pub fn derive(namespace: &Uuid, index: u32) -> Self {
        Self(Uuid::new_v5(namespace, &index.to_le_bytes()))
    }
}

impl Default for PropertyGuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PropertyGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of value a property exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// RGBA color
    Color,
    /// 2D texture
    Texture2D,
    /// Cubemap texture
    Cubemap,
    /// Single float
    Scalar,
}

impl PropertyKind {
    /// Type of the slot a reference to this property produces
    pub fn slot_type(self) -> SlotType {
        match self {
            Self::Color => SlotType::Vector4,
            Self::Texture2D => SlotType::Texture2D,
            Self::Cubemap => SlotType::Cubemap,
            Self::Scalar => SlotType::Scalar,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Color => "Color",
            Self::Texture2D => "Texture2D",
            Self::Cubemap => "Cubemap",
            Self::Scalar => "Scalar",
        };
        f.write_str(name)
    }
}

/// Default value of a property, typed per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// RGBA color
    Color([f32; 4]),
    /// Optional default texture asset
    Texture2D(Option<String>),
    /// Optional default cubemap asset
    Cubemap(Option<String>),
    /// Single float
    Scalar(f32),
}

impl PropertyValue {
    /// Mid-gray, fully opaque
    pub const MID_GRAY: Self = Self::Color([0.5, 0.5, 0.5, 1.0]);

    /// Kind this value belongs to
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Color(_) => PropertyKind::Color,
            Self::Texture2D(_) => PropertyKind::Texture2D,
            Self::Cubemap(_) => PropertyKind::Cubemap,
            Self::Scalar(_) => PropertyKind::Scalar,
        }
    }

    /// Default value for a kind: white, no texture, or zero
    pub fn default_for(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Color => Self::Color([1.0, 1.0, 1.0, 1.0]),
            PropertyKind::Texture2D => Self::Texture2D(None),
            PropertyKind::Cubemap => Self::Cubemap(None),
            PropertyKind::Scalar => Self::Scalar(0.0),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color([r, g, b, a]) => write!(f, "({r}, {g}, {b}, {a})"),
            Self::Texture2D(Some(asset)) | Self::Cubemap(Some(asset)) => f.write_str(asset),
            Self::Texture2D(None) | Self::Cubemap(None) => f.write_str("none"),
            Self::Scalar(value) => write!(f, "{value}"),
        }
    }
}

/// A named graph input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Immutable identity
    pub guid: PropertyGuid,
    /// Name shown to artists
    pub display_name: String,
    /// Shader-side uniform name
    pub reference_name: String,
    /// Default value, which also fixes the kind
    pub default_value: PropertyValue,
}

impl Property {
    /// Kind of the property
    pub fn kind(&self) -> PropertyKind {
        self.default_value.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_guids_are_stable() {
        let namespace = Uuid::new_v4();
        assert_eq!(
            PropertyGuid::derive(&namespace, 3),
            PropertyGuid::derive(&namespace, 3)
        );
        assert_ne!(
            PropertyGuid::derive(&namespace, 0),
            PropertyGuid::derive(&namespace, 1)
        );
        assert_ne!(
            PropertyGuid::derive(&namespace, 0),
            PropertyGuid::derive(&Uuid::new_v4(), 0)
        );
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(PropertyValue::MID_GRAY.kind(), PropertyKind::Color);
        assert_eq!(PropertyValue::Cubemap(None).kind(), PropertyKind::Cubemap);
        for kind in [
            PropertyKind::Color,
            PropertyKind::Texture2D,
            PropertyKind::Cubemap,
            PropertyKind::Scalar,
        ] {
            assert_eq!(PropertyValue::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_kind_slot_types() {
        assert_eq!(PropertyKind::Color.slot_type(), SlotType::Vector4);
        assert_eq!(PropertyKind::Cubemap.slot_type(), SlotType::Cubemap);
    }
}
