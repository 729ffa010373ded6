// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedural shader-graph construction and serialization.
//!
//! This crate provides the typed graph model behind the legacy toon shader
//! migration:
//! - Typed slots with implicit conversions
//! - An append-only graph document with checked connections
//! - A builder that assembles the legacy formula and lays it out
//! - On-demand validation of the graph invariants
//! - A versioned RON/JSON document format with round-trip fidelity
//!
//! ## Architecture
//!
//! The builder mutates a [`GraphDocument`] through its own insertion
//! operations. The validator runs explicitly, so partially built graphs can
//! be inspected. Only a [`Validated`] document can be serialized, and every
//! deserialized document is validated again before it is returned.

pub mod slot;
pub mod property;
pub mod node;
pub mod connection;
pub mod graph;
pub mod layout;
pub mod builder;
pub mod validation;
pub mod serialization;
pub mod persist;
pub mod guide;

pub use builder::{build_legacy_formula, try_build_legacy_formula, BuildError, GraphBuilder, LegacyToonFormula};
pub use connection::Edge;
pub use graph::{AddNodeError, BindError, ConnectError, CycleError, GraphDocument, OutputBinding};
pub use guide::render_guide;
pub use layout::RankLayout;
pub use node::{slots, types_of, CoordinateSpace, Node, NodeId, NodeKind, Position};
pub use persist::{find_documents, is_graph_document, read_document, write_document, write_to, AssetImportHook, PersistError};
pub use property::{Property, PropertyGuid, PropertyKind, PropertyValue};
pub use serialization::{deserialize, deserialize_any, serialize, DeserializeError, Encoding, SerializeError, FORMAT_VERSION};
pub use slot::{compatible, SlotDirection, SlotId, SlotSpec, SlotType};
pub use validation::{validate, Validated, ValidationError};
