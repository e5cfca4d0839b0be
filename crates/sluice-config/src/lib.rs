//! Sluice Config
//!
//! This crate contains the serializable flow definition types for sluice.
//! These types represent flows exactly as they are authored and fetched from
//! an asset server, before the engine decodes their actions and waits and
//! validates the graph.
//!
//! Actions and waits are kept as raw JSON envelopes here. Their concrete
//! types live in `sluice-engine`, which decodes them through its registries.

mod environment;
mod error;
mod flow;
mod node;

pub use environment::{Environment, RedactionPolicy};
pub use error::DefinitionError;
pub use flow::{FlowDef, read_flow};
pub use node::{CaseDef, CategoryDef, ExitDef, NodeDef, RouterDef};

/// UUID of a flow.
pub type FlowUuid = String;
/// UUID of a node within a flow.
pub type NodeUuid = String;
/// UUID of an exit within a node.
pub type ExitUuid = String;
/// UUID of an action within a node.
pub type ActionUuid = String;
/// UUID of a router category.
pub type CategoryUuid = String;
