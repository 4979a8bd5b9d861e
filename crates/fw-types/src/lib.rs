//! Shared data model for the dissection engine: [`Flavor`], [`Payload`],
//! [`MetaMap`] and the [`Node`]/[`Tree`] arena.

mod error;
mod flavor;
mod meta;
mod node;
mod payload;
mod tree;

pub use error::{ExtractError, ExtractResult};
pub use flavor::Flavor;
pub use meta::MetaMap;
pub use node::{Node, NodeId};
pub use payload::{DataPayload, FilePayload, Payload};
pub use tree::Tree;
