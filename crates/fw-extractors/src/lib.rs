//! Per-flavor extractors and analyzers plus the static [`FlavorRegistry`]
//! that dispatches them.
//!
//! Each flavor maps to an ordered list of named extractors whose outputs
//! concatenate, and an ordered list of named analyzers that only touch
//! meta. [`FlavorRegistry::standard`] builds this table once, up front,
//! rather than consulting a mutable global registry at dispatch time.

mod archive;
mod email;
mod html;
mod ocr;
mod pdf;
mod qrcode;
mod registry;
mod url;
mod word;

pub use registry::FlavorRegistry;

use filewhisperer_types::{DataPayload, ExtractResult, FilePayload, MetaMap, Payload};

/// Everything an extractor or analyzer needs: the node's payload (read-only),
/// its inherited limits, and mutable access to its own meta map. Extractors
/// may only mutate `meta` as a side effect — child construction and
/// id/limit inheritance happen in the digest pass, not here.
pub struct ExtractInput<'a> {
    pub payload: &'a Payload,
    pub passwords: &'a [String],
    pub pdf_max_pages: u32,
    pub word_max_pages: u32,
    pub meta: &'a mut MetaMap,
}

impl<'a> ExtractInput<'a> {
    pub fn file(&self) -> Option<&FilePayload> {
        self.payload.as_file()
    }

    pub fn data(&self) -> Option<&DataPayload> {
        self.payload.as_data()
    }
}

/// Produces zero or more child payloads from one node, and may mutate the
/// node's own meta map (e.g. recording `correct_password`).
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>>;
}

/// Mutates a node's meta map only; never produces children.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;
    fn analyze(&self, input: &mut ExtractInput<'_>) -> ExtractResult<()>;
}
