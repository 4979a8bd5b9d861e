use uuid::Uuid;

use crate::{Flavor, MetaMap, Payload};

/// Index of a node within its owning [`Tree`](crate::Tree) arena. Distinct
/// from [`Node::id`], which is the snowflake id carried in the wire reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// A single item in the dissection tree. Owned by the [`Tree`](crate::Tree)
/// arena; `parent` is a lookup-only back-reference, never an owning pointer.
#[derive(Clone, Debug)]
pub struct Node {
    /// Snowflake id, `0` until assigned by the `IdAllocator` during digest.
    pub id: i64,
    pub uuid: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub payload: Payload,
    /// Inherited verbatim from the parent at construction time.
    pub passwords: Vec<String>,
    pub pdf_max_pages: u32,
    pub word_max_pages: u32,
    pub flavor: Flavor,
    pub meta: MetaMap,
}

impl Node {
    /// A root node: no parent, no inherited limits beyond the request's own
    /// defaults.
    pub fn root(payload: Payload, passwords: Vec<String>, pdf_max_pages: u32, word_max_pages: u32) -> Self {
        Self {
            id: 0,
            uuid: Uuid::new_v4().to_string(),
            parent: None,
            children: Vec::new(),
            payload,
            passwords,
            pdf_max_pages,
            word_max_pages,
            flavor: Flavor::Other,
            meta: MetaMap::new(),
        }
    }

    /// A child constructed by an extractor. Copies the inherited limits from
    /// `parent` verbatim; `id` stays `0` until the digest pass assigns one.
    pub fn child_of(parent: &Node, payload: Payload) -> Self {
        Self {
            id: 0,
            uuid: Uuid::new_v4().to_string(),
            parent: None,
            children: Vec::new(),
            payload,
            passwords: parent.passwords.clone(),
            pdf_max_pages: parent.pdf_max_pages,
            word_max_pages: parent.word_max_pages,
            flavor: Flavor::Other,
            meta: MetaMap::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.payload, Payload::File(_))
    }
}
