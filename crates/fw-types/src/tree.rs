use std::collections::VecDeque;

use crate::{Node, NodeId};

/// Arena owning every node of a single dissection response. Children are
/// owned by the arena, not by their parent struct; `Node::parent` is an
/// index for lookup only.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the request's root node. Must be called exactly once.
    pub fn insert_root(&mut self, node: Node) -> NodeId {
        debug_assert!(self.root.is_none(), "tree already has a root");
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.root = Some(id);
        id
    }

    /// Insert `node` as a child of `parent`, appending to `parent`'s children
    /// list in order.
    pub fn insert_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Breadth-first order starting at the root, the order the wire reply
    /// is serialized in.
    pub fn bfs_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.nodes[id.0].children.iter().copied());
        }
        order
    }
}
