//! Incremental graph construction.
//!
//! `slotmap` only mints a key at the moment of insertion, so a node's final
//! `NodeId` has to exist before any later node can wire an input to it.
//! `GraphBuilder` inserts eagerly — `add_node` returns the real id
//! immediately — rather than batching a `Vec<RenderNode>` and remapping
//! placeholder ids afterwards. This is the compiler's primary construction
//! path (§4.2); [`RenderGraph::build`] is the validator it calls at the end.

use slotmap::SlotMap;

use super::error::BuildError;
use super::graph::RenderGraph;
use super::node::{NodeId, RenderNode};

#[derive(Default)]
pub struct GraphBuilder {
    nodes: SlotMap<NodeId, RenderNode>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Inserts `node`, discarding whatever placeholder id it carried, and
    /// returns the id later nodes should use to reference it.
    pub fn add_node(&mut self, mut node: RenderNode) -> NodeId {
        self.nodes.insert_with_key(|k| {
            node.id = k;
            node
        })
    }

    /// Rebinds an already-inserted node's input port. Used by the compiler
    /// to splice adapter/IDT/ODT nodes into an edge after both endpoints
    /// already exist.
    pub fn rewire_input(&mut self, node: NodeId, port: &str, source: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.inputs.insert(port.to_string(), source);
        }
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id)
    }

    /// Validates and finalizes the graph with `root` as its terminal node.
    pub fn finish(self, root: NodeId) -> Result<RenderGraph, BuildError> {
        RenderGraph::build(self.nodes, root)
    }
}
