//! The compiled render graph and its validator.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use super::error::{BuildError, ValidationError};
use super::node::{NodeId, RenderNode};

/// An immutable, validated DAG of render passes.
///
/// Built once by the compiler (via [`super::builder::GraphBuilder`]) and
/// never mutated afterwards — the scheduler only ever reads it. Mirrors the
/// teacher's `SceneManager` in using a `SlotMap` for storage, but the graph
/// itself (not just a registry of graphs) owns the map, since a
/// `RenderGraph` here is the per-frame unit of work rather than a long-lived
/// resource.
pub struct RenderGraph {
    nodes: SlotMap<NodeId, RenderNode>,
    root: NodeId,
}

impl RenderGraph {
    /// Validates a populated node map and wraps it as an immutable graph.
    ///
    /// Every node's `inputs` must reference a key already present in
    /// `nodes` — since `NodeId`s are only minted by inserting into this same
    /// map (see [`super::builder::GraphBuilder::add_node`]), a dangling
    /// reference can only arise from a node built against a different
    /// graph's map, or a manifest compiler bug.
    pub(crate) fn build(
        nodes: SlotMap<NodeId, RenderNode>,
        root: NodeId,
    ) -> Result<Self, BuildError> {
        for node in nodes.values() {
            for (port, target) in &node.inputs {
                if !nodes.contains_key(*target) {
                    return Err(BuildError::DanglingInput {
                        node: node.id,
                        port: port.clone(),
                    });
                }
            }
        }

        if !nodes.contains_key(root) {
            return Err(BuildError::UnknownRoot);
        }

        let graph = Self { nodes, root };
        if let Err(remaining) = graph.kahn_order() {
            return Err(BuildError::CycleDetected(remaining));
        }
        Ok(graph)
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.values()
    }

    /// Kahn's algorithm over the `inputs` edges (an edge points from
    /// dependency to dependent). Ties among zero-indegree nodes are broken
    /// by `NodeId` ordering, so the order is deterministic across runs for
    /// an identical graph. Returns the unordered remainder on failure — the
    /// nodes still part of a cycle.
    fn kahn_order(&self) -> Result<Vec<NodeId>, Vec<NodeId>> {
        let mut indegree: FxHashMap<NodeId, u32> = FxHashMap::default();
        let mut dependents: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();

        for node in self.nodes.values() {
            indegree.entry(node.id).or_insert(0);
            for dep in node.inputs.values() {
                *indegree.entry(node.id).or_insert(0) += 1;
                dependents.entry(*dep).or_default().push(node.id);
            }
        }

        let mut ready: BTreeSet<NodeId> = indegree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(next);
            if let Some(deps) = dependents.get(&next) {
                for &d in deps {
                    let entry = indegree.get_mut(&d).expect("dependent tracked in indegree");
                    *entry -= 1;
                    if *entry == 0 {
                        ready.insert(d);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            let visited: FxHashSet<NodeId> = order.into_iter().collect();
            Err(self
                .nodes
                .keys()
                .filter(|id| !visited.contains(id))
                .collect())
        }
    }

    /// Returns a deterministic topological order over the graph's nodes.
    #[must_use]
    pub fn topological_order(&self) -> Vec<NodeId> {
        self.kahn_order()
            .expect("graph was validated acyclic at build() time")
    }

    /// Re-checks acyclicity, unique root, and that every input port a
    /// shader declares is actually bound. `shader_ports` supplies the
    /// declared port names for a shader (normally sourced from the shader
    /// library's reflected signature); a shader with no entry is treated as
    /// having no required ports.
    pub fn validate(
        &self,
        shader_ports: impl Fn(&str) -> &'static [&'static str],
    ) -> Result<(), ValidationError> {
        if let Err(remaining) = self.kahn_order() {
            return Err(ValidationError::CycleDetected(remaining));
        }
        if !self.nodes.contains_key(self.root) {
            return Err(ValidationError::UnknownRoot);
        }
        for node in self.nodes.values() {
            for port in shader_ports(&node.shader) {
                if !node.inputs.contains_key(*port) {
                    return Err(ValidationError::MissingInputBinding {
                        node: node.id,
                        port: (*port).to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::graph::node::{OutputSpec, PixelFormat, RenderNode};

    fn leaf(name: &str) -> RenderNode {
        RenderNode::new(name, "source_linear_ramp", OutputSpec::full(PixelFormat::Linear16))
    }

    #[test]
    fn build_assigns_fresh_ids_and_remaps_inputs() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node(leaf("a"));
        let b = builder.add_node(
            RenderNode::new("b", "identity", OutputSpec::full(PixelFormat::Linear16))
                .with_input("in", a),
        );
        let graph = builder.finish(b).unwrap();
        assert_eq!(graph.node_count(), 2);
        let root = graph.node(graph.root()).unwrap();
        assert!(root.inputs.values().all(|v| graph.node(*v).is_some()));
    }

    #[test]
    fn dangling_input_is_rejected() {
        let mut builder = GraphBuilder::new();
        let phantom = NodeId::default();
        let a = builder.add_node(
            RenderNode::new("a", "identity", OutputSpec::full(PixelFormat::Linear16))
                .with_input("in", phantom),
        );
        let err = builder.finish(a).unwrap_err();
        assert!(matches!(err, BuildError::DanglingInput { .. }));
    }

    #[test]
    fn cycle_is_rejected() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node(leaf("a"));
        let b = builder.add_node(
            RenderNode::new("b", "identity", OutputSpec::full(PixelFormat::Linear16))
                .with_input("in", a),
        );
        builder.rewire_input(a, "in", b);

        let err = builder.finish(b).unwrap_err();
        assert!(matches!(err, BuildError::CycleDetected(_)));
    }

    #[test]
    fn topological_order_places_dependencies_before_dependents() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node(leaf("a"));
        let b = builder.add_node(
            RenderNode::new("b", "identity", OutputSpec::full(PixelFormat::Linear16))
                .with_input("in", a),
        );
        let graph = builder.finish(b).unwrap();
        let order = graph.topological_order();

        let pos_a = order.iter().position(|&id| id == a).unwrap();
        let pos_b = order.iter().position(|&id| id == b).unwrap();
        assert!(pos_a < pos_b);
    }
}
