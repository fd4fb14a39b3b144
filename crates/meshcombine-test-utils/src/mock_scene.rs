//! In-memory scene tree used as a discovery service in tests.

use meshcombine::{MaterialKey, MeshHandle, MeshRef, Renderable, RenderableSource, TransformRef};

use crate::fixtures::material_label;

/// Index of a node in a [`MockScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
struct MockRenderer {
    material: MaterialKey,
    vertex_count: u32,
    mesh: Option<MeshHandle>,
}

#[derive(Debug, Clone)]
struct MockNode {
    name: String,
    active: bool,
    children: Vec<NodeId>,
    renderer: Option<MockRenderer>,
}

/// A tree of named nodes, some carrying a renderer.
///
/// Enumeration is depth-first in insertion order, starting with the root
/// itself. A node is inactive if it or any ancestor is inactive.
#[derive(Debug, Clone)]
pub struct MockScene {
    nodes: Vec<MockNode>,
}

impl Default for MockScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScene {
    /// A scene containing only an empty root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![MockNode {
                name: "root".to_string(),
                active: true,
                children: Vec::new(),
                renderer: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add an empty node under `parent`.
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.insert(parent, name, None)
    }

    /// Add a node with a renderer of material `material` under `parent`.
    pub fn add_renderer(&mut self, parent: NodeId, name: &str, material: u64, vertex_count: u32) -> NodeId {
        let renderer = MockRenderer {
            material: MaterialKey::labeled(material, material_label(material)),
            vertex_count,
            mesh: Some(MeshHandle(self.nodes.len() as u64)),
        };
        self.insert(parent, name, Some(renderer))
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) {
        self.nodes[node.0].active = active;
    }

    /// Detach the mesh from a renderer node.
    pub fn clear_mesh(&mut self, node: NodeId) {
        if let Some(renderer) = self.nodes[node.0].renderer.as_mut() {
            renderer.mesh = None;
        }
    }

    pub fn name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, parent: NodeId, name: &str, renderer: Option<MockRenderer>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MockNode {
            name: name.to_string(),
            active: true,
            children: Vec::new(),
            renderer,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn collect(&self, node: NodeId, include_inactive: bool, out: &mut Vec<Renderable>) {
        let entry = &self.nodes[node.0];
        if !entry.active && !include_inactive {
            return;
        }
        if let Some(renderer) = &entry.renderer {
            out.push(Renderable::new(
                entry.name.as_str(),
                renderer.material.clone(),
                renderer.vertex_count,
                renderer.mesh.map(MeshRef::Asset),
                TransformRef::Node(node.0 as u64),
            ));
        }
        for &child in &entry.children {
            self.collect(child, include_inactive, out);
        }
    }
}

impl RenderableSource for MockScene {
    type Root = NodeId;

    fn enumerate(&self, root: &NodeId, include_inactive: bool) -> Vec<Renderable> {
        let mut out = Vec::new();
        if root.0 < self.nodes.len() {
            self.collect(*root, include_inactive, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(renderables: &[Renderable]) -> Vec<&str> {
        renderables.iter().map(Renderable::source_id).collect()
    }

    #[test]
    fn test_depth_first_order() {
        let mut scene = MockScene::new();
        let root = scene.root();
        let a = scene.add_node(root, "a");
        scene.add_renderer(a, "a1", 1, 10);
        scene.add_renderer(root, "b", 2, 10);
        scene.add_renderer(a, "a2", 1, 10);

        let found = scene.enumerate(&root, false);
        assert_eq!(names(&found), vec!["a1", "a2", "b"]);
    }

    #[test]
    fn test_inactive_subtree_skipped() {
        let mut scene = MockScene::new();
        let root = scene.root();
        let hidden = scene.add_node(root, "hidden");
        scene.add_renderer(hidden, "h1", 1, 10);
        scene.add_renderer(root, "v1", 1, 10);
        scene.set_active(hidden, false);

        assert_eq!(names(&scene.enumerate(&root, false)), vec!["v1"]);
        assert_eq!(names(&scene.enumerate(&root, true)), vec!["h1", "v1"]);
    }

    #[test]
    fn test_cleared_mesh_is_reported_missing() {
        let mut scene = MockScene::new();
        let root = scene.root();
        let node = scene.add_renderer(root, "broken", 1, 10);
        scene.clear_mesh(node);

        let found = scene.enumerate(&root, false);
        assert_eq!(found[0].mesh(), None);
    }
}
