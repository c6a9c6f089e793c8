use glam::Mat4;
use id_arena::Arena;

use crate::math::bounds::Aabb;
use crate::model::{MeshId, MeshPrimitive};
use crate::scene_graph::node::{NodeId, SceneNode};

/// A node tree plus the mesh primitives its nodes reference.
/// Nodes are only linked when allocated as a child, so the tree is acyclic.
#[derive(Debug)]
pub struct Scene {
    nodes: Arena<SceneNode>,
    meshes: Arena<MeshPrimitive>,
    root_id: NodeId,
}

impl Scene {
    pub fn new(root: SceneNode) -> Self {
        let mut nodes = Arena::new();
        let root_id = nodes.alloc(root);

        Self {
            nodes,
            meshes: Arena::new(),
            root_id,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn root(&self) -> &SceneNode {
        &self.nodes[self.root_id]
    }

    pub fn add_mesh(&mut self, mesh: MeshPrimitive) -> MeshId {
        self.meshes.alloc(mesh)
    }

    /// Allocates `node` under `parent_id`.
    pub fn add_child(&mut self, parent_id: NodeId, mut node: SceneNode) -> NodeId {
        node.parent_id = Some(parent_id);
        node.child_ids.clear();
        let node_id = self.nodes.alloc(node);

        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.child_ids.push(node_id);
        }

        node_id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshPrimitive> {
        self.meshes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// Depth-first walk from the root, children in insertion order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            scene: self,
            stack: vec![(self.root_id, Mat4::IDENTITY)],
        }
    }

    /// Nodes that reference a mesh, with their accumulated world matrix.
    pub fn mesh_nodes(&self) -> impl Iterator<Item = MeshNode<'_>> + '_ {
        self.walk().filter_map(move |item| {
            let mesh_id = item.node.mesh_id?;
            let mesh = self.meshes.get(mesh_id)?;

            Some(MeshNode {
                node_id: item.id,
                node: item.node,
                mesh_id,
                mesh,
                world_matrix: item.world_matrix,
            })
        })
    }

    /// World-space bounds of every mesh under its accumulated transform.
    pub fn bounding_box(&self) -> Aabb {
        self.mesh_nodes().fold(Aabb::EMPTY, |aabb, mesh_node| {
            aabb.union(mesh_node.mesh.bounding_box().transformed(&mesh_node.world_matrix))
        })
    }
}

pub struct WalkItem<'a> {
    pub id: NodeId,
    pub node: &'a SceneNode,
    pub world_matrix: Mat4,
}

pub struct MeshNode<'a> {
    pub node_id: NodeId,
    pub node: &'a SceneNode,
    pub mesh_id: MeshId,
    pub mesh: &'a MeshPrimitive,
    pub world_matrix: Mat4,
}

pub struct Walk<'a> {
    scene: &'a Scene,
    stack: Vec<(NodeId, Mat4)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, parent_world_matrix) = self.stack.pop()?;
            let Some(node) = self.scene.nodes.get(id) else {
                continue;
            };

            let world_matrix = parent_world_matrix * node.transform.local_matrix();
            self.stack.extend(
                node.child_ids
                    .iter()
                    .rev()
                    .map(|&child_id| (child_id, world_matrix)),
            );

            return Some(WalkItem {
                id,
                node,
                world_matrix,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::scene_graph::transform::Transform;

    fn triangle() -> MeshPrimitive {
        MeshPrimitive::new(
            "triangle",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        )
    }

    #[test]
    fn walk_visits_depth_first_in_insertion_order() {
        let mut scene = Scene::new(SceneNode::new("root"));
        let a = scene.add_child(scene.root_id(), SceneNode::new("a"));
        scene.add_child(a, SceneNode::new("a1"));
        scene.add_child(scene.root_id(), SceneNode::new("b"));

        let names: Vec<&str> = scene.walk().map(|item| item.node.name.as_str()).collect();
        assert_eq!(names, ["root", "a", "a1", "b"]);
    }

    #[test]
    fn world_matrices_accumulate_down_the_tree() {
        let mut scene = Scene::new(
            SceneNode::new("root").with_transform(Transform::from_translation(Vec3::X)),
        );
        let parent = scene.add_child(
            scene.root_id(),
            SceneNode::new("parent").with_transform(Transform::new(
                Vec3::ZERO,
                Quat::IDENTITY,
                Vec3::splat(2.0),
            )),
        );
        let mesh_id = scene.add_mesh(triangle());
        scene.add_child(
            parent,
            SceneNode::new("child")
                .with_transform(Transform::from_translation(Vec3::Y))
                .with_mesh(mesh_id),
        );

        let mesh_node = scene.mesh_nodes().next().expect("mesh node");
        let origin = mesh_node.world_matrix.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));

        let bounds = scene.bounding_box();
        assert!(bounds.min.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(3.0, 4.0, 0.0), 1e-6));
    }

    #[test]
    fn shared_meshes_are_visited_per_node() {
        let mut scene = Scene::new(SceneNode::new("root"));
        let mesh_id = scene.add_mesh(triangle());
        scene.add_child(scene.root_id(), SceneNode::new("a").with_mesh(mesh_id));
        scene.add_child(scene.root_id(), SceneNode::new("b").with_mesh(mesh_id));

        assert_eq!(scene.mesh_nodes().count(), 2);
        assert!(scene.get_node_by_name("b").is_some());
    }
}
