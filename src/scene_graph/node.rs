use id_arena::Id;

use crate::model::MeshId;
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<SceneNode>;

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh_id: Option<MeshId>,
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh_id: MeshId) -> Self {
        self.mesh_id = Some(mesh_id);
        self
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::IDENTITY,
            mesh_id: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
