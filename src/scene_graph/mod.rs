pub mod node;
pub mod scene;
pub mod transform;

pub use node::{NodeId, SceneNode};
pub use scene::{MeshNode, Scene, WalkItem};
pub use transform::Transform;
