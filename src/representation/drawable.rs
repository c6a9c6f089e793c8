use glam::{Mat4, Vec4};

use crate::model::{Color, MeshId, MeshPrimitive};
use crate::scene_graph::NodeId;
use crate::scene_graph::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawStyle {
    /// Opaque shaded triangles.
    Shaded,
    /// Unfilled triangles.
    Wireframe,
    /// One point per vertex.
    Points,
    /// Translucent copy of the surface drawn behind wireframe or points.
    Context,
}

/// Fixed material parameters the renderer uses for a `DrawStyle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawMaterial {
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub wireframe: bool,
    pub point_size: Option<f32>,
    pub metalness: f32,
    pub roughness: f32,
    pub render_order: i32,
}

impl DrawStyle {
    pub fn material(self) -> DrawMaterial {
        const SURFACE: DrawMaterial = DrawMaterial {
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            wireframe: false,
            point_size: None,
            metalness: 0.1,
            roughness: 0.75,
            render_order: 1,
        };

        match self {
            DrawStyle::Shaded => SURFACE,
            DrawStyle::Wireframe => DrawMaterial {
                wireframe: true,
                ..SURFACE
            },
            DrawStyle::Points => DrawMaterial {
                point_size: Some(0.05),
                render_order: 2,
                ..SURFACE
            },
            DrawStyle::Context => DrawMaterial {
                opacity: 0.2,
                transparent: true,
                depth_write: false,
                metalness: 0.05,
                roughness: 0.9,
                render_order: 0,
                ..SURFACE
            },
        }
    }
}

/// One draw call's worth of state. The world matrix is captured when the
/// drawable list is built and never recomputed per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub node_id: NodeId,
    pub mesh_id: MeshId,
    pub style: DrawStyle,
    pub world_matrix: Mat4,
    pub color: Color,
}

impl Drawable {
    pub fn mesh<'a>(&self, scene: &'a Scene) -> Option<&'a MeshPrimitive> {
        scene.mesh(self.mesh_id)
    }

    pub fn uniform(&self) -> DrawableUniform {
        DrawableUniform::new(
            self.world_matrix,
            self.color.with_alpha(self.style.material().opacity),
        )
    }
}

/// This should match the same structure defined in WGSL
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawableUniform {
    pub model_matrix: Mat4,
    pub color: Vec4,
}

impl DrawableUniform {
    pub fn new(model_matrix: Mat4, color: Vec4) -> Self {
        Self {
            model_matrix,
            color,
        }
    }
}
