mod drawable;

use std::fmt;
use std::str::FromStr;

pub use drawable::{DrawMaterial, DrawStyle, Drawable, DrawableUniform};

use crate::model::LoadedModel;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Vertices,
    Edges,
    #[default]
    Faces,
}

impl ViewMode {
    pub fn primary_style(self) -> DrawStyle {
        match self {
            ViewMode::Vertices => DrawStyle::Points,
            ViewMode::Edges => DrawStyle::Wireframe,
            ViewMode::Faces => DrawStyle::Shaded,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Vertices => "vertices",
            ViewMode::Edges => "edges",
            ViewMode::Faces => "faces",
        })
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "vertices" => Ok(ViewMode::Vertices),
            "edges" => Ok(ViewMode::Edges),
            "faces" => Ok(ViewMode::Faces),
            other => Err(format!(
                "unknown view mode `{}` (expected vertices, edges or faces)",
                other
            )),
        }
    }
}

/// Derives the drawables for every mesh node of `model` in `mode`.
///
/// With `show_context` set, edges and vertices modes put a translucent copy of
/// the surface before each primary drawable. Faces mode never gets one.
pub fn build_drawables(model: &LoadedModel, mode: ViewMode, show_context: bool) -> Vec<Drawable> {
    let with_context = show_context && mode != ViewMode::Faces;
    let primary_style = mode.primary_style();

    let mut drawables = Vec::new();

    for mesh_node in model.scene.mesh_nodes() {
        let drawable = Drawable {
            node_id: mesh_node.node_id,
            mesh_id: mesh_node.mesh_id,
            style: primary_style,
            world_matrix: mesh_node.world_matrix,
            color: mesh_node.mesh.color.unwrap_or_default(),
        };

        if with_context {
            drawables.push(Drawable {
                style: DrawStyle::Context,
                ..drawable
            });
        }

        drawables.push(drawable);
    }

    drawables
}
