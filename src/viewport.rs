use glam::{Mat4, Quat};

use crate::config::ViewerConfig;
use crate::model::LoadedModel;
use crate::normalize::{fit_transform, FitTransform};
use crate::representation::{build_drawables, Drawable, ViewMode};

/// What the renderer needs to draw one view of the current model.
#[derive(Debug, Clone)]
pub struct Frame {
    pub transform: FitTransform,
    /// `transform` composed with the presentation rotation.
    pub model_matrix: Mat4,
    pub drawables: Vec<Drawable>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub target_size: f32,
    pub view_mode: ViewMode,
    pub show_context: bool,
}

impl Viewport {
    pub fn interactive(config: &ViewerConfig) -> Self {
        Self {
            target_size: config.interactive_size,
            view_mode: config.view_mode,
            show_context: config.show_context,
        }
    }

    /// Small always-shaded preview of the model.
    pub fn reference_preview(config: &ViewerConfig) -> Self {
        Self {
            target_size: config.preview_size,
            view_mode: ViewMode::Faces,
            show_context: false,
        }
    }

    pub fn frame(&self, model: Option<&LoadedModel>, rotation: Quat) -> Frame {
        let transform = fit_transform(model, self.target_size);
        let drawables = model
            .map(|model| build_drawables(model, self.view_mode, self.show_context))
            .unwrap_or_default();

        Frame {
            transform,
            model_matrix: transform.matrix(rotation),
            drawables,
        }
    }
}
