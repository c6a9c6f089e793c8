use crate::representation::ViewMode;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Edge length the interactive view fits the model into.
    pub interactive_size: f32,
    /// Edge length of the small reference preview.
    pub preview_size: f32,
    pub view_mode: ViewMode,
    /// Draw the translucent context surface in edges and vertices modes.
    pub show_context: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            interactive_size: 3.0,
            preview_size: 1.8,
            view_mode: ViewMode::Faces,
            show_context: true,
        }
    }
}
