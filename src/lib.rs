pub mod config;
pub mod error;
pub mod format;
pub mod math;
pub mod model;
pub mod normalize;
pub mod orientation;
pub mod parsers;
pub mod representation;
pub mod scene_graph;
pub mod session;
pub mod source;
pub mod stats;
pub mod viewport;

pub use config::ViewerConfig;
pub use error::LoadError;
pub use format::{default_orientation, detect_format, ModelFormat};
pub use model::{Color, LoadedModel, MeshPrimitive};
pub use normalize::{fit_transform, FitTransform};
pub use parsers::FormatParser;
pub use representation::{build_drawables, DrawStyle, Drawable, ViewMode};
pub use session::{LoadOutcome, LoadSession, ModelLoader, SessionSnapshot, SessionState};
pub use source::ModelSource;
pub use stats::{calculate_model_stats, ModelStats};
pub use viewport::{Frame, Viewport};
