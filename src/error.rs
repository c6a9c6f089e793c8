use crate::format::ModelFormat;

/// Errors that end a model load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported format: {0} (use .obj, .stl, .gltf or .glb)")]
    UnsupportedFormat(String),

    #[error("failed to parse {format} file: {cause}")]
    ParseFailure { format: ModelFormat, cause: String },

    #[error("the GLTF/GLB file does not contain a usable scene")]
    EmptyScene,
}

impl LoadError {
    /// Wraps a decoder error, keeping any `LoadError` raised inside the decoder as-is.
    pub fn from_decoder(format: ModelFormat, error: anyhow::Error) -> Self {
        match error.downcast::<LoadError>() {
            Ok(load_error) => load_error,
            Err(error) => LoadError::ParseFailure {
                format,
                cause: format!("{:#}", error),
            },
        }
    }
}
