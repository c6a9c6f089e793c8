use std::fmt;

use glam::Quat;

use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Obj,
    Stl,
    Gltf,
    Glb,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 4] = [
        ModelFormat::Obj,
        ModelFormat::Stl,
        ModelFormat::Gltf,
        ModelFormat::Glb,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ModelFormat::Obj => "obj",
            ModelFormat::Stl => "stl",
            ModelFormat::Gltf => "gltf",
            ModelFormat::Glb => "glb",
        }
    }

    fn from_extension(extension: &str) -> Option<ModelFormat> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Maps a file name to its format using the text after the last `.`.
pub fn detect_format(file_name: &str) -> Result<ModelFormat, LoadError> {
    file_name
        .rsplit_once('.')
        .and_then(|(_, extension)| ModelFormat::from_extension(extension))
        .ok_or_else(|| LoadError::UnsupportedFormat(file_name.to_string()))
}

/// Rotation the presentation layer applies before user offsets.
/// STL sources are Z-up in this domain, everything else is Y-up.
pub fn default_orientation(format: ModelFormat) -> Quat {
    match format {
        ModelFormat::Stl => Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        ModelFormat::Obj | ModelFormat::Gltf | ModelFormat::Glb => Quat::IDENTITY,
    }
}
