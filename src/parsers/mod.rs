pub mod gltf;
pub mod obj;
pub mod stl;

use crate::error::LoadError;
use crate::format::ModelFormat;
use crate::model::LoadedModel;
use crate::source::ModelSource;

/// One decoder per family of formats. GLTF and GLB share a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatParser {
    Obj,
    Stl,
    Gltf,
}

impl FormatParser {
    pub fn for_format(format: ModelFormat) -> Self {
        match format {
            ModelFormat::Obj => FormatParser::Obj,
            ModelFormat::Stl => FormatParser::Stl,
            ModelFormat::Gltf | ModelFormat::Glb => FormatParser::Gltf,
        }
    }

    pub fn parse(self, format: ModelFormat, source: &ModelSource) -> Result<LoadedModel, LoadError> {
        log::debug!("Decoding {} as {:?}", source.name(), self);

        let scene = match self {
            FormatParser::Obj => obj::parse_obj(source.name(), &source.text()),
            FormatParser::Stl => stl::parse_stl(source.name(), source.bytes()),
            FormatParser::Gltf => gltf::parse_gltf(source.bytes(), source.base_dir()),
        }
        .map_err(|error| LoadError::from_decoder(format, error))?;

        Ok(LoadedModel::new(scene, format))
    }
}

/// Detects the format of `source` and decodes it.
pub fn parse_model(source: &ModelSource) -> Result<LoadedModel, LoadError> {
    let format = crate::format::detect_format(source.name())?;
    FormatParser::for_format(format).parse(format, source)
}
