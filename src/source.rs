use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// A user-selected file: its name for format sniffing plus its raw content.
#[derive(Debug, Clone)]
pub struct ModelSource {
    name: String,
    bytes: Vec<u8>,
    base_dir: Option<PathBuf>,
}

impl ModelSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            base_dir: None,
        }
    }

    /// Reads a file from disk. Side-car GLTF buffers resolve relative to its directory.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            bytes,
            base_dir: path.parent().map(Path::to_path_buf),
        })
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}
