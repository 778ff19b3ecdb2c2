use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted for ingestion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
    Gif,
    Tiff,
    WebP,
    Other(String),
}

impl ImageFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "bmp" => Self::Bmp,
            "gif" => Self::Gif,
            "tiff" => Self::Tiff,
            "webp" => Self::WebP,
            other => Self::Other(other.to_string()),
        }
    }

    /// Determine format from a path's extension, `None` when there is no extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
    }

    /// Check if format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Returns if the given path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_some_and(|format| format.is_supported())
}
