use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" => Some(Self::Image),
            "webm" | "mp4" | "mkv" | "avi" | "mov" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// One browsable unit of the collection.
///
/// Owned by the caller's collection; the viewer never mutates an item.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Stable storage identifier. Items without one cannot be favorited or moved.
    pub path: Option<PathBuf>,
    /// Source for the full view.
    pub url: String,
    /// Source for the thumbnail strip.
    pub thumbnail_url: String,
    pub media_type: MediaType,
}

impl MediaItem {
    /// Create an item backed by a local file, using the path for both sources
    pub fn from_file(path: PathBuf, media_type: MediaType) -> Self {
        let url = path.to_string_lossy().into_owned();
        Self {
            path: Some(path),
            thumbnail_url: url.clone(),
            url,
            media_type,
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type == MediaType::Image
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
