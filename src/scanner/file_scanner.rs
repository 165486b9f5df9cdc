//! Directory scanner that builds the viewer's collection.
//!
//! Walks a directory with walkdir, keeps files whose extension maps to a
//! [`MediaType`] and returns them as [`MediaItem`]s in path order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{MediaItem, MediaType};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 0,
            follow_symlinks: false,
        }
    }
}

pub struct FileScanner {
    config: ScanConfig,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scans `dir` off the async threads and returns the media found, sorted by path.
    pub async fn scan(&self, dir: &Path) -> Result<Vec<MediaItem>> {
        let dir = dir.to_path_buf();
        let config = self.config.clone();

        let items = task::spawn_blocking(move || Self::scan_sync(&dir, &config))
            .await
            .context("Scan task panicked")??;

        Ok(items)
    }

    fn scan_sync(dir: &Path, config: &ScanConfig) -> Result<Vec<MediaItem>> {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {:?}", dir);
        }

        info!("Starting scan of {:?}", dir);
        let items: Vec<MediaItem> = Self::discover_files(dir, config)
            .into_iter()
            .map(|(path, media_type)| MediaItem::from_file(path, media_type))
            .collect();
        info!(count = items.len(), "Scan complete");

        Ok(items)
    }

    fn discover_files(dir: &Path, config: &ScanConfig) -> Vec<(PathBuf, MediaType)> {
        let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);

        if !config.recursive {
            walker = walker.max_depth(1);
        } else if config.max_depth > 0 {
            walker = walker.max_depth(config.max_depth);
        }

        let mut entries = Vec::new();
        for entry in walker.into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            match MediaType::from_path(path) {
                Some(media_type) => entries.push((path.to_path_buf(), media_type)),
                None => debug!("Skipping non-media file {:?}", path),
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
