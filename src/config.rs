//! Runtime configuration for the viewer.
//!
//! Defaults match the interactive behavior of the viewer; a few values can be
//! overridden through `MEDIAVIEW_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Delay between slideshow advances.
pub const DEFAULT_SLIDESHOW_INTERVAL_MS: u64 = 3000;
/// How long a notification stays visible.
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub slideshow_interval: Duration,
    pub notification_ttl: Duration,
    /// Root for persisted state, staged files and the protected area.
    pub data_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            slideshow_interval: Duration::from_millis(DEFAULT_SLIDESHOW_INTERVAL_MS),
            notification_ttl: Duration::from_millis(DEFAULT_NOTIFICATION_TTL_MS),
            data_dir: None,
        }
    }
}

impl ViewerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_millis("MEDIAVIEW_SLIDESHOW_MS") {
            config.slideshow_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_millis("MEDIAVIEW_NOTIFICATION_MS") {
            config.notification_ttl = Duration::from_millis(ms);
        }
        if let Some(dir) = std::env::var_os("MEDIAVIEW_DATA_DIR").filter(|v| !v.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        config
    }

    /// Resolves the data directory, falling back to the XDG data location.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("", "", "mediaview")
                .context("Failed to determine project directories")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {:?}", dir))?;
        Ok(dir)
    }
}

fn env_millis(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}
