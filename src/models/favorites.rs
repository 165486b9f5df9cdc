//! Favorites set mirrored to durable key/value storage.
//!
//! The whole set is written back after every toggle. A missing entry loads as
//! an empty set, and so does an entry that fails to parse: losing favorites is
//! not worth interrupting the viewer for.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::kv_store::KeyValueStore;

/// Storage key for the serialized favorites list.
pub const FAVORITES_KEY: &str = "favorites";

pub struct FavoritesStore {
    paths: BTreeSet<PathBuf>,
    storage: Box<dyn KeyValueStore>,
}

impl FavoritesStore {
    /// Loads the persisted set once.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        let paths = match storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PathBuf>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(err) => {
                    warn!(error = %err, "Persisted favorites are corrupt, starting empty");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                warn!(error = ?err, "Failed to load favorites, starting empty");
                BTreeSet::new()
            }
        };
        debug!(count = paths.len(), "Loaded favorites");
        Self { paths, storage }
    }

    pub fn is_favorite(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Flips membership of `path` and persists the full set.
    /// Returns true if the path is now a favorite.
    pub fn toggle(&mut self, path: &Path) -> bool {
        let now_favorite = if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.to_path_buf());
            true
        };
        self.persist();
        now_favorite
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    fn persist(&self) {
        let list: Vec<&PathBuf> = self.paths.iter().collect();
        let encoded = match serde_json::to_string(&list) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "Failed to encode favorites");
                return;
            }
        };
        if let Err(err) = self.storage.set(FAVORITES_KEY, &encoded) {
            warn!(error = ?err, "Failed to persist favorites");
        }
    }
}
