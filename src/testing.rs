//! Recording collaborators for tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::editor::EditParams;
use crate::error::ViewerError;
use crate::models::{FavoritesStore, MediaItem, MediaType, MemoryKvStore};
use crate::services::{MediaBackend, Route, ViewerShell};

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([120, 80, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn image_item(path: &str) -> MediaItem {
    MediaItem::from_file(PathBuf::from(path), MediaType::Image)
}

pub fn video_item(path: &str) -> MediaItem {
    MediaItem::from_file(PathBuf::from(path), MediaType::Video)
}

pub fn memory_favorites() -> (FavoritesStore, MemoryKvStore) {
    let kv = MemoryKvStore::new();
    (FavoritesStore::load(Box::new(kv.clone())), kv)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Read(PathBuf),
    Share(PathBuf),
    SaveEdited(PathBuf),
    SaveTemp(PathBuf),
    Discard(PathBuf),
    CheckReady,
    Move(PathBuf, String),
}

type FailWith = fn() -> ViewerError;

struct Inner {
    files: HashMap<PathBuf, Vec<u8>>,
    calls: Vec<BackendCall>,
    saved: Vec<(PathBuf, (u32, u32), EditParams)>,
    ready: bool,
    move_failure: Option<FailWith>,
    save_failure: Option<FailWith>,
    share_failure: Option<FailWith>,
}

pub struct MockBackend {
    inner: Mutex<Inner>,
    read_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                files: HashMap::new(),
                calls: Vec::new(),
                saved: Vec::new(),
                ready: true,
                move_failure: None,
                save_failure: None,
                share_failure: None,
            }),
            read_gate: Mutex::new(None),
        }
    }

    pub fn put_file(&self, path: &str, bytes: Vec<u8>) {
        self.inner.lock().files.insert(PathBuf::from(path), bytes);
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.lock().ready = ready;
    }

    pub fn fail_moves(&self, fail: FailWith) {
        self.inner.lock().move_failure = Some(fail);
    }

    pub fn fail_saves(&self, fail: FailWith) {
        self.inner.lock().save_failure = Some(fail);
    }

    pub fn fail_shares(&self, fail: FailWith) {
        self.inner.lock().share_failure = Some(fail);
    }

    /// Makes reads wait until the returned handle is notified.
    pub fn hold_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.read_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    pub fn saved_edits(&self) -> Vec<(PathBuf, (u32, u32), EditParams)> {
        self.inner.lock().saved.clone()
    }

    fn record(&self, call: BackendCall) {
        self.inner.lock().calls.push(call);
    }
}

impl MediaBackend for MockBackend {
    async fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>, ViewerError> {
        self.record(BackendCall::Read(path.to_path_buf()));
        let gate = self.read_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let bytes = self.inner.lock().files.get(path).cloned();
        bytes.ok_or_else(|| {
            ViewerError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }

    async fn share_file(&self, path: &Path) -> Result<(), ViewerError> {
        self.record(BackendCall::Share(path.to_path_buf()));
        let failure = self.inner.lock().share_failure;
        match failure {
            Some(fail) => Err(fail()),
            None => Ok(()),
        }
    }

    async fn save_edited_image(
        &self,
        bytes: Vec<u8>,
        original: &Path,
        params: EditParams,
    ) -> Result<(), ViewerError> {
        self.record(BackendCall::SaveEdited(original.to_path_buf()));
        let failure = self.inner.lock().save_failure;
        if let Some(fail) = failure {
            return Err(fail());
        }
        let dims = image::load_from_memory(&bytes)
            .map(|img| img.dimensions())
            .map_err(|e| ViewerError::Save(e.to_string()))?;
        self.inner
            .lock()
            .saved
            .push((original.to_path_buf(), dims, params));
        Ok(())
    }

    async fn save_temp_image(
        &self,
        _bytes: Vec<u8>,
        original: &Path,
    ) -> Result<PathBuf, ViewerError> {
        self.record(BackendCall::SaveTemp(original.to_path_buf()));
        let failure = self.inner.lock().save_failure;
        if let Some(fail) = failure {
            return Err(fail());
        }
        let name = original.file_name().unwrap_or_default();
        Ok(Path::new("/staging").join(name))
    }

    async fn discard_staged(&self, staged: &Path) -> Result<(), ViewerError> {
        self.record(BackendCall::Discard(staged.to_path_buf()));
        Ok(())
    }

    async fn check_protected_area_ready(&self) -> Result<bool, ViewerError> {
        self.record(BackendCall::CheckReady);
        Ok(self.inner.lock().ready)
    }

    async fn move_to_protected_area(&self, path: &Path, credential: &str) -> Result<(), ViewerError> {
        self.record(BackendCall::Move(path.to_path_buf(), credential.to_string()));
        let failure = self.inner.lock().move_failure;
        match failure {
            Some(fail) => Err(fail()),
            None => Ok(()),
        }
    }
}

pub struct MockShell {
    credential: Option<String>,
    prompts: AtomicUsize,
    routes: Mutex<Vec<Route>>,
}

impl MockShell {
    /// A shell whose credential prompt is always cancelled.
    pub fn new() -> Self {
        Self {
            credential: None,
            prompts: AtomicUsize::new(0),
            routes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_credential(credential: &str) -> Self {
        Self {
            credential: Some(credential.to_string()),
            ..Self::new()
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().clone()
    }
}

impl ViewerShell for MockShell {
    async fn prompt_credential(&self) -> Option<String> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.credential.clone()
    }

    fn navigate_to(&self, route: Route) {
        self.routes.lock().push(route);
    }
}
