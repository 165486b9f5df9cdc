//! The viewer/editor state machine.
//!
//! A [`Viewer`] owns one open overlay: the collection, the navigation index,
//! the transform, the edit phase, favorites, the slideshow timer and the live
//! notification. All mutation happens through `&mut self` on the owner's
//! control loop. Commits, relocation, sharing and timers run as tokio tasks
//! and report back as [`ViewerEvent`]s, which the owner feeds to
//! [`Viewer::handle_event`].

pub mod navigation;
pub mod relocation;
pub mod slideshow;
pub mod transform;

pub use navigation::{NavigationIndex, PageRef};
pub use relocation::{run_relocation, RelocationOutcome};
pub use slideshow::Slideshow;
pub use transform::{PanGesture, Rotation, Transform, MAX_SCALE, MIN_SCALE, ZOOM_STEP};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::editor::{
    run_commit, ColorFilter, CommitDestination, CommitOutcome, CommitRequest, CropRegion,
    EditSession, Percent, SessionId,
};
use crate::error::ViewerError;
use crate::models::{FavoritesStore, MediaItem, Notification, NotificationId};
use crate::services::{MediaBackend, Route, ViewerShell};
use crate::ui::{InputEvent, Keybindings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerOptions {
    /// The viewer was opened on items already inside the protected area.
    pub secure_folder: bool,
}

/// Completions posted by background tasks.
#[derive(Debug)]
pub enum ViewerEvent {
    SlideshowTick {
        generation: u64,
    },
    NotificationExpired(NotificationId),
    CommitFinished {
        session: SessionId,
        path: PathBuf,
        result: Result<CommitOutcome, ViewerError>,
    },
    RelocationFinished {
        path: PathBuf,
        result: Result<RelocationOutcome, ViewerError>,
    },
    ShareFinished {
        path: PathBuf,
        result: Result<(), ViewerError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditPhase {
    Viewing,
    Editing(EditSession),
    /// The session's commit is running; its id attributes the completion.
    Committing(SessionId),
}

/// Everything a user can ask the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    Close,
    Next,
    Prev,
    JumpTo(usize),
    ZoomIn,
    ZoomOut,
    Rotate,
    ResetView,
    BeginPan { x: f64, y: f64 },
    Pan { x: f64, y: f64 },
    EndPan,
    ToggleFavorite,
    ToggleSlideshow,
    Share,
    MoveToProtected,
    BeginEdit,
    SetCrop(Option<CropRegion>),
    SetFilter(ColorFilter),
    SetBrightness(u16),
    SetContrast(u16),
    CommitEdit,
    CancelEdit,
}

pub struct Viewer<B: MediaBackend, S: ViewerShell> {
    items: Vec<MediaItem>,
    page: PageRef,
    nav: NavigationIndex,
    transform: Transform,
    pan: Option<PanGesture>,
    edit: EditPhase,
    next_session: u64,
    favorites: FavoritesStore,
    slideshow: Slideshow,
    notification: Option<Notification>,
    notification_timer: Option<JoinHandle<()>>,
    relocating: Option<PathBuf>,
    open: bool,
    options: ViewerOptions,
    config: ViewerConfig,
    keybindings: Keybindings,
    backend: Arc<B>,
    shell: Arc<S>,
    events_tx: Sender<ViewerEvent>,
    events_rx: Receiver<ViewerEvent>,
}

impl<B: MediaBackend, S: ViewerShell> Viewer<B, S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        items: Vec<MediaItem>,
        page: PageRef,
        options: ViewerOptions,
        config: ViewerConfig,
        favorites: FavoritesStore,
        backend: Arc<B>,
        shell: Arc<S>,
    ) -> Result<Self, ViewerError> {
        let nav =
            NavigationIndex::from_page(page, items.len()).ok_or(ViewerError::EmptyCollection)?;
        let (events_tx, events_rx) = async_channel::unbounded();

        info!(
            count = items.len(),
            index = nav.index(),
            secure_folder = options.secure_folder,
            "Opening viewer"
        );

        Ok(Self {
            items,
            page,
            nav,
            transform: Transform::IDENTITY,
            pan: None,
            edit: EditPhase::Viewing,
            next_session: 0,
            favorites,
            slideshow: Slideshow::new(config.slideshow_interval),
            notification: None,
            notification_timer: None,
            relocating: None,
            open: true,
            options,
            config,
            keybindings: Keybindings::new(),
            backend,
            shell,
            events_tx,
            events_rx,
        })
    }

    // --- Queries ---

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Index of the displayed item, `None` once the viewer has closed.
    pub fn global_index(&self) -> Option<usize> {
        self.open.then(|| self.nav.index())
    }

    /// The displayed item, `None` once the viewer has closed.
    pub fn current_item(&self) -> Option<&MediaItem> {
        if !self.open {
            return None;
        }
        self.items.get(self.nav.index())
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    pub fn edit_phase(&self) -> &EditPhase {
        &self.edit
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        match &self.edit {
            EditPhase::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.edit, EditPhase::Editing(_))
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.edit, EditPhase::Committing(_))
    }

    pub fn is_favorite(&self, path: &Path) -> bool {
        self.favorites.is_favorite(path)
    }

    pub fn is_current_favorite(&self) -> bool {
        self.current_item()
            .and_then(MediaItem::path)
            .is_some_and(|path| self.favorites.is_favorite(path))
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn slideshow_active(&self) -> bool {
        self.slideshow.is_active()
    }

    pub fn options(&self) -> ViewerOptions {
        self.options
    }

    // --- Control surface ---

    /// Runs the action bound to `event`. Returns false for unbound input.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match self.keybindings.resolve(event) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    pub fn dispatch(&mut self, action: ViewerAction) {
        if !self.open {
            debug!(?action, "Viewer closed, ignoring action");
            return;
        }

        match action {
            ViewerAction::Close => self.close(),
            ViewerAction::Next => {
                self.next();
            }
            ViewerAction::Prev => {
                self.prev();
            }
            ViewerAction::JumpTo(index) => {
                self.jump_to(index);
            }
            ViewerAction::ZoomIn => self.zoom_in(),
            ViewerAction::ZoomOut => self.zoom_out(),
            ViewerAction::Rotate => self.rotate(),
            ViewerAction::ResetView => self.reset_view(),
            ViewerAction::BeginPan { x, y } => self.begin_pan(x, y),
            ViewerAction::Pan { x, y } => self.pan_to(x, y),
            ViewerAction::EndPan => self.end_pan(),
            ViewerAction::ToggleFavorite => {
                self.toggle_favorite();
            }
            ViewerAction::ToggleSlideshow => {
                self.toggle_slideshow();
            }
            ViewerAction::Share => self.share_current(),
            ViewerAction::MoveToProtected => self.move_to_protected(),
            ViewerAction::BeginEdit => {
                self.begin_edit();
            }
            ViewerAction::SetCrop(crop) => self.set_crop(crop),
            ViewerAction::SetFilter(filter) => self.set_filter(filter),
            ViewerAction::SetBrightness(value) => self.set_brightness(value),
            ViewerAction::SetContrast(value) => self.set_contrast(value),
            ViewerAction::CommitEdit => {
                self.commit_edit();
            }
            ViewerAction::CancelEdit => self.cancel_edit(),
        }
    }

    // --- Navigation ---

    /// Returns the new index, or `None` once the viewer has closed.
    pub fn next(&mut self) -> Option<usize> {
        if !self.open {
            return None;
        }
        self.nav.next();
        self.after_navigation();
        Some(self.nav.index())
    }

    pub fn prev(&mut self) -> Option<usize> {
        if !self.open {
            return None;
        }
        self.nav.prev();
        self.after_navigation();
        Some(self.nav.index())
    }

    /// Jumps to `index`, clamped to the last item.
    pub fn jump_to(&mut self, index: usize) -> Option<usize> {
        if !self.open {
            return None;
        }
        self.nav.jump_to(index);
        self.after_navigation();
        Some(self.nav.index())
    }

    /// Follows a change of the caller's pagination. Only a changed page reference moves the index.
    pub fn set_page(&mut self, page: PageRef) {
        if !self.open || page == self.page {
            return;
        }
        self.page = page;
        let before = self.nav.index();
        if self.nav.jump_to(page.global_index()) != before {
            self.after_navigation();
        }
    }

    fn after_navigation(&mut self) {
        self.transform.reset();
        self.pan = None;
        self.discard_edit();
        debug!(index = self.nav.index(), "Navigated");
    }

    fn discard_edit(&mut self) {
        match std::mem::replace(&mut self.edit, EditPhase::Viewing) {
            EditPhase::Viewing => {}
            EditPhase::Editing(session) => {
                debug!(session = ?session.id(), "Discarded edit session");
            }
            EditPhase::Committing(session) => {
                debug!(?session, "Left item with commit in flight");
            }
        }
    }

    // --- Transform ---

    pub fn zoom_in(&mut self) {
        self.transform.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.transform.zoom_out();
    }

    pub fn rotate(&mut self) {
        self.transform.rotate();
    }

    pub fn reset_view(&mut self) {
        self.transform.reset();
        self.pan = None;
    }

    /// Starts a drag. The crop gesture owns the pointer while editing.
    pub fn begin_pan(&mut self, x: f64, y: f64) {
        if self.is_editing() {
            return;
        }
        self.pan = Some(PanGesture::begin(x, y));
    }

    pub fn pan_to(&mut self, x: f64, y: f64) {
        if let Some(gesture) = self.pan.as_mut() {
            let (dx, dy) = gesture.update(x, y);
            self.transform.pan(dx, dy);
        }
    }

    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    // --- Favorites ---

    /// Returns the new membership, or `None` when the item has no storage path.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        let path = self.current_item()?.path()?.to_path_buf();
        let favorite = self.favorites.toggle(&path);
        debug!(path = %path.display(), favorite, "Toggled favorite");
        Some(favorite)
    }

    // --- Editing ---

    /// Opens an edit session on the current image.
    pub fn begin_edit(&mut self) -> bool {
        if !self.open || !matches!(self.edit, EditPhase::Viewing) {
            return false;
        }
        if !self.current_item().is_some_and(MediaItem::is_image) {
            debug!(index = self.nav.index(), "Only images can be edited");
            return false;
        }

        self.next_session += 1;
        let session = EditSession::new(SessionId(self.next_session));
        debug!(session = ?session.id(), index = self.nav.index(), "Edit session started");
        self.pan = None;
        self.edit = EditPhase::Editing(session);
        true
    }

    fn session_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.edit {
            EditPhase::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn set_crop(&mut self, crop: Option<CropRegion>) {
        if let Some(session) = self.session_mut() {
            session.crop = crop;
        }
    }

    pub fn set_filter(&mut self, filter: ColorFilter) {
        if let Some(session) = self.session_mut() {
            session.params.filter = filter;
        }
    }

    pub fn set_brightness(&mut self, value: u16) {
        if let Some(session) = self.session_mut() {
            session.params.brightness = Percent::new(value);
        }
    }

    pub fn set_contrast(&mut self, value: u16) {
        if let Some(session) = self.session_mut() {
            session.params.contrast = Percent::new(value);
        }
    }

    /// Starts the commit of the open session. Returns false if nothing was started.
    pub fn commit_edit(&mut self) -> bool {
        if !self.open {
            return false;
        }
        let session = match &self.edit {
            EditPhase::Editing(session) => session.clone(),
            EditPhase::Committing(session) => {
                debug!(?session, "Commit already in flight, ignoring");
                return false;
            }
            EditPhase::Viewing => return false,
        };

        let Some(path) = self.current_item().and_then(MediaItem::path).map(Path::to_path_buf) else {
            self.edit = EditPhase::Viewing;
            self.notify(Notification::error(
                "Failed to save edited image: item has no storage path",
            ));
            return false;
        };

        let destination = if self.options.secure_folder {
            CommitDestination::Protected
        } else {
            CommitDestination::InPlace
        };
        let request = CommitRequest {
            session: session.id(),
            path,
            crop: session.crop,
            params: session.params,
            destination,
        };
        self.edit = EditPhase::Committing(session.id());

        let backend = Arc::clone(&self.backend);
        let shell = Arc::clone(&self.shell);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = run_commit(backend.as_ref(), shell.as_ref(), &request).await;
            let _ = events
                .send(ViewerEvent::CommitFinished {
                    session: request.session,
                    path: request.path,
                    result,
                })
                .await;
        });
        true
    }

    /// Drops the open session without any I/O. Ignored while a commit is running.
    pub fn cancel_edit(&mut self) {
        if let EditPhase::Committing(session) = self.edit {
            debug!(?session, "Commit in flight, ignoring cancel");
            return;
        }
        if self.is_editing() {
            self.discard_edit();
            self.transform.reset();
        }
    }

    // --- Slideshow ---

    /// Returns whether the slideshow is now running.
    pub fn toggle_slideshow(&mut self) -> bool {
        if !self.open {
            return false;
        }
        let active = self.slideshow.toggle(&self.events_tx);
        info!(active, "Slideshow toggled");
        active
    }

    // --- Share and relocation ---

    pub fn share_current(&mut self) {
        if !self.open {
            return;
        }
        if self.options.secure_folder {
            debug!("Sharing is unavailable in the secure folder");
            return;
        }
        let Some(path) = self.current_item().and_then(MediaItem::path).map(Path::to_path_buf) else {
            return;
        };

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.share_file(&path).await;
            let _ = events
                .send(ViewerEvent::ShareFinished { path, result })
                .await;
        });
    }

    pub fn move_to_protected(&mut self) {
        if !self.open {
            return;
        }
        if self.options.secure_folder {
            debug!("Item is already in the secure folder");
            return;
        }
        if let Some(pending) = &self.relocating {
            debug!(path = %pending.display(), "Relocation already in flight, ignoring");
            return;
        }
        let Some(path) = self.current_item().and_then(MediaItem::path).map(Path::to_path_buf) else {
            debug!("Current item has no storage path");
            return;
        };

        self.relocating = Some(path.clone());
        let backend = Arc::clone(&self.backend);
        let shell = Arc::clone(&self.shell);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = run_relocation(backend.as_ref(), shell.as_ref(), &path).await;
            let _ = events
                .send(ViewerEvent::RelocationFinished { path, result })
                .await;
        });
    }

    // --- Lifecycle ---

    /// Tears down the slideshow and notification timers. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.slideshow.stop();
        if let Some(timer) = self.notification_timer.take() {
            timer.abort();
        }
        self.pan = None;
        self.discard_edit();
        info!("Viewer closed");
    }

    /// A handle on the event queue, for select loops that must not borrow the viewer.
    pub fn events(&self) -> Receiver<ViewerEvent> {
        self.events_rx.clone()
    }

    /// Waits for the next background completion and applies it.
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Applies every completion already queued. Returns how many were handled.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::SlideshowTick { generation } => self.on_slideshow_tick(generation),
            ViewerEvent::NotificationExpired(id) => {
                if self.notification.as_ref().is_some_and(|n| n.id() == id) {
                    self.notification = None;
                    self.notification_timer = None;
                }
            }
            ViewerEvent::CommitFinished {
                session,
                path,
                result,
            } => self.on_commit_finished(session, &path, result),
            ViewerEvent::RelocationFinished { path, result } => {
                self.on_relocation_finished(&path, result)
            }
            ViewerEvent::ShareFinished { path, result } => match result {
                Ok(()) => {
                    debug!(path = %path.display(), "Shared file");
                    self.notify(Notification::success("File shared successfully"));
                }
                Err(err) => self.notify(Notification::error(format!("Failed to share: {err}"))),
            },
        }
    }

    fn on_slideshow_tick(&mut self, generation: u64) {
        if !self.open || !self.slideshow.accepts(generation) {
            return;
        }
        if !matches!(self.edit, EditPhase::Viewing) {
            debug!("Editing, holding slideshow");
            return;
        }
        let index = self.nav.next();
        debug!(index, "Slideshow advanced");
    }

    fn on_commit_finished(
        &mut self,
        session: SessionId,
        path: &Path,
        result: Result<CommitOutcome, ViewerError>,
    ) {
        if matches!(self.edit, EditPhase::Committing(current) if current == session) {
            self.edit = EditPhase::Viewing;
        }

        match result {
            Ok(CommitOutcome::Saved { width, height }) => {
                debug!(path = %path.display(), width, height, "Commit finished");
                self.notify(Notification::success("Image saved successfully"));
            }
            Ok(CommitOutcome::MovedToProtected { width, height }) => {
                debug!(path = %path.display(), width, height, "Commit finished");
                self.notify(Notification::success("Edited image saved to secure folder"));
            }
            Ok(CommitOutcome::Cancelled) => {}
            Err(err) => {
                warn!(path = %path.display(), error = ?err, "Commit failed");
                self.notify(Notification::error(format!(
                    "Failed to save edited image: {err}"
                )));
            }
        }
    }

    fn on_relocation_finished(
        &mut self,
        path: &Path,
        result: Result<RelocationOutcome, ViewerError>,
    ) {
        self.relocating = None;
        if !self.open {
            debug!(path = %path.display(), "Relocation finished after close");
        }

        match result {
            Ok(RelocationOutcome::NotReady) if !self.open => {}
            Ok(RelocationOutcome::NotReady) => {
                info!(route = Route::SecureFolderSetup.as_str(), "Redirecting to secure folder setup");
                self.shell.navigate_to(Route::SecureFolderSetup);
            }
            Ok(RelocationOutcome::Cancelled) => {}
            Ok(RelocationOutcome::Moved) => {
                self.remove_item(path);
                self.notify(Notification::success("File moved to secure folder"));
            }
            Err(err) => {
                warn!(path = %path.display(), error = ?err, "Relocation failed");
                self.notify(Notification::error(format!("Failed to move file: {err}")));
            }
        }
    }

    fn remove_item(&mut self, path: &Path) {
        let Some(position) = self.items.iter().position(|item| item.path() == Some(path)) else {
            warn!(path = %path.display(), "Relocated item is no longer in the collection");
            return;
        };

        let was_current = position == self.nav.index();
        self.items.remove(position);
        match self.nav.remove(position) {
            Some(index) => {
                if was_current {
                    self.after_navigation();
                }
                debug!(index, remaining = self.items.len(), "Removed relocated item");
            }
            None => self.close(),
        }
    }

    fn notify(&mut self, notification: Notification) {
        if notification.is_error() {
            warn!(message = %notification.message, "Notification");
        } else {
            info!(message = %notification.message, "Notification");
        }

        if let Some(timer) = self.notification_timer.take() {
            timer.abort();
        }
        if self.open {
            let id = notification.id();
            let ttl = self.config.notification_ttl;
            let events = self.events_tx.clone();
            self.notification_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                let _ = events.send(ViewerEvent::NotificationExpired(id)).await;
            }));
        }
        self.notification = Some(notification);
    }
}

impl<B: MediaBackend, S: ViewerShell> Drop for Viewer<B, S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::editor::PixelRect;
    use crate::models::{KeyValueStore, FAVORITES_KEY};
    use crate::testing::{
        image_item, memory_favorites, png_bytes, video_item, BackendCall, MockBackend, MockShell,
    };
    use crate::ui::{Key, PointerTarget};

    fn open(
        items: Vec<MediaItem>,
        backend: &Arc<MockBackend>,
        shell: &Arc<MockShell>,
        options: ViewerOptions,
    ) -> Viewer<MockBackend, MockShell> {
        let (favorites, _) = memory_favorites();
        let page = PageRef::new(1, items.len().max(1), 0);
        match Viewer::new(
            items,
            page,
            options,
            ViewerConfig::default(),
            favorites,
            Arc::clone(backend),
            Arc::clone(shell),
        ) {
            Ok(viewer) => viewer,
            Err(err) => panic!("viewer should open: {err}"),
        }
    }

    fn three_images() -> Vec<MediaItem> {
        vec![
            image_item("/photos/a.png"),
            image_item("/photos/b.png"),
            image_item("/photos/c.png"),
        ]
    }

    fn mocks() -> (Arc<MockBackend>, Arc<MockShell>) {
        (Arc::new(MockBackend::new()), Arc::new(MockShell::new()))
    }

    #[tokio::test]
    async fn test_empty_collection_is_rejected() {
        let (backend, shell) = mocks();
        let (favorites, _) = memory_favorites();
        let result = Viewer::new(
            Vec::new(),
            PageRef::new(1, 20, 0),
            ViewerOptions::default(),
            ViewerConfig::default(),
            favorites,
            backend,
            shell,
        );
        assert!(matches!(result, Err(ViewerError::EmptyCollection)));
    }

    #[tokio::test]
    async fn test_navigation_wraps() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        assert_eq!(viewer.global_index(), Some(0));
        viewer.next();
        assert_eq!(viewer.next(), Some(2));
        assert_eq!(viewer.next(), Some(0));
        assert_eq!(viewer.prev(), Some(2));
        assert_eq!(viewer.jump_to(10), Some(2));
    }

    #[tokio::test]
    async fn test_navigation_discards_edit_and_resets_transform() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.zoom_in();
        viewer.rotate();
        assert!(viewer.begin_edit());
        viewer.set_filter(ColorFilter::Sepia);

        viewer.handle_input(InputEvent::Key(Key::ArrowRight));
        assert_eq!(viewer.global_index(), Some(1));
        assert!(viewer.edit_session().is_none());
        assert!(viewer.transform().is_identity());
    }

    #[tokio::test]
    async fn test_only_images_can_be_edited() {
        let (backend, shell) = mocks();
        let items = vec![video_item("/clips/a.mp4"), image_item("/photos/b.png")];
        let mut viewer = open(items, &backend, &shell, ViewerOptions::default());
        assert!(!viewer.begin_edit());
        viewer.next();
        assert!(viewer.begin_edit());
        assert!(!viewer.begin_edit());
    }

    #[tokio::test]
    async fn test_cancel_edit_resets_transform() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.zoom_in();
        viewer.begin_edit();
        viewer.set_brightness(150);
        viewer.cancel_edit();
        assert_eq!(viewer.edit_phase(), &EditPhase::Viewing);
        assert!(viewer.transform().is_identity());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_commit_saves_cropped_image_with_params() {
        let (backend, shell) = mocks();
        backend.put_file("/photos/a.png", png_bytes(200, 150));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.begin_edit();
        viewer.set_crop(Some(CropRegion::Source(PixelRect::new(10, 10, 100, 100))));
        viewer.set_filter(ColorFilter::Grayscale);
        viewer.set_brightness(120);
        viewer.set_contrast(80);
        assert!(viewer.commit_edit());
        assert!(viewer.is_committing());

        assert!(viewer.process_next_event().await);
        let saves = backend.saved_edits();
        assert_eq!(saves.len(), 1);
        let (path, dims, params) = &saves[0];
        assert_eq!(path, Path::new("/photos/a.png"));
        assert_eq!(*dims, (100, 100));
        assert_eq!(params.filter, ColorFilter::Grayscale);
        assert_eq!(params.brightness.value(), 120);
        assert_eq!(params.contrast.value(), 80);

        assert_eq!(viewer.edit_phase(), &EditPhase::Viewing);
        let note = viewer.notification().unwrap();
        assert!(!note.is_error());
        assert_eq!(note.message, "Image saved successfully");
    }

    #[tokio::test]
    async fn test_read_failure_notifies_without_writes() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.next();
        viewer.begin_edit();
        viewer.commit_edit();
        viewer.process_next_event().await;

        assert_eq!(
            backend.calls(),
            vec![BackendCall::Read("/photos/b.png".into())]
        );
        let note = viewer.notification().unwrap();
        assert!(note.is_error());
        assert!(note.message.starts_with("Failed to save edited image:"));
        assert_eq!(viewer.edit_phase(), &EditPhase::Viewing);
        assert_eq!(viewer.items().len(), 3);
        assert_eq!(viewer.global_index(), Some(1));
    }

    #[tokio::test]
    async fn test_save_failure_notifies_and_returns_to_viewing() {
        let (backend, shell) = mocks();
        backend.put_file("/photos/a.png", png_bytes(40, 40));
        backend.fail_saves(|| ViewerError::Save("disk full".to_string()));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.begin_edit();
        viewer.set_filter(ColorFilter::Invert);
        assert!(viewer.commit_edit());
        viewer.process_next_event().await;

        let note = viewer.notification().unwrap();
        assert!(note.is_error());
        assert!(note.message.starts_with("Failed to save edited image:"));
        assert_eq!(note.message, "Failed to save edited image: disk full");
        assert_eq!(viewer.edit_phase(), &EditPhase::Viewing);
        assert!(backend.saved_edits().is_empty());
        assert_eq!(viewer.items().len(), 3);
        assert_eq!(viewer.global_index(), Some(0));
    }

    #[tokio::test]
    async fn test_staging_failure_skips_the_move() {
        let backend = Arc::new(MockBackend::new());
        backend.put_file("/vault/a.png", png_bytes(30, 20));
        backend.fail_saves(|| ViewerError::Save("staging area is read-only".to_string()));
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let options = ViewerOptions {
            secure_folder: true,
        };
        let mut viewer = open(vec![image_item("/vault/a.png")], &backend, &shell, options);

        viewer.begin_edit();
        viewer.commit_edit();
        viewer.process_next_event().await;

        let calls = backend.calls();
        assert!(calls.contains(&BackendCall::SaveTemp("/vault/a.png".into())));
        assert!(!calls.iter().any(|call| matches!(call, BackendCall::Move(..))));
        let note = viewer.notification().unwrap();
        assert!(note.is_error());
        assert_eq!(
            note.message,
            "Failed to save edited image: staging area is read-only"
        );
        assert_eq!(viewer.edit_phase(), &EditPhase::Viewing);
        assert!(viewer.is_open());
        assert_eq!(viewer.items().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_source_notifies_without_saving() {
        let (backend, shell) = mocks();
        backend.put_file("/photos/a.png", b"not an image".to_vec());
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.begin_edit();
        viewer.commit_edit();
        viewer.process_next_event().await;

        assert_eq!(
            backend.calls(),
            vec![BackendCall::Read("/photos/a.png".into())]
        );
        let note = viewer.notification().unwrap();
        assert!(note.is_error());
        assert!(note
            .message
            .starts_with("Failed to save edited image: malformed image"));
        assert_eq!(viewer.edit_phase(), &EditPhase::Viewing);
        assert_eq!(viewer.items().len(), 3);
    }

    #[tokio::test]
    async fn test_second_commit_is_ignored_while_in_flight() {
        let (backend, shell) = mocks();
        backend.put_file("/photos/a.png", png_bytes(40, 40));
        let gate = backend.hold_reads();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.begin_edit();
        assert!(viewer.commit_edit());
        assert!(!viewer.commit_edit());
        viewer.cancel_edit();
        assert!(viewer.is_committing());

        gate.notify_one();
        viewer.process_next_event().await;
        assert_eq!(backend.saved_edits().len(), 1);
        assert!(!viewer.is_committing());
    }

    #[tokio::test]
    async fn test_late_commit_result_keeps_new_session() {
        let (backend, shell) = mocks();
        backend.put_file("/photos/a.png", png_bytes(40, 40));
        let gate = backend.hold_reads();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.begin_edit();
        viewer.commit_edit();
        viewer.next();
        assert!(viewer.begin_edit());

        gate.notify_one();
        viewer.process_next_event().await;
        let saves = backend.saved_edits();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, Path::new("/photos/a.png"));
        assert!(viewer.is_editing());
        assert_eq!(
            viewer.notification().map(|n| n.message.as_str()),
            Some("Image saved successfully")
        );
    }

    #[tokio::test]
    async fn test_relocating_last_item_closes_viewer() {
        let backend = Arc::new(MockBackend::new());
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let mut viewer = open(
            vec![image_item("/photos/a.png")],
            &backend,
            &shell,
            ViewerOptions::default(),
        );

        viewer.move_to_protected();
        viewer.process_next_event().await;
        assert!(!viewer.is_open());
        assert!(backend
            .calls()
            .contains(&BackendCall::Move("/photos/a.png".into(), "hunter2".to_string())));
    }

    #[tokio::test]
    async fn test_closed_viewer_after_last_relocation_is_inert() {
        let backend = Arc::new(MockBackend::new());
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let mut viewer = open(
            vec![image_item("/photos/a.png")],
            &backend,
            &shell,
            ViewerOptions::default(),
        );

        viewer.move_to_protected();
        viewer.process_next_event().await;
        assert!(viewer.items().is_empty());

        assert!(viewer.current_item().is_none());
        assert_eq!(viewer.global_index(), None);
        assert!(!viewer.is_current_favorite());
        assert_eq!(viewer.toggle_favorite(), None);
        assert!(!viewer.begin_edit());
        assert_eq!(viewer.next(), None);
        assert_eq!(viewer.prev(), None);
        assert_eq!(viewer.jump_to(0), None);
        viewer.set_page(PageRef::new(2, 1, 0));
        viewer.share_current();
        viewer.move_to_protected();
        assert!(!viewer.commit_edit());
        assert_eq!(viewer.drain_events(), 0);
        assert_eq!(
            viewer.notification().map(|n| n.message.as_str()),
            Some("File moved to secure folder")
        );
    }

    #[tokio::test]
    async fn test_relocation_removes_item_and_clamps_index() {
        let backend = Arc::new(MockBackend::new());
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.jump_to(2);

        viewer.move_to_protected();
        viewer.process_next_event().await;
        assert!(viewer.is_open());
        assert_eq!(viewer.items().len(), 2);
        assert_eq!(viewer.global_index(), Some(1));
        assert_eq!(viewer.current_item().and_then(MediaItem::path), Some(Path::new("/photos/b.png")));
        assert_eq!(
            viewer.notification().map(|n| n.message.as_str()),
            Some("File moved to secure folder")
        );
    }

    #[tokio::test]
    async fn test_relocation_not_ready_redirects_without_prompt() {
        let backend = Arc::new(MockBackend::new());
        backend.set_ready(false);
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.move_to_protected();
        viewer.process_next_event().await;
        assert_eq!(shell.prompt_count(), 0);
        assert_eq!(shell.routes(), vec![Route::SecureFolderSetup]);
        assert_eq!(viewer.items().len(), 3);
        assert!(viewer.notification().is_none());
    }

    #[tokio::test]
    async fn test_relocation_failure_keeps_collection() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_moves(|| ViewerError::Auth("incorrect password".to_string()));
        let shell = Arc::new(MockShell::with_credential("wrong"));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.next();

        viewer.move_to_protected();
        viewer.process_next_event().await;
        assert_eq!(viewer.items().len(), 3);
        assert_eq!(viewer.global_index(), Some(1));
        let note = viewer.notification().unwrap();
        assert!(note.is_error());
        assert_eq!(note.message, "Failed to move file: incorrect password");
    }

    #[tokio::test]
    async fn test_relocation_failure_after_close_is_still_reported() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_moves(|| ViewerError::Move("device busy".to_string()));
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.move_to_protected();
        viewer.close();
        viewer.process_next_event().await;

        let note = viewer.notification().unwrap();
        assert!(note.is_error());
        assert_eq!(note.message, "Failed to move file: device busy");
        assert_eq!(viewer.items().len(), 3);
    }

    #[tokio::test]
    async fn test_relocation_not_ready_after_close_does_not_redirect() {
        let backend = Arc::new(MockBackend::new());
        backend.set_ready(false);
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.move_to_protected();
        viewer.close();
        viewer.process_next_event().await;
        assert!(shell.routes().is_empty());
        assert!(viewer.notification().is_none());
    }

    #[tokio::test]
    async fn test_secure_folder_mode_routes_commits_to_protected_area() {
        let backend = Arc::new(MockBackend::new());
        backend.put_file("/vault/a.png", png_bytes(30, 20));
        let shell = Arc::new(MockShell::with_credential("hunter2"));
        let options = ViewerOptions {
            secure_folder: true,
        };
        let mut viewer = open(vec![image_item("/vault/a.png")], &backend, &shell, options);

        viewer.share_current();
        viewer.move_to_protected();
        assert!(backend.calls().is_empty());

        viewer.begin_edit();
        viewer.commit_edit();
        viewer.process_next_event().await;
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Read("/vault/a.png".into()),
                BackendCall::SaveTemp("/vault/a.png".into()),
                BackendCall::Move("/staging/a.png".into(), "hunter2".to_string()),
            ]
        );
        assert!(viewer.notification().is_some_and(|n| !n.is_error()));
    }

    #[tokio::test]
    async fn test_share_reports_failure() {
        let (backend, shell) = mocks();
        backend.fail_shares(|| ViewerError::Share("no share target".to_string()));
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.dispatch(ViewerAction::Share);
        viewer.process_next_event().await;
        assert_eq!(
            viewer.notification().map(|n| n.message.as_str()),
            Some("Failed to share: no share target")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_ttl() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.share_current();
        viewer.process_next_event().await;
        assert!(viewer.notification().is_some());

        let start = tokio::time::Instant::now();
        viewer.process_next_event().await;
        assert!(viewer.notification().is_none());
        assert!(start.elapsed() >= Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_notification_keeps_its_own_lifetime() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.share_current();
        viewer.process_next_event().await;
        tokio::time::sleep(Duration::from_millis(3000)).await;

        viewer.share_current();
        viewer.process_next_event().await;
        let second = viewer.notification().map(|n| n.id());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        viewer.drain_events();
        assert_eq!(viewer.notification().map(|n| n.id()), second);

        viewer.process_next_event().await;
        assert!(viewer.notification().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slideshow_advances_and_holds_while_editing() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.zoom_in();

        assert!(viewer.toggle_slideshow());
        viewer.process_next_event().await;
        assert_eq!(viewer.global_index(), Some(1));
        assert!(!viewer.transform().is_identity());

        viewer.begin_edit();
        viewer.process_next_event().await;
        assert_eq!(viewer.global_index(), Some(1));
        assert!(viewer.is_editing());

        viewer.cancel_edit();
        viewer.process_next_event().await;
        assert_eq!(viewer.global_index(), Some(2));

        assert!(!viewer.toggle_slideshow());
    }

    #[tokio::test]
    async fn test_favorite_key_toggles_and_persists() {
        let (backend, shell) = mocks();
        let (favorites, kv) = memory_favorites();
        let items = three_images();
        let page = PageRef::new(1, 3, 1);
        let mut viewer = match Viewer::new(
            items,
            page,
            ViewerOptions::default(),
            ViewerConfig::default(),
            favorites,
            backend,
            shell,
        ) {
            Ok(viewer) => viewer,
            Err(err) => panic!("{err}"),
        };

        assert!(viewer.handle_input(InputEvent::Key(Key::Char('f'))));
        assert!(viewer.is_current_favorite());
        assert!(viewer.is_favorite(Path::new("/photos/b.png")));
        let stored = kv.get(FAVORITES_KEY).unwrap().unwrap();
        assert!(stored.contains("/photos/b.png"));

        viewer.handle_input(InputEvent::Key(Key::Char('f')));
        assert!(!viewer.is_current_favorite());
    }

    #[tokio::test]
    async fn test_pointer_drag_pans() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());

        viewer.handle_input(InputEvent::PointerMove { x: 50.0, y: 50.0 });
        assert!(viewer.transform().is_identity());

        viewer.handle_input(InputEvent::PointerDown {
            x: 10.0,
            y: 10.0,
            target: PointerTarget::Media,
        });
        viewer.handle_input(InputEvent::PointerMove { x: 15.0, y: 20.0 });
        viewer.handle_input(InputEvent::PointerUp);
        viewer.handle_input(InputEvent::PointerMove { x: 90.0, y: 90.0 });
        assert_eq!(viewer.transform().position, (5.0, 10.0));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_ignores_later_input() {
        let (backend, shell) = mocks();
        let mut viewer = open(three_images(), &backend, &shell, ViewerOptions::default());
        viewer.toggle_slideshow();

        viewer.handle_input(InputEvent::Click(PointerTarget::Backdrop));
        assert!(!viewer.is_open());
        assert!(!viewer.slideshow_active());
        viewer.close();

        viewer.dispatch(ViewerAction::Next);
        assert_eq!(viewer.global_index(), Some(0));
    }

    #[tokio::test]
    async fn test_set_page_resyncs_only_on_change() {
        let (backend, shell) = mocks();
        let items = (0..10)
            .map(|i| image_item(&format!("/photos/{i}.png")))
            .collect();
        let mut viewer = open(items, &backend, &shell, ViewerOptions::default());
        viewer.next();
        viewer.set_page(PageRef::new(1, 10, 0));
        assert_eq!(viewer.global_index(), Some(1));

        viewer.set_page(PageRef::new(2, 4, 1));
        assert_eq!(viewer.global_index(), Some(5));
    }
}
