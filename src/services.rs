//! Contracts for the collaborators the viewer depends on.
//!
//! The viewer core never performs storage, sharing or credential handling
//! itself. [`MediaBackend`] covers persisted media and the protected area,
//! [`ViewerShell`] covers the surrounding application (credential prompt and
//! routing).

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::editor::EditParams;
use crate::error::ViewerError;

pub trait MediaBackend: Send + Sync + 'static {
    /// Reads the original bytes of a stored item. Fails with `Io`.
    fn read_file_bytes(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Vec<u8>, ViewerError>> + Send;

    /// Hands the file to the platform share mechanism. Fails with `Share`.
    fn share_file(&self, path: &Path) -> impl Future<Output = Result<(), ViewerError>> + Send;

    /// Overwrites `original` with `bytes`, recording the edit parameters. Fails with `Save`.
    fn save_edited_image(
        &self,
        bytes: Vec<u8>,
        original: &Path,
        params: EditParams,
    ) -> impl Future<Output = Result<(), ViewerError>> + Send;

    /// Writes `bytes` to a staging location and returns it. Fails with `Save`.
    fn save_temp_image(
        &self,
        bytes: Vec<u8>,
        original: &Path,
    ) -> impl Future<Output = Result<PathBuf, ViewerError>> + Send;

    /// Removes a staged file that will never be relocated.
    fn discard_staged(&self, staged: &Path) -> impl Future<Output = Result<(), ViewerError>> + Send {
        let _ = staged;
        async { Ok(()) }
    }

    /// Whether the protected area has been set up.
    fn check_protected_area_ready(&self) -> impl Future<Output = Result<bool, ViewerError>> + Send;

    /// Relocates `path` into the protected area. Fails with `Auth` or `Move`.
    fn move_to_protected_area(
        &self,
        path: &Path,
        credential: &str,
    ) -> impl Future<Output = Result<(), ViewerError>> + Send;
}

/// Places the viewer can hand control to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SecureFolderSetup,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::SecureFolderSetup => "/secure-folder",
        }
    }
}

pub trait ViewerShell: Send + Sync + 'static {
    /// Asks the user for the protected-area credential. `None` means cancelled.
    fn prompt_credential(&self) -> impl Future<Output = Option<String>> + Send;

    fn navigate_to(&self, route: Route);
}
