//! Edit-commit pipeline.
//!
//! Reads the original bytes, rasterizes the edit off the async threads and
//! hands the encoded result to the backend, either over the original file or
//! through a staged file into the protected area.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::compositor::render_edit;
use super::session::{CropRegion, EditParams, SessionId};
use crate::error::ViewerError;
use crate::services::{MediaBackend, ViewerShell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDestination {
    /// Overwrite the original file.
    InPlace,
    /// Stage the result and relocate it into the protected area.
    Protected,
}

/// Everything a commit needs, captured when the user confirms the edit.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub session: SessionId,
    pub path: PathBuf,
    pub crop: Option<CropRegion>,
    pub params: EditParams,
    pub destination: CommitDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Saved { width: u32, height: u32 },
    MovedToProtected { width: u32, height: u32 },
    /// The credential prompt was dismissed; nothing was written.
    Cancelled,
}

pub async fn run_commit<B, S>(
    backend: &B,
    shell: &S,
    request: &CommitRequest,
) -> Result<CommitOutcome, ViewerError>
where
    B: MediaBackend,
    S: ViewerShell,
{
    debug!(path = %request.path.display(), destination = ?request.destination, "Starting commit");

    let source = backend.read_file_bytes(&request.path).await?;

    let crop = request.crop;
    let params = request.params;
    let rendered = tokio::task::spawn_blocking(move || render_edit(&source, crop, params)).await??;
    let (width, height) = (rendered.width, rendered.height);

    match request.destination {
        CommitDestination::InPlace => {
            backend
                .save_edited_image(rendered.bytes, &request.path, params)
                .await?;
            info!(path = %request.path.display(), width, height, "Saved edited image");
            Ok(CommitOutcome::Saved { width, height })
        }
        CommitDestination::Protected => {
            let Some(credential) = shell.prompt_credential().await.filter(|c| !c.is_empty()) else {
                debug!("Credential prompt cancelled, dropping commit");
                return Ok(CommitOutcome::Cancelled);
            };

            let staged = backend
                .save_temp_image(rendered.bytes, &request.path)
                .await?;

            if let Err(err) = backend.move_to_protected_area(&staged, &credential).await {
                if let Err(cleanup) = backend.discard_staged(&staged).await {
                    warn!(staged = %staged.display(), error = %cleanup, "Failed to discard staged file");
                }
                return Err(err);
            }

            info!(path = %request.path.display(), width, height, "Moved edited image to protected area");
            Ok(CommitOutcome::MovedToProtected { width, height })
        }
    }
}
