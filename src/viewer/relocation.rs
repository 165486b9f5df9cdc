//! Moving the current item into the protected area.

use std::path::Path;

use tracing::{debug, info};

use crate::error::ViewerError;
use crate::services::{MediaBackend, ViewerShell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationOutcome {
    Moved,
    /// The protected area has not been set up; the user must be redirected.
    NotReady,
    /// The credential prompt was dismissed.
    Cancelled,
}

/// Readiness check, credential prompt, then the move. Stops at the first step that fails.
pub async fn run_relocation<B, S>(
    backend: &B,
    shell: &S,
    path: &Path,
) -> Result<RelocationOutcome, ViewerError>
where
    B: MediaBackend,
    S: ViewerShell,
{
    if !backend.check_protected_area_ready().await? {
        debug!("Protected area not set up");
        return Ok(RelocationOutcome::NotReady);
    }

    let Some(credential) = shell.prompt_credential().await.filter(|c| !c.is_empty()) else {
        debug!("Credential prompt cancelled, keeping item");
        return Ok(RelocationOutcome::Cancelled);
    };

    backend.move_to_protected_area(path, &credential).await?;
    info!(path = %path.display(), "Moved item to protected area");
    Ok(RelocationOutcome::Moved)
}
