//! Non-destructive image editing: session state, rasterization and commit.

pub mod commit;
pub mod compositor;
pub mod session;

pub use commit::{run_commit, CommitDestination, CommitOutcome, CommitRequest};
pub use compositor::{apply_effects, render_edit, RenderedImage};
pub use session::{
    ColorFilter, CropRegion, DisplayRect, EditParams, EditSession, Percent, PixelRect, SessionId,
};
