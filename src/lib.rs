//! Full-screen media viewer and editor core.
//!
//! [`viewer::Viewer`] is the state machine: navigation, pan/zoom/rotate,
//! favorites, slideshow, non-destructive editing with commit, and relocation
//! into a protected area. Storage, sharing and credential prompts are reached
//! through the traits in [`services`].

pub mod app;
pub mod backend;
pub mod config;
pub mod editor;
pub mod error;
pub mod image_loader;
pub mod models;
pub mod scanner;
pub mod services;
pub mod ui;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use error::ViewerError;
pub use viewer::{Viewer, ViewerAction, ViewerEvent, ViewerOptions};
