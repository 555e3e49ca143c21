//! Client for a PDF question-answering backend.
//!
//! The UI-independent core (`api`, `conversation`, `landing`, `ticker`)
//! builds without a renderer; the Dioxus screens live behind the `ui`
//! feature, which `web`, `desktop` and `mobile` enable.

pub mod api;
pub mod config;
pub mod conversation;
pub mod format;
pub mod landing;
pub mod ticker;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;
