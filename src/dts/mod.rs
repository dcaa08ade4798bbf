//! Comparison of generated `electron.d.ts` documents.
//!
//! Definitions are regenerated from scratch on every dig, so the banner
//! carrying the Electron version differs between two builds even when the
//! API surface does not. [`normalize`] removes it before comparison and
//! [`render_diff`] produces the patch shown in the check summary.

mod diff;
mod normalize;

pub use diff::render_diff;
pub use normalize::normalize;
