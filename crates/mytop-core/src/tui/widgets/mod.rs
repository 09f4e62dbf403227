//! Content builders for the screen regions.
//!
//! Widgets turn models into [`Panel`](super::screen::Panel) content; the
//! screen owns layout and drawing.

pub mod header;
pub mod help;
pub mod processlist;
pub mod report;
pub mod status;
