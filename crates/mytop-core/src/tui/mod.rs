//! Terminal user interface: the live monitoring console.
//!
//! One dispatch loop owns all state and all drawing. The sampler and the
//! key reader run on their own threads and feed it through channels.

mod app;
pub mod controller;
pub mod event;
pub mod input;
pub mod layout;
pub mod mode;
pub mod screen;
pub mod state;
pub(crate) mod style;
mod terminal;
pub mod transitions;
pub mod widgets;

pub use app::Console;
pub use controller::ViewController;
pub use screen::{RenderSink, Screen};
