//! Event handling for the application.
//!
//! Terminal input is polled with a tick timeout so the event loop keeps
//! draining API messages and animating spinners while idle.

mod handler;

use crossterm::event::KeyEvent;

pub use handler::EventHandler;

/// An application-level event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// No terminal input within the tick rate.
    Tick,
    /// A key press.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
}
