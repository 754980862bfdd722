//! Loading indicator component.
//!
//! An animated spinner shown while a backend request is in flight.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

/// Spinner animation frames.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A loading indicator with an animated spinner.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    /// The message to display.
    message: String,
    /// Current spinner frame index.
    frame: usize,
    /// Whether the loading indicator is active.
    active: bool,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self {
            message: "Loading...".to_string(),
            frame: 0,
            active: false,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frame: 0,
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn start_with_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the spinner animation. Called on every tick.
    pub fn tick(&mut self) {
        if self.active {
            self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    /// Render the spinner line, centered in the given area.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.active {
            return;
        }

        let text = format!("{} {}", SPINNER_FRAMES[self.frame], self.message);
        let widget = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_inactive() {
        let loading = LoadingIndicator::new();
        assert!(!loading.is_active());
    }

    #[test]
    fn test_start_stop() {
        let mut loading = LoadingIndicator::new();
        loading.start();
        assert!(loading.is_active());
        loading.stop();
        assert!(!loading.is_active());
    }

    #[test]
    fn test_tick_wraps_frames() {
        let mut loading = LoadingIndicator::new();
        loading.start();
        for _ in 0..SPINNER_FRAMES.len() {
            loading.tick();
        }
        assert_eq!(loading.frame, 0);
    }

    #[test]
    fn test_tick_frozen_while_inactive() {
        let mut loading = LoadingIndicator::new();
        loading.tick();
        assert_eq!(loading.frame, 0);
    }
}
