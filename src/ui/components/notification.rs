//! Notification/toast component for user feedback.
//!
//! A transient status line communicates both success and failure
//! messages; the session never silently discards an error.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Maximum notifications kept in the queue.
const MAX_QUEUE: usize = 5;

/// Default display duration.
const DEFAULT_DURATION: Duration = Duration::from_secs(4);

/// The type of notification, which determines its appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationType {
    /// Get the icon for this notification type.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationType::Info => "ℹ",
            NotificationType::Success => "✓",
            NotificationType::Warning => "⚠",
            NotificationType::Error => "✗",
        }
    }

    /// Get the color for this notification type.
    pub fn color(&self) -> Color {
        match self {
            NotificationType::Info => Color::Blue,
            NotificationType::Success => Color::Green,
            NotificationType::Warning => Color::Yellow,
            NotificationType::Error => Color::Red,
        }
    }
}

/// A single notification message.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The notification message.
    pub message: String,
    /// The type of notification.
    pub notification_type: NotificationType,
    /// When the notification was created.
    pub created_at: Instant,
    /// How long the notification should be displayed.
    pub duration: Duration,
}

impl Notification {
    /// Create a new notification.
    pub fn new(message: impl Into<String>, notification_type: NotificationType) -> Self {
        Self {
            message: message.into(),
            notification_type,
            created_at: Instant::now(),
            duration: DEFAULT_DURATION,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Error)
    }

    /// Whether this notification has outlived its display time.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

/// A queue of transient notifications.
#[derive(Debug, Default)]
pub struct NotificationManager {
    queue: VecDeque<Notification>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notification, dropping the oldest beyond the queue cap.
    pub fn push(&mut self, notification: Notification) {
        if self.queue.len() >= MAX_QUEUE {
            self.queue.pop_front();
        }
        self.queue.push_back(notification);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Notification::info(message));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notification::success(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Notification::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notification::error(message));
    }

    /// Drop expired notifications. Called on every tick.
    pub fn tick(&mut self) {
        self.queue.retain(|n| !n.is_expired());
    }

    /// The currently visible notification, newest first.
    pub fn current(&self) -> Option<&Notification> {
        self.queue.back()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Render the current notification as a floating line in the given
    /// area's top-right corner.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(notification) = self.current() else {
            return;
        };

        let width = (notification.message.chars().count() as u16 + 6)
            .min(area.width.saturating_sub(2))
            .max(10);
        let popup = Rect {
            x: area.right().saturating_sub(width + 1),
            y: area.y + 1,
            width,
            height: 3,
        };

        let style = Style::default().fg(notification.notification_type.color());
        let line = Line::from(vec![
            Span::styled(
                format!("{} ", notification.notification_type.icon()),
                style.add_modifier(Modifier::BOLD),
            ),
            Span::raw(notification.message.clone()),
        ]);

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(line).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style),
            ),
            popup,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_types() {
        assert_eq!(NotificationType::Success.icon(), "✓");
        assert_eq!(NotificationType::Error.color(), Color::Red);
    }

    #[test]
    fn test_push_and_current() {
        let mut manager = NotificationManager::new();
        assert!(manager.is_empty());

        manager.success("saved");
        manager.error("failed");
        assert_eq!(manager.current().unwrap().message, "failed");
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut manager = NotificationManager::new();
        for i in 0..10 {
            manager.info(format!("msg {}", i));
        }
        assert_eq!(manager.queue.len(), MAX_QUEUE);
        assert_eq!(manager.current().unwrap().message, "msg 9");
    }

    #[test]
    fn test_fresh_notification_not_expired() {
        let notification = Notification::info("hello");
        assert!(!notification.is_expired());
    }

    #[test]
    fn test_tick_drops_expired() {
        let mut manager = NotificationManager::new();
        let mut stale = Notification::info("old");
        stale.duration = Duration::ZERO;
        manager.push(stale);
        manager.tick();
        assert!(manager.is_empty());
    }
}
