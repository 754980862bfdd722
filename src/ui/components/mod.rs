//! Reusable UI components.

mod input;
mod loading;
mod notification;

pub use input::TextInput;
pub use loading::LoadingIndicator;
pub use notification::{Notification, NotificationManager, NotificationType};
