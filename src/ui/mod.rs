//! User interface components and views.
//!
//! This module contains all TUI rendering logic: the list and detail
//! views plus reusable components.

pub mod components;
mod views;

pub use components::{LoadingIndicator, Notification, NotificationManager, TextInput};
pub use views::{DetailAction, DetailView, ListAction, ListView};
