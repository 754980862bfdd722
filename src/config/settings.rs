//! Application settings configuration.

use serde::{Deserialize, Serialize};

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// The UI theme to use.
    pub theme: String,
    /// Event-loop tick rate in milliseconds.
    pub tick_rate_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            theme: "dark".to_string(),
            tick_rate_ms: 100,
        }
    }
}
