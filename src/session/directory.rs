//! Per-session user directory cache.
//!
//! The directory backs assignee resolution and comment-author selection.
//! It is fetched at most once per open session: the first successful
//! population wins and later attempts are ignored, which bounds repeated
//! network calls without a TTL.

use crate::api::types::UserDto;

/// How an assignee input resolved against the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Empty input: an explicit request to remove the assignment.
    Unassign,
    /// Matched a directory entry; carries the directory's canonical casing.
    Match(String),
    /// No directory entry matches the input.
    NotFound(String),
}

/// The cached user directory for one editing session.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Option<Vec<UserDto>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the directory has been populated.
    pub fn is_loaded(&self) -> bool {
        self.users.is_some()
    }

    /// Populate the cache. First population wins; a second call within
    /// the same session is dropped.
    pub fn populate(&mut self, users: Vec<UserDto>) {
        if self.users.is_none() {
            self.users = Some(users);
        }
    }

    /// The user names in directory order.
    pub fn names(&self) -> Vec<&str> {
        self.users
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|u| u.name.as_deref())
            .collect()
    }

    /// The first directory entry, used as the default author for newly
    /// created issues.
    pub fn first_user(&self) -> Option<&str> {
        self.names().first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    /// Resolve a free-text assignee input.
    ///
    /// Empty input is an explicit unassign. Non-empty input must match a
    /// directory name case-insensitively; the canonical casing from the
    /// directory is returned for display.
    pub fn resolve(&self, input: &str) -> Resolution {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Resolution::Unassign;
        }

        let lowered = trimmed.to_lowercase();
        match self
            .names()
            .iter()
            .find(|name| name.to_lowercase() == lowered)
        {
            Some(name) => Resolution::Match(name.to_string()),
            None => Resolution::NotFound(trimmed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserDto {
        UserDto {
            name: Some(name.to_string()),
            role: Some("developer".to_string()),
        }
    }

    #[test]
    fn test_starts_unloaded() {
        let directory = UserDirectory::new();
        assert!(!directory.is_loaded());
        assert!(directory.is_empty());
        assert!(directory.first_user().is_none());
    }

    #[test]
    fn test_first_population_wins() {
        let mut directory = UserDirectory::new();
        directory.populate(vec![user("Alice"), user("Bob")]);
        directory.populate(vec![user("Mallory")]);

        assert_eq!(directory.names(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_resolve_case_insensitive_returns_canonical_casing() {
        let mut directory = UserDirectory::new();
        directory.populate(vec![user("Alice"), user("Bob")]);

        assert_eq!(
            directory.resolve("alice"),
            Resolution::Match("Alice".to_string())
        );
        assert_eq!(
            directory.resolve("ALICE"),
            Resolution::Match("Alice".to_string())
        );
    }

    #[test]
    fn test_resolve_unknown_user() {
        let mut directory = UserDirectory::new();
        directory.populate(vec![user("Alice"), user("Bob")]);

        assert_eq!(
            directory.resolve("carol"),
            Resolution::NotFound("carol".to_string())
        );
    }

    #[test]
    fn test_resolve_empty_is_unassign() {
        let mut directory = UserDirectory::new();
        directory.populate(vec![user("Alice")]);

        assert_eq!(directory.resolve(""), Resolution::Unassign);
        assert_eq!(directory.resolve("   "), Resolution::Unassign);
    }

    #[test]
    fn test_entries_without_names_are_skipped() {
        let mut directory = UserDirectory::new();
        directory.populate(vec![UserDto::default(), user("Alice")]);

        assert_eq!(directory.names(), vec!["Alice"]);
        assert_eq!(directory.first_user(), Some("Alice"));
    }
}
