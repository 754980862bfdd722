//! Normalized view-models for tracker entities.
//!
//! The wire DTOs (`crate::api::types`) tolerate every shape the backend
//! has been seen to produce; this module converts them into the strongly
//! typed representations the rest of the crate works with. Conversion
//! happens exactly once, at the boundary, and is idempotent: normalizing
//! an already-normalized value is a fixed point.

use std::fmt;

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::api::types::{CommentDto, IssueDto, Scalar, TagDto};

/// Fallback shown when a timestamp is absent or unparseable.
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Palette default for tags that arrive without a color.
pub const DEFAULT_TAG_COLOR: &str = "#49a3d8";

/// Label default for tags that arrive without a name.
pub const DEFAULT_TAG_LABEL: &str = "Tag";

/// Epoch values at or above this magnitude are milliseconds, below are seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// A normalized issue identity.
///
/// Backends use numeric row ids, but opaque string ids also occur; both
/// are preserved. A leading `#` in the wire value is display decoration
/// and is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueId {
    Number(i64),
    Text(String),
}

impl IssueId {
    /// Normalize a wire scalar into an id.
    pub fn from_scalar(value: &Scalar) -> Self {
        match value.as_int() {
            Some(n) => IssueId::Number(n),
            None => IssueId::Text(value.to_string().trim_start_matches('#').to_string()),
        }
    }

    /// Parse a user-entered id, e.g. from a search-by-id prompt.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim().trim_start_matches('#');
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<i64>() {
            Ok(n) => IssueId::Number(n),
            Err(_) => IssueId::Text(trimmed.to_string()),
        })
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueId::Number(n) => write!(f, "{}", n),
            IssueId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A normalized issue status.
///
/// The backend encodes status as a numeric code, an enum-ish string, or
/// free text. The three canonical labels cover filtering and the status
/// cycle; anything unrecognized is preserved verbatim, so callers must
/// treat status as an open string rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    ToBeDone,
    InProgress,
    Done,
    Other(String),
}

impl Status {
    /// Normalize a status string. Numeric codes 1/2/3 and case-insensitive
    /// synonyms map to canonical labels; other non-empty text passes
    /// through unchanged; empty text is the default status.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Status::default();
        }
        match trimmed.to_lowercase().as_str() {
            "1" | "todo" | "to do" | "to be done" | "to-be-done" | "tbd" | "open" => {
                Status::ToBeDone
            }
            "2" | "in progress" | "in-progress" | "in_progress" | "inprogress" | "doing" => {
                Status::InProgress
            }
            "3" | "done" | "closed" | "resolved" | "complete" | "completed" => Status::Done,
            _ => Status::Other(trimmed.to_string()),
        }
    }

    /// Normalize a wire scalar (numeric code or string).
    pub fn from_scalar(value: Option<&Scalar>) -> Self {
        match value {
            Some(scalar) => Status::parse(&scalar.to_string()),
            None => Status::default(),
        }
    }

    /// The display label for this status.
    pub fn label(&self) -> &str {
        match self {
            Status::ToBeDone => "To Be Done",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Other(s) => s,
        }
    }

    /// Advance to the next canonical status. Unrecognized statuses enter
    /// the cycle at its start.
    pub fn next(&self) -> Status {
        match self {
            Status::ToBeDone => Status::InProgress,
            Status::InProgress => Status::Done,
            Status::Done | Status::Other(_) => Status::ToBeDone,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Format a wire timestamp as a calendar date.
///
/// Accepts epoch seconds, epoch milliseconds (disambiguated at the 1e12
/// boundary), numeric strings, and ISO date/datetime strings. Anything
/// else degrades to [`UNKNOWN_DATE`].
pub fn format_date(value: Option<&Scalar>) -> String {
    let Some(value) = value else {
        return UNKNOWN_DATE.to_string();
    };

    if let Some(n) = value.as_int() {
        return epoch_to_date(n).unwrap_or_else(|| UNKNOWN_DATE.to_string());
    }

    let text = value.to_string();
    let trimmed = text.trim();
    if let Ok(ts) = trimmed.parse::<Timestamp>() {
        return ts.to_zoned(TimeZone::UTC).strftime("%Y-%m-%d").to_string();
    }
    if let Ok(date) = trimmed.parse::<Date>() {
        return date.strftime("%Y-%m-%d").to_string();
    }
    UNKNOWN_DATE.to_string()
}

fn epoch_to_date(n: i64) -> Option<String> {
    let ts = if n.abs() >= EPOCH_MILLIS_THRESHOLD {
        Timestamp::from_millisecond(n).ok()?
    } else {
        Timestamp::from_second(n).ok()?
    };
    Some(ts.to_zoned(TimeZone::UTC).strftime("%Y-%m-%d").to_string())
}

/// A normalized tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagView {
    pub label: String,
    pub color: String,
}

impl TagView {
    pub fn from_dto(dto: &TagDto) -> Self {
        Self {
            label: dto
                .tag
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_TAG_LABEL)
                .to_string(),
            color: dto
                .color
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_TAG_COLOR)
                .to_string(),
        }
    }

    /// The wire shape for tag-mutation requests.
    pub fn to_dto(&self) -> TagDto {
        TagDto::new(self.label.clone(), self.color.clone())
    }
}

/// A normalized comment.
///
/// `id` is absent for comments created locally that have not yet
/// round-tripped through the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub id: Option<IssueId>,
    pub author: String,
    pub date: String,
    pub text: String,
}

impl CommentView {
    pub fn from_dto(dto: &CommentDto) -> Self {
        Self {
            id: dto.id.as_ref().map(IssueId::from_scalar),
            author: dto.author.clone().unwrap_or_else(|| "Unknown".to_string()),
            date: format_date(dto.timestamp.as_ref()),
            text: dto.text.clone().unwrap_or_default(),
        }
    }

    /// A comment authored locally, awaiting persistence.
    pub fn local(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            author: author.into(),
            date: "Today".to_string(),
            text: text.into(),
        }
    }
}

/// The normalized, UI-facing representation of an issue.
///
/// `raw_id` is `Some` if and only if the issue has been persisted; its
/// presence is the sole discriminator between create and update flows.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueView {
    pub raw_id: Option<IssueId>,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub author: String,
    /// Empty means unassigned.
    pub assigned_to: String,
    pub created_at: String,
    pub tags: Vec<TagView>,
    pub comments: Vec<CommentView>,
    /// Display-only provenance; never sent back to the backend.
    pub database: String,
}

impl IssueView {
    /// Normalize a wire DTO. The active database name is context supplied
    /// by the caller, not part of the issue payload.
    pub fn from_dto(dto: &IssueDto, database: Option<&str>) -> Self {
        Self {
            raw_id: dto.id.as_ref().map(IssueId::from_scalar),
            title: dto
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled Issue".to_string()),
            description: dto.description.clone().unwrap_or_default(),
            status: Status::from_scalar(dto.status.as_ref()),
            author: dto.author.clone().unwrap_or_else(|| "Unknown".to_string()),
            assigned_to: dto.assigned_to.clone().unwrap_or_default(),
            created_at: format_date(dto.created_at.as_ref()),
            tags: dto.tags.iter().map(TagView::from_dto).collect(),
            comments: dto
                .comments
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(CommentView::from_dto)
                .collect(),
            database: database.unwrap_or("Unknown").to_string(),
        }
    }

    /// A blank, never-persisted issue for the create flow.
    pub fn draft(database: Option<&str>) -> Self {
        Self {
            raw_id: None,
            title: String::new(),
            description: String::new(),
            status: Status::default(),
            author: String::new(),
            assigned_to: String::new(),
            created_at: "Today".to_string(),
            tags: Vec::new(),
            comments: Vec::new(),
            database: database.unwrap_or("Unknown").to_string(),
        }
    }

    /// The display id: `#<id>`, or `#?` before the first persist.
    pub fn display_id(&self) -> String {
        match &self.raw_id {
            Some(id) => format!("#{}", id),
            None => "#?".to_string(),
        }
    }

    /// The assignee label shown in lists and the sidebar.
    pub fn assignee_label(&self) -> &str {
        if self.assigned_to.is_empty() {
            "Unassigned"
        } else {
            &self.assigned_to
        }
    }

    /// Case-insensitive substring search over title, description,
    /// assignee, and tag labels.
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        let haystack = format!(
            "{} {} {} {}",
            self.title,
            self.description,
            self.assigned_to,
            self.tags
                .iter()
                .map(|t| t.label.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        )
        .to_lowercase();
        haystack.contains(&needle)
    }
}
