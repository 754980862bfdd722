//! Tracker API request and response types.
//!
//! The backend's DTO shapes are not stable: field names arrive in both
//! snake_case and camelCase, ids and timestamps may be numbers or strings,
//! and most fields can be absent. All of that tolerance is declared here,
//! once per entity, so the rest of the crate works with normalized
//! view-models (see `crate::model`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A JSON scalar that may arrive as an integer, a float, or a string.
///
/// Used for ids, status codes, and timestamps, all of which the backend
/// has been observed to send in more than one encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Coerce to an integer where possible (floats truncate, numeric
    /// strings parse, a leading `#` is tolerated).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Float(f) => Some(*f as i64),
            Scalar::Text(s) => s.trim().trim_start_matches('#').parse().ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An issue as returned by `GET /issues` and `GET /issues/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueDto {
    #[serde(default)]
    pub id: Option<Scalar>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Author arrives as `author`, `authorId`, or `author_id`.
    #[serde(default, alias = "authorId", alias = "author_id")]
    pub author: Option<String>,
    /// Assignee arrives as `assignedTo` or `assigned_to`.
    #[serde(default, rename = "assignedTo", alias = "assigned_to")]
    pub assigned_to: Option<String>,
    /// Status may be a numeric code, an enum string, or free text.
    #[serde(default)]
    pub status: Option<Scalar>,
    /// Creation time arrives as `createdAt` or `created_at`, in epoch
    /// seconds, epoch milliseconds, or a date string.
    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<Scalar>,
    #[serde(default)]
    pub tags: Vec<TagDto>,
    /// Present only on detail responses; list responses omit it.
    #[serde(default)]
    pub comments: Option<Vec<CommentDto>>,
}

/// Payload for `POST /issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueCreateDto {
    pub title: String,
    pub description: String,
    #[serde(rename = "author_id")]
    pub author_id: String,
}

/// Payload for `PATCH /issues/{id}`: one field update per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdateDto {
    pub field: String,
    pub value: String,
}

impl FieldUpdateDto {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A comment as returned by `GET /issues/{id}/comments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentDto {
    #[serde(default)]
    pub id: Option<Scalar>,
    /// Comment author arrives as `author`, `authorId`, or `author_id`.
    #[serde(default, alias = "authorId", alias = "author_id")]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Arrives as `timestamp`, `date`, or `created_at`.
    #[serde(default, alias = "date", alias = "created_at")]
    pub timestamp: Option<Scalar>,
}

/// Payload for `POST /issues/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCreateDto {
    pub text: String,
    #[serde(rename = "author_id")]
    pub author_id: String,
}

/// Payload for `PATCH /issues/{id}/comments/{commentId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentUpdateDto {
    pub text: String,
}

/// A tag, both on the wire and in tag-mutation payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagDto {
    /// Tag name arrives as `tag` or `label`.
    #[serde(default, alias = "label")]
    pub tag: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TagDto {
    pub fn new(tag: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            color: Some(color.into()),
        }
    }
}

/// A user as returned by `GET /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Payload for `POST /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreateDto {
    pub name: String,
    pub role: String,
}

/// Payload for `POST /users/{name}/issues` (assignment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignDto {
    pub id: Scalar,
}

/// A database entry as returned by `GET /databases`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}
