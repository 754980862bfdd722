//! Tracker API client implementation.
//!
//! This module provides the client for the issue-tracker REST backend.
//! It handles request/response processing, error handling, and retry
//! logic for idempotent reads. Mutations are never retried.

use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ApiError, Result};
use super::types::{
    AssignDto, CommentCreateDto, CommentDto, CommentUpdateDto, DatabaseDto, FieldUpdateDto,
    IssueCreateDto, IssueDto, TagDto, UserCreateDto, UserDto,
};
use crate::config::Profile;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures on reads.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// The tracker API client.
///
/// Provides async methods for every endpoint the UI consumes. Reads are
/// retried on transient failures; mutations run exactly once.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the tracker backend.
    base_url: String,
}

impl TrackerClient {
    /// Create a new tracker client from a profile.
    ///
    /// Validates the connection by fetching the database list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or if the
    /// backend is unreachable.
    #[instrument(skip(profile), fields(profile_name = %profile.name))]
    pub async fn new(profile: &Profile) -> Result<Self> {
        info!("Creating tracker client for profile");

        let tracker = Self::with_base_url(&profile.url)?;
        tracker.validate_connection().await?;

        info!("Tracker client created and connection validated");
        Ok(tracker)
    }

    /// Create a client with an explicit base URL, without validating the
    /// connection. Used by tests and by `new`.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Validate the connection by listing databases.
    ///
    /// The databases endpoint is cheap and always present, which makes it
    /// a usable liveness probe for the backend.
    #[instrument(skip(self))]
    pub async fn validate_connection(&self) -> Result<Vec<DatabaseDto>> {
        debug!("Validating tracker connection");

        self.list_databases().await.map_err(|e| {
            error!("Connection validation failed: {}", e);
            match e {
                ApiError::Network(_) => ApiError::ConnectionFailed(format!(
                    "Cannot connect to {}: {}",
                    self.base_url, e
                )),
                _ => ApiError::ConnectionFailed(e.to_string()),
            }
        })
    }

    // ------------------------------------------------------------------
    // Issues
    // ------------------------------------------------------------------

    /// List all issues in the active database.
    #[instrument(skip(self))]
    pub async fn list_issues(&self) -> Result<Vec<IssueDto>> {
        let url = format!("{}/issues", self.base_url);
        let issues: Vec<IssueDto> = self.get(&url).await?;
        debug!("Fetched {} issues", issues.len());
        Ok(issues)
    }

    /// Get a single issue by id.
    ///
    /// A 404 is reported distinctly so the UI can say "issue not found"
    /// for direct lookups rather than a generic failure.
    #[instrument(skip(self), fields(issue_id = %id))]
    pub async fn get_issue(&self, id: &str) -> Result<IssueDto> {
        let url = format!("{}/issues/{}", self.base_url, urlencoding::encode(id));
        self.get(&url).await.map_err(|e| {
            if matches!(e, ApiError::NotFound(_)) {
                ApiError::NotFound(format!("Issue '{}' not found", id))
            } else {
                e
            }
        })
    }

    /// Create a new issue.
    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn create_issue(&self, payload: &IssueCreateDto) -> Result<IssueDto> {
        let url = format!("{}/issues", self.base_url);
        self.send(Method::POST, &url, Some(payload)).await
    }

    /// Apply a single field update to an issue.
    ///
    /// The backend accepts one `{field, value}` pair per PATCH; callers
    /// with multiple changed fields issue one request per field.
    #[instrument(skip(self, patch), fields(issue_id = %id, field = %patch.field))]
    pub async fn update_issue_field(&self, id: &str, patch: &FieldUpdateDto) -> Result<IssueDto> {
        let url = format!("{}/issues/{}", self.base_url, urlencoding::encode(id));
        self.send(Method::PATCH, &url, Some(patch))
            .await
            .map_err(|e| match e {
                ApiError::Network(err) => ApiError::Network(err),
                other => ApiError::UpdateFailed(format!("{}: {}", patch.field, other)),
            })
    }

    /// Delete an issue.
    #[instrument(skip(self), fields(issue_id = %id))]
    pub async fn delete_issue(&self, id: &str) -> Result<()> {
        let url = format!("{}/issues/{}", self.base_url, urlencoding::encode(id));
        self.send_no_content(Method::DELETE, &url, None::<&()>).await
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// List comments for an issue.
    #[instrument(skip(self), fields(issue_id = %id))]
    pub async fn list_comments(&self, id: &str) -> Result<Vec<CommentDto>> {
        let url = format!(
            "{}/issues/{}/comments",
            self.base_url,
            urlencoding::encode(id)
        );
        self.get(&url).await
    }

    /// Add a comment to an issue.
    #[instrument(skip(self, payload), fields(issue_id = %id))]
    pub async fn add_comment(&self, id: &str, payload: &CommentCreateDto) -> Result<CommentDto> {
        let url = format!(
            "{}/issues/{}/comments",
            self.base_url,
            urlencoding::encode(id)
        );
        self.send(Method::POST, &url, Some(payload)).await
    }

    /// Update the text of an existing comment.
    #[instrument(skip(self, text), fields(issue_id = %issue_id, comment_id = %comment_id))]
    pub async fn update_comment(
        &self,
        issue_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<CommentDto> {
        let url = format!(
            "{}/issues/{}/comments/{}",
            self.base_url,
            urlencoding::encode(issue_id),
            urlencoding::encode(comment_id)
        );
        let payload = CommentUpdateDto {
            text: text.to_string(),
        };
        self.send(Method::PATCH, &url, Some(&payload)).await
    }

    /// Delete a comment.
    #[instrument(skip(self), fields(issue_id = %issue_id, comment_id = %comment_id))]
    pub async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()> {
        let url = format!(
            "{}/issues/{}/comments/{}",
            self.base_url,
            urlencoding::encode(issue_id),
            urlencoding::encode(comment_id)
        );
        self.send_no_content(Method::DELETE, &url, None::<&()>).await
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// List all known tags.
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<TagDto>> {
        let url = format!("{}/tags", self.base_url);
        self.get(&url).await
    }

    /// List the tags attached to an issue.
    #[instrument(skip(self), fields(issue_id = %id))]
    pub async fn issue_tags(&self, id: &str) -> Result<Vec<TagDto>> {
        let url = format!("{}/issues/{}/tags", self.base_url, urlencoding::encode(id));
        self.get(&url).await
    }

    /// Attach a tag to an issue.
    #[instrument(skip(self, tag), fields(issue_id = %id))]
    pub async fn add_tag(&self, id: &str, tag: &TagDto) -> Result<()> {
        let url = format!("{}/issues/{}/tags", self.base_url, urlencoding::encode(id));
        self.send_no_content(Method::POST, &url, Some(tag)).await
    }

    /// Detach a tag from an issue.
    #[instrument(skip(self, tag), fields(issue_id = %id))]
    pub async fn remove_tag(&self, id: &str, tag: &TagDto) -> Result<()> {
        let url = format!("{}/issues/{}/tags", self.base_url, urlencoding::encode(id));
        self.send_no_content(Method::DELETE, &url, Some(tag)).await
    }

    // ------------------------------------------------------------------
    // Users & assignment
    // ------------------------------------------------------------------

    /// List all users.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserDto>> {
        let url = format!("{}/users", self.base_url);
        self.get(&url).await
    }

    /// List the known user roles.
    #[instrument(skip(self))]
    pub async fn list_roles(&self) -> Result<Vec<String>> {
        let url = format!("{}/users/roles", self.base_url);
        self.get(&url).await
    }

    /// Create a new user.
    #[instrument(skip(self, payload), fields(user = %payload.name))]
    pub async fn create_user(&self, payload: &UserCreateDto) -> Result<UserDto> {
        let url = format!("{}/users", self.base_url);
        self.send(Method::POST, &url, Some(payload)).await
    }

    /// Assign an issue to a user.
    #[instrument(skip(self, payload), fields(user = %name))]
    pub async fn assign_issue(&self, name: &str, payload: &AssignDto) -> Result<()> {
        let url = format!(
            "{}/users/{}/issues",
            self.base_url,
            urlencoding::encode(name)
        );
        self.send_no_content(Method::POST, &url, Some(payload)).await
    }

    /// Remove an issue's assignment.
    #[instrument(skip(self), fields(issue_id = %id))]
    pub async fn unassign_issue(&self, id: &str) -> Result<()> {
        let url = format!(
            "{}/issues/{}/unassign",
            self.base_url,
            urlencoding::encode(id)
        );
        self.send_no_content(Method::PATCH, &url, None::<&()>).await
    }

    // ------------------------------------------------------------------
    // Databases
    // ------------------------------------------------------------------

    /// List the backend's databases.
    #[instrument(skip(self))]
    pub async fn list_databases(&self) -> Result<Vec<DatabaseDto>> {
        let url = format!("{}/databases", self.base_url);
        self.get(&url).await
    }

    /// Discover the active database name, if the backend reports one.
    pub async fn active_database(&self) -> Result<Option<String>> {
        let databases = self.list_databases().await?;
        Ok(databases
            .into_iter()
            .find(|db| db.active.unwrap_or(false))
            .and_then(|db| db.name))
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    /// Perform a GET request with retry for transient failures.
    #[instrument(skip(self), fields(url = %url))]
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempts = 0;
        let mut last_error: Option<ApiError> = None;

        while attempts < MAX_RETRIES {
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, MAX_RETRIES);

            match self.execute::<T, ()>(Method::GET, url, None).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if Self::is_retryable(&e) && attempts < MAX_RETRIES {
                        let delay = Self::retry_delay(attempts);
                        warn!(
                            "Request failed (attempt {}), retrying in {}ms: {}",
                            attempts, delay, e
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::ServerError("Max retries exceeded".to_string())))
    }

    /// Perform a mutating request expecting a JSON body back. Never retried.
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T> {
        self.execute(method, url, body).await
    }

    /// Perform a mutating request where the response body is irrelevant.
    async fn send_no_content<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let response = self.dispatch(method, url, body).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let request_url = response.url().to_string();
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);
            Err(Self::error_from_response(status, &request_url, &error_body))
        }
    }

    /// Execute a single request and parse the JSON response.
    async fn execute<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.dispatch(method, url, body).await?;
        self.handle_response(response).await
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);
            Err(Self::error_from_response(status, &url, &error_body))
        }
    }

    /// Create an appropriate error from an HTTP response.
    ///
    /// The backend's error DTO carries a `message` field when it bothers
    /// to send one; plain-text bodies are used as-is.
    fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
        let context = if body.is_empty() {
            url.to_string()
        } else if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| url.to_string())
        } else {
            body.to_string()
        };

        ApiError::from_status(status, &context)
    }

    /// Check if an error is retryable.
    fn is_retryable(error: &ApiError) -> bool {
        matches!(
            error,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_)
        )
    }

    /// Calculate retry delay with exponential backoff.
    fn retry_delay(attempt: u32) -> u64 {
        RETRY_DELAY_MS * 2u64.pow(attempt - 1)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Self-hosted trackers are commonly plain HTTP on a LAN; warn, don't refuse.
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure outside a trusted network.", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://tracker.local:8600/"),
            "http://tracker.local:8600"
        );
    }

    #[test]
    fn test_normalize_base_url_handles_multiple_slashes() {
        assert_eq!(
            normalize_base_url("http://tracker.local:8600///"),
            "http://tracker.local:8600"
        );
    }

    #[test]
    fn test_normalize_base_url_preserves_path() {
        assert_eq!(
            normalize_base_url("https://tracker.example.com/its/"),
            "https://tracker.example.com/its"
        );
    }

    #[test]
    fn test_is_retryable_rate_limited() {
        assert!(TrackerClient::is_retryable(&ApiError::RateLimited));
    }

    #[test]
    fn test_is_retryable_server_error() {
        assert!(TrackerClient::is_retryable(&ApiError::ServerError(
            "test".to_string()
        )));
    }

    #[test]
    fn test_is_not_retryable_not_found() {
        assert!(!TrackerClient::is_retryable(&ApiError::NotFound(
            "test".to_string()
        )));
    }

    #[test]
    fn test_is_not_retryable_update_failed() {
        assert!(!TrackerClient::is_retryable(&ApiError::UpdateFailed(
            "title".to_string()
        )));
    }

    #[test]
    fn test_retry_delay_exponential() {
        assert_eq!(TrackerClient::retry_delay(1), 1000);
        assert_eq!(TrackerClient::retry_delay(2), 2000);
        assert_eq!(TrackerClient::retry_delay(3), 4000);
    }

    #[test]
    fn test_error_from_response_extracts_message() {
        let err = TrackerClient::error_from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "http://tracker.local/issues",
            r#"{"statusCode": 500, "error": "Internal", "message": "database locked"}"#,
        );
        match err {
            ApiError::ServerError(msg) => assert!(msg.contains("database locked")),
            _ => panic!("Expected ServerError"),
        }
    }

    #[test]
    fn test_error_from_response_plain_text_body() {
        let err = TrackerClient::error_from_response(
            StatusCode::NOT_FOUND,
            "http://tracker.local/issues/99",
            "no such issue",
        );
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "no such issue"),
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_client_builds_without_network() {
        let client = TrackerClient::with_base_url("http://localhost:8600/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8600");
    }
}
