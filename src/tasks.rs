//! Async task management for non-blocking API operations.
//!
//! Backend calls never run inline in the event loop. The loop spawns a
//! background task via `TaskSpawner`, keeps rendering, and picks up the
//! result as an `ApiMessage` from the channel on a later tick.
//!
//! Detail-scoped messages carry the `session` generation they were
//! spawned for. Requests are not aborted when a session closes; the
//! event loop simply drops messages stamped with a stale generation,
//! which is how "discard interest in the result" is implemented.

use tokio::sync::mpsc;

use crate::api::types::{
    AssignDto, CommentCreateDto, CommentDto, FieldUpdateDto, IssueCreateDto, IssueDto, TagDto,
    UserDto,
};
use crate::api::TrackerClient;
use crate::config::Profile;
use crate::model::IssueId;

/// Messages sent from background tasks to the main event loop.
#[derive(Debug)]
pub enum ApiMessage {
    /// Initial connection result: the client plus the active database.
    ClientConnected(Result<(TrackerClient, Option<String>), String>),

    /// Issue list fetch (initial load or refresh).
    IssuesFetched(Result<Vec<IssueDto>, String>),

    /// Direct issue lookup by id.
    IssueFetched {
        id: String,
        result: Result<IssueDto, String>,
    },

    /// Issue create result.
    IssueCreated {
        session: u64,
        result: Result<IssueDto, String>,
    },

    /// One field patch result. Fields are independent; each patch
    /// reports on its own.
    IssueFieldPatched {
        session: u64,
        field: String,
        result: Result<(), String>,
    },

    /// Issue delete result.
    IssueDeleted {
        id: String,
        result: Result<(), String>,
    },

    /// Comments fetched for the open issue.
    CommentsFetched {
        session: u64,
        result: Result<Vec<CommentDto>, String>,
    },

    /// Comment create result.
    CommentAdded {
        session: u64,
        result: Result<CommentDto, String>,
    },

    /// Comment text update result.
    CommentUpdated {
        session: u64,
        index: usize,
        result: Result<(), String>,
    },

    /// Comment delete result.
    CommentDeleted {
        session: u64,
        comment_id: IssueId,
        index: usize,
        result: Result<(), String>,
    },

    /// User directory fetched for the open session.
    UsersFetched {
        session: u64,
        result: Result<Vec<UserDto>, String>,
    },

    /// Assignment result.
    Assigned {
        session: u64,
        result: Result<(), String>,
    },

    /// Unassignment result.
    Unassigned {
        session: u64,
        result: Result<(), String>,
    },

    /// Tag attach result.
    TagAdded {
        session: u64,
        result: Result<(), String>,
    },

    /// Tag detach result.
    TagRemoved {
        session: u64,
        result: Result<(), String>,
    },

    /// The open issue's tags, fetched from the tags sub-resource.
    IssueTagsFetched {
        session: u64,
        result: Result<Vec<TagDto>, String>,
    },

    /// The global tag palette, used to color new tags by label.
    KnownTagsFetched {
        session: u64,
        result: Result<Vec<TagDto>, String>,
    },
}

/// Spawns background tasks for async operations.
///
/// Each method clones what it needs and spawns a tokio task that sends
/// its result through the channel.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
}

impl TaskSpawner {
    /// Create a new TaskSpawner with the given channel sender.
    pub fn new(tx: mpsc::UnboundedSender<ApiMessage>) -> Self {
        Self { tx }
    }

    /// Spawn a task to connect to the tracker and discover the active
    /// database.
    pub fn spawn_connect(&self, profile: Profile) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = async {
                let client = TrackerClient::new(&profile)
                    .await
                    .map_err(|e| e.to_string())?;
                let database = client.active_database().await.map_err(|e| e.to_string())?;
                Ok((client, database))
            }
            .await;
            let _ = tx.send(ApiMessage::ClientConnected(result));
        });
    }

    /// Spawn a task to fetch the issue list.
    pub fn spawn_fetch_issues(&self, client: &TrackerClient) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.list_issues().await.map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssuesFetched(result));
        });
    }

    /// Spawn a task to fetch one issue by id.
    pub fn spawn_fetch_issue(&self, client: &TrackerClient, id: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.get_issue(&id).await.map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssueFetched { id, result });
        });
    }

    /// Spawn a task to create an issue.
    pub fn spawn_create_issue(
        &self,
        client: &TrackerClient,
        session: u64,
        payload: IssueCreateDto,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .create_issue(&payload)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssueCreated { session, result });
        });
    }

    /// Spawn a task to apply one field patch to an issue.
    pub fn spawn_patch_field(
        &self,
        client: &TrackerClient,
        session: u64,
        issue_id: String,
        patch: FieldUpdateDto,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        let field = patch.field.clone();
        tokio::spawn(async move {
            let result = client
                .update_issue_field(&issue_id, &patch)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssueFieldPatched {
                session,
                field,
                result,
            });
        });
    }

    /// Spawn a task to delete an issue.
    pub fn spawn_delete_issue(&self, client: &TrackerClient, id: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.delete_issue(&id).await.map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssueDeleted { id, result });
        });
    }

    /// Spawn a task to fetch comments for the open issue.
    pub fn spawn_fetch_comments(&self, client: &TrackerClient, session: u64, issue_id: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .list_comments(&issue_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::CommentsFetched { session, result });
        });
    }

    /// Spawn a task to add a comment.
    pub fn spawn_add_comment(
        &self,
        client: &TrackerClient,
        session: u64,
        issue_id: String,
        payload: CommentCreateDto,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .add_comment(&issue_id, &payload)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::CommentAdded { session, result });
        });
    }

    /// Spawn a task to update a comment's text.
    pub fn spawn_update_comment(
        &self,
        client: &TrackerClient,
        session: u64,
        issue_id: String,
        comment_id: String,
        index: usize,
        text: String,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .update_comment(&issue_id, &comment_id, &text)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::CommentUpdated {
                session,
                index,
                result,
            });
        });
    }

    /// Spawn a task to delete a comment.
    pub fn spawn_delete_comment(
        &self,
        client: &TrackerClient,
        session: u64,
        issue_id: String,
        comment_id: IssueId,
        index: usize,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .delete_comment(&issue_id, &comment_id.to_string())
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::CommentDeleted {
                session,
                comment_id,
                index,
                result,
            });
        });
    }

    /// Spawn a task to fetch the user directory.
    pub fn spawn_fetch_users(&self, client: &TrackerClient, session: u64) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.list_users().await.map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::UsersFetched { session, result });
        });
    }

    /// Spawn a task to assign an issue to a user.
    pub fn spawn_assign(
        &self,
        client: &TrackerClient,
        session: u64,
        user: String,
        issue_id: IssueId,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let payload = AssignDto {
                id: match issue_id {
                    IssueId::Number(n) => crate::api::types::Scalar::Int(n),
                    IssueId::Text(s) => crate::api::types::Scalar::Text(s),
                },
            };
            let result = client
                .assign_issue(&user, &payload)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::Assigned { session, result });
        });
    }

    /// Spawn a task to remove an issue's assignment.
    pub fn spawn_unassign(&self, client: &TrackerClient, session: u64, issue_id: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .unassign_issue(&issue_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::Unassigned { session, result });
        });
    }

    /// Spawn a task to attach a tag.
    pub fn spawn_add_tag(
        &self,
        client: &TrackerClient,
        session: u64,
        issue_id: String,
        tag: TagDto,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .add_tag(&issue_id, &tag)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::TagAdded { session, result });
        });
    }

    /// Spawn a task to fetch the open issue's tags.
    pub fn spawn_fetch_issue_tags(&self, client: &TrackerClient, session: u64, issue_id: String) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .issue_tags(&issue_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::IssueTagsFetched { session, result });
        });
    }

    /// Spawn a task to fetch the global tag palette.
    pub fn spawn_fetch_known_tags(&self, client: &TrackerClient, session: u64) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client.list_tags().await.map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::KnownTagsFetched { session, result });
        });
    }

    /// Spawn a task to detach a tag.
    pub fn spawn_remove_tag(
        &self,
        client: &TrackerClient,
        session: u64,
        issue_id: String,
        tag: TagDto,
    ) {
        let tx = self.tx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .remove_tag(&issue_id, &tag)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiMessage::TagRemoved { session, result });
        });
    }
}

/// Create a new task channel and spawner.
///
/// The receiver is polled in the main event loop; the spawner is handed
/// to anything that needs to kick off background work.
pub fn create_task_channel() -> (mpsc::UnboundedReceiver<ApiMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx))
}
