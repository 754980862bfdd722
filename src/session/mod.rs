//! The issue editing session.
//!
//! An [`IssueSession`] owns the lifecycle of one open issue: the
//! `baseline` snapshot (last known-persisted state), the `working`
//! snapshot (in-progress edits), the inline field editor, and the cached
//! user directory. All mutation methods are pure with respect to the
//! network: they update local state and return an *effect* describing
//! the request the caller should issue, which keeps the session fully
//! testable without a backend and lets the event loop own all I/O.
//!
//! Reconciliation methods (`apply_*`) fold backend responses back into
//! the snapshots; after each successful mutation the caller forwards the
//! reconciled view-model to the issue list through its update callback.

pub mod directory;
pub mod editor;

pub use directory::{Resolution, UserDirectory};
pub use editor::{CommitOutcome, EditField, EditState, FieldEditor};

use thiserror::Error;
use tracing::debug;

use crate::api::types::{
    CommentCreateDto, CommentDto, FieldUpdateDto, IssueCreateDto, IssueDto, TagDto,
};
use crate::model::{CommentView, IssueId, IssueView, Status, TagView};

/// Context handed to a session by the composing application.
///
/// Holds the active database name discovered at startup. Sessions never
/// read this from global state and never send it to the backend.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub database: Option<String>,
}

impl SessionContext {
    pub fn new(database: Option<String>) -> Self {
        Self { database }
    }
}

/// Validation failures caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Author required: no users available")]
    AuthorRequired,

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("User directory is still loading")]
    DirectoryNotLoaded,
}

/// What to persist when the session is saved or closed.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    /// Nothing changed; no network call, treated as success.
    None,
    /// Never-persisted issue: one create request.
    Create(IssueCreateDto),
    /// Persisted issue: one PATCH per changed field, independently.
    Update {
        id: IssueId,
        patches: Vec<FieldUpdateDto>,
    },
}

/// The request implied by a comment mutation, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentEffect {
    /// POST the new comment.
    Post {
        issue_id: IssueId,
        payload: CommentCreateDto,
    },
    /// PATCH an existing comment's text.
    Patch {
        issue_id: IssueId,
        comment_id: IssueId,
        index: usize,
        text: String,
    },
    /// DELETE an existing comment.
    Delete {
        issue_id: IssueId,
        comment_id: IssueId,
        index: usize,
    },
    /// Applied to local state only (the comment or issue has no server id).
    Local,
}

/// The request implied by an assignee commit, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignEffect {
    Assign { issue_id: IssueId, user: String },
    Unassign { issue_id: IssueId },
    /// Unsaved issue: the assignment exists only in the working copy.
    Local,
    /// Input resolved to the current assignee; nothing to do.
    Noop,
}

/// The request implied by a status change.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEffect {
    Patch {
        issue_id: IssueId,
        patch: FieldUpdateDto,
    },
    Local,
}

/// The request implied by a tag mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum TagEffect {
    Add { issue_id: IssueId, tag: TagDto },
    Remove { issue_id: IssueId, tag: TagDto },
    Local,
    /// Duplicate add or missing remove target; nothing changed.
    Noop,
}

/// The outcome of committing the open inline edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommit {
    Noop,
    /// Title or description changed in the working copy; persistence is
    /// deferred to save/close.
    FieldChanged(EditField),
    /// A comment body commit, with its immediate effect.
    Comment(CommentEffect),
    /// An assignee commit, with its immediate effect.
    Assignee(AssignEffect),
}

/// One open issue-editing session.
#[derive(Debug, Clone)]
pub struct IssueSession {
    context: SessionContext,
    baseline: IssueView,
    working: IssueView,
    editor: FieldEditor,
    directory: UserDirectory,
    /// Pre-edit assignee label, kept for rollback on persistence failure.
    assignee_restore: Option<String>,
}

impl IssueSession {
    /// Open a session over an existing (persisted or listed) issue.
    pub fn open(issue: IssueView, context: SessionContext) -> Self {
        Self {
            context,
            baseline: issue.clone(),
            working: issue,
            editor: FieldEditor::new(),
            directory: UserDirectory::new(),
            assignee_restore: None,
        }
    }

    /// Open a create session over a blank draft.
    pub fn create(context: SessionContext) -> Self {
        let draft = IssueView::draft(context.database.as_deref());
        Self::open(draft, context)
    }

    pub fn working(&self) -> &IssueView {
        &self.working
    }

    pub fn baseline(&self) -> &IssueView {
        &self.baseline
    }

    pub fn editor(&self) -> &FieldEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut FieldEditor {
        &mut self.editor
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut UserDirectory {
        &mut self.directory
    }

    /// `raw_id` presence is the sole create-vs-update discriminator.
    pub fn is_persisted(&self) -> bool {
        self.working.raw_id.is_some()
    }

    // ------------------------------------------------------------------
    // Inline editing
    // ------------------------------------------------------------------

    /// Begin an inline edit on `field`, seeding the buffer from the
    /// working copy. Any other open edit session is committed first.
    pub fn begin_edit(&mut self, field: EditField) -> Option<EditCommit> {
        let current = match field {
            EditField::Title => self.working.title.clone(),
            EditField::Description => self.working.description.clone(),
            EditField::Comment(i) => self
                .working
                .comments
                .get(i)
                .map(|c| c.text.clone())
                .unwrap_or_default(),
            EditField::Assignee => self.working.assigned_to.clone(),
        };

        let pending = self.editor.begin(field, &current)?;
        match pending {
            CommitOutcome::Committed {
                field: pending_field,
                value,
            } => Some(self.apply_commit(pending_field, value)),
            CommitOutcome::Rejected(_) | CommitOutcome::Noop => None,
        }
    }

    /// Commit the open inline edit.
    ///
    /// Title/description commits land in the working copy only; comment
    /// and assignee commits also return the request to issue.
    pub fn commit_edit(&mut self) -> Result<EditCommit, SessionError> {
        match self.editor.editing_field() {
            None => Ok(EditCommit::Noop),
            Some(EditField::Assignee) => self.commit_assignee(),
            Some(_) => match self.editor.commit() {
                CommitOutcome::Noop => Ok(EditCommit::Noop),
                CommitOutcome::Rejected(reason) => Err(SessionError::Validation(reason)),
                CommitOutcome::Committed { field, value } => Ok(self.apply_commit(field, value)),
            },
        }
    }

    /// Cancel the open inline edit, restoring the pre-edit value.
    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    fn apply_commit(&mut self, field: EditField, value: String) -> EditCommit {
        match field {
            EditField::Title => {
                self.working.title = value;
                EditCommit::FieldChanged(EditField::Title)
            }
            EditField::Description => {
                self.working.description = value;
                EditCommit::FieldChanged(EditField::Description)
            }
            EditField::Comment(index) => {
                let issue_id = self.working.raw_id.clone();
                let Some(comment) = self.working.comments.get_mut(index) else {
                    return EditCommit::Noop;
                };
                comment.text = value.clone();
                let comment_id = comment.id.clone();
                let effect = match (issue_id, comment_id) {
                    (Some(issue_id), Some(comment_id)) => CommentEffect::Patch {
                        issue_id,
                        comment_id,
                        index,
                        text: value,
                    },
                    // No server id yet: the edit lives in local state.
                    _ => CommentEffect::Local,
                };
                if matches!(effect, CommentEffect::Local) {
                    let text = self.working.comments[index].text.clone();
                    if let Some(base) = self.baseline.comments.get_mut(index) {
                        base.text = text;
                    }
                }
                EditCommit::Comment(effect)
            }
            // Assignee commits flow through commit_assignee.
            EditField::Assignee => EditCommit::Noop,
        }
    }

    // ------------------------------------------------------------------
    // Assignee resolution
    // ------------------------------------------------------------------

    fn commit_assignee(&mut self) -> Result<EditCommit, SessionError> {
        let input = self.editor.buffer().unwrap_or_default().to_string();

        if !input.trim().is_empty() && !self.directory.is_loaded() {
            // Keep the field editable until the directory arrives.
            return Err(SessionError::DirectoryNotLoaded);
        }

        match self.directory.resolve(&input) {
            Resolution::NotFound(name) => Err(SessionError::UserNotFound(name)),
            Resolution::Unassign => {
                self.editor.cancel();
                if self.working.assigned_to.is_empty() {
                    return Ok(EditCommit::Assignee(AssignEffect::Noop));
                }
                self.assignee_restore = Some(self.working.assigned_to.clone());
                self.working.assigned_to.clear();
                let effect = match &self.working.raw_id {
                    Some(id) => AssignEffect::Unassign {
                        issue_id: id.clone(),
                    },
                    None => {
                        self.baseline.assigned_to.clear();
                        AssignEffect::Local
                    }
                };
                Ok(EditCommit::Assignee(effect))
            }
            Resolution::Match(name) => {
                self.editor.cancel();
                if name == self.working.assigned_to {
                    return Ok(EditCommit::Assignee(AssignEffect::Noop));
                }
                self.assignee_restore = Some(self.working.assigned_to.clone());
                self.working.assigned_to = name.clone();
                let effect = match &self.working.raw_id {
                    Some(id) => AssignEffect::Assign {
                        issue_id: id.clone(),
                        user: name,
                    },
                    None => {
                        self.baseline.assigned_to = self.working.assigned_to.clone();
                        AssignEffect::Local
                    }
                };
                Ok(EditCommit::Assignee(effect))
            }
        }
    }

    /// Fold a successful assign/unassign into the baseline.
    pub fn apply_assignee_persisted(&mut self) -> &IssueView {
        self.baseline.assigned_to = self.working.assigned_to.clone();
        self.assignee_restore = None;
        &self.working
    }

    /// Restore the pre-edit assignee label after a persistence failure.
    ///
    /// This is the one place the error policy rolls working state back.
    pub fn revert_assignee(&mut self) {
        if let Some(previous) = self.assignee_restore.take() {
            self.working.assigned_to = previous;
        }
    }

    // ------------------------------------------------------------------
    // Save planning and reconciliation
    // ------------------------------------------------------------------

    /// Field-level diff between working and baseline, restricted to the
    /// deferred-persistence fields (title, description).
    pub fn diff(&self) -> Vec<FieldUpdateDto> {
        let mut patches = Vec::new();
        if self.working.title != self.baseline.title {
            patches.push(FieldUpdateDto::new("title", self.working.title.clone()));
        }
        if self.working.description != self.baseline.description {
            patches.push(FieldUpdateDto::new(
                "description",
                self.working.description.clone(),
            ));
        }
        patches
    }

    /// Plan what to persist on save/close. Pure: no network, no state
    /// change beyond author defaulting on the create path.
    pub fn save_action(&mut self) -> Result<SaveAction, SessionError> {
        match self.working.raw_id.clone() {
            None => {
                if self.working.title.trim().is_empty() {
                    return Err(SessionError::Validation("Title is required"));
                }
                if self.working.author.is_empty() {
                    match self.directory.first_user() {
                        Some(name) => self.working.author = name.to_string(),
                        None if self.directory.is_loaded() => {
                            return Err(SessionError::AuthorRequired)
                        }
                        None => return Err(SessionError::DirectoryNotLoaded),
                    }
                }
                Ok(SaveAction::Create(IssueCreateDto {
                    title: self.working.title.trim().to_string(),
                    description: self.working.description.clone(),
                    author_id: self.working.author.clone(),
                }))
            }
            Some(id) => {
                let patches = self.diff();
                if patches.is_empty() {
                    debug!("No changed fields; skipping update");
                    Ok(SaveAction::None)
                } else {
                    Ok(SaveAction::Update { id, patches })
                }
            }
        }
    }

    /// Fold a successful create response into both snapshots.
    ///
    /// The backend-assigned id, timestamps, and canonical status become
    /// the new baseline; local-only comments and tags (which the backend
    /// does not know yet) are retained.
    pub fn apply_created(&mut self, dto: &IssueDto) -> &IssueView {
        let mut reconciled = IssueView::from_dto(dto, self.context.database.as_deref());
        if reconciled.comments.is_empty() {
            reconciled.comments = self.working.comments.clone();
        }
        if reconciled.tags.is_empty() {
            reconciled.tags = self.working.tags.clone();
        }
        if reconciled.assigned_to.is_empty() {
            reconciled.assigned_to = self.working.assigned_to.clone();
        }
        self.baseline = reconciled.clone();
        self.working = reconciled;
        &self.working
    }

    /// Fold one successful field patch into the baseline. Fields are
    /// independent: a failed sibling patch leaves this one applied.
    pub fn apply_patched(&mut self, field: &str) -> &IssueView {
        match field {
            "title" => self.baseline.title = self.working.title.clone(),
            "description" => self.baseline.description = self.working.description.clone(),
            "status" => self.baseline.status = self.working.status.clone(),
            _ => debug!(field, "ignoring patch result for unknown field"),
        }
        &self.working
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// Stage a new comment.
    ///
    /// Persisted issues POST immediately (the local list grows when the
    /// backend echoes the comment back, id included); unsaved issues
    /// accumulate comments locally until the parent exists.
    pub fn add_comment(&mut self, author: &str, text: &str) -> Result<CommentEffect, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::Validation("Comment text cannot be empty"));
        }
        let author = if author.trim().is_empty() {
            match self.directory.first_user() {
                Some(name) => name.to_string(),
                None => return Err(SessionError::AuthorRequired),
            }
        } else {
            author.trim().to_string()
        };

        match self.working.raw_id.clone() {
            Some(issue_id) => Ok(CommentEffect::Post {
                issue_id,
                payload: CommentCreateDto {
                    text: trimmed.to_string(),
                    author_id: author,
                },
            }),
            None => {
                let comment = CommentView::local(author, trimmed);
                self.working.comments.push(comment.clone());
                self.baseline.comments.push(comment);
                Ok(CommentEffect::Local)
            }
        }
    }

    /// Replace both snapshots' comment lists from a comments fetch.
    ///
    /// Detail opens fetch the comment list lazily; list responses do not
    /// carry comments.
    pub fn apply_comments_loaded(&mut self, dtos: &[CommentDto]) -> &IssueView {
        let comments: Vec<CommentView> = dtos.iter().map(CommentView::from_dto).collect();
        self.working.comments = comments.clone();
        self.baseline.comments = comments;
        &self.working
    }

    /// Fold a successful comment POST into both snapshots.
    pub fn apply_comment_added(&mut self, dto: &CommentDto) -> &IssueView {
        let comment = CommentView::from_dto(dto);
        self.working.comments.push(comment.clone());
        self.baseline.comments.push(comment);
        &self.working
    }

    /// Fold a successful comment PATCH into the baseline.
    pub fn apply_comment_updated(&mut self, index: usize) -> &IssueView {
        if let (Some(base), Some(work)) = (
            self.baseline.comments.get_mut(index),
            self.working.comments.get(index),
        ) {
            base.text = work.text.clone();
        }
        &self.working
    }

    /// Stage a comment deletion.
    ///
    /// Comments with a server id (and a persisted parent) DELETE; id-less
    /// comments are removed from local state by positional index with no
    /// network call.
    pub fn delete_comment(&mut self, index: usize) -> Option<CommentEffect> {
        let comment = self.working.comments.get(index)?;
        match (self.working.raw_id.clone(), comment.id.clone()) {
            (Some(issue_id), Some(comment_id)) => Some(CommentEffect::Delete {
                issue_id,
                comment_id,
                index,
            }),
            _ => {
                self.working.comments.remove(index);
                if index < self.baseline.comments.len() {
                    self.baseline.comments.remove(index);
                }
                Some(CommentEffect::Local)
            }
        }
    }

    /// Fold a successful comment DELETE into both snapshots.
    ///
    /// Matches by id when present (indexes may have drifted), falling
    /// back to the captured index.
    pub fn apply_comment_deleted(&mut self, comment_id: &IssueId, index: usize) -> &IssueView {
        remove_comment(&mut self.working.comments, comment_id, index);
        remove_comment(&mut self.baseline.comments, comment_id, index);
        &self.working
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Set the status. Persisted issues PATCH immediately; drafts keep
    /// the change local until creation.
    pub fn set_status(&mut self, status: Status) -> StatusEffect {
        self.working.status = status;
        match self.working.raw_id.clone() {
            Some(issue_id) => StatusEffect::Patch {
                issue_id,
                patch: FieldUpdateDto::new("status", self.working.status.label()),
            },
            None => {
                self.baseline.status = self.working.status.clone();
                StatusEffect::Local
            }
        }
    }

    /// Advance to the next canonical status.
    pub fn cycle_status(&mut self) -> StatusEffect {
        self.set_status(self.working.status.next())
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// Attach a tag. Duplicate labels are a no-op.
    pub fn add_tag(&mut self, label: &str, color: Option<&str>) -> TagEffect {
        let label = label.trim();
        if label.is_empty()
            || self
                .working
                .tags
                .iter()
                .any(|t| t.label.eq_ignore_ascii_case(label))
        {
            return TagEffect::Noop;
        }

        let tag = TagView {
            label: label.to_string(),
            color: color.unwrap_or(crate::model::DEFAULT_TAG_COLOR).to_string(),
        };
        self.working.tags.push(tag.clone());
        match self.working.raw_id.clone() {
            Some(issue_id) => TagEffect::Add {
                issue_id,
                tag: tag.to_dto(),
            },
            None => {
                self.baseline.tags = self.working.tags.clone();
                TagEffect::Local
            }
        }
    }

    /// Detach a tag by label.
    pub fn remove_tag(&mut self, label: &str) -> TagEffect {
        let Some(position) = self
            .working
            .tags
            .iter()
            .position(|t| t.label.eq_ignore_ascii_case(label.trim()))
        else {
            return TagEffect::Noop;
        };

        let tag = self.working.tags.remove(position);
        match self.working.raw_id.clone() {
            Some(issue_id) => TagEffect::Remove {
                issue_id,
                tag: tag.to_dto(),
            },
            None => {
                self.baseline.tags = self.working.tags.clone();
                TagEffect::Local
            }
        }
    }

    /// Fold a successful tag mutation into the baseline.
    pub fn apply_tags_persisted(&mut self) -> &IssueView {
        self.baseline.tags = self.working.tags.clone();
        &self.working
    }

    /// Replace both snapshots' tag lists from the tags sub-resource.
    ///
    /// Issue list responses do not carry tags; detail opens fetch them
    /// lazily.
    pub fn apply_tags_loaded(&mut self, dtos: &[TagDto]) -> &IssueView {
        let tags: Vec<TagView> = dtos.iter().map(TagView::from_dto).collect();
        self.working.tags = tags.clone();
        self.baseline.tags = tags;
        &self.working
    }
}

fn remove_comment(comments: &mut Vec<CommentView>, comment_id: &IssueId, index: usize) {
    if let Some(position) = comments
        .iter()
        .position(|c| c.id.as_ref() == Some(comment_id))
    {
        comments.remove(position);
    } else if index < comments.len() && comments[index].id.is_none() {
        comments.remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::UserDto;

    fn user(name: &str) -> UserDto {
        UserDto {
            name: Some(name.to_string()),
            role: None,
        }
    }

    fn persisted_issue() -> IssueView {
        let dto: IssueDto = serde_json::from_str(
            r#"{
                "id": 1024,
                "title": "A",
                "description": "B",
                "author_id": "coder96",
                "status": "In Progress",
                "created_at": 1700000000
            }"#,
        )
        .unwrap();
        IssueView::from_dto(&dto, Some("main"))
    }

    fn open_session() -> IssueSession {
        IssueSession::open(
            persisted_issue(),
            SessionContext::new(Some("main".to_string())),
        )
    }

    #[test]
    fn test_diff_only_changed_fields() {
        // baseline {title: "A", description: "B"}, working description -> "C"
        let mut session = open_session();
        session.begin_edit(EditField::Description);
        session.editor_mut().set_buffer("C");
        session.commit_edit().unwrap();

        let action = session.save_action().unwrap();
        match action {
            SaveAction::Update { patches, .. } => {
                assert_eq!(patches.len(), 1);
                assert_eq!(patches[0], FieldUpdateDto::new("description", "C"));
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_edit_session_yields_no_save() {
        let mut session = open_session();
        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("tentative rename");
        session.cancel_edit();

        assert_eq!(session.save_action().unwrap(), SaveAction::None);
    }

    #[test]
    fn test_noop_commit_yields_no_save() {
        let mut session = open_session();
        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("A");
        assert_eq!(session.commit_edit().unwrap(), EditCommit::Noop);

        assert_eq!(session.save_action().unwrap(), SaveAction::None);
    }

    #[test]
    fn test_create_flow_plans_single_create() {
        let mut session = IssueSession::create(SessionContext::new(Some("main".to_string())));
        session.directory_mut().populate(vec![user("alice"), user("bob")]);

        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("Fix bug");
        session.commit_edit().unwrap();

        let action = session.save_action().unwrap();
        match action {
            SaveAction::Create(payload) => {
                assert_eq!(payload.title, "Fix bug");
                // Author defaults to the first directory entry.
                assert_eq!(payload.author_id, "alice");
            }
            other => panic!("Expected Create, got {:?}", other),
        }
    }

    #[test]
    fn test_create_reconciliation_defines_raw_id() {
        let mut session = IssueSession::create(SessionContext::new(Some("main".to_string())));
        session.directory_mut().populate(vec![user("alice")]);
        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("Fix bug");
        session.commit_edit().unwrap();

        assert!(!session.is_persisted());

        let created: IssueDto = serde_json::from_str(
            r#"{"id": 77, "title": "Fix bug", "description": "", "author_id": "alice", "created_at": 1700000000}"#,
        )
        .unwrap();
        let reconciled = session.apply_created(&created);
        assert_eq!(reconciled.raw_id, Some(IssueId::Number(77)));
        assert_eq!(reconciled.display_id(), "#77");
        assert!(session.is_persisted());
        assert_eq!(session.baseline().title, "Fix bug");
    }

    #[test]
    fn test_create_requires_title() {
        let mut session = IssueSession::create(SessionContext::default());
        session.directory_mut().populate(vec![user("alice")]);

        assert_eq!(
            session.save_action(),
            Err(SessionError::Validation("Title is required"))
        );
    }

    #[test]
    fn test_create_blocked_by_empty_directory() {
        let mut session = IssueSession::create(SessionContext::default());
        session.directory_mut().populate(Vec::new());
        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("Fix bug");
        session.commit_edit().unwrap();

        assert_eq!(session.save_action(), Err(SessionError::AuthorRequired));
    }

    #[test]
    fn test_assignee_case_insensitive_match_uses_canonical_casing() {
        let mut session = open_session();
        session.directory_mut().populate(vec![user("Alice"), user("bob")]);

        session.begin_edit(EditField::Assignee);
        session.editor_mut().set_buffer("alice");
        let commit = session.commit_edit().unwrap();

        match commit {
            EditCommit::Assignee(AssignEffect::Assign { user, .. }) => assert_eq!(user, "Alice"),
            other => panic!("Expected Assign, got {:?}", other),
        }
        assert_eq!(session.working().assigned_to, "Alice");
        assert_eq!(session.working().assignee_label(), "Alice");
    }

    #[test]
    fn test_assignee_unknown_user_rejected_and_stays_editing() {
        let mut session = open_session();
        session.directory_mut().populate(vec![user("Alice"), user("bob")]);

        session.begin_edit(EditField::Assignee);
        session.editor_mut().set_buffer("carol");
        let err = session.commit_edit().unwrap_err();

        assert_eq!(err, SessionError::UserNotFound("carol".to_string()));
        assert!(session.editor().is_editing());
        assert_eq!(session.working().assigned_to, "");
    }

    #[test]
    fn test_assignee_empty_input_unassigns() {
        let mut issue = persisted_issue();
        issue.assigned_to = "Alice".to_string();
        let mut session = IssueSession::open(issue, SessionContext::default());
        session.directory_mut().populate(vec![user("Alice")]);

        session.begin_edit(EditField::Assignee);
        session.editor_mut().set_buffer("");
        let commit = session.commit_edit().unwrap();

        assert!(matches!(
            commit,
            EditCommit::Assignee(AssignEffect::Unassign { .. })
        ));
        assert_eq!(session.working().assigned_to, "");
    }

    #[test]
    fn test_assignee_same_user_is_noop() {
        let mut issue = persisted_issue();
        issue.assigned_to = "Alice".to_string();
        let mut session = IssueSession::open(issue, SessionContext::default());
        session.directory_mut().populate(vec![user("Alice")]);

        session.begin_edit(EditField::Assignee);
        session.editor_mut().set_buffer("ALICE");
        let commit = session.commit_edit().unwrap();

        assert_eq!(commit, EditCommit::Assignee(AssignEffect::Noop));
    }

    #[test]
    fn test_assignee_failure_restores_pre_edit_label() {
        let mut issue = persisted_issue();
        issue.assigned_to = "Alice".to_string();
        let mut session = IssueSession::open(issue, SessionContext::default());
        session.directory_mut().populate(vec![user("Alice"), user("Bob")]);

        session.begin_edit(EditField::Assignee);
        session.editor_mut().set_buffer("Bob");
        session.commit_edit().unwrap();
        assert_eq!(session.working().assigned_to, "Bob");

        // Backend rejected the assignment.
        session.revert_assignee();
        assert_eq!(session.working().assigned_to, "Alice");
    }

    #[test]
    fn test_comment_without_id_deleted_locally_by_index() {
        let mut session = open_session();
        session.working.comments = vec![
            CommentView {
                id: Some(IssueId::Number(1)),
                author: "a".to_string(),
                date: "2025-01-01".to_string(),
                text: "first".to_string(),
            },
            CommentView::local("b", "second"),
            CommentView::local("c", "third"),
        ];
        session.baseline.comments = session.working.comments.clone();

        let effect = session.delete_comment(1).unwrap();
        assert_eq!(effect, CommentEffect::Local);
        // Exactly the comment at index 1 is gone, no other.
        let texts: Vec<&str> = session
            .working()
            .comments
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "third"]);
    }

    #[test]
    fn test_comment_with_id_requires_delete_request() {
        let mut session = open_session();
        session.working.comments = vec![CommentView {
            id: Some(IssueId::Number(5)),
            author: "a".to_string(),
            date: "2025-01-01".to_string(),
            text: "first".to_string(),
        }];
        session.baseline.comments = session.working.comments.clone();

        let effect = session.delete_comment(0).unwrap();
        assert_eq!(
            effect,
            CommentEffect::Delete {
                issue_id: IssueId::Number(1024),
                comment_id: IssueId::Number(5),
                index: 0,
            }
        );
        // Removal waits for the backend's confirmation.
        assert_eq!(session.working().comments.len(), 1);

        session.apply_comment_deleted(&IssueId::Number(5), 0);
        assert!(session.working().comments.is_empty());
        assert!(session.baseline().comments.is_empty());
    }

    #[test]
    fn test_add_comment_on_persisted_issue_posts() {
        let mut session = open_session();
        session.directory_mut().populate(vec![user("alice")]);

        let effect = session.add_comment("", "Working on this now").unwrap();
        match effect {
            CommentEffect::Post { issue_id, payload } => {
                assert_eq!(issue_id, IssueId::Number(1024));
                assert_eq!(payload.text, "Working on this now");
                assert_eq!(payload.author_id, "alice");
            }
            other => panic!("Expected Post, got {:?}", other),
        }
        // Local list grows only on reconciliation.
        assert!(session.working().comments.is_empty());

        let dto: CommentDto = serde_json::from_str(
            r#"{"id": 9, "author_id": "alice", "text": "Working on this now", "timestamp": 1700000000}"#,
        )
        .unwrap();
        session.apply_comment_added(&dto);
        assert_eq!(session.working().comments.len(), 1);
        assert_eq!(session.working().comments[0].id, Some(IssueId::Number(9)));
    }

    #[test]
    fn test_add_comment_on_draft_stays_local() {
        let mut session = IssueSession::create(SessionContext::default());
        session.directory_mut().populate(vec![user("alice")]);

        let effect = session.add_comment("alice", "drafting").unwrap();
        assert_eq!(effect, CommentEffect::Local);
        assert_eq!(session.working().comments.len(), 1);
        assert!(session.working().comments[0].id.is_none());
    }

    #[test]
    fn test_add_comment_empty_text_rejected() {
        let mut session = open_session();
        assert_eq!(
            session.add_comment("alice", "   "),
            Err(SessionError::Validation("Comment text cannot be empty"))
        );
    }

    #[test]
    fn test_edit_persisted_comment_patches() {
        let mut session = open_session();
        session.working.comments = vec![CommentView {
            id: Some(IssueId::Number(5)),
            author: "a".to_string(),
            date: "2025-01-01".to_string(),
            text: "old".to_string(),
        }];
        session.baseline.comments = session.working.comments.clone();

        session.begin_edit(EditField::Comment(0));
        session.editor_mut().set_buffer("new text");
        let commit = session.commit_edit().unwrap();

        match commit {
            EditCommit::Comment(CommentEffect::Patch {
                comment_id, text, ..
            }) => {
                assert_eq!(comment_id, IssueId::Number(5));
                assert_eq!(text, "new text");
            }
            other => panic!("Expected Patch, got {:?}", other),
        }
        assert_eq!(session.working().comments[0].text, "new text");
        // Baseline catches up only on reconciliation.
        assert_eq!(session.baseline().comments[0].text, "old");
        session.apply_comment_updated(0);
        assert_eq!(session.baseline().comments[0].text, "new text");
    }

    #[test]
    fn test_status_cycle_patches_persisted_issue() {
        let mut session = open_session();
        let effect = session.cycle_status();
        match effect {
            StatusEffect::Patch { patch, .. } => {
                assert_eq!(patch, FieldUpdateDto::new("status", "Done"));
            }
            StatusEffect::Local => panic!("Expected Patch"),
        }
        assert_eq!(session.working().status, Status::Done);
    }

    #[test]
    fn test_status_on_draft_is_local() {
        let mut session = IssueSession::create(SessionContext::default());
        assert_eq!(session.set_status(Status::InProgress), StatusEffect::Local);
        assert_eq!(session.working().status, Status::InProgress);
    }

    #[test]
    fn test_add_tag_deduplicates() {
        let mut session = open_session();
        let first = session.add_tag("Bug", Some("#f52781"));
        assert!(matches!(first, TagEffect::Add { .. }));
        assert_eq!(session.add_tag("bug", None), TagEffect::Noop);
        assert_eq!(session.working().tags.len(), 1);
    }

    #[test]
    fn test_remove_missing_tag_is_noop() {
        let mut session = open_session();
        assert_eq!(session.remove_tag("Ghost"), TagEffect::Noop);
    }

    #[test]
    fn test_begin_edit_auto_commits_previous_field() {
        let mut session = open_session();
        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("New title");

        let pending = session.begin_edit(EditField::Description);
        assert_eq!(pending, Some(EditCommit::FieldChanged(EditField::Title)));
        assert_eq!(session.working().title, "New title");
        assert_eq!(session.editor().editing_field(), Some(EditField::Description));
    }

    #[test]
    fn test_empty_title_commit_keeps_editing() {
        let mut session = open_session();
        session.begin_edit(EditField::Title);
        session.editor_mut().set_buffer("  ");

        let err = session.commit_edit().unwrap_err();
        assert_eq!(err, SessionError::Validation("Title cannot be empty"));
        assert!(session.editor().is_editing());
        assert_eq!(session.working().title, "A");
    }
}
