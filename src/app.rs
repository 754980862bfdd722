//! Main application state and event loop.
//!
//! This module wires the views, the session, and the background task
//! channel together in a TEA-style loop: render, handle one terminal
//! event, drain API messages, repeat. All backend I/O happens in spawned
//! tasks (`crate::tasks`); the loop itself never blocks on the network.

use ratatui::{backend::Backend, layout::Rect, Frame, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::api::TrackerClient;
use crate::config::{Config, Profile};
use crate::error::{AppError, Result};
use crate::events::{Event, EventHandler};
use crate::model::{IssueId, IssueView};
use crate::session::{
    AssignEffect, CommentEffect, IssueSession, SaveAction, SessionContext, StatusEffect, TagEffect,
};
use crate::tasks::{ApiMessage, TaskSpawner};
use crate::ui::{
    DetailAction, DetailView, ListAction, ListView, LoadingIndicator, NotificationManager,
};

/// The current view/screen state of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Connecting and loading initial data.
    #[default]
    Loading,
    /// Displaying the list of issues.
    IssueList,
    /// Displaying details of a single issue.
    IssueDetail,
}

/// The main application struct that holds all state.
pub struct App {
    /// The current view state.
    state: AppState,
    /// Whether the application should quit.
    should_quit: bool,
    /// The issue list view.
    list_view: ListView,
    /// The issue detail view.
    detail_view: DetailView,
    /// Toast notifications.
    notifications: NotificationManager,
    /// Global loading indicator.
    loading: LoadingIndicator,
    /// Application configuration.
    #[allow(dead_code)]
    config: Config,
    /// The connected client, once the connect task reports in.
    client: Option<TrackerClient>,
    /// Active database name discovered at startup.
    database: Option<String>,
    /// Task spawner for background API calls.
    tasks: TaskSpawner,
    /// Monotonic generation for detail sessions; results stamped with an
    /// older generation are dropped.
    session_counter: u64,
    /// Outstanding field patches for the current save.
    pending_patches: usize,
    /// Last error seen during the current save (best effort policy).
    last_patch_error: Option<String>,
    /// Issue id to look up once the initial load completes (`--issue`).
    initial_lookup: Option<String>,
}

impl App {
    /// Create a new application instance and kick off the connection.
    pub fn new(config: Config, profile: Profile, tasks: TaskSpawner) -> Self {
        debug!("Creating application instance");

        let mut list_view = ListView::new();
        list_view.set_loading(true);
        list_view.set_profile_name(Some(profile.name.clone()));

        let mut loading = LoadingIndicator::with_message("Connecting to tracker...");
        loading.start();

        tasks.spawn_connect(profile);

        Self {
            state: AppState::Loading,
            should_quit: false,
            list_view,
            detail_view: DetailView::new(),
            notifications: NotificationManager::new(),
            loading,
            config,
            client: None,
            database: None,
            tasks,
            session_counter: 0,
            pending_patches: 0,
            last_patch_error: None,
            initial_lookup: None,
        }
    }

    /// Queue a direct issue lookup to run after the initial load.
    pub fn set_initial_lookup(&mut self, id: String) {
        self.initial_lookup = Some(id);
    }

    /// Run the event loop until quit.
    pub async fn run<B: Backend>(
        mut self,
        terminal: &mut Terminal<B>,
        mut rx: UnboundedReceiver<ApiMessage>,
        events: EventHandler,
    ) -> Result<()> {
        while !self.should_quit {
            terminal
                .draw(|frame| self.render(frame))
                .map_err(AppError::Io)?;

            while let Ok(message) = rx.try_recv() {
                self.handle_api_message(message);
            }

            match events.next().map_err(AppError::Io)? {
                Event::Tick => {
                    self.notifications.tick();
                    self.loading.tick();
                }
                Event::Key(key) => self.handle_key(key),
                Event::Resize(_, _) => {}
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input handling
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        match self.state {
            AppState::Loading => {
                if key.code == crossterm::event::KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::IssueList => {
                if let Some(action) = self.list_view.handle_input(key) {
                    self.handle_list_action(action);
                }
            }
            AppState::IssueDetail => {
                if let Some(action) = self.detail_view.handle_input(key) {
                    self.handle_detail_action(action);
                }
            }
        }
    }

    fn handle_list_action(&mut self, action: ListAction) {
        match action {
            ListAction::Quit => self.should_quit = true,
            ListAction::Refresh => {
                if let Some(client) = &self.client {
                    self.list_view.set_loading(true);
                    self.tasks.spawn_fetch_issues(client);
                }
            }
            ListAction::Open(issue) => self.open_detail(issue),
            ListAction::Create => self.open_create(),
            ListAction::Delete(issue) => {
                let (Some(client), Some(id)) = (&self.client, issue.raw_id.as_ref()) else {
                    return;
                };
                self.tasks.spawn_delete_issue(client, id.to_string());
            }
            ListAction::Lookup(id) => {
                if let Some(client) = &self.client {
                    self.loading.start_with_message(format!("Looking up #{}...", id));
                    self.tasks.spawn_fetch_issue(client, id);
                }
            }
        }
    }

    fn handle_detail_action(&mut self, action: DetailAction) {
        match action {
            DetailAction::Notify(notification) => self.notifications.push(notification),
            DetailAction::Discard => {
                // Explicit cancel: no network call, no list callback.
                debug!("Discarding working copy");
                self.close_detail();
            }
            DetailAction::Save(SaveAction::None) => {
                // Empty diff: zero network calls, treated as success.
                debug!("No-op save, closing detail view");
                self.close_detail();
            }
            DetailAction::Save(SaveAction::Create(payload)) => {
                let Some(client) = &self.client else { return };
                self.detail_view.set_save_pending(true);
                self.tasks
                    .spawn_create_issue(client, self.detail_view.generation(), payload);
            }
            DetailAction::Save(SaveAction::Update { id, patches }) => {
                let Some(client) = &self.client else { return };
                self.detail_view.set_save_pending(true);
                self.pending_patches = patches.len();
                self.last_patch_error = None;
                let generation = self.detail_view.generation();
                for patch in patches {
                    self.tasks
                        .spawn_patch_field(client, generation, id.to_string(), patch);
                }
            }
            DetailAction::Comment(effect) => self.execute_comment_effect(effect),
            DetailAction::Assign(effect) => self.execute_assign_effect(effect),
            DetailAction::Status(StatusEffect::Patch { issue_id, patch }) => {
                let Some(client) = &self.client else { return };
                self.detail_view.set_status_pending(true);
                self.tasks.spawn_patch_field(
                    client,
                    self.detail_view.generation(),
                    issue_id.to_string(),
                    patch,
                );
            }
            DetailAction::Status(StatusEffect::Local) => {}
            DetailAction::Tag(effect) => self.execute_tag_effect(effect),
        }
    }

    fn execute_comment_effect(&mut self, effect: CommentEffect) {
        let Some(client) = &self.client else { return };
        let generation = self.detail_view.generation();
        match effect {
            CommentEffect::Post { issue_id, payload } => {
                self.detail_view.set_comment_pending(true);
                self.tasks
                    .spawn_add_comment(client, generation, issue_id.to_string(), payload);
            }
            CommentEffect::Patch {
                issue_id,
                comment_id,
                index,
                text,
            } => {
                self.detail_view.set_comment_pending(true);
                self.tasks.spawn_update_comment(
                    client,
                    generation,
                    issue_id.to_string(),
                    comment_id.to_string(),
                    index,
                    text,
                );
            }
            CommentEffect::Delete {
                issue_id,
                comment_id,
                index,
            } => {
                self.detail_view.set_comment_pending(true);
                self.tasks.spawn_delete_comment(
                    client,
                    generation,
                    issue_id.to_string(),
                    comment_id,
                    index,
                );
            }
            CommentEffect::Local => {}
        }
    }

    fn execute_assign_effect(&mut self, effect: AssignEffect) {
        let Some(client) = &self.client else { return };
        let generation = self.detail_view.generation();
        match effect {
            AssignEffect::Assign { issue_id, user } => {
                self.detail_view.set_assign_pending(true);
                self.tasks.spawn_assign(client, generation, user, issue_id);
            }
            AssignEffect::Unassign { issue_id } => {
                self.detail_view.set_assign_pending(true);
                self.tasks
                    .spawn_unassign(client, generation, issue_id.to_string());
            }
            AssignEffect::Local | AssignEffect::Noop => {}
        }
    }

    fn execute_tag_effect(&mut self, effect: TagEffect) {
        let Some(client) = &self.client else { return };
        let generation = self.detail_view.generation();
        match effect {
            TagEffect::Add { issue_id, tag } => {
                self.detail_view.set_tag_pending(true);
                self.tasks
                    .spawn_add_tag(client, generation, issue_id.to_string(), tag);
            }
            TagEffect::Remove { issue_id, tag } => {
                self.detail_view.set_tag_pending(true);
                self.tasks
                    .spawn_remove_tag(client, generation, issue_id.to_string(), tag);
            }
            TagEffect::Local | TagEffect::Noop => {}
        }
    }

    // ------------------------------------------------------------------
    // API message handling
    // ------------------------------------------------------------------

    fn handle_api_message(&mut self, message: ApiMessage) {
        match message {
            ApiMessage::ClientConnected(Ok((client, database))) => {
                info!(database = ?database, "Connected to tracker");
                self.list_view.set_database(database.clone());
                self.loading.start_with_message("Loading issues...");
                self.tasks.spawn_fetch_issues(&client);
                self.client = Some(client);
                self.database = database;
            }
            ApiMessage::ClientConnected(Err(e)) => {
                warn!(error = %e, "Connection failed");
                self.loading.stop();
                self.state = AppState::IssueList;
                self.list_view.set_loading(false);
                self.notifications.error(e);
            }
            ApiMessage::IssuesFetched(result) => {
                self.loading.stop();
                if self.state == AppState::Loading {
                    self.state = AppState::IssueList;
                }
                match result {
                    Ok(dtos) => {
                        let database = self.database.as_deref();
                        let issues = dtos
                            .iter()
                            .map(|dto| IssueView::from_dto(dto, database))
                            .collect();
                        self.list_view.set_issues(issues);
                        if let Some(id) = self.initial_lookup.take() {
                            self.handle_list_action(ListAction::Lookup(id));
                        }
                    }
                    Err(e) => {
                        self.list_view.set_loading(false);
                        self.notifications.error(e);
                    }
                }
            }
            ApiMessage::IssueFetched { id, result } => {
                self.loading.stop();
                match result {
                    Ok(dto) => {
                        let issue = IssueView::from_dto(&dto, self.database.as_deref());
                        self.open_detail(issue);
                    }
                    // Not-found is already phrased distinctly by the client.
                    Err(e) => {
                        debug!(id, "Lookup failed");
                        self.notifications.error(e);
                    }
                }
            }
            ApiMessage::IssueCreated { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                self.detail_view.set_save_pending(false);
                match result {
                    Ok(dto) => {
                        let reconciled = self
                            .detail_view
                            .session_mut()
                            .map(|s| s.apply_created(&dto).clone());
                        if let Some(issue) = reconciled {
                            self.notify_updated(issue);
                        }
                        self.notifications.success("Issue created");
                        self.close_detail();
                    }
                    // Failure keeps the modal open; nothing was applied.
                    Err(e) => self.notifications.error(e),
                }
            }
            ApiMessage::IssueFieldPatched {
                session,
                field,
                result,
            } => {
                if !self.session_active(session) {
                    return;
                }
                if field == "status" {
                    self.detail_view.set_status_pending(false);
                    match result {
                        Ok(()) => {
                            let reconciled = self
                                .detail_view
                                .session_mut()
                                .map(|s| s.apply_patched("status").clone());
                            if let Some(issue) = reconciled {
                                self.notify_updated(issue);
                            }
                            self.notifications.success("Status updated");
                        }
                        Err(e) => self.notifications.error(e),
                    }
                } else {
                    self.finish_save_patch(&field, result);
                }
            }
            ApiMessage::IssueDeleted { id, result } => match result {
                Ok(()) => {
                    if let Some(parsed) = IssueId::parse(&id) {
                        self.list_view.remove(&parsed);
                    }
                    self.notifications.success(format!("Issue #{} deleted", id));
                }
                Err(e) => self.notifications.error(e),
            },
            ApiMessage::CommentsFetched { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                match result {
                    Ok(dtos) => {
                        if let Some(s) = self.detail_view.session_mut() {
                            s.apply_comments_loaded(&dtos);
                        }
                        self.detail_view.clamp_cursors();
                    }
                    Err(e) => self.notifications.error(e),
                }
            }
            ApiMessage::CommentAdded { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                self.detail_view.set_comment_pending(false);
                match result {
                    Ok(dto) => {
                        let reconciled = self
                            .detail_view
                            .session_mut()
                            .map(|s| s.apply_comment_added(&dto).clone());
                        if let Some(issue) = reconciled {
                            self.notify_updated(issue);
                        }
                        self.notifications.success("Comment added");
                    }
                    Err(e) => self.notifications.error(e),
                }
            }
            ApiMessage::CommentUpdated {
                session,
                index,
                result,
            } => {
                if !self.session_active(session) {
                    return;
                }
                self.detail_view.set_comment_pending(false);
                match result {
                    Ok(()) => {
                        let reconciled = self
                            .detail_view
                            .session_mut()
                            .map(|s| s.apply_comment_updated(index).clone());
                        if let Some(issue) = reconciled {
                            self.notify_updated(issue);
                        }
                        self.notifications.success("Comment updated");
                    }
                    // Working keeps the edit; the user may retry.
                    Err(e) => self.notifications.error(e),
                }
            }
            ApiMessage::CommentDeleted {
                session,
                comment_id,
                index,
                result,
            } => {
                if !self.session_active(session) {
                    return;
                }
                self.detail_view.set_comment_pending(false);
                match result {
                    Ok(()) => {
                        let reconciled = self
                            .detail_view
                            .session_mut()
                            .map(|s| s.apply_comment_deleted(&comment_id, index).clone());
                        self.detail_view.clamp_cursors();
                        if let Some(issue) = reconciled {
                            self.notify_updated(issue);
                        }
                        self.notifications.success("Comment deleted");
                    }
                    Err(e) => self.notifications.error(e),
                }
            }
            ApiMessage::UsersFetched { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                match result {
                    // First population wins; repeats are dropped by the cache.
                    Ok(users) => {
                        if let Some(s) = self.detail_view.session_mut() {
                            s.directory_mut().populate(users);
                        }
                    }
                    Err(e) => self.notifications.warning(format!("Could not load users: {}", e)),
                }
            }
            ApiMessage::Assigned { session, result } | ApiMessage::Unassigned { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                self.detail_view.set_assign_pending(false);
                match result {
                    Ok(()) => {
                        let reconciled = self
                            .detail_view
                            .session_mut()
                            .map(|s| s.apply_assignee_persisted().clone());
                        if let Some(issue) = reconciled {
                            let label = issue.assignee_label().to_string();
                            self.notify_updated(issue);
                            self.notifications.success(format!("Assignees: {}", label));
                        }
                    }
                    Err(e) => {
                        // The one rollback in the error policy: restore the
                        // pre-edit assignee label.
                        if let Some(s) = self.detail_view.session_mut() {
                            s.revert_assignee();
                        }
                        self.notifications.error(e);
                    }
                }
            }
            ApiMessage::IssueTagsFetched { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                match result {
                    Ok(dtos) => {
                        if let Some(s) = self.detail_view.session_mut() {
                            s.apply_tags_loaded(&dtos);
                        }
                        self.detail_view.clamp_cursors();
                    }
                    Err(e) => self.notifications.warning(format!("Could not load tags: {}", e)),
                }
            }
            ApiMessage::KnownTagsFetched { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                match result {
                    Ok(dtos) => {
                        let tags = dtos.iter().map(crate::model::TagView::from_dto).collect();
                        self.detail_view.set_known_tags(tags);
                    }
                    // Palette lookup is best effort; new tags fall back to
                    // the default color.
                    Err(e) => debug!(error = %e, "Tag palette fetch failed"),
                }
            }
            ApiMessage::TagAdded { session, result } | ApiMessage::TagRemoved { session, result } => {
                if !self.session_active(session) {
                    return;
                }
                self.detail_view.set_tag_pending(false);
                match result {
                    Ok(()) => {
                        let reconciled = self
                            .detail_view
                            .session_mut()
                            .map(|s| s.apply_tags_persisted().clone());
                        self.detail_view.clamp_cursors();
                        if let Some(issue) = reconciled {
                            self.notify_updated(issue);
                        }
                        self.notifications.success("Tags updated");
                    }
                    Err(e) => self.notifications.error(e),
                }
            }
        }
    }

    /// Bookkeeping for the per-field save fan-out: apply successes to the
    /// baseline as they land, remember the last failure, and settle when
    /// the final patch reports in.
    fn finish_save_patch(&mut self, field: &str, result: std::result::Result<(), String>) {
        if self.pending_patches > 0 {
            self.pending_patches -= 1;
        }
        match result {
            Ok(()) => {
                if let Some(s) = self.detail_view.session_mut() {
                    s.apply_patched(field);
                }
            }
            Err(e) => self.last_patch_error = Some(e),
        }

        if self.pending_patches == 0 {
            self.detail_view.set_save_pending(false);
            match self.last_patch_error.take() {
                None => {
                    let reconciled = self
                        .detail_view
                        .session()
                        .map(|s| s.working().clone());
                    if let Some(issue) = reconciled {
                        self.notify_updated(issue);
                    }
                    self.notifications.success("Issue updated");
                    self.close_detail();
                }
                // Best effort: fields that succeeded stay persisted; the
                // modal stays open so the user can retry the rest.
                Some(e) => self.notifications.error(e),
            }
        }
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    fn open_detail(&mut self, issue: IssueView) {
        let context = SessionContext::new(self.database.clone());
        let persisted_id = issue.raw_id.clone();
        let needs_comments = issue.comments.is_empty();
        let needs_tags = issue.tags.is_empty();
        let session = IssueSession::open(issue, context);

        self.session_counter += 1;
        self.detail_view.open(session, self.session_counter);
        self.state = AppState::IssueDetail;

        if let Some(client) = &self.client {
            // The directory is fetched once per session, on open.
            self.tasks.spawn_fetch_users(client, self.session_counter);
            self.tasks
                .spawn_fetch_known_tags(client, self.session_counter);
            if let Some(id) = persisted_id {
                if needs_comments {
                    self.tasks
                        .spawn_fetch_comments(client, self.session_counter, id.to_string());
                }
                if needs_tags {
                    self.tasks
                        .spawn_fetch_issue_tags(client, self.session_counter, id.to_string());
                }
            }
        }
    }

    fn open_create(&mut self) {
        let context = SessionContext::new(self.database.clone());
        let session = IssueSession::create(context);

        self.session_counter += 1;
        self.detail_view.open(session, self.session_counter);
        self.state = AppState::IssueDetail;

        if let Some(client) = &self.client {
            self.tasks.spawn_fetch_users(client, self.session_counter);
            self.tasks
                .spawn_fetch_known_tags(client, self.session_counter);
        }
    }

    fn close_detail(&mut self) {
        self.detail_view.close();
        self.pending_patches = 0;
        self.last_patch_error = None;
        self.state = AppState::IssueList;
    }

    /// The single update callback to the list: every successful
    /// create/update/assign/comment/tag mutation lands here.
    fn notify_updated(&mut self, issue: IssueView) {
        self.list_view.upsert(issue);
    }

    /// Whether a detail-scoped message belongs to the open session.
    /// Requests are never aborted; stale results are simply dropped.
    fn session_active(&self, session: u64) -> bool {
        self.detail_view.is_open() && self.detail_view.generation() == session
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        match self.state {
            AppState::Loading => self.render_loading(frame, area),
            AppState::IssueList => self.list_view.render(frame, area),
            AppState::IssueDetail => self.detail_view.render(frame, area),
        }
        if self.loading.is_active() && self.state != AppState::Loading {
            let bar = Rect {
                y: area.bottom().saturating_sub(1),
                height: 1,
                ..area
            };
            self.loading.render(frame, bar);
        }
        self.notifications.render(frame, area);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let center = Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        };
        self.loading.render(frame, center);
    }
}
