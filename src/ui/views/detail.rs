//! Issue detail view.
//!
//! Renders the open session's working snapshot and translates keyboard
//! input into session transitions. Every mutation flows through
//! [`IssueSession`]; this view owns only presentation state (focus,
//! cursors, the live text input) and the per-operation pending flags
//! that disable a control while its own request is in flight.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::TagView;
use crate::session::{
    AssignEffect, CommentEffect, EditCommit, EditField, IssueSession, SaveAction, SessionError,
    StatusEffect, TagEffect,
};
use crate::ui::components::{Notification, TextInput};

/// Action resulting from detail view input, executed by the event loop.
#[derive(Debug)]
pub enum DetailAction {
    /// Close requested; carries the planned persistence.
    Save(SaveAction),
    /// Close requested, discarding the working copy. No network call,
    /// no list callback.
    Discard,
    /// A comment mutation to execute.
    Comment(CommentEffect),
    /// An assignee mutation to execute.
    Assign(AssignEffect),
    /// A status mutation to execute.
    Status(StatusEffect),
    /// A tag mutation to execute.
    Tag(TagEffect),
    /// Surface a message on the status line.
    Notify(Notification),
}

/// Which section of the detail view has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Title,
    Description,
    Assignee,
    Status,
    Tags,
    Comments,
}

const FOCUS_ORDER: [Focus; 6] = [
    Focus::Title,
    Focus::Description,
    Focus::Assignee,
    Focus::Status,
    Focus::Tags,
    Focus::Comments,
];

/// What the popup input is composing, when not backing an inline edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compose {
    NewComment,
    NewTag,
}

/// Per-operation in-flight flags. Only the triggering control is
/// disabled; independent operations stay available.
#[derive(Debug, Default)]
struct Pending {
    save: bool,
    comment: bool,
    assign: bool,
    status: bool,
    tag: bool,
}

/// The issue detail view.
pub struct DetailView {
    session: Option<IssueSession>,
    /// Generation stamp for dropping stale task results.
    generation: u64,
    focus: Focus,
    comment_cursor: usize,
    tag_cursor: usize,
    input: TextInput,
    compose: Option<Compose>,
    pending: Pending,
    /// The backend's tag palette, used to color new tags by label.
    known_tags: Vec<TagView>,
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            session: None,
            generation: 0,
            focus: Focus::Title,
            comment_cursor: 0,
            tag_cursor: 0,
            input: TextInput::new(),
            compose: None,
            pending: Pending::default(),
            known_tags: Vec::new(),
        }
    }

    /// Install the global tag palette for color lookups.
    pub fn set_known_tags(&mut self, tags: Vec<TagView>) {
        self.known_tags = tags;
    }

    /// Open a session in this view.
    pub fn open(&mut self, session: IssueSession, generation: u64) {
        self.session = Some(session);
        self.generation = generation;
        self.focus = Focus::Title;
        self.comment_cursor = 0;
        self.tag_cursor = 0;
        self.compose = None;
        self.pending = Pending::default();
    }

    /// Close and drop the session.
    pub fn close(&mut self) -> Option<IssueSession> {
        self.session.take()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session(&self) -> Option<&IssueSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut IssueSession> {
        self.session.as_mut()
    }

    pub fn set_save_pending(&mut self, pending: bool) {
        self.pending.save = pending;
    }

    pub fn set_comment_pending(&mut self, pending: bool) {
        self.pending.comment = pending;
    }

    pub fn set_assign_pending(&mut self, pending: bool) {
        self.pending.assign = pending;
    }

    pub fn set_status_pending(&mut self, pending: bool) {
        self.pending.status = pending;
    }

    pub fn set_tag_pending(&mut self, pending: bool) {
        self.pending.tag = pending;
    }

    /// Handle keyboard input.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<DetailAction> {
        self.session.as_ref()?;

        if self.session.as_ref().is_some_and(|s| s.editor().is_editing()) {
            return self.handle_edit_input(key);
        }
        if self.compose.is_some() {
            return self.handle_compose_input(key);
        }
        self.handle_normal_input(key)
    }

    // ------------------------------------------------------------------
    // Inline edit mode
    // ------------------------------------------------------------------

    fn handle_edit_input(&mut self, key: KeyEvent) -> Option<DetailAction> {
        match key.code {
            KeyCode::Esc => {
                if let Some(session) = self.session.as_mut() {
                    session.cancel_edit();
                }
                None
            }
            KeyCode::Enter => {
                let session = self.session.as_mut()?;
                session.editor_mut().set_buffer(self.input.value());
                match session.commit_edit() {
                    Ok(EditCommit::Noop) => None,
                    Ok(EditCommit::FieldChanged(_)) => None,
                    Ok(EditCommit::Comment(CommentEffect::Local)) => None,
                    Ok(EditCommit::Comment(effect)) => Some(DetailAction::Comment(effect)),
                    Ok(EditCommit::Assignee(AssignEffect::Noop)) => None,
                    Ok(EditCommit::Assignee(AssignEffect::Local)) => None,
                    Ok(EditCommit::Assignee(effect)) => Some(DetailAction::Assign(effect)),
                    Err(e) => Some(DetailAction::Notify(Notification::error(error_text(&e)))),
                }
            }
            _ => {
                self.input.handle_input(key);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Compose mode (new comment / new tag)
    // ------------------------------------------------------------------

    fn handle_compose_input(&mut self, key: KeyEvent) -> Option<DetailAction> {
        match key.code {
            KeyCode::Esc => {
                self.compose = None;
                self.input.clear();
                None
            }
            KeyCode::Enter => {
                let kind = self.compose?;
                let text = self.input.value().to_string();
                let session = self.session.as_mut()?;
                match kind {
                    Compose::NewComment => match session.add_comment("", &text) {
                        Ok(CommentEffect::Local) => {
                            self.compose = None;
                            self.input.clear();
                            Some(DetailAction::Notify(Notification::success("Comment added")))
                        }
                        Ok(effect) => {
                            self.compose = None;
                            self.input.clear();
                            Some(DetailAction::Comment(effect))
                        }
                        // Validation failure: the compose box stays open.
                        Err(e) => Some(DetailAction::Notify(Notification::error(error_text(&e)))),
                    },
                    Compose::NewTag => {
                        // Reuse the palette color for labels the backend
                        // already knows.
                        let color = self
                            .known_tags
                            .iter()
                            .find(|t| t.label.eq_ignore_ascii_case(text.trim()))
                            .map(|t| t.color.clone());
                        let effect = session.add_tag(&text, color.as_deref());
                        self.compose = None;
                        self.input.clear();
                        match effect {
                            TagEffect::Noop => Some(DetailAction::Notify(Notification::info(
                                "Tag already present",
                            ))),
                            TagEffect::Local => None,
                            effect => Some(DetailAction::Tag(effect)),
                        }
                    }
                }
            }
            _ => {
                self.input.handle_input(key);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Normal mode
    // ------------------------------------------------------------------

    fn handle_normal_input(&mut self, key: KeyEvent) -> Option<DetailAction> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('q'), KeyModifiers::NONE) => {
                if self.pending.save {
                    return None;
                }
                let session = self.session.as_mut()?;
                match session.save_action() {
                    Ok(action) => Some(DetailAction::Save(action)),
                    Err(e) => Some(DetailAction::Notify(Notification::error(error_text(&e)))),
                }
            }
            (KeyCode::Char('u'), KeyModifiers::NONE) => Some(DetailAction::Discard),
            (KeyCode::Tab, _) | (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _)
                if self.focus != Focus::Comments =>
            {
                self.focus_next();
                None
            }
            (KeyCode::BackTab, _) | (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _)
                if self.focus != Focus::Title && self.focus != Focus::Comments =>
            {
                self.focus_prev();
                None
            }
            (KeyCode::Enter, _) => self.activate_focused(),
            (KeyCode::Char('n'), KeyModifiers::NONE) => {
                if self.pending.comment {
                    return None;
                }
                self.compose = Some(Compose::NewComment);
                self.input.clear();
                self.input.set_placeholder("Write a comment...");
                None
            }
            (KeyCode::Char('s'), KeyModifiers::NONE) => {
                if self.pending.status {
                    return None;
                }
                let session = self.session.as_mut()?;
                match session.cycle_status() {
                    StatusEffect::Local => None,
                    effect => Some(DetailAction::Status(effect)),
                }
            }
            (KeyCode::Char('a'), KeyModifiers::NONE) => {
                self.focus = Focus::Assignee;
                self.begin_edit(EditField::Assignee)
            }
            (KeyCode::Char('d'), KeyModifiers::NONE) => match self.focus {
                Focus::Comments => self.delete_focused_comment(),
                Focus::Tags => self.remove_focused_tag(),
                _ => None,
            },
            (KeyCode::Char('e'), KeyModifiers::NONE) if self.focus == Focus::Comments => {
                self.edit_focused_comment()
            }
            (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _)
                if self.focus == Focus::Tags =>
            {
                self.tag_cursor = self.tag_cursor.saturating_sub(1);
                None
            }
            (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _)
                if self.focus == Focus::Tags =>
            {
                let count = self.tag_count();
                if count > 0 && self.tag_cursor < count - 1 {
                    self.tag_cursor += 1;
                }
                None
            }
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
                // Focus is on Comments: move the comment cursor.
                let count = self.comment_count();
                if count > 0 && self.comment_cursor < count - 1 {
                    self.comment_cursor += 1;
                }
                None
            }
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
                if self.focus == Focus::Comments && self.comment_cursor > 0 {
                    self.comment_cursor -= 1;
                } else if self.comment_cursor == 0 && self.focus == Focus::Comments {
                    self.focus = Focus::Tags;
                }
                None
            }
            _ => None,
        }
    }

    fn focus_next(&mut self) {
        let index = FOCUS_ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        if index + 1 < FOCUS_ORDER.len() {
            self.focus = FOCUS_ORDER[index + 1];
        }
    }

    fn focus_prev(&mut self) {
        let index = FOCUS_ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        if index > 0 {
            self.focus = FOCUS_ORDER[index - 1];
        }
    }

    fn activate_focused(&mut self) -> Option<DetailAction> {
        match self.focus {
            Focus::Title => self.begin_edit(EditField::Title),
            Focus::Description => self.begin_edit(EditField::Description),
            Focus::Assignee => self.begin_edit(EditField::Assignee),
            Focus::Status => {
                if self.pending.status {
                    return None;
                }
                let session = self.session.as_mut()?;
                match session.cycle_status() {
                    StatusEffect::Local => None,
                    effect => Some(DetailAction::Status(effect)),
                }
            }
            Focus::Tags => {
                if self.pending.tag {
                    return None;
                }
                self.compose = Some(Compose::NewTag);
                self.input.clear();
                self.input.set_placeholder("Tag label...");
                None
            }
            Focus::Comments => self.edit_focused_comment(),
        }
    }

    fn begin_edit(&mut self, field: EditField) -> Option<DetailAction> {
        if matches!(field, EditField::Assignee) && self.pending.assign {
            return None;
        }
        let session = self.session.as_mut()?;
        let current = match field {
            EditField::Title => session.working().title.clone(),
            EditField::Description => session.working().description.clone(),
            EditField::Assignee => session.working().assigned_to.clone(),
            EditField::Comment(i) => session
                .working()
                .comments
                .get(i)
                .map(|c| c.text.clone())
                .unwrap_or_default(),
        };
        session.begin_edit(field);
        self.input = TextInput::with_value_selected(current);
        None
    }

    fn edit_focused_comment(&mut self) -> Option<DetailAction> {
        if self.comment_count() == 0 || self.pending.comment {
            return None;
        }
        self.begin_edit(EditField::Comment(self.comment_cursor))
    }

    fn delete_focused_comment(&mut self) -> Option<DetailAction> {
        if self.pending.comment {
            return None;
        }
        let cursor = self.comment_cursor;
        let session = self.session.as_mut()?;
        match session.delete_comment(cursor)? {
            CommentEffect::Local => {
                self.clamp_cursors();
                Some(DetailAction::Notify(Notification::success("Comment removed")))
            }
            effect => Some(DetailAction::Comment(effect)),
        }
    }

    fn remove_focused_tag(&mut self) -> Option<DetailAction> {
        if self.pending.tag {
            return None;
        }
        let cursor = self.tag_cursor;
        let session = self.session.as_mut()?;
        let label = session.working().tags.get(cursor)?.label.clone();
        match session.remove_tag(&label) {
            TagEffect::Noop => None,
            TagEffect::Local => {
                self.clamp_cursors();
                None
            }
            effect => Some(DetailAction::Tag(effect)),
        }
    }

    /// Re-clamp cursors after the comment or tag lists shrink.
    pub fn clamp_cursors(&mut self) {
        let comments = self.comment_count();
        if comments == 0 {
            self.comment_cursor = 0;
        } else if self.comment_cursor >= comments {
            self.comment_cursor = comments - 1;
        }
        let tags = self.tag_count();
        if tags == 0 {
            self.tag_cursor = 0;
        } else if self.tag_cursor >= tags {
            self.tag_cursor = tags - 1;
        }
    }

    fn comment_count(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.working().comments.len())
            .unwrap_or(0)
    }

    fn tag_count(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.working().tags.len())
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render the detail view.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let issue = session.working();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Length(4), // meta
                Constraint::Min(4),    // description
                Constraint::Length(6), // comments
                Constraint::Length(1), // help
            ])
            .split(area);

        let title_text = format!("{} ({})", issue.title, issue.display_id());
        frame.render_widget(
            Paragraph::new(title_text)
                .style(Style::default().add_modifier(Modifier::BOLD))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(self.border_style(Focus::Title)),
                ),
            chunks[0],
        );

        let tags_line = if issue.tags.is_empty() {
            "No tags".to_string()
        } else {
            issue
                .tags
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    if self.focus == Focus::Tags && i == self.tag_cursor {
                        format!("[{}]", t.label)
                    } else {
                        t.label.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let meta = vec![
            Line::from(vec![
                Span::styled("Assignees: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    issue.assignee_label().to_string(),
                    self.value_style(Focus::Assignee),
                ),
                Span::styled("   Status: ", Style::default().fg(Color::DarkGray)),
                Span::styled(issue.status.label().to_string(), self.value_style(Focus::Status)),
            ]),
            Line::from(vec![
                Span::styled("Tags: ", Style::default().fg(Color::DarkGray)),
                Span::styled(tags_line, self.value_style(Focus::Tags)),
            ]),
            Line::from(vec![
                Span::styled("Author: ", Style::default().fg(Color::DarkGray)),
                Span::raw(issue.author.clone()),
                Span::styled("   Created: ", Style::default().fg(Color::DarkGray)),
                Span::raw(issue.created_at.clone()),
                Span::styled("   Database: ", Style::default().fg(Color::DarkGray)),
                Span::raw(issue.database.clone()),
            ]),
        ];
        frame.render_widget(Paragraph::new(meta), chunks[1]);

        let description = if issue.description.is_empty() {
            "No description provided.".to_string()
        } else {
            issue.description.clone()
        };
        frame.render_widget(
            Paragraph::new(description).wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Description")
                    .border_style(self.border_style(Focus::Description)),
            ),
            chunks[2],
        );

        self.render_comments(frame, chunks[3], session);
        self.render_help(frame, chunks[4]);

        if session.editor().is_editing() || self.compose.is_some() {
            self.render_input_popup(frame, area, session);
        }
    }

    fn render_comments(&self, frame: &mut Frame, area: Rect, session: &IssueSession) {
        let comments = &session.working().comments;
        let lines: Vec<Line> = if comments.is_empty() {
            vec![Line::from(Span::styled(
                "No comments yet. Press 'n' to add one.",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            comments
                .iter()
                .enumerate()
                .map(|(i, comment)| {
                    let marker = if self.focus == Focus::Comments && i == self.comment_cursor {
                        "> "
                    } else {
                        "  "
                    };
                    Line::from(vec![
                        Span::raw(marker),
                        Span::styled(
                            format!("{} ({}): ", comment.author, comment.date),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw(comment.text.clone()),
                    ])
                })
                .collect()
        };

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Comments ({})", comments.len()))
                    .border_style(self.border_style(Focus::Comments)),
            ),
            area,
        );
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = "Enter edit · s status · a assign · n comment · d delete · Esc save & close · u discard";
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn render_input_popup(&self, frame: &mut Frame, area: Rect, session: &IssueSession) {
        let title = match (session.editor().editing_field(), self.compose) {
            (Some(EditField::Title), _) => "Edit title",
            (Some(EditField::Description), _) => "Edit description",
            (Some(EditField::Assignee), _) => "Assign to (empty to unassign)",
            (Some(EditField::Comment(_)), _) => "Edit comment",
            (None, Some(Compose::NewComment)) => "New comment",
            (None, Some(Compose::NewTag)) => "New tag",
            (None, None) => return,
        };

        let width = area.width.saturating_sub(8).min(70).max(20);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + area.height / 2,
            width,
            height: 3,
        };
        frame.render_widget(Clear, popup);
        self.input.render(frame, popup, title, true);
    }

    fn border_style(&self, section: Focus) -> Style {
        if self.focus == section {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn value_style(&self, section: Focus) -> Style {
        if self.focus == section {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}

fn error_text(error: &SessionError) -> String {
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{IssueDto, UserDto};
    use crate::model::IssueView;
    use crate::session::SessionContext;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn chars(view: &mut DetailView, text: &str) {
        for c in text.chars() {
            view.handle_input(press(KeyCode::Char(c)));
        }
    }

    fn open_view() -> DetailView {
        let dto: IssueDto = serde_json::from_str(
            r#"{"id": 7, "title": "A", "description": "B", "author_id": "coder96", "status": 1}"#,
        )
        .unwrap();
        let issue = IssueView::from_dto(&dto, Some("main"));
        let mut session = IssueSession::open(issue, SessionContext::new(Some("main".to_string())));
        session.directory_mut().populate(vec![UserDto {
            name: Some("Alice".to_string()),
            role: None,
        }]);
        let mut view = DetailView::new();
        view.open(session, 1);
        view
    }

    #[test]
    fn test_enter_starts_title_edit() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Enter));
        assert!(view.session().unwrap().editor().is_editing());
    }

    #[test]
    fn test_edit_commit_defers_persistence() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Enter));
        chars(&mut view, "New title");
        let action = view.handle_input(press(KeyCode::Enter));
        // Title edits stay local until close.
        assert!(action.is_none());
        assert_eq!(view.session().unwrap().working().title, "New title");
    }

    #[test]
    fn test_escape_plans_save_with_diff() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Enter));
        chars(&mut view, "New title");
        view.handle_input(press(KeyCode::Enter));

        let action = view.handle_input(press(KeyCode::Esc));
        match action {
            Some(DetailAction::Save(SaveAction::Update { patches, .. })) => {
                assert_eq!(patches.len(), 1);
                assert_eq!(patches[0].field, "title");
            }
            other => panic!("Expected Save(Update), got {:?}", other),
        }
    }

    #[test]
    fn test_escape_without_changes_plans_none() {
        let mut view = open_view();
        let action = view.handle_input(press(KeyCode::Esc));
        assert!(matches!(action, Some(DetailAction::Save(SaveAction::None))));
    }

    #[test]
    fn test_edit_cancel_restores() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Enter));
        chars(&mut view, "garbage");
        view.handle_input(press(KeyCode::Esc));

        assert_eq!(view.session().unwrap().working().title, "A");
        assert!(!view.session().unwrap().editor().is_editing());
    }

    #[test]
    fn test_discard_action() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Enter));
        chars(&mut view, "changed");
        view.handle_input(press(KeyCode::Enter));

        let action = view.handle_input(press(KeyCode::Char('u')));
        assert!(matches!(action, Some(DetailAction::Discard)));
    }

    #[test]
    fn test_status_cycle_returns_patch_effect() {
        let mut view = open_view();
        let action = view.handle_input(press(KeyCode::Char('s')));
        match action {
            Some(DetailAction::Status(StatusEffect::Patch { patch, .. })) => {
                assert_eq!(patch.field, "status");
                assert_eq!(patch.value, "In Progress");
            }
            other => panic!("Expected Status(Patch), got {:?}", other),
        }
    }

    #[test]
    fn test_status_disabled_while_pending() {
        let mut view = open_view();
        view.set_status_pending(true);
        assert!(view.handle_input(press(KeyCode::Char('s'))).is_none());
        // Independent operations stay available: title editing still works.
        view.handle_input(press(KeyCode::Enter));
        assert!(view.session().unwrap().editor().is_editing());
    }

    #[test]
    fn test_assign_flow_emits_effect() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Char('a')));
        chars(&mut view, "alice");
        let action = view.handle_input(press(KeyCode::Enter));
        match action {
            Some(DetailAction::Assign(AssignEffect::Assign { user, .. })) => {
                assert_eq!(user, "Alice");
            }
            other => panic!("Expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_assign_unknown_user_notifies_and_stays_editing() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Char('a')));
        chars(&mut view, "carol");
        let action = view.handle_input(press(KeyCode::Enter));
        assert!(matches!(action, Some(DetailAction::Notify(_))));
        assert!(view.session().unwrap().editor().is_editing());
    }

    #[test]
    fn test_new_comment_compose_posts() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Char('n')));
        chars(&mut view, "Working on this now");
        let action = view.handle_input(press(KeyCode::Enter));
        match action {
            Some(DetailAction::Comment(CommentEffect::Post { payload, .. })) => {
                assert_eq!(payload.text, "Working on this now");
            }
            other => panic!("Expected Comment(Post), got {:?}", other),
        }
    }

    #[test]
    fn test_empty_comment_keeps_compose_open() {
        let mut view = open_view();
        view.handle_input(press(KeyCode::Char('n')));
        let action = view.handle_input(press(KeyCode::Enter));
        assert!(matches!(action, Some(DetailAction::Notify(_))));
        assert!(view.compose.is_some());
    }
}
