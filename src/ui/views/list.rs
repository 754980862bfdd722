//! Issue list view.
//!
//! Owns the cached issue collection, search and status filtering, and
//! the status-count summary. The detail view talks back to this cache
//! through a single update path (`upsert`) invoked after every
//! successful create/update, so the list reflects changes without a
//! full reload.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::model::{IssueId, IssueView, Status};
use crate::ui::components::TextInput;

/// Action resulting from list view input.
#[derive(Debug, Clone, PartialEq)]
pub enum ListAction {
    /// Open the detail view for this issue.
    Open(IssueView),
    /// Open a blank create session.
    Create,
    /// Re-fetch the issue list.
    Refresh,
    /// Delete this issue.
    Delete(IssueView),
    /// Direct lookup by id (search input starting with `#`).
    Lookup(String),
    /// Quit the application.
    Quit,
}

/// Status filter cycled with `f`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

/// The issue list view.
pub struct ListView {
    /// The cached issue collection.
    issues: Vec<IssueView>,
    /// Selection index into the visible (filtered) list.
    selected: usize,
    /// Search input.
    search: TextInput,
    /// Whether the search bar has focus.
    searching: bool,
    /// Current status filter.
    filter: StatusFilter,
    /// Whether the initial load is still running.
    loading: bool,
    /// Profile name for the header.
    profile_name: Option<String>,
    /// Active database name for the header.
    database: Option<String>,
}

impl ListView {
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            selected: 0,
            search: TextInput::new(),
            searching: false,
            filter: StatusFilter::All,
            loading: false,
            profile_name: None,
            database: None,
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_profile_name(&mut self, name: Option<String>) {
        self.profile_name = name;
    }

    pub fn set_database(&mut self, database: Option<String>) {
        self.database = database;
    }

    /// Replace the whole collection (initial load or refresh).
    pub fn set_issues(&mut self, issues: Vec<IssueView>) {
        self.issues = issues;
        self.loading = false;
        self.clamp_selection();
    }

    /// The single update path for detail-view reconciliation: replace the
    /// matching issue or insert a newly created one.
    pub fn upsert(&mut self, issue: IssueView) {
        let Some(id) = issue.raw_id.clone() else {
            // Never-persisted issues have no place in the cache.
            return;
        };
        match self
            .issues
            .iter_mut()
            .find(|existing| existing.raw_id.as_ref() == Some(&id))
        {
            Some(existing) => *existing = issue,
            None => self.issues.push(issue),
        }
    }

    /// Drop an issue from the cache after a successful delete.
    pub fn remove(&mut self, id: &IssueId) {
        self.issues.retain(|issue| issue.raw_id.as_ref() != Some(id));
        self.clamp_selection();
    }

    pub fn issues(&self) -> &[IssueView] {
        &self.issues
    }

    /// The filtered, newest-first view of the collection.
    pub fn visible(&self) -> Vec<&IssueView> {
        let term = self.search.value().trim().to_lowercase();
        let mut visible: Vec<&IssueView> = self
            .issues
            .iter()
            .filter(|issue| match &self.filter {
                StatusFilter::All => true,
                StatusFilter::Only(status) => &issue.status == status,
            })
            .filter(|issue| issue.matches_search(&term))
            .collect();
        visible.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        visible
    }

    /// The currently selected issue, if any.
    pub fn selected(&self) -> Option<&IssueView> {
        self.visible().get(self.selected).copied()
    }

    /// Counts for the summary line: (total, to-be-done, in-progress, done).
    pub fn status_counts(&self) -> (usize, usize, usize, usize) {
        let total = self.issues.len();
        let mut todo = 0;
        let mut doing = 0;
        let mut done = 0;
        for issue in &self.issues {
            match issue.status {
                Status::ToBeDone => todo += 1,
                Status::InProgress => doing += 1,
                Status::Done => done += 1,
                Status::Other(_) => {}
            }
        }
        (total, todo, doing, done)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Handle keyboard input.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<ListAction> {
        if self.searching {
            return self.handle_search_input(key);
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => Some(ListAction::Quit),
            (KeyCode::Char('/'), KeyModifiers::NONE) => {
                self.searching = true;
                None
            }
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
                let len = self.visible().len();
                if len > 0 && self.selected < len - 1 {
                    self.selected += 1;
                }
                None
            }
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            (KeyCode::Char('f'), KeyModifiers::NONE) => {
                self.cycle_filter();
                None
            }
            (KeyCode::Char('c'), KeyModifiers::NONE) => Some(ListAction::Create),
            (KeyCode::Char('r'), KeyModifiers::NONE) => Some(ListAction::Refresh),
            (KeyCode::Char('d'), KeyModifiers::NONE) => {
                self.selected().cloned().map(ListAction::Delete)
            }
            (KeyCode::Enter, _) => self.selected().cloned().map(ListAction::Open),
            _ => None,
        }
    }

    fn handle_search_input(&mut self, key: KeyEvent) -> Option<ListAction> {
        match key.code {
            KeyCode::Esc => {
                self.searching = false;
                self.search.clear();
                self.clamp_selection();
                None
            }
            KeyCode::Enter => {
                self.searching = false;
                let term = self.search.value().trim().to_string();
                // "#42" in the search bar is a direct id lookup.
                if let Some(stripped) = term.strip_prefix('#') {
                    if !stripped.is_empty() {
                        self.search.clear();
                        return Some(ListAction::Lookup(stripped.to_string()));
                    }
                }
                self.clamp_selection();
                None
            }
            _ => {
                if self.search.handle_input(key) {
                    self.selected = 0;
                }
                None
            }
        }
    }

    fn cycle_filter(&mut self) {
        self.filter = match &self.filter {
            StatusFilter::All => StatusFilter::Only(Status::ToBeDone),
            StatusFilter::Only(Status::ToBeDone) => StatusFilter::Only(Status::InProgress),
            StatusFilter::Only(Status::InProgress) => StatusFilter::Only(Status::Done),
            StatusFilter::Only(_) => StatusFilter::All,
        };
        self.selected = 0;
    }

    fn filter_label(&self) -> String {
        match &self.filter {
            StatusFilter::All => "All".to_string(),
            StatusFilter::Only(status) => status.label().to_string(),
        }
    }

    /// Render the list view.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // stats
                Constraint::Length(3), // search
                Constraint::Min(1),    // list
                Constraint::Length(1), // help
            ])
            .split(area);

        self.render_stats(frame, chunks[0]);
        self.search.render(
            frame,
            chunks[1],
            &format!("Search (filter: {})", self.filter_label()),
            self.searching,
        );
        self.render_items(frame, chunks[2]);
        self.render_help(frame, chunks[3]);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let (total, todo, doing, done) = self.status_counts();
        let header = match (&self.profile_name, &self.database) {
            (Some(profile), Some(db)) => format!("{} · {}", profile, db),
            (Some(profile), None) => profile.clone(),
            (None, Some(db)) => db.clone(),
            (None, None) => String::new(),
        };
        let line = Line::from(vec![
            Span::styled(header, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                "  Total: {}  To Be Done: {}  In Progress: {}  Done: {}",
                total, todo, doing, done
            )),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_items(&self, frame: &mut Frame, area: Rect) {
        let visible = self.visible();

        if self.loading {
            let widget = Paragraph::new("Loading issues from server...")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Issues"));
            frame.render_widget(widget, area);
            return;
        }

        if visible.is_empty() {
            let widget = Paragraph::new("No issues found. Press 'c' to create one or adjust your filters.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Issues"));
            frame.render_widget(widget, area);
            return;
        }

        let items: Vec<ListItem> = visible
            .iter()
            .map(|issue| {
                let tags = if issue.tags.is_empty() {
                    "No tags".to_string()
                } else {
                    issue
                        .tags
                        .iter()
                        .map(|t| t.label.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                let line = Line::from(vec![
                    Span::styled(
                        format!("{:>6} ", issue.display_id()),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        issue.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  [{}]", issue.status.label()),
                        Style::default().fg(status_color(&issue.status)),
                    ),
                    Span::raw(format!(
                        "  {} · {} · {}",
                        issue.assignee_label(),
                        tags,
                        issue.created_at
                    )),
                ]);
                ListItem::new(line)
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(self.selected.min(visible.len().saturating_sub(1))));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Issues ({})", visible.len())),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = if self.searching {
            "Enter apply (#id looks up directly) · Esc clear"
        } else {
            "Enter open · c create · d delete · f filter · / search · r refresh · q quit"
        };
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new()
    }
}

fn status_color(status: &Status) -> Color {
    match status {
        Status::ToBeDone => Color::Yellow,
        Status::InProgress => Color::Blue,
        Status::Done => Color::Green,
        Status::Other(_) => Color::Magenta,
    }
}

/// Newest first: numeric ids sort above opaque string ids.
fn sort_key(issue: &IssueView) -> (u8, i64, String) {
    match &issue.raw_id {
        Some(IssueId::Number(n)) => (1, *n, String::new()),
        Some(IssueId::Text(s)) => (0, 0, s.clone()),
        None => (0, i64::MIN, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::IssueDto;

    fn issue(id: i64, title: &str, status: &str) -> IssueView {
        let dto: IssueDto = serde_json::from_str(&format!(
            r#"{{"id": {}, "title": "{}", "status": "{}"}}"#,
            id, title, status
        ))
        .unwrap();
        IssueView::from_dto(&dto, Some("main"))
    }

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_visible_sorted_newest_first() {
        let mut view = ListView::new();
        view.set_issues(vec![
            issue(1, "oldest", "todo"),
            issue(3, "newest", "todo"),
            issue(2, "middle", "todo"),
        ]);

        let titles: Vec<&str> = view.visible().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_status_counts() {
        let mut view = ListView::new();
        view.set_issues(vec![
            issue(1, "a", "todo"),
            issue(2, "b", "in progress"),
            issue(3, "c", "done"),
            issue(4, "d", "done"),
            issue(5, "e", "Blocked"),
        ]);

        assert_eq!(view.status_counts(), (5, 1, 1, 2));
    }

    #[test]
    fn test_filter_cycle_narrows_visible() {
        let mut view = ListView::new();
        view.set_issues(vec![
            issue(1, "a", "todo"),
            issue(2, "b", "in progress"),
        ]);

        view.handle_input(press('f')); // -> To Be Done
        assert_eq!(view.visible().len(), 1);
        assert_eq!(view.visible()[0].title, "a");

        view.handle_input(press('f')); // -> In Progress
        assert_eq!(view.visible()[0].title, "b");

        view.handle_input(press('f')); // -> Done
        assert!(view.visible().is_empty());

        view.handle_input(press('f')); // -> All
        assert_eq!(view.visible().len(), 2);
    }

    #[test]
    fn test_search_narrows_visible() {
        let mut view = ListView::new();
        view.set_issues(vec![
            issue(1, "Redirect loop", "todo"),
            issue(2, "Crash on save", "todo"),
        ]);

        view.handle_input(press('/'));
        for c in "crash".chars() {
            view.handle_input(press(c));
        }
        assert_eq!(view.visible().len(), 1);
        assert_eq!(view.visible()[0].title, "Crash on save");
    }

    #[test]
    fn test_search_hash_prefix_is_lookup() {
        let mut view = ListView::new();
        view.handle_input(press('/'));
        for c in "#42".chars() {
            view.handle_input(press(c));
        }
        let action = view.handle_input(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(action, Some(ListAction::Lookup("42".to_string())));
    }

    #[test]
    fn test_upsert_replaces_matching_issue() {
        let mut view = ListView::new();
        view.set_issues(vec![issue(1, "old title", "todo")]);

        view.upsert(issue(1, "new title", "done"));
        assert_eq!(view.issues().len(), 1);
        assert_eq!(view.issues()[0].title, "new title");
    }

    #[test]
    fn test_upsert_inserts_new_issue() {
        let mut view = ListView::new();
        view.set_issues(vec![issue(1, "existing", "todo")]);

        view.upsert(issue(2, "created", "todo"));
        assert_eq!(view.issues().len(), 2);
    }

    #[test]
    fn test_upsert_ignores_unpersisted_issue() {
        let mut view = ListView::new();
        view.upsert(IssueView::draft(None));
        assert!(view.issues().is_empty());
    }

    #[test]
    fn test_remove() {
        let mut view = ListView::new();
        view.set_issues(vec![issue(1, "a", "todo"), issue(2, "b", "todo")]);

        view.remove(&IssueId::Number(1));
        assert_eq!(view.issues().len(), 1);
        assert_eq!(view.issues()[0].title, "b");
    }

    #[test]
    fn test_open_selected() {
        let mut view = ListView::new();
        view.set_issues(vec![issue(1, "a", "todo"), issue(2, "b", "todo")]);

        // Selection starts on the newest issue (#2).
        let action = view.handle_input(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        match action {
            Some(ListAction::Open(opened)) => assert_eq!(opened.title, "b"),
            other => panic!("Expected Open, got {:?}", other),
        }
    }

    #[test]
    fn test_quit_and_create_actions() {
        let mut view = ListView::new();
        assert_eq!(view.handle_input(press('q')), Some(ListAction::Quit));
        assert_eq!(view.handle_input(press('c')), Some(ListAction::Create));
        assert_eq!(view.handle_input(press('r')), Some(ListAction::Refresh));
    }
}
