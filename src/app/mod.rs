mod line_editor;

use crate::domain::{
    PageData, Profile, RowAction, Session, SessionType, eligible_other_profile, view_actions,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

pub use line_editor::{InputMask, LineEditor};

const HOURS_FIELD_MAX: u32 = 9999;
const MINUTES_FIELD_MAX: u32 = 59;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page lengths offered by the table, default 25.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageLength {
    Ten,
    TwentyFive,
    Fifty,
    All,
}

impl PageLength {
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Ten => Some(10),
            Self::TwentyFive => Some(25),
            Self::Fifty => Some(50),
            Self::All => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ten => "10",
            Self::TwentyFive => "25",
            Self::Fifty => "50",
            Self::All => "all",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::Ten => Self::TwentyFive,
            Self::TwentyFive => Self::Fifty,
            Self::Fifty => Self::All,
            Self::All => Self::Ten,
        }
    }
}

/// Sortable columns. Duration and the actions cell are deliberately not
/// here: those columns never participate in ordering.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortColumn {
    Game,
    StartDate,
    StartTime,
    EndTime,
}

impl SortColumn {
    pub fn label(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::StartDate => "date",
            Self::StartTime => "start",
            Self::EndTime => "end",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::Game => Self::StartDate,
            Self::StartDate => Self::StartTime,
            Self::StartTime => Self::EndTime,
            Self::EndTime => Self::Game,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Sort/filter/page index over the session collection. Rebuilt wholesale
/// whenever the collection or the ordering settings change; the session
/// records themselves are never reordered.
#[derive(Clone, Debug)]
pub struct TableView {
    pub query: String,
    pub search_active: bool,
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
    pub page_length: PageLength,
    pub row_order: Vec<usize>,
    pub selected: usize,
}

impl TableView {
    pub fn new(sessions: &[Session]) -> Self {
        let mut view = Self {
            query: String::new(),
            search_active: false,
            sort_column: SortColumn::StartDate,
            sort_direction: SortDirection::Descending,
            page_length: PageLength::TwentyFive,
            row_order: Vec::new(),
            selected: 0,
        };
        view.rebuild(sessions, None);
        view
    }

    pub fn rebuild(&mut self, sessions: &[Session], keep_selected: Option<&str>) {
        let query = self.query.to_lowercase();
        self.row_order = (0..sessions.len())
            .filter(|&index| matches_query(&sessions[index], &query))
            .collect();
        let column = self.sort_column;
        let direction = self.sort_direction;
        self.row_order
            .sort_by(|&a, &b| compare_sessions(&sessions[a], &sessions[b], column, direction));

        if let Some(id) = keep_selected {
            if let Some(pos) = self
                .row_order
                .iter()
                .position(|&index| sessions[index].id == id)
            {
                self.selected = pos;
                return;
            }
        }
        self.selected = self.selected.min(self.row_order.len().saturating_sub(1));
    }

    pub fn selected_session_index(&self) -> Option<usize> {
        self.row_order.get(self.selected).copied()
    }

    pub fn page_size(&self) -> usize {
        self.page_length
            .limit()
            .unwrap_or_else(|| self.row_order.len().max(1))
    }

    /// Bounds of the visible page as a half-open range into `row_order`.
    /// The page is derived from the selection, so moving the cursor past
    /// either edge flips the page.
    pub fn page_bounds(&self) -> (usize, usize) {
        let len = self.row_order.len();
        let size = self.page_size();
        let page = self.selected / size.max(1);
        let start = page * size;
        (start.min(len), (start + size).min(len))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.row_order.is_empty() {
            return;
        }
        let last = self.row_order.len() - 1;
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, last as isize) as usize;
    }
}

fn matches_query(session: &Session, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    // Searchable columns are game name and start date only.
    session.game_name.to_lowercase().contains(query) || session.start_date.contains(query)
}

fn compare_sessions(
    a: &Session,
    b: &Session,
    column: SortColumn,
    direction: SortDirection,
) -> Ordering {
    let primary = match column {
        SortColumn::Game => a
            .game_name
            .to_lowercase()
            .cmp(&b.game_name.to_lowercase()),
        SortColumn::StartDate => cmp_keys(a.start_date_key(), b.start_date_key())
            .unwrap_or_else(|| a.start_date.cmp(&b.start_date)),
        SortColumn::StartTime => cmp_keys(a.start_time_key(), b.start_time_key())
            .unwrap_or_else(|| a.start_time.cmp(&b.start_time)),
        SortColumn::EndTime => cmp_keys(a.end_time_key(), b.end_time_key())
            .unwrap_or_else(|| a.end_time.cmp(&b.end_time)),
    };
    let primary = match direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };

    // Fixed tiebreak: newest first by start date then start time, then id
    // for a stable order.
    primary
        .then_with(|| {
            cmp_keys(a.start_date_key(), b.start_date_key())
                .unwrap_or_else(|| a.start_date.cmp(&b.start_date))
                .reverse()
        })
        .then_with(|| {
            cmp_keys(a.start_time_key(), b.start_time_key())
                .unwrap_or_else(|| a.start_time.cmp(&b.start_time))
                .reverse()
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// Orders two parsed keys; `None` (unparsable field) sorts before any
/// parsed value, and two `None`s defer to the caller's string fallback.
fn cmp_keys<T: Ord>(a: Option<T>, b: Option<T>) -> Option<Ordering> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        (Some(_), None) => Some(Ordering::Greater),
        (None, Some(_)) => Some(Ordering::Less),
        (None, None) => None,
    }
}

/// Pre-edit values captured when a row enters editing, used to prove the
/// displayed state is unchanged after cancel or a failed save.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EditSnapshot {
    pub game_name: String,
    pub duration_minutes: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditField {
    Name,
    Hours,
    Minutes,
}

impl EditField {
    fn next(self) -> Self {
        match self {
            Self::Name => Self::Hours,
            Self::Hours => Self::Minutes,
            Self::Minutes => Self::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Name => Self::Minutes,
            Self::Hours => Self::Name,
            Self::Minutes => Self::Hours,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EditDraft {
    pub snapshot: EditSnapshot,
    pub name: LineEditor,
    pub hours: LineEditor,
    pub minutes: LineEditor,
    pub focus: EditField,
}

impl EditDraft {
    fn for_session(session: &Session) -> Self {
        let snapshot = EditSnapshot {
            game_name: session.game_name.clone(),
            duration_minutes: session.duration_minutes,
        };
        Self {
            name: LineEditor::from_text(session.game_name.clone(), InputMask::Text),
            hours: LineEditor::from_text(
                (session.duration_minutes / 60).to_string(),
                InputMask::Digits {
                    max: HOURS_FIELD_MAX,
                },
            ),
            minutes: LineEditor::from_text(
                (session.duration_minutes % 60).to_string(),
                InputMask::Digits {
                    max: MINUTES_FIELD_MAX,
                },
            ),
            focus: EditField::Name,
            snapshot,
        }
    }

    fn focused_editor(&mut self) -> &mut LineEditor {
        match self.focus {
            EditField::Name => &mut self.name,
            EditField::Hours => &mut self.hours,
            EditField::Minutes => &mut self.minutes,
        }
    }

    fn duration_minutes(&self) -> u32 {
        self.hours
            .numeric_value()
            .saturating_mul(60)
            .saturating_add(self.minutes.numeric_value())
    }
}

/// Per-row edit state, keyed by session id in the model. A row with no
/// entry is in view mode. `Saving` refuses edit re-entry until the
/// outstanding request resolves.
#[derive(Clone, Debug)]
pub enum RowEditState {
    Editing(EditDraft),
    Saving(EditSnapshot),
}

/// Irreversible gestures are confirmed before any request goes out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfirmAction {
    DeleteSession {
        session_id: String,
        session_type: SessionType,
    },
    ConvertIdleSession {
        session_id: String,
    },
    SwitchSessionProfile {
        session_id: String,
        profile_id: i64,
        profile_name: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfirmDialog {
    pub action: ConfirmAction,
    pub game_name: String,
}

impl ConfirmDialog {
    pub fn prompt(&self) -> String {
        match &self.action {
            ConfirmAction::DeleteSession { .. } => {
                format!("Delete this session of \"{}\"?", self.game_name)
            }
            ConfirmAction::ConvertIdleSession { .. } => {
                format!("Convert this idle session of \"{}\" to active?", self.game_name)
            }
            ConfirmAction::SwitchSessionProfile { profile_name, .. } => format!(
                "Switch this session of \"{}\" to profile \"{profile_name}\"?",
                self.game_name
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppData {
    pub sessions: Vec<Session>,
    pub profiles: Vec<Profile>,
    pub current_profile_id: Option<i64>,
    pub load_error: Option<String>,
}

impl AppData {
    pub fn from_page(page: PageData) -> Self {
        Self {
            sessions: page.sessions,
            profiles: page.profiles,
            current_profile_id: page.current_profile_id,
            load_error: None,
        }
    }

    pub fn from_error(message: String) -> Self {
        Self {
            sessions: Vec::new(),
            profiles: Vec::new(),
            current_profile_id: None,
            load_error: Some(message),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub data: AppData,
    pub table: TableView,
    pub row_states: BTreeMap<String, RowEditState>,
    pub confirm: Option<ConfirmDialog>,
    pub notice: Option<String>,
    pub help_open: bool,
    pub reload_in_flight: bool,
}

impl AppModel {
    pub fn new(data: AppData) -> Self {
        let table = TableView::new(&data.sessions);
        Self {
            data,
            table,
            row_states: BTreeMap::new(),
            confirm: None,
            notice: None,
            help_open: false,
            reload_in_flight: false,
        }
    }

    pub fn selected_session(&self) -> Option<&Session> {
        self.table
            .selected_session_index()
            .and_then(|index| self.data.sessions.get(index))
    }

    pub fn row_state(&self, session_id: &str) -> Option<&RowEditState> {
        self.row_states.get(session_id)
    }

    pub fn switch_target(&self) -> Option<&Profile> {
        eligible_other_profile(&self.data.profiles, self.data.current_profile_id)
    }

    pub fn current_profile(&self) -> Option<&Profile> {
        let id = self.data.current_profile_id?;
        self.data.profiles.iter().find(|profile| profile.id == id)
    }

    /// View-mode action set for a session under the current profile data.
    pub fn actions_for(&self, session: &Session) -> Vec<RowAction> {
        view_actions(session.session_type, self.switch_target().is_some())
    }

    /// Re-derives the filter/sort index after an in-place record patch,
    /// keeping the selection on the same session where possible.
    pub fn refresh_table(&mut self) {
        let keep = self.selected_session().map(|session| session.id.clone());
        let sessions = std::mem::take(&mut self.data.sessions);
        self.table.rebuild(&sessions, keep.as_deref());
        self.data.sessions = sessions;
    }

    /// Full reload: the table index is destroyed and recreated wholesale
    /// from the fresh collections. Ordering settings carry over; row edit
    /// state and any open dialog do not survive the reload.
    pub fn rebuild_with_page(&mut self, page: PageData) {
        let keep = self.selected_session().map(|session| session.id.clone());
        let previous = &self.table;
        let mut table = TableView::new(&page.sessions);
        table.query = previous.query.clone();
        table.sort_column = previous.sort_column;
        table.sort_direction = previous.sort_direction;
        table.page_length = previous.page_length;
        self.data = AppData::from_page(page);
        table.rebuild(&self.data.sessions, keep.as_deref());
        self.table = table;
        self.row_states.clear();
        self.confirm = None;
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Reload,
    SubmitUpdate {
        session_id: String,
        game_name: String,
        duration_minutes: u32,
    },
    RemoveSession {
        session_id: String,
    },
    DeleteIdleSession {
        session_id: String,
    },
    ConvertIdleSession {
        session_id: String,
    },
    SwitchSessionProfile {
        session_id: String,
        profile_id: i64,
    },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
    }
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    model.notice = None;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => return (model, AppCommand::Quit),
            KeyCode::Char('r') => {
                if model.reload_in_flight {
                    return (model, AppCommand::None);
                }
                return (model, AppCommand::Reload);
            }
            _ => {}
        }
    }

    if model.confirm.is_some() {
        return update_on_confirm_key(model, key);
    }

    if model.help_open {
        model.help_open = false;
        return (model, AppCommand::None);
    }

    if model.table.search_active {
        return update_on_search_key(model, key);
    }

    let editing_selected = model
        .selected_session()
        .map(|session| session.id.clone())
        .filter(|id| matches!(model.row_states.get(id), Some(RowEditState::Editing(_))));
    if let Some(session_id) = editing_selected {
        return update_on_editing_key(model, session_id, key);
    }

    update_on_view_key(model, key)
}

fn update_on_confirm_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            let Some(dialog) = model.confirm.take() else {
                return (model, AppCommand::None);
            };
            let command = match dialog.action {
                ConfirmAction::DeleteSession {
                    session_id,
                    session_type: SessionType::Idle,
                } => AppCommand::DeleteIdleSession { session_id },
                ConfirmAction::DeleteSession {
                    session_id,
                    session_type: SessionType::Active,
                } => AppCommand::RemoveSession { session_id },
                ConfirmAction::ConvertIdleSession { session_id } => {
                    AppCommand::ConvertIdleSession { session_id }
                }
                ConfirmAction::SwitchSessionProfile {
                    session_id,
                    profile_id,
                    ..
                } => AppCommand::SwitchSessionProfile {
                    session_id,
                    profile_id,
                },
            };
            (model, command)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            model.confirm = None;
            (model, AppCommand::None)
        }
        _ => (model, AppCommand::None),
    }
}

fn update_on_search_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            model.table.search_active = false;
            model.table.query.clear();
            model.refresh_table();
        }
        KeyCode::Enter => {
            model.table.search_active = false;
        }
        KeyCode::Backspace => {
            model.table.query.pop();
            model.refresh_table();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            model.table.query.push(ch);
            model.refresh_table();
        }
        _ => {}
    }
    (model, AppCommand::None)
}

fn update_on_editing_key(
    mut model: AppModel,
    session_id: String,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            // Cancel: drop draft and snapshot; the record was never touched.
            model.row_states.remove(&session_id);
            return (model, AppCommand::None);
        }
        KeyCode::Enter => return commit_edit(model, session_id),
        _ => {}
    }

    let Some(RowEditState::Editing(draft)) = model.row_states.get_mut(&session_id) else {
        return (model, AppCommand::None);
    };
    match key.code {
        KeyCode::Tab => draft.focus = draft.focus.next(),
        KeyCode::BackTab => draft.focus = draft.focus.prev(),
        KeyCode::Left => draft.focused_editor().move_left(),
        KeyCode::Right => draft.focused_editor().move_right(),
        KeyCode::Home => draft.focused_editor().move_home(),
        KeyCode::End => draft.focused_editor().move_end(),
        KeyCode::Backspace => draft.focused_editor().backspace(),
        KeyCode::Delete => draft.focused_editor().delete_forward(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            draft.focused_editor().insert_char(ch);
        }
        _ => {}
    }
    (model, AppCommand::None)
}

fn commit_edit(mut model: AppModel, session_id: String) -> (AppModel, AppCommand) {
    let Some(RowEditState::Editing(draft)) = model.row_states.remove(&session_id) else {
        return (model, AppCommand::None);
    };
    let game_name = draft.name.text.trim().to_string();
    let duration_minutes = draft.duration_minutes();
    model
        .row_states
        .insert(session_id.clone(), RowEditState::Saving(draft.snapshot));
    (
        model,
        AppCommand::SubmitUpdate {
            session_id,
            game_name,
            duration_minutes,
        },
    )
}

fn update_on_view_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('q') => return (model, AppCommand::Quit),
        KeyCode::Char('?') => {
            model.help_open = true;
            return (model, AppCommand::None);
        }
        KeyCode::Char('/') => {
            model.table.search_active = true;
            return (model, AppCommand::None);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            model.table.move_selection(-1);
            return (model, AppCommand::None);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            model.table.move_selection(1);
            return (model, AppCommand::None);
        }
        KeyCode::Home => {
            model.table.selected = 0;
            return (model, AppCommand::None);
        }
        KeyCode::End => {
            model.table.selected = model.table.row_order.len().saturating_sub(1);
            return (model, AppCommand::None);
        }
        KeyCode::PageDown | KeyCode::Char('n') => {
            let size = model.table.page_size() as isize;
            model.table.move_selection(size);
            return (model, AppCommand::None);
        }
        KeyCode::PageUp | KeyCode::Char('p') => {
            let size = model.table.page_size() as isize;
            model.table.move_selection(-size);
            return (model, AppCommand::None);
        }
        KeyCode::Char('L') => {
            model.table.page_length = model.table.page_length.cycle();
            return (model, AppCommand::None);
        }
        KeyCode::Char('o') => {
            model.table.sort_column = model.table.sort_column.cycle();
            model.refresh_table();
            return (model, AppCommand::None);
        }
        KeyCode::Char('r') => {
            model.table.sort_direction = model.table.sort_direction.toggle();
            model.refresh_table();
            return (model, AppCommand::None);
        }
        _ => {}
    }

    let Some(action) = row_action_for_key(key.code) else {
        return (model, AppCommand::None);
    };
    dispatch_row_action(model, action)
}

/// Explicit gesture table: a key maps to a logical action, and the action
/// only fires when the selected row's type-dependent set offers it.
fn row_action_for_key(code: KeyCode) -> Option<RowAction> {
    match code {
        KeyCode::Char('e') | KeyCode::Enter => Some(RowAction::Edit),
        KeyCode::Char('d') | KeyCode::Delete => Some(RowAction::Delete),
        KeyCode::Char('c') => Some(RowAction::ConvertToActive),
        KeyCode::Char('w') => Some(RowAction::SwitchProfile),
        _ => None,
    }
}

fn dispatch_row_action(mut model: AppModel, action: RowAction) -> (AppModel, AppCommand) {
    let Some(session) = model.selected_session().cloned() else {
        return (model, AppCommand::None);
    };
    if !model.actions_for(&session).contains(&action) {
        return (model, AppCommand::None);
    }

    match action {
        RowAction::Edit => {
            begin_edit(&mut model, &session);
            (model, AppCommand::None)
        }
        RowAction::Delete => {
            model.confirm = Some(ConfirmDialog {
                action: ConfirmAction::DeleteSession {
                    session_id: session.id.clone(),
                    session_type: session.session_type,
                },
                game_name: session.game_name.clone(),
            });
            (model, AppCommand::None)
        }
        RowAction::ConvertToActive => {
            model.confirm = Some(ConfirmDialog {
                action: ConfirmAction::ConvertIdleSession {
                    session_id: session.id.clone(),
                },
                game_name: session.game_name.clone(),
            });
            (model, AppCommand::None)
        }
        RowAction::SwitchProfile => {
            let Some(target) = model.switch_target().cloned() else {
                return (model, AppCommand::None);
            };
            model.confirm = Some(ConfirmDialog {
                action: ConfirmAction::SwitchSessionProfile {
                    session_id: session.id.clone(),
                    profile_id: target.id,
                    profile_name: target.name,
                },
                game_name: session.game_name.clone(),
            });
            (model, AppCommand::None)
        }
        RowAction::Save | RowAction::Cancel => (model, AppCommand::None),
    }
}

fn begin_edit(model: &mut AppModel, session: &Session) {
    match model.row_states.get(&session.id) {
        // Re-entrant edit is ignored; the existing draft stays intact.
        Some(RowEditState::Editing(_)) => {}
        Some(RowEditState::Saving(_)) => {
            model.notice = Some("Save in progress; wait for it to finish.".to_string());
        }
        None => {
            let draft = EditDraft::for_session(session);
            model
                .row_states
                .insert(session.id.clone(), RowEditState::Editing(draft));
        }
    }
}

/// Outcome of the in-flight update for one row. On success the committed
/// values are patched into the record in place; on failure the record was
/// never touched, so dropping the row state restores the pre-edit display
/// exactly as cancel would.
pub fn apply_update_outcome(
    model: &mut AppModel,
    session_id: &str,
    outcome: Result<(String, u32), String>,
) {
    if model.row_states.remove(session_id).is_none() {
        // Stale resolution for a row the reload already discarded.
        return;
    }
    match outcome {
        Ok((game_name, duration_minutes)) => {
            if let Some(session) = model
                .data
                .sessions
                .iter_mut()
                .find(|session| session.id == session_id)
            {
                session.game_name = game_name;
                session.duration_minutes = duration_minutes;
            }
            model.refresh_table();
            model.notice = Some("Session updated.".to_string());
        }
        Err(message) => {
            model.notice = Some(format!("Update failed: {message}. Changes reverted."));
        }
    }
}

/// Outcome of a delete/convert/switch request. Returns whether the caller
/// should trigger the full reload: only success does, so a failure never
/// leaves the table implying the mutation happened.
pub fn apply_mutation_completed(
    model: &mut AppModel,
    description: &str,
    result: Result<(), String>,
) -> bool {
    match result {
        Ok(()) => true,
        Err(message) => {
            model.notice = Some(format!("{description} failed: {message}"));
            false
        }
    }
}

pub fn apply_page_load(model: &mut AppModel, result: Result<PageData, String>) {
    model.reload_in_flight = false;
    match result {
        Ok(page) => {
            model.rebuild_with_page(page);
            model.notice = Some("Reloaded.".to_string());
        }
        Err(message) => {
            model.notice = Some(format!("Reload failed: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format_minutes;

    fn make_session(id: &str, name: &str, minutes: u32, session_type: SessionType) -> Session {
        Session {
            id: id.to_string(),
            game_name: name.to_string(),
            icon_path: format!("resources/images/{id}.png"),
            duration_minutes: minutes,
            start_date: "2026-08-20".to_string(),
            start_time: "19:00".to_string(),
            end_time: "20:00".to_string(),
            session_type,
        }
    }

    fn profile(id: i64, name: &str) -> Profile {
        Profile {
            id,
            name: name.to_string(),
        }
    }

    fn model_with(sessions: Vec<Session>, profiles: Vec<Profile>, current: Option<i64>) -> AppModel {
        AppModel::new(AppData::from_page(PageData {
            sessions,
            profiles,
            current_profile_id: current,
        }))
    }

    fn two_profile_model() -> AppModel {
        model_with(
            vec![
                make_session("a1", "Stardew Valley", 135, SessionType::Active),
                make_session("i1", "Stardew Valley", 12, SessionType::Idle),
            ],
            vec![profile(1, "Family"), profile(2, "Guest")],
            Some(1),
        )
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn press(model: AppModel, code: KeyCode) -> (AppModel, AppCommand) {
        update(model, key(code))
    }

    fn type_text(mut model: AppModel, text: &str) -> AppModel {
        for ch in text.chars() {
            let (next, _) = press(model, KeyCode::Char(ch));
            model = next;
        }
        model
    }

    #[test]
    fn edit_then_cancel_restores_displayed_values() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Char('e'));
        assert!(matches!(
            model.row_state("a1"),
            Some(RowEditState::Editing(_))
        ));

        let model = type_text(model, "XYZ");
        let (model, command) = press(model, KeyCode::Esc);
        assert_eq!(command, AppCommand::None);
        assert!(model.row_state("a1").is_none());

        let session = model.selected_session().expect("selected session");
        assert_eq!(session.game_name, "Stardew Valley");
        assert_eq!(format_minutes(session.duration_minutes), "2h 15m");
    }

    #[test]
    fn save_commits_draft_and_enters_saving() {
        let model = two_profile_model();
        let (mut model, _) = press(model, KeyCode::Char('e'));

        // Rewrite the draft directly, the way a user would after clearing
        // the fields: name "Foo", 1 hour, 30 minutes.
        let Some(RowEditState::Editing(draft)) = model.row_states.get_mut("a1") else {
            panic!("expected editing state");
        };
        draft.name = LineEditor::from_text("Foo".to_string(), InputMask::Text);
        draft.hours = LineEditor::from_text("1".to_string(), InputMask::Digits { max: 9999 });
        draft.minutes = LineEditor::from_text("30".to_string(), InputMask::Digits { max: 59 });

        let (model, command) = press(model, KeyCode::Enter);
        assert_eq!(
            command,
            AppCommand::SubmitUpdate {
                session_id: "a1".to_string(),
                game_name: "Foo".to_string(),
                duration_minutes: 90,
            }
        );
        assert!(matches!(model.row_state("a1"), Some(RowEditState::Saving(_))));
    }

    #[test]
    fn successful_save_patches_row_in_place() {
        let model = two_profile_model();
        let (mut model, _) = press(model, KeyCode::Char('e'));
        let (next, _) = press(model.clone(), KeyCode::Enter);
        model = next;

        apply_update_outcome(&mut model, "a1", Ok(("Foo".to_string(), 90)));
        let session = model
            .data
            .sessions
            .iter()
            .find(|session| session.id == "a1")
            .expect("session");
        assert_eq!(session.game_name, "Foo");
        assert_eq!(format_minutes(session.duration_minutes), "1h 30m");
        assert!(model.row_state("a1").is_none());

        // No snapshot remains: a subsequent cancel gesture is a no-op.
        let (model, command) = press(model, KeyCode::Esc);
        assert_eq!(command, AppCommand::None);
        let session = model
            .data
            .sessions
            .iter()
            .find(|session| session.id == "a1")
            .expect("session");
        assert_eq!(session.game_name, "Foo");
    }

    #[test]
    fn failed_save_restores_pre_edit_values() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Char('e'));
        let (mut model, _) = press(model, KeyCode::Enter);

        apply_update_outcome(&mut model, "a1", Err("unknown game name".to_string()));
        let session = model
            .data
            .sessions
            .iter()
            .find(|session| session.id == "a1")
            .expect("session");
        assert_eq!(session.game_name, "Stardew Valley");
        assert_eq!(session.duration_minutes, 135);
        assert!(model.row_state("a1").is_none());
        assert!(model.notice.as_deref().unwrap_or("").contains("reverted"));
    }

    #[test]
    fn double_edit_keeps_draft_intact() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Char('e'));
        let model = type_text(model, "!!");

        // The selected row is editing, so 'e' lands in the name field as
        // text; dispatching the edit action directly must still be a no-op.
        let (model, command) = dispatch_row_action(
            model,
            RowAction::Edit,
        );
        assert_eq!(command, AppCommand::None);
        let Some(RowEditState::Editing(draft)) = model.row_state("a1") else {
            panic!("expected editing state");
        };
        assert_eq!(draft.name.text, "Stardew Valley!!");
        assert_eq!(draft.snapshot.game_name, "Stardew Valley");
    }

    #[test]
    fn saving_row_refuses_edit_reentry() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Char('e'));
        let (model, _) = press(model, KeyCode::Enter);
        assert!(matches!(model.row_state("a1"), Some(RowEditState::Saving(_))));

        let (model, command) = press(model, KeyCode::Char('e'));
        assert_eq!(command, AppCommand::None);
        assert!(matches!(model.row_state("a1"), Some(RowEditState::Saving(_))));
        assert!(model.notice.is_some());
    }

    #[test]
    fn idle_row_converts_but_never_switches() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Down);
        let selected = model.selected_session().expect("selected");
        assert_eq!(selected.session_type, SessionType::Idle);

        let (model, command) = press(model, KeyCode::Char('w'));
        assert_eq!(command, AppCommand::None);
        assert!(model.confirm.is_none());

        let (model, _) = press(model, KeyCode::Char('c'));
        assert!(matches!(
            model.confirm,
            Some(ConfirmDialog {
                action: ConfirmAction::ConvertIdleSession { .. },
                ..
            })
        ));
        let (_, command) = press(model, KeyCode::Char('y'));
        assert_eq!(
            command,
            AppCommand::ConvertIdleSession {
                session_id: "i1".to_string()
            }
        );
    }

    #[test]
    fn active_row_switches_but_never_converts() {
        let model = two_profile_model();
        let (model, command) = press(model, KeyCode::Char('c'));
        assert_eq!(command, AppCommand::None);
        assert!(model.confirm.is_none());

        let (model, _) = press(model, KeyCode::Char('w'));
        let (_, command) = press(model, KeyCode::Enter);
        assert_eq!(
            command,
            AppCommand::SwitchSessionProfile {
                session_id: "a1".to_string(),
                profile_id: 2,
            }
        );
    }

    #[test]
    fn single_profile_offers_no_switch() {
        let model = model_with(
            vec![make_session("a1", "Hades", 40, SessionType::Active)],
            vec![profile(1, "Family")],
            Some(1),
        );
        assert!(model.switch_target().is_none());
        let (model, command) = press(model, KeyCode::Char('w'));
        assert_eq!(command, AppCommand::None);
        assert!(model.confirm.is_none());
    }

    #[test]
    fn delete_routes_by_session_type() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Char('d'));
        let (model, command) = press(model, KeyCode::Char('y'));
        assert_eq!(
            command,
            AppCommand::RemoveSession {
                session_id: "a1".to_string()
            }
        );

        let (model, _) = press(model, KeyCode::Down);
        let (model, _) = press(model, KeyCode::Char('d'));
        let (_, command) = press(model, KeyCode::Char('y'));
        assert_eq!(
            command,
            AppCommand::DeleteIdleSession {
                session_id: "i1".to_string()
            }
        );
    }

    #[test]
    fn confirm_cancel_issues_nothing() {
        let model = two_profile_model();
        let (model, _) = press(model, KeyCode::Char('d'));
        let (model, command) = press(model, KeyCode::Char('n'));
        assert_eq!(command, AppCommand::None);
        assert!(model.confirm.is_none());
    }

    #[test]
    fn initial_order_is_newest_first() {
        let mut old = make_session("old", "Hades", 30, SessionType::Active);
        old.start_date = "2026-08-01".to_string();
        let mut late = make_session("late", "Hades", 30, SessionType::Active);
        late.start_date = "2026-08-20".to_string();
        late.start_time = "23:00".to_string();
        let mut early = make_session("early", "Hades", 30, SessionType::Active);
        early.start_date = "2026-08-20".to_string();
        early.start_time = "08:00".to_string();

        let model = model_with(vec![old, late, early], Vec::new(), None);
        let ids: Vec<&str> = model
            .table
            .row_order
            .iter()
            .map(|&index| model.data.sessions[index].id.as_str())
            .collect();
        assert_eq!(ids, vec!["late", "early", "old"]);
    }

    #[test]
    fn search_matches_game_and_date_only() {
        let mut a = make_session("a", "Stardew Valley", 30, SessionType::Active);
        a.end_time = "22:22".to_string();
        let b = make_session("b", "Hades", 30, SessionType::Active);
        let mut model = model_with(vec![a, b], Vec::new(), None);

        model.table.query = "stardew".to_string();
        model.refresh_table();
        assert_eq!(model.table.row_order.len(), 1);

        model.table.query = "2026-08".to_string();
        model.refresh_table();
        assert_eq!(model.table.row_order.len(), 2);

        // End time text is not a searchable column.
        model.table.query = "22:22".to_string();
        model.refresh_table();
        assert!(model.table.row_order.is_empty());
    }

    #[test]
    fn page_bounds_follow_selection() {
        let sessions: Vec<Session> = (0..30)
            .map(|i| make_session(&format!("s{i:02}"), "Hades", 30, SessionType::Active))
            .collect();
        let mut model = model_with(sessions, Vec::new(), None);
        model.table.page_length = PageLength::Ten;

        model.table.selected = 3;
        assert_eq!(model.table.page_bounds(), (0, 10));
        model.table.selected = 17;
        assert_eq!(model.table.page_bounds(), (10, 20));
        model.table.page_length = PageLength::All;
        assert_eq!(model.table.page_bounds(), (0, 30));
    }

    #[test]
    fn reload_rebuilds_wholesale_and_preserves_selection_by_id() {
        let mut model = two_profile_model();
        model
            .row_states
            .insert("a1".to_string(), RowEditState::Saving(EditSnapshot {
                game_name: "Stardew Valley".to_string(),
                duration_minutes: 135,
            }));

        let page = PageData {
            sessions: vec![
                make_session("x", "Celeste", 20, SessionType::Active),
                make_session("a1", "Stardew Valley", 140, SessionType::Active),
            ],
            profiles: vec![profile(1, "Family"), profile(2, "Guest")],
            current_profile_id: Some(1),
        };
        apply_page_load(&mut model, Ok(page));

        assert!(model.row_states.is_empty());
        assert!(!model.reload_in_flight);
        assert_eq!(
            model.selected_session().map(|session| session.id.as_str()),
            Some("a1")
        );
    }

    #[test]
    fn malformed_data_renders_empty_and_inert() {
        let model = AppModel::new(AppData::from_error(
            "session data is missing or not an array".to_string(),
        ));
        assert!(model.data.load_error.is_some());
        assert!(model.selected_session().is_none());
        let (model, command) = press(model, KeyCode::Char('e'));
        assert_eq!(command, AppCommand::None);
        assert!(model.row_states.is_empty());
    }

    #[test]
    fn failed_destructive_mutation_skips_reload() {
        let mut model = two_profile_model();
        let reload = apply_mutation_completed(
            &mut model,
            "Delete session",
            Err("connection refused".to_string()),
        );
        assert!(!reload);
        assert!(model.notice.as_deref().unwrap_or("").contains("failed"));

        let reload = apply_mutation_completed(&mut model, "Delete session", Ok(()));
        assert!(reload);
    }

    #[test]
    fn concurrent_saves_resolve_per_row() {
        let mut model = model_with(
            vec![
                make_session("a", "Hades", 30, SessionType::Active),
                make_session("b", "Celeste", 45, SessionType::Active),
            ],
            Vec::new(),
            None,
        );
        for id in ["a", "b"] {
            let snapshot = EditSnapshot {
                game_name: String::new(),
                duration_minutes: 0,
            };
            model
                .row_states
                .insert(id.to_string(), RowEditState::Saving(snapshot));
        }

        apply_update_outcome(&mut model, "a", Ok(("Hades II".to_string(), 60)));
        assert!(model.row_state("a").is_none());
        assert!(matches!(model.row_state("b"), Some(RowEditState::Saving(_))));
        assert_eq!(
            model
                .data
                .sessions
                .iter()
                .find(|session| session.id == "b")
                .map(|session| session.game_name.as_str()),
            Some("Celeste")
        );
    }
}
