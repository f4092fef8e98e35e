pub mod theme;

use crate::app::{AppModel, EditDraft, EditField, LineEditor, RowEditState};
use crate::domain::{RowAction, Session, SessionType, format_minutes};
use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

const CURSOR_MARK: char = '▏';

pub fn render(frame: &mut Frame, model: &AppModel) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .areas(full_area);

    render_header(frame, header_area, model);

    if let Some(error) = &model.data.load_error {
        render_error_page(frame, body_area, error);
    } else {
        render_table(frame, body_area, model);
    }

    render_footer(frame, footer_area, model);

    if let Some(confirm) = &model.confirm {
        render_confirm_overlay(frame, body_area, &confirm.prompt());
    }

    if model.help_open {
        render_help_overlay(frame, body_area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, model: &AppModel) {
    let profile = match model.current_profile() {
        Some(profile) => format!("profile: {}", sanitize_cell(&profile.name)),
        None => "all profiles".to_string(),
    };
    let title = format!(
        " playtrail — session history · {profile} · {} sessions ",
        model.data.sessions.len()
    );
    let text = truncate_end(&title, area.width as usize);
    let padding = (area.width as usize).saturating_sub(UnicodeWidthStr::width(text.as_str()));
    let line = Line::from(vec![
        Span::raw(text),
        Span::raw(" ".repeat(padding)),
    ]);
    frame.render_widget(Paragraph::new(line).style(theme::header_bar()), area);
}

fn render_error_page(frame: &mut Frame, area: Rect, error: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Could not render session history: {}", sanitize_cell(error)),
            theme::error_text(),
        )),
        Line::from(""),
        Line::from(Span::styled("Ctrl+R to retry the load.", theme::hint())),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_table(frame: &mut Frame, area: Rect, model: &AppModel) {
    let (page_start, page_end) = model.table.page_bounds();

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Game"),
        Cell::from("Duration"),
        Cell::from("Date"),
        Cell::from("Start"),
        Cell::from("End"),
        Cell::from("Actions"),
    ])
    .style(theme::table_header());

    let mut rows: Vec<Row> = Vec::with_capacity(page_end.saturating_sub(page_start));
    for &session_index in &model.table.row_order[page_start..page_end] {
        let session = &model.data.sessions[session_index];
        rows.push(session_row(model, session));
    }

    let widths = [
        Constraint::Length(2),
        Constraint::Fill(2),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(24),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(theme::selected_row());

    let mut state = TableState::default();
    if page_end > page_start {
        state.select(Some(model.table.selected - page_start));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn session_row<'a>(model: &AppModel, session: &'a Session) -> Row<'a> {
    // The row style is fixed by the record's type; entering edit mode does
    // not change it, only a type-changing mutation (and its reload) does.
    let row_style = match session.session_type {
        SessionType::Active => theme::active_row(),
        SessionType::Idle => theme::idle_row(),
    };

    // Untrusted fields are sanitized once per cell per frame; the icon
    // fallback is likewise re-derived every frame, so no rewrite can
    // drop it.
    let icon = Cell::from(session.icon_glyph());
    let row_state = model.row_state(&session.id);

    let (name_cell, duration_cell) = match row_state {
        Some(RowEditState::Editing(draft)) => (
            Cell::from(editor_text(&draft.name, draft.focus == EditField::Name))
                .style(theme::editing_cell()),
            Cell::from(duration_editor_text(draft)).style(theme::editing_cell()),
        ),
        _ => (
            Cell::from(sanitize_cell(&session.game_name)),
            Cell::from(format_minutes(session.duration_minutes)),
        ),
    };

    let actions_cell = match row_state {
        Some(RowEditState::Editing(_)) => Cell::from(join_action_labels(&[
            RowAction::Save,
            RowAction::Cancel,
        ]))
        .style(theme::editing_cell()),
        Some(RowEditState::Saving(_)) => Cell::from("saving…").style(theme::saving_cell()),
        None => Cell::from(join_action_labels(&model.actions_for(session))),
    };

    Row::new(vec![
        icon,
        name_cell,
        duration_cell,
        Cell::from(sanitize_cell(&session.start_date)),
        Cell::from(sanitize_cell(&session.start_time)),
        Cell::from(sanitize_cell(&session.end_time)),
        actions_cell,
    ])
    .style(row_style)
}

fn join_action_labels(actions: &[RowAction]) -> String {
    actions
        .iter()
        .map(|action| action.label())
        .collect::<Vec<_>>()
        .join(" · ")
}

fn editor_text(editor: &LineEditor, focused: bool) -> String {
    let text = sanitize_cell(&editor.text);
    if !focused {
        return text;
    }
    let mut out = String::with_capacity(text.len() + CURSOR_MARK.len_utf8());
    for (col, ch) in text.chars().enumerate() {
        if col == editor.cursor_col {
            out.push(CURSOR_MARK);
        }
        out.push(ch);
    }
    if editor.cursor_col >= text.chars().count() {
        out.push(CURSOR_MARK);
    }
    out
}

fn duration_editor_text(draft: &EditDraft) -> String {
    format!(
        "{}h {}m",
        editor_text(&draft.hours, draft.focus == EditField::Hours),
        editor_text(&draft.minutes, draft.focus == EditField::Minutes),
    )
}

fn render_footer(frame: &mut Frame, area: Rect, model: &AppModel) {
    let [status_area, info_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

    let status_line = if model.table.search_active {
        Line::from(vec![
            Span::raw("/"),
            Span::raw(model.table.query.clone()),
            Span::raw(CURSOR_MARK.to_string()),
        ])
    } else if let Some(notice) = &model.notice {
        Line::from(Span::styled(sanitize_cell(notice), theme::notice()))
    } else {
        Line::from(Span::styled(
            "e edit · d delete · c convert · w switch · / search · ? help · q quit",
            theme::hint(),
        ))
    };
    frame.render_widget(Paragraph::new(status_line), status_area);

    let shown = model.table.row_order.len();
    let page_size = model.table.page_size().max(1);
    let page = model.table.selected / page_size + 1;
    let pages = shown.div_ceil(page_size).max(1);
    let info = format!(
        "sort: {} {} · page {page}/{pages} (len {}) · {shown}/{} rows",
        model.table.sort_column.label(),
        model.table.sort_direction.label(),
        model.table.page_length.label(),
        model.data.sessions.len(),
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(info, theme::hint()))),
        info_area,
    );
}

fn render_confirm_overlay(frame: &mut Frame, area: Rect, prompt: &str) {
    let popup = centered_rect(area, 56, 5);
    if popup.width == 0 || popup.height == 0 {
        return;
    }
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .title("Confirm");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines = vec![
        Line::from(sanitize_cell(prompt)),
        Line::from(""),
        Line::from(Span::styled("y confirm · n cancel", theme::hint())),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let bindings = [
        ("Up/Down", "move between rows"),
        ("e / Enter", "edit the selected row"),
        ("Tab", "next input while editing"),
        ("Enter", "save edits"),
        ("Esc", "cancel edits"),
        ("d / Del", "delete session (confirm)"),
        ("c", "convert idle session to active"),
        ("w", "switch session to the other profile"),
        ("/", "search game or date"),
        ("o / r", "sort column / direction"),
        ("n / p", "next / previous page"),
        ("L", "cycle page length"),
        ("Ctrl+R", "reload from the backend"),
        ("q", "quit"),
    ];

    let height = (bindings.len() as u16).saturating_add(2).min(area.height);
    let popup = centered_rect(area, 46, height);
    if popup.width == 0 || popup.height == 0 {
        return;
    }
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .title("Keys");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let key_width = bindings
        .iter()
        .map(|(keys, _)| UnicodeWidthStr::width(*keys))
        .max()
        .unwrap_or(0);
    let lines: Vec<Line> = bindings
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{keys:<key_width$}  "), theme::table_header()),
                Span::raw(*what),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Strips control characters from an untrusted field before it reaches the
/// terminal, so no record can smuggle escape sequences into the display.
pub fn sanitize_cell(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

pub fn truncate_end(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let budget = max_width.saturating_sub(UnicodeWidthStr::width(ellipsis));
    let mut width = 0usize;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > budget {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputMask;

    #[test]
    fn sanitize_flattens_control_characters() {
        assert_eq!(sanitize_cell("a\x1b[31mb"), "a [31mb");
        assert_eq!(sanitize_cell("plain"), "plain");
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate_end("short", 10), "short");
        assert_eq!(truncate_end("a long game title", 7), "a long…");
    }

    #[test]
    fn focused_editor_carries_a_cursor_mark() {
        let editor = LineEditor::from_text("abc".to_string(), InputMask::Text);
        assert_eq!(editor_text(&editor, false), "abc");
        assert!(editor_text(&editor, true).contains(CURSOR_MARK));
    }
}
