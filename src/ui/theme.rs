use ratatui::style::{Color, Modifier, Style};

pub fn header_bar() -> Style {
    Style::default().fg(Color::White).bg(Color::DarkGray)
}

pub fn table_header() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn active_row() -> Style {
    Style::default()
}

pub fn idle_row() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn selected_row() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn editing_cell() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn saving_cell() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::DIM)
}

pub fn notice() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn hint() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn error_text() -> Style {
    Style::default().fg(Color::Red)
}
