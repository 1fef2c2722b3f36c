//! Status bar — bottom line with the last error and the keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app_state::Notice;
use crate::theme::{C_ERROR, C_MODE_FILTER, C_MODE_NORMAL, C_MUTED, C_SECONDARY};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Page {
    Main,
    Filters,
}

/// Draw the status line: the last non-fatal error, or the last notice.
pub fn draw_status_line(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
    let span = match notice {
        Some(n) if n.error => Span::styled(n.text.as_str(), Style::default().fg(C_ERROR)),
        Some(n) => Span::styled(n.text.as_str(), Style::default().fg(C_SECONDARY)),
        None => Span::raw(""),
    };
    frame.render_widget(Paragraph::new(Line::from(vec![Span::raw(" "), span])), area);
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, page: Page) {
    let (label, color, keys) = match page {
        Page::Main => (
            "TGLOAD",
            C_MODE_NORMAL,
            " ↑↓ move  Enter download  d delete  m archive  r refresh  n next  Space start/stop  o open  Tab pane  f filters  q quit",
        ),
        Page::Filters => (
            "FILTERS",
            C_MODE_FILTER,
            " ↑↓ move  Space toggle  0-9 edit  Backspace erase  r reset  Enter apply  Esc cancel",
        ),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
