pub mod download_list;
pub mod filter_panel;
pub mod video_info;
pub mod video_list;

use ratatui::crossterm::event::KeyCode;
use unicode_width::UnicodeWidthChar;

use tgload_core::WindowController;

/// Shared list navigation. Returns true if the key was a movement key.
pub(crate) fn navigate(window: &mut WindowController, len: usize, code: KeyCode) -> bool {
    let page = window.viewport_height() as isize;
    match code {
        KeyCode::Up | KeyCode::Char('k') => window.move_by(len, -1),
        KeyCode::Down | KeyCode::Char('j') => window.move_by(len, 1),
        KeyCode::PageUp => window.move_by(len, -page),
        KeyCode::PageDown => window.move_by(len, page),
        KeyCode::Home => window.move_to_start(len),
        KeyCode::End => window.move_to_end(len),
        KeyCode::Esc => window.clear_focus(),
        _ => return false,
    }
    true
}

/// Cut `text` to `width` terminal cells, marking the cut with `…`.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            if width > 0 {
                while used + 1 > width {
                    match out.pop() {
                        Some(p) => used -= p.width().unwrap_or(0),
                        None => break,
                    }
                }
                out.push('…');
            }
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}
