//! VideoList — the middle pane: every catalog video passing the filter.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Cell, Row, Table},
    Frame,
};

use tgload_core::WindowController;
use tgload_proto::protocol::FileId;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{fit, navigate},
    theme::{progress_color, style_secondary, style_selected_focused, C_FILTER_FG},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::{fmt_duration, fmt_mb},
    },
};

/// Borders plus the column header.
const CHROME_ROWS: u16 = 3;
const DURATION_W: u16 = 6;
const SIZE_W: u16 = 7;

pub struct VideoList {
    pub window: WindowController,
}

impl VideoList {
    pub fn new() -> Self {
        Self {
            window: WindowController::default(),
        }
    }

    fn ids(state: &AppState) -> Vec<FileId> {
        state.filtered().iter().map(|v| v.file_id).collect()
    }

    pub fn focused_id(&self, state: &AppState) -> Option<FileId> {
        self.window.focused_item(&Self::ids(state)).copied()
    }

    /// The filtered list changed under the focus; keep the focus on a real
    /// row.
    pub fn sync(&mut self, state: &AppState) {
        let len = state.filtered().len();
        if self.window.focused().is_some_and(|f| f >= len) {
            self.window.move_by(len, 0);
        }
    }

    pub fn title(&self, state: &AppState) -> String {
        let total = state.videos.len();
        let filtered = state.filtered().len();
        match self.window.focused() {
            Some(f) if f < filtered => format!("videos ({} / {} / {})", total, filtered, f + 1),
            _ => format!("videos ({} / {})", total, filtered),
        }
    }
}

impl Default for VideoList {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for VideoList {
    fn id(&self) -> ComponentId {
        ComponentId::VideoList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        let ids = Self::ids(state);
        if navigate(&mut self.window, ids.len(), key.code) {
            return vec![Action::Pointed(self.window.focused_item(&ids).copied())];
        }

        match key.code {
            KeyCode::Char('r') => return vec![Action::Refresh],
            KeyCode::Char('n') => return vec![Action::LoadNext],
            _ => {}
        }

        let Some(&id) = self.window.focused_item(&ids) else {
            return vec![];
        };
        match key.code {
            KeyCode::Enter => vec![Action::StartDownload(id)],
            KeyCode::Char('d') => vec![Action::DeleteMessage(id)],
            KeyCode::Char('m') => vec![Action::Archive(id)],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let ids = Self::ids(state);
        match event.kind {
            MouseEventKind::ScrollDown => self.window.move_by(ids.len(), 1),
            MouseEventKind::ScrollUp => self.window.move_by(ids.len(), -1),
            MouseEventKind::Down(_) => {
                let top = area.y + CHROME_ROWS - 1;
                if event.row < top || event.row + 1 >= area.y + area.height {
                    return vec![];
                }
                if !self.window.point_at(ids.len(), (event.row - top) as usize) {
                    return vec![];
                }
            }
            _ => return vec![],
        }
        vec![Action::Pointed(self.window.focused_item(&ids).copied())]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.window
            .set_viewport_height(area.height.saturating_sub(CHROME_ROWS) as usize);

        let items = state.filtered();
        let caption_w = area.width.saturating_sub(2 + DURATION_W + SIZE_W + 2) as usize;
        let focused_row = self.window.focused();

        let rows: Vec<Row> = self
            .window
            .visible_range(items.len())
            .map(|i| {
                let v = items[i];
                let color = progress_color(v.completed(), v.downloaded_size);
                let style = if Some(i) == focused_row {
                    style_selected_focused().fg(color)
                } else {
                    Style::default().fg(color)
                };
                Row::new(vec![
                    Cell::from(fit(v.title(), caption_w)),
                    Cell::from(fmt_duration(v.duration)),
                    Cell::from(fmt_mb(v.expected_size)),
                ])
                .style(style)
            })
            .collect();

        let badge = state.filter.is_active().then_some(Badge {
            text: "FILTERED",
            color: C_FILTER_FG,
        });
        let block = pane_chrome(self.title(state), None, focused, badge);
        let table = Table::new(
            rows,
            [
                Constraint::Min(4),
                Constraint::Length(DURATION_W),
                Constraint::Length(SIZE_W),
            ],
        )
        .header(Row::new(vec!["caption", "dur", "size"]).style(style_secondary()))
        .block(block);
        frame.render_widget(table, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::test_video;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> AppState {
        AppState {
            videos: (1..=4).map(|id| test_video(id, 60 * id as u32, 100, 0)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn title_counts_total_filtered_and_focus() {
        let mut list = VideoList::new();
        let mut state = state();
        assert_eq!(list.title(&state), "videos (4 / 4)");

        state.filter.max_duration_secs = Some(120);
        list.handle_key(key(KeyCode::Down), &state);
        list.handle_key(key(KeyCode::Down), &state);
        assert_eq!(list.title(&state), "videos (4 / 2 / 2)");
    }

    #[test]
    fn actions_need_a_focused_row() {
        let mut list = VideoList::new();
        let state = state();
        assert!(list.handle_key(key(KeyCode::Enter), &state).is_empty());
        assert_eq!(list.handle_key(key(KeyCode::Char('r')), &state), vec![Action::Refresh]);

        assert_eq!(
            list.handle_key(key(KeyCode::End), &state),
            vec![Action::Pointed(Some(4))]
        );
        assert_eq!(
            list.handle_key(key(KeyCode::Enter), &state),
            vec![Action::StartDownload(4)]
        );
        assert_eq!(
            list.handle_key(key(KeyCode::Char('d')), &state),
            vec![Action::DeleteMessage(4)]
        );
        assert_eq!(
            list.handle_key(key(KeyCode::Char('m')), &state),
            vec![Action::Archive(4)]
        );
        assert_eq!(
            list.handle_key(key(KeyCode::Esc), &state),
            vec![Action::Pointed(None)]
        );
    }

    #[test]
    fn sync_moves_focus_off_removed_rows() {
        let mut list = VideoList::new();
        let mut state = state();
        list.handle_key(key(KeyCode::End), &state);
        state.videos.truncate(2);
        list.sync(&state);
        assert_eq!(list.focused_id(&state), Some(1));
    }
}
