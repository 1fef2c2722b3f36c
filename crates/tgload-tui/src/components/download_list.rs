//! DownloadList — the top pane: videos queued for download, with progress.
//!
//! Entries stay until their file completes; the check tick then drops them
//! and reports `Action::Downloaded` so the App can archive the file.

use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
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
    theme::{style_default, style_secondary, style_selected_focused, C_BADGE_OFF, C_BADGE_ON},
    widgets::{
        pane_chrome::pane_chrome,
        progress_bar::{bar, fmt_done_total, fmt_speed},
    },
};

const BAR_W: u16 = 8;
const SIZE_W: u16 = 9;
const SPEED_W: u16 = 10;

#[derive(Debug, Clone)]
struct DownloadEntry {
    file_id: FileId,
    last_sample: (Instant, u64),
    /// Smoothed bytes per second.
    speed: f64,
}

pub struct DownloadList {
    entries: Vec<DownloadEntry>,
    pub window: WindowController,
}

impl DownloadList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            window: WindowController::default(),
        }
    }

    fn ids(&self) -> Vec<FileId> {
        self.entries.iter().map(|e| e.file_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, file_id: FileId) -> bool {
        self.entries.iter().any(|e| e.file_id == file_id)
    }

    /// Add a video. A video already listed is left as it is.
    pub fn add(&mut self, file_id: FileId, downloaded: u64) {
        if self.contains(file_id) {
            return;
        }
        self.entries.push(DownloadEntry {
            file_id,
            last_sample: (Instant::now(), downloaded),
            speed: 0.0,
        });
    }

    pub fn remove(&mut self, file_id: FileId) {
        let before = self.entries.len();
        self.entries.retain(|e| e.file_id != file_id);
        if self.entries.len() != before {
            self.window.move_by(self.entries.len(), 0);
        }
    }

    pub fn focused_id(&self) -> Option<FileId> {
        self.window.focused_item(&self.ids()).copied()
    }

    fn sample_speeds(&mut self, state: &AppState, now: Instant) {
        for entry in &mut self.entries {
            let Some(item) = state.item(entry.file_id) else {
                continue;
            };
            let (at, bytes) = entry.last_sample;
            let elapsed = now.duration_since(at).as_secs_f64();
            if elapsed <= 0.0 {
                continue;
            }
            let instant = item.downloaded_size.saturating_sub(bytes) as f64 / elapsed;
            entry.speed = if state.has_slot(entry.file_id) {
                0.5 * entry.speed + 0.5 * instant
            } else {
                0.0
            };
            entry.last_sample = (now, item.downloaded_size);
        }
    }
}

impl Default for DownloadList {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for DownloadList {
    fn id(&self) -> ComponentId {
        ComponentId::DownloadList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        let ids = self.ids();
        if navigate(&mut self.window, ids.len(), key.code) {
            return vec![Action::Pointed(self.window.focused_item(&ids).copied())];
        }

        let Some(&id) = self.window.focused_item(&ids) else {
            return vec![];
        };
        match key.code {
            KeyCode::Char(' ') => {
                if state.has_slot(id) {
                    vec![Action::CancelDownload(id)]
                } else if state.item(id).is_some_and(|v| !v.completed()) {
                    vec![Action::StartDownload(id)]
                } else {
                    vec![]
                }
            }
            KeyCode::Char('d') => vec![Action::DeleteLocalFile(id)],
            KeyCode::Char('o') => vec![Action::OpenFile(id)],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let ids = self.ids();
        match event.kind {
            MouseEventKind::ScrollDown => self.window.move_by(ids.len(), 1),
            MouseEventKind::ScrollUp => self.window.move_by(ids.len(), -1),
            MouseEventKind::Down(_) => {
                let top = area.y + 1;
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

    /// Update transfer speeds, then drop completed entries and entries whose
    /// video left the catalog.
    fn tick(&mut self, state: &AppState) -> Vec<Action> {
        self.sample_speeds(state, Instant::now());

        let before = self.entries.len();
        let mut actions = Vec::new();
        self.entries.retain(|entry| match state.item(entry.file_id) {
            Some(item) if item.completed() => {
                actions.push(Action::Downloaded(entry.file_id));
                false
            }
            Some(_) => true,
            None => false,
        });
        if self.entries.len() != before {
            self.window.move_by(self.entries.len(), 0);
        }
        actions
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.window
            .set_viewport_height(area.height.saturating_sub(2) as usize);

        let caption_w = area
            .width
            .saturating_sub(2 + 2 + BAR_W + SIZE_W + SPEED_W + 4) as usize;
        let focused_row = self.window.focused();

        let rows: Vec<Row> = self
            .window
            .visible_range(self.entries.len())
            .filter_map(|i| {
                let entry = &self.entries[i];
                let item = state.item(entry.file_id)?;
                let running = state.has_slot(entry.file_id);
                let marker = if running {
                    Span::styled("●", Style::default().fg(C_BADGE_ON))
                } else {
                    Span::styled("○", Style::default().fg(C_BADGE_OFF))
                };
                let style = if Some(i) == focused_row {
                    style_selected_focused()
                } else {
                    style_default()
                };
                Some(
                    Row::new(vec![
                        Cell::from(marker),
                        Cell::from(fit(item.title(), caption_w)),
                        Cell::from(bar(item.progress(), BAR_W as usize)),
                        Cell::from(fmt_done_total(item.downloaded_size, item.expected_size)),
                        Cell::from(Span::styled(fmt_speed(entry.speed), style_secondary())),
                    ])
                    .style(style),
                )
            })
            .collect();

        let block = pane_chrome(format!("downloads ({})", self.entries.len()), None, focused, None);
        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(BAR_W),
                Constraint::Length(SIZE_W),
                Constraint::Length(SPEED_W),
            ],
        )
        .block(block);
        frame.render_widget(table, area);
    }
}
