//! FilterPanel — the filters page.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Cell, Row, Table},
    Frame,
};

use tgload_core::WindowController;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    filters::FilterForm,
    theme::{style_default, style_selected_focused, C_BADGE_OFF, C_BADGE_ON},
    widgets::pane_chrome::pane_chrome,
};

pub struct FilterPanel {
    pub form: FilterForm,
    window: WindowController,
}

impl FilterPanel {
    pub fn new() -> Self {
        let form = FilterForm::default();
        let mut window = WindowController::new(form.len());
        window.move_to_start(form.len());
        Self { form, window }
    }
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for FilterPanel {
    fn id(&self) -> ComponentId {
        ComponentId::FilterPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        let len = self.form.len();
        match key.code {
            KeyCode::Up => self.window.move_by(len, -1),
            KeyCode::Down => self.window.move_by(len, 1),
            KeyCode::Enter => return vec![Action::ApplyFilter(self.form.build())],
            KeyCode::Esc => return vec![Action::CloseFilters],
            KeyCode::Char('r') => self.form.reset(),
            KeyCode::Char(' ') => {
                if let Some(i) = self.window.focused() {
                    self.form.toggle(i);
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(i) = self.window.focused() {
                    self.form.push_digit(i, c);
                }
            }
            KeyCode::Backspace => {
                if let Some(i) = self.window.focused() {
                    self.form.backspace(i);
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let focused_row = self.window.focused();
        let rows: Vec<Row> = self
            .form
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let (check, color) = if f.enabled {
                    ("on", C_BADGE_ON)
                } else {
                    ("off", C_BADGE_OFF)
                };
                let style = if Some(i) == focused_row {
                    style_selected_focused()
                } else {
                    style_default()
                };
                Row::new(vec![
                    Cell::from(f.kind.label()),
                    Cell::from(check).style(Style::default().fg(color)),
                    Cell::from(format!("{} {}", f.value, f.kind.unit())),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(14),
                Constraint::Length(4),
                Constraint::Length(16),
            ],
        )
        .block(pane_chrome("filters".to_string(), None, focused, None));
        frame.render_widget(table, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(panel: &mut FilterPanel, code: KeyCode) -> Vec<Action> {
        panel.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &AppState::default())
    }

    #[test]
    fn edits_apply_on_enter() {
        let mut panel = FilterPanel::new();
        press(&mut panel, KeyCode::Down);
        press(&mut panel, KeyCode::Down);
        press(&mut panel, KeyCode::Char(' '));
        press(&mut panel, KeyCode::Char('5'));
        press(&mut panel, KeyCode::Char('0'));
        press(&mut panel, KeyCode::Backspace);

        let actions = press(&mut panel, KeyCode::Enter);
        let [Action::ApplyFilter(filter)] = actions.as_slice() else {
            panic!("expected ApplyFilter, got {actions:?}");
        };
        assert_eq!(filter.max_size_bytes, Some(5 * 1024 * 1024));
        assert_eq!(filter.max_duration_secs, None);
    }

    #[test]
    fn escape_cancels_and_r_resets() {
        let mut panel = FilterPanel::new();
        press(&mut panel, KeyCode::Char(' '));
        press(&mut panel, KeyCode::Char('r'));
        assert!(panel.form.fields.iter().all(|f| !f.enabled && f.value.is_empty()));
        assert_eq!(press(&mut panel, KeyCode::Esc), vec![Action::CloseFilters]);
    }
}
