//! VideoInfo — bottom pane with every known field of the pointed video.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use tgload_core::MediaItem;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_default, style_secondary},
    widgets::{
        pane_chrome::pane_chrome,
        progress_bar::{fmt_duration, fmt_mb},
    },
};

#[derive(Default)]
pub struct VideoInfo;

fn field<'a>(name: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:>10} ", name), style_secondary()),
        Span::styled(value, style_default()),
    ])
}

pub(crate) fn info_lines(item: &MediaItem, slot: Option<u8>) -> Vec<Line<'static>> {
    let mut lines = vec![
        field("file", item.file_id.to_string()),
        field("message", item.message_id.to_string()),
        field("duration", fmt_duration(item.duration)),
        field(
            "size",
            format!(
                "{} / {} ({:.0}%)",
                fmt_mb(item.downloaded_size),
                fmt_mb(item.expected_size),
                item.progress() * 100.0
            ),
        ),
    ];
    if let Some(slot) = slot {
        lines.push(field("slot", slot.to_string()));
    }
    if let Some(path) = &item.local_path {
        lines.push(field("path", path.clone()));
    }
    if let Some(album) = &item.album {
        lines.push(field(
            "album",
            format!("{} (+{} messages)", album.album_id, album.siblings.len()),
        ));
    }
    if let Some(date) = item.date {
        lines.push(field("date", date.format("%Y-%m-%d %H:%M").to_string()));
    }
    if let Some(source) = &item.source {
        lines.push(field("page", source.clone()));
    }
    if let Some(caption) = &item.caption {
        lines.push(Line::raw(""));
        lines.extend(caption.lines().map(|l| Line::raw(l.to_string())));
    }
    lines
}

impl Component for VideoInfo {
    fn id(&self) -> ComponentId {
        ComponentId::VideoInfo
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let lines = state
            .pointed
            .and_then(|id| state.item(id))
            .map(|item| info_lines(item, state.slots.get(&item.file_id).copied()))
            .unwrap_or_default();
        let block = pane_chrome("info".to_string(), None, focused, None);
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}
