//! App — component-based event loop.
//!
//! - `App` owns the components and `AppState` (catalog snapshot for drawing).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from the terminal
//!   reader and from the update dispatcher.
//! - Components return `Vec<Action>`; the App carries them out against the
//!   session and resyncs the snapshot.
//! - A 250ms check tick resyncs the snapshot and lets the download list
//!   retire completed entries.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tgload_core::{Error, MediaItem, RemoteClient, Session};
use tgload_proto::config::Config;
use tgload_proto::protocol::FileId;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        download_list::DownloadList, filter_panel::FilterPanel, video_info::VideoInfo,
        video_list::VideoList,
    },
    files,
    focus::FocusRing,
    widgets::status_bar::{self, Page},
};

const CHECK_INTERVAL: Duration = Duration::from_millis(250);
const DOWNLOADS_HEIGHT: u16 = 10;

#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    /// Pushed by the update dispatcher after every applied file event.
    ItemUpdated(MediaItem),
}

#[derive(Default)]
struct PaneAreas {
    downloads: Rect,
    videos: Rect,
}

pub struct App<R> {
    session: Session<R>,
    config: Config,
    state: AppState,
    download_list: DownloadList,
    video_list: VideoList,
    video_info: VideoInfo,
    filter_panel: FilterPanel,
    focus: FocusRing,
    page: Page,
    pane_areas: PaneAreas,
    should_quit: bool,
}

impl<R: RemoteClient> App<R> {
    pub fn new(session: Session<R>, config: Config) -> Self {
        let mut focus = FocusRing::new(vec![ComponentId::DownloadList, ComponentId::VideoList]);
        focus.set(ComponentId::VideoList);
        Self {
            session,
            config,
            state: AppState::default(),
            download_list: DownloadList::new(),
            video_list: VideoList::new(),
            video_info: VideoInfo,
            filter_panel: FilterPanel::new(),
            focus,
            page: Page::Main,
            pane_areas: PaneAreas::default(),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Dispatcher → AppMessage ───────────────────────────────────────────
        let updates = tx.clone();
        let subscription = self
            .session
            .dispatcher
            .subscribe(Arc::new(move |item: &MediaItem| -> anyhow::Result<()> {
                updates
                    .try_send(AppMessage::ItemUpdated(item.clone()))
                    .map_err(|e| anyhow::anyhow!("ui queue: {e}"))
            }));

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        // Polls so the thread notices when the loop is gone.
        tokio::task::spawn_blocking(move || loop {
            if event_tx.is_closed() {
                break;
            }
            match event::poll(CHECK_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(_) => break,
            }
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });
        drop(tx);

        // ── First page; videos with local data join the downloads pane ────────
        terminal.draw(|f| self.draw(f))?;
        self.dispatch(Action::Refresh).await;
        for item in &self.state.videos {
            if item.downloaded_size > 0 {
                self.download_list.add(item.file_id, item.downloaded_size);
            }
        }
        info!(
            "{} videos loaded, {} with local data",
            self.state.videos.len(),
            self.download_list.len()
        );

        let mut check = tokio::time::interval(CHECK_INTERVAL);
        check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        let result = loop {
            if needs_redraw {
                if let Err(e) = terminal.draw(|f| self.draw(f)) {
                    break Err(e.into());
                }
            }
            needs_redraw = false;

            if self.should_quit {
                break Ok(());
            }

            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        break Ok(());
                    };
                    needs_redraw = self.handle_message(msg).await;
                    // Drain what queued up while we were busy.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next).await;
                    }
                }

                _ = check.tick() => {
                    self.sync_from_catalog();
                    let actions = self.download_list.tick(&self.state);
                    for action in actions {
                        self.dispatch(action).await;
                    }
                    needs_redraw = true;
                }
            }
        };

        // ── Teardown ──────────────────────────────────────────────────────────
        self.session.dispatcher.unsubscribe(subscription);
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        result
    }

    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,
            AppMessage::ItemUpdated(item) => {
                self.state.apply_update(item);
                self.sync_slots();
                true
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        // Global keys
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return vec![Action::Quit];
            }
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('f') => return vec![Action::ToggleFilters],
            _ => {}
        }

        if self.page == Page::Filters {
            return self.filter_panel.handle_key(key, &self.state);
        }

        if key.code == KeyCode::Tab {
            return vec![Action::FocusNext];
        }
        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::DownloadList) => self.download_list.handle_key(key, s),
            Some(ComponentId::VideoList) => self.video_list.handle_key(key, s),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.page != Page::Main {
            return vec![];
        }
        let pos = Position::new(event.column, event.row);
        let s = &self.state;
        if self.pane_areas.downloads.contains(pos) {
            self.focus.set(ComponentId::DownloadList);
            self.download_list
                .handle_mouse(event, self.pane_areas.downloads, s)
        } else if self.pane_areas.videos.contains(pos) {
            self.focus.set(ComponentId::VideoList);
            self.video_list.handle_mouse(event, self.pane_areas.videos, s)
        } else {
            vec![]
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        debug!("action: {:?}", action);
        self.apply_action(action).await;
        self.sync_from_catalog();
    }

    async fn apply_action(&mut self, action: Action) {
        match action {
            Action::StartDownload(id) => self.start_download(id).await,
            Action::CancelDownload(id) => {
                let Some(item) = self.catalog_item(id) else { return };
                if let Err(e) = self.session.scheduler.cancel_download(&item).await {
                    self.report(e);
                }
            }
            Action::DeleteLocalFile(id) => self.delete_local_file(id).await,
            Action::OpenFile(id) => self.open_file(id),
            Action::Downloaded(id) => {
                if self.config.ui.auto_archive {
                    self.archive(id).await;
                } else if let Some(item) = self.catalog_item(id) {
                    self.state.info(format!("downloaded {}", item.title()));
                }
            }
            Action::DeleteMessage(id) => {
                let Some(item) = self.catalog_item(id) else { return };
                match self.session.catalog.delete_item(&item).await {
                    Ok(()) => self.state.info(format!("deleted {}", item.title())),
                    Err(e) => self.report(e),
                }
            }
            Action::Archive(id) => self.archive(id).await,
            Action::Refresh => {
                let limit = self.config.catalog.page_size;
                if let Err(e) = self.session.catalog.refresh(limit).await {
                    self.report(e);
                }
            }
            Action::LoadNext => {
                let limit = self.config.catalog.next_page_size;
                match self.session.catalog.load_next(limit).await {
                    Ok(page) => self.state.info(format!("{} more videos", page.len())),
                    Err(e) => self.report(e),
                }
            }
            Action::FocusNext => {
                self.state.pointed = match self.focus.next() {
                    Some(ComponentId::DownloadList) => self.download_list.focused_id(),
                    Some(ComponentId::VideoList) => self.video_list.focused_id(&self.state),
                    _ => None,
                };
            }
            Action::Pointed(id) => self.state.pointed = id,
            Action::ToggleFilters => {
                self.page = match self.page {
                    Page::Main => Page::Filters,
                    Page::Filters => Page::Main,
                };
            }
            Action::ApplyFilter(filter) => {
                self.state.filter = filter;
                self.page = Page::Main;
                self.video_list.sync(&self.state);
            }
            Action::CloseFilters => self.page = Page::Main,
            Action::Quit => self.should_quit = true,
        }
    }

    async fn start_download(&mut self, id: FileId) {
        let Some(item) = self.catalog_item(id) else { return };
        self.download_list.add(id, item.downloaded_size);
        if item.completed() {
            return;
        }
        match self.session.scheduler.start_download(&item).await {
            Ok(Some(slot)) => debug!("file {} queued in slot {}", id, slot),
            Ok(None) => self.report(Error::QueueFull),
            Err(e) => self.report(e),
        }
    }

    async fn delete_local_file(&mut self, id: FileId) {
        let Some(item) = self.catalog_item(id) else { return };
        if self.session.scheduler.slot_of(id).is_some() {
            if let Err(e) = self.session.scheduler.cancel_download(&item).await {
                self.report(e);
            }
        }
        match self.session.catalog.delete_local_file(&item).await {
            Ok(()) => {
                self.download_list.remove(id);
                self.state.info(format!("removed local copy of {}", item.title()));
            }
            Err(e) => self.report(e),
        }
    }

    fn open_file(&mut self, id: FileId) {
        let Some(item) = self.catalog_item(id) else { return };
        let path = match item.local_path.as_deref() {
            Some(path) if item.completed() => path,
            _ => {
                self.state.info("not downloaded yet");
                return;
            }
        };
        if let Err(e) = files::open(&self.config.ui.open_command, Path::new(path)) {
            warn!("open failed: {:#}", e);
            self.state.error(format!("{e:#}"));
        }
    }

    /// Move a completed download into the archive dir, then delete its
    /// message. Incomplete videos are left alone.
    async fn archive(&mut self, id: FileId) {
        let Some(item) = self.catalog_item(id) else { return };
        let path = match item.local_path.as_deref() {
            Some(path) if item.completed() => path,
            _ => {
                self.state.info("not downloaded yet");
                return;
            }
        };
        let target = match files::archive(Path::new(path), &self.config.paths.archive_dir) {
            Ok(target) => target,
            Err(e) => {
                warn!("archive failed: {:#}", e);
                self.state.error(format!("{e:#}"));
                return;
            }
        };
        match self.session.catalog.delete_item(&item).await {
            Ok(()) => self.state.info(format!("archived to {}", target.display())),
            Err(e) => self.report(e),
        }
    }

    fn catalog_item(&mut self, id: FileId) -> Option<MediaItem> {
        let item = self.session.catalog.get(id);
        if item.is_none() {
            self.report(Error::NotFound(id));
        }
        item
    }

    /// Show a non-fatal error in the status line.
    fn report(&mut self, e: Error) {
        warn!("{}", e);
        if e.is_fatal() {
            self.should_quit = true;
        }
        self.state.error(e.to_string());
    }

    fn sync_from_catalog(&mut self) {
        self.state.videos = self.session.catalog.list_all();
        self.sync_slots();
        self.video_list.sync(&self.state);
        if self
            .state
            .pointed
            .is_some_and(|id| self.state.item(id).is_none())
        {
            self.state.pointed = None;
        }
    }

    fn sync_slots(&mut self) {
        self.state.slots = self
            .session
            .scheduler
            .active()
            .into_iter()
            .map(|(slot, file_id)| (file_id, slot))
            .collect();
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();
        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);
        let body = outer[0];

        status_bar::draw_status_line(frame, outer[1], self.state.notice.as_ref());
        status_bar::draw_keys_bar(frame, outer[2], self.page);

        if self.page == Page::Filters {
            self.pane_areas = PaneAreas::default();
            self.filter_panel.draw(frame, body, true, &self.state);
            return;
        }

        let panes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(DOWNLOADS_HEIGHT),
                Constraint::Fill(1),
                Constraint::Fill(1),
            ])
            .split(body);

        self.pane_areas.downloads = panes[0];
        self.pane_areas.videos = panes[1];

        let downloads_focused = self.focus.is_focused(self.download_list.id());
        let videos_focused = self.focus.is_focused(self.video_list.id());
        self.download_list
            .draw(frame, panes[0], downloads_focused, &self.state);
        self.video_list
            .draw(frame, panes[1], videos_focused, &self.state);
        self.video_info.draw(frame, panes[2], false, &self.state);
    }
}
