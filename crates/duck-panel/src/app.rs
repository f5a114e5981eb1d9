//! App — terminal adapter around `PanelCore`.
//!
//! Architecture:
//! - `PanelCore` owns all panel state; spawned polls and actions report back
//!   on its `PanelMessage` channel.
//! - A blocking reader thread forwards terminal events on a second channel.
//! - The loop draws a frame whenever something changed, then awaits the
//!   next panel message, terminal event, or UI tick.
//! - Components return `UiAction`s; App applies them.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::actions::{FoodType, UserAction};
use crate::command::{parse_command, Command};
use crate::component::Component;
use crate::components::{
    collection_pane::CollectionPane, confirm::draw_confirm, log_panel::LogPanel,
    status_strip::{self, draw_status_strip},
};
use crate::feeds::Collection;
use crate::focus::FocusRing;
use crate::panel::{PanelCore, PanelMessage};
use crate::theme::{style_muted, C_ACCENT, C_SEPARATOR};
use crate::ui_action::UiAction;
use crate::widgets::{
    keys_bar::{draw_keys_bar, InputMode},
    prompt_input::{PromptAction, PromptInput},
    toast::draw_notices,
};

/// Pane order; the first nine get number keys.
const PANES: [Collection; 13] = [
    Collection::Facts,
    Collection::Memories,
    Collection::Contacts,
    Collection::SmsHistory,
    Collection::Users,
    Collection::Songs,
    Collection::Models,
    Collection::Topics,
    Collection::RecentUpdates,
    Collection::QuickFacts,
    Collection::WakeWords,
    Collection::WifiNetworks,
    Collection::Backups,
];

pub struct App {
    panel: PanelCore,
    panel_rx: mpsc::Receiver<PanelMessage>,
    focus: FocusRing<Collection>,
    panes: Vec<CollectionPane>,
    log_panel: LogPanel,
    mode: InputMode,
    filter: PromptInput,
    command: PromptInput,
    pending: Option<UserAction>,
    should_quit: bool,
}

impl App {
    pub fn new(panel: PanelCore, panel_rx: mpsc::Receiver<PanelMessage>) -> Self {
        Self {
            panel,
            panel_rx,
            focus: FocusRing::new(PANES.to_vec()),
            panes: PANES
                .iter()
                .enumerate()
                .map(|(i, &c)| CollectionPane::new(c, i))
                .collect(),
            log_panel: LogPanel,
            mode: InputMode::Normal,
            filter: PromptInput::filter(),
            command: PromptInput::command(),
            pending: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("terminal ready, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        self.panel.shutdown();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        self.panel.start();

        let mut ui_tick =
            tokio::time::interval(Duration::from_millis(self.panel.config().ui.tick_ms));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = self.panel_rx.recv() => {
                    needs_redraw = self.panel.handle(msg);
                    while let Ok(msg) = self.panel_rx.try_recv() {
                        needs_redraw |= self.panel.handle(msg);
                    }
                }
                Some(ev) = event_rx.recv() => {
                    needs_redraw = true;
                    match ev {
                        Event::Key(key) if key.kind != KeyEventKind::Release => {
                            let actions = self.handle_key(key);
                            for action in actions {
                                self.apply(action);
                            }
                        }
                        _ => {}
                    }
                }
                _ = ui_tick.tick() => {
                    needs_redraw = self.panel.tick();
                }
            }
        }
        info!("duckpanel quitting");
        Ok(())
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<UiAction> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![UiAction::Quit];
        }
        match self.mode {
            InputMode::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => vec![UiAction::Confirm],
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => vec![UiAction::Cancel],
                _ => vec![],
            },
            InputMode::Filter => {
                let Some(collection) = self.focus.current() else {
                    return vec![UiAction::CloseFilter];
                };
                match self.filter.handle_key(key) {
                    PromptAction::Changed(text) => vec![UiAction::SetFilter(collection, text)],
                    PromptAction::Confirmed(_) | PromptAction::Cancelled => {
                        vec![UiAction::CloseFilter]
                    }
                    PromptAction::None => vec![],
                }
            }
            InputMode::Command => match self.command.handle_key(key) {
                PromptAction::Confirmed(text) => vec![UiAction::RunCommand(text)],
                PromptAction::Cancelled => vec![UiAction::CloseCommand],
                _ => vec![],
            },
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Vec<UiAction> {
        match key.code {
            KeyCode::Char('q') => return vec![UiAction::Quit],
            KeyCode::Tab => return vec![UiAction::FocusNext],
            KeyCode::BackTab => return vec![UiAction::FocusPrev],
            KeyCode::Char(c @ '1'..='9') => {
                return vec![UiAction::FocusPosition(c as usize - '1' as usize)]
            }
            KeyCode::Char(':') => return vec![UiAction::OpenCommand],
            KeyCode::Char('l') => return vec![UiAction::ToggleLogs],
            KeyCode::Char('f') => {
                return vec![UiAction::Request(UserAction::Feed(FoodType::Cookie))]
            }
            KeyCode::Char('F') => {
                return vec![UiAction::Request(UserAction::Feed(FoodType::Pizza))]
            }
            KeyCode::Char('a') => return vec![UiAction::SpeakAnswer],
            _ => {}
        }
        let log_actions = self.log_panel.handle_key(key, &self.panel);
        if !log_actions.is_empty() {
            return log_actions;
        }
        let current = self.focus.current();
        let panel = &self.panel;
        match self.panes.iter_mut().find(|p| Some(p.collection) == current) {
            Some(pane) => pane.handle_key(key, panel),
            None => vec![],
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Quit => self.should_quit = true,
            UiAction::FocusNext => {
                self.focus.next();
            }
            UiAction::FocusPrev => {
                self.focus.prev();
            }
            UiAction::FocusPosition(pos) => {
                self.focus.set_by_position(pos);
            }
            UiAction::OpenFilter => {
                if let Some(collection) = self.focus.current() {
                    self.filter.set_value(&self.panel.view(collection).filter);
                    self.mode = InputMode::Filter;
                }
            }
            UiAction::SetFilter(collection, text) => self.panel.set_filter(collection, text),
            UiAction::CloseFilter => self.mode = InputMode::Normal,
            UiAction::ToggleGroup(collection) => self.panel.toggle_group(collection),
            UiAction::ToggleLogs => self.panel.toggle_log_tail(),
            UiAction::ScrollLog(rows) => {
                let viewport = &mut self.panel.log_tail_mut().viewport;
                if rows < 0 {
                    viewport.scroll_up(rows.unsigned_abs());
                } else {
                    viewport.scroll_down(rows as usize);
                }
            }
            UiAction::LogToBottom => self.panel.log_tail_mut().viewport.scroll_to_bottom(),
            UiAction::OpenCommand => {
                self.command.clear();
                self.mode = InputMode::Command;
            }
            UiAction::CloseCommand => self.mode = InputMode::Normal,
            UiAction::RunCommand(text) => {
                self.mode = InputMode::Normal;
                match parse_command(&text) {
                    Ok(Command::Action(action)) => self.apply(UiAction::Request(action)),
                    Ok(Command::SpeakAnswer) => self.apply(UiAction::SpeakAnswer),
                    Err(e) => self.panel.report("command", e.to_string()),
                }
            }
            UiAction::Request(action) => {
                if action.requires_confirmation() {
                    self.pending = Some(action);
                    self.mode = InputMode::Confirm;
                } else {
                    self.panel.trigger(action);
                }
            }
            UiAction::Confirm => {
                self.mode = InputMode::Normal;
                if let Some(action) = self.pending.take() {
                    self.panel.trigger(action);
                }
            }
            UiAction::Cancel => {
                self.mode = InputMode::Normal;
                self.pending = None;
            }
            UiAction::SpeakAnswer => self.panel.speak_last_answer(),
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header, strip, sep, body, prompt, keys] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(status_strip::height()),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.draw_header(frame, header);
        draw_status_strip(frame, strip, &self.panel);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "─".repeat(sep.width as usize),
                Style::default().fg(C_SEPARATOR),
            ))),
            sep,
        );

        let (list_area, log_area) = if self.panel.log_tail().is_open() {
            let [l, r] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(body);
            (l, Some(r))
        } else {
            (body, None)
        };

        if let Some(log_area) = log_area {
            let inner_height = log_area.height.saturating_sub(2) as usize;
            self.panel.log_tail_mut().set_viewport_height(inner_height);
            self.log_panel.draw(frame, log_area, false, &self.panel);
        }

        let current = self.focus.current();
        let panel = &self.panel;
        if let Some(pane) = self.panes.iter_mut().find(|p| Some(p.collection) == current) {
            pane.draw(frame, list_area, true, panel);
        }

        match self.mode {
            InputMode::Filter => self.filter.draw(frame, prompt, true),
            InputMode::Command => self.command.draw(frame, prompt, true),
            _ => {}
        }
        draw_keys_bar(frame, keys, self.mode, self.panel.log_tail().is_open());
        draw_notices(frame, area, self.panel.notices());

        if let Some(action) = &self.pending {
            draw_confirm(frame, area, &action.confirmation_prompt());
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(" 🦆 duckpanel ", Style::default().fg(C_ACCENT))];
        for (i, &c) in self.focus.items().iter().enumerate() {
            let style = if self.focus.is_focused(c) {
                Style::default().fg(C_ACCENT)
            } else {
                style_muted()
            };
            let label = match i {
                0..=8 => format!(" {}:{} ", i + 1, c.title()),
                _ => format!(" {} ", c.title()),
            };
            spans.push(Span::styled(label, style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
