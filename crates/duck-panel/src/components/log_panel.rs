//! LogPanel — the device log tail, shown while open.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::component::Component;
use crate::log_tail::LineKind;
use crate::panel::PanelCore;
use crate::theme::{C_BAD, C_BADGE_ERR, C_MUTED, C_PRIMARY, C_TOAST_INFO, C_WARN};
use crate::ui_action::UiAction;
use crate::widgets::pane_chrome::{pane_chrome, Badge};

const PAGE: isize = 10;

#[derive(Default)]
pub struct LogPanel;

fn kind_color(kind: LineKind) -> ratatui::style::Color {
    match kind {
        LineKind::Error => C_BAD,
        LineKind::Warning => C_WARN,
        LineKind::Info => C_TOAST_INFO,
        LineKind::Plain => C_PRIMARY,
    }
}

impl Component for LogPanel {
    fn handle_key(&mut self, key: KeyEvent, panel: &PanelCore) -> Vec<UiAction> {
        if key.kind == KeyEventKind::Release || !panel.log_tail().is_open() {
            return vec![];
        }
        match key.code {
            KeyCode::PageUp => vec![UiAction::ScrollLog(-PAGE)],
            KeyCode::PageDown => vec![UiAction::ScrollLog(PAGE)],
            KeyCode::Char('[') => vec![UiAction::ScrollLog(-1)],
            KeyCode::Char(']') => vec![UiAction::ScrollLog(1)],
            KeyCode::Char('G') => vec![UiAction::LogToBottom],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, panel: &PanelCore) {
        let tail = panel.log_tail();
        let badge = tail.last_error().map(|_| Badge {
            text: "ERR",
            color: C_BADGE_ERR,
        });
        let block = pane_chrome("device log", None, focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = if tail.lines().is_empty() {
            let text = match tail.last_error() {
                Some(err) => format!("  {}", err),
                None => "  waiting for log…".to_string(),
            };
            vec![Line::from(Span::styled(text, Style::default().fg(C_MUTED)))]
        } else {
            tail.visible()
                .iter()
                .map(|(kind, text)| {
                    Line::from(Span::styled(text.clone(), Style::default().fg(kind_color(*kind))))
                })
                .collect()
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
