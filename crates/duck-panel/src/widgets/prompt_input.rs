//! PromptInput — a one-line tui-input editor used for the filter bar (`/`)
//! and the command prompt (`:`).

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED};

#[derive(Debug, Clone, PartialEq)]
pub enum PromptAction {
    Changed(String),
    Confirmed(String),
    Cancelled,
    None,
}

pub struct PromptInput {
    input: Input,
    prefix: char,
    placeholder: &'static str,
    /// Esc with text clears first instead of closing (filter behaviour).
    clear_before_close: bool,
}

impl PromptInput {
    pub fn filter() -> Self {
        Self {
            input: Input::default(),
            prefix: '/',
            placeholder: "filter...",
            clear_before_close: true,
        }
    }

    pub fn command() -> Self {
        Self {
            input: Input::default(),
            prefix: ':',
            placeholder: "feed cookie, say …, ask …, sleep 30",
            clear_before_close: false,
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Esc => {
                if self.clear_before_close && !self.input.value().is_empty() {
                    self.input.reset();
                    PromptAction::Changed(String::new())
                } else {
                    PromptAction::Cancelled
                }
            }
            KeyCode::Enter => PromptAction::Confirmed(self.input.value().to_string()),
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(change) if change.value => PromptAction::Changed(self.input.value().to_string()),
                _ => PromptAction::None,
            },
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, active: bool) {
        let scroll = self.input.visual_scroll(area.width.saturating_sub(4) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(
                format!("{} {}", self.prefix, self.placeholder),
                Style::default().fg(C_MUTED),
            )
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(
                format!("{} {}", self.prefix, visible),
                Style::default().fg(C_FILTER_FG),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(display)).style(Style::default().bg(C_FILTER_BG)),
            area,
        );
        if active && area.width > 0 {
            let cursor_x = area.x + 2 + self.input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}
