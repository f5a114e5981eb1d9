//! Keys bar — bottom line with the input mode and the keys that apply.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_COMMAND, C_MODE_FILTER, C_MODE_NORMAL, C_MUTED, C_WARN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    Command,
    Confirm,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Filter => "FILTER",
            Self::Command => "COMMAND",
            Self::Confirm => "CONFIRM",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Filter => C_MODE_FILTER,
            Self::Command => C_MODE_COMMAND,
            Self::Confirm => C_WARN,
        }
    }

    fn keys(self) -> &'static str {
        match self {
            Self::Normal => {
                " ↑↓/jk select  Enter use  d delete  e enable/disable  / filter  g group  : command  f feed  l logs  Tab/1-9 panes  q quit"
            }
            Self::Filter => " type to filter  Enter keep  Esc clear+close",
            Self::Command => " type command  Enter run  Esc cancel",
            Self::Confirm => " y confirm  n/Esc cancel",
        }
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, log_open: bool) {
    let mut spans = vec![Span::styled(
        format!(" {} ", mode.label()),
        Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
    )];
    if log_open {
        spans.push(Span::styled("LOG ", Style::default().fg(C_MODE_FILTER)));
    }
    spans.push(Span::styled(mode.keys(), Style::default().fg(C_MUTED)));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
