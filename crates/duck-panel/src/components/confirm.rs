//! Confirmation prompt for destructive actions.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::{style_muted, C_PRIMARY, C_WARN};

pub fn draw_confirm(frame: &mut Frame, area: Rect, prompt: &str) {
    let [row] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Max(60)])
        .flex(Flex::Center)
        .areas(row);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_WARN))
        .title(Span::styled(" confirm ", Style::default().fg(C_WARN).add_modifier(Modifier::BOLD)));
    let text = vec![
        Line::from(Span::styled(prompt.to_string(), Style::default().fg(C_PRIMARY))),
        Line::from(Span::styled("y confirm · n cancel", style_muted())),
    ];
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), popup);
}
