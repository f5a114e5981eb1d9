//! Toast rendering for panel notices, stacked in the top-right corner.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::notices::{Notices, Severity};
use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS};

const MAX_VISIBLE: usize = 4;

fn look(severity: Severity) -> (&'static str, ratatui::style::Color) {
    match severity {
        Severity::Info => ("·", C_TOAST_INFO),
        Severity::Success => ("✓", C_TOAST_SUCCESS),
        Severity::Error => ("✗", C_TOAST_ERROR),
    }
}

pub fn draw_notices(frame: &mut Frame, area: Rect, notices: &Notices) {
    if notices.is_empty() || area.height < 2 {
        return;
    }
    let max_width = (area.width / 2).clamp(30, 70).min(area.width);
    let mut y = area.y + 1;

    for notice in notices.iter().take(MAX_VISIBLE) {
        let (icon, color) = look(notice.severity);
        let text = format!(" {} {}: {} ", icon, notice.control, notice.message);
        let w = (text.width() as u16).min(max_width);
        let toast_area = Rect {
            x: area.x + area.width.saturating_sub(w + 1),
            y,
            width: w,
            height: 1,
        };
        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))),
            toast_area,
        );
        y += 1;
        if y >= area.y + area.height {
            break;
        }
    }
}
