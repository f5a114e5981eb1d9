//! Status strip — one short line per device status, laid out in columns.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::feeds::StatusKind;
use crate::panel::PanelCore;
use crate::theme::{style_secondary, tone_color, C_ACCENT};
use crate::view::StatusLine;

/// Column order of the strip.
pub const STRIP: [&[StatusKind]; 3] = [
    &[
        StatusKind::Duck,
        StatusKind::CurrentUser,
        StatusKind::Settings,
        StatusKind::Model,
        StatusKind::Location,
    ],
    &[
        StatusKind::Hunger,
        StatusKind::Boredom,
        StatusKind::Sleep,
        StatusKind::Vision,
        StatusKind::Fan,
    ],
    &[
        StatusKind::System,
        StatusKind::Printer,
        StatusKind::MemoryStats,
        StatusKind::Embedding,
        StatusKind::Worker,
    ],
];

pub fn height() -> u16 {
    STRIP.iter().map(|c| c.len()).max().unwrap_or(0) as u16 + 1
}

fn line(status: &StatusLine) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<10}", status.label), style_secondary()),
        Span::styled(status.value.clone(), Style::default().fg(tone_color(status.tone))),
    ])
}

pub fn draw_status_strip(frame: &mut Frame, area: Rect, panel: &PanelCore) {
    let [columns_area, answer_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
    let columns = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(columns_area);
    for (kinds, col) in STRIP.iter().zip(columns.iter()) {
        let lines: Vec<Line> = panel.status_lines(kinds).iter().map(line).collect();
        frame.render_widget(Paragraph::new(lines), *col);
    }

    let recall = panel.status_line(StatusKind::MemorySettings);
    let mut spans = vec![
        Span::styled(" Duck ", Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{}: {}", recall.label, recall.value), style_secondary()),
    ];
    if let Some(answer) = panel.last_answer() {
        spans.push(Span::styled(format!("   answer: {}", answer), Style::default().fg(C_ACCENT)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), answer_area);
}
