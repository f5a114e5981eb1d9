//! CollectionPane — one cached collection with selection, filter and
//! grouping.

use std::collections::HashMap;

use chrono::Local;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::actions::UserAction;
use crate::component::Component;
use crate::feeds::{Collection, Feed, Item};
use crate::panel::PanelCore;
use crate::theme::{
    band_color, style_default, style_muted, style_secondary, style_selected_focused, C_BAD,
    C_FILTER_FG, C_GROUP, C_MUTED,
};
use crate::ui_action::UiAction;
use crate::view::{topic_shares, ListView, Row, ViewMode};
use crate::widgets::pane_chrome::{pane_chrome, Badge};

pub struct CollectionPane {
    pub collection: Collection,
    number_key: Option<char>,
    selected: usize,
}

impl CollectionPane {
    pub fn new(collection: Collection, position: usize) -> Self {
        let number_key = char::from_digit(position as u32 + 1, 10).filter(|_| position < 9);
        Self {
            collection,
            number_key,
            selected: 0,
        }
    }

    fn selected_item<'a>(&self, panel: &'a PanelCore) -> Option<&'a Item> {
        panel.visible_items(self.collection).get(self.selected).copied()
    }

    /// The action Enter runs on an item, if any.
    fn activate(item: &Item) -> Option<UserAction> {
        match item {
            Item::Song(song) => Some(UserAction::PlaySong(song.path.clone())),
            Item::User(user) => Some(UserAction::SwitchUser(user.username.clone())),
            Item::Model(model) => Some(UserAction::ChangeModel(model.id.clone())),
            _ => None,
        }
    }

    fn delete(item: &Item) -> Option<UserAction> {
        match item {
            Item::Fact(fact) => Some(UserAction::DeleteFact(fact.key.clone())),
            Item::Memory(memory) => Some(UserAction::DeleteMemory(memory.id)),
            Item::Contact(contact) => Some(UserAction::DeleteContact(contact.id)),
            _ => None,
        }
    }
}

impl Component for CollectionPane {
    fn handle_key(&mut self, key: KeyEvent, panel: &PanelCore) -> Vec<UiAction> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let count = panel.visible_items(self.collection).len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = count.saturating_sub(1),
            KeyCode::Char('/') => return vec![UiAction::OpenFilter],
            KeyCode::Char('g') => {
                self.selected = 0;
                return vec![UiAction::ToggleGroup(self.collection)];
            }
            KeyCode::Enter => {
                if let Some(action) = self.selected_item(panel).and_then(Self::activate) {
                    return vec![UiAction::Request(action)];
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(action) = self.selected_item(panel).and_then(Self::delete) {
                    return vec![UiAction::Request(action)];
                }
            }
            KeyCode::Char('e') => {
                if let Some(Item::Contact(contact)) = self.selected_item(panel) {
                    return vec![UiAction::Request(UserAction::SetContactEnabled {
                        contact: contact.clone(),
                        enabled: !contact.enabled,
                    })];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, panel: &PanelCore) {
        let badge = Badge::for_fetch(panel.fetch_status(Feed::Collection(self.collection)));
        let block = pane_chrome(self.collection.title(), self.number_key, focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let view = panel.view(self.collection);
        let mut lines: Vec<Line> = Vec::new();
        if !view.filter.is_empty() || view.mode == ViewMode::Grouped {
            let mut spans = Vec::new();
            if !view.filter.is_empty() {
                spans.push(Span::styled(format!("/ {}  ", view.filter), Style::default().fg(C_FILTER_FG)));
            }
            if view.mode == ViewMode::Grouped {
                spans.push(Span::styled("grouped", style_muted()));
            }
            lines.push(Line::from(spans));
        }
        let header_rows = lines.len();

        let mut list = panel.render_collection(self.collection, Local::now());
        if self.collection == Collection::Topics {
            if let (ListView::Flat(rows), Some(items)) =
                (&mut list, panel.collections().get(Collection::Topics))
            {
                let shares: HashMap<String, String> = topic_shares(items).into_iter().collect();
                for row in rows.iter_mut() {
                    if let Some(share) = shares.get(&row.title) {
                        row.meta.push(share.clone());
                    }
                }
            }
        }
        let row_count = list.row_count();
        if self.selected >= row_count {
            self.selected = row_count.saturating_sub(1);
        }

        let mut selected_line = header_rows;
        match list {
            ListView::Loading { last_error } => {
                lines.push(Line::from(Span::styled("  loading…", style_muted())));
                if let Some(err) = last_error {
                    lines.push(Line::from(Span::styled(
                        format!("  last attempt failed: {}", err),
                        Style::default().fg(C_BAD),
                    )));
                }
            }
            ListView::Empty { filtered: true } => {
                lines.push(Line::from(Span::styled("  no matches", style_muted())));
            }
            ListView::Empty { filtered: false } => {
                lines.push(Line::from(Span::styled(
                    format!("  no {}", self.collection.title().to_lowercase()),
                    style_muted(),
                )));
            }
            ListView::Flat(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if i == self.selected {
                        selected_line = lines.len();
                    }
                    lines.push(row_line(row, focused && i == self.selected));
                }
            }
            ListView::Grouped(groups) => {
                let mut i = 0;
                for group in &groups {
                    let key = if group.key.is_empty() { "(none)" } else { group.key.as_str() };
                    lines.push(Line::from(Span::styled(
                        format!("{} ({})", key, group.rows.len()),
                        Style::default().fg(C_GROUP).add_modifier(Modifier::BOLD),
                    )));
                    for row in &group.rows {
                        if i == self.selected {
                            selected_line = lines.len();
                        }
                        lines.push(row_line(row, focused && i == self.selected));
                        i += 1;
                    }
                }
            }
        }

        let height = inner.height as usize;
        let scroll = (selected_line + 1).saturating_sub(height);
        frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);
    }
}

fn row_line(row: &Row, selected: bool) -> Line<'static> {
    let title_style = if selected {
        style_selected_focused()
    } else if row.muted {
        Style::default().fg(C_MUTED)
    } else {
        style_default()
    };
    let mut spans = vec![
        Span::raw("  "),
        Span::styled(row.title.clone(), title_style),
    ];
    if !row.detail.is_empty() {
        spans.push(Span::styled(format!("  {}", row.detail), style_secondary()));
    }
    if let Some(confidence) = row.confidence {
        spans.push(Span::styled(
            format!("  {}", confidence.percent()),
            Style::default().fg(band_color(confidence.band)),
        ));
    }
    if !row.meta.is_empty() {
        spans.push(Span::styled(format!("  {}", row.meta.join(" · ")), style_muted()));
    }
    Line::from(spans)
}
