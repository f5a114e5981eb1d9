//! View renderer — cache snapshot plus view state in, display model out.
//!
//! Nothing here touches the network or the clock; `now` is passed in.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::cache::FetchStatus;
use crate::feeds::{Item, Status};

// ── View state ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Flat,
    Grouped,
}

/// Per-pane filter and layout.  Only user input changes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub filter: String,
    pub mode: ViewMode,
}

impl ViewState {
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::Flat => ViewMode::Grouped,
            ViewMode::Grouped => ViewMode::Flat,
        };
    }
}

// ── Item fields ───────────────────────────────────────────────────────────────

impl Item {
    /// Fields a filter is matched against.
    pub fn search_fields(&self) -> Vec<&str> {
        match self {
            Item::Fact(f) => vec![f.key.as_str(), f.value.as_str(), f.topic.as_str()],
            Item::Memory(m) => vec![m.text.as_str(), m.topic.as_str()],
            Item::Contact(c) => vec![c.name.as_str(), c.phone.as_str(), c.relation.as_str()],
            Item::Sms(s) => {
                let mut fields = vec![s.contact_name.as_str(), s.message.as_str()];
                if let Some(phone) = &s.phone_number {
                    fields.push(phone.as_str());
                }
                fields
            }
            Item::User(u) => vec![
                u.username.as_str(),
                u.display_name.as_str(),
                u.relation.as_str(),
            ],
            Item::Song(s) => vec![s.name.as_str()],
            Item::Model(m) => vec![m.id.as_str(), m.name.as_str()],
            Item::Wifi(w) => vec![w.ssid.as_str()],
            Item::WakeWord(w) => vec![w.as_str()],
            Item::Topic(t) => vec![t.topic.as_str()],
            Item::RecentUpdate(r) => vec![r.text.as_str(), r.topic.as_str()],
            Item::QuickFact(q) => vec![q.key.as_str(), q.value.as_str()],
            Item::Backup(b) => vec![b.as_str()],
        }
    }

    /// Key used by grouped mode.  Kinds without a natural key share `""`.
    pub fn group_key(&self) -> &str {
        match self {
            Item::Fact(f) => f.topic.as_str(),
            Item::Memory(m) => m.topic.as_str(),
            Item::RecentUpdate(r) => r.topic.as_str(),
            Item::Contact(c) => c.relation.as_str(),
            Item::Sms(s) => s.contact_name.as_str(),
            _ => "",
        }
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|f| f.to_lowercase().contains(needle))
    }
}

/// Items matching `filter`, in cache order.  Only an empty filter is the
/// identity; whitespace is matched like any other text.
pub fn filter_items<'a>(items: &'a [Item], filter: &str) -> Vec<&'a Item> {
    if filter.is_empty() {
        return items.iter().collect();
    }
    let needle = filter.to_lowercase();
    items.iter().filter(|i| i.matches(&needle)).collect()
}

/// Partition into groups ordered lexically by key; items keep their
/// relative order inside each group.
pub fn group_items<'a>(items: &[&'a Item]) -> Vec<(String, Vec<&'a Item>)> {
    let mut groups: BTreeMap<&str, Vec<&'a Item>> = BTreeMap::new();
    for item in items {
        groups.entry(item.group_key()).or_default().push(*item);
    }
    groups
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// ── Display model ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    /// Always within `[0, 1]`.
    pub value: f64,
    pub band: Band,
}

impl Confidence {
    pub fn new(raw: f64) -> Self {
        let value = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        let band = if value >= 0.8 {
            Band::High
        } else if value >= 0.5 {
            Band::Medium
        } else {
            Band::Low
        };
        Self { value, band }
    }

    pub fn percent(&self) -> String {
        format!("{}%", (self.value * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub title: String,
    pub detail: String,
    pub meta: Vec<String>,
    pub confidence: Option<Confidence>,
    /// Dimmed in the terminal (disabled contacts, outbound sms).
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    /// No successful fetch yet.  Never shown as an empty list.
    Loading { last_error: Option<String> },
    /// Fetched and confirmed empty, or the filter matched nothing.
    Empty { filtered: bool },
    Flat(Vec<Row>),
    Grouped(Vec<Group>),
}

impl ListView {
    pub fn row_count(&self) -> usize {
        match self {
            ListView::Loading { .. } | ListView::Empty { .. } => 0,
            ListView::Flat(rows) => rows.len(),
            ListView::Grouped(groups) => groups.iter().map(|g| g.rows.len()).sum(),
        }
    }
}

pub fn render_list(
    items: Option<&[Item]>,
    last_error: Option<&str>,
    state: &ViewState,
    now: DateTime<Local>,
) -> ListView {
    let Some(items) = items else {
        return ListView::Loading {
            last_error: last_error.map(str::to_string),
        };
    };
    if items.is_empty() {
        return ListView::Empty { filtered: false };
    }
    let visible = filter_items(items, &state.filter);
    if visible.is_empty() {
        return ListView::Empty { filtered: true };
    }
    match state.mode {
        ViewMode::Flat => ListView::Flat(visible.iter().map(|i| render_row(i, now)).collect()),
        ViewMode::Grouped => ListView::Grouped(
            group_items(&visible)
                .into_iter()
                .map(|(key, items)| Group {
                    key,
                    rows: items.iter().map(|i| render_row(i, now)).collect(),
                })
                .collect(),
        ),
    }
}

pub fn render_row(item: &Item, now: DateTime<Local>) -> Row {
    let mut row = Row {
        title: String::new(),
        detail: String::new(),
        meta: Vec::new(),
        confidence: None,
        muted: false,
    };
    match item {
        Item::Fact(f) => {
            row.title = f.key.replace('_', " ");
            row.detail = f.value.clone();
            row.confidence = Some(Confidence::new(f.confidence));
            row.meta.push(format!("{}x", f.frequency));
            if let Some(ts) = &f.last_updated {
                row.meta.push(relative_time(ts, now));
            }
        }
        Item::Memory(m) => {
            row.title = format!("#{}", m.id);
            row.detail = m.text.clone();
            row.confidence = m.confidence.map(Confidence::new);
            row.meta.push(format!("{}x", m.frequency));
            if let Some(score) = m.score {
                row.meta.push(format!("score {:.2}", score));
            }
            if let Some(ts) = &m.last_accessed {
                row.meta.push(relative_time(ts, now));
            }
        }
        Item::Contact(c) => {
            row.title = c.name.clone();
            row.detail = c.phone.clone();
            row.meta.push(c.relation.clone());
            row.meta.push(format!("priority {}", c.priority));
            row.muted = !c.enabled;
        }
        Item::Sms(s) => {
            let arrow = if s.is_inbound() { "from" } else { "to" };
            row.title = format!("{} {}", arrow, s.contact_name);
            row.detail = s.message.clone();
            if s.message_type.as_deref() == Some("duck") {
                row.meta.push("duck".to_string());
            }
            if let Some(ts) = &s.timestamp {
                row.meta.push(relative_time(ts, now));
            }
            row.muted = !s.is_inbound();
        }
        Item::User(u) => {
            row.title = u.display_name.clone();
            row.detail = u.username.clone();
            row.meta.push(u.relation.clone());
            row.meta.push(format!("{} messages", u.total_messages));
            if let Some(ts) = &u.last_active {
                row.meta.push(relative_time(ts, now));
            }
        }
        Item::Song(s) => {
            row.title = s.name.clone();
        }
        Item::Model(m) => {
            row.title = m.name.clone();
            row.detail = m.id.clone();
        }
        Item::Wifi(w) => {
            row.title = w.ssid.clone();
            row.meta.push(w.signal.clone());
        }
        Item::WakeWord(w) => {
            row.title = capitalize(w);
        }
        Item::Topic(t) => {
            row.title = t.topic.clone();
            row.meta.push(format!("{} mentions", t.mention_count));
        }
        Item::RecentUpdate(r) => {
            row.title = r.topic.clone();
            row.detail = r.text.clone();
            row.confidence = Some(Confidence::new(r.confidence));
            if let Some(ts) = &r.first_seen {
                row.meta.push(relative_time(ts, now));
            }
        }
        Item::QuickFact(q) => {
            row.title = q.key.replace('_', " ");
            row.detail = q.value.clone();
            row.confidence = Some(Confidence::new(q.confidence));
            row.meta.push(format!("{}x", q.frequency));
        }
        Item::Backup(b) => {
            row.title = b.clone();
        }
    }
    row
}

/// Share of all mentions per topic, as `"42.5%"`, in input order.
pub fn topic_shares(items: &[Item]) -> Vec<(String, String)> {
    let topics: Vec<_> = items
        .iter()
        .filter_map(|i| match i {
            Item::Topic(t) => Some(t),
            _ => None,
        })
        .collect();
    let total: u64 = topics.iter().map(|t| t.mention_count).sum();
    topics
        .into_iter()
        .map(|t| {
            let share = if total == 0 {
                0.0
            } else {
                t.mention_count as f64 / total as f64 * 100.0
            };
            (t.topic.clone(), format!("{:.1}%", share))
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Time ──────────────────────────────────────────────────────────────────────

/// Parse the device's timestamps: RFC 3339, or naive local time with a `T`
/// or space separator.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Local>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

pub fn relative_time(ts: &str, now: DateTime<Local>) -> String {
    let Some(then) = parse_timestamp(ts) else {
        return ts.to_string();
    };
    let mins = (now - then).num_minutes();
    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{} min ago", mins)
    } else if mins < 1440 {
        format!("{} h ago", mins / 60)
    } else {
        format!("{} d ago", mins / 1440)
    }
}

// ── Status lines ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Good,
    Warn,
    Bad,
    Muted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
    pub fetch: Option<FetchStatus>,
}

/// Short labelled line for one status record.  `None` renders as loading.
pub fn render_status(label: &'static str, status: Option<&Status>, fetch: Option<FetchStatus>) -> StatusLine {
    let (value, tone) = match status {
        None => ("…".to_string(), Tone::Muted),
        Some(status) => status_value(status),
    };
    let tone = if fetch == Some(FetchStatus::Stale) && tone != Tone::Bad {
        Tone::Muted
    } else {
        tone
    };
    StatusLine {
        label,
        value,
        tone,
        fetch,
    }
}

fn status_value(status: &Status) -> (String, Tone) {
    match status {
        Status::Settings(s) => (
            format!(
                "{} · {} · vol {} · speed {} · beak {}",
                s.personality, s.voice, s.volume, s.speed, s.beak
            ),
            Tone::Normal,
        ),
        Status::Model(m) => (m.model.clone(), Tone::Normal),
        Status::Duck(d) => {
            if d.running {
                ("running".to_string(), Tone::Good)
            } else {
                ("stopped".to_string(), Tone::Bad)
            }
        }
        Status::CurrentUser(u) => (
            format!("{} ({})", u.display_name, u.relation),
            Tone::Normal,
        ),
        Status::Boredom(b) => (
            format!("{}/10 {}", fmt_level(b.level), b.status),
            if b.level >= 7.0 { Tone::Warn } else { Tone::Normal },
        ),
        Status::Hunger(h) => {
            let max = h.max.unwrap_or(10.0);
            let mut text = format!("{}/{}", fmt_level(h.level), fmt_level(max));
            if let Some(meals) = h.meals_today {
                text.push_str(&format!(" · {} meals", meals));
            }
            if let Some(next) = &h.next_meal_time {
                text.push_str(&format!(" · next {}", next));
            }
            let tone = if h.status == "hungry" { Tone::Warn } else { Tone::Normal };
            (text, tone)
        }
        Status::Vision(v) => {
            if v.connected {
                ("connected".to_string(), Tone::Good)
            } else {
                ("not connected".to_string(), Tone::Bad)
            }
        }
        Status::Sleep(s) => {
            if s.is_sleeping {
                let mut text = "sleeping".to_string();
                if let Some(end) = &s.end_time_formatted {
                    text.push_str(&format!(" until {}", end));
                }
                if let Some(mins) = s.remaining_minutes {
                    text.push_str(&format!(" ({} min left)", mins.max(0.0).round() as u64));
                }
                (text, Tone::Warn)
            } else {
                ("awake".to_string(), Tone::Good)
            }
        }
        Status::Printer(p) => printer_value(p),
        Status::System(s) => {
            let temp = s
                .cpu_temp
                .map(|t| format!("{:.1}°C", t))
                .unwrap_or_else(|| "N/A".to_string());
            let mem = s
                .memory
                .as_ref()
                .map(|m| format!("mem {:.0}%", m.used_percent))
                .unwrap_or_else(|| "mem N/A".to_string());
            let hot = s.cpu_temp.is_some_and(|t| t > 80.0)
                || s.memory.as_ref().is_some_and(|m| m.used_percent > 90.0);
            let warm = s.cpu_temp.is_some_and(|t| t > 70.0)
                || s.memory.as_ref().is_some_and(|m| m.used_percent > 80.0);
            let tone = if hot {
                Tone::Bad
            } else if warm {
                Tone::Warn
            } else {
                Tone::Good
            };
            (format!("{} · {}", temp, mem), tone)
        }
        Status::MemoryStats(m) => (
            format!(
                "{} facts · {} memories · {} messages",
                m.total_facts, m.total_memories, m.total_messages
            ),
            Tone::Normal,
        ),
        Status::Embedding(e) => {
            let pct = e.percentage.round() as u64;
            let tone = if pct >= 100 {
                Tone::Good
            } else if pct >= 80 {
                Tone::Warn
            } else {
                Tone::Bad
            };
            (format!("{}/{} ({}%)", e.with_embeddings, e.total_memories, pct), tone)
        }
        Status::Worker(w) => {
            let state = if w.running { "active" } else { "idle" };
            (
                format!("{} · {} unprocessed", state, w.unprocessed),
                if w.running { Tone::Good } else { Tone::Muted },
            )
        }
        Status::Location(l) => (l.location.clone(), Tone::Normal),
        Status::Fan(f) => (
            format!(
                "{} · {} · {:.1}°C",
                f.mode,
                if f.running { "on" } else { "off" },
                f.temp
            ),
            Tone::Normal,
        ),
        Status::MemorySettings(m) => {
            let opt = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
            (
                format!(
                    "ctx {} · search {} · limit {} · threshold {}",
                    opt(m.max_context_facts),
                    opt(m.embedding_search_limit),
                    opt(m.memory_limit),
                    m.memory_threshold
                        .map(|t| format!("{:.2}", t))
                        .unwrap_or_else(|| "-".into())
                ),
                Tone::Normal,
            )
        }
    }
}

fn printer_value(p: &duck_proto::protocol::PrinterStatus) -> (String, Tone) {
    match p.status.as_str() {
        "not_configured" => return ("not configured".to_string(), Tone::Muted),
        "error" => {
            return (
                p.message.clone().unwrap_or_else(|| "unknown error".to_string()),
                Tone::Bad,
            )
        }
        _ => {}
    }
    let Some(job) = &p.printer else {
        return (p.human_readable.clone().unwrap_or_default(), Tone::Normal);
    };
    let state = match job.state.as_str() {
        "IDLE" => "ready",
        "PRINTING" => "printing",
        "PAUSED" => "paused",
        "FINISHED" => "finished",
        "STOPPED" => "stopped",
        "ERROR" => "error",
        other => other,
    };
    let mut text = state.to_string();
    if matches!(job.state.as_str(), "PRINTING" | "PAUSED") {
        if let Some(name) = &job.job_name {
            text.push_str(&format!(" {}", name));
        }
        text.push_str(&format!(" {}%", job.progress.round() as i64));
        if let Some(secs) = job.time_remaining.filter(|s| *s > 0) {
            text.push_str(&format!(" · {} left", fmt_duration(secs)));
        }
    }
    let tone = match job.state.as_str() {
        "PRINTING" | "FINISHED" => Tone::Good,
        "PAUSED" | "STOPPED" => Tone::Warn,
        "ERROR" => Tone::Bad,
        _ => Tone::Normal,
    };
    (text, tone)
}

/// `6.0` → `"6"`, `6.5` → `"6.5"`.
pub fn fmt_level(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{}", level as i64)
    } else {
        format!("{:.1}", level)
    }
}

/// `3900` → `"1h 5m"`, `300` → `"5m"`.
pub fn fmt_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duck_proto::protocol::{
        Contact, Fact, Hunger, Memory, PrinterJob, PrinterStatus, SmsMessage, TopicStat,
    };

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn fact(key: &str, topic: &str, confidence: f64) -> Item {
        Item::Fact(Fact {
            key: key.into(),
            value: format!("{} value", key),
            topic: topic.into(),
            confidence,
            frequency: 2,
            ..Default::default()
        })
    }

    fn sample() -> Vec<Item> {
        vec![
            fact("user_name", "family", 0.95),
            fact("favorite_food", "preferences", 0.6),
            fact("sister_1_name", "family", 0.8),
            fact("weather_pref", "", 0.2),
            fact("hobby", "hobby", 1.7),
        ]
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let items = sample();
        let all: Vec<&Item> = items.iter().collect();
        assert_eq!(filter_items(&items, ""), all);
    }

    #[test]
    fn test_whitespace_filter_is_a_substring() {
        let items: Vec<Item> = [("pet", "a cat"), ("color", "blue")]
            .into_iter()
            .map(|(key, value)| {
                Item::Fact(Fact {
                    key: key.into(),
                    value: value.into(),
                    topic: "misc".into(),
                    ..Default::default()
                })
            })
            .collect();
        let hits = filter_items(&items, " ");
        assert_eq!(hits, vec![&items[0]]);
        assert!(filter_items(&items, "cat ").is_empty());
    }

    #[test]
    fn test_filter_case_insensitive_over_fields() {
        let items = sample();
        let hits = filter_items(&items, "FAMILY");
        assert_eq!(hits.len(), 2);
        assert_eq!(filter_items(&items, "food VALUE").len(), 1);
        assert!(filter_items(&items, "zzz").is_empty());
    }

    #[test]
    fn test_sms_and_contact_fields() {
        let sms = Item::Sms(SmsMessage {
            direction: "inbound".into(),
            contact_name: "Rigmor".into(),
            phone_number: Some("+4799".into()),
            message: "Hei anda".into(),
            ..Default::default()
        });
        assert_eq!(filter_items(std::slice::from_ref(&sms), "4799").len(), 1);
        assert_eq!(sms.group_key(), "Rigmor");

        let contact = Item::Contact(Contact {
            name: "Arne".into(),
            relation: "friend".into(),
            ..Default::default()
        });
        assert_eq!(contact.group_key(), "friend");
    }

    #[test]
    fn test_grouping_partitions_every_item_once() {
        let items = sample();
        let refs: Vec<&Item> = items.iter().collect();
        let groups = group_items(&refs);

        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["", "family", "hobby", "preferences"]);

        let mut seen: Vec<*const Item> = groups
            .iter()
            .flat_map(|(_, g)| g.iter().map(|i| *i as *const Item))
            .collect();
        assert_eq!(seen.len(), items.len());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), items.len());

        // cache order kept inside a group
        let family: Vec<&Item> = groups[1].1.clone();
        assert_eq!(family, vec![&items[0], &items[2]]);
    }

    #[test]
    fn test_loading_is_not_empty() {
        let state = ViewState::default();
        assert_eq!(
            render_list(None, None, &state, now()),
            ListView::Loading { last_error: None }
        );
        assert_eq!(
            render_list(None, Some("HTTP 500"), &state, now()),
            ListView::Loading {
                last_error: Some("HTTP 500".into())
            }
        );
        assert_eq!(
            render_list(Some(&[][..]), None, &state, now()),
            ListView::Empty { filtered: false }
        );
        let items = sample();
        let state = ViewState {
            filter: "nothing matches".into(),
            mode: ViewMode::Grouped,
        };
        assert_eq!(
            render_list(Some(items.as_slice()), None, &state, now()),
            ListView::Empty { filtered: true }
        );
    }

    #[test]
    fn test_grouped_render_row_count() {
        let items = sample();
        let mut state = ViewState::default();
        state.toggle_mode();
        let view = render_list(Some(items.as_slice()), None, &state, now());
        assert_eq!(view.row_count(), items.len());
        assert!(matches!(view, ListView::Grouped(ref g) if g.len() == 4));
    }

    #[test]
    fn test_confidence_clamped_and_banded() {
        assert_eq!(Confidence::new(1.7).value, 1.0);
        assert_eq!(Confidence::new(-0.3).value, 0.0);
        assert_eq!(Confidence::new(f64::NAN).value, 0.0);
        assert_eq!(Confidence::new(0.8).band, Band::High);
        assert_eq!(Confidence::new(0.5).band, Band::Medium);
        assert_eq!(Confidence::new(0.49).band, Band::Low);
        assert_eq!(Confidence::new(0.954).percent(), "95%");

        let row = render_row(&sample()[4], now());
        assert_eq!(row.confidence.map(|c| c.value), Some(1.0));
        assert_eq!(row.meta[0], "2x");
    }

    #[test]
    fn test_relative_time() {
        assert_eq!(relative_time("2024-05-01T11:59:40", now()), "just now");
        assert_eq!(relative_time("2024-05-01 11:55:00", now()), "5 min ago");
        assert_eq!(relative_time("2024-05-01T08:30:00.123456", now()), "3 h ago");
        assert_eq!(relative_time("2024-04-28T12:00:00", now()), "3 d ago");
        assert_eq!(relative_time("2024-05-01T12:30:00", now()), "just now");
        assert_eq!(relative_time("yesterday", now()), "yesterday");
    }

    #[test]
    fn test_memory_row() {
        let item = Item::Memory(Memory {
            id: 7,
            text: "went fishing".into(),
            topic: "hobby".into(),
            frequency: 3,
            score: Some(0.912),
            last_accessed: Some("2024-05-01T11:00:00".into()),
            ..Default::default()
        });
        let row = render_row(&item, now());
        assert_eq!(row.title, "#7");
        assert_eq!(row.meta, vec!["3x", "score 0.91", "1 h ago"]);
    }

    #[test]
    fn test_status_lines() {
        let hunger = Status::Hunger(Hunger {
            level: 6.0,
            status: "fed".into(),
            max: Some(10.0),
            ..Default::default()
        });
        assert_eq!(render_status("hunger", Some(&hunger), None).value, "6/10");

        let printer = Status::Printer(PrinterStatus {
            status: "success".into(),
            printer: Some(PrinterJob {
                state: "PRINTING".into(),
                progress: 41.6,
                time_remaining: Some(3900),
                job_name: Some("benchy".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let line = render_status("printer", Some(&printer), None);
        assert_eq!(line.value, "printing benchy 42% · 1h 5m left");
        assert_eq!(line.tone, Tone::Good);

        let loading = render_status("duck", None, None);
        assert_eq!(loading.tone, Tone::Muted);
    }

    #[test]
    fn test_topic_shares() {
        let items = vec![
            Item::Topic(TopicStat {
                topic: "family".into(),
                mention_count: 3,
                ..Default::default()
            }),
            Item::Topic(TopicStat {
                topic: "work".into(),
                mention_count: 1,
                ..Default::default()
            }),
        ];
        assert_eq!(
            topic_shares(&items),
            vec![
                ("family".to_string(), "75.0%".to_string()),
                ("work".to_string(), "25.0%".to_string())
            ]
        );
    }

    #[test]
    fn test_fmt_helpers() {
        assert_eq!(fmt_level(6.0), "6");
        assert_eq!(fmt_level(6.5), "6.5");
        assert_eq!(fmt_duration(3900), "1h 5m");
        assert_eq!(fmt_duration(300), "5m");
    }
}
