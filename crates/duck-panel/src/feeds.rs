//! Feeds — every poll-able remote read and how its reply is decoded.
//!
//! A feed is either a [`Collection`] (an ordered item sequence) or a
//! [`StatusKind`] (one typed record).

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use duck_proto::config::PollingConfig;
use duck_proto::endpoints::{self, Endpoint};
use duck_proto::protocol::{self as wire, read_failure};

use crate::gateway::{Gateway, GatewayError, PathArgs};

// ── Identities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Facts,
    Memories,
    Contacts,
    SmsHistory,
    WakeWords,
    Models,
    Songs,
    Users,
    WifiNetworks,
    Topics,
    RecentUpdates,
    QuickFacts,
    Backups,
}

impl Collection {
    pub const ALL: [Collection; 13] = [
        Collection::Facts,
        Collection::Memories,
        Collection::Contacts,
        Collection::SmsHistory,
        Collection::WakeWords,
        Collection::Models,
        Collection::Songs,
        Collection::Users,
        Collection::WifiNetworks,
        Collection::Topics,
        Collection::RecentUpdates,
        Collection::QuickFacts,
        Collection::Backups,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Facts => "facts",
            Collection::Memories => "memories",
            Collection::Contacts => "contacts",
            Collection::SmsHistory => "sms_history",
            Collection::WakeWords => "wake_words",
            Collection::Models => "models",
            Collection::Songs => "songs",
            Collection::Users => "users",
            Collection::WifiNetworks => "wifi_networks",
            Collection::Topics => "topics",
            Collection::RecentUpdates => "recent_updates",
            Collection::QuickFacts => "quick_facts",
            Collection::Backups => "backups",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Collection::Facts => "facts",
            Collection::Memories => "memories",
            Collection::Contacts => "contacts",
            Collection::SmsHistory => "sms",
            Collection::WakeWords => "wake words",
            Collection::Models => "models",
            Collection::Songs => "songs",
            Collection::Users => "users",
            Collection::WifiNetworks => "wifi",
            Collection::Topics => "topics",
            Collection::RecentUpdates => "recent",
            Collection::QuickFacts => "quick facts",
            Collection::Backups => "backups",
        }
    }

    pub fn endpoint(self) -> &'static Endpoint {
        match self {
            Collection::Facts => &endpoints::FACTS,
            Collection::Memories => &endpoints::MEMORIES,
            Collection::Contacts => &endpoints::CONTACTS,
            Collection::SmsHistory => &endpoints::SMS_HISTORY,
            Collection::WakeWords => &endpoints::WAKE_WORDS,
            Collection::Models => &endpoints::AVAILABLE_MODELS,
            Collection::Songs => &endpoints::SONGS,
            Collection::Users => &endpoints::USERS,
            Collection::WifiNetworks => &endpoints::WIFI_NETWORKS,
            Collection::Topics => &endpoints::TOPICS,
            Collection::RecentUpdates => &endpoints::RECENT_UPDATES,
            Collection::QuickFacts => &endpoints::QUICK_FACTS,
            Collection::Backups => &endpoints::BACKUPS,
        }
    }

    /// Key holding the item array; `None` when the reply is a bare array.
    fn items_key(self) -> Option<&'static str> {
        match self {
            Collection::Facts | Collection::QuickFacts => Some("facts"),
            Collection::Memories => Some("memories"),
            Collection::Contacts | Collection::SmsHistory => None,
            Collection::WakeWords => Some("wake_words"),
            Collection::Models => Some("models"),
            Collection::Songs => Some("songs"),
            Collection::Users => Some("users"),
            Collection::WifiNetworks => Some("networks"),
            Collection::Topics => Some("topics"),
            Collection::RecentUpdates => Some("updates"),
            Collection::Backups => Some("backups"),
        }
    }

    pub fn period(self, polling: &PollingConfig) -> Duration {
        let ms = match self {
            Collection::Backups => polling.backups_ms,
            Collection::WakeWords
            | Collection::Models
            | Collection::Songs
            | Collection::Users
            | Collection::WifiNetworks => polling.settings_ms,
            _ => polling.lists_ms,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKind {
    Settings,
    Model,
    Duck,
    CurrentUser,
    Boredom,
    Hunger,
    Vision,
    Sleep,
    Printer,
    System,
    MemoryStats,
    Embedding,
    Worker,
    Location,
    Fan,
    MemorySettings,
}

impl StatusKind {
    pub const ALL: [StatusKind; 16] = [
        StatusKind::Settings,
        StatusKind::Model,
        StatusKind::Duck,
        StatusKind::CurrentUser,
        StatusKind::Boredom,
        StatusKind::Hunger,
        StatusKind::Vision,
        StatusKind::Sleep,
        StatusKind::Printer,
        StatusKind::System,
        StatusKind::MemoryStats,
        StatusKind::Embedding,
        StatusKind::Worker,
        StatusKind::Location,
        StatusKind::Fan,
        StatusKind::MemorySettings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatusKind::Settings => "settings",
            StatusKind::Model => "model",
            StatusKind::Duck => "duck",
            StatusKind::CurrentUser => "current_user",
            StatusKind::Boredom => "boredom",
            StatusKind::Hunger => "hunger",
            StatusKind::Vision => "vision",
            StatusKind::Sleep => "sleep",
            StatusKind::Printer => "printer",
            StatusKind::System => "system",
            StatusKind::MemoryStats => "memory_stats",
            StatusKind::Embedding => "embedding",
            StatusKind::Worker => "worker",
            StatusKind::Location => "location",
            StatusKind::Fan => "fan",
            StatusKind::MemorySettings => "memory_settings",
        }
    }

    /// Short label for the status strip.
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Settings => "Settings",
            StatusKind::Model => "Model",
            StatusKind::Duck => "Duck",
            StatusKind::CurrentUser => "User",
            StatusKind::Boredom => "Boredom",
            StatusKind::Hunger => "Hunger",
            StatusKind::Vision => "Vision",
            StatusKind::Sleep => "Sleep",
            StatusKind::Printer => "Printer",
            StatusKind::System => "System",
            StatusKind::MemoryStats => "Memory",
            StatusKind::Embedding => "Embeddings",
            StatusKind::Worker => "Worker",
            StatusKind::Location => "Location",
            StatusKind::Fan => "Fan",
            StatusKind::MemorySettings => "Recall",
        }
    }

    pub fn endpoint(self) -> &'static Endpoint {
        match self {
            StatusKind::Settings => &endpoints::STATUS,
            StatusKind::Model => &endpoints::CURRENT_MODEL,
            StatusKind::Duck => &endpoints::DUCK_STATUS,
            StatusKind::CurrentUser => &endpoints::CURRENT_USER,
            StatusKind::Boredom => &endpoints::BOREDOM,
            StatusKind::Hunger => &endpoints::HUNGER,
            StatusKind::Vision => &endpoints::VISION,
            StatusKind::Sleep => &endpoints::SLEEP_STATUS,
            StatusKind::Printer => &endpoints::PRINTER,
            StatusKind::System => &endpoints::SYSTEM_STATS,
            StatusKind::MemoryStats => &endpoints::MEMORY_STATS,
            StatusKind::Embedding => &endpoints::EMBEDDING_STATUS,
            StatusKind::Worker => &endpoints::WORKER_STATUS,
            StatusKind::Location => &endpoints::LOCATION,
            StatusKind::Fan => &endpoints::FAN_STATUS,
            StatusKind::MemorySettings => &endpoints::MEMORY_SETTINGS,
        }
    }

    pub fn period(self, polling: &PollingConfig) -> Duration {
        let ms = match self {
            StatusKind::Sleep => polling.sleep_ms,
            StatusKind::Duck
            | StatusKind::Fan
            | StatusKind::Boredom
            | StatusKind::Hunger
            | StatusKind::Vision
            | StatusKind::System => polling.sensors_ms,
            StatusKind::CurrentUser
            | StatusKind::MemoryStats
            | StatusKind::Embedding
            | StatusKind::Worker
            | StatusKind::Location
            | StatusKind::Printer => polling.lists_ms,
            StatusKind::Settings | StatusKind::Model | StatusKind::MemorySettings => {
                polling.settings_ms
            }
        };
        Duration::from_millis(ms)
    }
}

/// Anything the scheduler can poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feed {
    Collection(Collection),
    Status(StatusKind),
}

impl Feed {
    pub fn all() -> impl Iterator<Item = Feed> {
        Collection::ALL
            .into_iter()
            .map(Feed::Collection)
            .chain(StatusKind::ALL.into_iter().map(Feed::Status))
    }

    pub fn name(self) -> &'static str {
        match self {
            Feed::Collection(c) => c.name(),
            Feed::Status(s) => s.name(),
        }
    }

    pub fn period(self, polling: &PollingConfig) -> Duration {
        match self {
            Feed::Collection(c) => c.period(polling),
            Feed::Status(s) => s.period(polling),
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Decoded data ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Fact(wire::Fact),
    Memory(wire::Memory),
    Contact(wire::Contact),
    Sms(wire::SmsMessage),
    WakeWord(String),
    Model(wire::ModelInfo),
    Song(wire::Song),
    User(wire::User),
    Wifi(wire::WifiNetwork),
    Topic(wire::TopicStat),
    RecentUpdate(wire::RecentUpdate),
    QuickFact(wire::QuickFact),
    Backup(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Settings(wire::Settings),
    Model(wire::CurrentModel),
    Duck(wire::DuckStatus),
    CurrentUser(wire::CurrentUser),
    Boredom(wire::Boredom),
    Hunger(wire::Hunger),
    Vision(wire::Vision),
    Sleep(wire::SleepStatus),
    Printer(wire::PrinterStatus),
    System(wire::SystemStats),
    MemoryStats(wire::MemoryStats),
    Embedding(wire::EmbeddingStatus),
    Worker(wire::WorkerStatus),
    Location(wire::Location),
    Fan(wire::FanStatus),
    MemorySettings(wire::MemorySettings),
}

/// What one successful poll produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedData {
    Items(Vec<Item>),
    Status(Status),
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{feed}: reply has no `{key}` array")]
    MissingItems { feed: &'static str, key: &'static str },
    #[error("{feed}: expected a JSON array")]
    NotAnArray { feed: &'static str },
    #[error("{feed}: {source}")]
    Shape {
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a background poll produced nothing new.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{feed}: {message}")]
    Rejected { feed: &'static str, message: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// ── Decoding ──────────────────────────────────────────────────────────────────

pub fn decode_collection(collection: Collection, body: &Value) -> Result<Vec<Item>, DecodeError> {
    let feed = collection.name();
    let array = match collection.items_key() {
        Some(key) => body
            .get(key)
            .ok_or(DecodeError::MissingItems { feed, key })?,
        None => body,
    };
    let raw = array.as_array().ok_or(DecodeError::NotAnArray { feed })?;

    raw.iter()
        .map(|v| decode_item(collection, v).map_err(|source| DecodeError::Shape { feed, source }))
        .collect()
}

fn decode_item(collection: Collection, v: &Value) -> Result<Item, serde_json::Error> {
    Ok(match collection {
        Collection::Facts => Item::Fact(from(v)?),
        Collection::Memories => Item::Memory(from(v)?),
        Collection::Contacts => Item::Contact(from(v)?),
        Collection::SmsHistory => Item::Sms(from(v)?),
        Collection::WakeWords => Item::WakeWord(from(v)?),
        Collection::Models => Item::Model(from(v)?),
        Collection::Songs => Item::Song(from(v)?),
        Collection::Users => Item::User(from(v)?),
        Collection::WifiNetworks => Item::Wifi(from(v)?),
        Collection::Topics => Item::Topic(from(v)?),
        Collection::RecentUpdates => Item::RecentUpdate(from(v)?),
        Collection::QuickFacts => Item::QuickFact(from(v)?),
        Collection::Backups => Item::Backup(from(v)?),
    })
}

pub fn decode_status(kind: StatusKind, body: &Value) -> Result<Status, DecodeError> {
    let feed = kind.name();
    let shape = |source| DecodeError::Shape { feed, source };
    Ok(match kind {
        StatusKind::Settings => Status::Settings(from(body).map_err(shape)?),
        StatusKind::Model => Status::Model(from(body).map_err(shape)?),
        StatusKind::Duck => Status::Duck(from(body).map_err(shape)?),
        StatusKind::CurrentUser => Status::CurrentUser(from(body).map_err(shape)?),
        StatusKind::Boredom => Status::Boredom(from(body).map_err(shape)?),
        StatusKind::Hunger => Status::Hunger(from(body).map_err(shape)?),
        StatusKind::Vision => Status::Vision(from(body).map_err(shape)?),
        StatusKind::Sleep => Status::Sleep(from(body).map_err(shape)?),
        StatusKind::Printer => Status::Printer(from(body).map_err(shape)?),
        StatusKind::System => Status::System(from(body).map_err(shape)?),
        StatusKind::MemoryStats => {
            let stats = body.get("stats").unwrap_or(body);
            Status::MemoryStats(from(stats).map_err(shape)?)
        }
        StatusKind::Embedding => Status::Embedding(from(body).map_err(shape)?),
        StatusKind::Worker => Status::Worker(from(body).map_err(shape)?),
        StatusKind::Location => Status::Location(from(body).map_err(shape)?),
        StatusKind::Fan => Status::Fan(from(body).map_err(shape)?),
        StatusKind::MemorySettings => Status::MemorySettings(from(body).map_err(shape)?),
    })
}

fn from<T: DeserializeOwned>(v: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(v)
}

// ── Fetching ──────────────────────────────────────────────────────────────────

pub async fn fetch(gateway: &Gateway, feed: Feed) -> Result<FeedData, FetchError> {
    match feed {
        Feed::Collection(c) => fetch_collection(gateway, c).await.map(FeedData::Items),
        Feed::Status(s) => fetch_status(gateway, s).await.map(FeedData::Status),
    }
}

pub async fn fetch_collection(
    gateway: &Gateway,
    collection: Collection,
) -> Result<Vec<Item>, FetchError> {
    let body = read(gateway, collection.endpoint(), collection.name()).await?;
    Ok(decode_collection(collection, &body)?)
}

pub async fn fetch_status(gateway: &Gateway, kind: StatusKind) -> Result<Status, FetchError> {
    let mut body = read(gateway, kind.endpoint(), kind.name()).await?;
    if kind == StatusKind::MemorySettings {
        // The context-fact cap lives behind its own getter.
        let extra = read(gateway, &endpoints::MAX_CONTEXT_FACTS, kind.name()).await?;
        if let (Some(obj), Some(cap)) = (body.as_object_mut(), extra.get("max_context_facts")) {
            obj.insert("max_context_facts".to_string(), cap.clone());
        }
    }
    Ok(decode_status(kind, &body)?)
}

/// Last `lines` lines of the device log.
pub async fn fetch_logs(gateway: &Gateway, lines: u32) -> Result<String, FetchError> {
    let body = gateway
        .call(&endpoints::LOGS, &PathArgs::none().query("lines", lines), None)
        .await?;
    if let Some(message) = read_failure(&body) {
        return Err(FetchError::Rejected { feed: "logs", message });
    }
    let reply: wire::LogsReply = from(&body).map_err(|source| DecodeError::Shape {
        feed: "logs",
        source,
    })?;
    Ok(reply.logs)
}

async fn read(
    gateway: &Gateway,
    endpoint: &Endpoint,
    feed: &'static str,
) -> Result<Value, FetchError> {
    let body = gateway.call(endpoint, &PathArgs::none(), None).await?;
    if let Some(message) = read_failure(&body) {
        return Err(FetchError::Rejected { feed, message });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_facts_keeps_order() {
        let body = json!({
            "status": "success",
            "facts": [
                {"key": "user_name", "value": "Osmund", "topic": "family", "confidence": 0.9, "frequency": 4},
                {"key": "favorite_color", "value": "blue", "topic": "preferences", "confidence": 0.4, "frequency": 1},
            ]
        });
        let items = decode_collection(Collection::Facts, &body).unwrap();
        assert_eq!(items.len(), 2);
        match &items[1] {
            Item::Fact(f) => assert_eq!(f.key, "favorite_color"),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_decode_bare_array_collections() {
        let body = json!([{"id": 1, "name": "Rigmor", "phone": "+47 000", "relation": "sister", "priority": 5, "enabled": true}]);
        let items = decode_collection(Collection::Contacts, &body).unwrap();
        assert!(matches!(&items[0], Item::Contact(c) if c.name == "Rigmor"));

        let err = decode_collection(Collection::SmsHistory, &json!({"oops": 1})).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnArray { feed: "sms_history" }));
    }

    #[test]
    fn test_decode_string_lists() {
        let items = decode_collection(Collection::WakeWords, &json!({"wake_words": ["Samantha", "quack quack"]})).unwrap();
        assert_eq!(items, vec![Item::WakeWord("Samantha".into()), Item::WakeWord("quack quack".into())]);

        let items = decode_collection(Collection::Backups, &json!({"status": "success", "backups": ["b1.tar"], "total": 1})).unwrap();
        assert_eq!(items, vec![Item::Backup("b1.tar".into())]);
    }

    #[test]
    fn test_decode_missing_key() {
        let err = decode_collection(Collection::Songs, &json!({"error": "no dir"})).unwrap_err();
        assert!(matches!(err, DecodeError::MissingItems { key: "songs", .. }));
    }

    #[test]
    fn test_decode_memory_stats_nested() {
        let status = decode_status(
            StatusKind::MemoryStats,
            &json!({"status": "success", "stats": {"total_facts": 12, "total_memories": 40, "total_messages": 300}}),
        )
        .unwrap();
        match status {
            Status::MemoryStats(s) => assert_eq!(s.total_memories, 40),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_periods_follow_cadence_groups() {
        let polling = PollingConfig::default();
        assert_eq!(Feed::Status(StatusKind::Sleep).period(&polling), Duration::from_secs(1));
        assert_eq!(Feed::Status(StatusKind::Hunger).period(&polling), Duration::from_secs(5));
        assert_eq!(Feed::Collection(Collection::Facts).period(&polling), Duration::from_secs(10));
        assert_eq!(Feed::Collection(Collection::Backups).period(&polling), Duration::from_secs(30));
        assert_eq!(Feed::Collection(Collection::Songs).period(&polling), Duration::from_secs(60));
        assert_eq!(Feed::all().count(), 29);
    }
}
