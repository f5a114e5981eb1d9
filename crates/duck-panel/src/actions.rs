//! Action coordinator — user-triggered mutations.
//!
//! An action is validated locally, sent once, and judged on its envelope.
//! The cache is never written from here: a successful action names the feeds
//! to re-poll shortly after, and the next real snapshot is the final word.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use duck_proto::endpoints::{self, Endpoint};
use duck_proto::protocol::{
    action_outcome, failure_message, AskAiReply, Contact, FeedReply, Outcome, SwitchUserReply,
};

use crate::feeds::{Collection, Feed, StatusKind};
use crate::gateway::{Gateway, GatewayError, PathArgs};
use crate::view::fmt_level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodType {
    Cookie,
    Pizza,
}

impl FoodType {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodType::Cookie => "cookie",
            FoodType::Pizza => "pizza",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Auto,
    On,
    Off,
}

impl FanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::On => "on",
            FanMode::Off => "off",
        }
    }
}

/// A contact being created (`id == None`) or edited.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactDraft {
    pub id: Option<i64>,
    pub name: String,
    pub phone: String,
    /// Empty means `"friend"`.
    pub relation: String,
    /// `None` means 5.
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemorySettingsDraft {
    pub embedding_search_limit: Option<u32>,
    pub memory_limit: Option<u32>,
    pub memory_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    ChangeBeak(String),
    ChangePersonality(String),
    ChangeVoice(String),
    ChangeModel(String),
    ChangeVolume(i64),
    ChangeSpeed(i64),
    SetFanMode(FanMode),
    Control(String),
    Speak(String),
    AskAi(String),
    StartConversation,
    TestBeak,
    PlaySong(String),
    StopSong,
    Feed(FoodType),
    SwitchUser(String),
    DeleteFact(String),
    DeleteMemory(i64),
    DeleteContact(i64),
    SaveContact(ContactDraft),
    SetContactEnabled { contact: Contact, enabled: bool },
    EnableSleep { minutes: u32 },
    DisableSleep,
    StartBackup,
    Reboot,
    Shutdown,
    StartPortal,
    SetMaxContextFacts(u32),
    SetMemorySettings(MemorySettingsDraft),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("nothing to change")]
    NothingToChange,
}

/// A validated call, ready for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: Endpoint,
    pub args: PathArgs,
    pub payload: Option<Value>,
}

impl Request {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            args: PathArgs::none(),
            payload: None,
        }
    }

    fn body(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    fn arg(mut self, param: &'static str, value: impl ToString) -> Self {
        self.args = self.args.with(param, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Success {
        message: String,
        /// Feeds to re-poll after the confirmation delay.
        refresh: Vec<Feed>,
        /// Free text the device answered with (ask AI).
        reply: Option<String>,
    },
    /// Rejected locally; nothing was sent.
    Invalid(ValidationError),
    /// Delivered, but the envelope reported failure.
    Rejected { message: String },
    /// Never delivered, or the reply was unusable.
    Failed { message: String },
}

impl Settlement {
    pub fn is_success(&self) -> bool {
        matches!(self, Settlement::Success { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Settlement::Success { message, .. } => message.clone(),
            Settlement::Invalid(e) => e.to_string(),
            Settlement::Rejected { message } | Settlement::Failed { message } => message.clone(),
        }
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn in_range<T>(field: &'static str, value: T, min: T, max: T) -> Result<T, ValidationError>
where
    T: PartialOrd + Copy + Into<f64>,
{
    if value < min || value > max {
        Err(ValidationError::OutOfRange {
            field,
            min: min.into(),
            max: max.into(),
        })
    } else {
        Ok(value)
    }
}

impl UserAction {
    /// Name of the control this action belongs to; notices are keyed by it.
    pub fn control(&self) -> &'static str {
        match self {
            UserAction::ChangeBeak(_) => "beak",
            UserAction::ChangePersonality(_) => "personality",
            UserAction::ChangeVoice(_) => "voice",
            UserAction::ChangeModel(_) => "model",
            UserAction::ChangeVolume(_) => "volume",
            UserAction::ChangeSpeed(_) => "speed",
            UserAction::SetFanMode(_) => "fan",
            UserAction::Control(_) => "control",
            UserAction::Speak(_) => "speak",
            UserAction::AskAi(_) => "ask_ai",
            UserAction::StartConversation => "conversation",
            UserAction::TestBeak => "test_beak",
            UserAction::PlaySong(_) | UserAction::StopSong => "music",
            UserAction::Feed(_) => "feed",
            UserAction::SwitchUser(_) => "user",
            UserAction::DeleteFact(_) => "delete_fact",
            UserAction::DeleteMemory(_) => "delete_memory",
            UserAction::DeleteContact(_)
            | UserAction::SaveContact(_)
            | UserAction::SetContactEnabled { .. } => "contacts",
            UserAction::EnableSleep { .. } | UserAction::DisableSleep => "sleep",
            UserAction::StartBackup => "backup",
            UserAction::Reboot | UserAction::Shutdown => "power",
            UserAction::StartPortal => "portal",
            UserAction::SetMaxContextFacts(_) | UserAction::SetMemorySettings(_) => {
                "memory_settings"
            }
        }
    }

    /// Deletes, power actions, the wifi portal and backups ask first.
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            UserAction::DeleteFact(_)
                | UserAction::DeleteMemory(_)
                | UserAction::DeleteContact(_)
                | UserAction::Reboot
                | UserAction::Shutdown
                | UserAction::StartPortal
                | UserAction::StartBackup
        )
    }

    pub fn confirmation_prompt(&self) -> String {
        match self {
            UserAction::DeleteFact(key) => format!("Delete fact \"{}\"?", key),
            UserAction::DeleteMemory(id) => format!("Delete memory #{}?", id),
            UserAction::DeleteContact(id) => format!("Delete contact #{}?", id),
            UserAction::Reboot => "Reboot the duck?".to_string(),
            UserAction::Shutdown => "Shut the duck down?".to_string(),
            UserAction::StartPortal => "Start the WiFi portal? The duck drops off the network.".to_string(),
            UserAction::StartBackup => "Start a backup? This can take a couple of minutes.".to_string(),
            other => format!("Run {}?", other.control()),
        }
    }

    /// Feeds whose snapshot this action changes.
    pub fn refresh_targets(&self) -> Vec<Feed> {
        use Feed::{Collection as C, Status as S};
        match self {
            UserAction::ChangeBeak(_)
            | UserAction::ChangePersonality(_)
            | UserAction::ChangeVoice(_)
            | UserAction::ChangeVolume(_)
            | UserAction::ChangeSpeed(_) => vec![S(StatusKind::Settings)],
            UserAction::ChangeModel(_) => vec![S(StatusKind::Model)],
            UserAction::SetFanMode(_) => vec![S(StatusKind::Fan)],
            UserAction::Control(_)
            | UserAction::Reboot
            | UserAction::Shutdown
            | UserAction::StartPortal => vec![S(StatusKind::Duck)],
            UserAction::Speak(_)
            | UserAction::AskAi(_)
            | UserAction::StartConversation
            | UserAction::TestBeak
            | UserAction::PlaySong(_)
            | UserAction::StopSong => vec![],
            UserAction::Feed(_) => vec![S(StatusKind::Hunger)],
            UserAction::SwitchUser(_) => vec![S(StatusKind::CurrentUser), C(Collection::Users)],
            UserAction::DeleteFact(_) => vec![
                C(Collection::Facts),
                C(Collection::QuickFacts),
                S(StatusKind::MemoryStats),
            ],
            UserAction::DeleteMemory(_) => {
                vec![C(Collection::Memories), S(StatusKind::MemoryStats)]
            }
            UserAction::DeleteContact(_)
            | UserAction::SaveContact(_)
            | UserAction::SetContactEnabled { .. } => vec![C(Collection::Contacts)],
            UserAction::EnableSleep { .. } | UserAction::DisableSleep => {
                vec![S(StatusKind::Sleep)]
            }
            UserAction::StartBackup => vec![C(Collection::Backups)],
            UserAction::SetMaxContextFacts(_) | UserAction::SetMemorySettings(_) => {
                vec![S(StatusKind::MemorySettings)]
            }
        }
    }

    /// Check local inputs and build the call.  Makes no network request.
    pub fn prepare(&self) -> Result<Request, ValidationError> {
        use endpoints as ep;
        Ok(match self {
            UserAction::ChangeBeak(v) => {
                Request::new(ep::CHANGE_BEAK).body(json!({ "beak": non_empty("beak", v)? }))
            }
            UserAction::ChangePersonality(v) => Request::new(ep::CHANGE_PERSONALITY)
                .body(json!({ "personality": non_empty("personality", v)? })),
            UserAction::ChangeVoice(v) => {
                Request::new(ep::CHANGE_VOICE).body(json!({ "voice": non_empty("voice", v)? }))
            }
            UserAction::ChangeModel(v) => {
                Request::new(ep::CHANGE_MODEL).body(json!({ "model": non_empty("model", v)? }))
            }
            UserAction::ChangeVolume(v) => Request::new(ep::CHANGE_VOLUME)
                .body(json!({ "volume": in_range("volume", *v as f64, 0.0, 100.0)? as i64 })),
            UserAction::ChangeSpeed(v) => Request::new(ep::CHANGE_SPEED)
                .body(json!({ "speed": in_range("speed", *v as f64, 0.0, 100.0)? as i64 })),
            UserAction::SetFanMode(mode) => {
                Request::new(ep::SET_FAN_MODE).body(json!({ "mode": mode.as_str() }))
            }
            UserAction::Control(action) => {
                Request::new(ep::CONTROL).body(json!({ "action": non_empty("action", action)? }))
            }
            UserAction::Speak(text) => {
                Request::new(ep::SPEAK).body(json!({ "text": non_empty("message", text)? }))
            }
            UserAction::AskAi(text) => {
                Request::new(ep::ASK_AI).body(json!({ "text": non_empty("question", text)? }))
            }
            UserAction::StartConversation => Request::new(ep::START_CONVERSATION),
            UserAction::TestBeak => Request::new(ep::TEST_BEAK),
            UserAction::PlaySong(path) => {
                Request::new(ep::PLAY_SONG).body(json!({ "song_path": non_empty("song", path)? }))
            }
            UserAction::StopSong => Request::new(ep::STOP_SONG),
            UserAction::Feed(food) => {
                Request::new(ep::FEED).body(json!({ "food_type": food.as_str() }))
            }
            UserAction::SwitchUser(username) => Request::new(ep::SWITCH_USER)
                .body(json!({ "username": non_empty("user", username)? })),
            UserAction::DeleteFact(key) => {
                Request::new(ep::DELETE_FACT).arg("key", non_empty("fact key", key)?)
            }
            UserAction::DeleteMemory(id) => Request::new(ep::DELETE_MEMORY).arg("id", id),
            UserAction::DeleteContact(id) => Request::new(ep::DELETE_CONTACT).arg("id", id),
            UserAction::SaveContact(draft) => {
                let name = non_empty("name", &draft.name)?;
                let phone = non_empty("phone", &draft.phone)?;
                let relation = match draft.relation.trim() {
                    "" => "friend".to_string(),
                    r => r.to_string(),
                };
                let priority = in_range("priority", draft.priority.unwrap_or(5) as f64, 1.0, 10.0)?;
                let body = json!({
                    "name": name,
                    "phone": phone,
                    "relation": relation,
                    "enabled": true,
                    "priority": priority as i64,
                });
                match draft.id {
                    Some(id) => Request::new(ep::UPDATE_CONTACT).arg("id", id).body(body),
                    None => Request::new(ep::CREATE_CONTACT).body(body),
                }
            }
            UserAction::SetContactEnabled { contact, enabled } => {
                let mut body = serde_json::to_value(contact).unwrap_or_else(|_| json!({}));
                body["enabled"] = json!(enabled);
                Request::new(ep::UPDATE_CONTACT).arg("id", contact.id).body(body)
            }
            UserAction::EnableSleep { minutes } => {
                if *minutes == 0 {
                    return Err(ValidationError::OutOfRange {
                        field: "sleep duration",
                        min: 1.0,
                        max: f64::from(u32::MAX),
                    });
                }
                Request::new(ep::SLEEP_ENABLE).body(json!({ "duration_minutes": minutes }))
            }
            UserAction::DisableSleep => Request::new(ep::SLEEP_DISABLE),
            UserAction::StartBackup => Request::new(ep::BACKUP_START),
            UserAction::Reboot => Request::new(ep::REBOOT),
            UserAction::Shutdown => Request::new(ep::SHUTDOWN),
            UserAction::StartPortal => Request::new(ep::START_PORTAL),
            UserAction::SetMaxContextFacts(n) => Request::new(ep::SET_MAX_CONTEXT_FACTS)
                .body(json!({ "max_context_facts": in_range("max context facts", *n, 1, 100)? })),
            UserAction::SetMemorySettings(draft) => {
                let mut body = serde_json::Map::new();
                if let Some(v) = draft.embedding_search_limit {
                    body.insert("embedding_search_limit".into(), json!(v));
                }
                if let Some(v) = draft.memory_limit {
                    body.insert("memory_limit".into(), json!(v));
                }
                if let Some(v) = draft.memory_threshold {
                    body.insert(
                        "memory_threshold".into(),
                        json!(in_range("memory threshold", v, 0.0, 1.0)?),
                    );
                }
                if body.is_empty() {
                    return Err(ValidationError::NothingToChange);
                }
                Request::new(ep::SET_MEMORY_SETTINGS).body(Value::Object(body))
            }
        })
    }

    /// Business verdict for this action's reply.  Feeding only counts when
    /// the device says it ate.
    fn outcome(&self, body: &Value) -> Outcome {
        if let UserAction::Feed(_) = self {
            let reply: FeedReply = serde_json::from_value(body.clone()).unwrap_or_default();
            if reply.status != "fed" {
                return Outcome::Failure {
                    message: failure_message(body),
                };
            }
        }
        action_outcome(body)
    }

    fn success_message(&self, body: &Value, envelope: Option<String>) -> String {
        match self {
            UserAction::Feed(food) => {
                let reply: FeedReply = serde_json::from_value(body.clone()).unwrap_or_default();
                match reply.new_level {
                    Some(level) => format!("Fed {}! Hunger: {}/10", food.as_str(), fmt_level(level)),
                    None => format!("Fed {}!", food.as_str()),
                }
            }
            UserAction::SwitchUser(username) => {
                let reply: SwitchUserReply = serde_json::from_value(body.clone()).unwrap_or_default();
                format!("Switched to {}", reply.display_name.as_deref().unwrap_or(username))
            }
            UserAction::AskAi(_) => {
                let reply: AskAiReply = serde_json::from_value(body.clone()).unwrap_or_default();
                reply.response.unwrap_or_else(|| "No answer".to_string())
            }
            UserAction::EnableSleep { minutes } => format!("Sleeping for {} min", minutes),
            UserAction::DisableSleep => "Awake".to_string(),
            _ => envelope.unwrap_or_else(|| "Done".to_string()),
        }
    }
}

/// Judge a finished call.  Pure; the caller applies the consequences.
pub fn settle(action: &UserAction, result: Result<Value, GatewayError>) -> Settlement {
    let body = match result {
        Ok(body) => body,
        Err(e) => {
            return Settlement::Failed {
                message: e.to_string(),
            }
        }
    };
    match action.outcome(&body) {
        Outcome::Success { message } => {
            let reply = match action {
                UserAction::AskAi(_) => serde_json::from_value::<AskAiReply>(body.clone())
                    .ok()
                    .and_then(|r| r.response),
                _ => None,
            };
            Settlement::Success {
                message: action.success_message(&body, message),
                refresh: action.refresh_targets(),
                reply,
            }
        }
        Outcome::Failure { message } => Settlement::Rejected { message },
    }
}

/// Validate, call once, and settle.
pub async fn execute(gateway: &Gateway, action: &UserAction) -> Settlement {
    let request = match action.prepare() {
        Ok(r) => r,
        Err(e) => return Settlement::Invalid(e),
    };
    info!("action {} -> {}", action.control(), request.endpoint);
    let result = gateway
        .call(&request.endpoint, &request.args, request.payload.as_ref())
        .await;
    let settlement = settle(action, result);
    if !settlement.is_success() {
        warn!("action {} failed: {}", action.control(), settlement.message());
    }
    settlement
}
