//! Device wire types.
//!
//! The device is loose about its JSON: numbers arrive as ints or floats,
//! optional keys are simply missing, and read endpoints often attach an
//! `error` next to fallback values.  Every struct here is `#[serde(default)]`
//! so a missing key never fails a whole feed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Collection items ──────────────────────────────────────────────────────────

/// A learned profile fact.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fact {
    pub key: String,
    pub value: String,
    pub topic: String,
    pub confidence: f64,
    #[serde(deserialize_with = "count")]
    pub frequency: u64,
    pub source: Option<String>,
    pub last_updated: Option<String>,
}

/// An episodic memory.  `score` is only present on search results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Memory {
    pub id: i64,
    pub text: String,
    pub topic: String,
    #[serde(deserialize_with = "count")]
    pub frequency: u64,
    pub confidence: Option<f64>,
    pub score: Option<f64>,
    pub first_seen: Option<String>,
    pub last_accessed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub relation: String,
    pub priority: i64,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsMessage {
    /// `inbound` or `outbound`.
    pub direction: String,
    /// `duck` for messages the device wrote itself.
    pub message_type: Option<String>,
    pub contact_name: String,
    pub phone_number: Option<String>,
    pub message: String,
    pub timestamp: Option<String>,
}

impl SmsMessage {
    pub fn is_inbound(&self) -> bool {
        self.direction == "inbound"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub relation: String,
    #[serde(deserialize_with = "count")]
    pub total_messages: u64,
    pub last_active: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Song {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Already formatted by the device, e.g. `"72%"`.
    pub signal: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicStat {
    pub topic: String,
    #[serde(deserialize_with = "count")]
    pub mention_count: u64,
    pub last_mentioned: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentUpdate {
    pub text: String,
    pub topic: String,
    pub confidence: f64,
    pub source: Option<String>,
    pub first_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickFact {
    pub key: String,
    pub value: String,
    pub confidence: f64,
    #[serde(deserialize_with = "count")]
    pub frequency: u64,
}

// ── Status records ────────────────────────────────────────────────────────────

/// `/status`: the current value of every simple setting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub personality: String,
    pub voice: String,
    pub volume: i64,
    pub beak: String,
    pub speed: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentModel {
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckStatus {
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentUser {
    pub username: String,
    pub display_name: String,
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Boredom {
    pub level: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hunger {
    pub level: f64,
    pub status: String,
    pub max: Option<f64>,
    pub meals_today: Option<u32>,
    pub next_meal_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vision {
    pub connected: bool,
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepStatus {
    pub is_sleeping: bool,
    pub end_time_formatted: Option<String>,
    pub remaining_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterStatus {
    /// `success`, `not_configured` or `error`.
    pub status: String,
    pub printer: Option<PrinterJob>,
    pub human_readable: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterJob {
    /// `IDLE`, `PRINTING`, `PAUSED`, `FINISHED`, `STOPPED` or `ERROR`.
    pub state: String,
    pub progress: f64,
    /// Seconds.
    pub time_remaining: Option<u64>,
    pub job_name: Option<String>,
    pub temp_nozzle: Option<f64>,
    pub temp_bed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStats {
    pub cpu_temp: Option<f64>,
    pub memory: Option<MemoryUsage>,
}

/// Sizes in MiB.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryUsage {
    pub total: f64,
    pub used: f64,
    pub available: f64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    #[serde(deserialize_with = "count")]
    pub total_facts: u64,
    #[serde(deserialize_with = "count")]
    pub total_memories: u64,
    #[serde(deserialize_with = "count")]
    pub total_messages: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingStatus {
    #[serde(deserialize_with = "count")]
    pub total_memories: u64,
    #[serde(deserialize_with = "count")]
    pub with_embeddings: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerStatus {
    pub running: bool,
    #[serde(deserialize_with = "count")]
    pub unprocessed: u64,
    pub last_processed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FanStatus {
    /// `auto`, `on` or `off`.
    pub mode: String,
    pub running: bool,
    pub temp: f64,
}

/// Memory tuning knobs, merged from two getters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub max_context_facts: Option<u32>,
    pub embedding_search_limit: Option<u32>,
    pub memory_limit: Option<u32>,
    pub memory_threshold: Option<f64>,
}

// ── Action replies ────────────────────────────────────────────────────────────

/// `/api/hunger/feed` reply: `{status: "fed", food, new_level}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedReply {
    pub status: String,
    pub food: Option<String>,
    pub new_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchUserReply {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AskAiReply {
    pub response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsReply {
    pub logs: String,
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Business verdict carried inside a transport-successful reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { message: Option<String> },
    Failure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

const FAILURE_STATUSES: &[&str] = &["error", "failed", "failure"];

/// Interpret a mutating endpoint's reply.
///
/// A boolean `success` wins.  Otherwise a `status` of `error`/`failed` is a
/// failure and any other status is a success.  With neither key, a non-empty
/// `error` string is a failure.  Anything else is success.
pub fn action_outcome(body: &Value) -> Outcome {
    if let Some(ok) = body.get("success").and_then(Value::as_bool) {
        return verdict(ok, body);
    }
    if let Some(status) = body.get("status").and_then(Value::as_str) {
        let failed = FAILURE_STATUSES.contains(&status.to_ascii_lowercase().as_str());
        return verdict(!failed, body);
    }
    if text_field(body, "error").is_some() {
        return verdict(false, body);
    }
    verdict(true, body)
}

/// Interpret a read endpoint's reply.  Returns the failure message when the
/// envelope says `status: "error"` or `success: false`; read replies that
/// merely carry an `error` next to fallback values still count as data.
pub fn read_failure(body: &Value) -> Option<String> {
    let failed = body.get("success").and_then(Value::as_bool) == Some(false)
        || body
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case("error"));
    failed.then(|| failure_message(body))
}

/// `error`, else `message`, else a generic text.
pub fn failure_message(body: &Value) -> String {
    text_field(body, "error")
        .or_else(|| text_field(body, "message"))
        .unwrap_or_else(|| "unknown error".to_string())
}

fn verdict(ok: bool, body: &Value) -> Outcome {
    if ok {
        Outcome::Success {
            message: text_field(body, "message"),
        }
    } else {
        Outcome::Failure {
            message: failure_message(body),
        }
    }
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Counts arrive as ints, floats, null or occasionally negative; all land
/// as a non-negative integer.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 }))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fact_tolerates_missing_and_odd_fields() {
        let fact: Fact = serde_json::from_value(json!({
            "key": "user_name",
            "value": "Osmund",
            "confidence": 1.4,
            "frequency": -3,
        }))
        .unwrap();
        assert_eq!(fact.topic, "");
        assert_eq!(fact.frequency, 0);
        assert_eq!(fact.confidence, 1.4);

        let fact: Fact = serde_json::from_value(json!({"key": "k", "frequency": 2.0})).unwrap();
        assert_eq!(fact.frequency, 2);
    }

    #[test]
    fn test_action_outcome_success_flag() {
        assert!(action_outcome(&json!({"success": true})).is_success());
        assert_eq!(
            action_outcome(&json!({"success": false, "error": "Ingen tekst"})),
            Outcome::Failure {
                message: "Ingen tekst".into()
            }
        );
    }

    #[test]
    fn test_action_outcome_status_field() {
        assert_eq!(
            action_outcome(&json!({"status": "fed", "new_level": 6})),
            Outcome::Success { message: None }
        );
        assert_eq!(
            action_outcome(&json!({"status": "error", "message": "not found"})),
            Outcome::Failure {
                message: "not found".into()
            }
        );
        assert_eq!(
            action_outcome(&json!({"status": "error"})),
            Outcome::Failure {
                message: "unknown error".into()
            }
        );
    }

    #[test]
    fn test_action_outcome_bare_replies() {
        assert!(!action_outcome(&json!({"error": "boom"})).is_success());
        assert_eq!(
            action_outcome(&json!({"message": "Backup ok"})),
            Outcome::Success {
                message: Some("Backup ok".into())
            }
        );
    }

    #[test]
    fn test_read_failure_ignores_fallback_error() {
        assert_eq!(read_failure(&json!({"volume": 50, "error": "tmp missing"})), None);
        assert_eq!(
            read_failure(&json!({"status": "error", "error": "db locked", "facts": []})),
            Some("db locked".into())
        );
        assert_eq!(read_failure(&json!({"success": false})), Some("unknown error".into()));
        assert_eq!(read_failure(&json!([1, 2])), None);
    }
}
