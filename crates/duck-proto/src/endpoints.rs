//! Endpoints — the fixed catalog of device routes.
//!
//! Every remote operation is one immutable [`Endpoint`].  Paths may contain
//! `{param}` segments that the gateway fills from call-site arguments.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Anything other than GET changes device state.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: Method,
    /// Path template, e.g. `/sms_contacts/{id}`.
    pub path: &'static str,
}

impl Endpoint {
    pub const fn get(name: &'static str, path: &'static str) -> Self {
        Self { name, method: Method::Get, path }
    }

    pub const fn post(name: &'static str, path: &'static str) -> Self {
        Self { name, method: Method::Post, path }
    }

    pub const fn put(name: &'static str, path: &'static str) -> Self {
        Self { name, method: Method::Put, path }
    }

    pub const fn delete(name: &'static str, path: &'static str) -> Self {
        Self { name, method: Method::Delete, path }
    }

    /// Names of the `{param}` placeholders, in path order.
    pub fn params(&self) -> impl Iterator<Item = &'static str> {
        self.path
            .split('/')
            .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.method, self.path, self.name)
    }
}

// ── Settings getters ──────────────────────────────────────────────────────────

pub const STATUS: Endpoint = Endpoint::get("status", "/status");
pub const CURRENT_MODEL: Endpoint = Endpoint::get("current_model", "/current-model");
pub const MAX_CONTEXT_FACTS: Endpoint =
    Endpoint::get("max_context_facts", "/api/settings/max-context-facts");
pub const MEMORY_SETTINGS: Endpoint = Endpoint::get("memory_settings", "/api/settings/memory");

// ── List getters ──────────────────────────────────────────────────────────────

pub const WAKE_WORDS: Endpoint = Endpoint::get("wake_words", "/wake-words");
pub const AVAILABLE_MODELS: Endpoint = Endpoint::get("available_models", "/available-models");
pub const SONGS: Endpoint = Endpoint::get("songs", "/songs");
pub const WIFI_NETWORKS: Endpoint = Endpoint::get("wifi_networks", "/wifi-networks");
pub const USERS: Endpoint = Endpoint::get("users", "/api/users/list");
pub const CONTACTS: Endpoint = Endpoint::get("contacts", "/sms_contacts");
pub const SMS_HISTORY: Endpoint = Endpoint::get("sms_history", "/sms_history");
pub const BACKUPS: Endpoint = Endpoint::get("backups", "/api/backup");

// ── Memory getters ────────────────────────────────────────────────────────────

pub const FACTS: Endpoint = Endpoint::get("facts", "/api/memory/profile");
pub const MEMORIES: Endpoint = Endpoint::get("memories", "/api/memory/memories");
pub const TOPICS: Endpoint = Endpoint::get("topics", "/api/memory/topics");
pub const RECENT_UPDATES: Endpoint = Endpoint::get("recent_updates", "/api/memory/recent-updates");
pub const QUICK_FACTS: Endpoint = Endpoint::get("quick_facts", "/api/memory/quick-facts");
pub const MEMORY_STATS: Endpoint = Endpoint::get("memory_stats", "/api/memory/stats");
pub const EMBEDDING_STATUS: Endpoint =
    Endpoint::get("embedding_status", "/api/memory/embedding-status");
pub const WORKER_STATUS: Endpoint = Endpoint::get("worker_status", "/api/memory/worker-status");

// ── Status getters ────────────────────────────────────────────────────────────

pub const DUCK_STATUS: Endpoint = Endpoint::get("duck_status", "/duck-status");
pub const CURRENT_USER: Endpoint = Endpoint::get("current_user", "/api/users/current");
pub const BOREDOM: Endpoint = Endpoint::get("boredom", "/boredom-status");
pub const HUNGER: Endpoint = Endpoint::get("hunger", "/hunger-status");
pub const VISION: Endpoint = Endpoint::get("vision", "/vision-status");
pub const SLEEP_STATUS: Endpoint = Endpoint::get("sleep_status", "/sleep_status");
pub const PRINTER: Endpoint = Endpoint::get("printer", "/api/printer/status");
pub const SYSTEM_STATS: Endpoint = Endpoint::get("system_stats", "/api/system/stats");
pub const LOCATION: Endpoint = Endpoint::get("location", "/duck_location");
pub const FAN_STATUS: Endpoint = Endpoint::get("fan_status", "/fan-status");
pub const LOGS: Endpoint = Endpoint::get("logs", "/logs");

// ── Setting changers ──────────────────────────────────────────────────────────

pub const CHANGE_BEAK: Endpoint = Endpoint::post("change_beak", "/change-beak");
pub const CHANGE_PERSONALITY: Endpoint = Endpoint::post("change_personality", "/change-personality");
pub const CHANGE_VOICE: Endpoint = Endpoint::post("change_voice", "/change-voice");
pub const CHANGE_MODEL: Endpoint = Endpoint::post("change_model", "/change-model");
pub const CHANGE_VOLUME: Endpoint = Endpoint::post("change_volume", "/change-volume");
pub const CHANGE_SPEED: Endpoint = Endpoint::post("change_speed", "/change-speed");
pub const SET_FAN_MODE: Endpoint = Endpoint::post("set_fan_mode", "/set-fan-mode");
pub const SET_MAX_CONTEXT_FACTS: Endpoint =
    Endpoint::post("set_max_context_facts", "/api/settings/max-context-facts");
pub const SET_MEMORY_SETTINGS: Endpoint =
    Endpoint::post("set_memory_settings", "/api/settings/memory");

// ── Actions ───────────────────────────────────────────────────────────────────

pub const CONTROL: Endpoint = Endpoint::post("control", "/control");
pub const SPEAK: Endpoint = Endpoint::post("speak", "/speak");
pub const ASK_AI: Endpoint = Endpoint::post("ask_ai", "/ask-ai");
pub const START_CONVERSATION: Endpoint = Endpoint::post("start_conversation", "/start-conversation");
pub const TEST_BEAK: Endpoint = Endpoint::post("test_beak", "/test-beak");
pub const PLAY_SONG: Endpoint = Endpoint::post("play_song", "/play-song");
pub const STOP_SONG: Endpoint = Endpoint::post("stop_song", "/stop-song");
pub const FEED: Endpoint = Endpoint::post("feed", "/api/hunger/feed");
pub const SWITCH_USER: Endpoint = Endpoint::post("switch_user", "/api/users/switch");
pub const SLEEP_ENABLE: Endpoint = Endpoint::post("sleep_enable", "/sleep/enable");
pub const SLEEP_DISABLE: Endpoint = Endpoint::post("sleep_disable", "/sleep/disable");
pub const BACKUP_START: Endpoint = Endpoint::post("backup_start", "/api/backup/start");
pub const REBOOT: Endpoint = Endpoint::post("reboot", "/reboot");
pub const SHUTDOWN: Endpoint = Endpoint::post("shutdown", "/shutdown");
pub const START_PORTAL: Endpoint = Endpoint::post("start_portal", "/start-portal");

// ── Item mutations ────────────────────────────────────────────────────────────

pub const CREATE_CONTACT: Endpoint = Endpoint::post("create_contact", "/sms_contacts");
pub const UPDATE_CONTACT: Endpoint = Endpoint::put("update_contact", "/sms_contacts/{id}");
pub const DELETE_CONTACT: Endpoint = Endpoint::delete("delete_contact", "/sms_contacts/{id}");
pub const DELETE_FACT: Endpoint = Endpoint::delete("delete_fact", "/api/memory/profile/{key}");
pub const DELETE_MEMORY: Endpoint = Endpoint::delete("delete_memory", "/api/memory/memories/{id}");
