//! PanelCore — single owner of every piece of mutable panel state.
//!
//! Poll tasks, action calls and log fetches run as spawned futures and report
//! back through one `PanelMessage` channel.  Only `handle` writes the caches,
//! so out-of-order completions for different feeds never touch each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use duck_proto::Config;

use crate::actions::{self, Settlement, UserAction};
use crate::cache::{CollectionCache, FetchStatus, StatusCache};
use crate::feeds::{self, Collection, Feed, FeedData, FetchError, Item, Status, StatusKind};
use crate::gateway::Gateway;
use crate::log_tail::LogTail;
use crate::notices::Notices;
use crate::scheduler::{PollScheduler, PollTask};
use crate::view::{
    filter_items, group_items, render_list, render_status, ListView, StatusLine, ViewMode, ViewState,
};

// ── Messages ──────────────────────────────────────────────────────────────────

/// Everything that flows back into the core from spawned work.
#[derive(Debug)]
pub enum PanelMessage {
    Fetched {
        feed: Feed,
        result: Result<FeedData, FetchError>,
    },
    ActionSettled {
        action: UserAction,
        settlement: Settlement,
    },
    LogFetched {
        generation: u64,
        result: Result<String, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Feed(Feed),
    LogTail,
}

/// Timestamps for cache writes follow the tokio clock so paused-clock tests
/// see consistent ages.
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

// ── PanelCore ─────────────────────────────────────────────────────────────────

pub struct PanelCore {
    config: Config,
    gateway: Gateway,
    tx: mpsc::Sender<PanelMessage>,
    scheduler: PollScheduler<TaskKey>,
    collections: CollectionCache,
    statuses: StatusCache,
    views: HashMap<Collection, ViewState>,
    notices: Notices,
    log_tail: LogTail,
    log_open: Arc<AtomicBool>,
    last_answer: Option<String>,
}

impl PanelCore {
    pub fn new(config: Config, gateway: Gateway) -> (Self, mpsc::Receiver<PanelMessage>) {
        let (tx, rx) = mpsc::channel(256);
        let notices = Notices::new(
            Duration::from_millis(config.ui.success_indicator_ms),
            Duration::from_millis(config.ui.error_indicator_ms),
        );
        let log_tail = LogTail::new(config.log_tail.bottom_threshold);
        let core = Self {
            config,
            gateway,
            tx,
            scheduler: PollScheduler::new(),
            collections: CollectionCache::new(),
            statuses: StatusCache::new(),
            views: HashMap::new(),
            notices,
            log_tail,
            log_open: Arc::new(AtomicBool::new(false)),
            last_answer: None,
        };
        (core, rx)
    }

    /// Register a poll task for every feed.
    pub fn start(&mut self) {
        let all: Vec<Feed> = Feed::all().collect();
        self.start_feeds(&all);
        info!(
            "polling {} feeds against {}",
            all.len(),
            self.gateway.base_url()
        );
    }

    pub fn start_feeds(&mut self, feeds: &[Feed]) {
        for &feed in feeds {
            let task = self.feed_task(feed);
            self.scheduler.register(TaskKey::Feed(feed), task);
        }
    }

    fn feed_task(&self, feed: Feed) -> PollTask {
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        PollTask::new(feed.period(&self.config.polling), move || {
            let gateway = gateway.clone();
            let tx = tx.clone();
            async move {
                let result = feeds::fetch(&gateway, feed).await;
                let _ = tx.send(PanelMessage::Fetched { feed, result }).await;
            }
            .boxed()
        })
    }

    fn log_task(&self, generation: u64) -> PollTask {
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        let lines = self.config.log_tail.lines;
        let period = Duration::from_millis(self.config.log_tail.period_ms);
        PollTask::new(period, move || {
            let gateway = gateway.clone();
            let tx = tx.clone();
            async move {
                let result = feeds::fetch_logs(&gateway, lines)
                    .await
                    .map_err(|e| e.to_string());
                let _ = tx.send(PanelMessage::LogFetched { generation, result }).await;
            }
            .boxed()
        })
        .enabled_while(self.log_open.clone())
    }

    /// Apply one message.  Returns `true` when the display model changed.
    pub fn handle(&mut self, msg: PanelMessage) -> bool {
        match msg {
            PanelMessage::Fetched { feed, result } => self.on_fetched(feed, result),
            PanelMessage::ActionSettled { action, settlement } => {
                self.on_settled(&action, settlement);
                true
            }
            PanelMessage::LogFetched { generation, result } => {
                self.log_tail.apply(generation, result)
            }
        }
    }

    fn on_fetched(&mut self, feed: Feed, result: Result<FeedData, FetchError>) -> bool {
        let now = now();
        match (feed, result) {
            (Feed::Collection(c), Ok(FeedData::Items(items))) => {
                debug!("{}: {} items", feed, items.len());
                self.collections.set(c, items, now);
            }
            (Feed::Status(k), Ok(FeedData::Status(status))) => {
                self.statuses.set(k, status, now);
            }
            (_, Ok(_)) => {
                warn!("{}: reply decoded to the wrong shape, dropped", feed);
                return false;
            }
            (Feed::Collection(c), Err(e)) => {
                warn!("poll {} failed: {}", feed, e);
                self.collections.mark_failed(c, e.to_string());
            }
            (Feed::Status(k), Err(e)) => {
                warn!("poll {} failed: {}", feed, e);
                self.statuses.mark_failed(k, e.to_string());
            }
        }
        true
    }

    fn on_settled(&mut self, action: &UserAction, settlement: Settlement) {
        let control = action.control();
        let now = now();
        match settlement {
            Settlement::Success {
                message,
                refresh,
                reply,
            } => {
                info!("action {} ok: {}", control, message);
                self.notices.success(control, message, now);
                if reply.is_some() {
                    self.last_answer = reply;
                }
                let delay = self.config.polling.confirm_delay();
                for feed in refresh {
                    if !self.scheduler.refresh_soon(&TaskKey::Feed(feed), delay) {
                        debug!("no poll task for {}, skipping early refresh", feed);
                    }
                }
            }
            other => self.notices.error(control, other.message(), now),
        }
    }

    /// Run a user action.  Invalid input is reported at once with no call
    /// made; otherwise the call is spawned and settles through `handle`.
    pub fn trigger(&mut self, action: UserAction) {
        if let Err(e) = action.prepare() {
            self.notices.error(action.control(), e.to_string(), now());
            return;
        }
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let settlement = actions::execute(&gateway, &action).await;
            let _ = tx
                .send(PanelMessage::ActionSettled { action, settlement })
                .await;
        });
    }

    /// Surface a local error (e.g. an unparseable command) at `control`.
    pub fn report(&mut self, control: &'static str, message: impl Into<String>) {
        self.notices.error(control, message, now());
    }

    /// Speak the last answer from ask AI.
    pub fn speak_last_answer(&mut self) {
        match self.last_answer.clone() {
            Some(answer) => self.trigger(UserAction::Speak(answer)),
            None => self.notices.info("speak", "No answer to speak yet", now()),
        }
    }

    // ── Log tail ──────────────────────────────────────────────────────────────

    pub fn toggle_log_tail(&mut self) {
        if self.log_tail.is_open() {
            self.log_tail.close();
            self.log_open.store(false, Ordering::Relaxed);
            self.scheduler.stop(&TaskKey::LogTail);
        } else {
            let generation = self.log_tail.open();
            self.log_open.store(true, Ordering::Relaxed);
            let task = self.log_task(generation);
            self.scheduler.register(TaskKey::LogTail, task);
        }
    }

    pub fn log_tail(&self) -> &LogTail {
        &self.log_tail
    }

    pub fn log_tail_mut(&mut self) -> &mut LogTail {
        &mut self.log_tail
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    pub fn view(&self, collection: Collection) -> ViewState {
        self.views.get(&collection).cloned().unwrap_or_default()
    }

    pub fn set_filter(&mut self, collection: Collection, filter: impl Into<String>) {
        self.views.entry(collection).or_default().filter = filter.into();
    }

    pub fn toggle_group(&mut self, collection: Collection) {
        self.views.entry(collection).or_default().toggle_mode();
    }

    pub fn render_collection(&self, collection: Collection, now: DateTime<Local>) -> ListView {
        let state = self.views.get(&collection).cloned().unwrap_or_default();
        render_list(
            self.collections.get(collection).map(Vec::as_slice),
            self.collections.last_error(collection),
            &state,
            now,
        )
    }

    /// Items the current filter leaves visible, in display order.
    pub fn visible_items(&self, collection: Collection) -> Vec<&Item> {
        let Some(items) = self.collections.get(collection) else {
            return Vec::new();
        };
        let state = self.views.get(&collection);
        let visible = filter_items(items, state.map(|v| v.filter.as_str()).unwrap_or(""));
        match state.map(|v| v.mode).unwrap_or_default() {
            ViewMode::Flat => visible,
            ViewMode::Grouped => group_items(&visible)
                .into_iter()
                .flat_map(|(_, group)| group)
                .collect(),
        }
    }

    pub fn status_line(&self, kind: StatusKind) -> StatusLine {
        render_status(
            kind.label(),
            self.statuses.get(kind),
            self.fetch_status(Feed::Status(kind)),
        )
    }

    pub fn status_lines(&self, kinds: &[StatusKind]) -> Vec<StatusLine> {
        kinds.iter().map(|&k| self.status_line(k)).collect()
    }

    pub fn fetch_status(&self, feed: Feed) -> Option<FetchStatus> {
        let stale_after = self.config.polling.stale_after();
        match feed {
            Feed::Collection(c) => self.collections.status(c, now(), stale_after),
            Feed::Status(k) => self.statuses.status(k, now(), stale_after),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn collections(&self) -> &CollectionCache {
        &self.collections
    }

    pub fn status(&self, kind: StatusKind) -> Option<&Status> {
        self.statuses.get(kind)
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Expire old notices.  Returns `true` if any went away.
    pub fn tick(&mut self) -> bool {
        self.notices.tick(now())
    }

    pub fn last_answer(&self) -> Option<&str> {
        self.last_answer.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_polling(&self, feed: Feed) -> bool {
        self.scheduler.is_registered(&TaskKey::Feed(feed))
    }

    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
        self.log_open.store(false, Ordering::Relaxed);
    }
}
