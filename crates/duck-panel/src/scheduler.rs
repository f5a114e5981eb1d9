//! PollScheduler — a registry of independently timed poll tasks.
//!
//! Each task gets its own timer loop.  Every invocation runs as a separate
//! spawned future, so a hung call only holds back its own task: the loop
//! keeps ticking and skips ticks while the previous invocation is in flight.
//! A `refresh_soon` nudge that lands on a busy task is held and fires once
//! the invocation finishes.
//!
//! Tick times come from `tokio::time`, so tests drive the whole registry with
//! a paused clock.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

pub type TaskAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
pub type EnabledFn = Arc<dyn Fn() -> bool + Send + Sync>;

pub struct PollTask {
    pub period: Duration,
    /// Checked on every tick; a `false` skips that tick only.
    pub enabled: Option<EnabledFn>,
    pub action: TaskAction,
}

impl PollTask {
    pub fn new<F>(period: Duration, action: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self {
            period,
            enabled: None,
            action: Arc::new(action),
        }
    }

    pub fn enabled_while(mut self, flag: Arc<AtomicBool>) -> Self {
        self.enabled = Some(Arc::new(move || flag.load(Ordering::Relaxed)));
        self
    }
}

struct Registered {
    handle: JoinHandle<()>,
    nudge: Arc<Notify>,
}

pub struct PollScheduler<K> {
    tasks: HashMap<K, Registered>,
}

impl<K> PollScheduler<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    /// Start `task` under `id`.  The first tick fires immediately.
    /// Re-registering an id replaces the previous task.
    pub fn register(&mut self, id: K, task: PollTask) {
        self.stop(&id);
        let nudge = Arc::new(Notify::new());
        let handle = tokio::spawn(run_task(format!("{:?}", id), task, nudge.clone()));
        debug!("poll task {:?} registered", id);
        self.tasks.insert(id, Registered { handle, nudge });
    }

    /// Cancel the timer loop for `id`.  An invocation already in flight is
    /// left to finish.
    pub fn stop(&mut self, id: &K) -> bool {
        match self.tasks.remove(id) {
            Some(task) => {
                task.handle.abort();
                debug!("poll task {:?} stopped", id);
                true
            }
            None => false,
        }
    }

    /// Run `id` one extra time after `delay`, outside its regular cadence.
    /// Subject to the same enabled check as a normal tick; if an invocation
    /// is in flight the extra run starts right after it.
    pub fn refresh_soon(&self, id: &K, delay: Duration) -> bool {
        let Some(task) = self.tasks.get(id) else {
            return false;
        };
        let nudge = task.nudge.clone();
        if delay.is_zero() {
            nudge.notify_one();
        } else {
            tokio::spawn(async move {
                time::sleep(delay).await;
                nudge.notify_one();
            });
        }
        true
    }

    pub fn is_registered(&self, id: &K) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tear every task down together.
    pub fn shutdown(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.handle.abort();
        }
    }
}

impl<K> Default for PollScheduler<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for PollScheduler<K> {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.handle.abort();
        }
    }
}

async fn run_task(label: String, task: PollTask, nudge: Arc<Notify>) {
    let mut ticker = time::interval(task.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let in_flight = Arc::new(AtomicBool::new(false));
    let rearm = Arc::new(AtomicBool::new(false));

    loop {
        let nudged = tokio::select! {
            _ = ticker.tick() => false,
            _ = nudge.notified() => {
                trace!("poll task {} nudged", label);
                true
            }
        };

        if let Some(enabled) = &task.enabled {
            if !enabled() {
                trace!("poll task {} disabled, skipping tick", label);
                continue;
            }
        }

        if in_flight.swap(true, Ordering::AcqRel) {
            if nudged {
                debug!("poll task {} in flight, refresh held until it finishes", label);
                rearm.store(true, Ordering::Release);
            } else {
                debug!("poll task {} still in flight, skipping tick", label);
            }
            continue;
        }

        let invocation = (task.action)();
        let done = in_flight.clone();
        let rearm = rearm.clone();
        let nudge = nudge.clone();
        tokio::spawn(async move {
            invocation.await;
            done.store(false, Ordering::Release);
            if rearm.swap(false, Ordering::AcqRel) {
                nudge.notify_one();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    fn counting_task(period: Duration, counter: Arc<AtomicUsize>) -> PollTask {
        PollTask::new(period, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new();
        scheduler.register("a", counting_task(Duration::from_secs(5), counter.clone()));
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_ticks_are_skipped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let open = Arc::new(AtomicBool::new(false));
        let mut scheduler = PollScheduler::new();
        scheduler.register(
            "logs",
            counting_task(Duration::from_secs(2), counter.clone()).enabled_while(open.clone()),
        );
        time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        open.store(true, Ordering::SeqCst);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_soon_runs_early() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new();
        scheduler.register("hunger", counting_task(Duration::from_secs(60), counter.clone()));
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let start = Instant::now();
        assert!(scheduler.refresh_soon(&"hunger", Duration::from_secs(1)));
        time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() < Duration::from_secs(60));
        assert!(!scheduler.refresh_soon(&"nope", Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_call_runs_after_it() {
        let starts = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new();
        let counter = starts.clone();
        scheduler.register(
            "settings",
            PollTask::new(Duration::from_secs(60), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_secs(3)).await;
                }
                .boxed()
            }),
        );
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        // Lands while the first call is still running.
        assert!(scheduler.refresh_soon(&"settings", Duration::ZERO));
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);

        // Only one extra run, then back to the 60 s cadence.
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_shutdown() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new();
        scheduler.register("a", counting_task(Duration::from_secs(1), counter.clone()));
        scheduler.register("b", counting_task(Duration::from_secs(1), counter.clone()));
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        assert!(scheduler.stop(&"a"));
        assert!(!scheduler.is_registered(&"a"));
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        scheduler.shutdown();
        assert!(scheduler.is_empty());
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
