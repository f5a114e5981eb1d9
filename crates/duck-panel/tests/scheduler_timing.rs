//! Poll cadence under a paused clock: independent timers, one in-flight
//! invocation per task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::{self, Instant};

use duck_panel::scheduler::{PollScheduler, PollTask};

type Ticks = Arc<Mutex<Vec<(&'static str, u64)>>>;

fn recording_task(
    name: &'static str,
    period: Duration,
    start: Instant,
    ticks: Ticks,
    hang_at_ms: Option<u64>,
) -> PollTask {
    PollTask::new(period, move || {
        let ticks = ticks.clone();
        async move {
            let at = start.elapsed().as_millis() as u64;
            ticks.lock().unwrap().push((name, at));
            if hang_at_ms == Some(at) {
                std::future::pending::<()>().await;
            }
        }
        .boxed()
    })
}

fn ticks_of(ticks: &Ticks, name: &str) -> Vec<u64> {
    ticks
        .lock()
        .unwrap()
        .iter()
        .filter(|(n, _)| *n == name)
        .map(|(_, at)| *at)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn tasks_tick_on_their_own_cadence() {
    let start = Instant::now();
    let ticks: Ticks = Arc::default();
    let mut scheduler = PollScheduler::new();
    scheduler.register(
        "a",
        recording_task("a", Duration::from_secs(5), start, ticks.clone(), None),
    );
    scheduler.register(
        "b",
        recording_task("b", Duration::from_secs(10), start, ticks.clone(), None),
    );

    time::sleep(Duration::from_millis(20_500)).await;
    assert_eq!(ticks_of(&ticks, "a"), vec![0, 5_000, 10_000, 15_000, 20_000]);
    assert_eq!(ticks_of(&ticks, "b"), vec![0, 10_000, 20_000]);
}

#[tokio::test(start_paused = true)]
async fn hung_call_only_holds_back_its_own_task() {
    let start = Instant::now();
    let ticks: Ticks = Arc::default();
    let mut scheduler = PollScheduler::new();
    scheduler.register(
        "a",
        recording_task("a", Duration::from_secs(5), start, ticks.clone(), Some(5_000)),
    );
    scheduler.register(
        "b",
        recording_task("b", Duration::from_secs(10), start, ticks.clone(), None),
    );

    time::sleep(Duration::from_millis(20_500)).await;
    // a's 5000 call never returns, so its later ticks are skipped.
    assert_eq!(ticks_of(&ticks, "a"), vec![0, 5_000]);
    assert_eq!(ticks_of(&ticks, "b"), vec![0, 10_000, 20_000]);

    scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn stopped_task_lets_in_flight_call_finish() {
    let start = Instant::now();
    let finished = Arc::new(Mutex::new(Vec::new()));
    let done = finished.clone();
    let mut scheduler = PollScheduler::new();
    scheduler.register(
        "slow",
        PollTask::new(Duration::from_secs(1), move || {
            let done = done.clone();
            async move {
                time::sleep(Duration::from_millis(3_000)).await;
                done.lock().unwrap().push(start.elapsed().as_millis() as u64);
            }
            .boxed()
        }),
    );
    time::sleep(Duration::from_millis(10)).await;
    assert!(scheduler.stop(&"slow"));

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*finished.lock().unwrap(), vec![3_000]);
}
