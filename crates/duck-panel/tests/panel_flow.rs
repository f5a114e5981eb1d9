//! End-to-end flows against an in-process mock device.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use duck_panel::actions::{self, FoodType};
use duck_panel::gateway::PathArgs;
use duck_panel::feeds::{Collection, Feed, Item, Status, StatusKind};
use duck_panel::view::ListView;
use duck_panel::{Gateway, GatewayError, PanelCore, PanelMessage, Settlement, UserAction};
use duck_proto::{endpoints, Config};

#[derive(Default)]
struct Device {
    hunger: AtomicU64,
    hunger_reads: AtomicUsize,
    feeds: AtomicUsize,
}

async fn hunger(State(device): State<Arc<Device>>) -> Json<Value> {
    device.hunger_reads.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "level": device.hunger.load(Ordering::SeqCst),
        "status": "peckish",
        "meals_today": device.feeds.load(Ordering::SeqCst),
    }))
}

async fn feed(State(device): State<Arc<Device>>, Json(body): Json<Value>) -> Json<Value> {
    match body["food_type"].as_str() {
        Some(food @ ("cookie" | "pizza")) => {
            device.feeds.fetch_add(1, Ordering::SeqCst);
            device.hunger.store(6, Ordering::SeqCst);
            Json(json!({"status": "fed", "food": food, "new_level": 6}))
        }
        _ => Json(json!({"status": "unknown_food", "message": "ukjent mat"})),
    }
}

async fn facts() -> Json<Value> {
    Json(json!({
        "status": "success",
        "facts": [
            {"key": "user_name", "value": "Osmund", "topic": "family", "confidence": 0.95, "frequency": 3},
            {"key": "favorite_food", "value": "brunost", "topic": "food", "confidence": 0.6, "frequency": 1},
        ],
    }))
}

async fn delete_fact(Path(key): Path<String>) -> Json<Value> {
    if key == "user_name" {
        Json(json!({"status": "error", "message": "not found"}))
    } else {
        Json(json!({"status": "success", "message": format!("deleted {}", key)}))
    }
}

/// Accepts the request but answers 200 with no body at all.
async fn reboot() -> &'static str {
    ""
}

async fn logs(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let lines: usize = query.get("lines").and_then(|l| l.parse().ok()).unwrap_or(0);
    let text = (0..lines.min(3))
        .map(|i| format!("duck[{}]: INFO line {}", i, i))
        .collect::<Vec<_>>()
        .join("\n");
    Json(json!({ "logs": text }))
}

async fn spawn_device(device: Arc<Device>) -> SocketAddr {
    let app = Router::new()
        .route("/hunger-status", get(hunger))
        .route("/api/hunger/feed", post(feed))
        .route("/api/memory/profile", get(facts))
        .route("/api/memory/profile/:key", delete(delete_fact))
        .route("/reboot", post(reboot))
        .route("/logs", get(logs))
        .with_state(device);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Periods long enough that only the first tick and early refreshes fire.
fn test_config(base_url: String) -> Config {
    let mut config = Config::default();
    config.device.base_url = base_url;
    config.polling.sensors_ms = 600_000;
    config.polling.lists_ms = 600_000;
    config.polling.confirm_delay_ms = 50;
    config.log_tail.lines = 50;
    config
}

async fn panel_for(base_url: String) -> (PanelCore, mpsc::Receiver<PanelMessage>) {
    let config = test_config(base_url);
    let gateway = Gateway::new(&config.device.base_url).unwrap();
    PanelCore::new(config, gateway)
}

/// Feed messages into the core until `done` holds.
async fn pump_until<F>(core: &mut PanelCore, rx: &mut mpsc::Receiver<PanelMessage>, done: F)
where
    F: Fn(&PanelCore) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !done(core) {
        let msg = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .expect("timed out waiting for panel messages")
            .expect("panel channel closed");
        core.handle(msg);
    }
}

fn hunger_level(core: &PanelCore) -> Option<f64> {
    match core.status(StatusKind::Hunger) {
        Some(Status::Hunger(h)) => Some(h.level),
        _ => None,
    }
}

#[tokio::test]
async fn facts_render_loading_until_first_fetch() {
    // Nothing listens on port 9.
    let (mut core, mut rx) = panel_for("http://127.0.0.1:9".to_string()).await;
    assert!(core.collections().get(Collection::Facts).is_none());
    assert!(matches!(
        core.render_collection(Collection::Facts, Local::now()),
        ListView::Loading { last_error: None }
    ));

    core.start_feeds(&[Feed::Collection(Collection::Facts)]);
    pump_until(&mut core, &mut rx, |c| {
        c.collections().last_error(Collection::Facts).is_some()
    })
    .await;

    // A failed poll is still "no data yet", never "no facts".
    match core.render_collection(Collection::Facts, Local::now()) {
        ListView::Loading { last_error } => assert!(last_error.is_some()),
        other => panic!("expected loading, got {:?}", other),
    }
    assert!(core.notices().is_empty());
    core.shutdown();
}

#[tokio::test]
async fn feed_confirms_then_repolls_hunger() {
    let device = Arc::new(Device::default());
    device.hunger.store(3, Ordering::SeqCst);
    let addr = spawn_device(device.clone()).await;
    let (mut core, mut rx) = panel_for(format!("http://{}", addr)).await;

    core.start_feeds(&[Feed::Status(StatusKind::Hunger)]);
    pump_until(&mut core, &mut rx, |c| hunger_level(c) == Some(3.0)).await;
    assert_eq!(device.hunger_reads.load(Ordering::SeqCst), 1);

    core.trigger(UserAction::Feed(FoodType::Cookie));
    pump_until(&mut core, &mut rx, |c| c.notices().for_control("feed").is_some()).await;
    let notice = core.notices().for_control("feed").unwrap();
    assert_eq!(notice.message, "Fed cookie! Hunger: 6/10");
    // The action reply alone never touches the cache.
    assert_eq!(hunger_level(&core), Some(3.0));

    pump_until(&mut core, &mut rx, |c| hunger_level(c) == Some(6.0)).await;
    assert_eq!(device.hunger_reads.load(Ordering::SeqCst), 2);
    match core.status(StatusKind::Hunger) {
        Some(Status::Hunger(h)) => assert_eq!(h.meals_today, Some(1)),
        other => panic!("unexpected {:?}", other),
    }
    core.shutdown();
}

#[tokio::test]
async fn failed_delete_leaves_facts_untouched() {
    let device = Arc::new(Device::default());
    let addr = spawn_device(device).await;
    let (mut core, mut rx) = panel_for(format!("http://{}", addr)).await;

    core.start_feeds(&[Feed::Collection(Collection::Facts)]);
    pump_until(&mut core, &mut rx, |c| c.collections().get(Collection::Facts).is_some()).await;
    let before = core.collections().get(Collection::Facts).cloned();

    core.trigger(UserAction::DeleteFact("user_name".to_string()));
    pump_until(&mut core, &mut rx, |c| {
        c.notices().for_control("delete_fact").is_some()
    })
    .await;

    assert_eq!(core.notices().for_control("delete_fact").unwrap().message, "not found");
    assert_eq!(core.collections().get(Collection::Facts).cloned(), before);
    assert!(matches!(
        core.collections().get(Collection::Facts).and_then(|f| f.first()),
        Some(Item::Fact(f)) if f.key == "user_name"
    ));
    core.shutdown();
}

#[tokio::test]
async fn empty_reply_is_not_a_success() {
    let addr = spawn_device(Arc::new(Device::default())).await;
    let gateway = Gateway::new(&format!("http://{}", addr)).unwrap();

    let err = gateway
        .call(&endpoints::REBOOT, &PathArgs::none(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Body { endpoint: "reboot", .. }), "{:?}", err);

    match actions::execute(&gateway, &UserAction::Reboot).await {
        Settlement::Failed { message } => assert!(message.contains("empty body"), "{}", message),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn log_tail_polls_only_while_open() {
    let device = Arc::new(Device::default());
    let addr = spawn_device(device).await;
    let (mut core, mut rx) = panel_for(format!("http://{}", addr)).await;
    core.log_tail_mut().set_viewport_height(10);

    core.toggle_log_tail();
    assert!(core.log_tail().is_open());
    pump_until(&mut core, &mut rx, |c| c.log_tail().lines().len() == 3).await;
    assert!(core.log_tail().last_error().is_none());

    core.toggle_log_tail();
    assert!(!core.log_tail().is_open());
    core.shutdown();
}
