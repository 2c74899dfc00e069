//! End-to-end tests of the application bootstrap: configuration, module
//! loading, server start and the webhook feeding module listeners.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pharos_core::FriendAdd;
use pharos_framework::BeaconError;
use pharos_framework::prelude::*;
use pharos_runtime::config::{ConfigError, PharosConfig};
use pharos_runtime::{Pharos, RuntimeError};
use serde_json::json;

static READY_COUNT: AtomicUsize = AtomicUsize::new(0);
static FRIENDS: Mutex<Vec<String>> = Mutex::new(Vec::new());

async fn on_friend_add(event: EventContext<FriendAdd>) {
    FRIENDS.lock().push(event.user_openid.clone());
}

fn tracker_setup() -> Result<(), BoxError> {
    listen([EventKind::ApplicationReady]).handle(|| async {
        READY_COUNT.fetch_add(1, Ordering::SeqCst);
    })?;
    listen([EventKind::FriendAdd]).handle(on_friend_add)?;
    Ok(())
}

pharos_framework::module!(TRACKER, "tracker", tracker_setup);

fn config(modules: &[&str]) -> PharosConfig {
    let mut config = PharosConfig::default();
    config.bot.appid = "102000000".into();
    config.bot.secret = "s".repeat(40);
    config.webhook.host = "127.0.0.1".into();
    config.webhook.port = 0;
    config.modules = modules.iter().map(|m| m.to_string()).collect();
    config
}

#[tokio::test]
async fn test_lifecycle_publishes_ready_and_routes_webhook() {
    let app = Pharos::from_config(config(&["tracker"])).unwrap();
    assert!(app.load_modules().is_empty());
    assert!(app.beacon().is_loaded("tracker"));
    assert!(!app.is_running());

    let addr = app.start().await.unwrap();
    assert_ne!(addr.port(), 0);
    assert!(app.is_running());
    assert_eq!(READY_COUNT.load(Ordering::SeqCst), 1);

    // A second start keeps the running server.
    assert_eq!(app.start().await.unwrap(), addr);
    assert_eq!(READY_COUNT.load(Ordering::SeqCst), 1);

    let body = json!({
        "op": 0,
        "id": "evt-1",
        "t": "FRIEND_ADD",
        "d": {"openid": "USER1", "timestamp": 1700000000}
    });
    let response = app
        .webhook()
        .handle(&serde_json::to_vec(&body).unwrap())
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(*FRIENDS.lock(), ["USER1"]);

    app.stop();
    assert!(!app.is_running());

    // run_until loads (already loaded), starts again and stops on completion.
    app.run_until(async {}).await.unwrap();
    assert!(!app.is_running());
    assert_eq!(READY_COUNT.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_module_is_reported_and_skipped() {
    let app = Pharos::from_config(config(&["does_not_exist"])).unwrap();
    let failures = app.load_modules();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "does_not_exist");
    assert!(matches!(failures[0].1, BeaconError::ModuleNotFound(_)));
    assert!(!app.beacon().is_loaded("tracker"));
}

#[test]
fn test_short_secret_is_rejected() {
    let mut config = config(&[]);
    config.bot.secret = "too-short".into();

    let err = Pharos::from_config(config).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Config(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_missing_appid_is_rejected() {
    let mut config = config(&[]);
    config.bot.appid.clear();

    let err = Pharos::from_config(config).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Config(ConfigError::MissingField { .. })
    ));
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = config(&[]);
    config.webhook.port = taken.local_addr().unwrap().port();

    let app = Pharos::from_config(config).unwrap();
    let err = app.start().await.unwrap_err();
    assert!(matches!(err, RuntimeError::Bind { .. }));
    assert!(!app.is_running());
}
