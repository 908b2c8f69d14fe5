//! End-to-end tests of the command socket driving a loaded timer.

#![cfg(unix)]

use serde_json::{Value, json};
use splitwatch::server::{send_command, send_raw};
use splitwatch::{CommandServer, ServerConfig, Splitwatch, TimerConfig, TimingEngine};
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

const SPLITS: &str = r#"{
    "Celeste": { "categories": { "Any%": ["Prologue", "City", "Site"] } }
}"#;

fn config_in(dir: &Path) -> TimerConfig {
    let splits_file = dir.join("celeste.json");
    std::fs::write(&splits_file, SPLITS).unwrap();
    TimerConfig {
        splits_file,
        socket_path: dir.join("splits.sock"),
        server: ServerConfig {
            accept_interval_ms: 50,
            read_timeout_ms: 200,
            shutdown_grace_ms: 500,
            ..ServerConfig::default()
        },
        ..TimerConfig::default()
    }
}

async fn serve() -> (TempDir, TimerConfig, Arc<TimingEngine>, CommandServer) {
    let _ = tracing_subscriber::fmt::try_init();
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let engine = Arc::new(Splitwatch::load(&config).unwrap());
    let server = Splitwatch::serve(Arc::clone(&engine), &config).await.unwrap();
    (dir, config, engine, server)
}

async fn raw_json(config: &TimerConfig, payload: &[u8]) -> Value {
    let bytes = send_raw(&config.socket_path, payload).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn structural_errors_are_reported() {
    let (_dir, config, engine, mut server) = serve().await;

    assert_eq!(
        raw_json(&config, b"{not json").await,
        json!({"response": "error", "error": "invalid_json"})
    );
    assert_eq!(
        raw_json(&config, br#"{"foo":1}"#).await,
        json!({"response": "error", "error": "invalid_command"})
    );
    assert_eq!(
        send_command(&config.socket_path, &json!({"command": "pause"})).await.unwrap(),
        json!({"response": "error", "error": "unknown_command"})
    );

    assert!(engine.run_state().is_idle());
    server.stop().await;
}

#[tokio::test]
async fn split_commands_complete_and_record_a_run() {
    let (dir, config, engine, mut server) = serve().await;
    let split = json!({"command": "split"});

    let started = send_command(&config.socket_path, &split).await.unwrap();
    assert_eq!(started["action"], "started");

    for expected in ["split", "split", "finished"] {
        let reply = send_command(&config.socket_path, &split).await.unwrap();
        assert_eq!(reply["action"], expected);
    }

    let status = send_command(&config.socket_path, &json!({"command": "status"})).await.unwrap();
    assert_eq!(status["status"]["running"], false);
    assert_eq!(status["status"]["current_index"], -1);
    assert_eq!(status["status"]["split_times"].as_array().map(Vec::len), Some(3));

    let history: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("celeste_history.json")).unwrap())
            .unwrap();
    let runs = history["Celeste"]["Any%"].as_object().unwrap();
    assert_eq!(runs.len(), 1);
    let run = runs.values().next().unwrap().as_object().unwrap();
    assert_eq!(run.keys().collect::<Vec<_>>(), vec!["City", "Prologue", "Site"]);

    engine.read(|view| assert_eq!(view.history.segment_history().len(), 1));
    server.stop().await;
}

#[tokio::test]
async fn reset_over_the_socket_discards_the_run() {
    let (dir, config, engine, mut server) = serve().await;

    send_command(&config.socket_path, &json!({"command": "start"})).await.unwrap();
    send_command(&config.socket_path, &json!({"command": "split"})).await.unwrap();
    let reset = send_command(&config.socket_path, &json!({"command": "reset"})).await.unwrap();

    assert_eq!(reset["action"], "reset");
    assert_eq!(reset["status"]["split_times"], json!([]));
    assert!(engine.comparison().is_none());
    assert!(!dir.path().join("celeste_history.json").exists());
    server.stop().await;
}

#[tokio::test]
async fn stopped_server_refuses_connections() {
    let (_dir, config, _engine, mut server) = serve().await;
    server.stop().await;

    assert!(!config.socket_path.exists());
    assert!(send_command(&config.socket_path, &json!({"command": "status"})).await.is_err());
}
