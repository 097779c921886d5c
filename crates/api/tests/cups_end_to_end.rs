//! End-to-end print flow through the real `CupsSpooler`, with `sh` scripts
//! standing in for `lp` and `lpstat`.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, get, post_empty, test_config, upload};
use printbroker_api::router::build_app_router;
use printbroker_api::state::AppState;
use printbroker_core::registry::InMemoryRegistry;
use printbroker_core::spooler::{CupsSpooler, SpoolerCommand};
use printbroker_core::uploads::UploadStore;
use tokio_util::sync::CancellationToken;

fn app_with(submit: &str, status: &str, timeout: Duration) -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let spooler = CupsSpooler::new(
        SpoolerCommand::new("sh").with_args(["-c", submit, "lp"]),
        SpoolerCommand::new("sh").with_args(["-c", status, "lpstat"]),
        timeout,
        CancellationToken::new(),
    );

    let state = AppState {
        config: Arc::new(test_config(dir.path())),
        registry: Arc::new(InMemoryRegistry::new()),
        spooler: Arc::new(spooler),
        uploads: Arc::new(UploadStore::new(dir.path(), 1024 * 1024)),
    };

    (build_app_router(state), dir)
}

#[tokio::test]
async fn upload_then_print_with_reachable_spooler() {
    let (app, _dir) = app_with(
        r#"test "$1" = "-d" && test -f "$3" && echo "request id is $2-12 (1 file(s))""#,
        "true",
        Duration::from_secs(10),
    );

    let uploaded = body_json(upload(app.clone(), "report.pdf", "application/pdf", &[b'%'; 10240]).await).await;
    let id = uploaded["id"].as_str().unwrap();

    let response = post_empty(app, &format!("/api/print/{id}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "request id is Test_Printer-12 (1 file(s))");
}

#[tokio::test]
async fn hung_spooler_times_out_with_500() {
    let (app, _dir) = app_with("sleep 30", "sleep 30", Duration::from_millis(200));

    let response = get(app, "/api/queue").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // The stand-in status command is `sh`, so that is the program named.
    assert_eq!(body_json(response).await["details"], "sh timed out after 0.2s");
}

#[tokio::test]
async fn queue_lines_come_from_status_command() {
    let (app, _dir) = app_with(
        "true",
        r#"printf 'Test_Printer-1 alice 1024\n\nTest_Printer-2 bob 2048\n'"#,
        Duration::from_secs(10),
    );

    let json = body_json(get(app, "/api/queue").await).await;

    assert_eq!(
        json["jobs"],
        serde_json::json!(["Test_Printer-1 alice 1024", "Test_Printer-2 bob 2048"])
    );
}
