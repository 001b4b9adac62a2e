mod common;

use axum::extract::Path as AxumPath;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use common::{cell, fixtures, run_opsbatch, write_file};

async fn user_handler(AxumPath(id): AxumPath<String>) -> Result<Json<Value>, StatusCode> {
    match id.as_str() {
        "user_1" => Ok(Json(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email_addresses": [{"email_address": "ada@example.com"}]
        }))),
        "user_3" => Ok(Json(json!({
            "first_name": null,
            "last_name": null,
            "email_addresses": [{"email_address": "grace@example.com"}]
        }))),
        "user_2" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

/// Starts a stand-in identity API and returns its users endpoint.
async fn spawn_identity_api() -> String {
    let app = Router::new().route("/v1/users/{id}", get(user_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1/users", addr)
}

fn write_users(dir: &TempDir) {
    fixtures::write_workbook(
        &dir.path().join("users.xlsx"),
        &[
            &["Name", "Email", "Team", "Role", "User ID"],
            &["a", "a@x", "core", "dev", "user_1"],
            &["b", "b@x", "core", "dev", ""],
            &["c", "c@x", "ops", "sre", "user_2"],
            &["d", "d@x", "ops", "sre", "user_3"],
        ],
    )
    .unwrap();
}

#[tokio::test]
async fn test_resolve_names_writes_updated_copy() {
    let dir = TempDir::new().unwrap();
    write_users(&dir);
    let base_url = spawn_identity_api().await;
    write_file(
        &dir,
        "opsbatch.toml",
        &format!(
            r#"
[pool]
concurrency = 2
progress_interval_secs = 0

[identity]
base_url = "{}"
"#,
            base_url
        ),
    );

    let output = run_opsbatch(
        &dir,
        &["resolve-names", "users.xlsx"],
        &[("CLERK_SECRET_KEY", "sk_test")],
    )
    .await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let updated = dir.path().join("users_updated.xlsx");
    assert!(updated.is_file());
    assert_eq!(cell(&updated, 6, 1), "User Name");
    assert_eq!(cell(&updated, 6, 2), "Ada Lovelace");
    assert_eq!(cell(&updated, 6, 3), "");
    assert_eq!(cell(&updated, 6, 4), "Unknown User (user_2)");
    assert_eq!(cell(&updated, 6, 5), "grace@example.com");

    // Input is left untouched
    assert_eq!(cell(&dir.path().join("users.xlsx"), 6, 1), "");
}

#[tokio::test]
async fn test_resolve_names_requires_secret() {
    let dir = TempDir::new().unwrap();
    write_users(&dir);

    let output = run_opsbatch(&dir, &["resolve-names", "users.xlsx"], &[]).await;
    assert!(!output.status.success());
    assert!(!dir.path().join("users_updated.xlsx").exists());
}

#[tokio::test]
async fn test_resolve_names_rejects_unsupported_file() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "users.csv", "id\nuser_1\n");

    let output = run_opsbatch(
        &dir,
        &["resolve-names", "users.csv"],
        &[("CLERK_SECRET_KEY", "sk_test")],
    )
    .await;
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_explicit_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    write_users(&dir);

    let output = run_opsbatch(
        &dir,
        &["--config", "absent.toml", "resolve-names", "users.xlsx"],
        &[("CLERK_SECRET_KEY", "sk_test")],
    )
    .await;
    assert!(!output.status.success());
}
