use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a config with database path
fn config_with_db(port: u16, db_path: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"
"#,
        port, db_path
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_marquee"))
        .env("MARQUEE_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Helper to start a server for testing
async fn start_test_server() -> (u16, tokio::process::Child, TempDir) {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_content = config_with_db(port, db_path.to_str().unwrap());

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    // Give a moment for initialization
    sleep(Duration::from_millis(100)).await;

    (port, server, temp_dir)
}

fn base(port: u16) -> String {
    format!("http://127.0.0.1:{}/api/v1", port)
}

/// Register a user and return its id
async fn create_user(client: &Client, port: u16, username: &str, role: &str) -> i64 {
    let response = client
        .post(format!("{}/users", base(port)))
        .json(&json!({ "username": username, "role": role }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    let json: Value = response.json().await.unwrap();
    json["id"].as_i64().unwrap()
}

/// Schedule a showing and return its id
async fn create_session(client: &Client, port: u16) -> i64 {
    let response = client
        .post(format!("{}/sessions", base(port)))
        .json(&json!({
            "movie_title": "The Matrix",
            "date": "2030-06-01",
            "starts_at": "10:00:00",
            "ends_at": "12:00:00",
            "capacity": 10,
            "price": 12.5
        }))
        .send()
        .await
        .expect("Failed to create session");
    assert_eq!(response.status(), 201);
    let json: Value = response.json().await.unwrap();
    json["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_and_config() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base(port)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/config", base(port)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["server"]["port"], port);
    // No secrets in the sanitized config.
    assert!(json.get("omdb").is_none() || json["omdb"].get("api_key").is_none());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_purchase_flow() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let user_id = create_user(&client, port, "neo", "customer").await;
    let session_id = create_session(&client, port).await;

    let response = client
        .post(format!("{}/tickets/purchase", base(port)))
        .json(&json!({ "user_id": user_id, "session_id": session_id, "seat_number": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let ticket: Value = response.json().await.unwrap();
    assert_eq!(ticket["status"], "pending");
    assert_eq!(ticket["request_type"], "purchase");
    assert_eq!(ticket["seat_number"], 5);

    // The same seat again is a conflict.
    let response = client
        .post(format!("{}/tickets/purchase", base(port)))
        .json(&json!({ "user_id": user_id, "session_id": session_id, "seat_number": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Out of range is a validation failure.
    let response = client
        .post(format!("{}/tickets/purchase", base(port)))
        .json(&json!({ "user_id": user_id, "session_id": session_id, "seat_number": 11 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // The seat view reflects the hold.
    let response = client
        .get(format!("{}/sessions/{}/seats", base(port), session_id))
        .send()
        .await
        .unwrap();
    let seats: Value = response.json().await.unwrap();
    assert_eq!(seats["capacity"], 10);
    assert_eq!(seats["occupied"], json!([5]));
    assert_eq!(seats["available"], 9);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_lifecycle_actions() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let user_id = create_user(&client, port, "neo", "customer").await;
    let session_id = create_session(&client, port).await;

    let ticket: Value = client
        .post(format!("{}/tickets/purchase", base(port)))
        .json(&json!({ "user_id": user_id, "session_id": session_id, "seat_number": 3 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ticket_id = ticket["id"].as_i64().unwrap();

    // Staff confirm.
    let response = client
        .post(format!("{}/tickets/{}/action", base(port), ticket_id))
        .json(&json!({ "action": "confirm" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let confirmed: Value = response.json().await.unwrap();
    assert_eq!(confirmed["status"], "confirmed");

    // Cancelling a confirmed ticket is off the state machine table.
    let response = client
        .post(format!("{}/tickets/{}/action", base(port), ticket_id))
        .json(&json!({ "action": "cancel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // An unknown action name fails at the parse boundary.
    let response = client
        .post(format!("{}/tickets/{}/action", base(port), ticket_id))
        .json(&json!({ "action": "refund" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_return_is_owner_only() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let owner_id = create_user(&client, port, "neo", "customer").await;
    let other_id = create_user(&client, port, "smith", "customer").await;
    let session_id = create_session(&client, port).await;

    let ticket: Value = client
        .post(format!("{}/tickets/purchase", base(port)))
        .json(&json!({ "user_id": owner_id, "session_id": session_id, "seat_number": 4 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ticket_id = ticket["id"].as_i64().unwrap();

    // A stranger may not request the return.
    let response = client
        .post(format!("{}/tickets/{}/return", base(port), ticket_id))
        .json(&json!({ "user_id": other_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The owner may, and the request is idempotent.
    for _ in 0..2 {
        let response = client
            .post(format!("{}/tickets/{}/return", base(port), ticket_id))
            .json(&json!({ "user_id": owner_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let returned: Value = response.json().await.unwrap();
        assert_eq!(returned["request_type"], "return");
    }

    server.kill().await.ok();
}

#[tokio::test]
async fn test_schedule_overlap_rejected() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    create_session(&client, port).await;

    // Contained interval of the same film on the same date.
    let response = client
        .post(format!("{}/sessions", base(port)))
        .json(&json!({
            "movie_title": "The Matrix",
            "date": "2030-06-01",
            "starts_at": "10:30:00",
            "ends_at": "11:30:00",
            "capacity": 10,
            "price": 12.5
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Back to back is fine.
    let response = client
        .post(format!("{}/sessions", base(port)))
        .json(&json!({
            "movie_title": "The Matrix",
            "date": "2030-06-01",
            "starts_at": "12:00:00",
            "ends_at": "14:00:00",
            "capacity": 10,
            "price": 12.5
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_session_delete_guarded_by_tickets() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let user_id = create_user(&client, port, "neo", "customer").await;
    let session_id = create_session(&client, port).await;

    let ticket: Value = client
        .post(format!("{}/tickets/purchase", base(port)))
        .json(&json!({ "user_id": user_id, "session_id": session_id, "seat_number": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ticket_id = ticket["id"].as_i64().unwrap();

    let response = client
        .delete(format!("{}/sessions/{}", base(port), session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Cancel the hold, then deletion goes through.
    let response = client
        .post(format!("{}/tickets/{}/action", base(port), ticket_id))
        .json(&json!({ "action": "cancel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .delete(format!("{}/sessions/{}", base(port), session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    create_user(&client, port, "neo", "customer").await;

    let response = client
        .post(format!("{}/users", base(port)))
        .json(&json!({ "username": "neo", "role": "staff" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    server.kill().await.ok();
}
