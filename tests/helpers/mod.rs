#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use todo_client::config::Config;

pub const IDENTITY: &str = "tester";
pub const TOKEN: &str = "token-1";

pub fn bearer() -> String {
    format!("Bearer {}", TOKEN)
}

pub fn config_for(server: &ServerGuard) -> Config {
    Config {
        base_url: server.url(),
        identity: IDENTITY.to_string(),
        ..Config::default()
    }
}

pub fn remote(id: &str, value: &str, priority: u8, checked: bool) -> Value {
    json!({ "_id": id, "value": value, "priority": priority, "checked": checked })
}

pub fn sample_notes() -> Value {
    json!([
        remote("a1", "Buy milk", 1, false),
        remote("b2", "Call mom", 3, true),
        remote("c3", "Pay rent", 2, false),
    ])
}

pub async fn mock_login(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/auth/login")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "value": IDENTITY })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": TOKEN }).to_string())
        .expect(1)
        .create_async()
        .await
}

pub async fn mock_list(server: &mut ServerGuard, notes: Value) -> Mock {
    server
        .mock("GET", "/todo")
        .match_header("authorization", bearer().as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(notes.to_string())
        .expect(1)
        .create_async()
        .await
}

/// Login plus a list call answering with `notes`
pub async fn mock_session(server: &mut ServerGuard, notes: Value) -> (Mock, Mock) {
    let login = mock_login(server).await;
    let list = mock_list(server, notes).await;
    (login, list)
}
