//! End-to-end tests of the chat API through the in-memory test client.

use std::sync::Arc;
use std::time::Duration;

use chatterbox_chat::{seed_demo_data, ChatApp, ChatState, MemoryStore};
use chatterbox_config::{ChatConfig, InvitesConfig};
use chatterbox_test::TestClient;
use http::StatusCode;
use serde_json::{json, Value};

const MESSAGES: &str = "/api/v1/communities/main/channels/general/messages";

fn client_with(invites: InvitesConfig) -> TestClient {
    let store = Arc::new(MemoryStore::new());
    seed_demo_data(store.as_ref()).unwrap();
    let state = ChatState::new(store, &ChatConfig::default(), &invites);
    let app = ChatApp::new(Arc::new(state)).unwrap();
    TestClient::new(app.into_routes())
}

fn client() -> TestClient {
    client_with(InvitesConfig::default())
}

fn contents(page: &Value) -> Vec<String> {
    page["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_options_lists_allowed_methods() {
    let client = client();
    let response = client.options(MESSAGES).send().await;
    response
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header("Allow", "GET, HEAD, POST, OPTIONS");
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_head_matches_get_without_body() {
    let client = client();
    let get = client.get(MESSAGES).send().await;
    let head = client.head(MESSAGES).send().await;

    assert_eq!(head.status(), get.status());
    assert_eq!(head.content_type(), get.content_type());
    assert!(head.body().is_empty());
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let client = client();
    let response = client.request(http::Method::DELETE, "/api/v1/me").send().await;
    response
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_header("Allow", "GET, HEAD, POST, OPTIONS");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let client = client();
    client.get("/api/v2/anything").send().await.assert_status_code(404);
    client
        .get("/api/v1/communities/main/messages")
        .send()
        .await
        .assert_status_code(404);
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_list_seeded_messages() {
    let client = client();
    let response = client.get(MESSAGES).send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_content_type("application/json")
        .assert_json_field("messages.0.user", &json!("john"))
        .assert_json_field("messages.1.timestamp", &json!("1"))
        .assert_json_field("users.0.name", &json!("john"))
        .assert_json_field("users.1.name", &json!("bob"));

    let page = response.json_value().unwrap();
    assert_eq!(contents(&page).len(), 4);
    assert_eq!(page["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_window_and_limit() {
    let client = client();

    let page = client
        .get(format!("{MESSAGES}?limit=2"))
        .send()
        .await
        .json_value()
        .unwrap();
    assert_eq!(contents(&page), vec!["Test test test", "Can you see this?"]);

    let page = client
        .get(format!("{MESSAGES}?after=0&before=3"))
        .send()
        .await
        .json_value()
        .unwrap();
    assert_eq!(contents(&page), vec!["Hello World", "Test test test"]);
}

#[tokio::test]
async fn test_list_rejects_bad_parameters() {
    let client = client();

    client
        .get(format!("{MESSAGES}?limit=500"))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Query parameter limit must be between 1 and 200.");
    client
        .get(format!("{MESSAGES}?before=abc"))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Invalid query parameter for before");
    client
        .get(format!("{MESSAGES}?polling=yes"))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Invalid query parameter for polling");
}

#[tokio::test]
async fn test_post_requires_credentials() {
    let client = client();

    client
        .post(MESSAGES)
        .json(&json!({"content": "hi"}))
        .send()
        .await
        .assert_status_code(401)
        .assert_message("Unauthorized.");
    client
        .post(MESSAGES)
        .basic_auth("john", "wrong")
        .json(&json!({"content": "hi"}))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Bad credentials.");
    client
        .post(MESSAGES)
        .header("Authorization", "Bearer token")
        .json(&json!({"content": "hi"}))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Unknown authorization type.");
}

#[tokio::test]
async fn test_post_validates_body() {
    let client = client();

    client
        .post(MESSAGES)
        .basic_auth("john", "12345")
        .body("not json")
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Invalid body.");
    client
        .post(MESSAGES)
        .basic_auth("john", "12345")
        .json(&json!({"content": ""}))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Cannot send empty message.");
}

#[tokio::test]
async fn test_post_then_poll_returns_immediately() {
    let client = client();

    client
        .post(MESSAGES)
        .basic_auth("bob", "67890")
        .json(&json!({"content": "new one"}))
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("user", &json!("bob"))
        .assert_json_field("content", &json!("new one"));

    let page = client
        .get(format!("{MESSAGES}?after=3&polling=true"))
        .send()
        .await
        .json_value()
        .unwrap();
    assert_eq!(contents(&page), vec!["new one"]);
    assert_eq!(page["users"][0]["name"], "bob");
}

#[tokio::test(start_paused = true)]
async fn test_poller_woken_by_post() {
    let client = client();
    let started = tokio::time::Instant::now();

    let poller = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .get(format!("{MESSAGES}?after=3&polling=true"))
                .send()
                .await
        }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    client
        .post(MESSAGES)
        .basic_auth("john", "12345")
        .json(&json!({"content": "wake up"}))
        .send()
        .await
        .assert_success();

    let response = poller.await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(contents(&response.json_value().unwrap()), vec!["wake up"]);
}

#[tokio::test(start_paused = true)]
async fn test_poll_times_out_with_empty_page() {
    let client = client();
    let started = tokio::time::Instant::now();

    let response = client
        .get(format!("{MESSAGES}?after=3&polling=true"))
        .send()
        .await;

    response
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!({"users": [], "messages": []}));
    assert!(started.elapsed() >= Duration::from_secs(60));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_me() {
    let client = client();
    client
        .get("/api/v1/me")
        .basic_auth("john", "12345")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("name", &json!("john"));
    client.get("/api/v1/me").send().await.assert_status_code(401);
}

#[tokio::test]
async fn test_sign_up_redeems_invite() {
    let client = client();

    client
        .post("/api/v1/me")
        .json(&json!({"invite": "pee", "username": "alice", "password": "pw"}))
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("name", &json!("alice"));

    client
        .get("/api/v1/me")
        .basic_auth("alice", "pw")
        .send()
        .await
        .assert_json_field("name", &json!("alice"));

    // The invite is spent.
    client
        .post("/api/v1/me")
        .json(&json!({"invite": "pee", "username": "carol", "password": "pw"}))
        .send()
        .await
        .assert_status_code(400)
        .assert_message("Invalid invite.");
    client.get("/api/v1/invites/pee").send().await.assert_status_code(404);
}

#[tokio::test]
async fn test_sign_up_validation() {
    let client = client();

    client
        .post("/api/v1/me")
        .json(&json!({"invite": "nope", "username": "alice", "password": "pw"}))
        .send()
        .await
        .assert_message("Invalid invite.");
    client
        .post("/api/v1/me")
        .json(&json!({"invite": "pee", "username": "Alice", "password": "pw"}))
        .send()
        .await
        .assert_status_code(400)
        .assert_message(
            "Username must be between 2 and 32 characters, and lowercase latin characters only.",
        );
    client
        .post("/api/v1/me")
        .json(&json!({"invite": "pee", "username": "bob", "password": "pw"}))
        .send()
        .await
        .assert_message("Username is taken.");
}

#[tokio::test]
async fn test_user_lookup() {
    let client = client();

    client
        .get("/api/v1/users/bob")
        .basic_auth("john", "12345")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("name", &json!("bob"));
    client
        .get("/api/v1/users/nobody")
        .basic_auth("john", "12345")
        .send()
        .await
        .assert_status_code(404)
        .assert_message("No one with that name exists.");
    client.get("/api/v1/users/bob").send().await.assert_status_code(401);
}

// ============================================================================
// Invites
// ============================================================================

#[tokio::test]
async fn test_invite_check() {
    let client = client();

    let response = client.get("/api/v1/invites/pee").send().await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response.body().is_empty());

    client
        .get("/api/v1/invites/missing")
        .send()
        .await
        .assert_status_code(404)
        .assert_message("Invite not found.");
}

#[tokio::test]
async fn test_invite_creation_disabled() {
    let client = client();
    client
        .post("/api/v1/invites")
        .basic_auth("john", "12345")
        .send()
        .await
        .assert_status_code(403)
        .assert_message("Invite creation is temporarily disabled.");
}

#[tokio::test]
async fn test_invite_creation_enabled() {
    let client = client_with(InvitesConfig {
        creation_enabled: true,
    });

    client.post("/api/v1/invites").send().await.assert_status_code(401);

    let created = client
        .post("/api/v1/invites")
        .basic_auth("bob", "67890")
        .send()
        .await;
    created.assert_status(StatusCode::OK);
    let code = created.json_value().unwrap()["code"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(code.len(), 8);

    client
        .get(format!("/api/v1/invites/{code}"))
        .send()
        .await
        .assert_status_code(204);

    let listed = client
        .get("/api/v1/invites")
        .basic_auth("bob", "67890")
        .send()
        .await
        .json_value()
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["code"], code.as_str());
}
