use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use lobby::{AppState, config::RoomSettings, reaper, router, store::Store};
use serde_json::{Value, json};
use time::OffsetDateTime;

async fn server() -> (TestServer, Store) {
    let store = Store::in_memory().await.unwrap();
    let app = router(AppState {
        store: store.clone(),
        room: RoomSettings::default(),
    });
    (TestServer::new(app).unwrap(), store)
}

fn as_user(request: TestRequest, name: &str) -> TestRequest {
    request.add_header(HeaderName::from_static("user"), HeaderValue::from_str(name).unwrap())
}

async fn join(server: &TestServer, name: &str) {
    let response = server.post("/participants").json(&json!({ "name": name })).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

async fn say(server: &TestServer, from: &str, to: &str, text: &str, kind: &str) -> Value {
    let response = as_user(server.post("/messages"), from)
        .json(&json!({ "to": to, "text": text, "type": kind }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn texts(server: &TestServer, viewer: &str, limit: Option<&str>) -> Vec<String> {
    let mut request = as_user(server.get("/messages"), viewer);
    if let Some(limit) = limit {
        request = request.add_query_param("limit", limit);
    }
    let response = request.await;
    assert_eq!(response.status_code(), StatusCode::OK);

    response
        .json::<Vec<Value>>()
        .into_iter()
        .map(|m| m["text"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn join_then_list() {
    let (server, _) = server().await;
    join(&server, "Ana").await;

    let participants: Vec<Value> = server.get("/participants").await.json();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["name"], "Ana");
    assert!(participants[0]["lastStatus"].is_i64());

    let messages: Vec<Value> = as_user(server.get("/messages"), "Ana").await.json();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["from"], "Ana");
    assert_eq!(messages[0]["to"], "Todos");
    assert_eq!(messages[0]["type"], "status");
}

#[tokio::test]
async fn join_rejects_bad_and_duplicate_names() {
    let (server, _) = server().await;
    join(&server, "Ana").await;

    let duplicate = server.post("/participants").json(&json!({ "name": "Ana" })).await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let blank = server.post("/participants").json(&json!({ "name": "   " })).await;
    assert_eq!(blank.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let missing = server.post("/participants").json(&json!({})).await;
    assert_eq!(missing.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let wrong_type = server.post("/participants").json(&json!({ "name": 42 })).await;
    assert_eq!(wrong_type.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn private_messages_are_scoped() {
    let (server, _) = server().await;
    for name in ["A", "B", "C"] {
        join(&server, name).await;
    }
    say(&server, "A", "B", "for B only", "private_message").await;
    say(&server, "A", "Todos", "for everyone", "message").await;

    for viewer in ["A", "B"] {
        let seen = texts(&server, viewer, None).await;
        assert!(seen.contains(&"for B only".to_owned()));
        assert!(seen.contains(&"for everyone".to_owned()));
    }

    let seen = texts(&server, "C", None).await;
    assert!(!seen.contains(&"for B only".to_owned()));
    assert!(seen.contains(&"for everyone".to_owned()));
}

#[tokio::test]
async fn limit_query() {
    let (server, _) = server().await;
    join(&server, "A").await;
    for text in ["one", "two", "three"] {
        say(&server, "A", "Todos", text, "message").await;
    }

    assert_eq!(texts(&server, "A", Some("2")).await, vec!["two", "three"]);

    let everything = texts(&server, "A", None).await;
    assert_eq!(everything.len(), 4);
    for no_limit in ["0", "-1", "lots"] {
        assert_eq!(texts(&server, "A", Some(no_limit)).await, everything);
    }
}

#[tokio::test]
async fn send_validation() {
    let (server, _) = server().await;
    join(&server, "A").await;

    let unknown = as_user(server.post("/messages"), "Ghost")
        .json(&json!({ "to": "Todos", "text": "boo", "type": "message" }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_kind = as_user(server.post("/messages"), "A")
        .json(&json!({ "to": "Todos", "text": "hi", "type": "status" }))
        .await;
    assert_eq!(bad_kind.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let no_header = server
        .post("/messages")
        .json(&json!({ "to": "Todos", "text": "hi", "type": "message" }))
        .await;
    assert_eq!(no_header.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn only_the_author_edits_and_deletes() {
    let (server, _) = server().await;
    join(&server, "A").await;
    join(&server, "B").await;
    let message = say(&server, "A", "Todos", "original", "message").await;
    let path = format!("/messages/{}", message["id"].as_str().unwrap());

    let edit_body = json!({ "to": "Todos", "text": "hijacked", "type": "message" });
    let forbidden = as_user(server.put(&path), "B").json(&edit_body).await;
    assert_eq!(forbidden.status_code(), StatusCode::UNAUTHORIZED);

    let forbidden = as_user(server.delete(&path), "B").await;
    assert_eq!(forbidden.status_code(), StatusCode::UNAUTHORIZED);
    assert!(texts(&server, "B", None).await.contains(&"original".to_owned()));

    let edited = as_user(server.put(&path), "A")
        .json(&json!({ "to": "Todos", "text": "revised", "type": "message" }))
        .await;
    assert_eq!(edited.status_code(), StatusCode::OK);
    assert_eq!(edited.json::<Value>()["text"], "revised");

    let deleted = as_user(server.delete(&path), "A").await;
    assert_eq!(deleted.status_code(), StatusCode::OK);

    let gone = as_user(server.delete(&path), "A").await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_message_id_is_not_found() {
    let (server, _) = server().await;
    join(&server, "A").await;

    let response = as_user(server.delete("/messages/not-a-uuid"), "A").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn heartbeat_status_codes() {
    let (server, _) = server().await;
    join(&server, "Ana").await;

    assert_eq!(as_user(server.post("/status"), "Ana").await.status_code(), StatusCode::OK);
    assert_eq!(
        as_user(server.post("/status"), "Ghost").await.status_code(),
        StatusCode::NOT_FOUND
    );

    let participants: Vec<Value> = server.get("/participants").await.json();
    assert_eq!(participants.len(), 1);
}

#[tokio::test]
async fn idle_participants_are_reaped() {
    let (server, store) = server().await;
    join(&server, "Ana").await;

    let later = OffsetDateTime::now_utc() + Duration::from_secs(60);
    let evicted = reaper::sweep(&store, "Todos", Duration::from_secs(10), later).await.unwrap();
    assert_eq!(evicted, vec!["Ana".to_owned()]);

    let participants: Vec<Value> = server.get("/participants").await.json();
    assert!(participants.is_empty());

    let seen = texts(&server, "Bia", None).await;
    assert_eq!(seen.last().map(String::as_str), Some("left the room"));
}

#[tokio::test]
async fn health_check() {
    let (server, _) = server().await;
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn angle_brackets_survive_but_tags_do_not() {
    let (server, _) = server().await;
    join(&server, "A").await;

    let heart = say(&server, "A", "Todos", "I <3 you", "message").await;
    assert_eq!(heart["text"], "I <3 you");

    let bold = say(&server, "A", "Todos", "<b>loud</b> a < b", "message").await;
    assert_eq!(bold["text"], "loud a < b");

    assert!(texts(&server, "A", None).await.contains(&"I <3 you".to_owned()));
}
