//! Integration tests for the assistant session using wiremock.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use homevault_assistant::{
    AskOutcome, AssistantClient, AssistantError, AssistantMessages, AssistantSession,
    InventoryItem, SessionState, SkipReason,
};
use homevault_types::NamedRef;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASK_PATH: &str = "/functions/v1/ask-assistant";

fn items() -> Vec<InventoryItem> {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let mut fridge = InventoryItem::new("abc", "מקרר סמסונג", at);
    fridge.room = Some(NamedRef::new("r1", "מטבח"));
    let mut freezer = InventoryItem::new("def", "מקפיא", at);
    freezer.room = Some(NamedRef::new("r2", "מחסן"));
    let tv = InventoryItem::new("ghi", "טלוויזיה", at);
    vec![fridge, freezer, tv]
}

fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::from(": connected\n\n");
    for fragment in fragments {
        let json = serde_json::json!({
            "choices": [{ "index": 0, "delta": { "content": fragment } }]
        });
        body.push_str(&format!("data: {json}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn session(server: &MockServer) -> AssistantSession {
    AssistantSession::new(AssistantClient::new(server.uri(), "test-key"))
}

#[tokio::test]
async fn ask_sends_question_items_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "question": "איפה המקרר?",
            "items": [{ "id": "abc", "name": "מקרר סמסונג", "room": "מטבח", "category": null }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["המקרר ", "במטבח"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let outcome = session.ask("  איפה המקרר?  ", &items()).await;

    let AskOutcome::Answered(reply) = outcome else {
        panic!("expected Answered, got {outcome:?}");
    };
    assert_eq!(reply.text, "המקרר במטבח");
    assert!(reply.item_ids.is_empty());
    assert!(reply.items.is_empty());
}

#[tokio::test]
async fn marker_is_stripped_and_items_resolved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&["יש שני מוצרים מתאימים.\n", "[ITEMS:def,", " missing, abc]"]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let session = session(&server);
    let view = session.subscribe();
    let AskOutcome::Answered(reply) = session.ask("מה במקרר?", &items()).await else {
        panic!("expected Answered");
    };

    assert_eq!(reply.text, "יש שני מוצרים מתאימים.");
    assert_eq!(reply.item_ids, ["def", "missing", "abc"]);
    let resolved: Vec<&str> = reply.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(resolved, ["abc", "def"]);

    let shown = view.borrow().clone();
    assert_eq!(shown.state, SessionState::Idle);
    assert_eq!(shown.text, "יש שני מוצרים מתאימים.");
    assert_eq!(shown.items.len(), 2);
}

#[tokio::test]
async fn stream_without_done_still_finalizes() {
    let server = MockServer::start().await;
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial [ITEMS:ghi]\"}}]}\n";
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let AskOutcome::Answered(reply) = session(&server).ask("q", &items()).await else {
        panic!("expected Answered");
    };
    assert_eq!(reply.text, "partial");
    assert_eq!(reply.items.len(), 1);
    assert_eq!(reply.items[0].id, "ghi");
}

#[tokio::test]
async fn rate_limit_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": "Too many requests, try again later."
        })))
        .mount(&server)
        .await;

    let session = session(&server);
    let outcome = session.ask("q", &items()).await;
    let AskOutcome::Failed { message, error } = outcome else {
        panic!("expected Failed, got {outcome:?}");
    };
    assert_eq!(message, "Too many requests, try again later.");
    assert!(matches!(error, AssistantError::Http { status: 429, .. }));

    let shown = session.subscribe().borrow().clone();
    assert_eq!(shown.text, "Too many requests, try again later.");
    assert!(shown.items.is_empty());
    assert_eq!(shown.state, SessionState::Idle);
}

#[tokio::test]
async fn payment_required_without_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(402))
        .mount(&server)
        .await;

    let session = session(&server).messages(AssistantMessages {
        connection_error: "connection error".into(),
        response_error: "could not get an answer".into(),
    });
    let outcome = session.ask("q", &items()).await;
    assert!(matches!(
        outcome,
        AskOutcome::Failed {
            ref message,
            error: AssistantError::Http { status: 402, message: None },
        } if message == "could not get an answer"
    ));
}

#[tokio::test]
async fn connection_failure_shows_connection_message() {
    // Nothing listens on the discard port.
    let session = AssistantSession::new(AssistantClient::new("http://127.0.0.1:9", "key"));
    let outcome = session.ask("q", &items()).await;
    let AskOutcome::Failed { message, error } = outcome else {
        panic!("expected Failed, got {outcome:?}");
    };
    assert_eq!(message, homevault_assistant::session::DEFAULT_CONNECTION_ERROR);
    assert!(error.is_transport());
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn second_ask_while_in_flight_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["first"]), "text/event-stream")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let items = items();
    let (first, second) = tokio::join!(session.ask("one", &items), session.ask("two", &items));

    assert!(matches!(first, AskOutcome::Answered(ref r) if r.text == "first"));
    assert!(matches!(second, AskOutcome::Skipped(SkipReason::Busy)));
    assert_eq!(session.subscribe().borrow().text, "first");
}

#[tokio::test]
async fn session_is_reusable_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["ok"]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let session = session(&server);
    assert!(matches!(session.ask("q", &items()).await, AskOutcome::Failed { .. }));
    assert!(matches!(
        session.ask("q", &items()).await,
        AskOutcome::Answered(ref r) if r.text == "ok"
    ));
}

#[tokio::test]
async fn close_cancels_in_flight_ask_and_clears_view() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["too late"]), "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let session = session(&server);
    let items = items();
    let (outcome, ()) = tokio::join!(session.ask("q", &items), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.state(), SessionState::Sending);
        session.close();
    });

    assert!(matches!(outcome, AskOutcome::Cancelled));
    let shown = session.subscribe().borrow().clone();
    assert_eq!(shown.text, "");
    assert_eq!(shown.state, SessionState::Idle);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn dropped_ask_future_frees_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["slow"]), "text/event-stream")
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["fast"]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let session = session(&server);
    let timed_out =
        tokio::time::timeout(Duration::from_millis(50), session.ask("q", &items())).await;
    assert!(timed_out.is_err());
    assert_eq!(session.state(), SessionState::Idle);

    let outcome = session.ask("q2", &items()).await;
    assert!(matches!(outcome, AskOutcome::Answered(ref r) if r.text == "fast"));
}

#[tokio::test]
async fn oversized_answer_fails_the_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&["0123456789", "0123456789"]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let session = session(&server).max_answer_len(15);
    let outcome = session.ask("q", &items()).await;
    assert!(matches!(
        outcome,
        AskOutcome::Failed { error: AssistantError::AnswerTooLarge { limit: 15 }, .. }
    ));
}

#[tokio::test]
async fn identify_image_returns_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/identify-image"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({ "mimeType": "image/png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "suggestions": ["מקרר סמסונג", "מקרר LG"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AssistantClient::new(server.uri(), "test-key");
    let suggestions = client.identify_image("iVBORw0KGgo=", "image/png").await.unwrap();
    assert_eq!(suggestions, ["מקרר סמסונג", "מקרר LG"]);
}

#[tokio::test]
async fn identify_image_maps_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/identify-image"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": "Too many requests, try again later."
        })))
        .mount(&server)
        .await;

    let client = AssistantClient::new(server.uri(), "test-key");
    let err = client.identify_image("AAAA", "").await.unwrap_err();
    assert_eq!(err.server_message(), Some("Too many requests, try again later."));
}
