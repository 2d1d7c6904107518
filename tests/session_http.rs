use std::sync::Arc;

use estate_chat::capture::VoicePayload;
use estate_chat::session::{CONNECTIVITY_ERROR, TEXT_FAILURE_NOTICE};
use estate_chat::{HttpBackend, Role, SessionManager};
use mockito::Matcher;
use serde_json::json;

const QUESTION: &str = "Show me 2-bedroom apartments in Dubai Marina";

fn marina_body() -> String {
    json!({
        "conversation_id": "abc123",
        "human_response": "Here are some options:",
        "object_response": [{
            "name": "Marina Heights",
            "location": {"full_name": "Dubai Marina, Dubai"},
            "price": {"from": 1200000},
            "bedrooms": [2]
        }]
    })
    .to_string()
}

#[tokio::test]
async fn conversation_id_flows_between_requests() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", "/ask")
        .match_body(Matcher::Json(json!({
            "question": QUESTION,
            "conversation_id": null
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(marina_body())
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/ask")
        .match_body(Matcher::Json(json!({
            "question": "Which one is cheapest?",
            "conversation_id": "abc123"
        })))
        .with_status(200)
        .with_body(
            json!({
                "conversation_id": "abc123",
                "human_response": "Marina Heights starts lowest.",
                "object_response": []
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), Some(5)).unwrap();
    let mut session = SessionManager::new(Arc::new(backend));

    assert!(session.send_text(QUESTION).await.is_answered());
    assert_eq!(session.state().len(), 2);
    let reply = &session.state().messages()[1];
    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.listings()[0].location_name(), Some("Dubai Marina, Dubai"));

    assert!(session.send_text("Which one is cheapest?").await.is_answered());
    assert_eq!(session.state().len(), 4);

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn server_error_leaves_session_usable() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", "/ask")
        .match_body(Matcher::PartialJson(json!({"question": QUESTION})))
        .with_status(200)
        .with_body(marina_body())
        .create_async()
        .await;
    let failing = server
        .mock("POST", "/ask")
        .match_body(Matcher::PartialJson(json!({"question": "and townhouses?"})))
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), None).unwrap();
    let mut session = SessionManager::new(Arc::new(backend));

    session.send_text(QUESTION).await;
    session.send_text("and townhouses?").await;

    let state = session.state();
    assert_eq!(state.len(), 4);
    assert_eq!(state.messages()[3].text(), TEXT_FAILURE_NOTICE);
    assert_eq!(state.last_error(), Some(CONNECTIVITY_ERROR));
    assert_eq!(state.conversation_id().map(|id| id.as_str()), Some("abc123"));
    assert!(!state.last_error().unwrap_or_default().contains("500"));

    ok.assert_async().await;
    failing.assert_async().await;
}

#[tokio::test]
async fn voice_upload_reaches_voice_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ask-voice")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::Regex(r#"name="voice""#.to_string()))
        .with_status(200)
        .with_body(marina_body())
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), None).unwrap();
    let mut session = SessionManager::new(Arc::new(backend));

    assert!(session.send_voice(VoicePayload::wav(b"RIFFvoice".to_vec())).await.is_answered());
    assert_eq!(session.state().len(), 1);
    assert_eq!(
        session.state().conversation_id().map(|id| id.as_str()),
        Some("abc123")
    );
    mock.assert_async().await;
}
