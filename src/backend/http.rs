//! reqwest client for the `/ask` and `/ask-voice` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};

use super::{AskRequest, AskResponse, AssistantBackend};
use crate::capture::VoicePayload;
use crate::error::AssistantError;
use crate::session::ConversationId;

/// Deployment the assistant web client talks to out of the box.
pub const DEFAULT_BASE_URL: &str = "http://34.72.28.241:8989";

const ASK_PATH: &str = "ask";
const ASK_VOICE_PATH: &str = "ask-voice";
const JSON_MIME: &str = "application/json";
const VOICE_FIELD: &str = "voice";
const CONVERSATION_FIELD: &str = "conversation_id";

/// HTTP client for the assistant backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    timeout_seconds: Option<u64>,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Scheme and host of the backend, optionally with a path prefix
    /// * `timeout_seconds` - Per-request timeout; `None` waits indefinitely
    pub fn new(base_url: &str, timeout_seconds: Option<u64>) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AssistantError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(client, base_url, timeout_seconds)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, AssistantError> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn endpoint(&self, path: &str) -> Result<Url, AssistantError> {
        self.base_url
            .join(path)
            .map_err(|e| AssistantError::InvalidRequest(e.to_string()))
    }

    fn apply_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout_seconds {
            Some(timeout) => request.timeout(Duration::from_secs(timeout)),
            None => request,
        }
    }

    fn log_request_payload<T: Serialize>(&self, label: &str, body: &T) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        if let Ok(json) = serde_json::to_string(body) {
            log::trace!("{label}: {json}");
        }
    }

    async fn ensure_success_response(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, AssistantError> {
        log::debug!("{context} HTTP status: {}", response.status());
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::warn!("{context} returned error status: {status}");
        Err(AssistantError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_and_parse<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, AssistantError> {
        let request = self.apply_timeout(request.header(ACCEPT, JSON_MIME));
        let response = request.send().await.map_err(|e| {
            log::warn!("{context} request failed: {e}");
            AssistantError::from(e)
        })?;
        let response = self.ensure_success_response(response, context).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| AssistantError::ResponseFormatError {
            message: format!("Failed to decode {context} response: {e}"),
            raw_response: text,
        })
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AssistantError> {
        let url = self.endpoint(ASK_PATH)?;
        self.log_request_payload("ask", request);
        let builder = self.client.post(url).json(request);
        self.send_and_parse(builder, "ask").await
    }

    async fn ask_voice(
        &self,
        voice: VoicePayload,
        conversation_id: Option<&ConversationId>,
    ) -> Result<AskResponse, AssistantError> {
        let url = self.endpoint(ASK_VOICE_PATH)?;
        log::debug!(
            "ask-voice upload: {} bytes ({}), conversation {:?}",
            voice.len(),
            voice.mime_type(),
            conversation_id.map(ConversationId::as_str)
        );
        let file_name = voice.file_name().to_string();
        let mime_type = voice.mime_type().to_string();
        let part = Part::bytes(voice.into_bytes())
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|e| AssistantError::InvalidRequest(e.to_string()))?;
        let mut form = Form::new().part(VOICE_FIELD, part);
        if let Some(id) = conversation_id {
            form = form.text(CONVERSATION_FIELD, id.to_string());
        }
        let builder = self.client.post(url).multipart(form);
        self.send_and_parse(builder, "ask-voice").await
    }
}

/// Parses the base URL and makes sure it ends with `/` so endpoint paths
/// join under any prefix instead of replacing its last segment.
fn normalize_base_url(raw: &str) -> Result<Url, AssistantError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AssistantError::InvalidRequest(
            "backend base URL is empty".to_string(),
        ));
    }
    let mut url =
        Url::parse(trimmed).map_err(|e| AssistantError::InvalidRequest(format!("{trimmed}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const MARINA_RESPONSE: &str = r#"{
        "conversation_id": "abc123",
        "human_response": "Here are some options:",
        "object_response": [{"name": "Marina Heights", "price": {"from": 1200000}}]
    }"#;

    #[test]
    fn base_url_gets_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8989/api", None).unwrap();
        assert_eq!(
            backend.endpoint(ASK_PATH).unwrap().as_str(),
            "http://localhost:8989/api/ask"
        );
        let backend = HttpBackend::new("http://localhost:8989", Some(5)).unwrap();
        assert_eq!(
            backend.endpoint(ASK_VOICE_PATH).unwrap().as_str(),
            "http://localhost:8989/ask-voice"
        );
        assert_eq!(backend.timeout_seconds(), Some(5));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpBackend::new("   ", None),
            Err(AssistantError::InvalidRequest(_))
        ));
        assert!(matches!(
            HttpBackend::new("not a url", None),
            Err(AssistantError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn ask_posts_question_and_conversation_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask")
            .match_header("accept", JSON_MIME)
            .match_body(Matcher::Json(json!({
                "question": "Show me 2-bedroom apartments in Dubai Marina",
                "conversation_id": null
            })))
            .with_status(200)
            .with_header("content-type", JSON_MIME)
            .with_body(MARINA_RESPONSE)
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url(), Some(5)).unwrap();
        let response = backend
            .ask(&AskRequest {
                question: "Show me 2-bedroom apartments in Dubai Marina".to_string(),
                conversation_id: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.conversation_id.as_str(), "abc123");
        assert_eq!(response.human_response, "Here are some options:");
        assert_eq!(response.object_response.len(), 1);
        assert_eq!(response.object_response[0].price_from(), Some(1_200_000.0));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url(), None).unwrap();
        let err = backend
            .ask(&AskRequest {
                question: "hello".to_string(),
                conversation_id: Some(ConversationId::from("abc123")),
            })
            .await
            .unwrap_err();

        assert!(err.is_connectivity());
        match err {
            AssistantError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_format_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url(), None).unwrap();
        let err = backend
            .ask(&AskRequest {
                question: "hello".to_string(),
                conversation_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AssistantError::ResponseFormatError { ref raw_response, .. }
                if raw_response == "<html>gateway</html>"
        ));
    }

    #[tokio::test]
    async fn ask_voice_uploads_multipart_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask-voice")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="voice"; filename="voice.wav""#.to_string()),
                Matcher::Regex("audio/wav".to_string()),
                Matcher::Regex("RIFFdata".to_string()),
                Matcher::Regex(r#"name="conversation_id""#.to_string()),
                Matcher::Regex("abc123".to_string()),
            ]))
            .with_status(200)
            .with_body(MARINA_RESPONSE)
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url(), None).unwrap();
        let id = ConversationId::from("abc123");
        let response = backend
            .ask_voice(VoicePayload::wav(b"RIFFdata".to_vec()), Some(&id))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.conversation_id, id);
    }

    #[tokio::test]
    async fn ask_voice_surfaces_transport_failure() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Some(2)).unwrap();
        let err = backend
            .ask_voice(VoicePayload::empty_wav(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::HttpError(_)));
        assert!(err.is_connectivity());
    }
}
