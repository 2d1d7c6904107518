//! Transport to the assistant backend.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::capture::VoicePayload;
use crate::error::AssistantError;
use crate::listing::PropertyListing;
use crate::session::ConversationId;

pub use http::{HttpBackend, DEFAULT_BASE_URL};

/// Body of `POST /ask`.
///
/// `conversation_id` is sent as an explicit `null` until the backend has
/// issued one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub conversation_id: Option<ConversationId>,
}

/// Response shared by `/ask` and `/ask-voice`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskResponse {
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub human_response: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub object_response: Vec<PropertyListing>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PropertyListing>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PropertyListing>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trait for backends that answer text and voice questions.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AssistantError>;

    async fn ask_voice(
        &self,
        voice: VoicePayload,
        conversation_id: Option<&ConversationId>,
    ) -> Result<AskResponse, AssistantError>;
}
