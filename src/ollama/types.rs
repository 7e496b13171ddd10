use crate::shared::ChatRole;
use serde::{Deserialize, Serialize};

/// One role/content pair of the history sent with a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: ChatRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ModelList {
    #[serde(default)]
    pub(crate) models: Vec<ModelSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
}

impl ModelSummary {
    /// Identifier to pass back to chat requests.
    pub fn identifier(&self) -> &str {
        if self.model.is_empty() {
            &self.name
        } else {
            &self.model
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
}

impl PullProgress {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: &'a [PromptMessage],
    pub(crate) stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModelRequest<'a> {
    pub(crate) model: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PullRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) stream: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ChatChunkMessage {
    #[serde(default)]
    pub(crate) content: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub(crate) message: Option<ChatChunkMessage>,
    #[serde(default)]
    pub(crate) done: bool,
}

/// Every streamed line may carry an `error` next to the payload fields.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamEnvelope<T> {
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(flatten)]
    pub(crate) data: T,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_summary_prefers_model_field() {
        let summary: ModelSummary =
            serde_json::from_str(r#"{"name":"llama3:latest","model":"llama3:8b"}"#)
                .expect("decode");
        assert_eq!(summary.identifier(), "llama3:8b");

        let summary: ModelSummary =
            serde_json::from_str(r#"{"name":"mistral:latest"}"#).expect("decode");
        assert_eq!(summary.identifier(), "mistral:latest");
    }

    #[test]
    fn chat_request_serializes_roles_in_lowercase() {
        let messages = vec![
            PromptMessage::new(ChatRole::System, "be terse"),
            PromptMessage::new(ChatRole::User, "hi"),
        ];
        let body = serde_json::to_value(ChatRequest {
            model: "m1",
            messages: &messages,
            stream: true,
        })
        .expect("encode");
        assert_eq!(
            body,
            serde_json::json!({
                "model": "m1",
                "messages": [
                    {"role": "system", "content": "be terse"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": true
            })
        );
    }
}
