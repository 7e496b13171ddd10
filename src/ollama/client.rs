use super::stream::{ChatStream, PullStream};
use super::types::{
    ChatChunk, ChatRequest, ErrorBody, ModelList, ModelRequest, ModelSummary, PromptMessage,
    PullRequest,
};
use super::OllamaError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub type FragmentStream<'a> = Box<dyn Iterator<Item = Result<String, OllamaError>> + 'a>;

/// Chat completion seam used by the turn engine.
pub trait ChatCompletion {
    fn stream_chat<'a>(
        &'a self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<FragmentStream<'a>, OllamaError>;

    fn complete_chat(&self, model: &str, messages: &[PromptMessage])
        -> Result<String, OllamaError>;
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    host: String,
    agent: ureq::Agent,
}

impl OllamaClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            agent: ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .build(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.host.trim_end_matches('/'), path)
    }

    pub fn list_models(&self) -> Result<Vec<ModelSummary>, OllamaError> {
        let url = self.endpoint("tags");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| request_error(&url, err))?;
        let list: ModelList = decode_json(&url, response)?;
        Ok(list.models)
    }

    pub fn show_model(&self, model: &str) -> Result<serde_json::Value, OllamaError> {
        let url = self.endpoint("show");
        let response = self.post(&url, &ModelRequest { model })?;
        decode_json(&url, response)
    }

    /// Starts a download; progress events arrive as the server reports them.
    pub fn pull_model(&self, model: &str) -> Result<PullStream, OllamaError> {
        let url = self.endpoint("pull");
        let response = self.post(
            &url,
            &PullRequest {
                model,
                stream: true,
            },
        )?;
        Ok(PullStream::from_reader(response.into_reader()))
    }

    pub fn delete_model(&self, model: &str) -> Result<(), OllamaError> {
        let url = self.endpoint("delete");
        let body = encode(&ModelRequest { model })?;
        self.agent
            .delete(&url)
            .send_json(body)
            .map_err(|err| request_error(&url, err))?;
        Ok(())
    }

    pub fn chat(&self, model: &str, messages: &[PromptMessage]) -> Result<String, OllamaError> {
        let url = self.endpoint("chat");
        let response = self.post(
            &url,
            &ChatRequest {
                model,
                messages,
                stream: false,
            },
        )?;
        let chunk: ChatChunk = decode_json(&url, response)?;
        Ok(chunk.message.map(|message| message.content).unwrap_or_default())
    }

    pub fn chat_stream(
        &self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<ChatStream, OllamaError> {
        let url = self.endpoint("chat");
        debug!(model, messages = messages.len(), "starting streamed chat");
        let response = self.post(
            &url,
            &ChatRequest {
                model,
                messages,
                stream: true,
            },
        )?;
        Ok(ChatStream::from_reader(response.into_reader()))
    }

    fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<ureq::Response, OllamaError> {
        let body = encode(body)?;
        self.agent
            .post(url)
            .send_json(body)
            .map_err(|err| request_error(url, err))
    }
}

impl ChatCompletion for OllamaClient {
    fn stream_chat<'a>(
        &'a self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<FragmentStream<'a>, OllamaError> {
        Ok(Box::new(self.chat_stream(model, messages)?))
    }

    fn complete_chat(
        &self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<String, OllamaError> {
        self.chat(model, messages)
    }
}

fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, OllamaError> {
    serde_json::to_value(body).map_err(|err| OllamaError::Encode(err.to_string()))
}

fn decode_json<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, OllamaError> {
    response.into_json::<T>().map_err(|err| OllamaError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

fn request_error(url: &str, err: ureq::Error) -> OllamaError {
    match err {
        ureq::Error::Status(status, response) => {
            let raw = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| raw.trim().to_string());
            OllamaError::Status {
                url: url.to_string(),
                status,
                message,
            }
        }
        ureq::Error::Transport(transport) => OllamaError::Request {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}
