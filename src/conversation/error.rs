use crate::ollama::OllamaError;
use crate::persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Model(#[from] OllamaError),
    #[error("chat {chat_id} is not part of conversation {conversation_id}")]
    ForeignChat { conversation_id: i64, chat_id: i64 },
    #[error("model returned an empty response for chat {chat_id}")]
    EmptyResponse { chat_id: i64 },
    #[error("rendering failed: {0}")]
    Display(String),
}
