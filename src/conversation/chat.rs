use super::history::prompt_history;
use super::turn::{collect_stream, FragmentSink};
use super::ConversationError;
use crate::ollama::{ChatCompletion, PromptMessage};
use crate::persistence::{Chat, ChatMessage, Database, NewChatMessage};
use crate::shared::ChatRole;
use tracing::info;

pub const CHAT_NAME_REQUEST: &str = "Based on your last response generate a name for this chat. \
Respond with only the name and nothing else. \
Do not include any extra words, explanations, or formatting, just the name. \
If you include anything other than the name, the response is invalid.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

/// Sends `content` as a user message to one chat and stores the streamed
/// reply. Neither message is stored when the stream fails.
pub fn reply_to_user<C: ChatCompletion + ?Sized>(
    db: &mut Database,
    backend: &C,
    chat: &Chat,
    content: &str,
    model: Option<&str>,
    sink: &mut FragmentSink<'_>,
) -> Result<ChatExchange, ConversationError> {
    let model = model
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .unwrap_or(&chat.default_model)
        .to_string();
    let mut history = prompt_history(db, chat.id)?;
    history.push(PromptMessage::new(ChatRole::User, content));

    let response = collect_stream(backend, &model, &history, sink)?;

    let user = NewChatMessage::user(chat.id, content);
    let assistant = NewChatMessage::assistant(chat.id, response, &model)?;
    let (user_message, assistant_message) = db.insert_message_pair(&user, &assistant)?;
    info!(chat = chat.id, model = %model, "chat reply stored");
    Ok(ChatExchange {
        user_message,
        assistant_message,
    })
}

/// Asks the chat's model to name the chat and stores the cleaned answer.
pub fn suggest_chat_name<C: ChatCompletion + ?Sized>(
    db: &Database,
    backend: &C,
    chat: &mut Chat,
) -> Result<String, ConversationError> {
    let mut history = prompt_history(db, chat.id)?;
    history.push(PromptMessage::new(ChatRole::User, CHAT_NAME_REQUEST));
    let raw = backend.complete_chat(&chat.default_model, &history)?;
    let name = clean_chat_name(&raw);
    if name.is_empty() {
        return Err(ConversationError::EmptyResponse { chat_id: chat.id });
    }
    chat.name = Some(name.clone());
    db.save_chat(chat)?;
    Ok(name)
}

pub fn clean_chat_name(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    line.trim_end_matches('.')
        .trim_matches(|ch: char| matches!(ch, '"' | '\'' | '*' | '`' | '#'))
        .trim()
        .to_string()
}
