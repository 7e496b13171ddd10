use super::ConversationError;
use crate::ollama::PromptMessage;
use crate::persistence::{AgentSlot, Chat, ChatMessage, Conversation, Database, MessageFilter};
use crate::shared::ChatRole;

/// A message from either chat of a conversation, tagged with its side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub slot: AgentSlot,
    pub message: ChatMessage,
}

pub fn conversation_chats(
    db: &Database,
    conversation: &Conversation,
) -> Result<(Chat, Chat), ConversationError> {
    Ok((
        db.get_chat(conversation.agent_1_chat_id)?,
        db.get_chat(conversation.agent_2_chat_id)?,
    ))
}

/// Assistant and system messages of both chats, oldest first.
pub fn merged_history(
    db: &Database,
    conversation: &Conversation,
) -> Result<Vec<HistoryEntry>, ConversationError> {
    let filter = MessageFilter::default()
        .chats(conversation.chat_ids())
        .roles([ChatRole::Assistant, ChatRole::System]);
    db.find_messages(&filter)?
        .into_iter()
        .map(|message| {
            let slot = conversation.slot_of(message.chat_id).ok_or(
                ConversationError::ForeignChat {
                    conversation_id: conversation.id,
                    chat_id: message.chat_id,
                },
            )?;
            Ok(HistoryEntry { slot, message })
        })
        .collect()
}

pub fn prompt_history(db: &Database, chat_id: i64) -> Result<Vec<PromptMessage>, ConversationError> {
    Ok(db
        .chat_history(chat_id)?
        .into_iter()
        .map(|message| PromptMessage::new(message.role, message.content))
        .collect())
}
