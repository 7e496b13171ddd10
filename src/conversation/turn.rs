use super::history::prompt_history;
use super::ConversationError;
use crate::ollama::{ChatCompletion, PromptMessage};
use crate::persistence::{
    AgentSlot, Chat, ChatMessage, Conversation, Database, MessageFilter, NewChatMessage,
};
use crate::shared::ChatRole;
use tracing::{debug, info};

/// Receives streamed fragments as they arrive. An error aborts the turn
/// before anything is persisted.
pub type FragmentSink<'a> = dyn FnMut(&str) -> Result<(), String> + 'a;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub sender_message: ChatMessage,
    pub responder_message: ChatMessage,
}

/// Agent 1 speaks unless agent 1 authored the latest assistant message.
pub fn next_sender(db: &Database, conversation: &Conversation) -> Result<AgentSlot, ConversationError> {
    let latest = db.latest_message(
        &MessageFilter::default()
            .chats(conversation.chat_ids())
            .role(ChatRole::Assistant),
    )?;
    let slot = match latest {
        Some(message) if message.chat_id == conversation.agent_2_chat_id => AgentSlot::One,
        Some(_) => AgentSlot::Two,
        None => AgentSlot::One,
    };
    debug!(conversation = conversation.id, next = %slot, "resolved next sender");
    Ok(slot)
}

/// Streams the collected fragments to `sink` while accumulating them.
pub(crate) fn collect_stream<C: ChatCompletion + ?Sized>(
    backend: &C,
    model: &str,
    history: &[PromptMessage],
    sink: &mut FragmentSink<'_>,
) -> Result<String, ConversationError> {
    let mut response = String::new();
    for fragment in backend.stream_chat(model, history)? {
        let fragment = fragment?;
        sink(&fragment).map_err(ConversationError::Display)?;
        response.push_str(&fragment);
    }
    Ok(response)
}

/// One turn: the sender answers its own history; the answer is stored as an
/// assistant message on the sender and mirrored as a user message on the
/// responder.
pub fn take_turn<C: ChatCompletion + ?Sized>(
    db: &mut Database,
    backend: &C,
    sender: &Chat,
    responder: &Chat,
    sink: &mut FragmentSink<'_>,
) -> Result<TurnOutcome, ConversationError> {
    let history = prompt_history(db, sender.id)?;
    let response = collect_stream(backend, &sender.default_model, &history, sink)?;

    let assistant = NewChatMessage::assistant(sender.id, response.clone(), &sender.default_model)?;
    let mirrored = NewChatMessage::user(responder.id, response);
    let (sender_message, responder_message) = db.insert_message_pair(&assistant, &mirrored)?;

    info!(
        sender = sender.id,
        responder = responder.id,
        model = %sender.default_model,
        chars = sender_message.content.len(),
        "turn completed"
    );
    Ok(TurnOutcome {
        sender_message,
        responder_message,
    })
}
