use crate::app::command_support::{success, CommandContext};
use crate::conversation::{reply_to_user, suggest_chat_name};
use crate::persistence::{AgentSlot, ChatMessage, ConversationFilter, MessageFilter};
use crate::render::ChatBubble;
use crate::shared::time::format_millis;
use crate::shared::ChatRole;
use tracing::info;

/// Outside a conversation the operator's messages sit on the right.
fn chat_slot(message: &ChatMessage) -> AgentSlot {
    if message.role.is_user() {
        AgentSlot::One
    } else {
        AgentSlot::Two
    }
}

pub fn format_chat_history(messages: &[ChatMessage]) -> String {
    let mut blocks = Vec::with_capacity(messages.len());
    for message in messages {
        let actor = message.actor();
        blocks.push(format!(
            "{actor}\n{}\n{}",
            "-".repeat(actor.chars().count()),
            message.content
        ));
    }
    blocks.join("\n\n")
}

pub fn cmd_list_chats(context: &CommandContext) -> Result<String, String> {
    let db = context.open_database()?;
    let chats = db.list_chats().map_err(|e| e.to_string())?;
    if chats.is_empty() {
        return Ok("No chats found.".to_string());
    }
    let mut lines = Vec::with_capacity(chats.len());
    for chat in chats {
        let messages = db
            .count_messages(&MessageFilter::for_chat(chat.id))
            .map_err(|e| e.to_string())?;
        lines.push(format!(
            "{}  {}  model {}  messages {}  updated {}",
            chat.id,
            chat.display_name(),
            chat.default_model,
            messages,
            format_millis(chat.updated_at)
        ));
    }
    Ok(lines.join("\n"))
}

pub fn cmd_remove_chat(context: &CommandContext, chat_id: i64) -> Result<String, String> {
    let db = context.open_database()?;
    db.get_chat(chat_id).map_err(|e| e.to_string())?;
    let conversations = db
        .find_conversations(&ConversationFilter::involving(chat_id))
        .map_err(|e| e.to_string())?;
    if !conversations.is_empty() {
        let ids = conversations
            .iter()
            .map(|conversation| conversation.id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "chat {chat_id} is part of conversation(s) {ids}; remove them first"
        ));
    }
    db.delete_chat(chat_id).map_err(|e| e.to_string())?;
    info!(chat = chat_id, "chat removed");
    Ok(success(format!("Chat {chat_id} was removed.")))
}

pub fn cmd_list_chat_history(context: &CommandContext, chat_id: i64) -> Result<String, String> {
    let db = context.open_database()?;
    db.get_chat(chat_id).map_err(|e| e.to_string())?;
    let history = db.chat_history(chat_id).map_err(|e| e.to_string())?;
    if history.is_empty() {
        return Ok(format!("Chat {chat_id} has no messages."));
    }
    Ok(format_chat_history(&history))
}

pub fn cmd_chat(
    context: &CommandContext,
    chat_id: i64,
    content: &str,
    model: Option<&str>,
) -> Result<String, String> {
    if content.trim().is_empty() {
        return Err("--content must not be empty".to_string());
    }
    let mut db = context.open_database()?;
    let chat = db.get_chat(chat_id).map_err(|e| e.to_string())?;
    let client = context.model_client();
    let mut view = context.view()?;

    for message in db.chat_history(chat_id).map_err(|e| e.to_string())? {
        view.show_bubble(&ChatBubble::from_message(chat_slot(&message), &message))
            .map_err(|e| e.to_string())?;
    }
    view.show_bubble(&ChatBubble::new(
        AgentSlot::One,
        ChatRole::User,
        "You",
        content,
    ))
    .map_err(|e| e.to_string())?;

    let answering = model
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .unwrap_or(&chat.default_model);
    view.begin_stream(ChatBubble::new(
        AgentSlot::Two,
        ChatRole::Assistant,
        answering,
        "",
    ))
    .map_err(|e| e.to_string())?;

    let result = {
        let view = &mut view;
        reply_to_user(&mut db, &client, &chat, content, model, &mut |fragment: &str| {
            view.push_fragment(fragment).map_err(|e| e.to_string())
        })
    };
    let exchange = match result {
        Ok(exchange) => exchange,
        Err(err) => {
            view.abandon_stream().map_err(|e| e.to_string())?;
            return Err(err.to_string());
        }
    };
    view.finish_stream().map_err(|e| e.to_string())?;
    Ok(success(format!(
        "Reply from {} stored in chat {chat_id}.",
        exchange.assistant_message.actor()
    )))
}

pub fn cmd_name_chat(context: &CommandContext, chat_id: i64) -> Result<String, String> {
    let db = context.open_database()?;
    let mut chat = db.get_chat(chat_id).map_err(|e| e.to_string())?;
    let name = suggest_chat_name(&db, &context.model_client(), &mut chat)
        .map_err(|e| e.to_string())?;
    info!(chat = chat_id, name = %name, "chat named");
    Ok(success(format!("Chat {chat_id} is now named \"{name}\".")))
}
