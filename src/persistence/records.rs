use super::PersistenceError;
use crate::shared::ChatRole;

/// Which side of a conversation a chat sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentSlot {
    One,
    Two,
}

impl AgentSlot {
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl std::fmt::Display for AgentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent {}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub default_model: String,
    pub name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chat {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("chat {}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
    pub default_model: String,
    pub name: Option<String>,
}

impl NewChat {
    pub fn new(default_model: impl Into<String>) -> Result<Self, PersistenceError> {
        let chat = Self {
            default_model: default_model.into(),
            name: None,
        };
        chat.validate()?;
        Ok(chat)
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        validate_model_name(&self.default_model)
    }
}

pub(crate) fn validate_model_name(model: &str) -> Result<(), PersistenceError> {
    if model.trim().is_empty() {
        return Err(PersistenceError::Validation(
            "default model must be non-empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    pub role: ChatRole,
    pub content: String,
    pub model: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ChatMessage {
    /// Heading used when printing a chat transcript.
    pub fn actor(&self) -> &str {
        match self.role {
            ChatRole::System => "system",
            ChatRole::Assistant => self.model.as_deref().unwrap_or("assistant"),
            ChatRole::User => "You",
        }
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        validate_message_model(self.role, self.model.as_deref())
    }
}

/// A message that has not been stored yet. Assistant messages must name the
/// model that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub chat_id: i64,
    pub role: ChatRole,
    pub content: String,
    pub model: Option<String>,
}

impl NewChatMessage {
    pub fn new(
        chat_id: i64,
        role: ChatRole,
        content: impl Into<String>,
        model: Option<String>,
    ) -> Result<Self, PersistenceError> {
        let message = Self {
            chat_id,
            role,
            content: content.into(),
            model,
        };
        message.validate()?;
        Ok(message)
    }

    pub fn system(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            role: ChatRole::System,
            content: content.into(),
            model: None,
        }
    }

    pub fn user(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            role: ChatRole::User,
            content: content.into(),
            model: None,
        }
    }

    pub fn assistant(
        chat_id: i64,
        content: impl Into<String>,
        model: &str,
    ) -> Result<Self, PersistenceError> {
        Self::new(
            chat_id,
            ChatRole::Assistant,
            content,
            Some(model.to_string()),
        )
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        validate_message_model(self.role, self.model.as_deref())
    }
}

fn validate_message_model(role: ChatRole, model: Option<&str>) -> Result<(), PersistenceError> {
    if role.is_assistant() && model.map(str::trim).unwrap_or_default().is_empty() {
        return Err(PersistenceError::Validation(
            "model must be set for assistant messages".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: i64,
    pub agent_1_chat_id: i64,
    pub agent_2_chat_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn chat_ids(&self) -> [i64; 2] {
        [self.agent_1_chat_id, self.agent_2_chat_id]
    }

    pub fn chat_id_for(&self, slot: AgentSlot) -> i64 {
        match slot {
            AgentSlot::One => self.agent_1_chat_id,
            AgentSlot::Two => self.agent_2_chat_id,
        }
    }

    pub fn slot_of(&self, chat_id: i64) -> Option<AgentSlot> {
        if chat_id == self.agent_1_chat_id {
            Some(AgentSlot::One)
        } else if chat_id == self.agent_2_chat_id {
            Some(AgentSlot::Two)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewConversation {
    pub agent_1_chat_id: i64,
    pub agent_2_chat_id: i64,
}

impl NewConversation {
    pub fn new(agent_1_chat_id: i64, agent_2_chat_id: i64) -> Result<Self, PersistenceError> {
        let conversation = Self {
            agent_1_chat_id,
            agent_2_chat_id,
        };
        conversation.validate()?;
        Ok(conversation)
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.agent_1_chat_id == self.agent_2_chat_id {
            return Err(PersistenceError::Validation(
                "a conversation needs two distinct chats".to_string(),
            ));
        }
        Ok(())
    }
}
