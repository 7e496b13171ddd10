pub mod chats;
pub mod conversations;
pub mod database;
pub mod error;
pub mod filter;
pub mod messages;
pub mod records;

pub use database::Database;
pub use error::PersistenceError;
pub use filter::{ChatFilter, ConversationFilter, MessageFilter};
pub use records::{
    AgentSlot, Chat, ChatMessage, Conversation, NewChat, NewChatMessage, NewConversation,
};
