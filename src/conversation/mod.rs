pub mod chat;
pub mod driver;
pub mod error;
pub mod history;
pub mod turn;

pub use chat::{
    clean_chat_name, reply_to_user, suggest_chat_name, ChatExchange, CHAT_NAME_REQUEST,
};
pub use driver::{
    inject_system_message, run_conversation, OperatorChoice, RunOptions, RunSummary,
    TurnLimit, TurnObserver, DEMO_TURNS,
};
pub use error::ConversationError;
pub use history::{conversation_chats, merged_history, prompt_history, HistoryEntry};
pub use turn::{next_sender, take_turn, FragmentSink, TurnOutcome};
