pub mod logging;
pub mod role;
pub mod time;

pub use role::{ChatRole, ALL_CHAT_ROLES};
