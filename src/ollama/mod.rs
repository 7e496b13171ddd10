pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{ChatCompletion, FragmentStream, OllamaClient};
pub use error::OllamaError;
pub use stream::{ChatStream, NdjsonStream, PullStream};
pub use types::{ModelSummary, PromptMessage, PullProgress};
