#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("{url} responded with status {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("failed to encode request body: {0}")]
    Encode(String),
    #[error("failed to read response stream: {0}")]
    StreamRead(String),
    #[error("invalid stream line `{line}`: {message}")]
    StreamLine { line: String, message: String },
    #[error("model server reported an error: {0}")]
    Server(String),
}

impl OllamaError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
