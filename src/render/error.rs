#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid selection `{0}`")]
    InvalidSelection(String),
}
