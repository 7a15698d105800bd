use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("voice error: {0}")]
    Voice(#[from] handoff_voice::VoiceError),

    #[error("store error: {0}")]
    Store(#[from] handoff_store::StoreError),

    #[error("model runtime error: {0}")]
    Runtime(String),

    #[error("model runtime request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid agent configuration: {0}")]
    Config(String),

    #[error("tool bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
}
