use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    #[error("invalid configuration value for {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("sms send failed: {0}")]
    SmsSend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TodoError>;
