use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("effect {effect} has no parameter named {name}")]
    UnknownParameter { effect: String, name: String },

    #[error("parameter {name} expects a {expected} value")]
    ParameterTypeMismatch { name: String, expected: &'static str },

    #[error("{value:?} is not a valid choice for {name}")]
    InvalidChoice { name: String, value: String },

    #[error("RGBA data length {actual} doesn't match expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("pipeline scheduler has shut down")]
    SchedulerClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
