use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to open file: {0}")]
    OpenFailed(String),

    #[error("unrecognized image format: {0}")]
    UnknownFormat(String),

    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("invalid pixel buffer: {0}")]
    Buffer(#[from] subtone_core::CoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;
