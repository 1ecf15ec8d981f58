use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Encode failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;
