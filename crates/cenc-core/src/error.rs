use thiserror::Error;

pub type CencResult<T> = Result<T, CencError>;

#[derive(Debug, Error)]
pub enum CencError {
    #[error("format error: {0}")]
    Format(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("master key error: {0}")]
    MasterKey(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("seek error: {0}")]
    Seek(String),

    #[error("truncate error: {0}")]
    Truncate(String),

    #[error("channel is closed")]
    Closed,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
