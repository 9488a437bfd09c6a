use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid bot token: {0}")]
    InvalidToken(String),

    #[error("Telegram API error: {0}")]
    ApiError(String),

    #[error("Request error: {0}")]
    Request(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Request URLs carry the bot token, so they never reach error text.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.without_url())
    }
}

impl From<Error> for autobackup_core::Error {
    fn from(err: Error) -> Self {
        autobackup_core::Error::Delivery(err.to_string())
    }
}
