use crate::{Error, Result};
use async_trait::async_trait;
use autobackup_core::MessageSink;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal Telegram Bot API client: identity check and plain text messages.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
    api_url: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl TelegramClient {
    pub fn new(token: String) -> Result<Self> {
        validate_token(&token)?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            token,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Check the token against the API (`getMe`).
    pub async fn get_me(&self) -> Result<BotUser> {
        let response = self.client.get(self.method_url("getMe")).send().await?;
        let body: ApiResponse<BotUser> = response.json().await?;

        unwrap_response(body)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        tracing::debug!("Sending Telegram message to chat {}", chat_id);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await?;

        let body: ApiResponse<serde_json::Value> = response.json().await?;
        unwrap_response(body).map(|_| ())
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn send(&self, recipient: i64, text: &str) -> autobackup_core::Result<()> {
        self.send_message(recipient, text).await?;
        Ok(())
    }
}

fn validate_token(token: &str) -> Result<()> {
    let token = token.trim();
    let valid = match token.split_once(':') {
        Some((id, secret)) => {
            !id.is_empty() && !secret.is_empty() && id.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidToken(
            "expected the form <bot id>:<secret>".to_string(),
        ))
    }
}

fn unwrap_response<T>(body: ApiResponse<T>) -> Result<T> {
    if !body.ok {
        return Err(Error::ApiError(
            body.description.unwrap_or_else(|| "request rejected".to_string()),
        ));
    }
    body.result
        .ok_or_else(|| Error::ApiError("response without result".to_string()))
}
