//! Minimal Telegram Bot API client.
//!
//! Every call goes through [`TelegramBotApi::call`], which unwraps the
//! `{ok, result, description}` envelope. Request errors are reported without
//! the request URL because it embeds the bot token.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chat_transport::ChatTransport;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const POLL_REQUEST_SLACK_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    pub from: Option<TelegramUser>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelegramUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramBotApi {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramBotApi {
    /// Builds a client whose request timeout covers a `poll_timeout_secs` long poll.
    pub fn new(api_base: &str, token: &str, poll_timeout_secs: u64) -> Result<Self> {
        let api_base = api_base.trim().trim_end_matches('/');
        if api_base.is_empty() {
            bail!("telegram api base cannot be empty");
        }
        let token = token.trim();
        if token.is_empty() {
            bail!("telegram bot token cannot be empty");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(
                poll_timeout_secs.saturating_add(POLL_REQUEST_SLACK_SECS),
            ))
            .build()
            .context("failed to build telegram http client")?;
        Ok(Self {
            client,
            api_base: api_base.to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|error| anyhow!("telegram {method} request failed: {}", error.without_url()))?;
        let status = response.status();
        let envelope = response
            .json::<TelegramApiEnvelope<T>>()
            .await
            .map_err(|error| {
                anyhow!(
                    "telegram {method} returned an unreadable body (status {status}): {}",
                    error.without_url()
                )
            })?;
        if !envelope.ok {
            bail!(
                "telegram {method} failed (status {status}): {}",
                envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string())
            );
        }
        envelope
            .result
            .ok_or_else(|| anyhow!("telegram {method} response missing result"))
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", body).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<TelegramMessage> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "disable_web_page_preview": true,
            }),
        )
        .await
    }

    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.call::<Value>(
            "editMessageText",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "text": text,
            }),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        self.call::<Value>(
            "deleteMessage",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
            }),
        )
        .await
        .map(|_| ())
    }

    /// Registers the bot's command menu.
    pub async fn set_my_commands(&self, commands: &[(&str, &str)]) -> Result<()> {
        let commands: Vec<Value> = commands
            .iter()
            .map(|(command, description)| json!({"command": command, "description": description}))
            .collect();
        self.call::<Value>("setMyCommands", json!({ "commands": commands }))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ChatTransport for TelegramBotApi {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        self.get_updates(offset, timeout_secs).await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64> {
        self.send_message(chat_id, text)
            .await
            .map(|message| message.message_id)
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.edit_message_text(chat_id, message_id, text).await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        TelegramBotApi::delete_message(self, chat_id, message_id).await
    }
}
