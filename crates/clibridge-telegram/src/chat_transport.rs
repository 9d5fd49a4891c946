use anyhow::Result;
use async_trait::async_trait;

use crate::telegram_api::TelegramUpdate;

#[async_trait]
/// Chat operations the bot runtime depends on.
pub trait ChatTransport: Send + Sync {
    /// Long-polls for updates starting at `offset`.
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>>;

    /// Sends `text` and returns the new message id.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64>;

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;
}
