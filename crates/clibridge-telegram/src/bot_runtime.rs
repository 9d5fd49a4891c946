use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clibridge_core::{split_message, TELEGRAM_MESSAGE_LIMIT};
use clibridge_provider::{AssistantBridge, ProcessExecutorError};

use crate::bot_commands::{execute_bot_command, parse_bot_command};
use crate::chat_transport::ChatTransport;
use crate::conversation_state::ConversationState;
use crate::telegram_api::{TelegramMessage, TelegramUpdate};

pub const PLACEHOLDER_TEXT: &str = "...";
pub const EMPTY_RESPONSE_TEXT: &str = "(empty response)";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_RETRY_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotRuntimeConfig {
    pub allowed_user_id: i64,
    pub work_dir: PathBuf,
    pub max_message_chars: usize,
    pub poll_timeout_secs: u64,
    pub poll_retry_delay_ms: u64,
}

impl BotRuntimeConfig {
    pub fn new(allowed_user_id: i64, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            allowed_user_id,
            work_dir: work_dir.into(),
            max_message_chars: TELEGRAM_MESSAGE_LIMIT,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            poll_retry_delay_ms: DEFAULT_POLL_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollingSummary {
    pub updates_handled: u64,
    pub poll_failures: u64,
}

/// Polling bot serving one allowed user.
///
/// Updates are handled one at a time, so the conversation's session id is
/// never used by two CLI runs at once.
pub struct BotRuntime<T> {
    config: BotRuntimeConfig,
    bridge: AssistantBridge,
    transport: T,
    state: ConversationState,
}

impl<T: ChatTransport> BotRuntime<T> {
    pub fn new(
        config: BotRuntimeConfig,
        bridge: AssistantBridge,
        transport: T,
        state: ConversationState,
    ) -> Self {
        Self {
            config,
            bridge,
            transport,
            state,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Polls for updates until `shutdown` resolves.
    pub async fn run_polling<F>(&mut self, shutdown: F) -> PollingSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = PollingSummary::default();
        let mut offset: Option<i64> = None;
        let retry_delay = Duration::from_millis(self.config.poll_retry_delay_ms);
        tracing::info!(
            allowed_user_id = self.config.allowed_user_id,
            poll_timeout_secs = self.config.poll_timeout_secs,
            "telegram polling started"
        );

        loop {
            let fetched = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                fetched = self.transport.fetch_updates(offset, self.config.poll_timeout_secs) => fetched,
            };

            match fetched {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id.saturating_add(1));
                        self.handle_update(update).await;
                        summary.updates_handled = summary.updates_handled.saturating_add(1);
                    }
                }
                Err(error) => {
                    summary.poll_failures = summary.poll_failures.saturating_add(1);
                    tracing::warn!(error = %format!("{error:#}"), "telegram polling failed; retrying");
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(retry_delay) => {}
                    }
                }
            }
        }

        tracing::info!(
            updates_handled = summary.updates_handled,
            poll_failures = summary.poll_failures,
            "telegram polling stopped"
        );
        summary
    }

    pub async fn handle_update(&mut self, update: TelegramUpdate) {
        let Some(message) = update.message else {
            tracing::debug!(update_id = update.update_id, "skipping update without message");
            return;
        };
        let sender = message.from.as_ref().map(|user| user.id);
        if sender != Some(self.config.allowed_user_id) {
            tracing::debug!(
                update_id = update.update_id,
                sender = ?sender,
                "ignoring message from unauthorized user"
            );
            return;
        }
        self.handle_message(message).await;
    }

    async fn handle_message(&mut self, message: TelegramMessage) {
        let chat_id = message.chat.id;
        let Some(text) = message.text.filter(|text| !text.is_empty()) else {
            return;
        };

        if let Some(command) = parse_bot_command(&text) {
            tracing::info!(?command, "handling bot command");
            let reply = execute_bot_command(command, &mut self.state, &self.config.work_dir);
            self.send_chunked(chat_id, &reply).await;
            return;
        }

        self.handle_prompt(chat_id, &text).await;
    }

    async fn handle_prompt(&mut self, chat_id: i64, prompt: &str) {
        let placeholder = match self.transport.send_text(chat_id, PLACEHOLDER_TEXT).await {
            Ok(message_id) => Some(message_id),
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "failed to send placeholder message");
                None
            }
        };

        let run = self
            .bridge
            .run(prompt, self.state.mode, self.state.session_id.as_deref())
            .await;

        match run {
            Ok(result) => {
                self.state.record_run(&result);
                if let Some(message_id) = placeholder {
                    if let Err(error) = self.transport.delete_message(chat_id, message_id).await {
                        tracing::warn!(error = %format!("{error:#}"), "failed to delete placeholder message");
                    }
                }
                let text = if result.text.trim().is_empty() {
                    EMPTY_RESPONSE_TEXT
                } else {
                    result.text.as_str()
                };
                self.send_chunked(chat_id, text).await;
            }
            Err(error) => {
                let reply = match &error {
                    ProcessExecutorError::Timeout { timeout_ms } => {
                        tracing::warn!(timeout_ms, "assistant cli timed out");
                        render_timeout_message(*timeout_ms)
                    }
                    _ => {
                        tracing::error!(%error, "assistant cli run failed");
                        format!("Error: {error}")
                    }
                };
                self.replace_placeholder(chat_id, placeholder, &reply).await;
            }
        }
    }

    async fn replace_placeholder(&self, chat_id: i64, placeholder: Option<i64>, text: &str) {
        if let Some(message_id) = placeholder {
            match self.transport.edit_text(chat_id, message_id, text).await {
                Ok(()) => return,
                Err(error) => {
                    tracing::warn!(error = %format!("{error:#}"), "failed to edit placeholder message");
                }
            }
        }
        self.send_chunked(chat_id, text).await;
    }

    async fn send_chunked(&self, chat_id: i64, text: &str) {
        let parts = split_message(text, self.config.max_message_chars);
        let part_count = parts.len();
        for (index, part) in parts.iter().enumerate() {
            if let Err(error) = self.transport.send_text(chat_id, part).await {
                tracing::warn!(
                    error = %format!("{error:#}"),
                    part = index + 1,
                    part_count,
                    "failed to deliver reply part; dropping the rest"
                );
                return;
            }
        }
    }
}

/// User-facing text for a CLI run that exceeded its deadline.
pub fn render_timeout_message(timeout_ms: u64) -> String {
    let window = if timeout_ms > 0 && timeout_ms % 60_000 == 0 {
        plural(timeout_ms / 60_000, "minute")
    } else {
        plural(timeout_ms.div_ceil(1_000), "second")
    };
    format!("Timeout: CLI did not respond within {window}.")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
