use std::path::PathBuf;

use clap::Parser;
use clibridge_core::TELEGRAM_MESSAGE_LIMIT;
use clibridge_provider::{DEFAULT_CLI_EXECUTABLE, DEFAULT_RUN_TIMEOUT_MS};
use clibridge_telegram::{
    DEFAULT_POLL_RETRY_DELAY_MS, DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_TELEGRAM_API_BASE,
};

use crate::cli_types::CliAccessMode;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_message_chars(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if !(1..=TELEGRAM_MESSAGE_LIMIT).contains(&parsed) {
        return Err(format!(
            "value must be in range 1..={TELEGRAM_MESSAGE_LIMIT}"
        ));
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "clibridge",
    about = "Telegram bot that relays one user's messages to the claude CLI",
    version
)]
pub struct Cli {
    #[arg(
        long = "bot-token",
        env = "CLIBRIDGE_BOT_TOKEN",
        hide_env_values = true,
        help = "Telegram Bot API token"
    )]
    pub bot_token: String,

    #[arg(
        long = "allowed-user-id",
        env = "CLIBRIDGE_ALLOWED_USER_ID",
        allow_negative_numbers = true,
        help = "Telegram user id allowed to talk to the bot; everyone else is ignored"
    )]
    pub allowed_user_id: i64,

    #[arg(
        long = "work-dir",
        env = "CLIBRIDGE_WORK_DIR",
        help = "Directory the CLI runs in; created when missing"
    )]
    pub work_dir: PathBuf,

    #[arg(
        long = "cli-executable",
        env = "CLIBRIDGE_CLI_EXECUTABLE",
        default_value = DEFAULT_CLI_EXECUTABLE,
        help = "Assistant CLI executable name or path"
    )]
    pub cli_executable: String,

    #[arg(
        long = "cli-timeout-ms",
        env = "CLIBRIDGE_CLI_TIMEOUT_MS",
        default_value_t = DEFAULT_RUN_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Deadline for one CLI run before the process is killed"
    )]
    pub cli_timeout_ms: u64,

    #[arg(
        long = "default-mode",
        env = "CLIBRIDGE_DEFAULT_MODE",
        value_enum,
        default_value_t = CliAccessMode::Safe,
        help = "Access mode used until the user switches with /safe, /write or /full"
    )]
    pub default_mode: CliAccessMode,

    #[arg(
        long = "telegram-api-base",
        env = "CLIBRIDGE_TELEGRAM_API_BASE",
        default_value = DEFAULT_TELEGRAM_API_BASE,
        help = "Base URL of the Telegram Bot API"
    )]
    pub telegram_api_base: String,

    #[arg(
        long = "poll-timeout-secs",
        env = "CLIBRIDGE_POLL_TIMEOUT_SECS",
        default_value_t = DEFAULT_POLL_TIMEOUT_SECS,
        help = "Long-poll timeout passed to getUpdates"
    )]
    pub poll_timeout_secs: u64,

    #[arg(
        long = "poll-retry-delay-ms",
        env = "CLIBRIDGE_POLL_RETRY_DELAY_MS",
        default_value_t = DEFAULT_POLL_RETRY_DELAY_MS,
        value_parser = parse_positive_u64,
        help = "Delay before polling again after a failed getUpdates"
    )]
    pub poll_retry_delay_ms: u64,

    #[arg(
        long = "max-message-chars",
        env = "CLIBRIDGE_MAX_MESSAGE_CHARS",
        default_value_t = TELEGRAM_MESSAGE_LIMIT,
        value_parser = parse_message_chars,
        help = "Maximum characters per outgoing Telegram message"
    )]
    pub max_message_chars: usize,
}
