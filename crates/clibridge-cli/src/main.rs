mod bootstrap_helpers;
mod cli_args;
mod cli_types;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use clibridge_provider::{resolve_executable, AccessMode, AssistantBridge, AssistantBridgeConfig};
use clibridge_telegram::{
    BotRuntime, BotRuntimeConfig, ConversationState, TelegramBotApi, BOT_COMMAND_MENU,
};

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    std::fs::create_dir_all(&cli.work_dir).with_context(|| {
        format!("failed to create work dir {}", cli.work_dir.display())
    })?;
    let work_dir = cli.work_dir.canonicalize().with_context(|| {
        format!("failed to resolve work dir {}", cli.work_dir.display())
    })?;

    let Some(executable_path) = resolve_executable(&cli.cli_executable) else {
        bail!(
            "assistant cli '{}' was not found or is not executable; install it or pass --cli-executable",
            cli.cli_executable
        );
    };

    let bridge = AssistantBridge::new(AssistantBridgeConfig {
        executable: executable_path.display().to_string(),
        working_dir: work_dir.clone(),
        timeout_ms: cli.cli_timeout_ms,
    })
    .map_err(|error| anyhow!("invalid assistant cli configuration: {error}"))?;

    let api = TelegramBotApi::new(&cli.telegram_api_base, &cli.bot_token, cli.poll_timeout_secs)?;
    if let Err(error) = api.set_my_commands(BOT_COMMAND_MENU).await {
        tracing::warn!(error = %format!("{error:#}"), "failed to register bot command menu");
    }

    let mode = AccessMode::from(cli.default_mode);
    tracing::info!(
        executable = %executable_path.display(),
        work_dir = %work_dir.display(),
        mode = mode.as_str(),
        timeout_ms = cli.cli_timeout_ms,
        "clibridge starting"
    );

    let mut runtime = BotRuntime::new(
        BotRuntimeConfig {
            allowed_user_id: cli.allowed_user_id,
            work_dir,
            max_message_chars: cli.max_message_chars,
            poll_timeout_secs: cli.poll_timeout_secs,
            poll_retry_delay_ms: cli.poll_retry_delay_ms,
        },
        bridge,
        api,
        ConversationState::new(mode),
    );

    let summary = runtime
        .run_polling(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!(%error, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;
    tracing::info!(
        updates_handled = summary.updates_handled,
        poll_failures = summary.poll_failures,
        "clibridge stopped"
    );
    Ok(())
}
