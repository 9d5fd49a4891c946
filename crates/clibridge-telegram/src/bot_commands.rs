//! Slash commands understood by the bot.
//!
//! Commands mutate the [`ConversationState`] and produce a reply; anything that
//! does not parse as a known command is forwarded to the assistant as a prompt.

use std::path::Path;

use clibridge_provider::AccessMode;

use crate::conversation_state::{ConversationState, UsageTotals};

const SESSION_DISPLAY_CHARS: usize = 12;

pub const NEW_SESSION_REPLY: &str = "New session started.";

/// `(command, description)` pairs registered with `setMyCommands`.
pub const BOT_COMMAND_MENU: &[(&str, &str)] = &[
    ("new", "Start a new session"),
    ("safe", "Mode: read only"),
    ("write", "Mode: write (Write + Edit)"),
    ("full", "Mode: full access"),
    ("status", "Current status"),
    ("usage", "Usage statistics"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    NewSession,
    SetMode(AccessMode),
    Status,
    Usage,
}

/// Parses the leading `/command` (optionally `/command@botname`) of `text`.
pub fn parse_bot_command(text: &str) -> Option<BotCommand> {
    let token = text.split_whitespace().next()?;
    let name = token.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    match name {
        "start" | "help" => Some(BotCommand::Start),
        "new" => Some(BotCommand::NewSession),
        "safe" => Some(BotCommand::SetMode(AccessMode::ReadOnly)),
        "write" => Some(BotCommand::SetMode(AccessMode::WriteEdit)),
        "full" => Some(BotCommand::SetMode(AccessMode::Full)),
        "status" => Some(BotCommand::Status),
        "usage" => Some(BotCommand::Usage),
        _ => None,
    }
}

/// Applies `command` to `state` and returns the reply text.
pub fn execute_bot_command(
    command: BotCommand,
    state: &mut ConversationState,
    work_dir: &Path,
) -> String {
    match command {
        BotCommand::Start => render_help(),
        BotCommand::NewSession => {
            state.reset_session();
            NEW_SESSION_REPLY.to_string()
        }
        BotCommand::SetMode(mode) => {
            state.set_mode(mode);
            render_mode_changed(mode)
        }
        BotCommand::Status => render_status(state, work_dir),
        BotCommand::Usage => render_usage(&state.usage),
    }
}

pub fn render_help() -> String {
    let mut lines = vec![
        "CLI Bridge".to_string(),
        String::new(),
        "Send text and it is passed to the CLI.".to_string(),
        String::new(),
        "Commands:".to_string(),
    ];
    lines.extend(
        BOT_COMMAND_MENU
            .iter()
            .map(|(command, description)| format!("/{command} - {description}")),
    );
    lines.join("\n")
}

pub fn render_mode_changed(mode: AccessMode) -> String {
    match mode {
        AccessMode::ReadOnly => "Mode: read only".to_string(),
        AccessMode::WriteEdit => "Mode: write (Write + Edit in the work dir)".to_string(),
        AccessMode::Full => [
            "Mode: FULL ACCESS",
            "The CLI can run any command on this machine.",
            "Use /safe or /write to go back.",
        ]
        .join("\n"),
    }
}

pub fn render_status(state: &ConversationState, work_dir: &Path) -> String {
    let session = state
        .session_id
        .as_deref()
        .map(abbreviate_session_id)
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Mode: {}\nSession: {}\nWork dir: {}",
        state.mode.label(),
        session,
        work_dir.display()
    )
}

pub fn render_usage(usage: &UsageTotals) -> String {
    let minutes = usage.total_duration_ms as f64 / 60_000.0;
    format!(
        "Usage since bot start:\n\nRequests: {}\nCost: ${:.4}\nCLI turns: {}\nCLI time: {:.1} min",
        usage.request_count, usage.total_cost_usd, usage.total_turns, minutes
    )
}

fn abbreviate_session_id(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(SESSION_DISPLAY_CHARS).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_parse_bot_command_recognizes_known_commands() {
        assert_eq!(parse_bot_command("/start"), Some(BotCommand::Start));
        assert_eq!(parse_bot_command("/help"), Some(BotCommand::Start));
        assert_eq!(parse_bot_command("/new"), Some(BotCommand::NewSession));
        assert_eq!(
            parse_bot_command("/safe"),
            Some(BotCommand::SetMode(AccessMode::ReadOnly))
        );
        assert_eq!(
            parse_bot_command("/write"),
            Some(BotCommand::SetMode(AccessMode::WriteEdit))
        );
        assert_eq!(
            parse_bot_command("/full"),
            Some(BotCommand::SetMode(AccessMode::Full))
        );
        assert_eq!(parse_bot_command("/status"), Some(BotCommand::Status));
        assert_eq!(parse_bot_command("/usage"), Some(BotCommand::Usage));
    }

    #[test]
    fn functional_parse_bot_command_handles_bot_suffix_and_arguments() {
        assert_eq!(
            parse_bot_command("  /status@my_bridge_bot  "),
            Some(BotCommand::Status)
        );
        assert_eq!(parse_bot_command("/new please"), Some(BotCommand::NewSession));
    }

    #[test]
    fn regression_unknown_commands_and_plain_text_are_prompts() {
        assert_eq!(parse_bot_command("/deploy now"), None);
        assert_eq!(parse_bot_command("/STATUS"), None);
        assert_eq!(parse_bot_command("what is in /status?"), None);
        assert_eq!(parse_bot_command(""), None);
    }

    #[test]
    fn functional_execute_mode_and_new_session_commands_mutate_state() {
        let mut state = ConversationState::default();
        state.session_id = Some("sess".to_string());
        let work_dir = Path::new("/srv/work");

        let reply = execute_bot_command(
            BotCommand::SetMode(AccessMode::Full),
            &mut state,
            work_dir,
        );
        assert_eq!(state.mode, AccessMode::Full);
        assert!(reply.starts_with("Mode: FULL ACCESS"));
        assert!(reply.contains("/safe"));

        let reply = execute_bot_command(BotCommand::NewSession, &mut state, work_dir);
        assert_eq!(reply, NEW_SESSION_REPLY);
        assert_eq!(state.session_id, None);
    }

    #[test]
    fn unit_render_status_abbreviates_session_id() {
        let mut state = ConversationState::new(AccessMode::WriteEdit);
        state.session_id = Some("0123456789abcdef".to_string());

        let status = render_status(&state, Path::new("/srv/work"));
        assert_eq!(
            status,
            "Mode: Write (Write + Edit)\nSession: 0123456789ab...\nWork dir: /srv/work"
        );

        state.reset_session();
        assert!(render_status(&state, Path::new("/srv/work")).contains("Session: none"));
    }

    #[test]
    fn unit_render_usage_formats_totals() {
        let usage = UsageTotals {
            total_cost_usd: 0.12345,
            total_turns: 7,
            total_duration_ms: 90_000,
            request_count: 3,
        };
        let rendered = render_usage(&usage);
        assert!(rendered.contains("Requests: 3"));
        assert!(rendered.contains("Cost: $0.1235") || rendered.contains("Cost: $0.1234"));
        assert!(rendered.contains("CLI turns: 7"));
        assert!(rendered.contains("CLI time: 1.5 min"));
    }

    #[test]
    fn unit_render_help_lists_every_menu_command() {
        let help = render_help();
        for (command, _) in BOT_COMMAND_MENU {
            assert!(help.contains(&format!("/{command} - ")));
        }
    }
}
