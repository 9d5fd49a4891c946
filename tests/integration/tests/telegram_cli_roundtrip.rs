#![cfg(unix)]

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Result;
use async_trait::async_trait;
use clibridge_core::split_message;
use clibridge_provider::{AccessMode, AssistantBridge, AssistantBridgeConfig};
use clibridge_telegram::{
    BotRuntime, BotRuntimeConfig, ChatTransport, ConversationState, TelegramChat,
    TelegramMessage, TelegramUpdate, TelegramUser, PLACEHOLDER_TEXT,
};
use tempfile::TempDir;

const OWNER: i64 = 4242;
const CHAT: i64 = 7;

/// Stand-in for the assistant CLI: echoes the prompt, the resume id and the
/// allow-list back as a stream-json event array.
const MOCK_CLI: &str = r#"
prompt="$(cat)"
resume="none"
tools="all"
while [ "$#" -gt 0 ]; do
  case "$1" in
    --resume) resume="$2"; shift ;;
    --allowedTools) tools="$2"; shift ;;
  esac
  shift
done
case "$prompt" in
  slow*) exec sleep 5 ;;
  broken*) echo "authentication required" >&2; exit 1 ;;
  long*)
    i=0
    while [ "$i" -lt 30 ]; do
      printf 'line %02d of a long reply\n' "$i"
      i=$((i + 1))
    done
    exit 0 ;;
esac
printf '[{"type":"system","subtype":"init","session_id":"sess-%s"},' "$(basename "$PWD")"
printf '{"type":"assistant","message":{"content":[{"type":"text","text":"thinking"}]}},'
printf '{"type":"result","result":"echo: %s | resume=%s | tools=%s","session_id":"sess-%s","total_cost_usd":0.01,"num_turns":2,"duration_ms":1500}]' \
  "$prompt" "$resume" "$tools" "$(basename "$PWD")"
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outgoing {
    Text(String),
    Edit(i64, String),
    Delete(i64),
}

#[derive(Default)]
struct RecordingTransport {
    outgoing: Mutex<Vec<Outgoing>>,
}

impl RecordingTransport {
    fn take(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.outgoing.lock().expect("outgoing lock"))
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn fetch_updates(
        &self,
        _offset: Option<i64>,
        _timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        Ok(Vec::new())
    }

    async fn send_text(&self, _chat_id: i64, text: &str) -> Result<i64> {
        let mut outgoing = self.outgoing.lock().expect("outgoing lock");
        outgoing.push(Outgoing::Text(text.to_string()));
        Ok(outgoing.len() as i64)
    }

    async fn edit_text(&self, _chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.outgoing
            .lock()
            .expect("outgoing lock")
            .push(Outgoing::Edit(message_id, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i64) -> Result<()> {
        self.outgoing
            .lock()
            .expect("outgoing lock")
            .push(Outgoing::Delete(message_id));
        Ok(())
    }
}

struct Harness {
    _root: TempDir,
    work_dir: PathBuf,
    runtime: BotRuntime<RecordingTransport>,
    next_update_id: i64,
}

impl Harness {
    fn new(timeout_ms: u64, max_message_chars: usize) -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let cli = write_mock_cli(root.path());
        let work_dir = root.path().join("project");
        std::fs::create_dir_all(&work_dir).expect("work dir");

        let bridge = AssistantBridge::new(AssistantBridgeConfig {
            executable: cli.display().to_string(),
            working_dir: work_dir.clone(),
            timeout_ms,
        })
        .expect("bridge");
        let mut config = BotRuntimeConfig::new(OWNER, &work_dir);
        config.max_message_chars = max_message_chars;
        let runtime = BotRuntime::new(
            config,
            bridge,
            RecordingTransport::default(),
            ConversationState::default(),
        );

        Self {
            _root: root,
            work_dir,
            runtime,
            next_update_id: 1,
        }
    }

    async fn say(&mut self, sender: i64, text: &str) -> Vec<Outgoing> {
        let update_id = self.next_update_id;
        self.next_update_id += 1;
        self.runtime
            .handle_update(TelegramUpdate {
                update_id,
                message: Some(TelegramMessage {
                    message_id: update_id,
                    chat: TelegramChat { id: CHAT },
                    from: Some(TelegramUser {
                        id: sender,
                        username: Some("operator".to_string()),
                    }),
                    text: Some(text.to_string()),
                }),
            })
            .await;
        self.runtime.transport().take()
    }
}

fn write_mock_cli(dir: &Path) -> PathBuf {
    let script = dir.join("claude");
    std::fs::write(&script, format!("#!/bin/sh\nset -eu\n{MOCK_CLI}\n")).expect("write script");
    let mut perms = std::fs::metadata(&script)
        .expect("script metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).expect("chmod script");
    script
}

fn texts(outgoing: &[Outgoing]) -> Vec<&str> {
    outgoing
        .iter()
        .filter_map(|entry| match entry {
            Outgoing::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn integration_conversation_resumes_session_and_tracks_usage() {
    let mut harness = Harness::new(10_000, 4_096);

    let first = harness.say(OWNER, "hello").await;
    assert_eq!(
        first,
        vec![
            Outgoing::Text(PLACEHOLDER_TEXT.to_string()),
            Outgoing::Delete(1),
            Outgoing::Text(
                "echo: hello | resume=none | tools=Read,LS,Glob,Grep".to_string()
            ),
        ]
    );
    assert_eq!(
        harness.runtime.state().session_id.as_deref(),
        Some("sess-project")
    );

    let second = harness.say(OWNER, "again").await;
    assert_eq!(
        texts(&second).last().copied(),
        Some("echo: again | resume=sess-project | tools=Read,LS,Glob,Grep")
    );

    let usage = harness.say(OWNER, "/usage").await;
    let usage = texts(&usage).join("\n");
    assert!(usage.contains("Requests: 2"));
    assert!(usage.contains("CLI turns: 4"));
    assert!(usage.contains("Cost: $0.0200"));
}

#[tokio::test]
async fn integration_mode_commands_change_allow_list_and_new_clears_session() {
    let mut harness = Harness::new(10_000, 4_096);

    harness.say(OWNER, "hello").await;
    let reply = harness.say(OWNER, "/full").await;
    assert!(texts(&reply)[0].starts_with("Mode: FULL ACCESS"));
    assert_eq!(harness.runtime.state().mode, AccessMode::Full);

    let full = harness.say(OWNER, "rm it").await;
    assert_eq!(
        texts(&full).last().copied(),
        Some("echo: rm it | resume=sess-project | tools=all")
    );

    harness.say(OWNER, "/new").await;
    harness.say(OWNER, "/write").await;
    let write = harness.say(OWNER, "edit").await;
    assert_eq!(
        texts(&write).last().copied(),
        Some("echo: edit | resume=none | tools=Read,LS,Glob,Grep,Write,Edit,MultiEdit")
    );

    let status = harness.say(OWNER, "/status").await;
    let status = texts(&status)[0].to_string();
    assert!(status.contains("Session: sess-project"));
    assert!(status.contains(&harness.work_dir.display().to_string()));
}

#[tokio::test]
async fn integration_strangers_are_ignored_without_running_cli() {
    let mut harness = Harness::new(10_000, 4_096);

    assert!(harness.say(OWNER + 1, "hello").await.is_empty());
    assert!(harness.say(OWNER + 1, "/full").await.is_empty());
    assert_eq!(harness.runtime.state().mode, AccessMode::ReadOnly);
    assert_eq!(harness.runtime.state().usage.request_count, 0);
}

#[tokio::test]
async fn integration_long_plain_text_reply_is_chunked_on_line_breaks() {
    let mut harness = Harness::new(10_000, 100);

    let outgoing = harness.say(OWNER, "long reply please").await;
    let parts: Vec<String> = texts(&outgoing)
        .into_iter()
        .skip(1)
        .map(str::to_string)
        .collect();

    let expected = (0..30)
        .map(|index| format!("line {index:02} of a long reply"))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(parts.len() > 1);
    assert!(parts.iter().all(|part| part.chars().count() <= 100));
    assert!(parts.iter().all(|part| part.starts_with("line ")));
    assert_eq!(parts, split_message(&expected, 100));
    assert_eq!(harness.runtime.state().session_id, None);
}

#[tokio::test]
async fn integration_stderr_only_failure_is_relayed_as_error_text() {
    let mut harness = Harness::new(10_000, 4_096);

    let outgoing = harness.say(OWNER, "broken request").await;

    assert_eq!(
        texts(&outgoing).last().copied(),
        Some("Error: authentication required")
    );
}

#[tokio::test]
async fn regression_hung_cli_is_killed_and_placeholder_reports_timeout() {
    let mut harness = Harness::new(300, 4_096);

    let started = std::time::Instant::now();
    let outgoing = harness.say(OWNER, "slow request").await;

    assert!(started.elapsed() < std::time::Duration::from_secs(4));
    assert_eq!(
        outgoing,
        vec![
            Outgoing::Text(PLACEHOLDER_TEXT.to_string()),
            Outgoing::Edit(
                1,
                "Timeout: CLI did not respond within 1 second.".to_string()
            ),
        ]
    );
}
