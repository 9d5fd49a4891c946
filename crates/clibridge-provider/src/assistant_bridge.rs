use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::access_mode::AccessMode;
use crate::command_builder::build_command_args;
use crate::process_executor::{
    ProcessExecutor, ProcessExecutorError, ProcessRequest, TokioProcessExecutor,
};
use crate::response_parser::parse_response;
use crate::types::RunResult;

pub const DEFAULT_CLI_EXECUTABLE: &str = "claude";
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 5 * 60 * 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantBridgeConfig {
    pub executable: String,
    pub working_dir: PathBuf,
    pub timeout_ms: u64,
}

impl AssistantBridgeConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: DEFAULT_CLI_EXECUTABLE.to_string(),
            working_dir: working_dir.into(),
            timeout_ms: DEFAULT_RUN_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssistantBridgeConfigError {
    #[error("assistant cli executable is empty")]
    EmptyExecutable,
    #[error("assistant cli timeout must be greater than 0ms")]
    ZeroTimeout,
}

/// Runs prompts through the assistant CLI and normalizes the reply.
///
/// The bridge holds configuration only; the caller owns the current mode and
/// session id and passes them into every [`AssistantBridge::run`].
#[derive(Clone)]
pub struct AssistantBridge {
    config: AssistantBridgeConfig,
    executor: Arc<dyn ProcessExecutor>,
}

impl std::fmt::Debug for AssistantBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AssistantBridge {
    pub fn new(config: AssistantBridgeConfig) -> Result<Self, AssistantBridgeConfigError> {
        Self::with_executor(config, Arc::new(TokioProcessExecutor::default()))
    }

    pub fn with_executor(
        config: AssistantBridgeConfig,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Result<Self, AssistantBridgeConfigError> {
        if config.executable.trim().is_empty() {
            return Err(AssistantBridgeConfigError::EmptyExecutable);
        }
        if config.timeout_ms == 0 {
            return Err(AssistantBridgeConfigError::ZeroTimeout);
        }
        Ok(Self { config, executor })
    }

    pub fn config(&self) -> &AssistantBridgeConfig {
        &self.config
    }

    /// Sends `prompt` to the CLI on stdin and returns the parsed reply.
    ///
    /// Stderr-only completions are folded into an `"Error: ..."` result that
    /// keeps `session_id` so the conversation can continue. Timeouts and
    /// executor failures are returned unchanged.
    pub async fn run(
        &self,
        prompt: &str,
        mode: AccessMode,
        session_id: Option<&str>,
    ) -> Result<RunResult, ProcessExecutorError> {
        let request = ProcessRequest {
            executable: self.config.executable.clone(),
            args: build_command_args(mode, session_id),
            working_dir: self.config.working_dir.clone(),
            stdin: prompt.to_string(),
            timeout: Duration::from_millis(self.config.timeout_ms),
        };
        tracing::info!(
            mode = mode.as_str(),
            resume = session_id.is_some(),
            prompt_chars = prompt.chars().count(),
            "running assistant cli"
        );

        let output = self.executor.execute(request).await?;
        tracing::debug!(
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "assistant cli finished"
        );

        let stderr = output.stderr.trim();
        if output.stdout.trim().is_empty() && !stderr.is_empty() {
            tracing::warn!(exit_code = ?output.exit_code, "assistant cli wrote only to stderr");
            return Ok(RunResult {
                text: format!("Error: {stderr}"),
                session_id: session_id.map(str::to_string),
                stats: None,
            });
        }

        let result = parse_response(&output.stdout);
        tracing::info!(
            session_id = result.session_id.as_deref().unwrap_or("-"),
            reply_chars = result.text.chars().count(),
            "assistant cli reply parsed"
        );
        Ok(result)
    }
}
