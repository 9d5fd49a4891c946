use clibridge_provider::{AccessMode, RunResult, UsageStats};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Usage accumulated since the bot started.
pub struct UsageTotals {
    pub total_cost_usd: f64,
    pub total_turns: u64,
    pub total_duration_ms: u64,
    pub request_count: u64,
}

impl UsageTotals {
    /// Adds one run's stats; fields missing from `stats` count as zero.
    pub fn record(&mut self, stats: &UsageStats) {
        self.total_cost_usd += stats.cost_usd.unwrap_or(0.0);
        self.total_turns = self
            .total_turns
            .saturating_add(stats.num_turns.unwrap_or(0));
        self.total_duration_ms = self
            .total_duration_ms
            .saturating_add(stats.duration_ms.unwrap_or(0));
        self.request_count = self.request_count.saturating_add(1);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Mode, session and usage for the one conversation the bot serves.
///
/// Owned by the runtime and handed to every bridge run; nothing here is
/// persisted across restarts.
pub struct ConversationState {
    pub mode: AccessMode,
    pub session_id: Option<String>,
    pub usage: UsageTotals,
}

impl ConversationState {
    pub fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn set_mode(&mut self, mode: AccessMode) {
        self.mode = mode;
    }

    pub fn reset_session(&mut self) {
        self.session_id = None;
    }

    /// Adopts the session id the CLI returned (if any) and accumulates usage.
    pub fn record_run(&mut self, result: &RunResult) {
        if let Some(session_id) = result
            .session_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        {
            self.session_id = Some(session_id.to_string());
        }
        if let Some(stats) = &result.stats {
            self.usage.record(stats);
        }
    }
}
