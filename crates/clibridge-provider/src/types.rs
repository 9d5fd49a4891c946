use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Usage figures reported on a `result` event. Absent keys stay `None`.
pub struct UsageStats {
    pub cost_usd: Option<f64>,
    pub num_turns: Option<u64>,
    pub duration_ms: Option<u64>,
    pub duration_api_ms: Option<u64>,
}

impl UsageStats {
    pub fn is_empty(&self) -> bool {
        self.cost_usd.is_none()
            && self.num_turns.is_none()
            && self.duration_ms.is_none()
            && self.duration_api_ms.is_none()
    }

    /// Overwrites every recognized field present on `event`.
    pub(crate) fn merge_event(&mut self, event: &Map<String, Value>) {
        if let Some(cost) = ["cost_usd", "total_cost_usd"]
            .iter()
            .find_map(|key| event.get(*key).and_then(Value::as_f64))
        {
            self.cost_usd = Some(cost);
        }
        if let Some(turns) = count_field(event, "num_turns") {
            self.num_turns = Some(turns);
        }
        if let Some(duration) = count_field(event, "duration_ms") {
            self.duration_ms = Some(duration);
        }
        if let Some(duration) = count_field(event, "duration_api_ms") {
            self.duration_api_ms = Some(duration);
        }
    }
}

fn count_field(event: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = event.get(key)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.is_finite() && *number >= 0.0)
            .map(|number| number as u64)
    })
}

#[derive(Debug, Clone, PartialEq)]
/// Outcome of one assistant CLI run.
pub struct RunResult {
    pub text: String,
    pub session_id: Option<String>,
    pub stats: Option<UsageStats>,
}
