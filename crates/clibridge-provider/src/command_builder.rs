//! Argument construction for the assistant CLI.
//!
//! The prompt is never part of the argument list; it is written to the
//! process's stdin so long prompts are not subject to argv length or quoting
//! limits.

use crate::access_mode::AccessMode;

pub const OUTPUT_FORMAT_ARGS: [&str; 3] = ["-p", "--output-format", "json"];
pub const ALLOWED_TOOLS_FLAG: &str = "--allowedTools";
pub const SKIP_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";
pub const RESUME_FLAG: &str = "--resume";

pub const READ_ONLY_TOOLS: &[&str] = &["Read", "LS", "Glob", "Grep"];
pub const WRITE_EDIT_TOOLS: &[&str] = &["Read", "LS", "Glob", "Grep", "Write", "Edit", "MultiEdit"];

/// Tool allow-list for `mode`, or `None` when the mode bypasses permissions.
pub fn allowed_tools(mode: AccessMode) -> Option<&'static [&'static str]> {
    match mode {
        AccessMode::ReadOnly => Some(READ_ONLY_TOOLS),
        AccessMode::WriteEdit => Some(WRITE_EDIT_TOOLS),
        AccessMode::Full => None,
    }
}

/// Builds the CLI arguments (excluding the executable) for one run.
///
/// A blank `session_id` is treated the same as `None`.
pub fn build_command_args(mode: AccessMode, session_id: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = OUTPUT_FORMAT_ARGS.iter().map(|arg| arg.to_string()).collect();

    match allowed_tools(mode) {
        Some(tools) => {
            args.push(ALLOWED_TOOLS_FLAG.to_string());
            args.push(tools.join(","));
        }
        None => args.push(SKIP_PERMISSIONS_FLAG.to_string()),
    }

    if let Some(session_id) = session_id.filter(|value| !value.trim().is_empty()) {
        args.push(RESUME_FLAG.to_string());
        args.push(session_id.to_string());
    }

    args
}
