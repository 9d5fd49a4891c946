//! Telegram transport and polling runtime for clibridge.
//!
//! Long-polls the Bot API for updates from the single allowed user, dispatches
//! slash commands against the caller-owned [`ConversationState`], forwards
//! everything else to the assistant CLI and relays chunked replies.

pub mod bot_commands;
pub mod bot_runtime;
pub mod chat_transport;
pub mod conversation_state;
pub mod telegram_api;

pub use bot_commands::*;
pub use bot_runtime::*;
pub use chat_transport::ChatTransport;
pub use conversation_state::*;
pub use telegram_api::*;
