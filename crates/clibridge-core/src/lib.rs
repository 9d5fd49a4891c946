//! Foundational text utilities shared across clibridge crates.
//!
//! Provides the line-aware message chunker used to fit assistant replies into
//! chat transports with a fixed per-message size ceiling.

pub mod message_chunking;

pub use message_chunking::{
    join_message_parts, split_message, split_message_with_boundaries, ChunkBoundary,
    MessageChunk, TELEGRAM_MESSAGE_LIMIT,
};
