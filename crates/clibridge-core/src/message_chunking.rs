//! Line-aware chunking of reply text for size-limited chat messages.
//!
//! Limits are counted in characters (Unicode scalar values) and a chunk never
//! ends inside a code point. Splits prefer the last newline inside the window;
//! the newline is consumed and does not appear in either neighbouring chunk.

/// Per-message text ceiling of the Telegram Bot API.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a chunk was terminated.
pub enum ChunkBoundary {
    /// Ended on a newline that was consumed as the separator.
    Soft,
    /// Cut at the limit inside a line; nothing was consumed.
    Hard,
    /// Last chunk of the text.
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChunk {
    pub text: String,
    pub boundary: ChunkBoundary,
}

/// Splits `text` into parts of at most `limit` characters.
///
/// Text that already fits is returned unchanged as a single part, so an empty
/// string yields `[""]`. Rejoining the parts with `"\n"` reproduces the input
/// whenever every split landed on a newline; see
/// [`split_message_with_boundaries`] when hard cuts must be reconstructed too.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    split_message_with_boundaries(text, limit)
        .into_iter()
        .map(|chunk| chunk.text)
        .collect()
}

/// Same as [`split_message`] but records how each chunk ended.
pub fn split_message_with_boundaries(text: &str, limit: usize) -> Vec<MessageChunk> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    loop {
        // Byte offset of the character at index `limit`; `None` means it fits.
        let Some((cut, ch)) = remaining.char_indices().nth(limit) else {
            chunks.push(MessageChunk {
                text: remaining.to_string(),
                boundary: ChunkBoundary::Final,
            });
            break;
        };

        let window_end = cut + ch.len_utf8();
        match remaining[..window_end].rfind('\n') {
            Some(newline) => {
                chunks.push(MessageChunk {
                    text: remaining[..newline].to_string(),
                    boundary: ChunkBoundary::Soft,
                });
                remaining = &remaining[newline + 1..];
            }
            None => {
                chunks.push(MessageChunk {
                    text: remaining[..cut].to_string(),
                    boundary: ChunkBoundary::Hard,
                });
                remaining = &remaining[cut..];
            }
        }
    }

    chunks
}

/// Rebuilds the original text from chunks produced by
/// [`split_message_with_boundaries`].
pub fn join_message_parts(chunks: &[MessageChunk]) -> String {
    let mut joined = String::new();
    for chunk in chunks {
        joined.push_str(&chunk.text);
        if chunk.boundary == ChunkBoundary::Soft {
            joined.push('\n');
        }
    }
    joined
}
