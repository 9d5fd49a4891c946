#![no_main]

use clibridge_core::{join_message_parts, split_message_with_boundaries};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&limit, rest)) = data.split_first() else {
        return;
    };
    let limit = usize::from(limit).max(1);
    let text = String::from_utf8_lossy(rest);
    let chunks = split_message_with_boundaries(&text, limit);
    assert!(chunks
        .iter()
        .all(|chunk| chunk.text.chars().count() <= limit));
    assert_eq!(join_message_parts(&chunks), text);
});
