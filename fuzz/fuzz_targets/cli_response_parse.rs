#![no_main]

use clibridge_provider::{parse_response, parse_result};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let response = parse_response(&raw);
    let result = parse_result(&raw);
    assert_eq!(response.text, result.text);
    assert_eq!(response.session_id, result.session_id);
    if let Some(stats) = response.stats {
        assert!(!stats.is_empty());
    }
});
