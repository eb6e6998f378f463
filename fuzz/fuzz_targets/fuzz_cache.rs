#![no_main]

use std::time::{Duration, UNIX_EPOCH};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_body_stream::cache::{Age, CacheControl, Expires, expiration};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    cache_control: Vec<String>,
    expires: Option<String>,
    sent_at: u32,
}

fuzz_target!(|input: FuzzInput| {
    for value in &input.cache_control {
        // CacheControl パース
        if let Ok(cc) = CacheControl::parse(value) {
            let _ = cc.is_cacheable();

            // Display ラウンドトリップ
            let displayed = cc.to_string();
            if let Ok(reparsed) = CacheControl::parse(&displayed) {
                assert_eq!(cc.max_age(), reparsed.max_age());
                assert_eq!(cc.is_no_cache(), reparsed.is_no_cache());
                assert_eq!(cc.is_no_store(), reparsed.is_no_store());
            }
        }

        if let Ok(age) = Age::parse(value) {
            let reparsed = Age::parse(&age.to_string()).unwrap();
            assert_eq!(age.seconds(), reparsed.seconds());
        }
    }

    if let Some(value) = &input.expires {
        let _ = Expires::parse(value).map(|e| e.to_system_time());
    }

    // 有効期限の計算
    let mut headers: Vec<(String, String)> = input
        .cache_control
        .iter()
        .map(|v| ("Cache-Control".to_string(), v.clone()))
        .collect();
    if let Some(value) = input.expires {
        headers.push(("Expires".to_string(), value));
    }
    let sent_at = UNIX_EPOCH + Duration::from_secs(input.sent_at as u64);
    let result = expiration(&headers, sent_at);

    let no_store = CacheControl::parse_values(input.cache_control.iter().map(|s| s.as_str()))
        .map(|cc| cc.is_no_store())
        .unwrap_or(false);
    if no_store {
        assert_eq!(result, None);
    }
});
