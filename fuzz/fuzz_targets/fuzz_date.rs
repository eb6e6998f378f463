#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_body_stream::date::HttpDate;

fuzz_target!(|data: &[u8]| {
    // UTF-8 文字列として解釈できる場合のみテスト
    if let Ok(s) = std::str::from_utf8(data) {
        // HTTP-date パース
        if let Ok(date) = HttpDate::parse(s) {
            let _ = date.day_of_week();
            let _ = date.to_system_time();

            // IMF-fixdate で出力して再パース
            let displayed = date.to_string();
            let reparsed = HttpDate::parse(&displayed).unwrap();
            assert_eq!(date, reparsed);

            // UNIX 時刻経由でも同じ時刻を指す
            let timestamp = date.to_unix_timestamp();
            if let Ok(converted) = HttpDate::from_unix_timestamp(timestamp) {
                assert_eq!(converted.to_unix_timestamp(), timestamp);
            }
        }
    }
});
