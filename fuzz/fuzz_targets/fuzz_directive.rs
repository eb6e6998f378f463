#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_body_stream::directive::{DirectiveParser, parse_directives, serialize_directives};

fuzz_target!(|data: &[u8]| {
    // UTF-8 文字列として解釈できる場合のみテスト
    if let Ok(s) = std::str::from_utf8(data) {
        // 1 グループずつ取り出しても必ず前に進む
        let mut parser = DirectiveParser::new(s);
        let mut previous = parser.remaining().len();
        while parser.next_directives().is_some() {
            let remaining = parser.remaining().len();
            assert!(remaining < previous);
            previous = remaining;
        }

        // シリアライズ結果も再パースできる
        let groups = parse_directives([s]);
        let serialized = serialize_directives(&groups);
        let _ = parse_directives([serialized.as_str()]);
    }
});
