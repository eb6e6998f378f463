//! フレーミング判定のプロパティテスト

use pbt::printable_ascii;
use proptest::prelude::*;
use shiguredo_body_stream::framing::{BodyFraming, ConnectionOptions, FramingError};

fn header(name: &str, value: String) -> (String, String) {
    (name.to_string(), value)
}

// 同じ値の Content-Length はいくつ並べても受け付ける
proptest! {
    #[test]
    fn framing_repeated_content_length(len in any::<u64>(), count in 1usize..5) {
        let headers: Vec<_> = (0..count)
            .map(|_| header("Content-Length", len.to_string()))
            .collect();
        prop_assert_eq!(
            BodyFraming::for_request(&headers),
            Ok(BodyFraming::ContentLength(len))
        );
    }
}

// 異なる値の Content-Length はエラー
proptest! {
    #[test]
    fn framing_mismatched_content_length(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        let headers = vec![header("Content-Length", format!("{}, {}", a, b))];
        prop_assert_eq!(
            BodyFraming::for_request(&headers),
            Err(FramingError::MismatchedContentLength)
        );
    }
}

// chunked が最後にあればリクエストは chunked
proptest! {
    #[test]
    fn framing_chunked_last(
        codings in proptest::collection::vec(
            prop_oneof![Just("gzip"), Just("deflate"), Just("br")],
            0..3
        )
    ) {
        let mut value = codings.join(", ");
        if !value.is_empty() {
            value.push_str(", ");
        }
        value.push_str("chunked");
        let headers = vec![header("Transfer-Encoding", value)];
        prop_assert_eq!(BodyFraming::for_request(&headers), Ok(BodyFraming::Chunked));
    }
}

// 1xx / 204 / 304 はヘッダーに関係なくボディなし
proptest! {
    #[test]
    fn framing_no_body_status(
        status in prop_oneof![100u16..200, Just(204u16), Just(304u16)],
        len in any::<u64>()
    ) {
        let headers = vec![header("Content-Length", len.to_string())];
        prop_assert_eq!(BodyFraming::for_response(status, &headers), Ok(BodyFraming::None));
    }
}

// 任意のヘッダー値でパニックしない
proptest! {
    #[test]
    fn framing_no_panic(te in printable_ascii(), cl in printable_ascii(), conn in printable_ascii()) {
        let headers = vec![
            header("Transfer-Encoding", te),
            header("Content-Length", cl),
            header("Connection", conn),
        ];
        let _ = BodyFraming::for_request(&headers);
        let _ = BodyFraming::for_response(200, &headers);
        let _ = ConnectionOptions::parse(&headers).is_keep_alive("HTTP/1.1");
    }
}
