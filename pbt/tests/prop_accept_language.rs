//! Accept-Language / Link のプロパティテスト

use pbt::{printable_ascii, quoted_content};
use proptest::prelude::*;
use shiguredo_body_stream::accept_language::{AcceptLanguage, QValue};
use shiguredo_body_stream::link::Link;

// ========================================
// Strategy 定義
// ========================================

fn language_range() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("*".to_string()),
        "[a-z]{2,3}(-[A-Za-z0-9]{1,8}){0,2}".prop_map(|s| s),
    ]
}

// 0, 0.x, 0.xx, 0.xxx, 1
fn qvalue_string() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1".to_string()),
        Just("0".to_string()),
        "0\\.[0-9]{1,3}".prop_map(|s| s),
    ]
}

fn link() -> impl Strategy<Value = Link> {
    (
        "[A-Za-z0-9/:.?=&_-]{0,24}",
        quoted_content(),
        prop::collection::btree_map("[a-z][a-z0-9-]{0,7}", quoted_content(), 0..4),
    )
        .prop_map(|(uri, relation, attributes)| {
            attributes
                .iter()
                .filter(|(name, _)| name.as_str() != "rel")
                .fold(Link::new(&uri, &relation), |link, (name, value)| {
                    link.with_attribute(name, value)
                })
        })
}

// ========================================
// Accept-Language
// ========================================

proptest! {
    #[test]
    fn accept_language_parse_keeps_all_valid_ranges(
        entries in proptest::collection::vec((language_range(), qvalue_string()), 1..6)
    ) {
        let value = entries
            .iter()
            .map(|(range, q)| format!("{};q={}", range, q))
            .collect::<Vec<_>>()
            .join(", ");
        let accept = AcceptLanguage::parse(&value).unwrap();
        prop_assert_eq!(accept.items().len(), entries.len());
        for (item, (range, q)) in accept.items().iter().zip(&entries) {
            prop_assert_eq!(item.language(), range.as_str());
            prop_assert_eq!(item.qvalue(), QValue::parse(q).unwrap());
        }

        // Display 後も同じ内容になる
        prop_assert_eq!(AcceptLanguage::parse(&accept.to_string()).unwrap(), accept);
    }
}

proptest! {
    #[test]
    fn accept_language_preferred_is_descending(
        entries in proptest::collection::vec((language_range(), qvalue_string()), 1..8)
    ) {
        let value = entries
            .iter()
            .map(|(range, q)| format!("{};q={}", range, q))
            .collect::<Vec<_>>()
            .join(", ");
        let accept = AcceptLanguage::parse(&value).unwrap();

        // q 値の降順、同じ q 値は並び順を保つ
        let mut expected: Vec<(u16, &str)> = accept
            .items()
            .iter()
            .map(|item| (item.qvalue().value(), item.language()))
            .filter(|(q, _)| *q > 0)
            .collect();
        expected.sort_by(|a, b| b.0.cmp(&a.0));
        let expected: Vec<&str> = expected.into_iter().map(|(_, language)| language).collect();
        prop_assert_eq!(accept.preferred().collect::<Vec<_>>(), expected);
    }
}

proptest! {
    #[test]
    fn accept_language_no_panic(s in printable_ascii()) {
        if let Ok(accept) = AcceptLanguage::parse(&s) {
            prop_assert!(!accept.items().is_empty());
            let _ = accept.preferred().count();
            let _ = accept.negotiate(&["en", "ja-JP", "*"]);
        }
    }
}

// ========================================
// Link
// ========================================

proptest! {
    #[test]
    fn link_roundtrip(links in proptest::collection::vec(link(), 0..4)) {
        let value = Link::to_header_value(&links);
        prop_assert_eq!(Link::parse(&value), links);
    }
}

proptest! {
    #[test]
    fn link_no_panic(s in printable_ascii()) {
        for link in Link::parse(&s) {
            let _ = link.relations().count();
            let _ = Link::to_header_value(&[link]);
        }
    }
}
