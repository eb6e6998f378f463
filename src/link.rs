//! Link ヘッダーパース (RFC 8288)
//!
//! `<uri>; rel="next"; title="..."` 形式の要素を
//! [`DirectiveParser`](crate::directive::DirectiveParser) で分解します。
//! 形式に合わない要素は読み飛ばします。
//!
//! ```rust
//! use shiguredo_body_stream::link::Link;
//!
//! let links = Link::parse(r#"<https://example.com/?page=2>; rel="next", <https://example.com/?page=9>; rel=last"#);
//! assert_eq!(links.len(), 2);
//! assert_eq!(links[0].uri(), "https://example.com/?page=2");
//! assert_eq!(links[0].relation(), "next");
//! assert_eq!(Link::find(&links, "last").map(|l| l.uri()), Some("https://example.com/?page=9"));
//! ```

use core::fmt;

use crate::directive::{Directive, parse_directives, serialize_directives};
use crate::headers::HeaderFields;

/// Link ヘッダーの 1 要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    uri: String,
    relation: String,
    attributes: Vec<(String, String)>,
}

impl Link {
    /// URI とリレーションから作成
    pub fn new(uri: &str, relation: &str) -> Self {
        Link {
            uri: uri.to_string(),
            relation: relation.to_string(),
            attributes: Vec::new(),
        }
    }

    /// 属性を追加 (`title`, `type`, `hreflang` など)
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Link ヘッダー値をパース
    pub fn parse(input: &str) -> Vec<Self> {
        Self::parse_values([input])
    }

    /// 複数の Link ヘッダー値をまとめてパース
    pub fn parse_values<'a, I>(values: I) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        parse_directives(values)
            .iter()
            .filter_map(|group| Self::from_directives(group))
            .collect()
    }

    /// ヘッダーリストから Link ヘッダーをすべて取得
    pub fn from_headers(headers: &[(String, String)]) -> Vec<Self> {
        Self::parse_values(headers.get_headers("Link"))
    }

    /// 複数の要素を Link ヘッダー値にシリアライズ
    pub fn to_header_value(links: &[Self]) -> String {
        let groups: Vec<Vec<Directive>> = links.iter().map(Self::to_directives).collect();
        serialize_directives(&groups)
    }

    /// 指定したリレーションを持つ最初の要素を探す
    pub fn find<'a>(links: &'a [Self], relation: &str) -> Option<&'a Self> {
        links.iter().find(|link| link.has_relation(relation))
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// `rel` の値 (空白区切りの複数リレーションもそのまま返す)
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// `rel` を空白で分割したリレーション
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.relation.split_ascii_whitespace()
    }

    /// リレーションを含むか (大文字小文字を区別しない)
    pub fn has_relation(&self, relation: &str) -> bool {
        self.relations().any(|r| r.eq_ignore_ascii_case(relation))
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// 属性を取得 (名前は大文字小文字を区別しない)
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    // 先頭が `<uri>`、以降はすべて `key=value`、`rel` は必須
    fn from_directives(group: &[Directive]) -> Option<Self> {
        let (first, params) = group.split_first()?;
        if first.parameter().is_some() {
            return None;
        }
        let uri = first.value().strip_prefix('<')?.strip_suffix('>')?;

        let mut relation = None;
        let mut attributes: Vec<(String, String)> = Vec::new();
        for directive in params {
            let value = directive.parameter()?;
            if directive.is("rel") {
                // 重複した rel は最初のものを使う (RFC 8288 Section 3.3)
                relation.get_or_insert(value);
            } else if !attributes
                .iter()
                .any(|(name, _)| directive.is(name))
            {
                attributes.push((directive.value().to_string(), value.to_string()));
            }
        }

        Some(Link {
            uri: uri.to_string(),
            relation: relation?.to_string(),
            attributes,
        })
    }

    fn to_directives(&self) -> Vec<Directive> {
        let mut directives = vec![
            Directive::new(&format!("<{}>", self.uri)),
            Directive::with_parameter("rel", &self.relation),
        ];
        directives.extend(
            self.attributes
                .iter()
                .map(|(name, value)| Directive::with_parameter(name, value)),
        );
        directives
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serialize_directives(&[self.to_directives()]))
    }
}
