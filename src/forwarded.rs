//! Forwarded ヘッダー (RFC 7239)
//!
//! ## 概要
//!
//! プロキシを経由したリクエストの転送情報 (`by`, `for`, `host`, `proto`) を扱います。
//! `Forwarded` ヘッダーは [`DirectiveParser`](crate::directive::DirectiveParser) で分解し、
//! カンマ区切りのグループひとつを [`Forwarded`] ひとつに対応させます。
//!
//! 旧来の `X-Forwarded-For` はアドレスのカンマ区切りリストとして扱い、
//! `for` だけを持つ要素に変換します。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::forwarded::Forwarded;
//!
//! let list = Forwarded::parse("for=192.0.2.60;proto=http;by=203.0.113.43");
//! assert_eq!(list[0].forwarded_for(), Some("192.0.2.60"));
//! assert_eq!(list[0].proto(), Some("http"));
//! assert_eq!(list[0].by(), Some("203.0.113.43"));
//!
//! let list = Forwarded::from_x_forwarded_for("192.0.2.43, 2001:db8:cafe::17 ");
//! assert_eq!(list[1].forwarded_for(), Some("2001:db8:cafe::17"));
//! ```

use core::fmt;

use crate::directive::{Directive, DirectiveParser, serialize_directives};
use crate::headers::HeaderFields;

/// Forwarded ヘッダーの 1 要素 (1 ホップ分)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Forwarded {
    /// リクエストを受け取ったプロキシのインターフェース
    pub by: Option<String>,
    /// リクエスト元
    pub for_: Option<String>,
    /// 元の Host ヘッダー
    pub host: Option<String>,
    /// 元のプロトコル (`http` / `https`)
    pub proto: Option<String>,
}

impl Forwarded {
    /// 空の要素を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwarded ヘッダー値をパース
    ///
    /// パラメータ名は大文字小文字を区別しない。未知のパラメータは無視する。
    /// 既知のパラメータをひとつも含まないグループは結果に含めない。
    pub fn parse(input: &str) -> Vec<Self> {
        DirectiveParser::new(input)
            .filter_map(|group| Self::from_directives(&group))
            .collect()
    }

    fn from_directives(directives: &[Directive]) -> Option<Self> {
        let mut forwarded = Forwarded::new();
        for directive in directives {
            let Some(value) = directive.parameter() else {
                continue;
            };
            let slot = if directive.is("by") {
                &mut forwarded.by
            } else if directive.is("for") {
                &mut forwarded.for_
            } else if directive.is("host") {
                &mut forwarded.host
            } else if directive.is("proto") {
                &mut forwarded.proto
            } else {
                continue;
            };
            *slot = Some(value.to_string());
        }

        if forwarded == Forwarded::default() {
            None
        } else {
            Some(forwarded)
        }
    }

    /// X-Forwarded-For ヘッダー値をパース
    ///
    /// 引用符や `;` は解釈せず、カンマで分割して前後の空白を取り除く。
    pub fn from_x_forwarded_for(input: &str) -> Vec<Self> {
        input
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(|address| Forwarded::new().with_for(address))
            .collect()
    }

    /// ヘッダーリストから転送情報をすべて取得
    ///
    /// `Forwarded` ヘッダーの要素を先に、`X-Forwarded-For` の要素を後に並べる。
    pub fn from_headers(headers: &[(String, String)]) -> Vec<Self> {
        let mut list: Vec<Self> = headers
            .get_headers("Forwarded")
            .into_iter()
            .flat_map(Self::parse)
            .collect();
        list.extend(
            headers
                .get_headers("X-Forwarded-For")
                .into_iter()
                .flat_map(Self::from_x_forwarded_for),
        );
        list
    }

    /// 複数の要素を Forwarded ヘッダー値にシリアライズ
    pub fn to_header_value(list: &[Self]) -> String {
        let groups: Vec<Vec<Directive>> = list.iter().map(Self::to_directives).collect();
        serialize_directives(&groups)
    }

    fn to_directives(&self) -> Vec<Directive> {
        [
            ("by", &self.by),
            ("for", &self.for_),
            ("host", &self.host),
            ("proto", &self.proto),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(|value| Directive::with_parameter(name, value))
        })
        .collect()
    }

    /// by を設定
    pub fn with_by(mut self, by: &str) -> Self {
        self.by = Some(by.to_string());
        self
    }

    /// for を設定
    pub fn with_for(mut self, forwarded_for: &str) -> Self {
        self.for_ = Some(forwarded_for.to_string());
        self
    }

    /// host を設定
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// proto を設定
    pub fn with_proto(mut self, proto: &str) -> Self {
        self.proto = Some(proto.to_string());
        self
    }

    /// by を取得
    pub fn by(&self) -> Option<&str> {
        self.by.as_deref()
    }

    /// for を取得
    pub fn forwarded_for(&self) -> Option<&str> {
        self.for_.as_deref()
    }

    /// host を取得
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// proto を取得
    pub fn proto(&self) -> Option<&str> {
        self.proto.as_deref()
    }
}

impl fmt::Display for Forwarded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serialize_directives(&[self.to_directives()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse() {
        let list = Forwarded::parse("for=192.0.2.60;proto=http;by=203.0.113.43");
        assert_eq!(
            list,
            vec![
                Forwarded::new()
                    .with_for("192.0.2.60")
                    .with_proto("http")
                    .with_by("203.0.113.43")
            ]
        );
    }

    #[test]
    fn test_parse_quoted_case_insensitive() {
        let list = Forwarded::parse(r#"For="[2001:db8:cafe::17]:4711""#);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].forwarded_for(), Some("[2001:db8:cafe::17]:4711"));
    }

    #[test]
    fn test_parse_multiple() {
        let list = Forwarded::parse(r#"for=192.0.2.43, for="[2001:db8:cafe::17]""#);
        let fors: Vec<_> = list.iter().map(|f| f.forwarded_for()).collect();
        assert_eq!(fors, vec![Some("192.0.2.43"), Some("[2001:db8:cafe::17]")]);
    }

    #[test]
    fn test_parse_ignores_unknown() {
        let list = Forwarded::parse("secret=x; host=example.com, garbage, ext=1");
        assert_eq!(list, vec![Forwarded::new().with_host("example.com")]);
        assert!(Forwarded::parse("").is_empty());
    }

    #[test]
    fn test_x_forwarded_for() {
        let list = Forwarded::from_x_forwarded_for("192.0.2.43, 2001:db8:cafe::17 ");
        let fors: Vec<_> = list.iter().map(|f| f.forwarded_for()).collect();
        assert_eq!(fors, vec![Some("192.0.2.43"), Some("2001:db8:cafe::17")]);
        assert!(Forwarded::from_x_forwarded_for(" , ").is_empty());
    }

    #[test]
    fn test_from_headers() {
        let headers = headers(&[
            ("X-Forwarded-For", "10.0.0.1"),
            ("forwarded", "for=192.0.2.60"),
            ("Forwarded", "for=192.0.2.61, for=192.0.2.62"),
        ]);
        let fors: Vec<_> = Forwarded::from_headers(&headers)
            .into_iter()
            .filter_map(|f| f.for_)
            .collect();
        assert_eq!(
            fors,
            vec!["192.0.2.60", "192.0.2.61", "192.0.2.62", "10.0.0.1"]
        );
    }

    #[test]
    fn test_display() {
        let forwarded = Forwarded::new()
            .with_by("203.0.113.43")
            .with_for("192.0.2.60")
            .with_proto("http");
        assert_eq!(
            forwarded.to_string(),
            r#"by="203.0.113.43"; for="192.0.2.60"; proto="http""#
        );
    }

    #[test]
    fn test_to_header_value_roundtrip() {
        let list = vec![
            Forwarded::new().with_for("[2001:db8:cafe::17]:4711"),
            Forwarded::new().with_for("192.0.2.60").with_host("a,b;c"),
        ];
        let value = Forwarded::to_header_value(&list);
        assert_eq!(
            value,
            r#"for="[2001:db8:cafe::17]:4711", for="192.0.2.60"; host="a,b;c""#
        );
        assert_eq!(Forwarded::parse(&value), list);
    }
}
