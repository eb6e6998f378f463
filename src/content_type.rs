//! Content-Type ヘッダーパース (RFC 9110 Section 8.3)
//!
//! ## 概要
//!
//! [`DirectiveParser`](crate::directive::DirectiveParser) の上に
//! Content-Type のメディアタイプとパラメータ (`charset`, `boundary` など) を載せます。
//!
//! 引用符が閉じていないパラメータ値は、残りすべてを値として扱います。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::content_type::ContentType;
//!
//! let ct = ContentType::parse("text/html").unwrap();
//! assert_eq!(ct.media_type(), "text");
//! assert_eq!(ct.subtype(), "html");
//!
//! let ct = ContentType::parse("application/json; charset=utf8").unwrap();
//! assert_eq!(ct.charset(), Some("utf8"));
//!
//! let ct = ContentType::parse("multipart/form-data; boundary=----WebKitFormBoundary").unwrap();
//! assert_eq!(ct.boundary(), Some("----WebKitFormBoundary"));
//! ```

use core::fmt;

use crate::directive::{DirectiveParser, escape_quoted};

/// Content-Type パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    /// 空の Content-Type
    Empty,
    /// 不正なメディアタイプ形式
    InvalidMediaType,
    /// 不正なパラメータ形式
    InvalidParameter,
}

impl fmt::Display for ContentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentTypeError::Empty => write!(f, "empty Content-Type"),
            ContentTypeError::InvalidMediaType => write!(f, "invalid media type"),
            ContentTypeError::InvalidParameter => write!(f, "invalid parameter"),
        }
    }
}

impl std::error::Error for ContentTypeError {}

/// パース済み Content-Type
///
/// ```text
/// Content-Type = media-type
/// media-type = type "/" subtype parameters
/// parameters = *( OWS ";" OWS [ parameter ] )
/// parameter = parameter-name "=" parameter-value
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// メディアタイプ (例: "text")
    media_type: String,
    /// サブタイプ (例: "html")
    subtype: String,
    /// パラメータ (name, value) のペア
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Content-Type 文字列をパース
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_body_stream::content_type::ContentType;
    ///
    /// let ct = ContentType::parse("text/html; charset=utf-8").unwrap();
    /// assert_eq!(ct.mime_type(), "text/html");
    /// assert_eq!(ct.charset(), Some("utf-8"));
    /// ```
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let mut parser = DirectiveParser::new(input);
        let directives = parser.next_directives().ok_or(ContentTypeError::Empty)?;

        // Content-Type はリストではない
        if parser.next_directives().is_some() {
            return Err(ContentTypeError::InvalidMediaType);
        }

        let mut directives = directives.into_iter();
        let first = directives.next().ok_or(ContentTypeError::Empty)?;
        if first.parameter().is_some() {
            return Err(ContentTypeError::InvalidMediaType);
        }
        let (media_type, subtype) = parse_media_type(first.value())?;

        let mut parameters = Vec::new();
        for directive in directives {
            let name = directive.value();
            let Some(value) = directive.parameter() else {
                return Err(ContentTypeError::InvalidParameter);
            };
            if !is_valid_token(name) {
                return Err(ContentTypeError::InvalidParameter);
            }
            parameters.push((name.to_ascii_lowercase(), value.to_string()));
        }

        Ok(ContentType {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters,
        })
    }

    /// 新しい ContentType を作成
    pub fn new(media_type: &str, subtype: &str) -> Self {
        ContentType {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// パラメータを追加
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// メディアタイプを取得 (例: "text")
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// サブタイプを取得 (例: "html")
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// 完全なメディアタイプを取得 (例: "text/html")
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }

    /// パラメータを取得 (名前は大文字小文字を区別しない)
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// すべてのパラメータを取得
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// charset パラメータを取得
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// boundary パラメータを取得
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// text/* かどうか
    pub fn is_text(&self) -> bool {
        self.media_type == "text"
    }

    /// application/json かどうか
    pub fn is_json(&self) -> bool {
        self.media_type == "application" && self.subtype == "json"
    }

    /// multipart/* かどうか
    pub fn is_multipart(&self) -> bool {
        self.media_type == "multipart"
    }

    /// multipart/form-data かどうか
    pub fn is_form_data(&self) -> bool {
        self.media_type == "multipart" && self.subtype == "form-data"
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        for (name, value) in &self.parameters {
            if is_valid_token(value) {
                write!(f, "; {}={}", name, value)?;
            } else {
                write!(f, "; {}=\"{}\"", name, escape_quoted(value))?;
            }
        }
        Ok(())
    }
}

/// `type/subtype` を分解
fn parse_media_type(input: &str) -> Result<(&str, &str), ContentTypeError> {
    let (media_type, subtype) = input
        .split_once('/')
        .ok_or(ContentTypeError::InvalidMediaType)?;

    if !is_valid_token(media_type) || !is_valid_token(subtype) {
        return Err(ContentTypeError::InvalidMediaType);
    }

    Ok((media_type, subtype))
}

fn is_valid_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// RFC 9110 のトークン文字
fn is_token_char(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let ct = ContentType::parse("text/html").unwrap();
        assert_eq!(ct.media_type(), "text");
        assert_eq!(ct.subtype(), "html");
        assert_eq!(ct.mime_type(), "text/html");
        assert!(ct.parameters().is_empty());
    }

    #[test]
    fn test_parse_with_charset() {
        let ct = ContentType::parse("application/json; charset=utf8").unwrap();
        assert!(ct.is_json());
        assert_eq!(ct.charset(), Some("utf8"));
    }

    #[test]
    fn test_parse_with_quoted_charset() {
        let ct = ContentType::parse("text/html; charset=\"utf-8\"").unwrap();
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_parse_multipart() {
        let ct =
            ContentType::parse("multipart/form-data; boundary=----WebKitFormBoundary").unwrap();
        assert!(ct.is_form_data());
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("----WebKitFormBoundary"));
    }

    #[test]
    fn test_parse_quoted_boundary_with_separators() {
        let ct = ContentType::parse(r#"multipart/mixed; boundary="a;b,c=d""#).unwrap();
        assert_eq!(ct.boundary(), Some("a;b,c=d"));
    }

    #[test]
    fn test_parse_case_insensitive() {
        let ct = ContentType::parse("TEXT/HTML; CHARSET=UTF-8").unwrap();
        assert_eq!(ct.media_type(), "text");
        assert_eq!(ct.subtype(), "html");
        // 値は大文字小文字を保持
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn test_parse_with_spaces() {
        let ct = ContentType::parse("  text/html  ;  charset = utf-8  ").unwrap();
        assert_eq!(ct.mime_type(), "text/html");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_parse_quoted_with_escape() {
        let ct = ContentType::parse("text/plain; name=\"hello\\\"world\"").unwrap();
        assert_eq!(ct.parameter("NAME"), Some("hello\"world"));
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let ct = ContentType::parse("text/plain; name=\"abc; def").unwrap();
        assert_eq!(ct.parameter("name"), Some("abc; def"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ContentType::parse(""), Err(ContentTypeError::Empty));
        assert_eq!(ContentType::parse(" ; "), Err(ContentTypeError::Empty));
        assert_eq!(
            ContentType::parse("text"),
            Err(ContentTypeError::InvalidMediaType)
        );
        assert_eq!(
            ContentType::parse("text/"),
            Err(ContentTypeError::InvalidMediaType)
        );
        assert_eq!(
            ContentType::parse("text/html, text/plain"),
            Err(ContentTypeError::InvalidMediaType)
        );
        assert_eq!(
            ContentType::parse("text/html; charset"),
            Err(ContentTypeError::InvalidParameter)
        );
    }

    #[test]
    fn test_display() {
        let ct = ContentType::new("text", "html").with_parameter("charset", "utf-8");
        assert_eq!(ct.to_string(), "text/html; charset=utf-8");
    }

    #[test]
    fn test_display_quoted() {
        let ct = ContentType::new("text", "plain").with_parameter("name", "hello \"world\"");
        assert_eq!(ct.to_string(), r#"text/plain; name="hello \"world\"""#);
        assert_eq!(ContentType::parse(&ct.to_string()).unwrap(), ct);
    }

    #[test]
    fn test_is_text() {
        assert!(ContentType::parse("text/plain").unwrap().is_text());
        assert!(!ContentType::parse("application/json").unwrap().is_text());
    }
}
