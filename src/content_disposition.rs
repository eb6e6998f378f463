//! Content-Disposition ヘッダーパース (RFC 6266)
//!
//! ## 概要
//!
//! [`DirectiveParser`](crate::directive::DirectiveParser) の上に
//! disposition-type と `name` / `filename` / `filename*` パラメータを載せます。
//!
//! `filename*` (RFC 5987 ext-value) のデコードに失敗した場合、
//! そのパラメータは無視して `filename` にフォールバックします。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::content_disposition::{ContentDisposition, DispositionType};
//!
//! let cd = ContentDisposition::parse(r#"form-data; name="fieldName"; filename="filename.jpg""#).unwrap();
//! assert_eq!(cd.disposition_type(), DispositionType::FormData);
//! assert_eq!(cd.name(), Some("fieldName"));
//! assert_eq!(cd.filename(), Some("filename.jpg"));
//!
//! let cd = ContentDisposition::parse("inline").unwrap();
//! assert!(cd.is_inline());
//! ```

use core::fmt;

use crate::directive::{DirectiveParser, escape_quoted};

/// Content-Disposition パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDispositionError {
    /// 空の入力
    Empty,
    /// 不正な形式
    InvalidFormat,
}

impl fmt::Display for ContentDispositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentDispositionError::Empty => write!(f, "empty content-disposition"),
            ContentDispositionError::InvalidFormat => {
                write!(f, "invalid content-disposition format")
            }
        }
    }
}

impl std::error::Error for ContentDispositionError {}

/// Disposition タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// inline: コンテンツをインラインで表示
    Inline,
    /// attachment: コンテンツをダウンロードとして扱う
    Attachment,
    /// form-data: multipart/form-data のパート用
    FormData,
}

impl DispositionType {
    /// 未知の disposition-type は attachment として扱う (RFC 6266 Section 4.2)
    fn from_name(s: &str) -> Self {
        if s.eq_ignore_ascii_case("inline") {
            DispositionType::Inline
        } else if s.eq_ignore_ascii_case("form-data") {
            DispositionType::FormData
        } else {
            DispositionType::Attachment
        }
    }
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispositionType::Inline => write!(f, "inline"),
            DispositionType::Attachment => write!(f, "attachment"),
            DispositionType::FormData => write!(f, "form-data"),
        }
    }
}

/// Content-Disposition ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: DispositionType,
    /// filename パラメータ
    filename: Option<String>,
    /// filename* パラメータ (デコード後)
    filename_ext: Option<String>,
    /// name パラメータ (form-data 用)
    name: Option<String>,
    /// その他のパラメータ
    parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Content-Disposition ヘッダー文字列をパース
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_body_stream::content_disposition::{ContentDisposition, DispositionType};
    ///
    /// let cd = ContentDisposition::parse("attachment; filename=\"report.pdf\"").unwrap();
    /// assert_eq!(cd.disposition_type(), DispositionType::Attachment);
    /// assert_eq!(cd.filename(), Some("report.pdf"));
    /// ```
    pub fn parse(input: &str) -> Result<Self, ContentDispositionError> {
        let directives = DirectiveParser::new(input)
            .next_directives()
            .ok_or(ContentDispositionError::Empty)?;

        let mut directives = directives.into_iter();
        let first = directives
            .next()
            .ok_or(ContentDispositionError::InvalidFormat)?;
        if first.parameter().is_some() {
            return Err(ContentDispositionError::InvalidFormat);
        }

        let mut cd = ContentDisposition::new(DispositionType::from_name(first.value()));

        for directive in directives {
            // 値のみのディレクティブは無視
            let Some(value) = directive.parameter() else {
                continue;
            };
            let name = directive.value().to_ascii_lowercase();
            match name.as_str() {
                "filename" => cd.filename = Some(value.to_string()),
                "filename*" => {
                    if let Some(decoded) = parse_ext_value(value) {
                        cd.filename_ext = Some(decoded);
                    }
                }
                "name" => cd.name = Some(value.to_string()),
                _ => cd.parameters.push((name, value.to_string())),
            }
        }

        Ok(cd)
    }

    /// 新しい ContentDisposition を作成
    pub fn new(disposition_type: DispositionType) -> Self {
        ContentDisposition {
            disposition_type,
            filename: None,
            filename_ext: None,
            name: None,
            parameters: Vec::new(),
        }
    }

    /// disposition-type を取得
    pub fn disposition_type(&self) -> DispositionType {
        self.disposition_type
    }

    /// filename を取得 (filename* があればそちらを優先)
    pub fn filename(&self) -> Option<&str> {
        self.filename_ext.as_deref().or(self.filename.as_deref())
    }

    /// filename パラメータを取得
    pub fn filename_ascii(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// filename* パラメータを取得 (デコード済み)
    pub fn filename_ext(&self) -> Option<&str> {
        self.filename_ext.as_deref()
    }

    /// name パラメータを取得
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// その他のパラメータを取得
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// inline かどうか
    pub fn is_inline(&self) -> bool {
        self.disposition_type == DispositionType::Inline
    }

    /// attachment かどうか
    pub fn is_attachment(&self) -> bool {
        self.disposition_type == DispositionType::Attachment
    }

    /// form-data かどうか
    pub fn is_form_data(&self) -> bool {
        self.disposition_type == DispositionType::FormData
    }

    /// filename を設定
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    /// filename* を設定
    pub fn with_filename_ext(mut self, filename: &str) -> Self {
        self.filename_ext = Some(filename.to_string());
        self
    }

    /// name を設定
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disposition_type)?;

        if let Some(name) = &self.name {
            write!(f, "; name=\"{}\"", escape_quoted(name))?;
        }
        if let Some(filename) = &self.filename {
            write!(f, "; filename=\"{}\"", escape_quoted(filename))?;
        }
        if let Some(filename_ext) = &self.filename_ext {
            write!(f, "; filename*=UTF-8''{}", encode_ext_value(filename_ext))?;
        }
        for (name, value) in &self.parameters {
            write!(f, "; {}=\"{}\"", name, escape_quoted(value))?;
        }

        Ok(())
    }
}

/// RFC 5987 ext-value をデコード
///
/// 形式: `charset'language'value` (例: `UTF-8''%E6%97%A5.txt`)。
/// UTF-8 以外の charset は扱わない。
fn parse_ext_value(value: &str) -> Option<String> {
    let (charset, rest) = value.split_once('\'')?;
    let (_language, encoded) = rest.split_once('\'')?;

    if !charset.eq_ignore_ascii_case("UTF-8") {
        return None;
    }

    percent_decode(encoded)
}

fn percent_decode(s: &str) -> Option<String> {
    let input = s.as_bytes();
    let mut bytes = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            let hex = core::str::from_utf8(hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            bytes.push(input[i]);
            i += 1;
        }
    }

    String::from_utf8(bytes).ok()
}

/// RFC 5987 ext-value 用にエンコード
fn encode_ext_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        if is_attr_char(byte) {
            result.push(byte as char);
        } else {
            result.push_str(&format!("%{:02X}", byte));
        }
    }
    result
}

/// RFC 5987 attr-char
fn is_attr_char(b: u8) -> bool {
    matches!(b,
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
        b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~'
    )
}
