//! Accept-Language ヘッダーパース (RFC 9110 Section 12.5.4)
//!
//! [`DirectiveParser`](crate::directive::DirectiveParser) の上に言語レンジと q 値を載せます。
//! 不正な言語レンジや q 値を持つ要素は読み飛ばします。
//!
//! ```rust
//! use shiguredo_body_stream::accept_language::AcceptLanguage;
//!
//! let accept = AcceptLanguage::parse("da, en-GB;q=0.8, en;q=0.7").unwrap();
//! assert_eq!(accept.items().len(), 3);
//! assert_eq!(accept.items()[1].language(), "en-GB");
//! assert_eq!(accept.items()[1].qvalue().value(), 800);
//!
//! let accept = AcceptLanguage::parse("en;q=0.5, ja, *;q=0.1").unwrap();
//! let preferred: Vec<&str> = accept.preferred().collect();
//! assert_eq!(preferred, ["ja", "en", "*"]);
//! ```

use core::fmt;

use crate::directive::parse_directives;

/// Accept-Language パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptLanguageError {
    /// 空の入力
    Empty,
    /// 有効な言語レンジがひとつもない
    NoValidRange,
    /// 不正な q 値
    InvalidQValue,
}

impl fmt::Display for AcceptLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptLanguageError::Empty => write!(f, "empty Accept-Language"),
            AcceptLanguageError::NoValidRange => write!(f, "no valid language range"),
            AcceptLanguageError::InvalidQValue => write!(f, "invalid qvalue"),
        }
    }
}

impl std::error::Error for AcceptLanguageError {}

/// q 値 (ミリ単位、0-1000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QValue(u16);

impl QValue {
    /// 最大値 (q=1)
    pub const MAX: QValue = QValue(1000);

    /// `0` / `0.xxx` / `1` / `1.000` 形式をパース (小数部は 3 桁まで)
    pub fn parse(input: &str) -> Result<Self, AcceptLanguageError> {
        let input = input.trim();
        let (int, frac) = input.split_once('.').unwrap_or((input, ""));
        if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AcceptLanguageError::InvalidQValue);
        }

        let millis = frac
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(3)
            .fold(0u16, |acc, b| acc * 10 + (b - b'0') as u16);

        match int {
            "0" => Ok(QValue(millis)),
            "1" if millis == 0 => Ok(QValue::MAX),
            _ => Err(AcceptLanguageError::InvalidQValue),
        }
    }

    /// ミリ単位の値
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Default for QValue {
    fn default() -> Self {
        QValue::MAX
    }
}

impl fmt::Display for QValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => write!(f, "1"),
            0 => write!(f, "0"),
            millis => {
                let frac = format!("{:03}", millis);
                write!(f, "0.{}", frac.trim_end_matches('0'))
            }
        }
    }
}

/// 言語レンジと q 値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRange {
    language: String,
    q: QValue,
}

impl LanguageRange {
    pub fn new(language: &str, q: QValue) -> Self {
        LanguageRange {
            language: language.to_string(),
            q,
        }
    }

    /// 言語レンジ (`en-GB`, `*` など)
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn qvalue(&self) -> QValue {
        self.q
    }

    /// 言語タグがこのレンジに一致するか (RFC 4647 basic filtering)
    pub fn matches(&self, tag: &str) -> bool {
        if self.language == "*" {
            return true;
        }
        let range = self.language.as_str();
        match tag.get(..range.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(range) => {
                tag.len() == range.len() || tag.as_bytes()[range.len()] == b'-'
            }
            _ => false,
        }
    }
}

impl fmt::Display for LanguageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.language)?;
        if self.q != QValue::MAX {
            write!(f, ";q={}", self.q)?;
        }
        Ok(())
    }
}

/// Accept-Language ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptLanguage {
    items: Vec<LanguageRange>,
}

impl AcceptLanguage {
    /// Accept-Language ヘッダー値をパース
    pub fn parse(input: &str) -> Result<Self, AcceptLanguageError> {
        Self::parse_values([input])
    }

    /// 複数の Accept-Language ヘッダー値をまとめてパース
    pub fn parse_values<'a, I>(values: I) -> Result<Self, AcceptLanguageError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let groups = parse_directives(values);
        if groups.is_empty() {
            return Err(AcceptLanguageError::Empty);
        }

        let items: Vec<LanguageRange> = groups
            .iter()
            .filter_map(|group| {
                let (first, params) = group.split_first()?;
                if first.parameter().is_some() || !is_language_range(first.value()) {
                    return None;
                }
                let q = match params.iter().find(|d| d.is("q")) {
                    Some(d) => QValue::parse(d.parameter().unwrap_or_default()).ok()?,
                    None => QValue::MAX,
                };
                Some(LanguageRange::new(first.value(), q))
            })
            .collect();

        if items.is_empty() {
            return Err(AcceptLanguageError::NoValidRange);
        }
        Ok(AcceptLanguage { items })
    }

    /// ヘッダーの並び順の言語レンジ
    pub fn items(&self) -> &[LanguageRange] {
        &self.items
    }

    /// q 値の高い順 (同じ q 値はヘッダーの並び順) に言語レンジを返す
    ///
    /// q=0 は「受け付けない」を意味するため含めない。
    pub fn preferred(&self) -> impl Iterator<Item = &str> {
        let mut items: Vec<&LanguageRange> =
            self.items.iter().filter(|item| item.q.value() > 0).collect();
        items.sort_by(|a, b| b.q.cmp(&a.q));
        items.into_iter().map(|item| item.language())
    }

    /// 候補の言語タグから最も優先度の高いものを選ぶ
    pub fn negotiate<'a>(&self, available: &[&'a str]) -> Option<&'a str> {
        let mut best: Option<(QValue, &'a str)> = None;
        for &tag in available {
            // 最も具体的に一致したレンジの q 値を使う
            let q = self
                .items
                .iter()
                .filter(|range| range.matches(tag))
                .max_by_key(|range| match range.language.as_str() {
                    "*" => 0,
                    language => language.len(),
                })
                .map(|range| range.q);
            match q {
                Some(q) if q.value() > 0 && best.is_none_or(|(best_q, _)| q > best_q) => {
                    best = Some((q, tag));
                }
                _ => {}
            }
        }
        best.map(|(_, tag)| tag)
    }
}

impl fmt::Display for AcceptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.items.iter().map(|item| item.to_string()).collect();
        write!(f, "{}", values.join(", "))
    }
}

// language-range = (1*8ALPHA *("-" 1*8alphanum)) / "*"
fn is_language_range(s: &str) -> bool {
    if s == "*" {
        return true;
    }
    s.split('-').enumerate().all(|(i, part)| {
        (1..=8).contains(&part.len())
            && part.bytes().all(|b| {
                if i == 0 {
                    b.is_ascii_alphabetic()
                } else {
                    b.is_ascii_alphanumeric()
                }
            })
    })
}
