//! HTTP ヘッダー値のディレクティブパーサー
//!
//! ## 概要
//!
//! Content-Type, Forwarded, Content-Disposition, Cache-Control など
//! `value; key=value, value` 形式のヘッダー値を共通の規則で分解します。
//!
//! - `,` で区切られた単位を「グループ」とする
//! - グループ内は `;` で区切られた「ディレクティブ」の並び
//! - ディレクティブは値のみ (`foo`) か `key=value` / `key="quoted value"`
//! - 引用符内の `;` `,` `=` は区切りとして扱わない
//! - 引用符内の `\x` は `x` にデコードする
//!
//! 不正な入力でもパニックせず、可能な範囲で文字列として解釈します。
//! 閉じ引用符がない場合、残りすべてを値として扱います。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::directive::{Directive, DirectiveParser};
//!
//! let mut parser = DirectiveParser::new(r#""a;b"; c="d;e", f"#);
//! assert_eq!(
//!     parser.next_directives(),
//!     Some(vec![Directive::new("a;b"), Directive::with_parameter("c", "d;e")])
//! );
//! assert_eq!(parser.next_directives(), Some(vec![Directive::new("f")]));
//! assert_eq!(parser.next_directives(), None);
//! ```

use core::fmt;

/// パース済みディレクティブ
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    /// 値 (`key=value` の場合は key)
    pub value: String,
    /// パラメータ (`key=value` の場合の value)
    pub parameter: Option<String>,
}

impl Directive {
    /// 値のみのディレクティブを作成
    pub fn new(value: &str) -> Self {
        Directive {
            value: value.to_string(),
            parameter: None,
        }
    }

    /// パラメータ付きディレクティブを作成
    pub fn with_parameter(value: &str, parameter: &str) -> Self {
        Directive {
            value: value.to_string(),
            parameter: Some(parameter.to_string()),
        }
    }

    /// 値を取得
    pub fn value(&self) -> &str {
        &self.value
    }

    /// パラメータを取得
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// 値が指定した名前と一致するか (大文字小文字を区別しない)
    pub fn is(&self, name: &str) -> bool {
        self.value.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(parameter) => write!(f, "{}=\"{}\"", self.value, escape_quoted(parameter)),
            None => write!(f, "{}", self.value),
        }
    }
}

/// ディレクティブパーサー
///
/// 文字列の先頭から前進するだけのカーソル。途中からの再開はできないため、
/// 最初からやり直す場合は新しいパーサーを作ること。
#[derive(Debug, Clone)]
pub struct DirectiveParser<'a> {
    rest: &'a str,
}

impl<'a> DirectiveParser<'a> {
    /// 新しいパーサーを作成
    pub fn new(input: &'a str) -> Self {
        DirectiveParser { rest: input }
    }

    /// 未消費の入力を取得
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    /// 次のグループを取得
    ///
    /// 入力を使い切ったら `None` を返す。空のグループは読み飛ばす。
    pub fn next_directives(&mut self) -> Option<Vec<Directive>> {
        loop {
            self.skip_whitespace();
            if self.rest.is_empty() {
                return None;
            }

            let mut directives = Vec::new();
            while let Some(directive) = self.next_directive() {
                if directive.value.is_empty() && directive.parameter.is_none() {
                    continue;
                }
                directives.push(directive);
            }

            if !directives.is_empty() {
                return Some(directives);
            }
        }
    }

    /// グループ内の次のディレクティブを取得
    ///
    /// グループ終端 (`,`) または入力終端で `None` を返す。
    /// `Some` を返す場合は必ず 1 バイト以上消費する。
    fn next_directive(&mut self) -> Option<Directive> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return None;
        }

        if self.rest.starts_with(',') {
            self.advance(1);
            return None;
        }

        if let Some(equals) = self.parameter_key_end() {
            let key = trim_whitespace(&self.rest[..equals]).to_string();
            self.advance(equals + 1);
            let parameter = self.next_value();
            Some(Directive {
                value: key,
                parameter: Some(parameter),
            })
        } else {
            let value = self.next_value();
            Some(Directive {
                value,
                parameter: None,
            })
        }
    }

    /// 値をひとつ読み取る (引用符付きまたはトークン)
    fn next_value(&mut self) -> String {
        self.skip_whitespace();

        if self.rest.starts_with('"') {
            self.advance(1);
            return match find_closing_quote(self.rest) {
                Some(end) => {
                    let value = unescape(&self.rest[..end]);
                    self.advance(end + 1);
                    self.skip_whitespace();
                    if self.rest.starts_with(';') {
                        self.advance(1);
                    }
                    value
                }
                None => {
                    // 閉じ引用符がない場合は残りすべてを値とする
                    let value = unescape(trim_whitespace(self.rest));
                    self.rest = "";
                    value
                }
            };
        }

        match self.rest.find([';', ',']) {
            Some(pos) => {
                let value = trim_whitespace(&self.rest[..pos]).to_string();
                if self.rest.as_bytes()[pos] == b';' {
                    self.advance(pos + 1);
                } else {
                    // `,` はグループ終端として次の呼び出しで消費する
                    self.advance(pos);
                }
                value
            }
            None => {
                let value = trim_whitespace(self.rest).to_string();
                self.rest = "";
                value
            }
        }
    }

    /// `key=` 形式であれば `=` の位置を返す
    ///
    /// key と `=` の間の空白は許容する。
    fn parameter_key_end(&self) -> Option<usize> {
        let mut after_whitespace = false;
        for (i, c) in self.rest.char_indices() {
            if c == '=' {
                return Some(i);
            }
            if is_linear_whitespace(c) {
                after_whitespace = true;
            } else if after_whitespace || !is_key_char(c) {
                return None;
            }
        }
        None
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start_matches(is_linear_whitespace);
    }

    fn advance(&mut self, n: usize) {
        self.rest = &self.rest[n..];
    }
}

impl Iterator for DirectiveParser<'_> {
    type Item = Vec<Directive>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_directives()
    }
}

/// 複数のヘッダー値をまとめてパース
///
/// 同名ヘッダーが複数ある場合、それぞれのグループを順に連結する。
pub fn parse_directives<'a, I>(values: I) -> Vec<Vec<Directive>>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(DirectiveParser::new)
        .collect()
}

/// グループの並びをヘッダー値にシリアライズ
///
/// パラメータは常に引用符で囲む。
pub fn serialize_directives(groups: &[Vec<Directive>]) -> String {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|directive| directive.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// 引用符付き文字列用にエスケープ
pub(crate) fn escape_quoted(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// エスケープされていない閉じ引用符の位置
fn find_closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, b) in s.bytes().enumerate() {
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            return Some(i);
        }
    }
    None
}

/// quoted-pair をデコード
fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            // 末尾の `\` はそのまま残す
            result.push(chars.next().unwrap_or('\\'));
        } else {
            result.push(c);
        }
    }
    result
}

fn trim_whitespace(s: &str) -> &str {
    s.trim_matches(is_linear_whitespace)
}

fn is_linear_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '*'
}
