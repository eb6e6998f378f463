//! ボディのフレーミング判定 (RFC 9112 Section 6)
//!
//! ## 概要
//!
//! `Transfer-Encoding` / `Content-Length` / `Connection` ヘッダーを構造的に解釈し、
//! ボディがどこで終わるかを決定します。
//! 判定結果はトランスポート側がバイト列を切り出すために使い、
//! 切り出したチャンクを [`BodyStreamState`](crate::BodyStreamState) に渡します。
//!
//! - `chunked` は一度だけ、かつ最後の転送コーディングでなければならない
//! - 複数の `Content-Length` はすべて同じ値でなければならない
//! - リクエストで `Transfer-Encoding` と `Content-Length` の両方がある場合はエラー
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::framing::{BodyFraming, ConnectionOptions};
//!
//! let headers = vec![("Transfer-Encoding".to_string(), "gzip, chunked".to_string())];
//! assert_eq!(BodyFraming::for_request(&headers), Ok(BodyFraming::Chunked));
//!
//! let headers = vec![("Content-Length".to_string(), "13".to_string())];
//! assert_eq!(BodyFraming::for_response(200, &headers), Ok(BodyFraming::ContentLength(13)));
//! assert_eq!(BodyFraming::for_response(304, &headers), Ok(BodyFraming::None));
//!
//! let headers = vec![("Connection".to_string(), "close".to_string())];
//! assert!(!ConnectionOptions::parse(&headers).is_keep_alive("HTTP/1.1"));
//! ```

use core::fmt;

use crate::directive::parse_directives;
use crate::headers::HeaderFields;

/// フレーミング判定エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Transfer-Encoding に転送コーディングがない
    EmptyTransferEncoding,
    /// chunked が複数回指定されている
    DuplicateChunked,
    /// リクエストで chunked が最後の転送コーディングではない
    ChunkedNotLast,
    /// Content-Length が数値ではない
    InvalidContentLength,
    /// Content-Length の値が一致しない
    MismatchedContentLength,
    /// リクエストに Transfer-Encoding と Content-Length の両方がある
    ConflictingFraming,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::EmptyTransferEncoding => {
                write!(f, "invalid Transfer-Encoding: empty value")
            }
            FramingError::DuplicateChunked => {
                write!(f, "invalid Transfer-Encoding: duplicate chunked")
            }
            FramingError::ChunkedNotLast => {
                write!(f, "invalid Transfer-Encoding: chunked is not the final coding")
            }
            FramingError::InvalidContentLength => {
                write!(f, "invalid Content-Length: not a number")
            }
            FramingError::MismatchedContentLength => {
                write!(f, "invalid Content-Length: mismatched values")
            }
            FramingError::ConflictingFraming => {
                write!(f, "invalid message: both Transfer-Encoding and Content-Length")
            }
        }
    }
}

impl std::error::Error for FramingError {}

/// ボディのフレーミング
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// ボディなし
    None,
    /// Content-Length で指定された固定長
    ContentLength(u64),
    /// Transfer-Encoding: chunked
    Chunked,
    /// 接続が閉じるまでがボディ (レスポンスのみ)
    CloseDelimited,
}

impl BodyFraming {
    /// リクエストのフレーミングを決定
    ///
    /// Transfer-Encoding も Content-Length もなければ [`BodyFraming::None`]。
    pub fn for_request(headers: &[(String, String)]) -> Result<Self, FramingError> {
        let coding = transfer_coding(headers)?;
        let content_length = content_length(headers)?;

        match (coding, content_length) {
            (Some(_), Some(_)) => Err(FramingError::ConflictingFraming),
            (Some(TransferCoding::Chunked), None) => Ok(BodyFraming::Chunked),
            // リクエストは close-delimited にできない
            (Some(TransferCoding::Other), None) => Err(FramingError::ChunkedNotLast),
            (None, Some(len)) => Ok(BodyFraming::ContentLength(len)),
            (None, None) => Ok(BodyFraming::None),
        }
    }

    /// レスポンスのフレーミングを決定
    ///
    /// 1xx / 204 / 304 はボディなし。Transfer-Encoding は Content-Length より優先する。
    /// HEAD リクエストへのレスポンスはヘッダーに関係なくボディを持たないため、
    /// 呼び出し側で [`BodyFraming::None`] として扱うこと。
    pub fn for_response(status: u16, headers: &[(String, String)]) -> Result<Self, FramingError> {
        if !status_has_body(status) {
            return Ok(BodyFraming::None);
        }

        // レスポンスでは chunked が最後でなくても close-delimited として読める
        let coding = match transfer_coding(headers) {
            Err(FramingError::ChunkedNotLast) => Some(TransferCoding::Other),
            other => other?,
        };
        if let Some(coding) = coding {
            return Ok(match coding {
                TransferCoding::Chunked => BodyFraming::Chunked,
                TransferCoding::Other => BodyFraming::CloseDelimited,
            });
        }

        Ok(match content_length(headers)? {
            Some(len) => BodyFraming::ContentLength(len),
            None => BodyFraming::CloseDelimited,
        })
    }

    /// ボディを持つかどうか
    pub fn has_body(&self) -> bool {
        !matches!(self, BodyFraming::None | BodyFraming::ContentLength(0))
    }
}

impl fmt::Display for BodyFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyFraming::None => write!(f, "none"),
            BodyFraming::ContentLength(len) => write!(f, "content-length({})", len),
            BodyFraming::Chunked => write!(f, "chunked"),
            BodyFraming::CloseDelimited => write!(f, "close-delimited"),
        }
    }
}

/// Transfer-Encoding の最終コーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferCoding {
    Chunked,
    Other,
}

/// Transfer-Encoding ヘッダーを解釈
///
/// 複数の Transfer-Encoding ヘッダーはひとつのリストとして連結する。
fn transfer_coding(headers: &[(String, String)]) -> Result<Option<TransferCoding>, FramingError> {
    let values = headers.get_headers("Transfer-Encoding");
    if values.is_empty() {
        return Ok(None);
    }

    let groups = parse_directives(values);
    let Some(last) = groups.len().checked_sub(1) else {
        return Err(FramingError::EmptyTransferEncoding);
    };

    let mut chunked_at = None;
    for (i, group) in groups.iter().enumerate() {
        // 転送コーディングのパラメータ (`gzip; q=1` など) は無視
        let Some(coding) = group.first() else {
            continue;
        };
        if coding.is("chunked") {
            if chunked_at.is_some() {
                return Err(FramingError::DuplicateChunked);
            }
            chunked_at = Some(i);
        }
    }

    match chunked_at {
        Some(i) if i == last => Ok(Some(TransferCoding::Chunked)),
        Some(_) => Err(FramingError::ChunkedNotLast),
        None => Ok(Some(TransferCoding::Other)),
    }
}

/// Content-Length ヘッダーを解釈
///
/// `Content-Length: 5, 5` のようなリストも同じ値であれば受け付ける。
fn content_length(headers: &[(String, String)]) -> Result<Option<u64>, FramingError> {
    let mut value = None;
    for raw in headers.get_headers("Content-Length") {
        for item in raw.split(',') {
            let parsed = parse_content_length_value(item)?;
            match value {
                Some(prev) if prev != parsed => {
                    return Err(FramingError::MismatchedContentLength);
                }
                _ => value = Some(parsed),
            }
        }
    }
    Ok(value)
}

fn parse_content_length_value(input: &str) -> Result<u64, FramingError> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FramingError::InvalidContentLength);
    }
    input
        .parse::<u64>()
        .map_err(|_| FramingError::InvalidContentLength)
}

fn status_has_body(status: u16) -> bool {
    !matches!(status, 100..=199 | 204 | 304)
}

/// Connection ヘッダーのオプション
///
/// 複数の Connection ヘッダーはひとつのリストとして扱う。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionOptions {
    /// close トークン
    pub close: bool,
    /// keep-alive トークン
    pub keep_alive: bool,
    /// upgrade トークン
    pub upgrade: bool,
    /// その他のトークン (小文字化済み、hop-by-hop ヘッダー名)
    pub others: Vec<String>,
}

impl ConnectionOptions {
    /// ヘッダーリストから Connection オプションを取得
    pub fn parse(headers: &[(String, String)]) -> Self {
        let mut options = ConnectionOptions::default();
        for group in parse_directives(headers.get_headers("Connection")) {
            let Some(token) = group.first() else {
                continue;
            };
            if token.is("close") {
                options.close = true;
            } else if token.is("keep-alive") {
                options.keep_alive = true;
            } else if token.is("upgrade") {
                options.upgrade = true;
            } else {
                options.others.push(token.value().to_ascii_lowercase());
            }
        }
        options
    }

    /// 接続を維持するかどうか
    ///
    /// HTTP/2 以降は Connection ヘッダーに関係なく維持する。
    /// HTTP/1.x では close が最優先、次に keep-alive、どちらもなければ HTTP/1.1 以降なら維持する。
    /// バージョンを解釈できない場合は維持しない。
    pub fn is_keep_alive(&self, version: &str) -> bool {
        let Some((major, minor)) = parse_http_version(version) else {
            return false;
        };
        if major >= 2 {
            return true;
        }
        if self.close {
            return false;
        }
        if self.keep_alive {
            return true;
        }
        (major, minor) >= (1, 1)
    }
}

/// `HTTP/1.1` や `HTTP/2` を (major, minor) に分解
fn parse_http_version(version: &str) -> Option<(u32, u32)> {
    let (scheme, number) = version.trim().split_once('/')?;
    if !scheme.eq_ignore_ascii_case("HTTP") {
        return None;
    }
    let (major, minor) = number.split_once('.').unwrap_or((number, "0"));
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(major) || !is_digits(minor) {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}
