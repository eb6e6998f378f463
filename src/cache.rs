//! HTTP キャッシュヘッダー (RFC 9111)
//!
//! ## 概要
//!
//! RFC 9111 に基づいたキャッシュ関連ヘッダーのパース/生成と、
//! レスポンスヘッダーからの有効期限計算を提供します。
//!
//! 有効期限は次の優先順で決まります:
//!
//! 1. `Cache-Control: no-store` があれば有効期限なし (キャッシュしない)
//! 2. `Cache-Control: max-age=N` があればリクエスト送信時刻 + N 秒
//! 3. `Expires` があればその日時
//! 4. いずれもなければ有効期限なし
//!
//! パースできない `Cache-Control` / `Expires` は「指定なし」として扱います。
//!
//! ## 使い方
//!
//! ```rust
//! use std::time::{Duration, UNIX_EPOCH};
//! use shiguredo_body_stream::cache::{CacheControl, Age, Expires, expiration};
//!
//! // Cache-Control パース
//! let cc = CacheControl::parse("max-age=3600, public").unwrap();
//! assert_eq!(cc.max_age(), Some(3600));
//! assert!(cc.is_public());
//!
//! // Age ヘッダー
//! let age = Age::new(120);
//! assert_eq!(age.seconds(), 120);
//!
//! // Expires ヘッダー
//! let expires = Expires::parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
//!
//! // 有効期限の計算
//! let sent_at = UNIX_EPOCH + Duration::from_secs(1_000);
//! let headers = vec![("Cache-Control".to_string(), "max-age=60".to_string())];
//! assert_eq!(expiration(&headers, sent_at), Some(sent_at + Duration::from_secs(60)));
//! ```

use core::fmt;
use std::time::{Duration, SystemTime};

use crate::date::HttpDate;
use crate::directive::parse_directives;
use crate::headers::HeaderFields;

/// キャッシュヘッダーパースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// 空の入力
    Empty,
    /// 不正な形式 (既知のディレクティブがない)
    InvalidFormat,
    /// 不正な数値
    InvalidNumber,
    /// 日付パースエラー
    InvalidDate,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Empty => write!(f, "empty cache header"),
            CacheError::InvalidFormat => write!(f, "invalid cache header format"),
            CacheError::InvalidNumber => write!(f, "invalid number in cache header"),
            CacheError::InvalidDate => write!(f, "invalid date in cache header"),
        }
    }
}

impl std::error::Error for CacheError {}

/// max-stale ディレクティブ
///
/// 値なし (`max-stale`) は上限なしを表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxStale {
    /// 許容する古さの上限 (秒)
    pub seconds: Option<u64>,
}

/// Cache-Control ヘッダー
///
/// RFC 9111 Section 5.2
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheControl {
    /// max-age ディレクティブ
    max_age: Option<u64>,
    /// s-maxage ディレクティブ
    s_maxage: Option<u64>,
    /// max-stale ディレクティブ
    max_stale: Option<MaxStale>,
    /// min-fresh ディレクティブ
    min_fresh: Option<u64>,
    /// stale-while-revalidate ディレクティブ
    stale_while_revalidate: Option<u64>,
    /// stale-if-error ディレクティブ
    stale_if_error: Option<u64>,
    /// no-cache ディレクティブ
    no_cache: bool,
    /// no-store ディレクティブ
    no_store: bool,
    /// no-transform ディレクティブ
    no_transform: bool,
    /// only-if-cached ディレクティブ
    only_if_cached: bool,
    /// must-revalidate ディレクティブ
    must_revalidate: bool,
    /// proxy-revalidate ディレクティブ
    proxy_revalidate: bool,
    /// must-understand ディレクティブ
    must_understand: bool,
    /// public ディレクティブ
    public: bool,
    /// private ディレクティブ
    private: bool,
    /// immutable ディレクティブ
    immutable: bool,
}

impl CacheControl {
    /// 新しい Cache-Control を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache-Control ヘッダーをパース
    ///
    /// 未知のディレクティブと不正な数値は無視する。
    /// 既知のディレクティブがひとつもなければ `CacheError::InvalidFormat` を返す。
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_body_stream::cache::CacheControl;
    ///
    /// let cc = CacheControl::parse("max-age=3600, public").unwrap();
    /// assert_eq!(cc.max_age(), Some(3600));
    /// assert!(cc.is_public());
    ///
    /// assert!(CacheControl::parse("random garbage").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, CacheError> {
        Self::parse_values([input])
    }

    /// 複数の Cache-Control ヘッダー値をまとめてパース
    pub fn parse_values<'a, I>(values: I) -> Result<Self, CacheError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let groups = parse_directives(values);
        if groups.is_empty() {
            return Err(CacheError::Empty);
        }

        let mut cc = CacheControl::new();
        let mut found = false;

        for directive in groups.iter().flatten() {
            let name = directive.value().to_ascii_lowercase();

            let Some(value) = directive.parameter() else {
                if name == "max-stale" {
                    cc.max_stale = Some(MaxStale { seconds: None });
                    found = true;
                } else {
                    found |= cc.set_flag(&name);
                }
                continue;
            };

            let slot = match name.as_str() {
                "max-age" => &mut cc.max_age,
                "s-maxage" => &mut cc.s_maxage,
                "min-fresh" => &mut cc.min_fresh,
                "stale-while-revalidate" => &mut cc.stale_while_revalidate,
                "stale-if-error" => &mut cc.stale_if_error,
                "max-stale" => {
                    if let Ok(seconds) = parse_seconds(value.trim()) {
                        cc.max_stale = Some(MaxStale {
                            seconds: Some(seconds),
                        });
                        found = true;
                    }
                    continue;
                }
                // no-cache="Set-Cookie" などのフィールド名リストはフラグとして扱う
                _ => {
                    found |= cc.set_flag(&name);
                    continue;
                }
            };
            // 不正な数値は無視
            if let Ok(seconds) = parse_seconds(value.trim()) {
                *slot = Some(seconds);
                found = true;
            }
        }

        if found {
            Ok(cc)
        } else {
            Err(CacheError::InvalidFormat)
        }
    }

    /// フラグディレクティブを設定 (未知の名前なら false)
    fn set_flag(&mut self, name: &str) -> bool {
        let flag = match name {
            "no-cache" => &mut self.no_cache,
            "no-store" => &mut self.no_store,
            "no-transform" => &mut self.no_transform,
            "only-if-cached" => &mut self.only_if_cached,
            "must-revalidate" => &mut self.must_revalidate,
            "proxy-revalidate" => &mut self.proxy_revalidate,
            "must-understand" => &mut self.must_understand,
            "public" => &mut self.public,
            "private" => &mut self.private,
            "immutable" => &mut self.immutable,
            _ => return false,
        };
        *flag = true;
        true
    }

    /// max-age を設定
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// s-maxage を設定
    pub fn with_s_maxage(mut self, seconds: u64) -> Self {
        self.s_maxage = Some(seconds);
        self
    }

    /// max-stale を設定 (`None` は上限なし)
    pub fn with_max_stale(mut self, seconds: Option<u64>) -> Self {
        self.max_stale = Some(MaxStale { seconds });
        self
    }

    /// no-cache を設定
    pub fn with_no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// no-store を設定
    pub fn with_no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    /// no-transform を設定
    pub fn with_no_transform(mut self) -> Self {
        self.no_transform = true;
        self
    }

    /// must-revalidate を設定
    pub fn with_must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// public を設定
    pub fn with_public(mut self) -> Self {
        self.public = true;
        self
    }

    /// private を設定
    pub fn with_private(mut self) -> Self {
        self.private = true;
        self
    }

    /// immutable を設定
    pub fn with_immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// max-age を取得
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// s-maxage を取得
    pub fn s_maxage(&self) -> Option<u64> {
        self.s_maxage
    }

    /// max-stale を取得
    pub fn max_stale(&self) -> Option<MaxStale> {
        self.max_stale
    }

    /// min-fresh を取得
    pub fn min_fresh(&self) -> Option<u64> {
        self.min_fresh
    }

    /// stale-while-revalidate を取得
    pub fn stale_while_revalidate(&self) -> Option<u64> {
        self.stale_while_revalidate
    }

    /// stale-if-error を取得
    pub fn stale_if_error(&self) -> Option<u64> {
        self.stale_if_error
    }

    /// no-cache かどうか
    pub fn is_no_cache(&self) -> bool {
        self.no_cache
    }

    /// no-store かどうか
    pub fn is_no_store(&self) -> bool {
        self.no_store
    }

    /// no-transform かどうか
    pub fn is_no_transform(&self) -> bool {
        self.no_transform
    }

    /// only-if-cached かどうか
    pub fn is_only_if_cached(&self) -> bool {
        self.only_if_cached
    }

    /// must-revalidate かどうか
    pub fn is_must_revalidate(&self) -> bool {
        self.must_revalidate
    }

    /// proxy-revalidate かどうか
    pub fn is_proxy_revalidate(&self) -> bool {
        self.proxy_revalidate
    }

    /// must-understand かどうか
    pub fn is_must_understand(&self) -> bool {
        self.must_understand
    }

    /// public かどうか
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// private かどうか
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// immutable かどうか
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// キャッシュ可能かどうか (簡易判定)
    pub fn is_cacheable(&self) -> bool {
        !self.no_store && (self.public || self.max_age.is_some() || self.s_maxage.is_some())
    }

    /// ヘッダー値を生成
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(max_age) = self.max_age {
            parts.push(format!("max-age={}", max_age));
        }
        if let Some(s_maxage) = self.s_maxage {
            parts.push(format!("s-maxage={}", s_maxage));
        }
        match self.max_stale {
            Some(MaxStale {
                seconds: Some(seconds),
            }) => parts.push(format!("max-stale={}", seconds)),
            Some(MaxStale { seconds: None }) => parts.push("max-stale".to_string()),
            None => {}
        }
        if let Some(min_fresh) = self.min_fresh {
            parts.push(format!("min-fresh={}", min_fresh));
        }
        if let Some(swr) = self.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", swr));
        }
        if let Some(sie) = self.stale_if_error {
            parts.push(format!("stale-if-error={}", sie));
        }

        for (enabled, name) in [
            (self.no_cache, "no-cache"),
            (self.no_store, "no-store"),
            (self.no_transform, "no-transform"),
            (self.only_if_cached, "only-if-cached"),
            (self.must_revalidate, "must-revalidate"),
            (self.proxy_revalidate, "proxy-revalidate"),
            (self.must_understand, "must-understand"),
            (self.public, "public"),
            (self.private, "private"),
            (self.immutable, "immutable"),
        ] {
            if enabled {
                parts.push(name.to_string());
            }
        }

        write!(f, "{}", parts.join(", "))
    }
}

/// Age ヘッダー
///
/// RFC 9111 Section 5.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    /// 秒数
    seconds: u64,
}

impl Age {
    /// 新しい Age ヘッダーを作成
    pub fn new(seconds: u64) -> Self {
        Age { seconds }
    }

    /// Age ヘッダーをパース
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_body_stream::cache::Age;
    ///
    /// let age = Age::parse("120").unwrap();
    /// assert_eq!(age.seconds(), 120);
    /// ```
    pub fn parse(input: &str) -> Result<Self, CacheError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CacheError::Empty);
        }

        let seconds = parse_seconds(input)?;
        Ok(Age { seconds })
    }

    /// 秒数を取得
    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.seconds)
    }
}

/// Expires ヘッダー
///
/// RFC 9111 Section 5.3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expires {
    /// 日時
    date: HttpDate,
}

impl Expires {
    /// 新しい Expires ヘッダーを作成
    pub fn new(date: HttpDate) -> Self {
        Expires { date }
    }

    /// Expires ヘッダーをパース
    ///
    /// IMF-fixdate, RFC 850, asctime の順に試す。
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_body_stream::cache::Expires;
    ///
    /// let expires = Expires::parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
    /// assert_eq!(expires.date().year(), 1994);
    /// ```
    pub fn parse(input: &str) -> Result<Self, CacheError> {
        let date = HttpDate::parse(input).map_err(|_| CacheError::InvalidDate)?;
        Ok(Expires { date })
    }

    /// 日時を取得
    pub fn date(&self) -> &HttpDate {
        &self.date
    }

    /// `SystemTime` に変換
    pub fn to_system_time(&self) -> SystemTime {
        self.date.to_system_time()
    }

    /// ヘッダー値を生成
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)
    }
}

/// レスポンスヘッダーから有効期限を計算
///
/// `request_sent_at` はリクエストを送信した時刻。
/// キャッシュすべきでない場合、または有効期限の指定がない場合は `None` を返す。
pub fn expiration(
    headers: &[(String, String)],
    request_sent_at: SystemTime,
) -> Option<SystemTime> {
    let cache_control = headers.get_headers("Cache-Control");
    if let Ok(cc) = CacheControl::parse_values(cache_control) {
        if cc.is_no_store() {
            return None;
        }
        if let Some(max_age) = cc.max_age() {
            return request_sent_at.checked_add(Duration::from_secs(max_age));
        }
    }

    let expires = Expires::parse(headers.get_header("Expires")?).ok()?;
    Some(expires.to_system_time())
}

/// 秒数をパース
fn parse_seconds(s: &str) -> Result<u64, CacheError> {
    s.parse::<u64>().map_err(|_| CacheError::InvalidNumber)
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    fn sent_at() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[test]
    fn test_cache_control_parse_max_age() {
        let cc = CacheControl::parse("max-age=3600").unwrap();
        assert_eq!(cc.max_age(), Some(3600));
    }

    #[test]
    fn test_cache_control_parse_multiple() {
        let cc = CacheControl::parse("max-age=3600, public, no-transform").unwrap();
        assert_eq!(cc.max_age(), Some(3600));
        assert!(cc.is_public());
        assert!(cc.is_no_transform());
    }

    #[test]
    fn test_cache_control_flags() {
        let cc = CacheControl::parse("no-store, max-age=12").unwrap();
        assert!(cc.is_no_store());
        assert!(!cc.is_immutable());
        assert_eq!(cc.max_age(), Some(12));
        assert!(!cc.is_cacheable());
    }

    #[test]
    fn test_cache_control_case_insensitive() {
        let cc = CacheControl::parse("Max-Age=60, IMMUTABLE").unwrap();
        assert_eq!(cc.max_age(), Some(60));
        assert!(cc.is_immutable());
    }

    #[test]
    fn test_cache_control_quoted_value() {
        let cc = CacheControl::parse(r#"max-age="300""#).unwrap();
        assert_eq!(cc.max_age(), Some(300));
    }

    #[test]
    fn test_cache_control_field_name_list() {
        let cc = CacheControl::parse(r#"private="Set-Cookie", no-cache="Authorization""#).unwrap();
        assert!(cc.is_private());
        assert!(cc.is_no_cache());
    }

    #[test]
    fn test_cache_control_max_stale_without_value() {
        let cc = CacheControl::parse("max-stale").unwrap();
        assert_eq!(cc.max_stale(), Some(MaxStale { seconds: None }));
    }

    #[test]
    fn test_cache_control_max_stale_with_value() {
        let cc = CacheControl::parse("max-stale=12").unwrap();
        assert_eq!(cc.max_stale(), Some(MaxStale { seconds: Some(12) }));
    }

    #[test]
    fn test_cache_control_invalid_number_ignored() {
        let cc = CacheControl::parse("max-age=abc, max-age=-1, public").unwrap();
        assert_eq!(cc.max_age(), None);
        assert!(cc.is_public());

        assert_eq!(
            CacheControl::parse("max-age=abc"),
            Err(CacheError::InvalidFormat)
        );
    }

    #[test]
    fn test_cache_control_parse_garbage() {
        assert_eq!(
            CacheControl::parse("random garbage"),
            Err(CacheError::InvalidFormat)
        );
        assert_eq!(CacheControl::parse(""), Err(CacheError::Empty));
        assert_eq!(CacheControl::parse(" , "), Err(CacheError::Empty));
    }

    #[test]
    fn test_cache_control_parse_values() {
        let cc = CacheControl::parse_values(["no-cache", "max-age=10"]).unwrap();
        assert!(cc.is_no_cache());
        assert_eq!(cc.max_age(), Some(10));
    }

    #[test]
    fn test_cache_control_display() {
        let cc = CacheControl::new()
            .with_max_age(3600)
            .with_max_stale(None)
            .with_public();
        assert_eq!(cc.to_string(), "max-age=3600, max-stale, public");

        let cc = CacheControl::new().with_immutable();
        assert_eq!(cc.to_header_value(), "immutable");
    }

    #[test]
    fn test_cache_control_roundtrip() {
        let original = CacheControl::new()
            .with_max_age(3600)
            .with_max_stale(Some(30))
            .with_private()
            .with_must_revalidate();

        let reparsed = CacheControl::parse(&original.to_string()).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_age_parse() {
        assert_eq!(Age::parse("120").unwrap().seconds(), 120);
        assert_eq!(Age::parse(" 0 ").unwrap().seconds(), 0);
        assert_eq!(Age::parse(""), Err(CacheError::Empty));
        assert_eq!(Age::parse("-1"), Err(CacheError::InvalidNumber));
        assert_eq!(Age::new(120).to_string(), "120");
    }

    #[test]
    fn test_expires_parse() {
        let expires = Expires::parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(expires.date().year(), 1994);
        assert_eq!(expires.date().month(), 11);
        assert_eq!(expires.date().day(), 6);
        assert_eq!(expires.to_header_value(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_expires_parse_invalid() {
        assert_eq!(Expires::parse("0"), Err(CacheError::InvalidDate));
        assert!(Expires::parse("").is_err());
    }

    #[test]
    fn test_expiration_no_store_with_expires() {
        let headers = headers(&[
            ("Expires", "Sun, 06 Nov 1994 08:49:37 GMT"),
            ("Cache-Control", "no-store, max-age=12"),
        ]);
        assert_eq!(expiration(&headers, sent_at()), None);
    }

    #[test]
    fn test_expiration_no_store() {
        let headers = headers(&[("Cache-Control", "no-store, max-age=12")]);
        assert_eq!(expiration(&headers, sent_at()), None);
    }

    #[test]
    fn test_expiration_max_age() {
        let headers = headers(&[("Cache-Control", "max-age=3000333")]);
        assert_eq!(
            expiration(&headers, sent_at()),
            Some(sent_at() + Duration::from_secs(3_000_333))
        );
    }

    #[test]
    fn test_expiration_max_age_overrides_expires() {
        let headers = headers(&[
            ("Expires", "Sun, 06 Nov 1994 08:49:37 GMT"),
            ("Cache-Control", "max-age=42"),
        ]);
        assert_eq!(
            expiration(&headers, sent_at()),
            Some(sent_at() + Duration::from_secs(42))
        );
    }

    #[test]
    fn test_expiration_no_matching() {
        let headers = headers(&[("Cache-Control", "random garbage")]);
        assert_eq!(expiration(&headers, sent_at()), None);
    }

    #[test]
    fn test_expiration_invalid_calendar_date() {
        // 存在しない日付は期限なしとして扱う
        let past_end_of_month = headers(&[("Expires", "Thu, 31 Feb 2024 00:00:00 GMT")]);
        assert_eq!(expiration(&past_end_of_month, sent_at()), None);

        let wrong_day_name = headers(&[("Expires", "Mon, 29 Feb 2024 00:00:00 GMT")]);
        assert_eq!(expiration(&wrong_day_name, sent_at()), None);
    }

    #[test]
    fn test_expiration_missing_header() {
        assert_eq!(expiration(&[], sent_at()), None);
    }

    #[test]
    fn test_expiration_garbage_cache_control_falls_back_to_expires() {
        let headers = headers(&[
            ("Cache-Control", "random garbage"),
            ("Expires", "Sun, 06 Nov 1994 08:49:37 GMT"),
        ]);
        assert_eq!(
            expiration(&headers, sent_at()),
            Some(UNIX_EPOCH + Duration::from_secs(784_111_777))
        );
    }

    #[test]
    fn test_expiration_expires_formats() {
        let expected = Some(UNIX_EPOCH + Duration::from_secs(784_111_777));
        for value in [
            "Sun, 06 Nov 1994 08:49:37 GMT",
            "Sunday, 06-Nov-94 08:49:37 GMT",
            "Sun Nov  6 08:49:37 1994",
        ] {
            let headers = headers(&[("Expires", value)]);
            assert_eq!(expiration(&headers, sent_at()), expected, "{}", value);
        }
    }

    #[test]
    fn test_expiration_unparseable_expires() {
        let headers = headers(&[("Expires", "-1")]);
        assert_eq!(expiration(&headers, sent_at()), None);
    }

    #[test]
    fn test_expiration_max_age_overflow() {
        let headers = headers(&[("Cache-Control", "max-age=18446744073709551615")]);
        assert_eq!(expiration(&headers, sent_at()), None);
    }

    #[test]
    fn test_expiration_split_cache_control_headers() {
        let headers = headers(&[
            ("Cache-Control", "max-age=10"),
            ("cache-control", "no-store"),
        ]);
        assert_eq!(expiration(&headers, sent_at()), None);
    }
}
