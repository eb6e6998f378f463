//! HTTP-date (RFC 9110 Section 5.6.7)
//!
//! `Expires` などの日時ヘッダーを時刻として扱うためのパーサーです。
//! 時刻に変換できない値は受け付けません。
//!
//! - 暦に存在しない日付 (`31 Feb` など) はエラー
//! - 曜日が日付と一致しない場合はエラー
//! - 年は 0001 から 9999 まで
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::date::{DateError, HttpDate};
//!
//! let date = HttpDate::parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
//! assert_eq!(date.to_unix_timestamp(), 784_111_777);
//! assert_eq!(date.to_string(), "Sun, 06 Nov 1994 08:49:37 GMT");
//!
//! // 廃止形式も読める
//! assert_eq!(HttpDate::parse("Sun Nov  6 08:49:37 1994").unwrap(), date);
//!
//! assert_eq!(
//!     HttpDate::parse("Thu, 31 Feb 2024 00:00:00 GMT"),
//!     Err(DateError::InvalidDay)
//! );
//! ```

use core::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: i64 = 86_400;
const MIN_YEAR: u16 = 1;
const MAX_YEAR: u16 = 9999;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// HTTP-date パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// 空の日付
    Empty,
    /// どの形式にも当てはまらない
    InvalidFormat,
    /// 不正な曜日名
    InvalidDayName,
    /// 存在しない日
    InvalidDay,
    /// 不正な月
    InvalidMonth,
    /// 範囲外の年
    InvalidYear,
    /// 不正な時刻
    InvalidTime,
    /// GMT ではない
    NotGmt,
    /// 曜日が日付と一致しない
    DayOfWeekMismatch,
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateError::Empty => write!(f, "empty date"),
            DateError::InvalidFormat => write!(f, "invalid date format"),
            DateError::InvalidDayName => write!(f, "invalid day name"),
            DateError::InvalidDay => write!(f, "invalid day of month"),
            DateError::InvalidMonth => write!(f, "invalid month"),
            DateError::InvalidYear => write!(f, "year out of range"),
            DateError::InvalidTime => write!(f, "invalid time of day"),
            DateError::NotGmt => write!(f, "timezone is not GMT"),
            DateError::DayOfWeekMismatch => write!(f, "day of week does not match date"),
        }
    }
}

impl std::error::Error for DateError {}

/// 曜日
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// 3 文字の曜日名 (IMF-fixdate / asctime)
    pub fn short_name(&self) -> &'static str {
        &self.long_name()[..3]
    }

    /// 完全な曜日名 (RFC 850)
    pub fn long_name(&self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        }
    }

    fn from_short_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.short_name() == s)
    }

    fn from_long_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.long_name() == s)
    }

    /// 1970-01-01 (木曜日) からの日数で曜日を求める
    fn from_days(days: i64) -> Self {
        Self::ALL[(days + 4).rem_euclid(7) as usize]
    }
}

/// 検証済みの HTTP-date
///
/// 常に実在する日時を表す。曜日は日付から求める。
/// 秒は 60 (うるう秒) を許し、時刻に変換すると次の分の 0 秒と同じになる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpDate {
    day_of_week: DayOfWeek,
    day: u8,
    month: u8,
    year: u16,
    hour: u8,
    minute: u8,
    second: u8,
}

impl HttpDate {
    /// HTTP-date 文字列をパース
    ///
    /// IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)、
    /// RFC 850 (`Sunday, 06-Nov-94 08:49:37 GMT`)、
    /// asctime (`Sun Nov  6 08:49:37 1994`) を受け付ける。
    /// 三形式は区切り文字の形で重ならないため、形から判別した 1 形式だけを試す。
    pub fn parse(input: &str) -> Result<Self, DateError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DateError::Empty);
        }

        match input.split_once(',') {
            Some((day_name, rest)) if rest.trim_start().contains('-') => {
                parse_rfc850(day_name, rest)
            }
            Some((day_name, rest)) => parse_imf_fixdate(day_name, rest),
            None => parse_asctime(input),
        }
    }

    /// 日時から作成 (曜日は自動で求める)
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DateError::InvalidYear);
        }
        if !(1..=12).contains(&month) {
            return Err(DateError::InvalidMonth);
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(DateError::InvalidDay);
        }
        if hour > 23 || minute > 59 || second > 60 {
            return Err(DateError::InvalidTime);
        }

        let days = days_from_civil(year as i64, month as i64, day as i64);
        Ok(HttpDate {
            day_of_week: DayOfWeek::from_days(days),
            day,
            month,
            year,
            hour,
            minute,
            second,
        })
    }

    /// UNIX 時刻 (秒) から作成
    pub fn from_unix_timestamp(timestamp: i64) -> Result<Self, DateError> {
        let days = timestamp.div_euclid(SECONDS_PER_DAY);
        let secs = timestamp.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        let year = u16::try_from(year).map_err(|_| DateError::InvalidYear)?;

        HttpDate::new(
            year,
            month as u8,
            day as u8,
            (secs / 3600) as u8,
            (secs % 3600 / 60) as u8,
            (secs % 60) as u8,
        )
    }

    /// `SystemTime` から作成 (秒未満は過去方向に切り捨て)
    pub fn from_system_time(time: SystemTime) -> Result<Self, DateError> {
        let timestamp = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_secs()).map_err(|_| DateError::InvalidYear)?,
            Err(e) => {
                let d = e.duration();
                let secs = i64::try_from(d.as_secs()).map_err(|_| DateError::InvalidYear)?;
                if d.subsec_nanos() > 0 {
                    -secs - 1
                } else {
                    -secs
                }
            }
        };
        Self::from_unix_timestamp(timestamp)
    }

    /// UNIX 時刻 (秒) に変換
    pub fn to_unix_timestamp(&self) -> i64 {
        let days = days_from_civil(self.year as i64, self.month as i64, self.day as i64);
        days * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64
    }

    /// `SystemTime` に変換
    pub fn to_system_time(&self) -> SystemTime {
        let timestamp = self.to_unix_timestamp();
        if timestamp >= 0 {
            UNIX_EPOCH + Duration::from_secs(timestamp as u64)
        } else {
            UNIX_EPOCH - Duration::from_secs(timestamp.unsigned_abs())
        }
    }

    pub fn day_of_week(&self) -> DayOfWeek {
        self.day_of_week
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// 曜日名が日付と一致するか確認
    fn check_day_of_week(self, named: DayOfWeek) -> Result<Self, DateError> {
        if self.day_of_week == named {
            Ok(self)
        } else {
            Err(DateError::DayOfWeekMismatch)
        }
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            self.day_of_week.short_name(),
            self.day,
            MONTH_NAMES[self.month as usize - 1],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }
}

// `06 Nov 1994 08:49:37 GMT`
fn parse_imf_fixdate(day_name: &str, rest: &str) -> Result<HttpDate, DateError> {
    let named = DayOfWeek::from_short_name(day_name).ok_or(DateError::InvalidDayName)?;
    let [day, month, year, time, zone] = fields::<5>(rest)?;
    expect_gmt(zone)?;

    let day = digits(day, 2, 2).ok_or(DateError::InvalidDay)?;
    let month = parse_month(month)?;
    let year = digits(year, 4, 4).ok_or(DateError::InvalidYear)?;
    let (hour, minute, second) = parse_time(time)?;

    HttpDate::new(year, month as u8, day as u8, hour, minute, second)?.check_day_of_week(named)
}

// `06-Nov-94 08:49:37 GMT`
fn parse_rfc850(day_name: &str, rest: &str) -> Result<HttpDate, DateError> {
    let named = DayOfWeek::from_long_name(day_name).ok_or(DateError::InvalidDayName)?;
    let [date, time, zone] = fields::<3>(rest)?;
    expect_gmt(zone)?;

    let [day, month, year] = split_exact::<3>(date, '-')?;
    let day = digits(day, 2, 2).ok_or(DateError::InvalidDay)?;
    let month = parse_month(month)?;
    let year = digits(year, 2, 2).ok_or(DateError::InvalidYear)?;
    let year = interpret_two_digit_year(year, current_year());
    let (hour, minute, second) = parse_time(time)?;

    HttpDate::new(year, month as u8, day as u8, hour, minute, second)?.check_day_of_week(named)
}

// `Sun Nov  6 08:49:37 1994`
fn parse_asctime(input: &str) -> Result<HttpDate, DateError> {
    let [day_name, month, day, time, year] = fields::<5>(input)?;
    let named = DayOfWeek::from_short_name(day_name).ok_or(DateError::InvalidDayName)?;

    let month = parse_month(month)?;
    let day = digits(day, 1, 2).ok_or(DateError::InvalidDay)?;
    let (hour, minute, second) = parse_time(time)?;
    let year = digits(year, 4, 4).ok_or(DateError::InvalidYear)?;

    HttpDate::new(year, month as u8, day as u8, hour, minute, second)?.check_day_of_week(named)
}

/// 空白区切りでちょうど N 個に分割
fn fields<const N: usize>(s: &str) -> Result<[&str; N], DateError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    parts.try_into().map_err(|_| DateError::InvalidFormat)
}

/// 区切り文字でちょうど N 個に分割
fn split_exact<const N: usize>(s: &str, sep: char) -> Result<[&str; N], DateError> {
    let parts: Vec<&str> = s.split(sep).collect();
    parts.try_into().map_err(|_| DateError::InvalidFormat)
}

fn expect_gmt(zone: &str) -> Result<(), DateError> {
    if zone == "GMT" {
        Ok(())
    } else {
        Err(DateError::NotGmt)
    }
}

/// `min..=max` 桁の 10 進数
fn digits(s: &str, min: usize, max: usize) -> Option<u16> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_month(s: &str) -> Result<u16, DateError> {
    MONTH_NAMES
        .iter()
        .position(|name| *name == s)
        .map(|i| i as u16 + 1)
        .ok_or(DateError::InvalidMonth)
}

// `HH:MM:SS`
fn parse_time(s: &str) -> Result<(u8, u8, u8), DateError> {
    let [hour, minute, second] = split_exact::<3>(s, ':').map_err(|_| DateError::InvalidTime)?;
    let two = |s: &str| digits(s, 2, 2).map(|n| n as u8).ok_or(DateError::InvalidTime);
    Ok((two(hour)?, two(minute)?, two(second)?))
}

fn current_year() -> u16 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let (year, _, _) = civil_from_days((secs / SECONDS_PER_DAY as u64) as i64);
    u16::try_from(year).unwrap_or(MAX_YEAR)
}

/// RFC 850 の 2 桁年を 4 桁に戻す
///
/// 現在から 50 年より先に見える年は、下 2 桁が同じ直近の過去の年とする。
fn interpret_two_digit_year(two_digit: u16, current: u16) -> u16 {
    let candidate = current / 100 * 100 + two_digit;
    if candidate > current + 50 {
        candidate.saturating_sub(100)
    } else {
        candidate
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// 1970-01-01 からの日数を (年, 月, 日) に変換
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// (年, 月, 日) を 1970-01-01 からの日数に変換
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TIMESTAMP: i64 = 784_111_777;

    #[test]
    fn test_parse_three_formats() {
        for input in [
            "Sun, 06 Nov 1994 08:49:37 GMT",
            "Sunday, 06-Nov-94 08:49:37 GMT",
            "Sun Nov  6 08:49:37 1994",
            "  Sun Nov 6 08:49:37 1994  ",
        ] {
            let date = HttpDate::parse(input).unwrap();
            assert_eq!(date.to_unix_timestamp(), SAMPLE_TIMESTAMP, "{input}");
            assert_eq!(date.day_of_week(), DayOfWeek::Sunday);
        }
    }

    #[test]
    fn test_display_is_imf_fixdate() {
        let date = HttpDate::parse("Sun Nov  6 08:49:37 1994").unwrap();
        assert_eq!(date.to_string(), "Sun, 06 Nov 1994 08:49:37 GMT");

        let date = HttpDate::new(1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(date.to_string(), "Mon, 01 Jan 0001 00:00:00 GMT");
    }

    #[test]
    fn test_reject_day_past_end_of_month() {
        assert_eq!(
            HttpDate::parse("Thu, 31 Feb 2024 00:00:00 GMT"),
            Err(DateError::InvalidDay)
        );
        assert_eq!(
            HttpDate::parse("Thu, 31 Apr 2025 00:00:00 GMT"),
            Err(DateError::InvalidDay)
        );
        assert_eq!(
            HttpDate::parse("Thursday, 31-Jun-27 00:00:00 GMT"),
            Err(DateError::InvalidDay)
        );
        assert_eq!(
            HttpDate::parse("Thu Sep 31 00:00:00 2026"),
            Err(DateError::InvalidDay)
        );
        assert_eq!(
            HttpDate::parse("Sun, 00 Nov 1994 08:49:37 GMT"),
            Err(DateError::InvalidDay)
        );
    }

    #[test]
    fn test_leap_years() {
        assert!(HttpDate::parse("Thu, 29 Feb 2024 12:00:00 GMT").is_ok());
        assert!(HttpDate::parse("Tue, 29 Feb 2000 12:00:00 GMT").is_ok());
        assert_eq!(
            HttpDate::parse("Sat, 29 Feb 2025 12:00:00 GMT"),
            Err(DateError::InvalidDay)
        );
        // 100 で割り切れて 400 で割り切れない年は平年
        assert_eq!(
            HttpDate::parse("Fri, 29 Feb 1900 12:00:00 GMT"),
            Err(DateError::InvalidDay)
        );
        assert_eq!(HttpDate::new(2100, 2, 29, 0, 0, 0), Err(DateError::InvalidDay));
    }

    #[test]
    fn test_reject_day_of_week_mismatch() {
        assert_eq!(
            HttpDate::parse("Mon, 06 Nov 1994 08:49:37 GMT"),
            Err(DateError::DayOfWeekMismatch)
        );
        assert_eq!(
            HttpDate::parse("Monday, 06-Nov-94 08:49:37 GMT"),
            Err(DateError::DayOfWeekMismatch)
        );
        assert_eq!(
            HttpDate::parse("Mon Nov  6 08:49:37 1994"),
            Err(DateError::DayOfWeekMismatch)
        );
    }

    #[test]
    fn test_day_name_must_match_format() {
        // IMF-fixdate は短い名前、RFC 850 は完全な名前
        assert_eq!(
            HttpDate::parse("Sunday, 06 Nov 1994 08:49:37 GMT"),
            Err(DateError::InvalidDayName)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06-Nov-94 08:49:37 GMT"),
            Err(DateError::InvalidDayName)
        );
    }

    #[test]
    fn test_reject_malformed_fields() {
        assert_eq!(HttpDate::parse(""), Err(DateError::Empty));
        assert_eq!(HttpDate::parse("not a date"), Err(DateError::InvalidFormat));
        assert_eq!(HttpDate::parse("Sun, 06 Nov"), Err(DateError::InvalidFormat));
        assert_eq!(
            HttpDate::parse("Sun, 6 Nov 1994 08:49:37 GMT"),
            Err(DateError::InvalidDay)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Xyz 1994 08:49:37 GMT"),
            Err(DateError::InvalidMonth)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 94 08:49:37 GMT"),
            Err(DateError::InvalidYear)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 1994 8:49:37 GMT"),
            Err(DateError::InvalidTime)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 1994 08:49:37 UTC"),
            Err(DateError::NotGmt)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 0000 08:49:37 GMT"),
            Err(DateError::InvalidYear)
        );
    }

    #[test]
    fn test_time_limits() {
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 1994 24:00:00 GMT"),
            Err(DateError::InvalidTime)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 1994 08:60:00 GMT"),
            Err(DateError::InvalidTime)
        );
        assert_eq!(
            HttpDate::parse("Sun, 06 Nov 1994 08:49:61 GMT"),
            Err(DateError::InvalidTime)
        );

        // うるう秒は次の分の 0 秒と同じ時刻
        let leap = HttpDate::parse("Sun, 06 Nov 1994 23:59:60 GMT").unwrap();
        let next = HttpDate::parse("Mon, 07 Nov 1994 00:00:00 GMT").unwrap();
        assert_eq!(leap.second(), 60);
        assert_eq!(leap.to_unix_timestamp(), next.to_unix_timestamp());
    }

    #[test]
    fn test_interpret_two_digit_year() {
        assert_eq!(interpret_two_digit_year(20, 2026), 2020);
        assert_eq!(interpret_two_digit_year(76, 2026), 2076);
        assert_eq!(interpret_two_digit_year(77, 2026), 1977);
        assert_eq!(interpret_two_digit_year(99, 2026), 1999);
        assert_eq!(interpret_two_digit_year(0, 2050), 2000);
        assert_eq!(interpret_two_digit_year(60, 2000), 1960);
    }

    #[test]
    fn test_unix_timestamp_conversion() {
        let epoch = HttpDate::from_unix_timestamp(0).unwrap();
        assert_eq!(epoch.to_string(), "Thu, 01 Jan 1970 00:00:00 GMT");

        let date = HttpDate::from_unix_timestamp(-1).unwrap();
        assert_eq!(date.to_string(), "Wed, 31 Dec 1969 23:59:59 GMT");

        let leap_day = HttpDate::parse("Thu, 29 Feb 2024 12:00:00 GMT").unwrap();
        assert_eq!(leap_day.to_unix_timestamp(), 1_709_208_000);
        assert_eq!(HttpDate::from_unix_timestamp(1_709_208_000).unwrap(), leap_day);

        assert_eq!(
            HttpDate::from_unix_timestamp(i64::MAX / 2),
            Err(DateError::InvalidYear)
        );
        assert_eq!(
            HttpDate::from_unix_timestamp(-62_135_596_801),
            Err(DateError::InvalidYear)
        );
    }

    #[test]
    fn test_system_time_conversion() {
        let date = HttpDate::from_unix_timestamp(SAMPLE_TIMESTAMP).unwrap();
        let time = date.to_system_time();
        assert_eq!(time, UNIX_EPOCH + Duration::from_secs(SAMPLE_TIMESTAMP as u64));
        assert_eq!(HttpDate::from_system_time(time).unwrap(), date);

        let before_epoch = UNIX_EPOCH - Duration::from_millis(1500);
        let date = HttpDate::from_system_time(before_epoch).unwrap();
        assert_eq!(date.to_unix_timestamp(), -2);
    }

    #[test]
    fn test_day_names() {
        assert_eq!(DayOfWeek::Wednesday.short_name(), "Wed");
        assert_eq!(DayOfWeek::from_long_name("Saturday"), Some(DayOfWeek::Saturday));
        assert_eq!(DayOfWeek::from_short_name("Satur"), None);
        assert_eq!(DayOfWeek::from_days(0), DayOfWeek::Thursday);
        assert_eq!(DayOfWeek::from_days(-1), DayOfWeek::Wednesday);
    }
}
