//! 内置验证规则的判定函数和默认正则

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const NOT_BOOLEAN: &str = "is not a boolean";
pub const NOT_STRING: &str = "is not a string or not a valid string format";
pub const NOT_ADDRESS: &str = "is not a valid address format";
pub const NOT_DATE: &str = "must be valid date format";
pub const NOT_EMAIL: &str = "is not a valid email";
pub const NOT_PASSWORD: &str = "is not a valid password";

pub static STRING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-@.,()\s]*$").expect("valid string pattern")
});

pub static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9\-#_.,()@\s]*$").expect("valid address pattern")
});

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.-]+@[a-zA-Z_]+?\.[a-zA-Z]{2,3}$").expect("valid email pattern")
});

static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid digit pattern"));
static HAS_UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid uppercase pattern"));
static HAS_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("valid symbol pattern"));

/// 带时区偏移的日期时间，`%.f` 可省略
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y/%m/%d %H:%M:%S%z",
    "%a %B %d %Y %H:%M:%S GMT%z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%a %B %d %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%a %B %d %Y",
    "%a, %d %B %Y",
];

/// `new Date(ms)` 的有效范围，±1e8 天
const MAX_TIMESTAMP_MILLIS: f64 = 8.64e15;

pub fn is_boolean(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(_)))
}

/// 非空字符串且整体匹配 `pattern`
pub fn is_string_matching(value: Option<&Value>, pattern: &Regex) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty() && pattern.is_match(s),
        _ => false,
    }
}

pub fn is_email(value: Option<&Value>) -> bool {
    is_string_matching(value, &EMAIL_PATTERN)
}

/// 至少包含一个数字、一个大写字母和一个非单词字符
pub fn is_password(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => {
            !s.is_empty() && HAS_DIGIT.is_match(s) && HAS_UPPERCASE.is_match(s) && HAS_SYMBOL.is_match(s)
        }
        _ => false,
    }
}

/// 字符串按字符计数，数组按元素计数，其它值没有长度
pub fn length_of(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// 能否构造出一个有效日期
///
/// 字符串支持 ISO 8601 / RFC 3339、RFC 2822、带 `%z` 偏移的日期时间，
/// 以及 `2024/02/29`、`02/29/2024`、`Feb 29, 2024`、`March 7, 2024 10:00` 这类写法；
/// 年份或年月（`2024`、`2024-02`）按该月第一天处理。
/// 数字视为毫秒时间戳。`null` 与布尔值分别对应时间戳 0 和 0/1，视为有效；
/// 字段缺失、数组、对象无效。
pub fn is_date(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => parse_date(s.trim()),
        Some(Value::Number(n)) => n
            .as_f64()
            .is_some_and(|millis| millis.is_finite() && millis.abs() <= MAX_TIMESTAMP_MILLIS),
        Some(Value::Null) | Some(Value::Bool(_)) => true,
        _ => false,
    }
}

fn parse_date(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    // `Date.prototype.toString()` 末尾的 "(Coordinated Universal Time)"
    let s = match s.find(" (") {
        Some(index) if s.ends_with(')') => &s[..index],
        _ => s,
    };

    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || OFFSET_DATETIME_FORMATS
            .iter()
            .any(|format| DateTime::parse_from_str(s, format).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(s, format).is_ok())
        || parse_partial_date(s)
}

fn parse_partial_date(s: &str) -> bool {
    let padded = match s.len() {
        4 => format!("{}-01-01", s),
        7 => format!("{}-01", s),
        _ => return false,
    };
    s.bytes().all(|b| b.is_ascii_digit() || b == b'-')
        && NaiveDate::parse_from_str(&padded, "%Y-%m-%d").is_ok()
}
