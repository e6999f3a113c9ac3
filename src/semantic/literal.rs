//! Constant literal parsing.
//!
//! Constant expressions keep their text until somebody asks for the value.
//! The formats follow the CSDL literal grammar: ISO dates and times,
//! RFC 3339 timestamps, ISO 8601 durations, hexadecimal binaries and
//! hyphenated GUIDs.

use crate::ast::ConstantKind;
use smol_str::SmolStr;
use std::sync::OnceLock;
use time::format_description::well_known::Rfc3339;
use time::format_description::{self, FormatItem};
use time::{Date, Duration, OffsetDateTime, Time};
use uuid::Uuid;

/// A parsed constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Binary(Vec<u8>),
    Boolean(bool),
    Date(Date),
    DateTimeOffset(OffsetDateTime),
    /// Decimal text, validated but kept exact.
    Decimal(SmolStr),
    Duration(Duration),
    Float(f64),
    Guid(Uuid),
    Int(i64),
    String(SmolStr),
    TimeOfDay(Time),
}

impl PrimitiveValue {
    /// The constant kind the value was parsed as.
    pub fn kind(&self) -> ConstantKind {
        match self {
            Self::Binary(_) => ConstantKind::Binary,
            Self::Boolean(_) => ConstantKind::Boolean,
            Self::Date(_) => ConstantKind::Date,
            Self::DateTimeOffset(_) => ConstantKind::DateTimeOffset,
            Self::Decimal(_) => ConstantKind::Decimal,
            Self::Duration(_) => ConstantKind::Duration,
            Self::Float(_) => ConstantKind::Float,
            Self::Guid(_) => ConstantKind::Guid,
            Self::Int(_) => ConstantKind::Int,
            Self::String(_) => ConstantKind::String,
            Self::TimeOfDay(_) => ConstantKind::TimeOfDay,
        }
    }
}

/// Raised when a literal's text does not match its kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("'{text}' is not a valid {kind:?} literal")]
    Invalid { kind: ConstantKind, text: SmolStr },
}

/// Parses `text` as a literal of `kind`.
pub fn parse_literal(kind: ConstantKind, text: &str) -> Result<PrimitiveValue, LiteralError> {
    let parsed = match kind {
        ConstantKind::Binary => hex::decode(text).ok().map(PrimitiveValue::Binary),
        ConstantKind::Boolean => parse_boolean(text).map(PrimitiveValue::Boolean),
        ConstantKind::Date => date_format()
            .and_then(|format| Date::parse(text, format).ok())
            .map(PrimitiveValue::Date),
        ConstantKind::DateTimeOffset => OffsetDateTime::parse(text, &Rfc3339)
            .ok()
            .map(PrimitiveValue::DateTimeOffset),
        ConstantKind::Decimal => is_decimal(text).then(|| PrimitiveValue::Decimal(text.into())),
        ConstantKind::Duration => parse_duration(text).map(PrimitiveValue::Duration),
        ConstantKind::Float => parse_float(text).map(PrimitiveValue::Float),
        ConstantKind::Guid => Uuid::parse_str(text).ok().map(PrimitiveValue::Guid),
        ConstantKind::Int => text.parse::<i64>().ok().map(PrimitiveValue::Int),
        ConstantKind::String => Some(PrimitiveValue::String(text.into())),
        ConstantKind::TimeOfDay => parse_time_of_day(text).map(PrimitiveValue::TimeOfDay),
    };
    parsed.ok_or_else(|| LiteralError::Invalid {
        kind,
        text: text.into(),
    })
}

fn date_format() -> Option<&'static [FormatItem<'static>]> {
    static FORMAT: OnceLock<Option<Vec<FormatItem<'static>>>> = OnceLock::new();
    FORMAT
        .get_or_init(|| format_description::parse("[year]-[month]-[day]").ok())
        .as_deref()
}

fn clock_format() -> Option<&'static [FormatItem<'static>]> {
    static FORMAT: OnceLock<Option<Vec<FormatItem<'static>>>> = OnceLock::new();
    FORMAT
        .get_or_init(|| format_description::parse("[hour]:[minute]:[second]").ok())
        .as_deref()
}

fn parse_boolean(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    match unsigned.split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
        None => is_digits(unsigned),
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "INF" => return Some(f64::INFINITY),
        "-INF" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }
    // Rust also accepts "inf" and "infinity"; the literal grammar does not.
    let numeric = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !numeric {
        return None;
    }
    text.parse().ok()
}

/// Up to nine fractional digits, as nanoseconds.
fn fraction_nanos(fraction: &str) -> Option<u32> {
    if !is_digits(fraction) || fraction.len() > 9 {
        return None;
    }
    let padded = format!("{fraction:0<9}");
    padded.parse().ok()
}

fn parse_time_of_day(text: &str) -> Option<Time> {
    let (clock, fraction) = match text.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (text, None),
    };
    let clock = match clock.len() {
        5 => format!("{clock}:00"),
        _ => clock.to_string(),
    };
    let time = Time::parse(&clock, clock_format()?).ok()?;
    match fraction {
        Some(fraction) => time.replace_nanosecond(fraction_nanos(fraction)?).ok(),
        None => Some(time),
    }
}

/// `[-]P[nD][T[nH][nM][n[.f]S]]`
fn parse_duration(text: &str) -> Option<Duration> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (days, clock) = match rest.split_once('T') {
        Some((days, clock)) => (days, Some(clock)),
        None => (rest, None),
    };

    let mut total = Duration::ZERO;
    let mut any = false;
    if !days.is_empty() {
        total += Duration::days(component(days.strip_suffix('D')?)?);
        any = true;
    }
    if let Some(mut clock) = clock {
        if clock.is_empty() {
            return None;
        }
        if let Some((hours, tail)) = clock.split_once('H') {
            total += Duration::hours(component(hours)?);
            clock = tail;
            any = true;
        }
        if let Some((minutes, tail)) = clock.split_once('M') {
            total += Duration::minutes(component(minutes)?);
            clock = tail;
            any = true;
        }
        if !clock.is_empty() {
            let seconds = clock.strip_suffix('S')?;
            let (whole, nanos) = match seconds.split_once('.') {
                Some((whole, fraction)) => (component(whole)?, fraction_nanos(fraction)?),
                None => (component(seconds)?, 0),
            };
            total += Duration::new(whole, i32::try_from(nanos).ok()?);
            any = true;
        }
    }

    if !any {
        return None;
    }
    Some(if negative { -total } else { total })
}

/// A duration component, bounded so the total cannot overflow.
fn component(text: &str) -> Option<i64> {
    if !is_digits(text) {
        return None;
    }
    text.parse::<u32>().ok().map(i64::from)
}
