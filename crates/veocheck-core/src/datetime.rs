//! VERS date and date-time values.
//!
//! Accepted forms, each calendar-checked:
//!
//! - `YYYY`, `YYYY-MM`, `YYYY-MM-DD`
//! - `YYYY-MM-DDThh:mm` followed by a zone
//! - `YYYY-MM-DDThh:mm:ss[.fff]` followed by a zone
//!
//! where the zone is `Z` or `+hh:mm` / `-hh:mm`.

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveTime;

/// A parsed VERS date at the precision it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersDate {
    /// `YYYY`
    Year(i32),
    /// `YYYY-MM`
    YearMonth(i32, u32),
    /// `YYYY-MM-DD`
    Date(NaiveDate),
    /// A full timestamp with its zone.
    DateTime(DateTime<FixedOffset>),
}

/// Parses a VERS date, returning `None` if it matches no accepted form.
///
/// # Examples
///
/// ```
/// use veocheck_core::datetime::parse_vers_date;
///
/// assert!(parse_vers_date("2014-09-09T10:30:00+10:00").is_some());
/// assert!(parse_vers_date("2014-02-30").is_none());
/// assert!(parse_vers_date("2014-09-09T10:30:00").is_none());
/// ```
#[must_use]
pub fn parse_vers_date(text: &str) -> Option<VersDate> {
    let text = text.trim();
    let (date, time) = match text.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (text, None),
    };

    let parts: Vec<&str> = date.split('-').collect();
    let year = fixed_digits(parts.first()?, 4)?;
    let year = i32::try_from(year).ok()?;

    match (parts.len(), time) {
        (1, None) => Some(VersDate::Year(year)),
        (2, None) => {
            let month = fixed_digits(parts[1], 2)?;
            NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(VersDate::YearMonth(year, month))
        }
        (3, time) => {
            let day = NaiveDate::from_ymd_opt(
                year,
                fixed_digits(parts[1], 2)?,
                fixed_digits(parts[2], 2)?,
            )?;
            match time {
                None => Some(VersDate::Date(day)),
                Some(time) => parse_time(day, time).map(VersDate::DateTime),
            }
        }
        _ => None,
    }
}

/// Whether `text` is a valid VERS date.
#[must_use]
pub fn is_vers_date(text: &str) -> bool {
    parse_vers_date(text).is_some()
}

fn parse_time(day: NaiveDate, text: &str) -> Option<DateTime<FixedOffset>> {
    let (clock, offset) = split_zone(text)?;
    let time = match clock.len() {
        5 => NaiveTime::parse_from_str(clock, "%H:%M").ok()?,
        8 => NaiveTime::parse_from_str(clock, "%H:%M:%S").ok()?,
        n if n > 9 && clock.as_bytes()[8] == b'.' => {
            if !clock[9..].bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            NaiveTime::parse_from_str(clock, "%H:%M:%S%.f").ok()?
        }
        _ => return None,
    };
    day.and_time(time).and_local_timezone(offset).single()
}

/// Splits `hh:mm...Z` or `hh:mm...±hh:mm` into clock text and offset.
fn split_zone(text: &str) -> Option<(&str, FixedOffset)> {
    if let Some(clock) = text.strip_suffix('Z') {
        return Some((clock, FixedOffset::east_opt(0)?));
    }
    let split = text.len().checked_sub(6)?;
    let (clock, zone) = (text.get(..split)?, text.get(split..)?);
    let sign = match zone.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let (hours, minutes) = zone[1..].split_once(':')?;
    let hours = fixed_digits(hours, 2)?;
    let minutes = fixed_digits(minutes, 2)?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    let seconds = i32::try_from(hours * 3600 + minutes * 60).ok()?;
    Some((clock, FixedOffset::east_opt(sign * seconds)?))
}

/// Parses exactly `width` ASCII digits.
fn fixed_digits(text: &str, width: usize) -> Option<u32> {
    if text.len() != width || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
