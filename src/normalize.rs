//! Date and time normalization for card text and URL slugs.
//!
//! Venue pages express dates and times in several inconsistent shapes
//! ("Thursday 22, January", "Fri, January 23", "Sat, Jan 24",
//! "Feb 6, 2026 | 2:30pm", "-2-10-26-630pm"). Everything is reduced to the
//! canonical `YYYY-MM-DD` and `H:MM AM|PM` forms used for storage and
//! comparison. Nothing in this module returns an error: an unmatched
//! fragment is simply `None`, which callers turn into "skip this candidate".

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

const MONTHS: [(&str, u32); 12] = [
    ("January", 1),
    ("February", 2),
    ("March", 3),
    ("April", 4),
    ("May", 5),
    ("June", 6),
    ("July", 7),
    ("August", 8),
    ("September", 9),
    ("October", 10),
    ("November", 11),
    ("December", 12),
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Ordered date-pattern alternatives. Each venue configures the subset it
/// recognizes; the first pattern that matches the card text wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// "Thursday 22, January" or bare "22, January"
    DayThenMonth,
    /// "Fri, January 23" (weekday required)
    WeekdayMonthDay,
    /// "Sat, Jan 24" (weekday required, month abbreviated)
    WeekdayAbbrevMonthDay,
    /// "February 6, 2026"
    MonthDayYear,
    /// "Feb 6, 2026"
    AbbrevMonthDayYear,
    /// "February 6" / "Feb 6", year taken from the default
    MonthDay,
}

static DAY_THEN_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)?\s*(\d{1,2}),?\s+(January|February|March|April|May|June|July|August|September|October|November|December)").unwrap()
});

static WEEKDAY_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)[a-z]*,?\s+(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2})").unwrap()
});

static WEEKDAY_ABBREV_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)[a-z]*,?\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+(\d{1,2})").unwrap()
});

static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})").unwrap()
});

static ABBREV_MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})").unwrap()
});

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:tember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\s+(\d{1,2})(?:st|nd|rd|th)?").unwrap()
});

/// "7:15 pm" — minutes required, used for free-form card text
static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)").unwrap());

/// "2pm" / "2:30pm" — minutes optional, used for structured fragments
static LOOSE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());

static CANONICAL_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*(AM|PM)").unwrap());

/// URL slug suffix with a showtime: "-2-10-26-630pm"
static SLUG_DATE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-(\d{1,2})-(\d{1,2})-(\d{2,4})-(\d{1,4})(am|pm)/?$").unwrap());

/// URL slug suffix without a showtime: "-2-13-26"
static SLUG_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d{1,2})-(\d{1,2})-(\d{2,4})/?$").unwrap());

/// Resolves a month name or abbreviation against the fixed 12-entry table.
/// Matching is on the first three letters, case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?;
    MONTHS
        .iter()
        .find(|(month, _)| month[..3].eq_ignore_ascii_case(prefix))
        .map(|(_, number)| *number)
}

pub fn starts_with_weekday(text: &str) -> bool {
    let lower = text.to_lowercase();
    WEEKDAYS.iter().any(|day| lower.starts_with(day))
}

fn date_from(month_name: &str, day: &str, year: i32) -> Option<NaiveDate> {
    let month = month_number(month_name)?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Runs the venue's ordered pattern cascade against `text` and returns the
/// first date that resolves to a real calendar day. Patterns without an
/// explicit year use `default_year`.
pub fn find_date(text: &str, formats: &[DateFormat], default_year: i32) -> Option<NaiveDate> {
    for format in formats {
        let date = match format {
            DateFormat::DayThenMonth => DAY_THEN_MONTH
                .captures(text)
                .and_then(|c| date_from(&c[2], &c[1], default_year)),
            DateFormat::WeekdayMonthDay => WEEKDAY_MONTH_DAY
                .captures(text)
                .and_then(|c| date_from(&c[1], &c[2], default_year)),
            DateFormat::WeekdayAbbrevMonthDay => WEEKDAY_ABBREV_MONTH_DAY
                .captures(text)
                .and_then(|c| date_from(&c[1], &c[2], default_year)),
            DateFormat::MonthDayYear => MONTH_DAY_YEAR
                .captures(text)
                .and_then(|c| date_from(&c[1], &c[2], c[3].parse().ok()?)),
            DateFormat::AbbrevMonthDayYear => ABBREV_MONTH_DAY_YEAR
                .captures(text)
                .and_then(|c| date_from(&c[1], &c[2], c[3].parse().ok()?)),
            DateFormat::MonthDay => MONTH_DAY
                .captures(text)
                .and_then(|c| date_from(&c[1], &c[2], default_year)),
        };
        if date.is_some() {
            return date;
        }
    }
    None
}

/// Formats the canonical `H:MM AM|PM` shape: hour unpadded, minutes as given.
pub fn format_clock(hour: u32, minutes: &str, meridiem: &str) -> String {
    format!("{}:{} {}", hour, minutes, meridiem.to_ascii_uppercase())
}

/// First `H:MM am|pm` occurrence in free-form card text, canonicalized.
pub fn find_time(text: &str) -> Option<String> {
    let caps = CLOCK_TIME.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    Some(format_clock(hour, &caps[2], &caps[3]))
}

/// Canonicalizes a time fragment where minutes may be absent ("2pm" → "2:00 PM").
pub fn canonical_time(raw: &str) -> Option<String> {
    let caps = LOOSE_TIME.captures(raw)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minutes = caps.get(2).map_or("00", |m| m.as_str());
    Some(format_clock(hour, minutes, &caps[3]))
}

/// Parses a canonical `H:MM AM|PM` string to minutes past midnight.
pub fn time_to_minutes(time: &str) -> Option<u32> {
    let caps = CANONICAL_TIME.captures(time)?;
    let mut hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    let meridiem = caps[3].to_ascii_uppercase();
    if meridiem == "PM" && hours != 12 {
        hours += 12;
    } else if meridiem == "AM" && hours == 12 {
        hours = 0;
    }
    Some(hours * 60 + minutes)
}

/// Parses the `-M-D-YY[-HHMMam|pm]` suffix some venues embed in event URLs.
/// Two-digit years are expanded by adding 2000. The time portion is optional;
/// when absent the caller falls back to container text.
pub fn parse_slug_datetime(href: &str) -> Option<(NaiveDate, Option<String>)> {
    if let Some(caps) = SLUG_DATE_TIME.captures(href) {
        let date = slug_date(&caps[1], &caps[2], &caps[3])?;
        let time = slug_time(&caps[4], &caps[5])?;
        return Some((date, Some(time)));
    }
    let caps = SLUG_DATE.captures(href)?;
    Some((slug_date(&caps[1], &caps[2], &caps[3])?, None))
}

fn slug_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Slug showtimes run hour and minutes together: "630" is 6:30, "1000" is
/// 10:00, a bare "1" is 1:00.
fn slug_time(digits: &str, meridiem: &str) -> Option<String> {
    let (hour, minutes) = if digits.len() <= 2 {
        (digits.parse().ok()?, "00")
    } else {
        let split = digits.len() - 2;
        (digits[..split].parse().ok()?, &digits[split..])
    };
    Some(format_clock(hour, minutes, meridiem))
}
