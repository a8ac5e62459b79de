//! Calendar-day classification of fueling dates.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone};

use crate::types::FuelStatus;

/// Date-only layouts seen in the sheet, tried in order.
///
/// Slash dates are month-first, matching how the sheet is exported.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Classifies `fueling_date` against the calendar day of `now`.
///
/// Comparison is by whole days in `now`'s zone: any time on the reference
/// day is `Today`, regardless of the hour. Text that cannot be read as a
/// date is logged and treated as `Future` so the site stays visible.
pub fn classify<Tz: TimeZone>(fueling_date: &str, now: &DateTime<Tz>) -> FuelStatus {
    let today = now.date_naive();
    match parse_fueling_date(fueling_date, &now.timezone()) {
        Some(day) => classify_day(day, today),
        None => {
            tracing::warn!(fueling_date, "unparseable fueling date; classifying as future");
            FuelStatus::Future
        }
    }
}

/// First match wins: before today, today, +1 day, +2 days, otherwise future.
#[must_use]
pub fn classify_day(day: NaiveDate, today: NaiveDate) -> FuelStatus {
    if day < today {
        FuelStatus::Overdue
    } else if day == today {
        FuelStatus::Today
    } else if Some(day) == today.checked_add_days(Days::new(1)) {
        FuelStatus::Tomorrow
    } else if Some(day) == today.checked_add_days(Days::new(2)) {
        FuelStatus::AfterTomorrow
    } else {
        FuelStatus::Future
    }
}

/// Reads the calendar day out of a sheet date cell.
///
/// Date-only and naive date-time text is taken as a local calendar date.
/// RFC 3339 text carries its own offset and is converted into `tz` first.
pub fn parse_fueling_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz).date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
