use chrono::{DateTime, Duration, TimeZone, Utc};

/// Format a forecast valid time as ISO 8601 truncated to hour precision
/// (e.g. "2024-08-05T12"), the resolution used for panel titles downstream.
pub fn format_hour(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H").to_string()
}

/// Time difference in whole hours between two instants
pub fn hours_between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    (*end - *start).num_hours()
}

/// Supported base units of a CF-style time encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in seconds
    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

/// Parse a CF time-units string of the form "<unit> since <reference>"
/// (e.g. "seconds since 1970-01-01", "hours since 2024-08-05 00:00:00").
pub fn parse_time_units(units: &str) -> Result<(TimeUnit, DateTime<Utc>), String> {
    let mut parts = units.splitn(2, " since ");
    let unit_str = parts
        .next()
        .ok_or_else(|| format!("Invalid time units: {}", units))?
        .trim();
    let reference_str = parts
        .next()
        .ok_or_else(|| format!("Time units missing reference: {}", units))?
        .trim();

    let unit = match unit_str {
        "seconds" | "second" | "s" => TimeUnit::Seconds,
        "minutes" | "minute" | "min" => TimeUnit::Minutes,
        "hours" | "hour" | "h" => TimeUnit::Hours,
        "days" | "day" | "d" => TimeUnit::Days,
        _ => return Err(format!("Unsupported time unit: {}", unit_str)),
    };

    let reference = parse_reference_datetime(reference_str)?;
    Ok((unit, reference))
}

/// Decode CF-encoded time offsets into UTC datetimes
pub fn decode_cf_times(offsets: &[f64], units: &str) -> Result<Vec<DateTime<Utc>>, String> {
    let (unit, reference) = parse_time_units(units)?;

    offsets
        .iter()
        .map(|&offset| {
            let seconds = offset * unit.seconds();
            if !seconds.is_finite() {
                return Err(format!("Non-finite time offset: {}", offset));
            }
            Ok(reference + Duration::milliseconds((seconds * 1000.0).round() as i64))
        })
        .collect()
}

/// Parse the reference datetime of a CF units string.
/// Accepts "YYYY-MM-DD", "YYYY-MM-DD HH:MM:SS" and the T-separated form,
/// with an optional trailing "Z" or fractional seconds.
fn parse_reference_datetime(reference: &str) -> Result<DateTime<Utc>, String> {
    let cleaned = reference.trim_end_matches('Z').trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    for format in &datetime_formats {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(cleaned, format) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(cleaned, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc));
    }

    Err(format!("Could not parse reference datetime: {}", reference))
}

/// Build a UTC datetime from calendar components
pub fn utc_datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<DateTime<Utc>, String> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| {
            format!(
                "Invalid calendar datetime: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            )
        })
}
