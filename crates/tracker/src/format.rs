//! Text rendering of sleep sessions.

use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write};
use storage::SleepSession;

const ONE_SECOND_MILLIS: i64 = 1_000;
const ONE_MINUTE_MILLIS: i64 = 60 * ONE_SECOND_MILLIS;
const ONE_HOUR_MILLIS: i64 = 60 * ONE_MINUTE_MILLIS;

/// Label for a numeric quality rating; `"--"` for unrated or unknown values.
pub fn quality_label(quality: i32) -> &'static str {
    match quality {
        0 => "Very bad",
        1 => "Poor",
        2 => "So-so",
        3 => "OK",
        4 => "Pretty good",
        5 => "Excellent",
        _ => "--",
    }
}

/// Short duration text such as `"7 hours on Wednesday"`.
///
/// The unit is the largest of seconds, minutes, or hours that fits; the
/// weekday is the one tracking started on.
pub fn format_duration<Tz>(start_millis: i64, end_millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let duration = end_millis - start_millis;
    let amount = if duration < ONE_MINUTE_MILLIS {
        format!("{} seconds", duration / ONE_SECOND_MILLIS)
    } else if duration < ONE_HOUR_MILLIS {
        format!("{} minutes", duration / ONE_MINUTE_MILLIS)
    } else {
        format!("{} hours", duration / ONE_HOUR_MILLIS)
    };
    match local_time(start_millis, tz) {
        Some(start) => format!("{amount} on {}", start.format("%A")),
        None => amount,
    }
}

/// Multi-line report of every session, in the order given.
pub fn format_nights<Tz>(nights: &[SleepSession], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::from("HERE IS YOUR SLEEP DATA\n");
    for night in nights {
        let _ = writeln!(out, "Start:\n\t{}", format_timestamp(night.start_time_millis, tz));
        if !night.is_open() {
            let _ = writeln!(out, "End:\n\t{}", format_timestamp(night.end_time_millis, tz));
        }
        let _ = writeln!(out, "Quality:\t{}", quality_label(night.sleep_quality));
        let _ = writeln!(
            out,
            "Hours:Minutes:Seconds\n\t{}\n",
            format_clock(night.duration_millis())
        );
    }
    out
}

fn format_timestamp<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match local_time(millis, tz) {
        Some(time) => time.format("%A %b-%d-%Y Time: %H:%M").to_string(),
        None => millis.to_string(),
    }
}

fn format_clock(millis: i64) -> String {
    let total_seconds = millis.max(0) / ONE_SECOND_MILLIS;
    format!(
        "{}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

fn local_time<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).single()
}
