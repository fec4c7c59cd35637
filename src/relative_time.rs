use chrono::{DateTime, NaiveDateTime, Utc};

/// Human label for how long ago `timestamp` was, relative to `now`.
///
/// Absent, empty and `"null"` timestamps render as an empty label. Text that
/// does not parse falls back to its `HH:MM:SS` portion, or is shown as is.
pub fn format_time_ago(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = timestamp.map(str::trim) else {
        return String::new();
    };
    if raw.is_empty() || raw == "null" {
        return String::new();
    }
    let Some(then) = parse_timestamp(raw) else {
        tracing::debug!(timestamp = raw, "unparseable check time");
        return time_of_day(raw).to_string();
    };
    let elapsed = now.signed_duration_since(then).num_seconds();
    if elapsed < 60 {
        return "just now".to_string();
    }
    if elapsed < 3600 {
        return format!("{} minutes ago", elapsed / 60);
    }
    if elapsed < 86_400 {
        return format!("{} hours ago", elapsed / 3600);
    }
    format!("{} days ago", elapsed / 86_400)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Zone-less timestamps are taken as UTC.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn time_of_day(raw: &str) -> &str {
    let Some(split) = raw.find(['T', ' ']) else {
        return raw;
    };
    let rest = &raw[split + 1..];
    let bytes = rest.as_bytes();
    let clock_like = bytes.len() >= 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b':';
    if !clock_like {
        return raw;
    }
    rest.get(..8).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn ago(seconds: i64) -> String {
        (now() - Duration::seconds(seconds)).to_rfc3339()
    }

    #[test]
    fn empty_inputs_render_nothing() {
        assert_eq!(format_time_ago(None, now()), "");
        assert_eq!(format_time_ago(Some(""), now()), "");
        assert_eq!(format_time_ago(Some("null"), now()), "");
    }

    #[test]
    fn buckets_floor() {
        assert_eq!(format_time_ago(Some(&ago(30)), now()), "just now");
        assert_eq!(format_time_ago(Some(&ago(90)), now()), "1 minutes ago");
        assert_eq!(format_time_ago(Some(&ago(3599)), now()), "59 minutes ago");
        assert_eq!(format_time_ago(Some(&ago(7200)), now()), "2 hours ago");
        assert_eq!(format_time_ago(Some(&ago(3 * 86_400 + 5)), now()), "3 days ago");
    }

    #[test]
    fn future_times_are_just_now() {
        assert_eq!(format_time_ago(Some(&ago(-600)), now()), "just now");
    }

    #[test]
    fn accepts_zulu_and_naive_forms() {
        assert_eq!(
            format_time_ago(Some("2025-03-01T11:58:00Z"), now()),
            "2 minutes ago"
        );
        assert_eq!(
            format_time_ago(Some("2025-03-01 09:00:00"), now()),
            "3 hours ago"
        );
    }

    #[test]
    fn unparseable_falls_back_to_clock() {
        assert_eq!(
            format_time_ago(Some("2025-13-40T10:11:12.5+08:00"), now()),
            "10:11:12"
        );
        assert_eq!(format_time_ago(Some("sometime"), now()), "sometime");
        assert_eq!(format_time_ago(Some("day 10:11"), now()), "10:11");
    }

    #[test]
    fn words_are_not_sliced_as_clock_times() {
        assert_eq!(format_time_ago(Some("Tomorrow"), now()), "Tomorrow");
        assert_eq!(format_time_ago(Some("next week"), now()), "next week");
        assert_eq!(format_time_ago(Some("at 9:30"), now()), "at 9:30");
    }
}
