use chrono::{DateTime, Utc};

/// Escape text for embedding in HTML. Message content is always treated as
/// plain text, never markup.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render an RFC 3339 timestamp relative to `now`.
///
/// Buckets: under a minute, minutes, hours, then an absolute date. Inputs
/// that fail to parse are returned untouched rather than dropped.
#[must_use]
pub fn format_timestamp(timestamp: &str, now: DateTime<Utc>) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let elapsed = now.signed_duration_since(parsed.with_timezone(&Utc));
    let seconds = elapsed.num_seconds();

    if seconds < 60 {
        return "Just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    parsed.format("%b %-d, %Y").to_string()
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn at(secs_ago: i64) -> String {
        (now() - chrono::Duration::seconds(secs_ago)).to_rfc3339()
    }

    #[test]
    fn escapes_all_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"a" & 'b'</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn under_a_minute_is_just_now() {
        assert_eq!(format_timestamp(&at(0), now()), "Just now");
        assert_eq!(format_timestamp(&at(59), now()), "Just now");
    }

    #[test]
    fn minutes_bucket_pluralizes() {
        assert_eq!(format_timestamp(&at(60), now()), "1 minute ago");
        assert_eq!(format_timestamp(&at(59 * 60), now()), "59 minutes ago");
    }

    #[test]
    fn hours_bucket_pluralizes() {
        assert_eq!(format_timestamp(&at(60 * 60), now()), "1 hour ago");
        assert_eq!(format_timestamp(&at(23 * 60 * 60), now()), "23 hours ago");
    }

    #[test]
    fn a_day_or_more_is_an_absolute_date() {
        assert_eq!(format_timestamp(&at(24 * 60 * 60), now()), "Jun 14, 2024");
        assert_eq!(
            format_timestamp("2023-01-02T03:04:05.000Z", now()),
            "Jan 2, 2023"
        );
    }

    #[test]
    fn unparseable_input_is_returned_verbatim() {
        assert_eq!(format_timestamp("not-a-date", now()), "not-a-date");
    }
}
