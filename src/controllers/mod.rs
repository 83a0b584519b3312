//! Per-component controllers
//!
//! Each controller is a service bound to its component's mounted
//! fragment: it reads and mutates page slots in response to user
//! actions. Controllers are constructed once by the application root
//! and handed their dependencies explicitly; nothing lives in ambient
//! globals.

mod ai_assistant;
mod comments;
mod discussion;
mod navbar;
mod topic_info;

pub use ai_assistant::AiAssistantController;
pub use comments::{CommentsController, Vote};
pub use discussion::{DiscussionController, SortKind};
pub use navbar::NavbarController;
pub use topic_info::TopicInfoController;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parse a displayed comment timestamp. The fixtures use
/// "YYYY-MM-DD HH:MM"; seconds and RFC 3339 are tolerated.
pub fn parse_display_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Human-readable relative timestamp for freshly created content
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    if elapsed.num_minutes() < 1 {
        return "just now".to_string();
    }
    if elapsed.num_hours() < 1 {
        return format!("{} minutes ago", elapsed.num_minutes());
    }
    if elapsed.num_days() < 1 {
        return format!("{} hours ago", elapsed.num_hours());
    }
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_display_time() {
        let parsed = parse_display_time("2024-01-15 14:30").unwrap();
        assert_eq!(parsed.format("%H:%M").to_string(), "14:30");
        assert!(parse_display_time("2024-01-15 14:30:05").is_some());
        assert!(parse_display_time("not a date").is_none());
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(now, now), "just now");
        assert_eq!(
            format_relative(now - Duration::minutes(5), now),
            "5 minutes ago"
        );
        assert_eq!(
            format_relative(now - Duration::hours(3), now),
            "3 hours ago"
        );
        let old = now - Duration::days(3);
        assert_eq!(
            format_relative(old, now),
            old.format("%Y-%m-%d %H:%M").to_string()
        );
    }
}
