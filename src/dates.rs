use chrono::{Datelike, NaiveDateTime, Utc};

const STORED: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a stored `YYYY-MM-DD HH:MM:SS` UTC timestamp for display.
/// Unparseable values are shown as stored.
pub fn display(db_time: &str) -> String {
    display_at(db_time, Utc::now().naive_utc())
}

/// Calendar-relative wording against `now`: `today, 14:05`,
/// `yesterday, 09:30`, `3 Mar, 18:00` within the year, `15 Jan 2021` before it.
fn display_at(db_time: &str, now: NaiveDateTime) -> String {
    let Ok(stamp) = NaiveDateTime::parse_from_str(db_time, STORED) else {
        return db_time.to_string();
    };

    match (now.date() - stamp.date()).num_days() {
        0 => stamp.format("today, %H:%M").to_string(),
        1 => stamp.format("yesterday, %H:%M").to_string(),
        _ if stamp.year() == now.year() && stamp <= now => {
            stamp.format("%-d %b, %H:%M").to_string()
        }
        _ => stamp.format("%-d %b %Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, STORED).unwrap()
    }

    #[test]
    fn same_day_shows_time_only() {
        let now = at("2024-06-10 18:00:00");
        assert_eq!(display_at("2024-06-10 00:05:00", now), "today, 00:05");
        assert_eq!(display_at("2024-06-09 23:59:59", now), "yesterday, 23:59");
    }

    #[test]
    fn earlier_this_year_drops_the_year() {
        let now = at("2024-06-10 18:00:00");
        assert_eq!(display_at("2024-03-03 07:45:00", now), "3 Mar, 07:45");
        assert_eq!(display_at("2023-12-31 23:00:00", now), "31 Dec 2023");
    }

    #[test]
    fn future_stamps_are_absolute() {
        let now = at("2024-06-10 18:00:00");
        assert_eq!(display_at("2024-08-01 10:00:00", now), "1 Aug 2024");
    }

    #[test]
    fn garbage_is_passed_through() {
        assert_eq!(display("not-a-date"), "not-a-date");
        assert_eq!(display("2021-01-15"), "2021-01-15");
        assert_eq!(display("2021-01-15 12:00:00"), "15 Jan 2021");
    }
}
