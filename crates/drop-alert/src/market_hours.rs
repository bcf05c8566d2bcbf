use chrono::{DateTime, Datelike, NaiveTime, Weekday};
use chrono_tz::Tz;

/// Regular trading session, in exchange-local wall-clock time.
pub struct MarketHours {
    pub open: NaiveTime,     // 09:30
    pub close: NaiveTime,    // 16:00
    pub weekdays_only: bool, // Monday-Friday
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            weekdays_only: true,
        }
    }
}

impl MarketHours {
    /// Whether `now` falls inside the session. Both ends are inclusive.
    pub fn is_open(&self, now: &DateTime<Tz>) -> bool {
        if self.weekdays_only && matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        let time = now.time();
        self.open <= time && time <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::US::Eastern;

    fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Tz> {
        Eastern.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_default_session() {
        let hours = MarketHours::default();
        assert_eq!(hours.open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(hours.close, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert!(hours.weekdays_only);
    }

    #[test]
    fn test_weekday_session_bounds_inclusive() {
        let hours = MarketHours::default();
        // 2026-10-19 is a Monday
        assert!(!hours.is_open(&eastern(2026, 10, 19, 9, 29, 59)));
        assert!(hours.is_open(&eastern(2026, 10, 19, 9, 30, 0)));
        assert!(hours.is_open(&eastern(2026, 10, 19, 12, 0, 0)));
        assert!(hours.is_open(&eastern(2026, 10, 19, 16, 0, 0)));
        assert!(!hours.is_open(&eastern(2026, 10, 19, 16, 0, 1)));
    }

    #[test]
    fn test_weekend_closed() {
        let hours = MarketHours::default();
        assert!(!hours.is_open(&eastern(2026, 10, 17, 11, 0, 0)));
        assert!(!hours.is_open(&eastern(2026, 10, 18, 11, 0, 0)));
    }

    #[test]
    fn test_uses_local_wall_clock() {
        let hours = MarketHours::default();
        // 14:00 UTC on a Monday in October is 10:00 in New York
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap().with_timezone(&Eastern);
        assert!(hours.is_open(&now));
        // 22:00 UTC is 18:00 in New York
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap().with_timezone(&Eastern);
        assert!(!hours.is_open(&now));
    }
}
