//! Day bucketing in an explicit reporting timezone
//!
//! Every day boundary used for stats goes through this module, so the
//! label an event gets and the window start the store is queried with
//! always agree on what "local midnight" means.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Timezone used to cut the event log into calendar days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatsTimezone {
    /// The host's zone, including its DST rules
    #[default]
    Local,
    /// A constant offset from UTC
    Fixed(FixedOffset),
}

impl StatsTimezone {
    pub fn utc() -> Self {
        StatsTimezone::Fixed(Utc.fix())
    }

    /// Offset given in seconds east of UTC
    pub fn fixed_seconds(east: i32) -> Option<Self> {
        FixedOffset::east_opt(east).map(StatsTimezone::Fixed)
    }

    /// Parse `local`, `utc`/`z`, or an offset such as `+02:00` or `-0530`
    pub fn parse(raw: &str) -> Result<Self, String> {
        let value = raw.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "local" => Ok(StatsTimezone::Local),
            "utc" | "z" => Ok(StatsTimezone::utc()),
            _ => value
                .parse::<FixedOffset>()
                .map(StatsTimezone::Fixed)
                .map_err(|e| format!("invalid timezone offset '{}': {}", value, e)),
        }
    }

    /// Local calendar day of a Unix-millisecond timestamp
    pub fn date_of(&self, timestamp_ms: i64) -> Option<NaiveDate> {
        let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)?;
        Some(match self {
            StatsTimezone::Local => utc.with_timezone(&Local).date_naive(),
            StatsTimezone::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        })
    }

    /// Local calendar day containing `now`
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            StatsTimezone::Local => now.with_timezone(&Local).date_naive(),
            StatsTimezone::Fixed(offset) => now.with_timezone(offset).date_naive(),
        }
    }

    /// Unix milliseconds of the first instant of `date` in this zone
    pub fn start_of_day(&self, date: NaiveDate) -> i64 {
        match self {
            StatsTimezone::Local => first_instant(&Local, date),
            StatsTimezone::Fixed(offset) => first_instant(offset, date),
        }
    }
}

impl std::fmt::Display for StatsTimezone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsTimezone::Local => f.write_str("local"),
            StatsTimezone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Local midnight, or the first valid local time after it when a DST
/// jump skips midnight (some zones switch at 00:00).
fn first_instant<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt.timestamp_millis();
    }

    let mut candidate = midnight;
    for _ in 0..(24 * 4) {
        candidate += Duration::minutes(15);
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt.timestamp_millis();
        }
    }
    midnight.and_utc().timestamp_millis()
}

/// `YYYY-MM-DD` label for a calendar day
pub fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD` label of the local day containing `timestamp_ms`
///
/// Returns `None` for timestamps outside the representable range.
pub fn local_date_label(timestamp_ms: i64, tz: &StatsTimezone) -> Option<String> {
    tz.date_of(timestamp_ms).map(date_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{LocalResult, NaiveDateTime};

    fn ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp_millis()
    }

    #[test]
    fn test_parse_timezones() {
        assert_eq!(StatsTimezone::parse("local").unwrap(), StatsTimezone::Local);
        assert_eq!(StatsTimezone::parse("").unwrap(), StatsTimezone::Local);
        assert_eq!(StatsTimezone::parse("UTC").unwrap(), StatsTimezone::utc());
        assert_eq!(
            StatsTimezone::parse("+02:00").unwrap(),
            StatsTimezone::fixed_seconds(7200).unwrap()
        );
        assert_eq!(
            StatsTimezone::parse("-0530").unwrap(),
            StatsTimezone::fixed_seconds(-(5 * 3600 + 30 * 60)).unwrap()
        );
        assert_eq!(
            StatsTimezone::parse(" +09:00 ").unwrap(),
            StatsTimezone::fixed_seconds(9 * 3600).unwrap()
        );

        assert!(StatsTimezone::parse("Europe/Paris").is_err());
        assert!(StatsTimezone::parse("+2:75").is_err());
        assert!(StatsTimezone::parse("+99:00").is_err());
        assert!(StatsTimezone::parse("+").is_err());
    }

    #[test]
    fn test_label_applies_offset_near_midnight() {
        // 23:30 UTC on March 1st
        let ts = ms(2024, 3, 1, 23, 30);

        assert_eq!(local_date_label(ts, &StatsTimezone::utc()).unwrap(), "2024-03-01");
        assert_eq!(
            local_date_label(ts, &StatsTimezone::parse("+01:00").unwrap()).unwrap(),
            "2024-03-02"
        );
        assert_eq!(
            local_date_label(ms(2024, 3, 2, 0, 30), &StatsTimezone::parse("-05:00").unwrap()).unwrap(),
            "2024-03-01"
        );
    }

    #[test]
    fn test_start_of_day_fixed_offset() {
        let tz = StatsTimezone::parse("+02:00").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();

        // Local midnight at +02:00 is 22:00 UTC the previous day
        assert_eq!(tz.start_of_day(date), ms(2024, 7, 9, 22, 0));
        assert_eq!(tz.date_of(tz.start_of_day(date)), Some(date));
        assert_eq!(tz.date_of(tz.start_of_day(date) - 1), date.pred_opt());
    }

    #[test]
    fn test_local_zone_round_trips_day_boundary() {
        let tz = StatsTimezone::Local;
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let start = tz.start_of_day(date);

        assert_eq!(tz.date_of(start), Some(date));
        assert_ne!(tz.date_of(start - 1), Some(date));
    }

    #[test]
    fn test_first_instant_lands_on_requested_day() {
        let tz = FixedOffset::east_opt(-3 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
        let start = first_instant(&tz, date);

        assert_eq!(
            DateTime::<Utc>::from_timestamp_millis(start).unwrap().with_timezone(&tz).date_naive(),
            date
        );
    }

    #[test]
    fn test_out_of_range_timestamp_has_no_label() {
        assert!(local_date_label(i64::MAX, &StatsTimezone::utc()).is_none());
    }

    /// Zone at UTC-3 that springs forward to UTC-2 at local midnight on
    /// 2024-11-03, so 00:00-00:59 that day never happens
    #[derive(Debug, Clone, Copy)]
    struct MidnightJump;

    fn jump_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 3).unwrap()
    }

    fn standard() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn summer() -> FixedOffset {
        FixedOffset::west_opt(2 * 3600).unwrap()
    }

    impl TimeZone for MidnightJump {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightJump
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_start = jump_day().and_time(NaiveTime::MIN);
            if *local < gap_start {
                LocalResult::Single(standard())
            } else if *local < gap_start + Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(summer())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            // Local midnight at UTC-3 is 03:00 UTC
            let switch = jump_day().and_hms_opt(3, 0, 0).unwrap();
            if *utc < switch {
                standard()
            } else {
                summer()
            }
        }
    }

    #[test]
    fn test_first_instant_when_dst_skips_midnight() {
        // Midnight does not exist; the day starts at 01:00 local (UTC-2)
        assert_eq!(first_instant(&MidnightJump, jump_day()), ms(2024, 11, 3, 3, 0));

        let start = DateTime::<Utc>::from_timestamp_millis(first_instant(&MidnightJump, jump_day())).unwrap();
        assert_eq!(start.with_timezone(&MidnightJump).date_naive(), jump_day());
        assert_eq!(
            (start - Duration::milliseconds(1)).with_timezone(&MidnightJump).date_naive(),
            jump_day().pred_opt().unwrap()
        );
    }

    #[test]
    fn test_first_instant_around_dst_jump() {
        let before = jump_day().pred_opt().unwrap();
        let after = jump_day().succ_opt().unwrap();

        assert_eq!(first_instant(&MidnightJump, before), ms(2024, 11, 2, 3, 0));
        assert_eq!(first_instant(&MidnightJump, after), ms(2024, 11, 4, 2, 0));
    }
}
