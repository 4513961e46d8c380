//! Clock & Calendar — the one place wall-clock time enters the system.
//!
//! Every other component receives a `Calendar` (or nothing time-related
//! at all) rather than reaching for `Utc::now()` directly, so tests can
//! inject a fixed instant.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Supplies the current instant. Implementations must be cheap and
/// side-effect free beyond reading the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Derives day windows and recent-day lists in a configured zone.
///
/// `date_added` values are upstream wall-clock timestamps; the zone here
/// must match whatever zone the warehouse used to assign them, or
/// coverage/freshness checks will systematically under- or over-count
/// near midnight.
pub struct Calendar<C: Clock> {
    clock: C,
    zone: Tz,
}

impl<C: Clock> Calendar<C> {
    pub fn new(clock: C, zone: Tz) -> Self {
        Self { clock, zone }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's calendar date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.zone).date_naive()
    }

    /// The `[00:00:00, 23:59:59]` window for `date` in the configured
    /// zone, as UTC instants and as `YYYYMMDDHHMMSS` integer encodings.
    pub fn day_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>, i64, i64) {
        let start_naive = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        let end_naive = date
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is always valid");

        let start = self
            .zone
            .from_local_datetime(&start_naive)
            .single()
            .unwrap_or_else(|| self.zone.from_utc_datetime(&start_naive))
            .with_timezone(&Utc);
        let end = self
            .zone
            .from_local_datetime(&end_naive)
            .single()
            .unwrap_or_else(|| self.zone.from_utc_datetime(&end_naive))
            .with_timezone(&Utc);

        (start, end, datetime_to_int(date, 0, 0, 0), datetime_to_int(date, 23, 59, 59))
    }

    /// The `n` calendar days ending **yesterday**, ascending. Today is
    /// excluded; it has its own freshness-driven refresh path.
    pub fn recent_days(&self, n: u32) -> Vec<NaiveDate> {
        let today = self.today();
        (1..=n)
            .rev()
            .map(|offset| today - ChronoDuration::days(offset as i64))
            .collect()
    }
}

/// Encode a date + time-of-day as the upstream `YYYYMMDDHHMMSS` integer.
pub fn datetime_to_int(date: NaiveDate, hour: u32, minute: u32, second: u32) -> i64 {
    let date_part = date.format("%Y%m%d").to_string().parse::<i64>().expect("valid date");
    date_part * 1_000_000 + (hour as i64) * 10_000 + (minute as i64) * 100 + second as i64
}

/// Decode a `YYYYMMDDHHMMSS` integer into its UTC-naive `DateTime`.
///
/// Returns `None` if `encoded` isn't a valid encoding produced by
/// [`datetime_to_int`] (or the upstream equivalent).
pub fn int_to_datetime(encoded: i64) -> Option<DateTime<Utc>> {
    if encoded < 0 {
        return None;
    }
    let date_part = encoded / 1_000_000;
    let time_part = encoded % 1_000_000;
    let year = (date_part / 10_000) as i32;
    let month = ((date_part / 100) % 100) as u32;
    let day = (date_part % 100) as u32;
    let hour = (time_part / 10_000) as u32;
    let minute = (time_part / 100 % 100) as u32;
    let second = (time_part % 100) as u32;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive = date.and_hms_opt(hour, minute, second)?;
    Some(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_int_round_trips() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        let encoded = datetime_to_int(date, 15, 30, 5);
        assert_eq!(encoded, 20260121153005);
        let decoded = int_to_datetime(encoded).unwrap();
        assert_eq!(decoded.format("%Y%m%d%H%M%S").to_string(), "20260121153005");
    }

    #[test]
    fn recent_days_excludes_today_and_is_ascending() {
        let clock = FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 22, 15, 30, 0).unwrap(),
        );
        let calendar = Calendar::new(clock, chrono_tz::UTC);

        assert!(calendar.recent_days(0).is_empty());

        let days = calendar.recent_days(3);
        assert_eq!(days.len(), 3);
        assert!(days.windows(2).all(|w| w[0] < w[1]));
        assert!(!days.contains(&calendar.today()));
        assert_eq!(*days.last().unwrap(), calendar.today() - ChronoDuration::days(1));
    }

    #[test]
    fn day_window_covers_full_day() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 22, 0, 0, 0).unwrap());
        let calendar = Calendar::new(clock, chrono_tz::UTC);
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        let (_, _, lo, hi) = calendar.day_window(date);
        assert_eq!(lo, 20260121000000);
        assert_eq!(hi, 20260121235959);
    }
}
