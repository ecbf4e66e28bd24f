use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Anything carrying the shared date/year domain both tables are filtered on.
pub trait Dated {
    fn date(&self) -> NaiveDate;
    fn year(&self) -> i32;
}

/// One row of the daily table (one per calendar date).
///
/// `cnt == registered + casual` is expected to hold in cleaned input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub year: i32,
    /// Categorical season label, kept as it appears in storage.
    pub season: String,
    pub working_day: bool,
    pub registered: u64,
    pub casual: u64,
    pub cnt: u64,
}

impl Dated for DailyRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn year(&self) -> i32 {
        self.year
    }
}

/// One row of the hourly table (one per date + hour-of-day).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyRecord {
    pub date: NaiveDate,
    pub year: i32,
    /// Hour of day, 0–23.
    pub hour: u8,
    pub cnt: u64,
}

impl Dated for HourlyRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn year(&self) -> i32 {
        self.year
    }
}

// ---------------------------------------------------------------------------
// DayType – display grouping of the working-day flag
// ---------------------------------------------------------------------------

/// Variant order matches the alphabetical order of the labels, which is the
/// order groups come out of the day-type reducer before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayType {
    WeekendHoliday,
    WorkingDay,
}

impl DayType {
    pub fn from_working_day(flag: bool) -> Self {
        if flag {
            DayType::WorkingDay
        } else {
            DayType::WeekendHoliday
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayType::WeekendHoliday => "Weekend/Holiday",
            DayType::WorkingDay => "Working Day",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// BikeShareData – both loaded tables
// ---------------------------------------------------------------------------

/// The two related tables, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BikeShareData {
    pub daily: Vec<DailyRecord>,
    pub hourly: Vec<HourlyRecord>,
}

impl BikeShareData {
    pub fn new(daily: Vec<DailyRecord>, hourly: Vec<HourlyRecord>) -> Self {
        Self { daily, hourly }
    }

    /// Sorted set of years present in the daily table.
    pub fn years(&self) -> BTreeSet<i32> {
        self.daily.iter().map(|r| r.year).collect()
    }

    /// First and last date of the daily table, `None` when it is empty.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.daily.iter().map(|r| r.date).min()?;
        let max = self.daily.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Number of daily rows whose `cnt` differs from `registered + casual`.
    pub fn inconsistent_daily_rows(&self) -> usize {
        self.daily
            .iter()
            .filter(|r| r.registered.checked_add(r.casual) != Some(r.cnt))
            .count()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn day(
        date: NaiveDate,
        season: &str,
        working_day: bool,
        registered: u64,
        casual: u64,
    ) -> DailyRecord {
        DailyRecord {
            date,
            year: chrono::Datelike::year(&date),
            season: season.to_string(),
            working_day,
            registered,
            casual,
            cnt: registered + casual,
        }
    }

    pub fn hour(date: NaiveDate, hour: u8, cnt: u64) -> HourlyRecord {
        HourlyRecord {
            date,
            year: chrono::Datelike::year(&date),
            hour,
            cnt,
        }
    }

    /// Four days across two years with a handful of hourly rows each.
    pub fn sample() -> BikeShareData {
        let daily = vec![
            day(date(2011, 1, 1), "Winter", false, 654, 331),
            day(date(2011, 7, 4), "Summer", false, 3000, 2000),
            day(date(2012, 3, 21), "Spring", true, 5000, 800),
            day(date(2012, 12, 31), "Winter", true, 1800, 100),
        ];
        let hourly = vec![
            hour(date(2011, 1, 1), 0, 16),
            hour(date(2011, 1, 1), 1, 40),
            hour(date(2011, 7, 4), 0, 30),
            hour(date(2011, 7, 4), 17, 500),
            hour(date(2012, 3, 21), 8, 700),
            hour(date(2012, 3, 21), 17, 900),
            hour(date(2012, 12, 31), 8, 300),
        ];
        BikeShareData::new(daily, hourly)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn years_and_span_come_from_daily_table() {
        let data = sample();
        assert_eq!(data.years().into_iter().collect::<Vec<_>>(), vec![2011, 2012]);
        assert_eq!(
            data.date_span(),
            Some((date(2011, 1, 1), date(2012, 12, 31)))
        );
    }

    #[test]
    fn empty_table_has_no_span() {
        assert_eq!(BikeShareData::default().date_span(), None);
    }

    #[test]
    fn day_type_labels() {
        assert_eq!(DayType::from_working_day(true).label(), "Working Day");
        assert_eq!(DayType::from_working_day(false).to_string(), "Weekend/Holiday");
    }

    #[test]
    fn counts_rows_breaking_the_total_invariant() {
        let mut data = sample();
        assert_eq!(data.inconsistent_daily_rows(), 0);
        data.daily[1].cnt += 1;
        assert_eq!(data.inconsistent_daily_rows(), 1);
    }

    #[test]
    fn overflowing_user_counts_count_as_inconsistent() {
        let mut data = sample();
        data.daily[0].registered = u64::MAX;
        data.daily[0].casual = 1;
        data.daily[0].cnt = 0;
        assert_eq!(data.inconsistent_daily_rows(), 1);
    }
}
