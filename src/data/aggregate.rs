use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::model::{DailyRecord, DayType, HourlyRecord};

// ---------------------------------------------------------------------------
// Reducers over filtered views
// ---------------------------------------------------------------------------

/// Summed user-type counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserTotals {
    pub registered: u64,
    pub casual: u64,
}

impl UserTotals {
    fn add(&mut self, row: &DailyRecord) {
        self.registered = self.registered.saturating_add(row.registered);
        self.casual = self.casual.saturating_add(row.casual);
    }
}

/// Registered and casual totals across the whole view.
pub fn user_totals(view: &FilteredView<'_, DailyRecord>) -> UserTotals {
    let mut totals = UserTotals::default();
    for row in view.iter() {
        totals.add(row);
    }
    totals
}

/// Registered and casual totals per year, ascending by year.
pub fn yearly_user_totals(view: &FilteredView<'_, DailyRecord>) -> Vec<(i32, UserTotals)> {
    let mut by_year: BTreeMap<i32, UserTotals> = BTreeMap::new();
    for row in view.iter() {
        by_year.entry(row.year).or_default().add(row);
    }
    by_year.into_iter().collect()
}

/// Total `cnt` per season, in order of first appearance.
pub fn seasonal_totals(view: &FilteredView<'_, DailyRecord>) -> Vec<(String, u64)> {
    let mut totals: Vec<(String, u64)> = Vec::new();
    for row in view.iter() {
        match totals.iter_mut().find(|(season, _)| *season == row.season) {
            Some((_, sum)) => *sum = sum.saturating_add(row.cnt),
            None => totals.push((row.season.clone(), row.cnt)),
        }
    }
    totals
}

/// Total `cnt` per day type, largest first.
///
/// Groups are formed in label order; ties keep that order.
pub fn day_type_totals(view: &FilteredView<'_, DailyRecord>) -> Vec<(DayType, u64)> {
    let mut by_type: BTreeMap<DayType, u64> = BTreeMap::new();
    for row in view.iter() {
        let sum = by_type
            .entry(DayType::from_working_day(row.working_day))
            .or_default();
        *sum = sum.saturating_add(row.cnt);
    }
    let mut ranked: Vec<(DayType, u64)> = by_type.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Mean `cnt` per hour of day, ascending by hour. Hours with no rows are
/// left out.
pub fn hourly_means(view: &FilteredView<'_, HourlyRecord>) -> Vec<(u8, f64)> {
    let mut by_hour: BTreeMap<u8, (u64, u64)> = BTreeMap::new();
    for row in view.iter() {
        let (sum, n) = by_hour.entry(row.hour).or_default();
        *sum = sum.saturating_add(row.cnt);
        *n += 1;
    }
    by_hour
        .into_iter()
        .map(|(hour, (sum, n))| (hour, sum as f64 / n as f64))
        .collect()
}
