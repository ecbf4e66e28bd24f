use thiserror::Error;

use super::aggregate::{
    day_type_totals, hourly_means, seasonal_totals, user_totals, yearly_user_totals, UserTotals,
};
use super::filter::{filter_rows, DateRange, DateRangeInput, YearSelection};
use super::model::{BikeShareData, DayType};

// ---------------------------------------------------------------------------
// Halt conditions
// ---------------------------------------------------------------------------

/// Why a render cycle stopped before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Halt {
    #[error("Please select a valid date range.")]
    InvalidRange,
    #[error("No data available for the selected date range and filters.")]
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Halt {
    pub fn severity(self) -> Severity {
        match self {
            Halt::InvalidRange => Severity::Error,
            Halt::NoData => Severity::Warning,
        }
    }
}

// ---------------------------------------------------------------------------
// Report – everything the dashboard shows for one selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub range: DateRange,
    pub daily_rows: usize,
    pub hourly_rows: usize,
    pub totals: UserTotals,
    pub yearly: Vec<(i32, UserTotals)>,
    pub seasonal: Vec<(String, u64)>,
    pub day_types: Vec<(DayType, u64)>,
    pub hourly: Vec<(u8, f64)>,
}

impl Report {
    /// Confirmation line for the applied range.
    pub fn confirmation(&self) -> String {
        format!(
            "Data shown for date range: {} to {}",
            self.range.start(),
            self.range.end()
        )
    }
}

/// Validate the selection, filter both tables and run every reducer.
///
/// Either all outputs are produced or the cycle halts with a [`Halt`].
pub fn run(
    data: &BikeShareData,
    input: DateRangeInput,
    years: &YearSelection,
) -> Result<Report, Halt> {
    let range = match input {
        DateRangeInput::Valid(range) => range,
        DateRangeInput::Incomplete | DateRangeInput::Invalid { .. } => {
            log::warn!("Rejected date range input: {input:?}");
            return Err(Halt::InvalidRange);
        }
    };

    let daily = filter_rows(&data.daily, &range, years);
    let hourly = filter_rows(&data.hourly, &range, years);

    if daily.is_empty() || hourly.is_empty() {
        log::warn!(
            "No rows for {} to {} in years {years:?} ({} daily, {} hourly)",
            range.start(),
            range.end(),
            daily.len(),
            hourly.len()
        );
        return Err(Halt::NoData);
    }

    log::debug!(
        "Aggregating {} daily and {} hourly rows",
        daily.len(),
        hourly.len()
    );

    Ok(Report {
        range,
        daily_rows: daily.len(),
        hourly_rows: hourly.len(),
        totals: user_totals(&daily),
        yearly: yearly_user_totals(&daily),
        seasonal: seasonal_totals(&daily),
        day_types: day_type_totals(&daily),
        hourly: hourly_means(&hourly),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::DateRangeSelection;
    use crate::data::model::fixtures::*;

    fn full_input(data: &BikeShareData) -> DateRangeInput {
        DateRangeSelection::full(data.date_span()).input()
    }

    #[test]
    fn full_selection_produces_report() {
        let data = sample();
        let report = run(&data, full_input(&data), &data.years()).unwrap();

        assert_eq!(report.daily_rows, 4);
        assert_eq!(report.hourly_rows, 7);
        assert_eq!(report.totals.registered, 10454);
        assert_eq!(report.totals.casual, 3231);
        assert_eq!(
            report.confirmation(),
            "Data shown for date range: 2011-01-01 to 2012-12-31"
        );
    }

    #[test]
    fn incomplete_range_halts_with_error() {
        let data = sample();
        let input = DateRangeSelection {
            start: Some(date(2011, 1, 1)),
            end: None,
        }
        .input();

        let halt = run(&data, input, &data.years()).unwrap_err();
        assert_eq!(halt, Halt::InvalidRange);
        assert_eq!(halt.severity(), Severity::Error);
        assert_eq!(halt.to_string(), "Please select a valid date range.");
    }

    #[test]
    fn reversed_range_halts_with_error() {
        let data = sample();
        let input = DateRangeSelection {
            start: Some(date(2012, 1, 1)),
            end: Some(date(2011, 1, 1)),
        }
        .input();

        assert_eq!(run(&data, input, &data.years()), Err(Halt::InvalidRange));
    }

    #[test]
    fn empty_years_halts_with_warning() {
        let data = sample();
        let halt = run(&data, full_input(&data), &YearSelection::new()).unwrap_err();

        assert_eq!(halt, Halt::NoData);
        assert_eq!(halt.severity(), Severity::Warning);
    }

    #[test]
    fn empty_hourly_side_also_halts() {
        let mut data = sample();
        data.hourly.clear();

        assert_eq!(
            run(&data, full_input(&data), &data.years()),
            Err(Halt::NoData)
        );
    }

    #[test]
    fn repeated_runs_are_identical() {
        let data = sample();
        let years: YearSelection = [2012].into_iter().collect();

        let first = run(&data, full_input(&data), &years).unwrap();
        let second = run(&data, full_input(&data), &years).unwrap();

        assert_eq!(first, second);
        let bits = |r: &Report| r.hourly.iter().map(|(h, m)| (*h, m.to_bits())).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }
}
