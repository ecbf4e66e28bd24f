use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::Dated;

// ---------------------------------------------------------------------------
// Filter inputs: date range and year selection
// ---------------------------------------------------------------------------

/// Selected years. An empty set selects nothing.
pub type YearSelection = BTreeSet<i32>;

/// A closed date interval with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// What the date-range control currently holds, checked before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeInput {
    /// One or both endpoints missing.
    Incomplete,
    /// Both endpoints present but reversed.
    Invalid { start: NaiveDate, end: NaiveDate },
    Valid(DateRange),
}

/// Raw state of the date-range control. Either endpoint may be cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRangeSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeSelection {
    /// Both endpoints set to the given span (the startup default).
    pub fn full(span: Option<(NaiveDate, NaiveDate)>) -> Self {
        match span {
            Some((start, end)) => Self {
                start: Some(start),
                end: Some(end),
            },
            None => Self::default(),
        }
    }

    pub fn input(&self) -> DateRangeInput {
        match (self.start, self.end) {
            (Some(start), Some(end)) => match DateRange::new(start, end) {
                Some(range) => DateRangeInput::Valid(range),
                None => DateRangeInput::Invalid { start, end },
            },
            _ => DateRangeInput::Incomplete,
        }
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Rows of one table that pass the current filters, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a, T> {
    rows: Vec<&'a T>,
}

impl<'a, T> FilteredView<'a, T> {
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep the rows with `range.start <= date <= range.end` and `year ∈ years`.
///
/// Applied the same way to the daily and the hourly table. An empty result
/// is not an error here; the caller decides what to do with it.
pub fn filter_rows<'a, T: Dated>(
    rows: &'a [T],
    range: &DateRange,
    years: &YearSelection,
) -> FilteredView<'a, T> {
    FilteredView {
        rows: rows
            .iter()
            .filter(|row| range.contains(row.date()) && years.contains(&row.year()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::*;

    fn all_years() -> YearSelection {
        [2011, 2012].into_iter().collect()
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(DateRange::new(date(2012, 1, 2), date(2012, 1, 1)).is_none());
        assert!(DateRange::new(date(2012, 1, 1), date(2012, 1, 1)).is_some());
    }

    #[test]
    fn selection_input_variants() {
        let a = date(2011, 1, 1);
        let b = date(2011, 2, 1);

        let missing_end = DateRangeSelection {
            start: Some(a),
            end: None,
        };
        assert_eq!(missing_end.input(), DateRangeInput::Incomplete);
        assert_eq!(DateRangeSelection::default().input(), DateRangeInput::Incomplete);

        let reversed = DateRangeSelection {
            start: Some(b),
            end: Some(a),
        };
        assert_eq!(reversed.input(), DateRangeInput::Invalid { start: b, end: a });

        let ok = DateRangeSelection::full(Some((a, b)));
        assert_eq!(
            ok.input(),
            DateRangeInput::Valid(DateRange::new(a, b).unwrap())
        );
    }

    #[test]
    fn every_kept_row_satisfies_the_predicate() {
        let data = sample();
        let range = DateRange::new(date(2011, 6, 1), date(2012, 12, 31)).unwrap();
        let years: YearSelection = [2012].into_iter().collect();

        let daily = filter_rows(&data.daily, &range, &years);
        let hourly = filter_rows(&data.hourly, &range, &years);

        assert_eq!(daily.len(), 2);
        assert_eq!(hourly.len(), 3);
        for row in daily.iter() {
            assert!(range.contains(row.date) && years.contains(&row.year));
        }
        for row in hourly.iter() {
            assert!(range.contains(row.date) && years.contains(&row.year));
        }
    }

    #[test]
    fn range_bounds_are_inclusive_and_order_is_kept() {
        let data = sample();
        let range = DateRange::new(date(2011, 1, 1), date(2011, 7, 4)).unwrap();

        let daily = filter_rows(&data.daily, &range, &all_years());
        let dates: Vec<_> = daily.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2011, 1, 1), date(2011, 7, 4)]);

        let hourly = filter_rows(&data.hourly, &range, &all_years());
        let hours: Vec<_> = hourly.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![0, 1, 0, 17]);
    }

    #[test]
    fn empty_year_selection_yields_empty_views() {
        let data = sample();
        let range = DateRange::new(date(2011, 1, 1), date(2012, 12, 31)).unwrap();
        let none = YearSelection::new();

        assert!(filter_rows(&data.daily, &range, &none).is_empty());
        assert!(filter_rows(&data.hourly, &range, &none).is_empty());
    }

    #[test]
    fn range_outside_data_yields_empty_view() {
        let data = sample();
        let range = DateRange::new(date(2015, 1, 1), date(2015, 2, 1)).unwrap();
        assert!(filter_rows(&data.daily, &range, &all_years()).is_empty());
    }
}
