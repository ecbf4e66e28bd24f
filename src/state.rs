use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::DataSource;
use crate::data::filter::{DateRangeSelection, YearSelection};
use crate::data::loader;
use crate::data::model::BikeShareData;
use crate::data::pipeline::{self, Halt, Report};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where the current dataset was loaded from.
    pub source: DataSource,

    /// Loaded tables, shared with the loader cache.
    pub data: Arc<BikeShareData>,

    /// First and last date of the daily table; bounds the date pickers.
    pub bounds: Option<(NaiveDate, NaiveDate)>,

    /// Years present in the daily table.
    pub available_years: YearSelection,

    /// Date-range control state.
    pub date_range: DateRangeSelection,

    /// Year multi-select state.
    pub years: YearSelection,

    /// Pipeline output for the current selection (recomputed on change).
    pub report: Result<Report, Halt>,

    /// Status / error message from the last file operation.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(source: DataSource, data: Arc<BikeShareData>) -> Self {
        let mut state = Self {
            source,
            bounds: None,
            available_years: YearSelection::new(),
            date_range: DateRangeSelection::default(),
            years: YearSelection::new(),
            report: Err(Halt::NoData),
            status_message: None,
            data,
        };
        state.reset_filters();
        state
    }

    /// Ingest a newly loaded dataset and reset filters to their defaults.
    pub fn set_dataset(&mut self, source: DataSource, data: Arc<BikeShareData>) {
        self.source = source;
        self.data = data;
        self.status_message = None;
        self.reset_filters();
    }

    /// Full date span and every year selected.
    pub fn reset_filters(&mut self) {
        self.bounds = self.data.date_span();
        self.available_years = self.data.years();
        self.date_range = DateRangeSelection::full(self.bounds);
        self.years = self.available_years.clone();
        self.refresh();
    }

    /// Re-run the pipeline for the current selection.
    pub fn refresh(&mut self) {
        self.report = pipeline::run(&self.data, self.date_range.input(), &self.years);
    }

    fn clamp(&self, date: NaiveDate) -> NaiveDate {
        match self.bounds {
            Some((min, max)) => date.clamp(min, max),
            None => date,
        }
    }

    pub fn set_start(&mut self, date: NaiveDate) {
        self.date_range.start = Some(self.clamp(date));
        self.refresh();
    }

    pub fn set_end(&mut self, date: NaiveDate) {
        self.date_range.end = Some(self.clamp(date));
        self.refresh();
    }

    pub fn clear_start(&mut self) {
        self.date_range.start = None;
        self.refresh();
    }

    pub fn clear_end(&mut self) {
        self.date_range.end = None;
        self.refresh();
    }

    /// Toggle a single year in the selection.
    pub fn toggle_year(&mut self, year: i32) {
        if !self.years.remove(&year) {
            self.years.insert(year);
        }
        self.refresh();
    }

    pub fn select_all_years(&mut self) {
        self.years = self.available_years.clone();
        self.refresh();
    }

    pub fn select_no_years(&mut self) {
        self.years.clear();
        self.refresh();
    }

    /// Load the default table files from `dir`, keeping the current dataset
    /// if that fails.
    pub fn open_folder(&mut self, dir: &Path) {
        let source = DataSource::in_dir(dir);
        match loader::load(&source) {
            Ok(data) => {
                log::info!(
                    "Switched to {} daily / {} hourly rows from {}",
                    data.daily.len(),
                    data.hourly.len(),
                    dir.display()
                );
                self.set_dataset(source, data);
            }
            Err(e) => {
                log::error!("Failed to load data folder: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::*;

    fn state() -> AppState {
        AppState::new(DataSource::default(), Arc::new(sample()))
    }

    #[test]
    fn starts_with_full_selection_and_a_report() {
        let state = state();
        assert_eq!(state.date_range.start, Some(date(2011, 1, 1)));
        assert_eq!(state.date_range.end, Some(date(2012, 12, 31)));
        assert_eq!(state.years, state.available_years);

        let report = state.report.as_ref().unwrap();
        assert_eq!(report.daily_rows, 4);
    }

    #[test]
    fn clearing_an_endpoint_invalidates_the_range() {
        let mut state = state();
        state.clear_end();
        assert_eq!(state.report, Err(Halt::InvalidRange));

        state.set_end(date(2011, 12, 31));
        assert_eq!(state.report.as_ref().unwrap().daily_rows, 2);
    }

    #[test]
    fn picked_dates_are_clamped_to_the_data_span() {
        let mut state = state();
        state.set_start(date(2000, 1, 1));
        state.set_end(date(2030, 1, 1));
        assert_eq!(state.date_range.start, Some(date(2011, 1, 1)));
        assert_eq!(state.date_range.end, Some(date(2012, 12, 31)));
    }

    #[test]
    fn deselecting_every_year_warns() {
        let mut state = state();
        state.select_no_years();
        assert_eq!(state.report, Err(Halt::NoData));

        state.toggle_year(2012);
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.yearly.len(), 1);
        assert_eq!(report.yearly[0].0, 2012);

        state.select_all_years();
        assert_eq!(state.report.as_ref().unwrap().yearly.len(), 2);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = state();
        state.clear_start();
        state.toggle_year(2011);
        state.reset_filters();

        assert!(state.report.is_ok());
        assert_eq!(state.years.len(), 2);
    }

    #[test]
    fn failed_folder_load_keeps_current_dataset() {
        let mut state = state();
        let dir = tempfile::tempdir().unwrap();

        state.open_folder(dir.path());

        assert_eq!(state.source, DataSource::default());
        assert_eq!(state.data.daily.len(), 4);
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }
}
