use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

enum EndpointEdit {
    Set(NaiveDate),
    Clear,
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some((min, max)) = state.bounds else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            ui.strong("Select date range");
            ui.label(RichText::new(format!("{min} to {max} available")).small());

            match endpoint_picker(ui, "From", "start_date", state.date_range.start, min) {
                Some(EndpointEdit::Set(date)) => state.set_start(date),
                Some(EndpointEdit::Clear) => state.clear_start(),
                None => {}
            }
            match endpoint_picker(ui, "To", "end_date", state.date_range.end, max) {
                Some(EndpointEdit::Set(date)) => state.set_end(date),
                Some(EndpointEdit::Clear) => state.clear_end(),
                None => {}
            }
            ui.separator();

            // ---- Year multi-select ----
            let n_selected = state.years.len();
            let n_total = state.available_years.len();
            ui.strong(format!("Select Year  ({n_selected}/{n_total})"));

            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_years();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_years();
                }
            });

            let years: Vec<i32> = state.available_years.iter().copied().collect();
            for year in years {
                let mut checked = state.years.contains(&year);
                if ui.checkbox(&mut checked, year.to_string()).changed() {
                    state.toggle_year(year);
                }
            }
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// One end of the date range: a picker plus a button to clear it, or a
/// button to set it again once cleared.
fn endpoint_picker(
    ui: &mut Ui,
    label: &str,
    id: &str,
    current: Option<NaiveDate>,
    fallback: NaiveDate,
) -> Option<EndpointEdit> {
    let mut edit = None;
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        match current {
            Some(date) => {
                let mut picked = date;
                let response = ui.add(
                    DatePickerButton::new(&mut picked)
                        .id_salt(id)
                        .calendar_week(false),
                );
                if response.changed() && picked != date {
                    edit = Some(EndpointEdit::Set(picked));
                }
                if ui.small_button("Clear").clicked() {
                    edit = Some(EndpointEdit::Clear);
                }
            }
            None => {
                ui.label(RichText::new("not set").italics());
                if ui.small_button("Set").clicked() {
                    edit = Some(EndpointEdit::Set(fallback));
                }
            }
        }
    });
    edit
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} days, {} hourly rows loaded",
            state.data.daily.len(),
            state.data.hourly.len()
        ))
        .on_hover_text(format!(
            "{}\n{}",
            state.source.day.display(),
            state.source.hour.display()
        ));

        if let Ok(report) = &state.report {
            ui.separator();
            ui.label(format!(
                "{} days, {} hours selected",
                report.daily_rows, report.hourly_rows
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open folder with day_cleaned.csv and hour_cleaned.csv")
        .pick_folder();

    if let Some(dir) = folder {
        state.open_folder(&dir);
    }
}
