use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::color::ColorMap;
use crate::data::aggregate::UserTotals;
use crate::data::model::DayType;
use crate::data::pipeline::{Halt, Report, Severity};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 240.0;
const WARNING: Color32 = Color32::from_rgb(230, 160, 0);

const INTRO: &str = "Bike-share usage in Washington D.C. from the Bike Sharing Dataset:\n\
    • registered vs casual riders per year\n\
    • usage by season\n\
    • working days vs weekends and holidays\n\
    • peak hours of the day";

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the dashboard for the current selection.
///
/// A halted pipeline shows only its message; otherwise every metric and
/// chart is drawn.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new("Bike Sharing Analysis Dashboard").size(26.0));
            ui.label(INTRO);
            ui.separator();

            match &state.report {
                Ok(report) => report_view(ui, report),
                Err(halt) => halt_message(ui, *halt),
            }
        });
}

fn halt_message(ui: &mut Ui, halt: Halt) {
    let color = match halt.severity() {
        Severity::Error => Color32::RED,
        Severity::Warning => WARNING,
    };
    ui.label(RichText::new(halt.to_string()).color(color).strong());
}

fn report_view(ui: &mut Ui, report: &Report) {
    ui.label(report.confirmation());
    ui.add_space(8.0);

    metrics(ui, &report.totals);
    ui.add_space(8.0);

    ui.heading("Usage by Year and User Type");
    yearly_chart(ui, &report.yearly);

    ui.heading("Usage by Season");
    seasonal_chart(ui, &report.seasonal);

    ui.heading("Working Day vs Weekend/Holiday");
    day_type_chart(ui, &report.day_types);

    ui.heading("Usage by Hour of Day");
    hourly_chart(ui, &report.hourly);

    ui.separator();
    ui.label(
        RichText::new("Data source: Capital Bikeshare system, Washington D.C., USA")
            .italics()
            .color(Color32::LIGHT_BLUE),
    );
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

fn metrics(ui: &mut Ui, totals: &UserTotals) {
    ui.columns(2, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Registered Users", totals.registered);
        metric(&mut cols[1], "Total Casual Users", totals.casual);
    });
}

fn metric(ui: &mut Ui, label: &str, value: u64) {
    ui.label(label);
    ui.label(RichText::new(format_thousands(value)).size(30.0).strong());
}

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn show_bars(ui: &mut Ui, id: &str, y_label: &str, charts: Vec<BarChart>) {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label(y_label)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// One bar per category, each its own legend entry.
fn category_bars(series: &[(String, u64)]) -> Vec<BarChart> {
    let colors = ColorMap::new(series.iter().map(|(label, _)| label.as_str()));
    series
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            BarChart::new(vec![Bar::new(i as f64, *value as f64)
                .name(label)
                .width(0.6)])
            .name(label)
            .color(colors.color_for(label))
        })
        .collect()
}

fn yearly_chart(ui: &mut Ui, yearly: &[(i32, UserTotals)]) {
    let colors = ColorMap::new(["Registered", "Casual"]);
    let grouped = |offset: f64, pick: fn(&UserTotals) -> u64| -> Vec<Bar> {
        yearly
            .iter()
            .enumerate()
            .map(|(i, (year, totals))| {
                Bar::new(i as f64 + offset, pick(totals) as f64)
                    .name(year)
                    .width(0.4)
            })
            .collect()
    };

    let registered = BarChart::new(grouped(-0.2, |t| t.registered))
        .name("Registered")
        .color(colors.color_for("Registered"));
    let casual = BarChart::new(grouped(0.2, |t| t.casual))
        .name("Casual")
        .color(colors.color_for("Casual"));

    show_bars(ui, "yearly_chart", "Riders", vec![registered, casual]);
}

fn seasonal_chart(ui: &mut Ui, seasonal: &[(String, u64)]) {
    show_bars(ui, "seasonal_chart", "Total rentals", category_bars(seasonal));
}

fn day_type_chart(ui: &mut Ui, day_types: &[(DayType, u64)]) {
    let series: Vec<(String, u64)> = day_types
        .iter()
        .map(|(day_type, total)| (day_type.to_string(), *total))
        .collect();
    show_bars(ui, "day_type_chart", "Total rentals", category_bars(&series));
}

fn hourly_chart(ui: &mut Ui, hourly: &[(u8, f64)]) {
    let points: PlotPoints = hourly
        .iter()
        .map(|&(hour, mean)| [f64::from(hour), mean])
        .collect();

    Plot::new("hourly_chart")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Hour of day")
        .y_axis_label("Mean rentals")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name("Mean rentals per hour")
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
        });
}
