use eframe::egui;

use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BikeShareApp {
    pub state: AppState,
}

impl BikeShareApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for BikeShareApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            charts::dashboard(ui, &self.state);
        });
    }
}
