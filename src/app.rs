use std::time::Instant;

use eframe::egui;

use crate::context::AppContext;
use crate::state::{AppState, Page};
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SeismoTrackApp {
    pub state: AppState,
}

impl SeismoTrackApp {
    pub fn new(context: AppContext) -> Self {
        Self {
            state: AppState::new(context),
        }
    }
}

impl eframe::App for SeismoTrackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Deferred filter refreshes wake the UI once the cooldown has passed.
        if let Some(wait) = self.state.poll_refresh(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: pages ----
        egui::SidePanel::left("nav_panel")
            .default_width(180.0)
            .resizable(false)
            .show(ctx, |ui| {
                panels::nav_panel(ui, &mut self.state);
            });

        // ---- Filters, overview only ----
        if self.state.page == Page::Overview {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::filter_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: current page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            pages::show_page(ui, &mut self.state);
        });
    }
}
