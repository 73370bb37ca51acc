use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use crate::data::filter::{ProvinceSelection, YearFilter};
use crate::map_view::ViewTrigger;
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Navigation panel
// ---------------------------------------------------------------------------

/// Render the page list.
pub fn nav_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(4.0);
    ui.heading(RichText::new("🌍 SeismoTrack").strong().color(Color32::from_rgb(0xf9, 0x73, 0x16)));
    ui.separator();

    for page in Page::ALL {
        if ui.selectable_label(state.page == page, page.title()).clicked() {
            state.page = page;
        }
    }
}

// ---------------------------------------------------------------------------
// Filter panel
// ---------------------------------------------------------------------------

/// Render the filter widgets for the overview page.
pub fn filter_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let catalog = &state.context.catalog;
    if catalog.is_empty() {
        ui.label("No earthquakes loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let provinces = catalog.provinces.clone();
    let counts = catalog.province_counts.clone();
    let years: Vec<i32> = catalog.years.iter().rev().copied().collect();
    let (min_mag, max_mag) = catalog.magnitude_bounds.unwrap_or((0.0, 10.0));
    let (min_year, max_year) = catalog.year_bounds().unwrap_or((0, 0));

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Provinces ----
            let header = format!("Province  ({} selected)", state.criteria.provinces.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("province_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.criteria.provinces.clear();
                        state.request_refresh(ViewTrigger::FilterChange);
                    }
                    for province in &provinces {
                        let mut checked = state.criteria.provinces.contains(province);
                        let count = counts.get(province).copied().unwrap_or(0);
                        let text = RichText::new(format!("{province} ({count})"))
                            .color(state.province_colors.color_for(province));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_province(province);
                        }
                    }
                });
            ui.separator();

            // ---- Magnitude ----
            ui.strong("Magnitude range");
            let (mut lo, mut hi) = match state.criteria.magnitude.as_deref() {
                Some(&[a, b]) => (a, b),
                _ => (min_mag, max_mag),
            };
            let mut changed = false;
            ui.horizontal(|ui: &mut Ui| {
                changed |= ui
                    .add(DragValue::new(&mut lo).range(min_mag..=max_mag).speed(0.1).prefix("min "))
                    .changed();
                changed |= ui
                    .add(DragValue::new(&mut hi).range(min_mag..=max_mag).speed(0.1).prefix("max "))
                    .changed();
            });
            if changed {
                state.set_magnitude_range(lo, hi);
            }
            ui.separator();

            // ---- Years ----
            egui::CollapsingHeader::new(RichText::new("Years (multi-select)").strong())
                .id_salt("year_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal_wrapped(|ui: &mut Ui| {
                        for &year in &years {
                            let mut checked = state.criteria.years.contains(&year);
                            if ui.checkbox(&mut checked, year.to_string()).changed() {
                                state.toggle_year(year);
                            }
                        }
                    });
                });

            ui.strong("Or a year range");
            let mut use_range =
                state.criteria.start_year.is_some() && state.criteria.end_year.is_some();
            let mut start = state.criteria.start_year.unwrap_or(min_year);
            let mut end = state.criteria.end_year.unwrap_or(max_year);
            let mut range_changed = ui.checkbox(&mut use_range, "Use range").changed();
            ui.add_enabled_ui(use_range, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    range_changed |= ui
                        .add(DragValue::new(&mut start).range(min_year..=max_year).prefix("from "))
                        .changed();
                    range_changed |= ui
                        .add(DragValue::new(&mut end).range(min_year..=max_year).prefix("to "))
                        .changed();
                });
            });
            if range_changed {
                if use_range {
                    state.set_year_range(Some(start), Some(end));
                } else {
                    state.set_year_range(None, None);
                }
            }
            ui.small("Use the year list OR the range. The list takes priority.");
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.clear_filters();
            }

            ui.add_space(8.0);
            resolved_summary(ui, state);
        });
}

/// Show what the filter actually applied after defaulting.
fn resolved_summary(ui: &mut Ui, state: &AppState) {
    let resolved = &state.view.resolved;
    ui.strong("Applied");
    let provinces = match &resolved.provinces {
        ProvinceSelection::All => "all provinces".to_string(),
        ProvinceSelection::Only(_) => resolved.province_summary(&state.context.catalog),
    };
    ui.label(format!("Provinces: {provinces}"));
    if let Some((lo, hi)) = resolved.magnitude {
        ui.label(format!("Magnitude: {lo:.1} – {hi:.1}"));
    }
    let years = match &resolved.years {
        YearFilter::Any => "any".to_string(),
        YearFilter::Set(set) => set.iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", "),
        YearFilter::Range(start, end) => format!("{start} – {end}"),
    };
    ui.label(format!("Years: {years}"));
    if state.view.degraded {
        ui.label(RichText::new("Filtering failed, showing everything.").color(Color32::RED));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export filtered CSV…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} earthquakes loaded, {} shown  ·  {}",
            state.context.catalog.len(),
            state.view.len(),
            state.context.source
        ));

        if state.context.classifier.is_degraded() {
            ui.separator();
            ui.label(RichText::new("approximate provinces").color(Color32::YELLOW))
                .on_hover_text("Reference cities unavailable; provinces come from coarse regions.");
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open earthquake catalog")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_catalog(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered earthquakes")
        .add_filter("CSV", &["csv"])
        .set_file_name("earthquakes_filtered.csv")
        .save_file();

    if let Some(path) = file {
        state.export_view(&path);
    }
}
