use chrono::Utc;
use eframe::egui::{self, Color32, RichText, ScrollArea, TextEdit, Ui};
use egui_extras::{Column, DatePickerButton, TableBuilder};

use crate::data::stats::{format_stat, mean_magnitude_by_province, recent_rows};
use crate::map_view::ViewTrigger;
use crate::state::{AppState, Page};
use crate::ui::plot;

const ACCENT: Color32 = Color32::from_rgb(0xf9, 0x73, 0x16);

/// Render the central panel for the current page.
pub fn show_page(ui: &mut Ui, state: &mut AppState) {
    match state.page {
        Page::Overview => overview(ui, state),
        Page::Analysis => analysis(ui, state),
        Page::Regional => regional(ui, state),
        Page::Resources => resources(ui, state),
        Page::Help => help(ui),
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

fn overview(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading(RichText::new("Earthquake Overview").strong());
        ui.label(RichText::new("Latest seismic activity across Indonesia.").weak());
        ui.add_space(8.0);

        let stats = state.stats.clone();
        ui.columns(4, |cols| {
            stat_card(&mut cols[0], &stats.total.to_string(), "Total Earthquakes");
            stat_card(&mut cols[1], &format_stat(stats.average_magnitude), "Average Magnitude");
            stat_card(&mut cols[2], &format_stat(stats.deepest_km), "Deepest Earthquake (km)");
            stat_card(
                &mut cols[3],
                &format_stat(stats.shallowest_km),
                "Shallowest Earthquake (km)",
            );
        });
        ui.add_space(8.0);

        ui.horizontal(|ui: &mut Ui| {
            ui.strong(format!(
                "Earthquake Distribution (Total: {} | Provinces: {})",
                state.view.len(),
                state.view.resolved.province_summary(&state.context.catalog)
            ));
            if ui.small_button("🔄 Reset View").clicked() {
                state.request_refresh(ViewTrigger::Reset);
            }
        });
        plot::earthquake_map(ui, state, 460.0);
        ui.add_space(8.0);

        ui.strong("Recent Earthquakes");
        recent_table(ui, state);
    });
}

fn stat_card(ui: &mut Ui, value: &str, caption: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(value).heading().strong().color(ACCENT));
        ui.label(RichText::new(caption).small().weak());
    });
}

fn recent_table(ui: &mut Ui, state: &AppState) {
    if state.view.is_empty() {
        ui.label(RichText::new("⚠ No earthquake data available for the selected filters.").weak());
        ui.label(RichText::new("Try adjusting your filters.").small().weak());
        return;
    }
    let rows = recent_rows(
        state.view.records(&state.context.catalog),
        state.context.config.recent_rows,
    );

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::remainder().at_least(160.0))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .header(20.0, |mut header| {
            for title in ["Time", "Place", "Magnitude", "Depth (km)", "Province"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in &rows {
                body.row(18.0, |mut table_row| {
                    for cell in [&row.time, &row.place, &row.magnitude, &row.depth, &row.province] {
                        table_row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

fn analysis(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading(RichText::new("Frequency & Depth Analysis").strong());
        ui.label(
            RichText::new("Magnitude and depth distribution of all recorded earthquakes.").weak(),
        );
        ui.add_space(8.0);

        ui.strong("Magnitude distribution");
        plot::magnitude_histogram_chart(ui, state, 260.0);
        ui.add_space(8.0);

        ui.strong("Magnitude vs depth");
        plot::magnitude_depth_chart(ui, state, 320.0);
    });
}

// ---------------------------------------------------------------------------
// Regional
// ---------------------------------------------------------------------------

fn regional(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading(RichText::new("Regional Summary").strong());
        ui.label(RichText::new("Average magnitude and evacuation coverage per province.").weak());
        ui.add_space(8.0);

        plot::province_mean_chart(ui, state, 280.0);
        ui.add_space(8.0);

        egui::Grid::new("province_means")
            .striped(true)
            .num_columns(5)
            .show(ui, |ui: &mut Ui| {
                ui.strong("#");
                ui.strong("Province");
                ui.strong("Mean magnitude");
                ui.strong("Earthquakes");
                ui.strong("Evacuation posts");
                ui.end_row();
                for (rank, row) in mean_magnitude_by_province(&state.context.catalog.records)
                    .iter()
                    .enumerate()
                {
                    ui.label((rank + 1).to_string());
                    ui.label(&row.province);
                    ui.label(format!("{:.2}", row.mean_magnitude));
                    ui.label(row.count.to_string());
                    ui.label(state.resources.posts_in_province(&row.province).count().to_string());
                    ui.end_row();
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Safety articles and evacuation posts
// ---------------------------------------------------------------------------

fn resources(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading(RichText::new("Safety & Evacuation").strong());
        ui.add_space(8.0);

        ui.columns(2, |cols| {
            articles_column(&mut cols[0], state);
            posts_column(&mut cols[1], state);
        });
    });
}

fn articles_column(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Safety articles");
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.add(TextEdit::singleline(&mut state.article_draft.title).hint_text("Title"));
        ui.add(TextEdit::singleline(&mut state.article_draft.summary).hint_text("Summary"));
        ui.add(
            TextEdit::multiline(&mut state.article_draft.body)
                .hint_text("Body")
                .desired_rows(4),
        );
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Published");
            ui.add(
                DatePickerButton::new(&mut state.article_draft.published).id_salt("article_date"),
            );
        });
        if ui.button("Add article").clicked() {
            state.submit_article(Utc::now().date_naive());
        }
    });

    let mut remove = None;
    for article in state.resources.articles() {
        egui::CollapsingHeader::new(RichText::new(&article.title).strong())
            .id_salt(("article", article.id))
            .show(ui, |ui: &mut Ui| {
                let published = article.published.format("%Y-%m-%d").to_string();
                ui.label(RichText::new(published).small().weak());
                if !article.summary.is_empty() {
                    ui.label(RichText::new(&article.summary).italics());
                }
                ui.label(&article.body);
                if ui.small_button("Remove").clicked() {
                    remove = Some(article.id);
                }
            });
    }
    if let Some(id) = remove {
        state.resources.remove_article(id);
    }
}

fn posts_column(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Evacuation posts");
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        let draft = &mut state.post_draft;
        ui.add(TextEdit::singleline(&mut draft.name).hint_text("Name"));
        ui.add(TextEdit::singleline(&mut draft.address).hint_text("Address"));
        ui.horizontal(|ui: &mut Ui| {
            ui.add(short_field(&mut draft.latitude, "Latitude", 90.0));
            ui.add(short_field(&mut draft.longitude, "Longitude", 90.0));
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.add(short_field(&mut draft.capacity, "Capacity", 90.0));
            ui.add(short_field(&mut draft.contact, "Contact", 120.0));
        });
        if ui.button("Add post").clicked() {
            state.submit_post();
        }
    });

    if state.resources.posts().is_empty() {
        ui.label(RichText::new("No evacuation posts yet.").weak());
        return;
    }

    let mut remove = None;
    egui::Grid::new("evacuation_posts")
        .striped(true)
        .num_columns(5)
        .show(ui, |ui: &mut Ui| {
            for title in ["Name", "Province", "Capacity", "Contact", ""] {
                ui.strong(title);
            }
            ui.end_row();
            for post in state.resources.posts() {
                ui.label(&post.name).on_hover_text(&post.address);
                ui.label(&post.province);
                ui.label(post.capacity.to_string());
                ui.label(&post.contact);
                if ui.small_button("Remove").clicked() {
                    remove = Some(post.id);
                }
                ui.end_row();
            }
        });
    if let Some(id) = remove {
        state.resources.remove_post(id);
    }
}

fn short_field<'t>(text: &'t mut String, hint: &str, width: f32) -> TextEdit<'t> {
    TextEdit::singleline(text).hint_text(hint).desired_width(width)
}

// ---------------------------------------------------------------------------
// Help
// ---------------------------------------------------------------------------

fn help(ui: &mut Ui) {
    ui.heading(RichText::new("Help & Support").strong());
    ui.add_space(8.0);
    ui.label("• Pick provinces, a magnitude range and years in the filter panel.");
    ui.label("• With no province selected, the busiest province is shown.");
    ui.label("• Selected years take priority over the year range.");
    ui.label("• With no years and no range, the last five years are shown.");
    ui.label("• Click a quake on the map to zoom in.");
    ui.label("• Reset View fits the map to the current selection.");
    ui.label("• File → Export filtered CSV… saves exactly what the table and map show.");
    ui.label("• Quakes far from every known city are labelled \"Other\".");
}
