use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotBounds, PlotPoints, Points};

use crate::color::magnitude_color;
use crate::data::geo::haversine_km;
use crate::data::model::EarthquakeRecord;
use crate::data::stats::{
    magnitude_depth_by_province, magnitude_histogram, mean_magnitude_by_province,
};
use crate::map_view::ViewTrigger;
use crate::state::AppState;

/// Hover/click snapping distance, as a fraction of the visible longitude span.
const PICK_FRACTION: f64 = 0.03;

/// Distinct marker styles on the map; one plot item each.
const MARKER_BUCKETS: usize = 12;

// ---------------------------------------------------------------------------
// Earthquake map (overview page)
// ---------------------------------------------------------------------------

/// Scatter of the visible quakes on lon/lat axes, coloured and sized by
/// magnitude. Clicking a quake re-centres on it.
pub fn earthquake_map(ui: &mut Ui, state: &mut AppState, height: f32) {
    let catalog = &state.context.catalog;
    let (lo, hi) = catalog.magnitude_bounds.unwrap_or((0.0, 10.0));

    let bounds = state.map_view_changed.then(|| {
        let aspect = (ui.available_width() / height.max(1.0)) as f64;
        let (min_lon, min_lat, max_lon, max_lat) = state.map_view.bounds(aspect);
        PlotBounds::from_min_max([min_lon, min_lat], [max_lon, max_lat])
    });
    let pick_radius_deg = state.map_view.span_degrees() * PICK_FRACTION;

    let response = Plot::new("earthquake_map")
        .height(height)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .allow_double_click_reset(false)
        .show(ui, |plot_ui| {
            if let Some(bounds) = bounds {
                plot_ui.set_plot_bounds(bounds);
            }
            for bucket in marker_buckets(state.view.records(catalog), lo, hi) {
                let points = Points::new(PlotPoints::from(bucket.positions))
                    .color(magnitude_color(bucket.magnitude, lo, hi))
                    .radius(marker_radius(bucket.magnitude))
                    .filled(true);
                plot_ui.points(points);
            }
            plot_ui.pointer_coordinate()
        });

    let hovered = response
        .inner
        .and_then(|p| nearest_visible(state, p.y, p.x, pick_radius_deg))
        .cloned();

    match &hovered {
        Some(rec) => {
            ui.label(format!(
                "{}  ·  M {:.2}  ·  depth {:.2} km  ·  {}  ·  {}  ·  ({:.4}, {:.4})",
                rec.place,
                rec.magnitude,
                rec.depth,
                rec.time.format("%Y-%m-%d %H:%M:%S"),
                rec.province,
                rec.latitude,
                rec.longitude
            ));
        }
        None => {
            ui.label("Hover a quake for details, click to zoom in.");
        }
    }

    state.map_view_changed = false;
    if response.response.clicked() {
        if let Some(rec) = hovered {
            state.request_refresh(ViewTrigger::PointClick {
                lat: rec.latitude,
                lon: rec.longitude,
            });
        }
    }
}

/// Quakes sharing one marker colour and size.
struct MarkerBucket {
    magnitude: f64,
    positions: Vec<[f64; 2]>,
}

/// Group positioned quakes into equal-width magnitude bands over `[lo, hi]`.
/// Quakes without a magnitude go to the lowest band.
fn marker_buckets<'a>(
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
    lo: f64,
    hi: f64,
) -> Vec<MarkerBucket> {
    let span = hi - lo;
    let width = if span > 0.0 { span / MARKER_BUCKETS as f64 } else { 1.0 };
    let mut buckets: Vec<MarkerBucket> = (0..MARKER_BUCKETS)
        .map(|i| MarkerBucket {
            magnitude: lo + width * (i as f64 + 0.5),
            positions: Vec::new(),
        })
        .collect();

    for rec in records.into_iter().filter(|r| r.has_position()) {
        let slot = if rec.magnitude.is_finite() {
            (((rec.magnitude - lo) / width).floor().max(0.0) as usize).min(MARKER_BUCKETS - 1)
        } else {
            0
        };
        buckets[slot].positions.push([rec.longitude, rec.latitude]);
    }
    buckets.retain(|b| !b.positions.is_empty());
    buckets
}

fn marker_radius(magnitude: f64) -> f32 {
    if magnitude.is_finite() {
        (1.5 + magnitude.max(0.0) * 0.8) as f32
    } else {
        2.0
    }
}

/// Closest visible quake to a plot position, within `radius_deg`.
fn nearest_visible(
    state: &AppState,
    lat: f64,
    lon: f64,
    radius_deg: f64,
) -> Option<&EarthquakeRecord> {
    state
        .view
        .records(&state.context.catalog)
        .filter(|r| r.has_position())
        .filter(|r| {
            (r.latitude - lat).abs() <= radius_deg && (r.longitude - lon).abs() <= radius_deg
        })
        .min_by(|a, b| {
            haversine_km(lat, lon, a.latitude, a.longitude)
                .total_cmp(&haversine_km(lat, lon, b.latitude, b.longitude))
        })
}

// ---------------------------------------------------------------------------
// Analysis charts
// ---------------------------------------------------------------------------

/// Magnitude distribution over the whole catalog.
pub fn magnitude_histogram_chart(ui: &mut Ui, state: &AppState, height: f32) {
    let bins = magnitude_histogram(
        &state.context.catalog.records,
        state.context.config.histogram_bins,
    );
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{:.2} – {:.2}", b.start, b.end))
        })
        .collect();

    Plot::new("magnitude_histogram")
        .height(height)
        .x_axis_label("Magnitude")
        .y_axis_label("Count")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .color(Color32::from_rgb(0xf9, 0x73, 0x16))
                    .name("Earthquakes"),
            );
        });
}

/// Magnitude against depth, one series per province.
pub fn magnitude_depth_chart(ui: &mut Ui, state: &AppState, height: f32) {
    let series = magnitude_depth_by_province(&state.context.catalog.records);

    Plot::new("magnitude_depth")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Magnitude")
        .y_axis_label("Depth (km)")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (province, points) in series {
                let color = state.province_colors.color_for(&province);
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(province)
                        .color(color)
                        .radius(2.5)
                        .filled(true),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Regional chart
// ---------------------------------------------------------------------------

/// Mean magnitude per province, highest first.
pub fn province_mean_chart(ui: &mut Ui, state: &AppState, height: f32) {
    let rows = mean_magnitude_by_province(&state.context.catalog.records);
    let (lo, hi) = rows
        .iter()
        .map(|r| r.mean_magnitude)
        .fold(None, |acc: Option<(f64, f64)>, m| {
            Some(acc.map_or((m, m), |(a, b)| (a.min(m), b.max(m))))
        })
        .unwrap_or((0.0, 1.0));

    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Bar::new(i as f64, row.mean_magnitude)
                .width(0.7)
                .name(&row.province)
                .fill(magnitude_color(row.mean_magnitude, lo, hi))
        })
        .collect();

    Plot::new("province_mean_magnitude")
        .height(height)
        .x_axis_label("Province (rank)")
        .y_axis_label("Mean magnitude")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Mean magnitude"));
        });
}
