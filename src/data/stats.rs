use std::collections::BTreeMap;

use super::model::EarthquakeRecord;

// ---------------------------------------------------------------------------
// Summary cards
// ---------------------------------------------------------------------------

/// Headline numbers for a set of records. Non-finite values are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub total: usize,
    pub average_magnitude: Option<f64>,
    pub deepest_km: Option<f64>,
    pub shallowest_km: Option<f64>,
}

impl SummaryStats {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a EarthquakeRecord>) -> Self {
        let mut stats = SummaryStats::default();
        let mut mag_sum = 0.0;
        let mut mag_count = 0usize;

        for rec in records {
            stats.total += 1;
            if rec.magnitude.is_finite() {
                mag_sum += rec.magnitude;
                mag_count += 1;
            }
            if rec.depth.is_finite() {
                stats.deepest_km = Some(stats.deepest_km.map_or(rec.depth, |d| d.max(rec.depth)));
                stats.shallowest_km =
                    Some(stats.shallowest_km.map_or(rec.depth, |d| d.min(rec.depth)));
            }
        }
        if mag_count > 0 {
            stats.average_magnitude = Some(mag_sum / mag_count as f64);
        }
        stats
    }
}

/// Two decimals, `"0.00"` when there is nothing to show.
pub fn format_stat(value: Option<f64>) -> String {
    format!("{:.2}", value.unwrap_or(0.0))
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width magnitude histogram over finite magnitudes. The last bin is
/// closed on the right so the maximum is counted.
pub fn magnitude_histogram<'a>(
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
    bins: usize,
) -> Vec<HistogramBin> {
    let values: Vec<f64> = records
        .into_iter()
        .map(|r| r.magnitude)
        .filter(|m| m.is_finite())
        .collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.05,
            end: max + 0.05,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let slot = (((v - min) / width) as usize).min(bins - 1);
        counts[slot] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceSummary {
    pub province: String,
    pub mean_magnitude: f64,
    pub count: usize,
}

/// Mean magnitude per province, highest first. Provinces without a finite
/// magnitude are left out.
pub fn mean_magnitude_by_province<'a>(
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
) -> Vec<ProvinceSummary> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in records {
        if rec.magnitude.is_finite() {
            let entry = acc.entry(rec.province.as_str()).or_default();
            entry.0 += rec.magnitude;
            entry.1 += 1;
        }
    }
    let mut rows: Vec<ProvinceSummary> = acc
        .into_iter()
        .map(|(province, (sum, count))| ProvinceSummary {
            province: province.to_string(),
            mean_magnitude: sum / count as f64,
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.mean_magnitude.total_cmp(&a.mean_magnitude));
    rows
}

/// `(magnitude, depth)` pairs grouped by province, for the scatter chart.
pub fn magnitude_depth_by_province<'a>(
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
) -> BTreeMap<String, Vec<[f64; 2]>> {
    let mut series: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for rec in records {
        if rec.magnitude.is_finite() && rec.depth.is_finite() {
            series
                .entry(rec.province.clone())
                .or_default()
                .push([rec.magnitude, rec.depth]);
        }
    }
    series
}

// ---------------------------------------------------------------------------
// Recent-quakes table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RecentRow {
    pub time: String,
    pub place: String,
    pub magnitude: String,
    pub depth: String,
    pub province: String,
}

/// Display rows for the first `limit` records.
pub fn recent_rows<'a>(
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
    limit: usize,
) -> Vec<RecentRow> {
    records
        .into_iter()
        .take(limit)
        .map(|r| RecentRow {
            time: r.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            place: r.place.clone(),
            magnitude: format!("{:.2}", r.magnitude),
            depth: format!("{:.2}", r.depth),
            province: r.province.clone(),
        })
        .collect()
}
