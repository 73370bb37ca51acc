use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use serde::Serialize;

use super::model::EarthquakeRecord;

const HEADER: [&str; 7] = [
    "time", "latitude", "longitude", "depth", "magnitude", "place", "province",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    time: String,
    latitude: f64,
    longitude: f64,
    depth: f64,
    magnitude: f64,
    place: &'a str,
    province: &'a str,
}

impl<'a> From<&'a EarthquakeRecord> for ExportRow<'a> {
    fn from(rec: &'a EarthquakeRecord) -> Self {
        ExportRow {
            time: rec.time.to_rfc3339_opts(SecondsFormat::Secs, true),
            latitude: rec.latitude,
            longitude: rec.longitude,
            depth: rec.depth,
            magnitude: rec.magnitude,
            place: &rec.place,
            province: &rec.province,
        }
    }
}

/// Write records as CSV, in the order given. Returns the number of rows.
pub fn write_csv<'a, W: Write>(
    writer: W,
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0usize;
    for rec in records {
        csv_writer
            .serialize(ExportRow::from(rec))
            .with_context(|| format!("writing CSV row {rows}"))?;
        rows += 1;
    }
    if rows == 0 {
        // serde only emits the header alongside the first row
        csv_writer
            .write_record(HEADER)
            .context("writing CSV header")?;
    }
    csv_writer.flush().context("flushing CSV")?;
    Ok(rows)
}

/// Write records to a CSV file, replacing it if present.
pub fn write_csv_file<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a EarthquakeRecord>,
) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(std::io::BufWriter::new(file), records)
}
