use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{EarthquakeRecord, ReferenceCity};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load earthquake records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `time, latitude, longitude, depth, magnitude, place`
/// * `.json`    – `[{ "time": "...", "latitude": ..., ... }, ...]`
/// * `.parquet` – same columns; `time` may be a string or an Arrow timestamp
///
/// `mag` is accepted as an alias for `magnitude`. Extra columns are ignored.
/// Returned records are unclassified.
pub fn load_records(path: &Path) -> Result<Vec<EarthquakeRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load the reference city table, keeping only rows of `country`.
pub fn load_reference_cities(path: &Path, country: &str) -> Result<Vec<ReferenceCity>> {
    let mut reader = csv::Reader::from_path(path).context("opening city CSV")?;
    let mut cities = Vec::new();

    for (row_no, result) in reader.deserialize::<CityRow>().enumerate() {
        let row = result.with_context(|| format!("city CSV row {row_no}"))?;
        if row.country != country {
            continue;
        }
        cities.push(ReferenceCity {
            name: row.city.unwrap_or_default(),
            country: row.country,
            latitude: row.lat,
            longitude: row.lng,
            admin_name: row.admin_name.unwrap_or_default(),
        });
    }

    Ok(cities)
}

/// Fixed demonstration catalog used when no data file is available.
pub fn synthetic_records() -> Vec<EarthquakeRecord> {
    let rows = [
        ("2025-10-15T12:00:00Z", -6.2088, 106.8456, 10.0, 5.5, "8km S of Jakarta"),
        ("2025-10-16T08:30:00Z", -7.7956, 110.3695, 50.5, 4.2, "Yogyakarta Region"),
        ("2024-05-20T10:00:00Z", -8.4095, 115.1889, 12.3, 6.1, "Bali"),
        ("2023-01-01T00:00:00Z", 0.7893, 113.9213, 150.0, 7.0, "Kalimantan Tengah"),
        ("2025-10-14T11:00:00Z", -6.9034, 107.6191, 20.0, 3.5, "Bandung"),
    ];
    rows.iter()
        .filter_map(|&(time, lat, lon, depth, mag, place)| {
            Some(EarthquakeRecord::new(parse_timestamp(time)?, lat, lon, depth, mag, place))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Row schemas shared by CSV and JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuakeRow {
    time: RawTime,
    latitude: Option<f64>,
    longitude: Option<f64>,
    depth: Option<f64>,
    #[serde(alias = "mag")]
    magnitude: Option<f64>,
    #[serde(default)]
    place: Option<String>,
}

/// A time cell: text, or epoch milliseconds as pandas writes by default.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTime {
    Text(String),
    EpochMillis(i64),
}

impl RawTime {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTime::Text(text) => parse_timestamp(text),
            RawTime::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CityRow {
    #[serde(default)]
    city: Option<String>,
    country: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    admin_name: Option<String>,
}

/// Turn parsed rows into records, skipping rows whose time cannot be read.
fn rows_to_records(rows: Vec<QuakeRow>, source: &str) -> Vec<EarthquakeRecord> {
    let mut skipped = 0usize;
    let records: Vec<EarthquakeRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let Some(time) = row.time.to_utc() else {
                skipped += 1;
                return None;
            };
            Some(EarthquakeRecord::new(
                time,
                row.latitude.unwrap_or(f64::NAN),
                row.longitude.unwrap_or(f64::NAN),
                row.depth.unwrap_or(f64::NAN),
                row.magnitude.unwrap_or(f64::NAN),
                row.place.unwrap_or_default(),
            ))
        })
        .collect();

    if skipped > 0 {
        log::warn!("{source}: skipped {skipped} rows with unreadable time");
    }
    records
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<EarthquakeRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let rows = reader
        .deserialize::<QuakeRow>()
        .enumerate()
        .map(|(row_no, r)| r.with_context(|| format!("CSV row {row_no}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(rows_to_records(rows, "CSV"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON as written by `df.to_json(orient='records')`, with
/// `time` either epoch milliseconds or a timestamp string.
fn load_json(path: &Path) -> Result<Vec<EarthquakeRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<QuakeRow> = serde_json::from_str(&text).context("parsing JSON")?;
    Ok(rows_to_records(rows, "JSON"))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); numeric columns may be any width.
fn load_parquet(path: &Path) -> Result<Vec<EarthquakeRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let times = time_column(&batch)?;
        let latitude = f64_column(&batch, &["latitude"])?;
        let longitude = f64_column(&batch, &["longitude"])?;
        let depth = f64_column(&batch, &["depth"])?;
        let magnitude = f64_column(&batch, &["magnitude", "mag"])?;
        let place = string_column(&batch, "place")?;

        for row in 0..batch.num_rows() {
            let Some(time) = times[row] else {
                skipped += 1;
                continue;
            };
            records.push(EarthquakeRecord::new(
                time,
                value_or_nan(&latitude, row),
                value_or_nan(&longitude, row),
                value_or_nan(&depth, row),
                value_or_nan(&magnitude, row),
                place
                    .as_ref()
                    .filter(|p| !p.is_null(row))
                    .map(|p| p.value(row).to_string())
                    .unwrap_or_default(),
            ));
        }
    }

    if skipped > 0 {
        log::warn!("Parquet: skipped {skipped} rows with unreadable time");
    }
    Ok(records)
}

// -- Parquet / Arrow helpers --

fn column_by_name(batch: &RecordBatch, names: &[&str]) -> Option<Arc<dyn Array>> {
    let schema = batch.schema();
    names
        .iter()
        .find_map(|name| schema.index_of(name).ok())
        .map(|idx| batch.column(idx).clone())
}

/// Read a numeric column as `Float64`, whatever its stored width.
fn f64_column(batch: &RecordBatch, names: &[&str]) -> Result<Float64Array> {
    let col = column_by_name(batch, names)
        .with_context(|| format!("Parquet file missing '{}' column", names[0]))?;
    let casted = cast(col.as_ref(), &DataType::Float64)
        .with_context(|| format!("column '{}' is not numeric", names[0]))?;
    casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .context("expected Float64Array after cast")
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>> {
    let Some(col) = column_by_name(batch, &[name]) else {
        return Ok(None);
    };
    let casted = cast(col.as_ref(), &DataType::Utf8)
        .with_context(|| format!("column '{name}' is not text"))?;
    Ok(casted.as_any().downcast_ref::<StringArray>().cloned())
}

/// Accepts Arrow timestamps of any unit or textual timestamps.
fn time_column(batch: &RecordBatch) -> Result<Vec<Option<DateTime<Utc>>>> {
    let col = column_by_name(batch, &["time"]).context("Parquet file missing 'time' column")?;

    match col.data_type() {
        DataType::Timestamp(_, _) => {
            let casted = cast(col.as_ref(), &DataType::Timestamp(TimeUnit::Millisecond, None))
                .context("normalising timestamp column")?;
            let millis = casted
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .context("expected TimestampMillisecondArray")?;
            Ok((0..millis.len())
                .map(|i| {
                    if millis.is_null(i) {
                        None
                    } else {
                        DateTime::from_timestamp_millis(millis.value(i))
                    }
                })
                .collect())
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let casted =
                cast(col.as_ref(), &DataType::Utf8).context("reading time column as text")?;
            let text = casted
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok((0..text.len())
                .map(|i| {
                    if text.is_null(i) {
                        None
                    } else {
                        parse_timestamp(text.value(i))
                    }
                })
                .collect())
        }
        other => bail!("Unsupported type for 'time' column: {other:?}"),
    }
}

fn value_or_nan(arr: &Float64Array, row: usize) -> f64 {
    if arr.is_null(row) {
        f64::NAN
    } else {
        arr.value(row)
    }
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse the timestamp spellings found in exported catalogs.
///
/// Offsets are honoured; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float32Array};
    use chrono::Datelike;
    use parquet::arrow::ArrowWriter;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("seismo-loader-{}-{name}", std::process::id()))
    }

    fn parquet_file(name: &str, columns: Vec<(&str, ArrayRef)>) -> PathBuf {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let path = temp_path(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn timestamp_spellings() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-10-15T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-15T12:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-15 12:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-15 19:00:00+07:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-15 12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-10-15").map(|t| t.day()), Some(15));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn csv_with_missing_cells_and_bad_time() {
        let path = temp_file(
            "quakes.csv",
            "time,latitude,longitude,depth,mag,place,net\n\
             2024-05-20T10:00:00Z,-8.4095,115.1889,12.3,6.1,Bali,us\n\
             not-a-time,-8.4,115.1,10,5.0,Bali,us\n\
             2023-01-01T00:00:00Z,,113.9213,150.0,,Kalimantan,us\n",
        );
        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].place, "Bali");
        assert_eq!(records[0].magnitude, 6.1);
        assert!(records[1].latitude.is_nan());
        assert!(records[1].magnitude.is_nan());
        assert_eq!(records[1].year(), 2023);
    }

    #[test]
    fn json_records() {
        let path = temp_file(
            "quakes.json",
            r#"[{"time": "2025-10-16T08:30:00Z", "latitude": -7.7956, "longitude": 110.3695,
                 "depth": 50.5, "magnitude": 4.2, "place": "Yogyakarta Region"},
                {"time": "2025-10-14 11:00:00", "latitude": -6.9034, "longitude": 107.6191,
                 "depth": null, "magnitude": 3.5}]"#,
        );
        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].depth, 50.5);
        assert!(records[1].depth.is_nan());
        assert_eq!(records[1].place, "");
    }

    #[test]
    fn json_epoch_millis_time() {
        let path = temp_file(
            "pandas.json",
            r#"[{"time": 1760529600000, "latitude": -6.2088, "longitude": 106.8456,
                 "depth": 10.0, "mag": 5.5, "place": "8km S of Jakarta"},
                {"time": "2025-10-14T11:00:00Z", "latitude": -6.9034, "longitude": 107.6191,
                 "depth": 20.0, "mag": 3.5, "place": "Bandung"}]"#,
        );
        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time, Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap());
        assert_eq!(records[0].magnitude, 5.5);
        assert_eq!(records[1].place, "Bandung");
    }

    #[test]
    fn parquet_timestamp_time_with_mag_alias_and_nulls() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap().timestamp_millis();
        let t1 = Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap().timestamp_millis();
        let time = TimestampMillisecondArray::from(vec![t0, t1]).with_timezone("UTC");
        let path = parquet_file(
            "stamped.parquet",
            vec![
                ("time", Arc::new(time) as ArrayRef),
                ("latitude", Arc::new(Float64Array::from(vec![-8.4095, -6.2088])) as ArrayRef),
                (
                    "longitude",
                    Arc::new(Float32Array::from(vec![115.1889f32, 106.8456])) as ArrayRef,
                ),
                ("depth", Arc::new(Float64Array::from(vec![Some(12.3), None])) as ArrayRef),
                ("mag", Arc::new(Float64Array::from(vec![6.1, 5.5])) as ArrayRef),
                ("place", Arc::new(StringArray::from(vec![Some("Bali"), None])) as ArrayRef),
            ],
        );
        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time.timestamp_millis(), t0);
        assert_eq!(records[0].magnitude, 6.1);
        assert!((records[0].longitude - 115.1889).abs() < 1e-4);
        assert_eq!(records[0].place, "Bali");
        assert!(records[1].depth.is_nan());
        assert_eq!(records[1].place, "");
        assert_eq!(records[1].year(), 2025);
    }

    #[test]
    fn parquet_text_time_skips_unreadable_rows() {
        let path = parquet_file(
            "text.parquet",
            vec![
                (
                    "time",
                    Arc::new(StringArray::from(vec![
                        Some("2023-01-01 00:00:00"),
                        Some("garbage"),
                        None,
                    ])) as ArrayRef,
                ),
                ("latitude", Arc::new(Float64Array::from(vec![0.7893, 0.0, 0.0])) as ArrayRef),
                ("longitude", Arc::new(Float64Array::from(vec![113.9213, 0.0, 0.0])) as ArrayRef),
                ("depth", Arc::new(Float64Array::from(vec![150.0, 1.0, 1.0])) as ArrayRef),
                ("magnitude", Arc::new(Float64Array::from(vec![7.0, 1.0, 1.0])) as ArrayRef),
            ],
        );
        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year(), 2023);
        assert_eq!(records[0].magnitude, 7.0);
    }

    #[test]
    fn parquet_missing_depth_is_an_error() {
        let path = parquet_file(
            "nodepth.parquet",
            vec![
                ("time", Arc::new(StringArray::from(vec!["2023-01-01T00:00:00Z"])) as ArrayRef),
                ("latitude", Arc::new(Float64Array::from(vec![0.7893])) as ArrayRef),
                ("longitude", Arc::new(Float64Array::from(vec![113.9213])) as ArrayRef),
                ("mag", Arc::new(Float64Array::from(vec![7.0])) as ArrayRef),
            ],
        );
        let err = load_records(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn csv_missing_required_column_is_an_error() {
        let path = temp_file("broken.csv", "latitude,longitude\n1.0,2.0\n");
        let result = load_records(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_records(Path::new("catalog.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn cities_are_filtered_by_country() {
        let path = temp_file(
            "cities.csv",
            "\"city\",\"lat\",\"lng\",\"country\",\"iso2\",\"admin_name\"\n\
             \"Jakarta\",\"-6.1750\",\"106.8275\",\"Indonesia\",\"ID\",\"Jakarta\"\n\
             \"Manila\",\"14.5958\",\"120.9772\",\"Philippines\",\"PH\",\"Manila\"\n\
             \"Bandung\",\"-6.9122\",\"107.6097\",\"Indonesia\",\"ID\",\"Jawa Barat\"\n",
        );
        let cities = load_reference_cities(&path, "Indonesia").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].name, "Bandung");
        assert_eq!(cities[1].admin_name, "Jawa Barat");
    }

    #[test]
    fn synthetic_set_spans_three_years() {
        let records = synthetic_records();
        assert_eq!(records.len(), 5);
        let years: std::collections::BTreeSet<i32> = records.iter().map(|r| r.year()).collect();
        assert_eq!(years.into_iter().collect::<Vec<_>>(), vec![2023, 2024, 2025]);
    }
}
