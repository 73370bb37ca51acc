//! Writes a deterministic synthetic Indonesian earthquake catalog as
//! `sample_quakes.parquet` and `sample_quakes.csv`.
//!
//! Usage: `generate_sample [count] [output_dir]`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use parquet::arrow::ArrowWriter;

/// A seismically active area: centre, spread in degrees, depth range in km.
struct SourceZone {
    name: &'static str,
    lat: f64,
    lon: f64,
    spread: f64,
    depth: (f64, f64),
    weight: f64,
}

const fn zone(
    name: &'static str,
    lat: f64,
    lon: f64,
    spread: f64,
    depth: (f64, f64),
    weight: f64,
) -> SourceZone {
    SourceZone { name, lat, lon, spread, depth, weight }
}

const ZONES: &[SourceZone] = &[
    zone("Aceh", 4.2, 95.8, 1.2, (10.0, 60.0), 1.0),
    zone("West Sumatra", -1.0, 99.8, 1.0, (10.0, 80.0), 1.2),
    zone("Sunda Strait", -6.6, 105.2, 0.8, (20.0, 120.0), 0.8),
    zone("West Java", -7.4, 107.4, 0.9, (10.0, 150.0), 1.4),
    zone("Central Java", -8.2, 110.4, 0.9, (30.0, 200.0), 1.0),
    zone("Bali", -8.7, 115.3, 0.7, (10.0, 180.0), 0.9),
    zone("Lombok", -8.4, 116.4, 0.5, (5.0, 40.0), 0.8),
    zone("Banda Sea", -6.5, 129.5, 2.0, (80.0, 600.0), 1.1),
    zone("Central Sulawesi", -1.2, 120.2, 1.0, (5.0, 40.0), 0.9),
    zone("North Maluku", 1.5, 126.8, 1.2, (10.0, 150.0), 1.2),
    zone("Papua", -3.2, 138.5, 1.5, (10.0, 60.0), 0.7),
];

const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Gutenberg-Richter style magnitude: exponential above `floor`.
    fn magnitude(&mut self, floor: f64, b_value: f64) -> f64 {
        let u = self.next_f64().max(1e-15);
        let m = floor - u.log10() / b_value;
        (m.min(8.5) * 10.0).round() / 10.0
    }

    fn pick_zone(&mut self) -> &'static SourceZone {
        let total: f64 = ZONES.iter().map(|z| z.weight).sum();
        let mut target = self.uniform(0.0, total);
        for zone in ZONES {
            if target < zone.weight {
                return zone;
            }
            target -= zone.weight;
        }
        &ZONES[ZONES.len() - 1]
    }
}

struct Quake {
    time: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    depth: f64,
    magnitude: f64,
    place: String,
}

fn generate(count: usize, rng: &mut SimpleRng) -> Result<Vec<Quake>> {
    let start = Utc
        .with_ymd_and_hms(2019, 1, 1, 0, 0, 0)
        .single()
        .context("invalid start date")?
        .timestamp();
    let end = Utc
        .with_ymd_and_hms(2025, 10, 31, 0, 0, 0)
        .single()
        .context("invalid end date")?
        .timestamp();

    let mut quakes: Vec<Quake> = (0..count)
        .filter_map(|_| {
            let zone = rng.pick_zone();
            let secs = rng.uniform(start as f64, end as f64) as i64;
            let latitude = rng.gauss(zone.lat, zone.spread / 2.0);
            let longitude = rng.gauss(zone.lon, zone.spread / 2.0);
            let depth = (rng.uniform(zone.depth.0, zone.depth.1) * 10.0).round() / 10.0;
            let magnitude = rng.magnitude(2.5, 1.0);
            let km = rng.uniform(5.0, 90.0).round();
            let direction = DIRECTIONS[(rng.next_u64() % DIRECTIONS.len() as u64) as usize];
            Some(Quake {
                time: DateTime::from_timestamp(secs, 0)?,
                latitude: (latitude * 1e4).round() / 1e4,
                longitude: (longitude * 1e4).round() / 1e4,
                depth,
                magnitude,
                place: format!("{km:.0} km {direction} of {}", zone.name),
            })
        })
        .collect();

    quakes.sort_by_key(|q| q.time);
    Ok(quakes)
}

fn to_batch(quakes: &[Quake]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("depth", DataType::Float64, false),
        Field::new("mag", DataType::Float64, false),
        Field::new("place", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(TimestampMillisecondArray::from(
                quakes.iter().map(|q| q.time.timestamp_millis()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(quakes.iter().map(|q| q.latitude).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(quakes.iter().map(|q| q.longitude).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(quakes.iter().map(|q| q.depth).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(quakes.iter().map(|q| q.magnitude).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                quakes.iter().map(|q| q.place.as_str()).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("Failed to create RecordBatch")?;
    Ok(batch)
}

fn write_csv(path: &Path, quakes: &[Quake]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["time", "latitude", "longitude", "depth", "mag", "place"])?;
    for q in quakes {
        writer.write_record([
            q.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            q.latitude.to_string(),
            q.longitude.to_string(),
            q.depth.to_string(),
            q.magnitude.to_string(),
            q.place.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let count: usize = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid count '{raw}'"))?,
        None => 2000,
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let mut rng = SimpleRng::new(42);
    let quakes = generate(count, &mut rng)?;
    let batch = to_batch(&quakes)?;

    // Write Parquet
    let parquet_path = out_dir.join("sample_quakes.parquet");
    let file = std::fs::File::create(&parquet_path)
        .with_context(|| format!("creating {}", parquet_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    let csv_path = out_dir.join("sample_quakes.csv");
    write_csv(&csv_path, &quakes)?;

    let preview = batch.slice(0, batch.num_rows().min(5));
    println!("{}", pretty_format_batches(&[preview])?);
    println!(
        "Wrote {} earthquakes to {} and {}",
        quakes.len(),
        parquet_path.display(),
        csv_path.display()
    );
    Ok(())
}
