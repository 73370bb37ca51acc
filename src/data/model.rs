use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};

/// Province label for records too far from every reference city.
pub const OTHER_PROVINCE: &str = "Other";

// ---------------------------------------------------------------------------
// EarthquakeRecord – one row of the source catalog
// ---------------------------------------------------------------------------

/// A single earthquake event.
///
/// Numeric fields use `NaN` for missing cells so the row survives loading;
/// such rows never satisfy a magnitude filter and are skipped by statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeRecord {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Hypocentre depth in km.
    pub depth: f64,
    pub magnitude: f64,
    pub place: String,
    /// Derived at catalog build time, never read from the source.
    pub province: String,
}

impl EarthquakeRecord {
    /// Build an unclassified record; `province` starts as [`OTHER_PROVINCE`].
    pub fn new(
        time: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        depth: f64,
        magnitude: f64,
        place: impl Into<String>,
    ) -> Self {
        Self {
            time,
            latitude,
            longitude,
            depth,
            magnitude,
            place: place.into(),
            province: OTHER_PROVINCE.to_string(),
        }
    }

    pub fn year(&self) -> i32 {
        self.time.year()
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

// ---------------------------------------------------------------------------
// ReferenceCity – one row of the world-cities table
// ---------------------------------------------------------------------------

/// A known city used as an anchor for province tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCity {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Raw administrative area name, e.g. `"Jawa Barat Province"`.
    pub admin_name: String,
}

// ---------------------------------------------------------------------------
// EarthquakeCatalog – the complete classified dataset
// ---------------------------------------------------------------------------

/// All classified records plus indices computed once at build time.
#[derive(Debug, Clone, Default)]
pub struct EarthquakeCatalog {
    /// Records in load order. Views refer to them by index.
    pub records: Vec<EarthquakeRecord>,
    /// Sorted distinct province labels, including [`OTHER_PROVINCE`] if present.
    pub provinces: Vec<String>,
    pub province_counts: BTreeMap<String, usize>,
    /// Most frequent province other than [`OTHER_PROVINCE`].
    /// Ties go to the province that appears first in load order.
    pub top_province: Option<String>,
    /// `(min, max)` over finite magnitudes.
    pub magnitude_bounds: Option<(f64, f64)>,
    pub years: BTreeSet<i32>,
}

impl EarthquakeCatalog {
    /// Build indices from records whose `province` is already assigned.
    pub fn from_records(records: Vec<EarthquakeRecord>) -> Self {
        let mut province_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut years = BTreeSet::new();
        let mut magnitude_bounds: Option<(f64, f64)> = None;

        for (i, rec) in records.iter().enumerate() {
            *province_counts.entry(rec.province.clone()).or_default() += 1;
            first_seen.entry(rec.province.as_str()).or_insert(i);
            years.insert(rec.year());

            if rec.magnitude.is_finite() {
                magnitude_bounds = Some(match magnitude_bounds {
                    None => (rec.magnitude, rec.magnitude),
                    Some((lo, hi)) => (lo.min(rec.magnitude), hi.max(rec.magnitude)),
                });
            }
        }

        let top_province = province_counts
            .iter()
            .filter(|(name, _)| name.as_str() != OTHER_PROVINCE)
            .max_by(|(a, ca), (b, cb)| {
                // Higher count wins; on a tie the earlier-seen province wins.
                ca.cmp(cb).then_with(|| first_seen[b.as_str()].cmp(&first_seen[a.as_str()]))
            })
            .map(|(name, _)| name.clone());

        let provinces = province_counts.keys().cloned().collect();

        EarthquakeCatalog {
            records,
            provinces,
            province_counts,
            top_province,
            magnitude_bounds,
            years,
        }
    }

    /// `(min_year, max_year)` observed in the data.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }

    /// The `n` most recent years present in the data, newest first.
    pub fn recent_years(&self, n: usize) -> Vec<i32> {
        self.years.iter().rev().take(n).copied().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn quake(year: i32, month: u32, magnitude: f64, province: &str) -> EarthquakeRecord {
        let time = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
        let mut rec = EarthquakeRecord::new(time, -6.0, 106.0, 10.0, magnitude, "test");
        rec.province = province.to_string();
        rec
    }

    #[test]
    fn top_province_ignores_other() {
        let catalog = EarthquakeCatalog::from_records(vec![
            quake(2024, 1, 5.0, OTHER_PROVINCE),
            quake(2024, 2, 5.0, OTHER_PROVINCE),
            quake(2024, 3, 5.0, OTHER_PROVINCE),
            quake(2024, 4, 5.0, "Bali"),
        ]);
        assert_eq!(catalog.top_province.as_deref(), Some("Bali"));
        assert_eq!(catalog.provinces, vec!["Bali".to_string(), "Other".to_string()]);
    }

    #[test]
    fn top_province_tie_goes_to_first_seen() {
        let catalog = EarthquakeCatalog::from_records(vec![
            quake(2024, 1, 5.0, "Maluku"),
            quake(2024, 2, 5.0, "Aceh"),
            quake(2024, 3, 5.0, "Aceh"),
            quake(2024, 4, 5.0, "Maluku"),
        ]);
        assert_eq!(catalog.top_province.as_deref(), Some("Maluku"));
    }

    #[test]
    fn no_top_province_when_everything_is_other() {
        let catalog = EarthquakeCatalog::from_records(vec![quake(2024, 1, 5.0, OTHER_PROVINCE)]);
        assert!(catalog.top_province.is_none());
    }

    #[test]
    fn magnitude_bounds_skip_nan() {
        let catalog = EarthquakeCatalog::from_records(vec![
            quake(2023, 1, f64::NAN, "Bali"),
            quake(2024, 1, 3.5, "Bali"),
            quake(2025, 1, 7.0, "Bali"),
        ]);
        assert_eq!(catalog.magnitude_bounds, Some((3.5, 7.0)));
        assert_eq!(catalog.year_bounds(), Some((2023, 2025)));
        assert_eq!(catalog.recent_years(2), vec![2025, 2024]);
    }
}
