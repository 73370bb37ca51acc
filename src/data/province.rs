use super::geo::is_valid_coordinate;
use super::model::{EarthquakeRecord, ReferenceCity, OTHER_PROVINCE};
use super::spatial::{KdTree, NearestNeighbor};

/// Default maximum distance between a quake and its nearest city.
pub const DEFAULT_RADIUS_KM: f64 = 150.0;

// ---------------------------------------------------------------------------
// Province classifier
// ---------------------------------------------------------------------------

/// Assigns a province label to a coordinate.
///
/// `Nearest` is the normal mode. `BoundingBox` is the degraded mode used when
/// no reference cities could be loaded.
#[derive(Debug, Clone)]
pub enum ProvinceClassifier {
    Nearest {
        index: KdTree,
        /// Normalized province name per indexed city.
        provinces: Vec<String>,
        radius_km: f64,
    },
    BoundingBox,
}

impl ProvinceClassifier {
    /// Index the cities of `country`. Returns `None` when none match, so the
    /// caller can decide on a fallback.
    pub fn from_cities(cities: &[ReferenceCity], country: &str, radius_km: f64) -> Option<Self> {
        let kept: Vec<&ReferenceCity> = cities
            .iter()
            .filter(|c| c.country == country)
            .filter(|c| is_valid_coordinate(c.latitude, c.longitude))
            .collect();
        let index = KdTree::build(kept.iter().map(|c| (c.latitude, c.longitude)));
        if index.is_empty() {
            return None;
        }
        log::info!("Indexed {} reference cities for {country}", index.len());

        let provinces = kept.iter().map(|c| normalize_admin_name(&c.admin_name)).collect();
        Some(ProvinceClassifier::Nearest {
            index,
            provinces,
            radius_km,
        })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ProvinceClassifier::BoundingBox)
    }

    /// Province for a coordinate. Total: NaN, out-of-domain and far-away
    /// points all yield [`OTHER_PROVINCE`].
    pub fn classify(&self, lat: f64, lon: f64) -> String {
        if !is_valid_coordinate(lat, lon) {
            return OTHER_PROVINCE.to_string();
        }
        match self {
            ProvinceClassifier::Nearest {
                index,
                provinces,
                radius_km,
            } => match index.nearest(lat, lon) {
                Some(hit) if hit.distance_km < *radius_km => provinces
                    .get(hit.index)
                    .filter(|p| !p.is_empty())
                    .cloned()
                    .unwrap_or_else(|| OTHER_PROVINCE.to_string()),
                _ => OTHER_PROVINCE.to_string(),
            },
            ProvinceClassifier::BoundingBox => bounding_box_region(lat, lon).to_string(),
        }
    }

    /// Tag every record in one pass.
    pub fn classify_all(&self, records: &mut [EarthquakeRecord]) {
        for rec in records.iter_mut() {
            rec.province = self.classify(rec.latitude, rec.longitude);
        }
    }
}

/// Coarse regions by latitude/longitude quadrant.
fn bounding_box_region(lat: f64, lon: f64) -> &'static str {
    if lat < -5.0 && lon < 110.0 {
        "Sumatera/Jawa Barat"
    } else if lat > -1.0 && lon > 120.0 {
        "Sulawesi/Maluku"
    } else {
        OTHER_PROVINCE
    }
}

/// `"Jawa Barat Province"` → `"Jawa Barat"`.
pub fn normalize_admin_name(raw: &str) -> String {
    raw.replace("Province", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
