use crate::data::model::EarthquakeRecord;

/// Geographic centre of Indonesia.
pub const INDONESIA_CENTER: (f64, f64) = (-2.5489, 118.0149);
const DEFAULT_ZOOM: f64 = 3.5;
const CLICK_ZOOM: f64 = 8.0;

/// What caused the map to be re-centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewTrigger {
    FilterChange,
    PointClick { lat: f64, lon: f64 },
    Reset,
}

/// Map centre and web-map style zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            center_lat: INDONESIA_CENTER.0,
            center_lon: INDONESIA_CENTER.1,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapView {
    /// Pick the view for a set of visible records.
    ///
    /// Empty sets show the whole country. A click zooms in on the clicked
    /// point; anything else fits the mean position of the records.
    pub fn resolve<'a>(
        records: impl IntoIterator<Item = &'a EarthquakeRecord>,
        trigger: ViewTrigger,
    ) -> Self {
        let mut count = 0usize;
        let (mut lat_sum, mut lon_sum, mut positioned) = (0.0, 0.0, 0usize);
        for rec in records {
            count += 1;
            if rec.has_position() {
                lat_sum += rec.latitude;
                lon_sum += rec.longitude;
                positioned += 1;
            }
        }
        if count == 0 || positioned == 0 {
            return MapView::default();
        }

        match trigger {
            ViewTrigger::PointClick { lat, lon } if lat.is_finite() && lon.is_finite() => MapView {
                center_lat: lat,
                center_lon: lon,
                zoom: CLICK_ZOOM,
            },
            _ => MapView {
                center_lat: lat_sum / positioned as f64,
                center_lon: lon_sum / positioned as f64,
                zoom: zoom_for_count(count),
            },
        }
    }

    /// Longitude span shown at this zoom level, in degrees.
    pub fn span_degrees(&self) -> f64 {
        360.0 / 2f64.powf(self.zoom)
    }

    /// `(min_lon, min_lat, max_lon, max_lat)` for a viewport of the given
    /// width/height ratio.
    pub fn bounds(&self, aspect: f64) -> (f64, f64, f64, f64) {
        let half_lon = self.span_degrees() / 2.0;
        let half_lat = if aspect.is_finite() && aspect > 0.0 {
            half_lon / aspect
        } else {
            half_lon
        };
        (
            self.center_lon - half_lon,
            self.center_lat - half_lat,
            self.center_lon + half_lon,
            self.center_lat + half_lat,
        )
    }
}

/// Denser selections get a wider view.
fn zoom_for_count(count: usize) -> f64 {
    match count {
        n if n > 500 => 4.0,
        n if n > 100 => 5.0,
        n if n > 20 => 6.0,
        _ => 7.0,
    }
}
