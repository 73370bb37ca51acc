use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::DashboardConfig;
use crate::data::loader;
use crate::data::model::{EarthquakeCatalog, EarthquakeRecord};
use crate::data::province::ProvinceClassifier;

/// Where the current catalog came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    /// Built-in demonstration records.
    Synthetic,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Synthetic => write!(f, "built-in sample data"),
        }
    }
}

// ---------------------------------------------------------------------------
// Application context: everything read-only after startup
// ---------------------------------------------------------------------------

/// Configuration, classifier and the classified catalog.
pub struct AppContext {
    pub config: DashboardConfig,
    pub classifier: ProvinceClassifier,
    pub catalog: EarthquakeCatalog,
    pub source: DataSource,
}

impl AppContext {
    /// Build the context. Never fails: missing inputs degrade to the
    /// bounding-box classifier and the synthetic catalog.
    pub fn bootstrap(config: DashboardConfig) -> Self {
        let classifier = load_classifier(&config);

        let (records, source) = match loader::load_records(&config.data_path) {
            Ok(records) => {
                log::info!(
                    "Loaded {} earthquakes from {}",
                    records.len(),
                    config.data_path.display()
                );
                (records, DataSource::File(config.data_path.clone()))
            }
            Err(e) => {
                if config.data_path.exists() {
                    log::error!("Failed to load {}: {e:#}", config.data_path.display());
                } else {
                    log::warn!("{} not found, using sample data", config.data_path.display());
                }
                (loader::synthetic_records(), DataSource::Synthetic)
            }
        };

        let catalog = classify(&classifier, records);
        AppContext {
            config,
            classifier,
            catalog,
            source,
        }
    }

    /// Replace the catalog with the contents of another file.
    /// On error the current catalog is kept.
    pub fn reload(&mut self, path: &Path) -> Result<()> {
        let records = loader::load_records(path)?;
        log::info!("Loaded {} earthquakes from {}", records.len(), path.display());
        self.catalog = classify(&self.classifier, records);
        self.source = DataSource::File(path.to_path_buf());
        Ok(())
    }
}

fn load_classifier(config: &DashboardConfig) -> ProvinceClassifier {
    let cities = match loader::load_reference_cities(&config.cities_path, &config.country) {
        Ok(cities) => cities,
        Err(e) => {
            log::warn!(
                "Reference cities unavailable ({e:#}), using bounding-box province detection"
            );
            return ProvinceClassifier::BoundingBox;
        }
    };
    match ProvinceClassifier::from_cities(&cities, &config.country, config.province_radius_km) {
        Some(classifier) => classifier,
        None => {
            log::warn!(
                "No usable {} cities in {}, using bounding-box province detection",
                config.country,
                config.cities_path.display()
            );
            ProvinceClassifier::BoundingBox
        }
    }
}

/// Tag every record and index the result.
fn classify(
    classifier: &ProvinceClassifier,
    mut records: Vec<EarthquakeRecord>,
) -> EarthquakeCatalog {
    classifier.classify_all(&mut records);
    EarthquakeCatalog::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::OTHER_PROVINCE;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("seismo-context-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_inputs_degrade_gracefully() {
        let config = DashboardConfig {
            data_path: temp_path("missing.csv"),
            cities_path: temp_path("missing-cities.csv"),
            ..Default::default()
        };
        let ctx = AppContext::bootstrap(config);

        assert!(ctx.classifier.is_degraded());
        assert_eq!(ctx.source, DataSource::Synthetic);
        assert_eq!(ctx.catalog.len(), 5);
        // Jakarta falls in the south-west box.
        assert_eq!(ctx.catalog.records[0].province, "Sumatera/Jawa Barat");
        assert_eq!(ctx.catalog.records[3].province, OTHER_PROVINCE);
    }

    #[test]
    fn cities_and_data_from_files() {
        let cities = temp_path("cities.csv");
        std::fs::write(
            &cities,
            "city,lat,lng,country,admin_name\n\
             Denpasar,-8.65,115.2167,Indonesia,Bali Province\n\
             Jakarta,-6.175,106.8275,Indonesia,Jakarta\n",
        )
        .unwrap();
        let data = temp_path("quakes.csv");
        std::fs::write(
            &data,
            "time,latitude,longitude,depth,magnitude,place\n\
             2024-05-20T10:00:00Z,-8.4095,115.1889,12.3,6.1,Bali\n\
             2024-05-21T10:00:00Z,-3.0,130.0,10.0,5.0,Banda Sea\n",
        )
        .unwrap();

        let config = DashboardConfig {
            data_path: data.clone(),
            cities_path: cities.clone(),
            ..Default::default()
        };
        let mut ctx = AppContext::bootstrap(config);
        assert!(!ctx.classifier.is_degraded());
        assert_eq!(ctx.source, DataSource::File(data.clone()));
        assert_eq!(ctx.catalog.records[0].province, "Bali");
        assert_eq!(ctx.catalog.records[1].province, OTHER_PROVINCE);
        assert_eq!(ctx.catalog.top_province.as_deref(), Some("Bali"));

        // A failed reload keeps what was there.
        assert!(ctx.reload(&temp_path("nope.csv")).is_err());
        assert_eq!(ctx.catalog.len(), 2);

        std::fs::remove_file(&cities).ok();
        std::fs::remove_file(&data).ok();
    }
}
