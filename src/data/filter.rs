use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{EarthquakeCatalog, EarthquakeRecord};

/// Width of the fallback time window, in years, ending at the newest year.
pub const DEFAULT_YEAR_WINDOW: i32 = 5;

// ---------------------------------------------------------------------------
// Raw user input
// ---------------------------------------------------------------------------

/// Filter input exactly as the user supplied it. Anything may be missing,
/// inverted or out of range; [`build_filter`] sorts that out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Empty means "use the default province".
    pub provinces: Vec<String>,
    /// Expected to hold exactly two bounds; any other arity is ignored.
    pub magnitude: Option<Vec<f64>>,
    /// Explicit years. Takes precedence over `start_year`/`end_year`.
    pub years: Vec<i32>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

impl FilterCriteria {
    /// Selection shown when the dashboard first opens: the busiest province,
    /// the full magnitude range and the five most recent years with data.
    pub fn initial(catalog: &EarthquakeCatalog) -> Self {
        FilterCriteria {
            provinces: catalog.top_province.iter().cloned().collect(),
            magnitude: catalog.magnitude_bounds.map(|(lo, hi)| vec![lo, hi]),
            years: catalog.recent_years(DEFAULT_YEAR_WINDOW as usize),
            start_year: None,
            end_year: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved criteria – the predicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ProvinceSelection {
    All,
    Only(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum YearFilter {
    Any,
    Set(BTreeSet<i32>),
    /// Inclusive on both ends.
    Range(i32, i32),
}

/// Criteria after defaulting, clamping and precedence have been applied.
/// Evaluating it against a record is the filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCriteria {
    pub provinces: ProvinceSelection,
    /// Inclusive `(min, max)`; `None` means unrestricted.
    pub magnitude: Option<(f64, f64)>,
    pub years: YearFilter,
}

impl ResolvedCriteria {
    /// Criteria that let every record through.
    pub fn unrestricted() -> Self {
        ResolvedCriteria {
            provinces: ProvinceSelection::All,
            magnitude: None,
            years: YearFilter::Any,
        }
    }

    pub fn matches(&self, rec: &EarthquakeRecord) -> bool {
        let province_ok = match &self.provinces {
            ProvinceSelection::All => true,
            ProvinceSelection::Only(set) => set.contains(&rec.province),
        };
        // NaN magnitudes fail both comparisons.
        let magnitude_ok = match self.magnitude {
            None => true,
            Some((lo, hi)) => rec.magnitude >= lo && rec.magnitude <= hi,
        };
        let year_ok = match &self.years {
            YearFilter::Any => true,
            YearFilter::Set(years) => years.contains(&rec.year()),
            YearFilter::Range(start, end) => (*start..=*end).contains(&rec.year()),
        };
        province_ok && magnitude_ok && year_ok
    }

    /// Province names this selection covers, for display.
    pub fn province_names(&self, catalog: &EarthquakeCatalog) -> Vec<String> {
        match &self.provinces {
            ProvinceSelection::All => catalog.provinces.clone(),
            ProvinceSelection::Only(set) => set.iter().cloned().collect(),
        }
    }

    /// `"a, b, c +2 more"` style summary of the selected provinces.
    pub fn province_summary(&self, catalog: &EarthquakeCatalog) -> String {
        let names = self.province_names(catalog);
        let mut text = names.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        if names.len() > 3 {
            text.push_str(&format!(" +{} more", names.len() - 3));
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Building and applying
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("catalog holds no records")]
    EmptyCatalog,
    #[error("catalog holds no finite magnitudes")]
    NoMagnitudes,
}

/// Resolve raw criteria against the catalog.
///
/// Malformed input is corrected silently. Errors only come from a catalog
/// that has nothing to resolve against.
pub fn build_filter(
    catalog: &EarthquakeCatalog,
    criteria: &FilterCriteria,
) -> Result<ResolvedCriteria, FilterError> {
    let (min_year, max_year) = catalog.year_bounds().ok_or(FilterError::EmptyCatalog)?;
    let (min_mag, max_mag) = catalog.magnitude_bounds.ok_or(FilterError::NoMagnitudes)?;

    Ok(ResolvedCriteria {
        provinces: resolve_provinces(catalog, &criteria.provinces),
        magnitude: Some(resolve_magnitude(criteria.magnitude.as_deref(), min_mag, max_mag)),
        years: resolve_years(catalog, criteria, min_year, max_year),
    })
}

fn resolve_provinces(catalog: &EarthquakeCatalog, requested: &[String]) -> ProvinceSelection {
    if requested.is_empty() {
        return match &catalog.top_province {
            Some(top) => ProvinceSelection::Only(BTreeSet::from([top.clone()])),
            None => ProvinceSelection::All,
        };
    }
    let known: BTreeSet<String> = requested
        .iter()
        .filter(|p| catalog.province_counts.contains_key(p.as_str()))
        .cloned()
        .collect();
    if known.is_empty() {
        ProvinceSelection::All
    } else {
        ProvinceSelection::Only(known)
    }
}

fn resolve_magnitude(requested: Option<&[f64]>, min_mag: f64, max_mag: f64) -> (f64, f64) {
    match requested {
        Some(&[a, b]) if a.is_finite() && b.is_finite() => {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            (lo.clamp(min_mag, max_mag), hi.clamp(min_mag, max_mag))
        }
        _ => (min_mag, max_mag),
    }
}

fn resolve_years(
    catalog: &EarthquakeCatalog,
    criteria: &FilterCriteria,
    min_year: i32,
    max_year: i32,
) -> YearFilter {
    let default = YearFilter::Range(max_year - (DEFAULT_YEAR_WINDOW - 1), max_year);

    if !criteria.years.is_empty() {
        let present: BTreeSet<i32> = criteria
            .years
            .iter()
            .filter(|y| catalog.years.contains(*y))
            .copied()
            .collect();
        return if present.is_empty() {
            default
        } else {
            YearFilter::Set(present)
        };
    }

    match (criteria.start_year, criteria.end_year) {
        (Some(start), Some(end)) => {
            let start = start.clamp(min_year, max_year);
            let end = end.clamp(min_year, max_year);
            YearFilter::Range(start.min(end), start.max(end))
        }
        _ => default,
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Result of filtering: record indices, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub indices: Vec<usize>,
    pub resolved: ResolvedCriteria,
    /// Set when filtering failed and the view is the unfiltered catalog.
    pub degraded: bool,
}

impl FilteredView {
    /// Every record, newest first, with unrestricted criteria.
    pub fn unfiltered(catalog: &EarthquakeCatalog) -> Self {
        FilteredView {
            indices: sorted_newest_first(catalog, 0..catalog.len()),
            resolved: ResolvedCriteria::unrestricted(),
            degraded: true,
        }
    }

    pub fn records<'a>(
        &'a self,
        catalog: &'a EarthquakeCatalog,
    ) -> impl Iterator<Item = &'a EarthquakeRecord> + 'a {
        self.indices.iter().filter_map(|&i| catalog.records.get(i))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Filter the catalog. Never fails: on error the unfiltered catalog is
/// returned with `degraded` set.
pub fn apply(catalog: &EarthquakeCatalog, criteria: &FilterCriteria) -> FilteredView {
    match build_filter(catalog, criteria) {
        Ok(resolved) => {
            let passing = catalog
                .records
                .iter()
                .enumerate()
                .filter(|(_, rec)| resolved.matches(rec))
                .map(|(i, _)| i);
            FilteredView {
                indices: sorted_newest_first(catalog, passing),
                resolved,
                degraded: false,
            }
        }
        Err(e) => {
            log::warn!("Filtering failed, showing all records: {e}");
            FilteredView::unfiltered(catalog)
        }
    }
}

/// Stable sort, so equal timestamps keep load order.
fn sorted_newest_first(
    catalog: &EarthquakeCatalog,
    indices: impl Iterator<Item = usize>,
) -> Vec<usize> {
    let mut indices: Vec<usize> = indices.collect();
    indices.sort_by(|&a, &b| catalog.records[b].time.cmp(&catalog.records[a].time));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::quake;
    use crate::data::model::OTHER_PROVINCE;

    fn catalog() -> EarthquakeCatalog {
        EarthquakeCatalog::from_records(vec![
            quake(2023, 1, 3.5, "Jawa Barat"),
            quake(2024, 6, 5.0, "Jawa Barat"),
            quake(2025, 3, 7.0, "Bali"),
            quake(2025, 3, 4.4, "Jawa Barat"),
            quake(2025, 8, 6.0, OTHER_PROVINCE),
        ])
    }

    fn all_provinces() -> Vec<String> {
        vec!["Bali".into(), "Jawa Barat".into(), OTHER_PROVINCE.into()]
    }

    #[test]
    fn empty_provinces_default_to_top_province() {
        let resolved = build_filter(&catalog(), &FilterCriteria::default()).unwrap();
        assert_eq!(
            resolved.provinces,
            ProvinceSelection::Only(BTreeSet::from(["Jawa Barat".to_string()]))
        );
    }

    #[test]
    fn empty_provinces_without_top_means_all() {
        let catalog = EarthquakeCatalog::from_records(vec![quake(2025, 1, 5.0, OTHER_PROVINCE)]);
        let resolved = build_filter(&catalog, &FilterCriteria::default()).unwrap();
        assert_eq!(resolved.provinces, ProvinceSelection::All);
    }

    #[test]
    fn unknown_provinces_are_dropped() {
        let criteria = FilterCriteria {
            provinces: vec!["Atlantis".into(), "Bali".into()],
            ..Default::default()
        };
        let resolved = build_filter(&catalog(), &criteria).unwrap();
        assert_eq!(
            resolved.provinces,
            ProvinceSelection::Only(BTreeSet::from(["Bali".to_string()]))
        );

        let criteria = FilterCriteria {
            provinces: vec!["Atlantis".into()],
            ..Default::default()
        };
        assert_eq!(build_filter(&catalog(), &criteria).unwrap().provinces, ProvinceSelection::All);
    }

    #[test]
    fn inverted_magnitude_range_is_swapped() {
        let criteria = FilterCriteria {
            magnitude: Some(vec![6.5, 4.0]),
            ..Default::default()
        };
        assert_eq!(build_filter(&catalog(), &criteria).unwrap().magnitude, Some((4.0, 6.5)));
    }

    #[test]
    fn out_of_range_magnitude_is_clamped_after_swap() {
        let criteria = FilterCriteria {
            magnitude: Some(vec![10.0, 2.0]),
            ..Default::default()
        };
        assert_eq!(build_filter(&catalog(), &criteria).unwrap().magnitude, Some((3.5, 7.0)));
    }

    #[test]
    fn malformed_magnitude_defaults_to_data_range() {
        for magnitude in [
            None,
            Some(vec![]),
            Some(vec![5.0]),
            Some(vec![4.0, 5.0, 6.0]),
            Some(vec![f64::NAN, 5.0]),
        ] {
            let criteria = FilterCriteria {
                magnitude,
                ..Default::default()
            };
            assert_eq!(build_filter(&catalog(), &criteria).unwrap().magnitude, Some((3.5, 7.0)));
        }
    }

    #[test]
    fn year_set_wins_over_range() {
        let criteria = FilterCriteria {
            years: vec![2024],
            start_year: Some(2023),
            end_year: Some(2025),
            ..Default::default()
        };
        let resolved = build_filter(&catalog(), &criteria).unwrap();
        assert_eq!(resolved.years, YearFilter::Set(BTreeSet::from([2024])));
    }

    #[test]
    fn absent_years_fall_back_to_recent_window() {
        let criteria = FilterCriteria {
            years: vec![1990, 2030],
            start_year: Some(2023),
            end_year: Some(2023),
            ..Default::default()
        };
        let resolved = build_filter(&catalog(), &criteria).unwrap();
        assert_eq!(resolved.years, YearFilter::Range(2021, 2025));
    }

    #[test]
    fn year_range_is_clamped_and_swapped() {
        let criteria = FilterCriteria {
            start_year: Some(2030),
            end_year: Some(2024),
            ..Default::default()
        };
        let resolved = build_filter(&catalog(), &criteria).unwrap();
        assert_eq!(resolved.years, YearFilter::Range(2024, 2025));
    }

    #[test]
    fn half_open_range_uses_default_window() {
        let criteria = FilterCriteria {
            start_year: Some(2024),
            ..Default::default()
        };
        let resolved = build_filter(&catalog(), &criteria).unwrap();
        assert_eq!(resolved.years, YearFilter::Range(2021, 2025));
    }

    #[test]
    fn default_window_admits_only_present_years() {
        let catalog = catalog();
        let criteria = FilterCriteria {
            provinces: all_provinces(),
            ..Default::default()
        };
        let view = apply(&catalog, &criteria);
        let years: BTreeSet<i32> = view.records(&catalog).map(|r| r.year()).collect();
        assert_eq!(years, BTreeSet::from([2023, 2024, 2025]));
        assert_eq!(view.len(), 5);
    }

    #[test]
    fn apply_combines_predicates_newest_first() {
        let catalog = catalog();
        let criteria = FilterCriteria {
            provinces: vec!["Jawa Barat".into()],
            magnitude: Some(vec![4.0, 7.0]),
            years: vec![2024, 2025],
            ..Default::default()
        };
        let view = apply(&catalog, &criteria);
        assert!(!view.degraded);
        assert_eq!(view.indices, vec![3, 1]);
    }

    #[test]
    fn equal_timestamps_keep_load_order_and_output_is_stable() {
        let catalog = catalog();
        let criteria = FilterCriteria {
            provinces: vec!["Bali".into(), "Jawa Barat".into()],
            years: vec![2025],
            ..Default::default()
        };
        let first = apply(&catalog, &criteria);
        let second = apply(&catalog, &criteria);
        assert_eq!(first.indices, vec![2, 3]);
        assert_eq!(first, second);
    }

    #[test]
    fn nan_magnitudes_never_match() {
        let catalog = EarthquakeCatalog::from_records(vec![
            quake(2025, 1, f64::NAN, "Bali"),
            quake(2025, 2, 5.0, "Bali"),
        ]);
        let view = apply(&catalog, &FilterCriteria::default());
        assert_eq!(view.indices, vec![1]);
    }

    #[test]
    fn failures_degrade_to_unfiltered_view() {
        let empty = EarthquakeCatalog::default();
        assert_eq!(
            build_filter(&empty, &FilterCriteria::default()),
            Err(FilterError::EmptyCatalog)
        );
        let view = apply(&empty, &FilterCriteria::default());
        assert!(view.degraded && view.is_empty());

        let no_mags = EarthquakeCatalog::from_records(vec![
            quake(2024, 1, f64::NAN, "Bali"),
            quake(2025, 1, f64::NAN, OTHER_PROVINCE),
        ]);
        let view = apply(&no_mags, &FilterCriteria::default());
        assert!(view.degraded);
        assert_eq!(view.resolved.provinces, ProvinceSelection::All);
        assert_eq!(view.indices, vec![1, 0]);
    }

    #[test]
    fn initial_criteria_mirror_dashboard_defaults() {
        let criteria = FilterCriteria::initial(&catalog());
        assert_eq!(criteria.provinces, vec!["Jawa Barat".to_string()]);
        assert_eq!(criteria.magnitude, Some(vec![3.5, 7.0]));
        assert_eq!(criteria.years, vec![2025, 2024, 2023]);
    }

    #[test]
    fn province_summary_truncates() {
        let catalog = catalog();
        let resolved = ResolvedCriteria::unrestricted();
        assert_eq!(resolved.province_summary(&catalog), "Bali, Jawa Barat, Other");

        let many = ResolvedCriteria {
            provinces: ProvinceSelection::Only(
                ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect(),
            ),
            ..ResolvedCriteria::unrestricted()
        };
        assert_eq!(many.province_summary(&catalog), "A, B, C +2 more");
    }
}
