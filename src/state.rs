use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};

use crate::color::ProvinceColors;
use crate::context::AppContext;
use crate::data::export;
use crate::data::filter::{apply, FilterCriteria, FilteredView};
use crate::data::stats::SummaryStats;
use crate::map_view::{MapView, ViewTrigger};
use crate::resources::{ArticleDraft, PostDraft, ResourceBoard};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Analysis,
    Regional,
    Resources,
    Help,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Overview,
        Page::Analysis,
        Page::Regional,
        Page::Resources,
        Page::Help,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Earthquake Overview",
            Page::Analysis => "Frequency & Depth Analysis",
            Page::Regional => "Regional Summary",
            Page::Resources => "Safety & Evacuation",
            Page::Help => "Help & Support",
        }
    }
}

// ---------------------------------------------------------------------------
// Refresh gate
// ---------------------------------------------------------------------------

/// Limits filter refreshes to one per cooldown window.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    cooldown: Duration,
    last_run: Option<Instant>,
}

impl RefreshGate {
    pub fn new(cooldown: Duration) -> Self {
        RefreshGate {
            cooldown,
            last_run: None,
        }
    }

    /// Time left before the next refresh may run.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_run {
            Some(last) => self.cooldown.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_run = Some(now);
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub context: AppContext,

    /// Filter input as edited in the side panel.
    pub criteria: FilterCriteria,
    /// Criteria behind `view`.
    last_applied: Option<FilterCriteria>,
    pub view: FilteredView,
    pub stats: SummaryStats,

    pub map_view: MapView,
    /// Set when the plot should jump to `map_view` on the next frame.
    pub map_view_changed: bool,

    pub province_colors: ProvinceColors,
    pub page: Page,

    pub resources: ResourceBoard,
    pub article_draft: ArticleDraft,
    pub post_draft: PostDraft,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    refresh: RefreshGate,
    pending: Option<ViewTrigger>,
}

impl AppState {
    pub fn new(context: AppContext) -> Self {
        let today = Utc::now().date_naive();
        let refresh = RefreshGate::new(context.config.refresh_cooldown());
        let mut state = AppState {
            criteria: FilterCriteria::default(),
            last_applied: None,
            view: FilteredView::unfiltered(&context.catalog),
            stats: SummaryStats::default(),
            map_view: MapView::default(),
            map_view_changed: true,
            province_colors: ProvinceColors::default(),
            page: Page::Overview,
            resources: ResourceBoard::with_defaults(today),
            article_draft: ArticleDraft::new(today),
            post_draft: PostDraft::default(),
            status_message: None,
            refresh,
            pending: None,
            context,
        };
        state.reset_for_catalog();
        state
    }

    /// Re-derive everything that depends on the catalog.
    fn reset_for_catalog(&mut self) {
        let catalog = &self.context.catalog;
        self.province_colors = ProvinceColors::new(&catalog.provinces);
        self.criteria = FilterCriteria::initial(catalog);
        self.run_refresh(ViewTrigger::FilterChange);
    }

    /// Load another catalog file, keeping the current one on failure.
    pub fn open_catalog(&mut self, path: &Path) {
        match self.context.reload(path) {
            Ok(()) => {
                self.status_message = None;
                self.reset_for_catalog();
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Write the current view to a CSV file.
    pub fn export_view(&mut self, path: &Path) {
        let records = self.view.records(&self.context.catalog);
        match export::write_csv_file(path, records) {
            Ok(rows) => {
                log::info!("Exported {rows} earthquakes to {}", path.display());
                self.status_message = Some(format!("Exported {rows} rows to {}", path.display()));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    // -- Refresh scheduling --

    /// Ask for a refresh. Clicks and resets are not overridden by a later
    /// plain filter change.
    pub fn request_refresh(&mut self, trigger: ViewTrigger) {
        self.pending = match (self.pending, trigger) {
            (Some(existing), ViewTrigger::FilterChange) => Some(existing),
            _ => Some(trigger),
        };
    }

    /// Run a pending refresh if the cooldown allows. Returns how long to
    /// wait before polling again when a refresh is still pending.
    pub fn poll_refresh(&mut self, now: Instant) -> Option<Duration> {
        let trigger = self.pending?;
        let wait = self.refresh.remaining(now);
        if !wait.is_zero() {
            return Some(wait);
        }
        self.pending = None;

        let unchanged = self.last_applied.as_ref() == Some(&self.criteria);
        if unchanged && trigger == ViewTrigger::FilterChange {
            return None;
        }
        self.refresh.mark(now);
        self.run_refresh(trigger);
        None
    }

    fn run_refresh(&mut self, trigger: ViewTrigger) {
        let catalog = &self.context.catalog;
        self.view = apply(catalog, &self.criteria);
        self.stats = SummaryStats::compute(self.view.records(catalog));
        self.map_view = MapView::resolve(self.view.records(catalog), trigger);
        self.map_view_changed = true;
        self.last_applied = Some(self.criteria.clone());
    }

    // -- Filter editing --

    pub fn toggle_province(&mut self, province: &str) {
        if let Some(pos) = self.criteria.provinces.iter().position(|p| p == province) {
            self.criteria.provinces.remove(pos);
        } else {
            self.criteria.provinces.push(province.to_string());
        }
        self.request_refresh(ViewTrigger::FilterChange);
    }

    pub fn toggle_year(&mut self, year: i32) {
        if let Some(pos) = self.criteria.years.iter().position(|&y| y == year) {
            self.criteria.years.remove(pos);
        } else {
            self.criteria.years.push(year);
        }
        self.request_refresh(ViewTrigger::FilterChange);
    }

    pub fn set_magnitude_range(&mut self, min: f64, max: f64) {
        self.criteria.magnitude = Some(vec![min, max]);
        self.request_refresh(ViewTrigger::FilterChange);
    }

    pub fn set_year_range(&mut self, start: Option<i32>, end: Option<i32>) {
        self.criteria.start_year = start;
        self.criteria.end_year = end;
        self.request_refresh(ViewTrigger::FilterChange);
    }

    /// Drop every selection, leaving the defaulting rules in charge.
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.request_refresh(ViewTrigger::FilterChange);
    }

    // -- Resource forms --

    pub fn submit_article(&mut self, today: NaiveDate) {
        match self.resources.add_article(&self.article_draft) {
            Ok(_) => {
                self.article_draft = ArticleDraft::new(today);
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(format!("Article not added: {e}")),
        }
    }

    pub fn submit_post(&mut self) {
        match self
            .resources
            .add_post(&self.post_draft, &self.context.classifier)
        {
            Ok(_) => {
                self.post_draft = PostDraft::default();
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(format!("Post not added: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::filter::{ProvinceSelection, YearFilter};

    fn state() -> AppState {
        let dir = std::env::temp_dir();
        let config = DashboardConfig {
            data_path: dir.join("seismo-state-missing.csv"),
            cities_path: dir.join("seismo-state-missing-cities.csv"),
            ..Default::default()
        };
        AppState::new(AppContext::bootstrap(config))
    }

    #[test]
    fn starts_with_dashboard_defaults() {
        let state = state();
        // Two of the synthetic quakes fall in the south-west box.
        assert_eq!(state.criteria.provinces, vec!["Sumatera/Jawa Barat".to_string()]);
        assert_eq!(state.criteria.years, vec![2025, 2024, 2023]);
        // Jakarta and Bandung, both 2025.
        assert_eq!(state.view.len(), 2);
        assert_eq!(state.stats.total, 2);
        assert!(state.map_view_changed);
    }

    #[test]
    fn refreshes_are_spaced_by_cooldown() {
        let mut state = state();
        let t0 = Instant::now();

        state.toggle_year(2023);
        assert_eq!(state.poll_refresh(t0), None);
        assert_eq!(state.view.resolved.years, YearFilter::Set([2024, 2025].into()));

        state.toggle_year(2024);
        let wait = state.poll_refresh(t0 + Duration::from_millis(100));
        assert_eq!(wait, Some(Duration::from_millis(400)));
        assert_eq!(state.view.resolved.years, YearFilter::Set([2024, 2025].into()));

        assert_eq!(state.poll_refresh(t0 + Duration::from_millis(600)), None);
        assert_eq!(state.view.resolved.years, YearFilter::Set([2025].into()));
    }

    #[test]
    fn unchanged_filter_is_skipped_but_click_is_not() {
        let mut state = state();
        let t0 = Instant::now();
        state.map_view_changed = false;

        state.request_refresh(ViewTrigger::FilterChange);
        state.poll_refresh(t0);
        assert!(!state.map_view_changed);

        state.request_refresh(ViewTrigger::PointClick { lat: -8.4, lon: 115.2 });
        state.request_refresh(ViewTrigger::FilterChange);
        state.poll_refresh(t0 + Duration::from_secs(1));
        assert!(state.map_view_changed);
        assert_eq!(state.map_view.zoom, 8.0);
    }

    #[test]
    fn clearing_filters_uses_defaulting_rules() {
        let mut state = state();
        state.clear_filters();
        state.poll_refresh(Instant::now());
        assert_eq!(
            state.view.resolved.provinces,
            ProvinceSelection::Only(["Sumatera/Jawa Barat".to_string()].into())
        );
        assert_eq!(state.view.resolved.years, YearFilter::Range(2021, 2025));
    }

    #[test]
    fn post_form_reports_errors() {
        let mut state = state();
        state.post_draft.name = "Posko".into();
        state.post_draft.latitude = "x".into();
        state.submit_post();
        assert!(state.status_message.as_deref().unwrap().starts_with("Post not added"));

        state.post_draft.latitude = "-6.9".into();
        state.post_draft.longitude = "107.6".into();
        state.post_draft.capacity = "120".into();
        state.submit_post();
        assert_eq!(state.resources.posts().len(), 1);
        assert_eq!(state.post_draft, PostDraft::default());
    }
}
