/*!
Test harness for dashboard flows

Wires a complete `Dashboard` on scripted collaborators and an in-memory
page and map, so scenario tests only script replies and inspect results.
*/

use crate::backend_stub::{MockBackend, MockGeocoder};
use relief_dashboard::dom::ids;
use relief_dashboard::headless::{HeadlessMap, HeadlessPage};
use relief_dashboard::{Dashboard, DashboardConfig, PageBindings};
use std::sync::Arc;

pub type MockDashboard = Dashboard<MockBackend, MockGeocoder, HeadlessMap, Arc<HeadlessPage>>;

pub struct TestHarness {
    pub backend: MockBackend,
    pub geocoder: MockGeocoder,
    pub page: Arc<HeadlessPage>,
    pub map: HeadlessMap,
    config: DashboardConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        env_logger::try_init().ok();

        Self {
            backend: MockBackend::new(),
            geocoder: MockGeocoder::new(),
            page: Arc::new(HeadlessPage::dashboard()),
            map: HeadlessMap::new(),
            config: DashboardConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    /// Page without the map container.
    pub fn without_map(self) -> Self {
        self.page.remove(ids::MAP_CONTAINER);
        self
    }

    /// Builds the dashboard on the harness collaborators. Scripts added to
    /// the backend or geocoder afterwards are still seen.
    pub fn dashboard(&self) -> MockDashboard {
        Dashboard::new(
            &self.config,
            self.backend.clone(),
            self.geocoder.clone(),
            &self.map,
            self.page.clone(),
            PageBindings::default(),
        )
    }

    pub fn shelters_path(&self) -> String {
        self.config.backend.shelters_path.clone()
    }

    pub fn alerts_path(&self) -> String {
        self.config.backend.alerts_path.clone()
    }

    pub fn login_path(&self) -> String {
        self.config.backend.login_path.clone()
    }

    pub fn marker_popups(&self) -> Vec<String> {
        self.map.markers().into_iter().map(|m| m.popup).collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
