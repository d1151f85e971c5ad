/**
 * PANELS - Which of alerts / shelters / resource tracking is on screen
 *
 * ROLE:
 * Entry point for the user's panel clicks. Shows the chosen panel, hides
 * its siblings, scrolls it into view and runs its loader.
 *
 * HOW IT WORKS:
 * - every activation takes a focus ticket before loading
 * - a response is written to its section only if its ticket is still the
 *   latest focus change; slower, superseded loads are dropped
 * - a successful shelter load also refreshes the map markers (the map has
 *   its own ticket, so the newest shelter data wins there too)
 * - failures never escape: they are logged and replaced by a literal message
 */

use crate::config::FailurePolicy;
use crate::dom::{ids, ElementId, ScrollBehavior, View};
use crate::error::FetchError;
use crate::fetcher::{Backend, DataFetcher, Endpoint};
use crate::map::{MapSurface, SharedMap};
use crate::models::{Alert, Shelter};
use crate::render;
use crate::state::{RequestSequence, Ticket};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Alerts,
    Shelters,
    Resource,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Alerts, Panel::Shelters, Panel::Resource];

    pub fn name(&self) -> &'static str {
        match self {
            Panel::Alerts => "alerts",
            Panel::Shelters => "shelters",
            Panel::Resource => "resource-tracking",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelBindings {
    pub alerts_trigger: Option<ElementId>,
    pub shelters_trigger: Option<ElementId>,
    pub alerts_section: ElementId,
    pub shelters_section: ElementId,
    pub resource_section: ElementId,
}

impl Default for PanelBindings {
    fn default() -> Self {
        Self {
            alerts_trigger: Some(ids::ALERT_BUTTON.into()),
            shelters_trigger: Some(ids::SHELTER_BUTTON.into()),
            alerts_section: ids::ALERTS_SECTION.into(),
            shelters_section: ids::SHELTER_SECTION.into(),
            resource_section: ids::RESOURCE_SECTION.into(),
        }
    }
}

impl PanelBindings {
    pub fn section(&self, panel: Panel) -> &ElementId {
        match panel {
            Panel::Alerts => &self.alerts_section,
            Panel::Shelters => &self.shelters_section,
            Panel::Resource => &self.resource_section,
        }
    }

    /// Buttons that activate a panel when clicked.
    pub fn triggers(&self) -> Vec<(ElementId, Panel)> {
        let mut out = Vec::new();
        if let Some(t) = &self.alerts_trigger {
            out.push((t.clone(), Panel::Alerts));
        }
        if let Some(t) = &self.shelters_trigger {
            out.push((t.clone(), Panel::Shelters));
        }
        out
    }
}

/// How one activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOutcome {
    /// Records rendered into the section.
    Rendered(usize),
    /// Empty list, "no data" message rendered.
    Empty,
    /// Backend answered `success: false`.
    Unavailable,
    /// Network or parse failure, error message rendered.
    Failed,
    /// Another activation happened while this one was loading.
    Stale,
    /// Panel without a loader.
    Shown,
}

struct FailureText {
    error: &'static str,
    unavailable: &'static str,
}

pub struct PanelController<B, S, V> {
    view: V,
    bindings: PanelBindings,
    fetcher: Arc<DataFetcher<B>>,
    map: SharedMap<S>,
    policy: FailurePolicy,
    focus: RequestSequence,
    active: Mutex<Panel>,
}

impl<B, S, V> PanelController<B, S, V>
where
    B: Backend,
    S: MapSurface,
    V: View,
{
    /// Starts on the resource-tracking panel; nothing is loaded yet.
    pub fn new(
        view: V,
        bindings: PanelBindings,
        fetcher: Arc<DataFetcher<B>>,
        map: SharedMap<S>,
        policy: FailurePolicy,
    ) -> Self {
        let ctrl = Self {
            view,
            bindings,
            fetcher,
            map,
            policy,
            focus: RequestSequence::new(),
            active: Mutex::new(Panel::Resource),
        };
        ctrl.show(Panel::Resource);
        ctrl
    }

    pub fn active(&self) -> Panel {
        *self.active.lock()
    }

    fn show(&self, panel: Panel) {
        for p in Panel::ALL {
            self.view.set_visible(self.bindings.section(p), p == panel);
        }
    }

    /// Shows `panel`, hides the others and runs its loader. Re-activating the
    /// current panel loads again.
    pub async fn activate(&self, panel: Panel) -> PanelOutcome {
        let ticket = self.focus.issue();
        *self.active.lock() = panel;
        self.show(panel);
        self.view.scroll_into_view(self.bindings.section(panel), ScrollBehavior::Smooth);
        info!("panel {} activated (#{})", panel.name(), ticket.value());

        match panel {
            Panel::Alerts => self.load_alerts(ticket).await,
            Panel::Shelters => self.load_shelters(ticket).await,
            Panel::Resource => PanelOutcome::Shown,
        }
    }

    async fn load_alerts(&self, ticket: Ticket) -> PanelOutcome {
        let result = self.fetcher.load::<Alert>(Endpoint::Alerts).await;
        if !self.focus.is_current(ticket) {
            debug!("dropping stale alerts response #{}", ticket.value());
            return PanelOutcome::Stale;
        }

        let section = &self.bindings.alerts_section;
        match result {
            Ok(alerts) if alerts.is_empty() => {
                self.view.set_html(section, &render::message(render::NO_ALERTS));
                PanelOutcome::Empty
            }
            Ok(alerts) => {
                self.view.set_html(section, &render::render_alerts(&alerts));
                PanelOutcome::Rendered(alerts.len())
            }
            Err(e) => self.render_failure(
                section,
                e,
                FailureText { error: render::ALERTS_ERROR, unavailable: render::ALERTS_UNAVAILABLE },
            ),
        }
    }

    async fn load_shelters(&self, ticket: Ticket) -> PanelOutcome {
        let map_ticket = self.map.begin_sync();
        let result = self.fetcher.load::<Shelter>(Endpoint::Shelters).await;

        if let Ok(shelters) = &result {
            self.map.sync_markers(map_ticket, shelters);
        }
        if !self.focus.is_current(ticket) {
            debug!("dropping stale shelters response #{}", ticket.value());
            return PanelOutcome::Stale;
        }

        let section = &self.bindings.shelters_section;
        match result {
            Ok(shelters) if shelters.is_empty() => {
                self.view.set_html(section, &render::message(render::NO_SHELTERS));
                PanelOutcome::Empty
            }
            Ok(shelters) => {
                self.view.set_html(section, &render::render_shelters(&shelters));
                PanelOutcome::Rendered(shelters.len())
            }
            Err(e) => self.render_failure(
                section,
                e,
                FailureText { error: render::SHELTERS_ERROR, unavailable: render::SHELTERS_UNAVAILABLE },
            ),
        }
    }

    fn render_failure(&self, section: &ElementId, err: FetchError, text: FailureText) -> PanelOutcome {
        if err.is_application() {
            return match self.policy {
                FailurePolicy::ShowError => {
                    warn!("#{section}: {err}");
                    self.view.set_html(section, &render::message(text.unavailable));
                    PanelOutcome::Unavailable
                }
                FailurePolicy::Silent => {
                    debug!("#{section}: {err} (left as is)");
                    PanelOutcome::Unavailable
                }
            };
        }
        error!("#{section}: {err}");
        self.view.set_html(section, &render::message(text.error));
        PanelOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConf, MapConf};
    use crate::fetcher::FormReply;
    use crate::headless::{HeadlessMap, HeadlessPage};
    use crate::map::MapSyncController;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Answers every GET with a fixed payload per path.
    struct FixedBackend {
        replies: HashMap<String, Result<Value, String>>,
    }

    impl Backend for FixedBackend {
        async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
            match self.replies.get(path) {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(e)) => Err(FetchError::Network(e.clone())),
                None => Err(FetchError::Network(format!("no route {path}"))),
            }
        }

        async fn post_form(&self, _path: &str, _fields: &[(&str, &str)]) -> Result<FormReply, FetchError> {
            Ok(FormReply { status: 200, redirect: None })
        }
    }

    struct Fixture {
        page: Arc<HeadlessPage>,
        map: HeadlessMap,
        ctrl: PanelController<FixedBackend, HeadlessMap, Arc<HeadlessPage>>,
    }

    fn fixture(replies: Vec<(&str, Result<Value, String>)>, policy: FailurePolicy) -> Fixture {
        let page = Arc::new(HeadlessPage::dashboard());
        let map = HeadlessMap::new();
        let sync = Arc::new(MapSyncController::initialize(&map, &page, &MapConf::default()));
        let backend = FixedBackend {
            replies: replies.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        };
        let fetcher = Arc::new(DataFetcher::new(backend, BackendConf::default()));
        let ctrl = PanelController::new(page.clone(), PanelBindings::default(), fetcher, sync, policy);
        Fixture { page, map, ctrl }
    }

    #[test]
    fn test_initial_visibility() {
        let f = fixture(vec![], FailurePolicy::ShowError);
        assert!(f.page.is_visible(ids::RESOURCE_SECTION));
        assert!(!f.page.is_visible(ids::ALERTS_SECTION));
        assert!(!f.page.is_visible(ids::SHELTER_SECTION));
        assert_eq!(f.ctrl.active(), Panel::Resource);
        assert_eq!(f.page.html(ids::ALERTS_SECTION), "");
    }

    #[test]
    fn test_only_one_section_visible_after_switching() {
        let f = fixture(vec![], FailurePolicy::Silent);
        let sections = [ids::ALERTS_SECTION, ids::SHELTER_SECTION, ids::RESOURCE_SECTION];
        let visible_sections = |page: &HeadlessPage| -> Vec<String> {
            page.visible_elements().into_iter().filter(|id| sections.contains(&id.as_str())).collect()
        };
        assert_eq!(visible_sections(f.page.as_ref()), vec![ids::RESOURCE_SECTION.to_string()]);

        f.ctrl.show(Panel::Shelters);
        assert_eq!(visible_sections(f.page.as_ref()), vec![ids::SHELTER_SECTION.to_string()]);
    }

    #[tokio::test]
    async fn test_activate_alerts_renders_and_scrolls() {
        let f = fixture(
            vec![(
                "/api/v1/alerts",
                Ok(json!({"success": true, "alerts": [
                    {"title": "Flood", "severity": "high", "message": "Evacuate", "location": "Riverside"}
                ]})),
            )],
            FailurePolicy::ShowError,
        );

        assert_eq!(f.ctrl.activate(Panel::Alerts).await, PanelOutcome::Rendered(1));
        assert!(f.page.is_visible(ids::ALERTS_SECTION));
        assert!(!f.page.is_visible(ids::SHELTER_SECTION));
        assert!(!f.page.is_visible(ids::RESOURCE_SECTION));
        assert!(f.page.html(ids::ALERTS_SECTION).contains("Flood (HIGH)"));

        let scrolls = f.page.element(ids::ALERTS_SECTION).unwrap().scrolls;
        assert_eq!(scrolls, vec![ScrollBehavior::Smooth]);
    }

    #[tokio::test]
    async fn test_shelters_sync_markers() {
        let f = fixture(
            vec![(
                "/api/v1/shelters",
                Ok(json!({"success": true, "shelters": [
                    {"name": "City Hall", "capacity": 100, "current_occupancy": 40, "available_capacity": 60,
                     "location": {"address": "Main St", "latitude": "12.9", "longitude": "77.5"}},
                    {"name": "Nowhere", "capacity": 5, "current_occupancy": 5, "available_capacity": 0}
                ]})),
            )],
            FailurePolicy::ShowError,
        );

        assert_eq!(f.ctrl.activate(Panel::Shelters).await, PanelOutcome::Rendered(2));
        let markers = f.map.markers();
        assert_eq!(markers.len(), 1);
        assert!(markers[0].popup.contains("City Hall"));

        // re-activation reloads without duplicating markers
        assert_eq!(f.ctrl.activate(Panel::Shelters).await, PanelOutcome::Rendered(2));
        assert_eq!(f.map.markers().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_and_error_messages() {
        let f = fixture(
            vec![
                ("/api/v1/shelters", Ok(json!({"success": true, "shelters": []}))),
                ("/api/v1/alerts", Err("connection refused".into())),
            ],
            FailurePolicy::ShowError,
        );

        assert_eq!(f.ctrl.activate(Panel::Shelters).await, PanelOutcome::Empty);
        assert_eq!(f.page.html(ids::SHELTER_SECTION), "<p>No shelters available</p>");
        assert!(f.map.markers().is_empty());

        assert_eq!(f.ctrl.activate(Panel::Alerts).await, PanelOutcome::Failed);
        assert_eq!(f.page.html(ids::ALERTS_SECTION), "<p>Error loading alerts</p>");
    }

    #[tokio::test]
    async fn test_application_failure_policies() {
        let replies = || vec![("/api/v1/shelters", Ok(json!({"success": false})))];

        let shown = fixture(replies(), FailurePolicy::ShowError);
        assert_eq!(shown.ctrl.activate(Panel::Shelters).await, PanelOutcome::Unavailable);
        assert_eq!(shown.page.html(ids::SHELTER_SECTION), "<p>Shelter data is currently unavailable</p>");

        let silent = fixture(replies(), FailurePolicy::Silent);
        assert_eq!(silent.ctrl.activate(Panel::Shelters).await, PanelOutcome::Unavailable);
        assert_eq!(silent.page.html(ids::SHELTER_SECTION), "");
    }

    #[tokio::test]
    async fn test_parse_failure_renders_error() {
        let f = fixture(vec![("/api/v1/shelters", Ok(json!(["not", "an", "envelope"])))], FailurePolicy::ShowError);
        assert_eq!(f.ctrl.activate(Panel::Shelters).await, PanelOutcome::Failed);
        assert_eq!(f.page.html(ids::SHELTER_SECTION), "<p>Error loading shelters</p>");
    }

    #[tokio::test]
    async fn test_resource_panel_has_no_loader() {
        let f = fixture(vec![], FailurePolicy::ShowError);
        assert_eq!(f.ctrl.activate(Panel::Resource).await, PanelOutcome::Shown);
        assert!(f.page.is_visible(ids::RESOURCE_SECTION));
    }
}
