/**
 * DASHBOARD - Wiring of every controller around one page and one map
 *
 * ROLE:
 * Builds the controllers from the configuration and the collaborators,
 * registers the static click bindings, seeds the map markers at startup
 * and routes page events (clicks, input) to the right controller.
 *
 * FLOWS:
 * - panel buttons    -> PanelController (alerts / shelters loaders)
 * - city input       -> CitySearchController -> MapSyncController city marker
 * - login / signup   -> LoginController
 * Each flow handles its own failures; one failing collaborator never
 * blocks another flow.
 */

use crate::city_search::{CitySearchController, Geocoder, SearchBindings, SearchOutcome};
use crate::config::DashboardConfig;
use crate::dom::{ElementId, EventBindings, View};
use crate::error::FetchError;
use crate::fetcher::{Backend, DataFetcher, Endpoint};
use crate::login::{LoginBindings, LoginController, LoginOutcome};
use crate::map::{MapEngine, MapSurface, MapSyncController, MarkerId, SharedMap, SyncReport};
use crate::models::{CityMatch, Shelter};
use crate::panels::{Panel, PanelBindings, PanelController, PanelOutcome};
use std::sync::Arc;
use tracing::{debug, error, info};

/// What a bound element does when clicked.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    ActivatePanel(Panel),
    SelectCity(CityMatch),
    ShowSignup,
    ShowLogin,
    SubmitLogin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Panel(PanelOutcome),
    City(Option<MarkerId>),
    Toggled,
    Login(LoginOutcome),
    Unbound,
}

#[derive(Debug, Clone, Default)]
pub struct PageBindings {
    pub panels: PanelBindings,
    pub search: SearchBindings,
    pub login: LoginBindings,
}

pub struct Dashboard<B, G, S, V> {
    panels: PanelController<B, S, V>,
    search: CitySearchController<G, S, V>,
    login: LoginController<B, V>,
    map: SharedMap<S>,
    fetcher: Arc<DataFetcher<B>>,
    events: Arc<EventBindings<UiAction>>,
    view: V,
}

impl<B, G, S, V> Dashboard<B, G, S, V>
where
    B: Backend,
    G: Geocoder,
    S: MapSurface,
    V: View + Clone,
{
    pub fn new<E>(cfg: &DashboardConfig, backend: B, geocoder: G, engine: &E, view: V, bindings: PageBindings) -> Self
    where
        E: MapEngine<Surface = S>,
    {
        let fetcher = Arc::new(DataFetcher::new(backend, cfg.backend.clone()));
        let map = Arc::new(MapSyncController::initialize(engine, &view, &cfg.map));
        let events = Arc::new(EventBindings::new());

        for (trigger, panel) in bindings.panels.triggers() {
            events.subscribe(trigger, UiAction::ActivatePanel(panel));
        }
        let login = &bindings.login;
        let optional = [
            (login.show_signup.clone(), UiAction::ShowSignup),
            (login.show_login.clone(), UiAction::ShowLogin),
            (login.submit.clone(), UiAction::SubmitLogin),
        ];
        for (el, action) in optional {
            match el {
                Some(el) if view.exists(&el) => {
                    events.subscribe(el, action);
                }
                Some(el) => debug!("#{el} not on page, {action:?} left unbound"),
                None => {}
            }
        }

        let panels = PanelController::new(
            view.clone(),
            bindings.panels,
            fetcher.clone(),
            map.clone(),
            cfg.application_failure,
        );
        let search = CitySearchController::new(
            view.clone(),
            bindings.search,
            geocoder,
            map.clone(),
            events.clone(),
            &cfg.geocoding,
        );
        let login = LoginController::new(view.clone(), bindings.login, fetcher.clone());

        Self { panels, search, login, map, fetcher, events, view }
    }

    pub fn panels(&self) -> &PanelController<B, S, V> {
        &self.panels
    }

    pub fn search(&self) -> &CitySearchController<G, S, V> {
        &self.search
    }

    pub fn login(&self) -> &LoginController<B, V> {
        &self.login
    }

    pub fn map(&self) -> &SharedMap<S> {
        &self.map
    }

    pub fn events(&self) -> &Arc<EventBindings<UiAction>> {
        &self.events
    }

    /// Seeds the shelter markers once. `None` when the map is unusable or
    /// the shelter fetch failed (logged).
    pub async fn start(&self) -> Option<SyncReport> {
        if !self.map.is_active() {
            return None;
        }
        let ticket = self.map.begin_sync();
        let loaded: Result<Vec<Shelter>, FetchError> = self.fetcher.load(Endpoint::Shelters).await;
        match loaded {
            Ok(shelters) => {
                let report = self.map.sync_markers(ticket, &shelters);
                info!("map seeded: {report:?}");
                Some(report)
            }
            Err(e) => {
                error!("initial shelter markers: {e}");
                None
            }
        }
    }

    pub async fn dispatch(&self, action: UiAction) -> ClickOutcome {
        match action {
            UiAction::ActivatePanel(panel) => ClickOutcome::Panel(self.panels.activate(panel).await),
            UiAction::SelectCity(city) => ClickOutcome::City(self.search.select(&city)),
            UiAction::ShowSignup => {
                self.login.show_signup();
                ClickOutcome::Toggled
            }
            UiAction::ShowLogin => {
                self.login.show_login();
                ClickOutcome::Toggled
            }
            UiAction::SubmitLogin => ClickOutcome::Login(self.login.submit_from_view().await),
        }
    }

    pub async fn click(&self, el: &ElementId) -> ClickOutcome {
        match self.events.resolve(el) {
            Some(action) => self.dispatch(action).await,
            None => {
                debug!("click on unbound #{el}");
                ClickOutcome::Unbound
            }
        }
    }

    /// Types into an input. Returns the search outcome when it was the city input.
    pub async fn input(&self, el: &ElementId, value: &str) -> Option<SearchOutcome> {
        self.view.set_value(el, value);
        if el == &self.search.bindings().input {
            Some(self.search.on_input_from_view().await)
        } else {
            None
        }
    }
}
