//! City autocomplete backed by a geocoding service.
//!
//! Queries shorter than the minimum length never reach the network. Each
//! rendered entry is bound to a `SelectCity` action; the previous entries'
//! bindings are dropped whenever the list is rendered again.

use crate::app::UiAction;
use crate::config::GeocodingConf;
use crate::dom::{ids, ElementId, EventBindings, SubscriptionId, View};
use crate::error::FetchError;
use crate::map::{MapSurface, MarkerId, SharedMap};
use crate::models::CityMatch;
use crate::render::{esc, Escaped};
use crate::state::RequestSequence;
use parking_lot::Mutex;
use reqwest::{Client, Url};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const NO_RESULTS: &str = "No results found";
pub const SEARCH_ERROR: &str = "Error fetching data";

pub trait Geocoder: Send + Sync {
    /// Up to `limit` places matching `query`.
    fn direct(&self, query: &str, limit: u8) -> impl Future<Output = Result<Vec<CityMatch>, FetchError>> + Send;
}

impl<G: Geocoder> Geocoder for Arc<G> {
    fn direct(&self, query: &str, limit: u8) -> impl Future<Output = Result<Vec<CityMatch>, FetchError>> + Send {
        (**self).direct(query, limit)
    }
}

/// OpenWeatherMap direct geocoding (`/geo/1.0/direct`).
#[derive(Clone)]
pub struct OpenWeatherGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl OpenWeatherGeocoder {
    pub fn new(conf: &GeocodingConf) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&conf.endpoint)
            .map_err(|e| FetchError::Network(format!("invalid geocoding endpoint: {e}")))?;
        let client = Client::builder()
            .timeout(conf.timeout())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client, endpoint, api_key: conf.api_key.clone(), timeout: conf.timeout() })
    }
}

impl Geocoder for OpenWeatherGeocoder {
    async fn direct(&self, query: &str, limit: u8) -> Result<Vec<CityMatch>, FetchError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query), ("limit", limit.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::TimedOut(self.timeout)
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;
        if !response.status().is_success() {
            return Err(FetchError::Network(format!("geocoding answered HTTP {}", response.status())));
        }
        let body = response.bytes().await.map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[derive(Debug, Clone)]
pub struct SearchBindings {
    pub input: ElementId,
    pub results: ElementId,
}

impl Default for SearchBindings {
    fn default() -> Self {
        Self { input: ids::CITY_INPUT.into(), results: ids::RESULTS.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Query too short: list hidden and emptied, no request made.
    Cleared,
    Listed(usize),
    NoResults,
    /// Collaborator failed; error entry shown, list stays visible.
    Failed,
    Stale,
}

#[derive(Default)]
struct Entries {
    cities: Vec<CityMatch>,
    subscriptions: Vec<SubscriptionId>,
}

pub struct CitySearchController<G, S, V> {
    view: V,
    bindings: SearchBindings,
    geocoder: G,
    map: SharedMap<S>,
    events: Arc<EventBindings<UiAction>>,
    limit: u8,
    min_query_len: usize,
    seq: RequestSequence,
    entries: Mutex<Entries>,
}

impl<G, S, V> CitySearchController<G, S, V>
where
    G: Geocoder,
    S: MapSurface,
    V: View,
{
    pub fn new(
        view: V,
        bindings: SearchBindings,
        geocoder: G,
        map: SharedMap<S>,
        events: Arc<EventBindings<UiAction>>,
        conf: &GeocodingConf,
    ) -> Self {
        Self {
            view,
            bindings,
            geocoder,
            map,
            events,
            limit: conf.limit,
            min_query_len: conf.min_query_len,
            seq: RequestSequence::new(),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn bindings(&self) -> &SearchBindings {
        &self.bindings
    }

    /// Cities currently listed.
    pub fn entries(&self) -> Vec<CityMatch> {
        self.entries.lock().cities.clone()
    }

    fn drop_entries(&self) {
        let mut entries = self.entries.lock();
        for id in entries.subscriptions.drain(..) {
            self.events.unsubscribe(id);
        }
        entries.cities.clear();
    }

    fn item_id(&self, index: usize) -> ElementId {
        ElementId::new(format!("{}-item-{index}", self.bindings.results))
    }

    /// Reacts to the current content of the query input.
    pub async fn on_input(&self, raw: &str) -> SearchOutcome {
        let query = raw.trim();
        let ticket = self.seq.issue();
        let results = &self.bindings.results;

        if query.chars().count() < self.min_query_len {
            self.drop_entries();
            self.view.set_visible(results, false);
            self.view.set_html(results, "");
            return SearchOutcome::Cleared;
        }

        let result = self.geocoder.direct(query, self.limit).await;
        if !self.seq.is_current(ticket) {
            debug!("dropping stale city results for '{query}'");
            return SearchOutcome::Stale;
        }

        self.drop_entries();
        self.view.set_visible(results, true);
        match result {
            Ok(cities) if cities.is_empty() => {
                self.view.set_html(results, &format!(r#"<li class="list-group-item">{NO_RESULTS}</li>"#));
                SearchOutcome::NoResults
            }
            Ok(mut cities) => {
                cities.truncate(self.limit as usize);
                let mut entries = self.entries.lock();
                let mut html = String::new();
                for (index, city) in cities.iter().enumerate() {
                    let item = self.item_id(index);
                    html.push_str(&format!(
                        r#"<li class="list-group-item" id="{item}" style="cursor: pointer">{}</li>"#,
                        Escaped(&city.label())
                    ));
                    entries.subscriptions.push(self.events.subscribe(item, UiAction::SelectCity(city.clone())));
                }
                self.view.set_html(results, &html);
                let n = cities.len();
                entries.cities = cities;
                SearchOutcome::Listed(n)
            }
            Err(e) => {
                error!("city search '{query}' failed: {e}");
                self.view.set_html(results, &format!(r#"<li class="list-group-item text-danger">{SEARCH_ERROR}</li>"#));
                SearchOutcome::Failed
            }
        }
    }

    /// Same as `on_input` with whatever the input currently holds.
    pub async fn on_input_from_view(&self) -> SearchOutcome {
        let query = self.view.value(&self.bindings.input).unwrap_or_default();
        self.on_input(&query).await
    }

    /// Puts the city in the input, hides the list and marks the city on the map.
    /// Any lookup still in flight is superseded and will not reopen the list.
    pub fn select(&self, city: &CityMatch) -> Option<MarkerId> {
        self.seq.issue();
        self.view.set_value(&self.bindings.input, &city.name);
        self.view.set_visible(&self.bindings.results, false);
        self.drop_entries();
        let label = esc(&city.name);
        self.map.set_city_search_marker(city.position(), &label)
    }
}
