//! In-memory page and map.
//!
//! Used by `relief-console` to drive the controllers without a browser, and
//! by tests to inspect what the controllers did to the page and the map.

use crate::dom::{ids, ElementId, ScrollBehavior, View};
use crate::error::MapError;
use crate::map::{MapEngine, MapSurface, MarkerId, TileLayer};
use crate::models::LatLng;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementState {
    pub visible: bool,
    pub html: String,
    pub value: String,
    pub scrolls: Vec<ScrollBehavior>,
}

#[derive(Debug, Default)]
struct PageState {
    elements: BTreeMap<ElementId, ElementState>,
    notices: Vec<String>,
    navigations: Vec<String>,
}

/// Page made of the elements it was created with; calls on other IDs are ignored.
#[derive(Debug, Default)]
pub struct HeadlessPage {
    state: Mutex<PageState>,
}

impl HeadlessPage {
    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let elements = ids
            .into_iter()
            .map(|id| (ElementId::new(id.as_ref()), ElementState { visible: true, ..Default::default() }))
            .collect();
        Self { state: Mutex::new(PageState { elements, ..Default::default() }) }
    }

    /// Every element of the dashboard markup.
    pub fn dashboard() -> Self {
        Self::with_elements([
            ids::ALERT_BUTTON,
            ids::SHELTER_BUTTON,
            ids::ALERTS_SECTION,
            ids::SHELTER_SECTION,
            ids::RESOURCE_SECTION,
            ids::MAP_CONTAINER,
            ids::CITY_INPUT,
            ids::RESULTS,
            ids::LOGIN_BOX,
            ids::SIGNUP_BOX,
            ids::SHOW_SIGNUP,
            ids::SHOW_LOGIN,
            ids::LOGIN_EMAIL,
            ids::LOGIN_PASSWORD,
            ids::LOGIN_SUBMIT,
        ])
    }

    pub fn remove(&self, id: &str) {
        self.state.lock().elements.remove(&ElementId::from(id));
    }

    pub fn element(&self, id: &str) -> Option<ElementState> {
        self.state.lock().elements.get(&ElementId::from(id)).cloned()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.element(id).map(|e| e.visible).unwrap_or(false)
    }

    pub fn html(&self, id: &str) -> String {
        self.element(id).map(|e| e.html).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.state.lock().notices.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    /// IDs of the currently visible elements.
    pub fn visible_elements(&self) -> Vec<String> {
        self.state
            .lock()
            .elements
            .iter()
            .filter(|(_, e)| e.visible)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    fn with<F: FnOnce(&mut ElementState)>(&self, el: &ElementId, f: F) {
        if let Some(state) = self.state.lock().elements.get_mut(el) {
            f(state);
        }
    }
}

impl View for HeadlessPage {
    fn exists(&self, el: &ElementId) -> bool {
        self.state.lock().elements.contains_key(el)
    }

    fn set_visible(&self, el: &ElementId, visible: bool) {
        self.with(el, |e| e.visible = visible);
    }

    fn set_html(&self, el: &ElementId, html: &str) {
        self.with(el, |e| e.html = html.to_string());
    }

    fn scroll_into_view(&self, el: &ElementId, behavior: ScrollBehavior) {
        self.with(el, |e| e.scrolls.push(behavior));
    }

    fn value(&self, el: &ElementId) -> Option<String> {
        self.state.lock().elements.get(el).map(|e| e.value.clone())
    }

    fn set_value(&self, el: &ElementId, value: &str) {
        self.with(el, |e| e.value = value.to_string());
    }

    fn notify(&self, message: &str) {
        self.state.lock().notices.push(message.to_string());
    }

    fn navigate(&self, url: &str) {
        self.state.lock().navigations.push(url.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub id: MarkerId,
    pub at: LatLng,
    pub popup: String,
    pub popup_open: bool,
}

#[derive(Debug, Default)]
struct MapState {
    next: u64,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    view: Option<(LatLng, u8)>,
    tiles: Option<TileLayer>,
    container: Option<ElementId>,
}

/// Map engine and surface in one: `mount` hands out a handle on the same state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    state: Arc<Mutex<MapState>>,
    fail_mount: bool,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose mount always fails.
    pub fn failing() -> Self {
        Self { fail_mount: true, ..Self::default() }
    }

    pub fn markers(&self) -> Vec<PlacedMarker> {
        self.state.lock().markers.values().cloned().collect()
    }

    pub fn view(&self) -> Option<(LatLng, u8)> {
        self.state.lock().view
    }

    pub fn tiles(&self) -> Option<TileLayer> {
        self.state.lock().tiles.clone()
    }

    pub fn container(&self) -> Option<ElementId> {
        self.state.lock().container.clone()
    }
}

impl MapEngine for HeadlessMap {
    type Surface = HeadlessMap;

    fn mount(&self, container: &ElementId, center: LatLng, zoom: u8, tiles: &TileLayer) -> Result<HeadlessMap, MapError> {
        if self.fail_mount {
            return Err(MapError::Mount(format!("no renderer for #{container}")));
        }
        let mut state = self.state.lock();
        state.container = Some(container.clone());
        state.view = Some((center, zoom.min(tiles.max_zoom)));
        state.tiles = Some(tiles.clone());
        Ok(self.clone())
    }
}

impl MapSurface for HeadlessMap {
    fn add_marker(&self, at: LatLng, popup: &str) -> MarkerId {
        let mut state = self.state.lock();
        state.next += 1;
        let id = MarkerId(state.next);
        state.markers.insert(id, PlacedMarker { id, at, popup: popup.to_string(), popup_open: false });
        id
    }

    fn remove_marker(&self, marker: MarkerId) {
        self.state.lock().markers.remove(&marker);
    }

    fn open_popup(&self, marker: MarkerId) {
        // one popup open at a time
        for (id, m) in self.state.lock().markers.iter_mut() {
            m.popup_open = *id == marker;
        }
    }

    fn set_view(&self, center: LatLng, zoom: u8) {
        let mut state = self.state.lock();
        let max = state.tiles.as_ref().map(|t| t.max_zoom).unwrap_or(u8::MAX);
        state.view = Some((center, zoom.min(max)));
    }
}
