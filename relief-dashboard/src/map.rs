/**
 * MAP SYNC - Shelter marker layer and city-search marker
 *
 * ROLE:
 * Owns the map instance and every marker the dashboard puts on it.
 * Keeps the shelter marker layer equal to the last applied shelter dataset
 * and holds at most one city-search marker.
 *
 * HOW IT WORKS:
 * - `MapEngine` mounts a map into a page container (tile library seam)
 * - `MapSurface` = marker operations on a mounted map
 * - each sync takes a ticket; a dataset whose ticket is stale is dropped
 * - a sync swaps the whole shelter layer: old markers out, new ones in
 * - if mounting failed, the controller is inert and every call is skipped
 */

use crate::config::MapConf;
use crate::dom::{ElementId, View};
use crate::error::MapError;
use crate::models::{LatLng, Shelter};
use crate::render::shelter_popup;
use crate::state::{RequestSequence, Ticket};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle to a marker owned by a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// XYZ tile source attached at mount time.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub max_zoom: u8,
}

/// Marker operations on a mounted map.
pub trait MapSurface: Send + Sync {
    fn add_marker(&self, at: LatLng, popup: &str) -> MarkerId;
    fn remove_marker(&self, marker: MarkerId);
    fn open_popup(&self, marker: MarkerId);
    fn set_view(&self, center: LatLng, zoom: u8);
}

/// Mounts maps into page containers.
pub trait MapEngine {
    type Surface: MapSurface;

    fn mount(
        &self,
        container: &ElementId,
        center: LatLng,
        zoom: u8,
        tiles: &TileLayer,
    ) -> Result<Self::Surface, MapError>;
}

/// One marker per mappable shelter of the current dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntry {
    pub shelter_index: usize,
    pub shelter_name: String,
    pub marker: MarkerId,
}

/// Shelter left off the map because its coordinates are unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedShelter {
    pub shelter_index: usize,
    pub shelter_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncReport {
    Applied { added: usize, removed: usize, skipped: Vec<SkippedShelter> },
    Stale,
    Inactive,
}

/// Holds at most one marker; putting a new one in hands back the old one.
#[derive(Debug, Default)]
pub struct MarkerSlot {
    current: Option<MarkerId>,
}

impl MarkerSlot {
    pub fn replace(&mut self, marker: MarkerId) -> Option<MarkerId> {
        self.current.replace(marker)
    }

    pub fn get(&self) -> Option<MarkerId> {
        self.current
    }
}

#[derive(Default)]
struct Layers {
    shelters: Vec<MarkerEntry>,
    city: MarkerSlot,
}

pub struct MapSyncController<S> {
    surface: Option<S>,
    city_zoom: u8,
    layers: Mutex<Layers>,
    seq: RequestSequence,
}

pub type SharedMap<S> = Arc<MapSyncController<S>>;

impl<S: MapSurface> MapSyncController<S> {
    /// Creates the map view once. A missing container or a failed mount
    /// leaves the controller inert rather than failing the caller.
    pub fn initialize<E, V>(engine: &E, view: &V, conf: &MapConf) -> Self
    where
        E: MapEngine<Surface = S>,
        V: View,
    {
        let container = ElementId::new(conf.container_id.clone());
        let tiles = TileLayer { url_template: conf.tile_url.clone(), max_zoom: conf.max_zoom };

        let surface = if !view.exists(&container) {
            warn!("{}; map features disabled", MapError::ContainerMissing(container.to_string()));
            None
        } else {
            match engine.mount(&container, conf.center(), conf.zoom, &tiles) {
                Ok(surface) => {
                    info!("map mounted in #{container} at zoom {}", conf.zoom);
                    Some(surface)
                }
                Err(e) => {
                    warn!("{e}; map features disabled");
                    None
                }
            }
        };

        Self { surface, city_zoom: conf.city_zoom, layers: Mutex::new(Layers::default()), seq: RequestSequence::new() }
    }

    pub fn is_active(&self) -> bool {
        self.surface.is_some()
    }

    /// Ticket for a shelter load that will end in `sync_markers`.
    pub fn begin_sync(&self) -> Ticket {
        self.seq.issue()
    }

    /// Replaces the whole shelter marker layer with `shelters`, unless a newer
    /// load has been issued since `ticket`.
    pub fn sync_markers(&self, ticket: Ticket, shelters: &[Shelter]) -> SyncReport {
        let Some(surface) = &self.surface else {
            return SyncReport::Inactive;
        };
        if !self.seq.is_current(ticket) {
            debug!("dropping stale marker sync #{}", ticket.value());
            return SyncReport::Stale;
        }

        let mut layers = self.layers.lock();
        let previous = std::mem::take(&mut layers.shelters);
        let removed = previous.len();
        for entry in previous {
            surface.remove_marker(entry.marker);
        }

        let mut skipped = Vec::new();
        for (index, shelter) in shelters.iter().enumerate() {
            match shelter.position() {
                Some(at) => {
                    let marker = surface.add_marker(at, &shelter_popup(shelter));
                    layers.shelters.push(MarkerEntry {
                        shelter_index: index,
                        shelter_name: shelter.name.clone(),
                        marker,
                    });
                }
                None => {
                    debug!("shelter '{}' has no usable coordinates, not mapped", shelter.name);
                    skipped.push(SkippedShelter { shelter_index: index, shelter_name: shelter.name.clone() });
                }
            }
        }

        let added = layers.shelters.len();
        debug!("marker sync #{}: {added} added, {removed} removed", ticket.value());
        SyncReport::Applied { added, removed, skipped }
    }

    /// Swaps the city-search marker and centers the map on it.
    /// Returns the new marker, or `None` when the map is inactive.
    pub fn set_city_search_marker(&self, at: LatLng, label: &str) -> Option<MarkerId> {
        let surface = self.surface.as_ref()?;
        let mut layers = self.layers.lock();

        let marker = surface.add_marker(at, label);
        if let Some(old) = layers.city.replace(marker) {
            surface.remove_marker(old);
        }
        surface.open_popup(marker);
        surface.set_view(at, self.city_zoom);
        Some(marker)
    }

    pub fn shelter_markers(&self) -> Vec<MarkerEntry> {
        self.layers.lock().shelters.clone()
    }

    pub fn city_marker(&self) -> Option<MarkerId> {
        self.layers.lock().city.get()
    }
}
