//! Relief Dashboard - controllers for the disaster-response dashboard
//!
//! - Panel switching between alerts, shelters and resource tracking
//! - Shelter list rendering and the shelter marker layer on the map
//! - City autocomplete with a single city-search marker
//! - Login form submission
//!
//! Collaborators (backend API, geocoding, page, map library) sit behind
//! traits; `headless` provides in-memory page and map implementations.

pub mod app;
pub mod city_search;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetcher;
pub mod headless;
pub mod login;
pub mod map;
pub mod models;
pub mod panels;
pub mod render;
pub mod state;

pub use app::{ClickOutcome, Dashboard, PageBindings, UiAction};
pub use config::{load_config, DashboardConfig, FailurePolicy};
pub use error::FetchError;
pub use models::{Alert, CityMatch, LatLng, Shelter};
