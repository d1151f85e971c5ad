use crate::error::ConfigError;
use crate::models::LatLng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend: BackendConf,
    pub geocoding: GeocodingConf,
    pub map: MapConf,
    pub application_failure: FailurePolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConf {
    pub base_url: String,
    pub alerts_path: String,
    pub shelters_path: String,
    pub login_path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GeocodingConf {
    pub endpoint: String,
    pub api_key: String,
    pub limit: u8,
    pub min_query_len: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MapConf {
    pub container_id: String,
    pub center: [f64; 2], // [lat, lng]
    pub zoom: u8,
    pub tile_url: String,
    pub max_zoom: u8,
    pub city_zoom: u8,
}

/// What a panel shows when the backend answers `success: false`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    ShowError,
    Silent,
}

impl Default for BackendConf {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            alerts_path: "/api/v1/alerts".into(),
            shelters_path: "/api/v1/shelters".into(),
            login_path: "/login".into(),
            timeout_secs: 10,
        }
    }
}

impl Default for GeocodingConf {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openweathermap.org/geo/1.0/direct".into(),
            api_key: String::new(),
            limit: 5,
            min_query_len: 2,
            timeout_secs: 10,
        }
    }
}

impl Default for MapConf {
    fn default() -> Self {
        Self {
            container_id: "mapContainer".into(),
            center: [20.0, 77.0], // India
            zoom: 5,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            max_zoom: 19,
            city_zoom: 10,
        }
    }
}

impl BackendConf {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GeocodingConf {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MapConf {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.center[0], self.center[1])
    }
}

impl DashboardConfig {
    pub fn from_yaml(txt: &str) -> Result<Self, ConfigError> {
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(txt)?)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path).await?;
        Self::from_yaml(&txt)
    }

    /// Environment overrides applied on top of the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            if !key.trim().is_empty() {
                self.geocoding.api_key = key.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var("RELIEF_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
    }
}

pub async fn load_config() -> DashboardConfig {
    let path = std::env::var("RELIEF_DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard.yaml".into());
    let mut cfg = if Path::new(&path).exists() {
        DashboardConfig::from_file(&path).await.unwrap_or_else(|e| {
            warn!("config {path} unusable ({e}), using defaults");
            DashboardConfig::default()
        })
    } else {
        warn!("no {path}, using default config");
        DashboardConfig::default()
    };
    cfg.apply_env();
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.backend.shelters_path, "/api/v1/shelters");
        assert_eq!(cfg.geocoding.limit, 5);
        assert_eq!(cfg.geocoding.min_query_len, 2);
        assert_eq!(cfg.map.center(), LatLng::new(20.0, 77.0));
        assert_eq!(cfg.map.zoom, 5);
        assert_eq!(cfg.map.max_zoom, 19);
        assert_eq!(cfg.map.city_zoom, 10);
        assert_eq!(cfg.application_failure, FailurePolicy::ShowError);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = DashboardConfig::from_yaml(
            "backend:\n  base_url: http://relief.local:8080\napplication_failure: silent\n",
        )
        .unwrap();
        assert_eq!(cfg.backend.base_url, "http://relief.local:8080");
        assert_eq!(cfg.backend.login_path, "/login");
        assert_eq!(cfg.application_failure, FailurePolicy::Silent);
        assert_eq!(cfg.map.container_id, "mapContainer");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let cfg = DashboardConfig::from_yaml("   \n").unwrap();
        assert_eq!(cfg.backend.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(DashboardConfig::from_yaml("map: [not, a, map").is_err());
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "geocoding:\n  api_key: abc123\n  limit: 3").unwrap();

        let cfg = DashboardConfig::from_file(file.path()).await.unwrap();
        assert_eq!(cfg.geocoding.api_key, "abc123");
        assert_eq!(cfg.geocoding.limit, 3);
        assert_eq!(cfg.geocoding.endpoint, "https://api.openweathermap.org/geo/1.0/direct");
    }
}
