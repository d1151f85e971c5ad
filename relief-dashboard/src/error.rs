/**
 * ERRORS - Failure taxonomy shared by every dashboard flow
 *
 * ROLE:
 * Classifies what can go wrong when a flow talks to a collaborator.
 * Each async flow catches these at its own boundary, logs them and
 * replaces them with a literal user-visible message; nothing propagates
 * past the controller that issued the request.
 *
 * TAXONOMY:
 * - Network / TimedOut : request rejected or exceeded its time budget
 * - Parse              : body is not JSON or lacks the expected shape
 * - Application        : backend answered `success: false`
 *
 * A shelter with unusable coordinates is not an error at all: the map
 * sync reports it as a skip (see `map::SkippedShelter`).
 */

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("backend reported success=false")]
    Application,
}

impl FetchError {
    /// Network-level failures, timeouts included.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::TimedOut(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }

    pub fn is_application(&self) -> bool {
        matches!(self, FetchError::Application)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map container '{0}' not found")]
    ContainerMissing(String),
    #[error("map initialization failed: {0}")]
    Mount(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
