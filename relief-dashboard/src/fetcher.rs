/**
 * DATA FETCHER - Backend collaborator and envelope decoding
 *
 * ROLE:
 * Performs one request against a named endpoint and returns the parsed
 * record list or a typed `FetchError`. Shared by the alerts and shelters
 * flows, and by the map seeding.
 *
 * HOW IT WORKS:
 * - `Backend` trait = narrow contract with the HTTP API (JSON GET, form POST)
 * - `HttpBackend` = reqwest clients with a fixed timeout; JSON reads follow
 *   redirects, form posts do not so the login flow sees the redirect target
 * - `DataFetcher` = checks the `{ success, <list> }` envelope and decodes records
 */

use crate::config::BackendConf;
use crate::error::FetchError;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Answer to a form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormReply {
    pub status: u16,
    /// Absolute redirect target when the backend answered with a redirect.
    pub redirect: Option<String>,
}

/// Narrow contract with the dashboard backend.
pub trait Backend: Send + Sync {
    fn get_json(&self, path: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;

    fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<FormReply, FetchError>> + Send;
}

impl<B: Backend> Backend for Arc<B> {
    fn get_json(&self, path: &str) -> impl Future<Output = Result<Value, FetchError>> + Send {
        (**self).get_json(path)
    }

    fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<FormReply, FetchError>> + Send {
        (**self).post_form(path, fields)
    }
}

/// Data sources served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Alerts,
    Shelters,
}

impl Endpoint {
    /// Key of the record list inside the response envelope.
    pub fn list_key(&self) -> &'static str {
        match self {
            Endpoint::Alerts => "alerts",
            Endpoint::Shelters => "shelters",
        }
    }

    pub fn path<'a>(&self, conf: &'a BackendConf) -> &'a str {
        match self {
            Endpoint::Alerts => &conf.alerts_path,
            Endpoint::Shelters => &conf.shelters_path,
        }
    }
}

pub struct DataFetcher<B> {
    backend: B,
    conf: BackendConf,
}

impl<B: Backend> DataFetcher<B> {
    pub fn new(backend: B, conf: BackendConf) -> Self {
        Self { backend, conf }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn conf(&self) -> &BackendConf {
        &self.conf
    }

    pub async fn load<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<Vec<T>, FetchError> {
        let payload = self.backend.get_json(endpoint.path(&self.conf)).await?;
        decode_envelope(payload, endpoint.list_key())
    }
}

/// Unwraps `{ "success": bool, "<key>": [...] }`.
pub fn decode_envelope<T: DeserializeOwned>(mut payload: Value, key: &str) -> Result<Vec<T>, FetchError> {
    let success = payload
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| FetchError::Parse("missing 'success' flag".into()))?;
    if !success {
        return Err(FetchError::Application);
    }
    let list = match payload.get_mut(key).map(Value::take) {
        Some(Value::Array(list)) => list,
        Some(_) => return Err(FetchError::Parse(format!("'{key}' is not a list"))),
        None => return Err(FetchError::Parse(format!("missing '{key}' list"))),
    };

    // one malformed record is skipped, not fatal to the whole list
    let mut records = Vec::with_capacity(list.len());
    for (index, item) in list.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping malformed {key} record #{index}: {e}"),
        }
    }
    Ok(records)
}

/// reqwest-backed `Backend`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    form_client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(conf: &BackendConf) -> Result<Self, FetchError> {
        let base = Url::parse(&conf.base_url)
            .map_err(|e| FetchError::Network(format!("invalid base url {}: {e}", conf.base_url)))?;
        let client = Client::builder()
            .timeout(conf.timeout())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let form_client = Client::builder()
            .timeout(conf.timeout())
            .redirect(Policy::none())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client, form_client, base, timeout: conf.timeout() })
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::Network(format!("invalid path {path}: {e}")))
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::TimedOut(self.timeout)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl Backend for HttpBackend {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.url(path)?;
        debug!("GET {url}");
        let response = self.client.get(url).send().await.map_err(|e| self.classify(e))?;
        if !response.status().is_success() {
            return Err(FetchError::Network(format!("HTTP {} for {path}", response.status())));
        }
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<FormReply, FetchError> {
        let url = self.url(path)?;
        debug!("POST {url}");
        let response = self
            .form_client
            .post(url.clone())
            .form(fields)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let redirect = if status.is_redirection() {
            response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| url.join(location).ok())
                .map(String::from)
        } else {
            None
        };
        Ok(FormReply { status: status.as_u16(), redirect })
    }
}
