/*!
Scripted collaborators for developing without a backend or geocoding service

`MockBackend` answers GET/POST per path from a script, optionally after a
delay, and records every call. `MockGeocoder` does the same per query.
Delays make it possible to reproduce out-of-order responses.
*/

use relief_dashboard::city_search::Geocoder;
use relief_dashboard::error::FetchError;
use relief_dashboard::fetcher::{Backend, FormReply};
use relief_dashboard::models::CityMatch;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Scripted reply, failure kinds kept simple so scripts stay clonable.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    NetworkError(String),
    Timeout,
}

impl<T: Clone> Reply<T> {
    fn resolve(&self) -> Result<T, FetchError> {
        match self {
            Reply::Ok(v) => Ok(v.clone()),
            Reply::NetworkError(e) => Err(FetchError::Network(e.clone())),
            Reply::Timeout => Err(FetchError::TimedOut(Duration::from_secs(10))),
        }
    }
}

#[derive(Debug, Clone)]
struct Scripted<T> {
    reply: Reply<T>,
    delay: Duration,
}

/// Per-key queue; the last entry keeps answering once the others are used.
#[derive(Debug)]
struct Script<T> {
    queues: HashMap<String, VecDeque<Scripted<T>>>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self { queues: HashMap::new() }
    }

    fn push(&mut self, key: &str, reply: Reply<T>, delay: Duration) {
        self.queues.entry(key.to_string()).or_default().push_back(Scripted { reply, delay });
    }

    fn next(&mut self, key: &str) -> Option<Scripted<T>> {
        let queue = self.queues.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Post(String, Vec<(String, String)>),
}

/// Backend double with per-path scripted replies.
#[derive(Clone)]
pub struct MockBackend {
    gets: Arc<Mutex<Script<Value>>>,
    posts: Arc<Mutex<Script<FormReply>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            gets: Arc::new(Mutex::new(Script::new())),
            posts: Arc::new(Mutex::new(Script::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a JSON answer for `path`.
    pub fn on_get(&self, path: &str, payload: Value) -> &Self {
        self.on_get_delayed(path, payload, Duration::ZERO)
    }

    pub fn on_get_delayed(&self, path: &str, payload: Value, delay: Duration) -> &Self {
        self.gets.lock().push(path, Reply::Ok(payload), delay);
        self
    }

    pub fn on_get_failure(&self, path: &str, reply: Reply<Value>) -> &Self {
        self.gets.lock().push(path, reply, Duration::ZERO);
        self
    }

    pub fn on_post(&self, path: &str, reply: Reply<FormReply>) -> &Self {
        self.posts.lock().push(path, reply, Duration::ZERO);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn get_count(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Get(p) if p == path))
            .count()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        self.calls.lock().push(Call::Get(path.to_string()));
        let scripted = self.gets.lock().next(path);
        let Some(scripted) = scripted else {
            log::warn!("[MOCK] no script for GET {}", path);
            return Err(FetchError::Network(format!("no script for {path}")));
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        log::info!("[MOCK] GET {} answered after {:?}", path, scripted.delay);
        scripted.reply.resolve()
    }

    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<FormReply, FetchError> {
        let owned = fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.calls.lock().push(Call::Post(path.to_string(), owned));
        let scripted = self.posts.lock().next(path);
        match scripted {
            Some(s) => s.reply.resolve(),
            None => Err(FetchError::Network(format!("no script for {path}"))),
        }
    }
}

/// Geocoder double with per-query scripted replies.
#[derive(Clone)]
pub struct MockGeocoder {
    script: Arc<Mutex<Script<Vec<CityMatch>>>>,
    queries: Arc<Mutex<Vec<(String, u8)>>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self { script: Arc::new(Mutex::new(Script::new())), queries: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn on_query(&self, query: &str, cities: Vec<CityMatch>) -> &Self {
        self.on_query_delayed(query, cities, Duration::ZERO)
    }

    pub fn on_query_delayed(&self, query: &str, cities: Vec<CityMatch>, delay: Duration) -> &Self {
        self.script.lock().push(query, Reply::Ok(cities), delay);
        self
    }

    pub fn on_query_failure(&self, query: &str, reply: Reply<Vec<CityMatch>>) -> &Self {
        self.script.lock().push(query, reply, Duration::ZERO);
        self
    }

    pub fn queries(&self) -> Vec<(String, u8)> {
        self.queries.lock().clone()
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for MockGeocoder {
    async fn direct(&self, query: &str, limit: u8) -> Result<Vec<CityMatch>, FetchError> {
        self.queries.lock().push((query.to_string(), limit));
        let scripted = self.script.lock().next(query);
        let Some(scripted) = scripted else {
            return Ok(Vec::new());
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.reply.resolve()
    }
}

/// JSON builders matching the backend contract.
pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn shelters(shelters: Vec<Value>) -> Value {
        serde_json::json!({ "success": true, "shelters": shelters })
    }

    pub fn alerts(alerts: Vec<Value>) -> Value {
        serde_json::json!({ "success": true, "alerts": alerts })
    }

    pub fn failure() -> Value {
        serde_json::json!({ "success": false })
    }

    pub fn shelter(name: &str, capacity: f64, occupied: f64, lat: &str, lon: &str) -> Value {
        serde_json::json!({
            "name": name,
            "capacity": capacity,
            "current_occupancy": occupied,
            "available_capacity": capacity - occupied,
            "location": { "address": format!("{name} Rd"), "latitude": lat, "longitude": lon }
        })
    }

    pub fn alert(title: &str, severity: &str) -> Value {
        serde_json::json!({ "title": title, "severity": severity, "message": format!("{title} warning") })
    }

    pub fn city(name: &str, country: &str, lat: f64, lon: f64) -> CityMatch {
        CityMatch { name: name.into(), country: country.into(), lat, lon }
    }
}
