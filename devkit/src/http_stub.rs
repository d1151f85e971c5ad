/*!
Stub HTTP backend (axum) for exercising the real reqwest collaborators

Serves the dashboard API on a random local port:
- GET  /api/v1/alerts, /api/v1/shelters  -> canned envelopes
- POST /login                            -> redirect to /dashboard on the demo
                                            credentials, 401 otherwise
- GET  /geo/1.0/direct?q=&limit=&appid=  -> prefix match over canned cities
- GET  /api/v1/moved                     -> redirect to /api/v1/shelters
- GET  /api/v1/broken                    -> 500
*/

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use relief_dashboard::models::CityMatch;
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const DEMO_USER: &str = "admin@gmail.com";
pub const DEMO_PASSWORD: &str = "12345";
pub const GEO_KEY: &str = "test-key";

#[derive(Clone)]
struct StubState {
    alerts: Value,
    shelters: Value,
    cities: Arc<Vec<CityMatch>>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct GeoParams {
    q: String,
    limit: Option<usize>,
    appid: Option<String>,
}

pub struct StubServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(alerts: Value, shelters: Value, cities: Vec<CityMatch>) -> Result<Self> {
        let state = StubState { alerts, shelters, cities: Arc::new(cities) };
        let app = Router::new()
            .route("/api/v1/alerts", get(|State(s): State<StubState>| async move { Json(s.alerts) }))
            .route("/api/v1/shelters", get(|State(s): State<StubState>| async move { Json(s.shelters) }))
            .route("/api/v1/moved", get(|| async { Redirect::temporary("/api/v1/shelters") }))
            .route("/api/v1/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }))
            .route("/login", post(login))
            .route("/dashboard", get(|| async { "dashboard" }))
            .route("/geo/1.0/direct", get(geocode))
            .with_state(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("[stub] server stopped: {}", e);
            }
        });
        log::info!("[stub] listening on http://{}", addr);
        Ok(Self { addr, handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn geocoding_endpoint(&self) -> String {
        format!("http://{}/geo/1.0/direct", self.addr)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username == DEMO_USER && form.password == DEMO_PASSWORD {
        Redirect::to("/dashboard").into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response()
    }
}

async fn geocode(State(s): State<StubState>, Query(params): Query<GeoParams>) -> Response {
    if params.appid.as_deref() != Some(GEO_KEY) {
        let body = serde_json::json!({"cod": 401, "message": "Invalid API key"});
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }
    let needle = params.q.to_lowercase();
    let matches: Vec<CityMatch> = s
        .cities
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with(&needle))
        .take(params.limit.unwrap_or(5))
        .cloned()
        .collect();
    Json(matches).into_response()
}
