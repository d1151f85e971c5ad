use relief_dashboard::city_search::{Geocoder, OpenWeatherGeocoder};
use relief_dashboard::config::{BackendConf, GeocodingConf};
use relief_dashboard::dom::ids;
use relief_dashboard::fetcher::{Backend, DataFetcher, Endpoint, HttpBackend};
use relief_dashboard::headless::{HeadlessMap, HeadlessPage};
use relief_dashboard::login::LoginOutcome;
use relief_dashboard::models::{Alert, Shelter};
use relief_dashboard::panels::PanelOutcome;
use relief_dashboard::{ClickOutcome, Dashboard, DashboardConfig, PageBindings};
use relief_devkit::http_stub::{DEMO_PASSWORD, DEMO_USER, GEO_KEY};
use relief_devkit::{PayloadBuilder, StubServer};
use relief_dashboard::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

async fn stub() -> StubServer {
    StubServer::start(
        PayloadBuilder::alerts(vec![PayloadBuilder::alert("Cyclone", "critical")]),
        PayloadBuilder::shelters(vec![
            PayloadBuilder::shelter("Stadium", 500.0, 125.0, "13.08", "80.27"),
            PayloadBuilder::shelter("Library", 40.0, 40.0, "n/a", "80.0"),
        ]),
        vec![
            PayloadBuilder::city("Chennai", "IN", 13.08, 80.27),
            PayloadBuilder::city("Chandigarh", "IN", 30.73, 76.78),
            PayloadBuilder::city("Mumbai", "IN", 19.07, 72.87),
        ],
    )
    .await
    .unwrap()
}

/// Accepts connections and never answers.
async fn silent_listener() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{addr}"), handle)
}

fn backend_conf(server: &StubServer) -> BackendConf {
    BackendConf { base_url: server.base_url(), ..BackendConf::default() }
}

fn geocoding_conf(server: &StubServer, key: &str) -> GeocodingConf {
    GeocodingConf { endpoint: server.geocoding_endpoint(), api_key: key.into(), ..GeocodingConf::default() }
}

#[tokio::test]
async fn http_backend_decodes_envelopes() {
    let server = stub().await;
    let conf = backend_conf(&server);
    let fetcher = DataFetcher::new(HttpBackend::new(&conf).unwrap(), conf);

    let shelters: Vec<Shelter> = fetcher.load(Endpoint::Shelters).await.unwrap();
    assert_eq!(shelters.len(), 2);
    assert_eq!(shelters[0].occupancy_percent(), Some(25));

    let alerts: Vec<Alert> = fetcher.load(Endpoint::Alerts).await.unwrap();
    assert_eq!(alerts[0].severity, "critical");
}

#[tokio::test]
async fn http_backend_reports_redirect_target() {
    let server = stub().await;
    let backend = HttpBackend::new(&backend_conf(&server)).unwrap();

    let ok = backend
        .post_form("/login", &[("username", DEMO_USER), ("password", DEMO_PASSWORD)])
        .await
        .unwrap();
    assert!((300..400).contains(&ok.status));
    assert_eq!(ok.redirect, Some(format!("{}/dashboard", server.base_url())));

    let bad = backend
        .post_form("/login", &[("username", DEMO_USER), ("password", "nope")])
        .await
        .unwrap();
    assert_eq!(bad.status, 401);
    assert_eq!(bad.redirect, None);
}

#[tokio::test]
async fn http_backend_network_and_parse_failures() {
    // grab a free port, then close it
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let conf = BackendConf { base_url: format!("http://{closed}"), ..BackendConf::default() };
    let err = HttpBackend::new(&conf).unwrap().get_json("/api/v1/alerts").await.unwrap_err();
    assert!(err.is_network());

    let server = stub().await;
    let backend = HttpBackend::new(&backend_conf(&server)).unwrap();
    // plain-text page, not JSON
    let err = backend.get_json("/dashboard").await.unwrap_err();
    assert!(err.is_parse());
}

#[tokio::test]
async fn http_backend_follows_redirects_and_checks_status() {
    let server = stub().await;
    let backend = HttpBackend::new(&backend_conf(&server)).unwrap();

    let moved = backend.get_json("/api/v1/moved").await.unwrap();
    assert_eq!(moved["shelters"].as_array().map(Vec::len), Some(2));

    let err = backend.get_json("/api/v1/broken").await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn silent_collaborators_time_out() {
    let (url, listener) = silent_listener().await;

    let conf = BackendConf { base_url: url.clone(), timeout_secs: 1, ..BackendConf::default() };
    let err = HttpBackend::new(&conf).unwrap().get_json("/api/v1/shelters").await.unwrap_err();
    assert!(matches!(err, FetchError::TimedOut(d) if d == Duration::from_secs(1)), "got {err:?}");

    let geo = GeocodingConf { endpoint: format!("{url}/geo/1.0/direct"), timeout_secs: 1, ..GeocodingConf::default() };
    let err = OpenWeatherGeocoder::new(&geo).unwrap().direct("Pune", 5).await.unwrap_err();
    assert!(matches!(err, FetchError::TimedOut(d) if d == Duration::from_secs(1)), "got {err:?}");

    listener.abort();
}

#[tokio::test]
async fn openweather_geocoder_against_stub() {
    let server = stub().await;

    let geocoder = OpenWeatherGeocoder::new(&geocoding_conf(&server, GEO_KEY)).unwrap();
    let found = geocoder.direct("Ch", 5).await.unwrap();
    let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Chennai", "Chandigarh"]);

    let limited = geocoder.direct("Ch", 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    let unauthorized = OpenWeatherGeocoder::new(&geocoding_conf(&server, "wrong")).unwrap();
    assert!(unauthorized.direct("Ch", 5).await.unwrap_err().is_network());
}

#[tokio::test]
async fn full_dashboard_over_http() {
    let server = stub().await;
    let mut cfg = DashboardConfig::default();
    cfg.backend = backend_conf(&server);
    cfg.geocoding = geocoding_conf(&server, GEO_KEY);

    let page = Arc::new(HeadlessPage::dashboard());
    let map = HeadlessMap::new();
    let dash = Dashboard::new(
        &cfg,
        HttpBackend::new(&cfg.backend).unwrap(),
        OpenWeatherGeocoder::new(&cfg.geocoding).unwrap(),
        &map,
        page.clone(),
        PageBindings::default(),
    );

    dash.start().await;
    assert_eq!(map.markers().len(), 1);

    let outcome = dash.click(&ids::SHELTER_BUTTON.into()).await;
    assert_eq!(outcome, ClickOutcome::Panel(PanelOutcome::Rendered(2)));
    let html = page.html(ids::SHELTER_SECTION);
    assert!(html.contains("25% occupied"));
    assert!(html.contains("100% occupied"));

    dash.input(&ids::CITY_INPUT.into(), "Mum").await;
    dash.click(&"results-item-0".into()).await;
    assert_eq!(map.markers().len(), 2);

    dash.input(&ids::LOGIN_EMAIL.into(), DEMO_USER).await;
    dash.input(&ids::LOGIN_PASSWORD.into(), DEMO_PASSWORD).await;
    let outcome = dash.click(&ids::LOGIN_SUBMIT.into()).await;
    assert_eq!(
        outcome,
        ClickOutcome::Login(LoginOutcome::Navigated(format!("{}/dashboard", server.base_url())))
    );
}
