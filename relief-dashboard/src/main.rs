/**
 * RELIEF CONSOLE - Headless driver for the dashboard controllers
 *
 * ROLE: Runs the same flows as the browser page against a live backend
 * and geocoding service, on an in-memory page and map, then prints what
 * the page would show.
 *
 * USAGE:
 *   relief-console alerts
 *   relief-console shelters
 *   relief-console city <query> [pick <n>]
 *   relief-console login <email> <password>
 */

use anyhow::{bail, Context, Result};
use relief_dashboard::city_search::OpenWeatherGeocoder;
use relief_dashboard::dom::{ids, ElementId};
use relief_dashboard::fetcher::HttpBackend;
use relief_dashboard::headless::{HeadlessMap, HeadlessPage};
use relief_dashboard::{load_config, ClickOutcome, Dashboard, PageBindings};
use std::sync::Arc;
use tracing::info;

enum Command {
    Alerts,
    Shelters,
    City { query: String, pick: Option<usize> },
    Login { email: String, password: String },
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.first().map(String::as_str) {
        Some("alerts") => Ok(Command::Alerts),
        Some("shelters") => Ok(Command::Shelters),
        Some("city") => {
            let query = args.get(1).context("city needs a query")?.clone();
            let pick = match (args.get(2).map(String::as_str), args.get(3)) {
                (Some("pick"), Some(n)) => Some(n.parse().context("pick needs an index")?),
                (None, _) => None,
                _ => bail!("usage: city <query> [pick <n>]"),
            };
            Ok(Command::City { query, pick })
        }
        Some("login") => match (args.get(1), args.get(2)) {
            (Some(email), Some(password)) => Ok(Command::Login { email: email.clone(), password: password.clone() }),
            _ => bail!("usage: login <email> <password>"),
        },
        _ => bail!("usage: relief-console <alerts | shelters | city <query> [pick <n>] | login <email> <password>>"),
    }
}

fn print_section(page: &HeadlessPage, id: &str) {
    println!("--- #{id} ---");
    println!("{}", page.html(id));
}

fn print_map(map: &HeadlessMap) {
    let markers = map.markers();
    println!("--- map: {} marker(s) ---", markers.len());
    for m in markers {
        let open = if m.popup_open { " [open]" } else { "" };
        println!("({:.4}, {:.4}) {}{}", m.at.lat, m.at.lng, m.popup, open);
    }
    if let Some((center, zoom)) = map.view() {
        println!("view: ({:.4}, {:.4}) zoom {zoom}", center.lat, center.lng);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let cfg = load_config().await;
    let backend = HttpBackend::new(&cfg.backend).context("backend client")?;
    let geocoder = OpenWeatherGeocoder::new(&cfg.geocoding).context("geocoding client")?;
    let page = Arc::new(HeadlessPage::dashboard());
    let map = HeadlessMap::new();

    let dash = Dashboard::new(&cfg, backend, geocoder, &map, page.clone(), PageBindings::default());
    info!("backend {}", cfg.backend.base_url);
    dash.start().await;

    match command {
        Command::Alerts => {
            dash.click(&ids::ALERT_BUTTON.into()).await;
            print_section(&page, ids::ALERTS_SECTION);
        }
        Command::Shelters => {
            dash.click(&ids::SHELTER_BUTTON.into()).await;
            print_section(&page, ids::SHELTER_SECTION);
            print_map(&map);
        }
        Command::City { query, pick } => {
            dash.input(&ids::CITY_INPUT.into(), &query).await;
            print_section(&page, ids::RESULTS);
            if let Some(n) = pick {
                let item = ElementId::new(format!("{}-item-{n}", ids::RESULTS));
                if let ClickOutcome::Unbound = dash.click(&item).await {
                    bail!("no result #{n}");
                }
                print_map(&map);
            }
        }
        Command::Login { email, password } => {
            dash.input(&ids::LOGIN_EMAIL.into(), &email).await;
            dash.input(&ids::LOGIN_PASSWORD.into(), &password).await;
            dash.click(&ids::LOGIN_SUBMIT.into()).await;
            for notice in page.notices() {
                println!("notice: {notice}");
            }
            for url in page.navigations() {
                println!("navigated to {url}");
            }
        }
    }
    Ok(())
}
