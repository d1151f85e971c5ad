/**
 * RENDER - Markup for the alerts and shelters panels
 *
 * ROLE:
 * Pure functions from fetched records to the HTML fragment a panel shows.
 * Derived shelter fields (occupancy percentage, availability label) are
 * computed here; every string coming from a collaborator is escaped.
 */

use crate::models::{display_number, Alert, Shelter};
use html_escaper::HtmlEscaper;
use std::fmt::{self, Write};

pub const NO_ALERTS: &str = "No active alerts";
pub const NO_SHELTERS: &str = "No shelters available";
pub const ALERTS_ERROR: &str = "Error loading alerts";
pub const SHELTERS_ERROR: &str = "Error loading shelters";
pub const ALERTS_UNAVAILABLE: &str = "Alert data is currently unavailable";
pub const SHELTERS_UNAVAILABLE: &str = "Shelter data is currently unavailable";

const NOT_AVAILABLE: &str = "N/A";
const NO_VALUE: &str = "-";

/// Displays the wrapped text with HTML special characters escaped.
pub struct Escaped<'a>(pub &'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(HtmlEscaper(f), "{}", self.0)
    }
}

pub fn esc(s: &str) -> String {
    Escaped(s).to_string()
}

/// Single-paragraph message used for empty and failed states.
pub fn message(text: &str) -> String {
    format!("<p>{}</p>", esc(text))
}

/// `(label, css class)` of the availability button.
pub fn availability(shelter: &Shelter) -> (&'static str, &'static str) {
    if shelter.is_available() {
        ("available", "avail")
    } else {
        ("full", "availmt")
    }
}

/// Occupancy percentage as displayed; "-" when capacity makes it meaningless.
pub fn occupancy_label(shelter: &Shelter) -> String {
    match shelter.occupancy_percent() {
        Some(pct) => pct.to_string(),
        None => NO_VALUE.to_string(),
    }
}

fn distance_label(shelter: &Shelter) -> String {
    match shelter.distance_km {
        Some(d) if d != 0.0 && d.is_finite() => display_number(d),
        _ => NO_VALUE.to_string(),
    }
}

fn text_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

pub fn render_shelter(shelter: &Shelter) -> String {
    let (label, class) = availability(shelter);
    let address = text_or(
        shelter.location.as_ref().and_then(|l| l.address.as_deref()),
        NOT_AVAILABLE,
    );
    let contact = text_or(shelter.contact.as_deref(), NOT_AVAILABLE);

    format!(
        r#"<div class="shelter">
    <div class="shelt">
        <i class="fa-solid fa-building-columns fa-beat-fade fa-2x"></i>
        <div class="h3">
            <h3>{name}</h3>
            <h5>{address}</h5>
        </div>
        <button class="{class}">{label}</button>
    </div>
    <div class="data">
        <div>Capacity <br> <b>{capacity}</b></div>
        <div class="mid">Occupied <br> <b>{occupied}</b></div>
        <div>Distance <br> <b>{distance}</b></div>
    </div>
    <div class="prcnt">
        <p>{percent}% occupied</p>
        <button class="dir"><i class="fa-regular fa-compass fa-spin fa-spin-reverse"></i> Get Direction</button>
    </div>
    <b>Emergency no.: {contact}</b>
</div>"#,
        name = esc(&shelter.name),
        address = esc(address),
        capacity = display_number(shelter.capacity),
        occupied = display_number(shelter.current_occupancy),
        distance = distance_label(shelter),
        percent = occupancy_label(shelter),
        contact = esc(contact),
    )
}

/// Shelter list view; the literal "no shelters" message for an empty list.
pub fn render_shelters(shelters: &[Shelter]) -> String {
    if shelters.is_empty() {
        return message(NO_SHELTERS);
    }
    let cards: String = shelters.iter().map(render_shelter).collect();
    format!(r#"<div class="Main2">{cards}</div>"#)
}

pub fn render_alert(alert: &Alert) -> String {
    format!(
        r#"<div class="alert-item">
    <h4>{title} ({severity})</h4>
    <p>{message}</p>
    <p><b>Location:</b> {location}</p>
</div>"#,
        title = esc(&alert.title),
        severity = esc(&alert.severity.to_uppercase()),
        message = esc(&alert.message),
        location = esc(text_or(alert.location.as_deref(), NOT_AVAILABLE)),
    )
}

pub fn render_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return message(NO_ALERTS);
    }
    alerts.iter().map(render_alert).collect()
}

/// Popup shown on a shelter's map marker.
pub fn shelter_popup(shelter: &Shelter) -> String {
    format!(
        "<b>{}</b><br>Capacity: {}<br>Occupied: {}",
        esc(&shelter.name),
        display_number(shelter.capacity),
        display_number(shelter.current_occupancy),
    )
}
