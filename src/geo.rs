use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GeoConfig;
use crate::state::AppState;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers (haversine).
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin() * (d_lon / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

// Locality fields tried in order on the geocoder's address object.
const LOCALITY_FIELDS: [&str; 6] = [
    "city",
    "town",
    "village",
    "municipality",
    "suburb",
    "city_district",
];

pub const FALLBACK_REGION: &str = "Sua Região";
pub const FALLBACK_IDENTIFIED: &str = "Localização Identificada";
pub const FALLBACK_LOCATION: &str = "Sua Localização";

fn extract_locality(body: &serde_json::Value) -> Option<String> {
    let address = body.get("address")?;
    for field in LOCALITY_FIELDS {
        if let Some(v) = address.get(field).and_then(|v| v.as_str()) {
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }
    None
}

/// Resolve a display name for the given coordinates.
///
/// Best-effort by design: any transport, status or parse problem degrades to
/// a fixed fallback string. This feeds non-critical display text and must
/// never fail the caller.
pub async fn get_address_from_coords(
    client: &reqwest::Client,
    config: &GeoConfig,
    lat: f64,
    lon: f64,
) -> String {
    let lat = lat.to_string();
    let lon = lon.to_string();
    let request = client
        .get(&config.endpoint)
        .query(&[
            ("format", "jsonv2"),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            // Nominatim asks for a contact address to avoid aggressive rate limiting
            ("email", config.contact_email.as_str()),
        ])
        .header(reqwest::header::ACCEPT_LANGUAGE, &config.locale);

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "reverse geocode request failed");
            return FALLBACK_LOCATION.to_string();
        }
    };

    if !response.status().is_success() {
        debug!(status = %response.status(), "reverse geocode non-success status");
        return FALLBACK_REGION.to_string();
    }

    match response.json::<serde_json::Value>().await {
        Ok(body) => extract_locality(&body).unwrap_or_else(|| FALLBACK_IDENTIFIED.to_string()),
        Err(e) => {
            warn!(error = %e, "reverse geocode parse failed");
            FALLBACK_LOCATION.to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseResponse {
    pub address: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/geo/reverse", get(reverse))
}

#[instrument(skip(state))]
async fn reverse(
    State(state): State<AppState>,
    Query(q): Query<ReverseQuery>,
) -> Json<ReverseResponse> {
    let address = get_address_from_coords(&state.http, &state.config.geo, q.lat, q.lon).await;
    Json(ReverseResponse { address })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distance_to_self_is_zero() {
        let d = calculate_distance(-23.5505, -46.6333, -23.5505, -46.6333);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = calculate_distance(-23.5505, -46.6333, -22.9068, -43.1729);
        let b = calculate_distance(-22.9068, -43.1729, -23.5505, -46.6333);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn distance_sao_paulo_rio_is_plausible() {
        // São Paulo <-> Rio de Janeiro is roughly 360 km as the crow flies
        let d = calculate_distance(-23.5505, -46.6333, -22.9068, -43.1729);
        assert!(d > 330.0 && d < 390.0, "got {}", d);
    }

    #[test]
    fn locality_prefers_city_over_suburb() {
        let body = json!({
            "address": { "suburb": "Moema", "city": "São Paulo" }
        });
        assert_eq!(extract_locality(&body).as_deref(), Some("São Paulo"));
    }

    #[test]
    fn locality_falls_through_priority_order() {
        let body = json!({
            "address": { "town": "Holambra", "municipality": "Holambra" }
        });
        assert_eq!(extract_locality(&body).as_deref(), Some("Holambra"));

        let body = json!({
            "address": { "city_district": "Centro" }
        });
        assert_eq!(extract_locality(&body).as_deref(), Some("Centro"));
    }

    #[test]
    fn locality_ignores_empty_and_missing_fields() {
        let body = json!({
            "address": { "city": "", "village": "Cunha" }
        });
        assert_eq!(extract_locality(&body).as_deref(), Some("Cunha"));

        let body = json!({ "address": {} });
        assert_eq!(extract_locality(&body), None);

        let body = json!({});
        assert_eq!(extract_locality(&body), None);
    }

    #[tokio::test]
    async fn unreachable_geocoder_degrades_to_fallback() {
        let config = GeoConfig {
            endpoint: "http://127.0.0.1:1/reverse".into(),
            contact_email: "test@example.com".into(),
            locale: "pt-BR".into(),
        };
        let client = reqwest::Client::new();
        let address = get_address_from_coords(&client, &config, -23.55, -46.63).await;
        assert_eq!(address, FALLBACK_LOCATION);
    }
}
