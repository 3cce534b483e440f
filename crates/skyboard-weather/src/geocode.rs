//! Reverse geocoding: turn the configured coordinates into a place name for
//! the widget header. Uses Nominatim (OpenStreetMap), no API key required.

use crate::types::Location;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// "Place, Region" where the region is dropped when it repeats the place.
    fn display_name(self) -> Option<String> {
        let region = self.state.clone().or_else(|| self.country.clone());
        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.county)
            .or(self.state)
            .or(self.country)?;

        match region {
            Some(r) if !r.is_empty() && r != place => Some(format!("{}, {}", place, r)),
            _ => Some(place),
        }
    }
}

/// Reverse geocode a location against the Nominatim instance at `base_url`.
///
/// Returns `None` on any failure; the caller falls back to coordinates.
pub async fn reverse_geocode(client: &Client, base_url: &str, location: &Location) -> Option<String> {
    if location.city_name.is_some() {
        return location.city_name.clone();
    }

    let url = format!(
        "{}/reverse?lat={}&lon={}&format=json&addressdetails=1&zoom=10",
        base_url.trim_end_matches('/'),
        location.latitude,
        location.longitude
    );

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Reverse geocode request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Reverse geocode returned status {}", response.status());
        return None;
    }

    let body: NominatimResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Reverse geocode parse error: {}", e);
            return None;
        }
    };

    let name = body.address?.display_name()?;
    tracing::info!("Reverse geocoded to: {}", name);
    Some(name)
}

/// Coordinates rendered the way the header shows them when no name is known.
pub fn coordinates_label(location: &Location) -> String {
    format!("{:.2}, {:.2}", location.latitude, location.longitude)
}
