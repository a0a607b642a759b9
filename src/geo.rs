//! Geolocation lookup for the distinct-IP handoff set.
//!
//! The analysis core hands off extracted IPs and performs no network calls;
//! only the CLI invokes this, behind an explicit flag. Lookup failures yield
//! `None`, never an error.

use serde::Deserialize;
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub ip: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpinfoResponse {
    #[serde(default)]
    loc: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

pub fn client() -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
}

/// Resolve one IP against ipinfo.io. Private-range addresses typically come
/// back without a `loc` field and resolve to `None` like any other miss.
pub fn lookup(client: &reqwest::blocking::Client, ip: &str) -> Option<GeoPoint> {
    let url = format!("https://ipinfo.io/{ip}/json");
    let response: IpinfoResponse = match client.get(&url).send().and_then(|r| r.json()) {
        Ok(response) => response,
        Err(error) => {
            log::debug!("geolocation lookup failed for {ip}: {error}");
            return None;
        }
    };

    let loc = response.loc?;
    let (latitude, longitude) = loc.split_once(',')?;
    Some(GeoPoint {
        ip: ip.to_string(),
        latitude: latitude.trim().parse().ok()?,
        longitude: longitude.trim().parse().ok()?,
        city: response.city,
        country: response.country,
    })
}
