//! HTTP clients for the two upstream providers: OSRM routing and
//! Nominatim geocoding.
//!
//! The core never calls these itself — the engine emits
//! [`RouteRequest`](crate::engine::RouteRequest) values and the host
//! decides when to run them. Failures surface as errors the UI renders
//! as a degraded state; last-known-good data stays in the engine.
//!
//! Geocode responses are cached in memory for 60 seconds per
//! (query, limit) pair, matching the proxy this replaces.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WardMapError};
use crate::geo_utils::haversine_distance;
use crate::navigation::{Route, TurnInstruction, VehicleProfile};
use crate::LatLng;

/// Public OSRM demo endpoint.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/route/v1";
/// Public Nominatim search endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

const USER_AGENT: &str = "WardMapper/0.1 (dev@keralamaps.example)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Geocode responses stay cached this long.
const GEOCODE_TTL: Duration = Duration::from_secs(60);

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| WardMapError::HttpError {
            message: format!("failed to create HTTP client: {}", e),
            status_code: None,
        })
}

// ============================================================================
// OSRM Routing
// ============================================================================

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    location: [f64; 2],
    #[serde(rename = "type")]
    kind: String,
    modifier: Option<String>,
}

fn instruction_text(step: &OsrmStep) -> String {
    let name: &str = if step.name.is_empty() {
        "the road"
    } else {
        &step.name
    };
    match step.maneuver.kind.as_str() {
        "depart" => format!("Head out on {}", name),
        "arrive" => "You have arrived at your destination".to_string(),
        "roundabout" | "rotary" => format!("At the roundabout, take the exit onto {}", name),
        "merge" => format!("Merge onto {}", name),
        "continue" | "new name" => format!("Continue onto {}", name),
        _ => match step.maneuver.modifier.as_deref() {
            Some("uturn") => format!("Make a U-turn onto {}", name),
            Some(modifier) => format!("Turn {} onto {}", modifier, name),
            None => format!("Continue onto {}", name),
        },
    }
}

fn nearest_coord_index(coordinates: &[LatLng], target: &LatLng) -> u32 {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, coord) in coordinates.iter().enumerate() {
        let d = haversine_distance(coord, target);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best as u32
}

fn route_from_response(response: OsrmResponse) -> Result<Route> {
    let osrm_route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| WardMapError::RouteNotFound {
            message: "provider returned no routes".to_string(),
        })?;

    let coordinates: Vec<LatLng> = osrm_route
        .geometry
        .coordinates
        .iter()
        .map(|pair| LatLng::new(pair[1], pair[0]))
        .collect();

    let instructions: Vec<TurnInstruction> = osrm_route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| {
            let target = LatLng::new(step.maneuver.location[1], step.maneuver.location[0]);
            TurnInstruction {
                text: instruction_text(step),
                coord_index: nearest_coord_index(&coordinates, &target),
                target,
            }
        })
        .collect();

    Ok(Route {
        coordinates,
        instructions,
        total_distance: osrm_route.distance,
        total_time: osrm_route.duration,
    })
}

/// Client for an OSRM v1 `route` endpoint.
pub struct OsrmRouter {
    client: Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_OSRM_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a route between two coordinates for the given profile.
    ///
    /// Out-of-range or non-finite coordinates are a caller bug and fail
    /// loudly rather than being sent upstream.
    pub async fn fetch_route(
        &self,
        origin: LatLng,
        destination: LatLng,
        profile: VehicleProfile,
    ) -> Result<Route> {
        for point in [&origin, &destination] {
            if !point.is_valid() {
                return Err(WardMapError::InvalidCoordinates {
                    latitude: point.latitude,
                    longitude: point.longitude,
                });
            }
        }
        let url = format!(
            "{}/{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.base_url,
            profile.routing_profile(),
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
        );
        debug!("routing query: {}", url);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| WardMapError::HttpError {
                message: e.to_string(),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WardMapError::HttpError {
                message: "routing upstream error".to_string(),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: OsrmResponse =
            response.json().await.map_err(|e| WardMapError::HttpError {
                message: format!("routing response parse error: {}", e),
                status_code: None,
            })?;

        route_from_response(parsed)
    }
}

// ============================================================================
// Nominatim Geocoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct NominatimItem {
    place_id: Option<u64>,
    display_name: String,
    lat: String,
    lon: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    importance: Option<f64>,
    osm_id: Option<u64>,
    class: Option<String>,
}

/// One geocoding hit, normalized to the minimal fields the search UI
/// needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeocodeResult {
    pub place_id: Option<u64>,
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    pub kind: Option<String>,
    pub importance: Option<f64>,
    pub osm_id: Option<u64>,
    pub class: Option<String>,
}

fn normalize_geocode(items: Vec<NominatimItem>) -> Vec<GeocodeResult> {
    items
        .into_iter()
        .filter_map(|item| {
            Some(GeocodeResult {
                lat: item.lat.parse().ok()?,
                lng: item.lon.parse().ok()?,
                place_id: item.place_id,
                display_name: item.display_name,
                kind: item.kind,
                importance: item.importance,
                osm_id: item.osm_id,
                class: item.class,
            })
        })
        .collect()
}

/// Nominatim search client with a short-lived in-memory cache.
pub struct GeocodeClient {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<String, (Instant, Vec<GeocodeResult>)>>,
}

impl GeocodeClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_NOMINATIM_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.to_string(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cached(&self, key: &str) -> Option<Vec<GeocodeResult>> {
        let cache = self.cache.lock().unwrap();
        cache.get(key).and_then(|(at, results)| {
            if at.elapsed() < GEOCODE_TTL {
                Some(results.clone())
            } else {
                None
            }
        })
    }

    fn store(&self, key: String, results: Vec<GeocodeResult>) {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(key, (Instant::now(), results));
    }

    /// Search for a place name, newest cached response within the TTL
    /// preferred.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodeResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let key = format!("{}::{}", query, limit);
        if let Some(cached) = self.cached(&key) {
            debug!("geocode cache hit for {:?}", query);
            return Ok(cached);
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("q", query),
                ("limit", &limit.to_string()),
            ])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| WardMapError::HttpError {
                message: e.to_string(),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WardMapError::HttpError {
                message: "geocode upstream error".to_string(),
                status_code: Some(status.as_u16()),
            });
        }

        let items: Vec<NominatimItem> =
            response.json().await.map_err(|e| WardMapError::HttpError {
                message: format!("geocode response parse error: {}", e),
                status_code: None,
            })?;

        let results = normalize_geocode(items);
        self.store(key, results.clone());
        Ok(results)
    }
}

// ============================================================================
// Synchronous wrappers for FFI
// ============================================================================

/// Synchronous route fetch for FFI - runs the async code on a dedicated
/// tokio runtime.
#[cfg(feature = "ffi")]
pub fn fetch_route_sync(
    origin: LatLng,
    destination: LatLng,
    profile: VehicleProfile,
) -> Result<Route> {
    use log::warn;
    use tokio::runtime::Runtime;

    let rt = Runtime::new().map_err(|e| {
        warn!("Failed to create tokio runtime: {}", e);
        WardMapError::Internal {
            message: format!("runtime error: {}", e),
        }
    })?;
    let router = OsrmRouter::new()?;
    rt.block_on(router.fetch_route(origin, destination, profile))
}

/// Synchronous geocode search for FFI.
#[cfg(feature = "ffi")]
pub fn geocode_search_sync(query: String, limit: u32) -> Result<Vec<GeocodeResult>> {
    use log::warn;
    use tokio::runtime::Runtime;

    let rt = Runtime::new().map_err(|e| {
        warn!("Failed to create tokio runtime: {}", e);
        WardMapError::Internal {
            message: format!("runtime error: {}", e),
        }
    })?;
    let client = GeocodeClient::new()?;
    rt.block_on(client.search(&query, limit))
}
