//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the engine to
//! Kotlin and Swift. All calls go through the global engine singleton;
//! the host never holds engine state across the boundary. Timestamps
//! are taken here so the core stays clock-free.

use log::{debug, info, warn};

use crate::elections::WardResult;
use crate::engine::{with_engine, PositionOutcome, RouteRequest, WardLookup, WardRef};
use crate::init_logging;
use crate::metadata::AdminHierarchy;
use crate::navigation::{NavState, Route, VehicleProfile};
use crate::resolver::LegendStats;
use crate::LatLng;

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Initialize the engine (call once at app startup).
#[uniffi::export]
pub fn engine_init() {
    init_logging();
    info!("[WardMapperRust] Initialized");
}

// ============================================================================
// Dataset Loading
// ============================================================================

/// Load the ward boundary dataset from GeoJSON or NDJSON text.
/// Returns the feature count, 0 when the text is unreadable.
#[uniffi::export]
pub fn load_boundaries(text: String) -> u32 {
    init_logging();
    with_engine(|engine| match engine.load_boundaries_text(&text) {
        Ok(count) => {
            info!("[WardMapperRust] Loaded {} boundary features", count);
            count as u32
        }
        Err(e) => {
            warn!("[WardMapperRust] Boundary load failed: {}", e);
            0
        }
    })
}

/// Load the election dataset from a JSON array of row records.
/// Returns the resolved row count, 0 when the text is unreadable.
#[uniffi::export]
pub fn load_election_data(text: String) -> u32 {
    init_logging();
    with_engine(|engine| match engine.load_elections_text(&text) {
        Ok(count) => {
            info!("[WardMapperRust] Loaded {} election rows", count);
            count as u32
        }
        Err(e) => {
            warn!("[WardMapperRust] Election load failed: {}", e);
            0
        }
    })
}

/// Load the administrative mapping dataset (hierarchy fallback).
#[uniffi::export]
pub fn load_mapping_fallback(text: String) -> bool {
    init_logging();
    match crate::ingest::parse_mapping_dataset(&text) {
        Ok(records) => {
            with_engine(|engine| engine.load_mapping_fallback(&records));
            true
        }
        Err(e) => {
            warn!("[WardMapperRust] Mapping load failed: {}", e);
            false
        }
    }
}

#[uniffi::export]
pub fn elections_loaded() -> bool {
    with_engine(|engine| engine.elections_loaded())
}

/// The district/type/body hierarchy for the selector UI.
#[uniffi::export]
pub fn get_hierarchy() -> Option<AdminHierarchy> {
    with_engine(|engine| engine.hierarchy().cloned())
}

// ============================================================================
// Ward Resolution
// ============================================================================

/// Which ward contains this coordinate, with its election data.
#[uniffi::export]
pub fn resolve_ward_at(lat: f64, lng: f64) -> Option<WardLookup> {
    debug!("[WardMapperRust] resolve_ward_at({}, {})", lat, lng);
    with_engine(|engine| engine.resolve_ward_at(lat, lng))
}

/// Election result for a (district, body, ward) key.
#[uniffi::export]
pub fn resolve_ward_by_key(district: String, lsgd: String, ward_no: String) -> Option<WardResult> {
    with_engine(|engine| engine.resolve_ward_by_key(&district, &lsgd, &ward_no))
}

// ============================================================================
// Selection
// ============================================================================

#[uniffi::export]
pub fn select_body(district: String, body_type: String, body: String) {
    with_engine(|engine| engine.select(&district, &body_type, &body));
}

#[uniffi::export]
pub fn clear_selection() {
    with_engine(|engine| engine.clear_selection());
}

/// Ward list for the selected body, sorted by numeric ward number.
#[uniffi::export]
pub fn wards_of_selected_body() -> Vec<WardRef> {
    with_engine(|engine| engine.wards_of_selected_body())
}

/// Seat legend for the selected body.
#[uniffi::export]
pub fn get_legend() -> Option<LegendStats> {
    with_engine(|engine| engine.legend())
}

/// Bounding box of the selected body's wards (for viewport fitting).
#[uniffi::export]
pub fn get_selected_body_bounds() -> Option<crate::Bounds> {
    with_engine(|engine| engine.selected_body_bounds())
}

// ============================================================================
// Position & Navigation
// ============================================================================

/// Feed one GPS fix; returns navigation progress and any auto-detected
/// body change.
#[uniffi::export]
pub fn on_position_update(lat: f64, lng: f64, speed_mps: f64) -> PositionOutcome {
    with_engine(|engine| engine.on_position_update(lat, lng, speed_mps, now_ms()))
}

/// Start a navigation session; the host runs the returned routing
/// query and hands the result to [`tracker_set_route`].
#[uniffi::export]
pub fn tracker_start(origin: LatLng, destination: LatLng, profile: VehicleProfile) -> RouteRequest {
    init_logging();
    with_engine(|engine| engine.tracker_start(origin, destination, profile, now_ms()))
}

/// Install a resolved route (initial or re-route).
#[uniffi::export]
pub fn tracker_set_route(route: Route) {
    with_engine(|engine| engine.tracker_set_route(route, now_ms()));
}

/// Switch vehicle profile; returns a re-routing query when navigating.
#[uniffi::export]
pub fn tracker_set_profile(profile: VehicleProfile) -> Option<RouteRequest> {
    with_engine(|engine| engine.tracker_set_profile(profile))
}

/// Routing query for a re-route from the last known position.
#[uniffi::export]
pub fn get_reroute_request() -> Option<RouteRequest> {
    with_engine(|engine| engine.reroute_request())
}

#[uniffi::export]
pub fn tracker_set_panned_away(panned: bool) {
    with_engine(|engine| engine.tracker_set_panned_away(panned));
}

#[uniffi::export]
pub fn tracker_state() -> NavState {
    with_engine(|engine| engine.tracker_state())
}

/// End the navigation session.
#[uniffi::export]
pub fn tracker_exit() {
    with_engine(|engine| engine.tracker_exit());
}
