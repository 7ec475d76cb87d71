//! # Ward Map Engine
//!
//! Stateful session object composing the locator, metadata builder,
//! election aggregator, resolver, and navigation tracker behind one
//! surface. The UI layer (web or mobile) calls in with discrete events
//! — dataset loaded, map tapped, position fix, navigation started —
//! and reads back plain values.
//!
//! ## Ownership
//!
//! Each dataset is owned here and replaced wholesale on reload; nothing
//! mutates a loaded dataset in place. Asynchronous loads resolve in any
//! order: a ward query before election data arrives reports
//! `NotLoaded` rather than failing, and a boundary reload re-derives
//! whatever was derived from the old boundaries.
//!
//! A process-wide singleton (`ENGINE`) backs the FFI layer, which
//! cannot hold a Rust value across the boundary.

use std::sync::Mutex;

use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::elections::{aggregate_elections, ElectionResults, WardResult};
use crate::error::{OptionExt, Result};
use crate::geo_utils::{compute_bounds, haversine_distance};
use crate::ingest::{
    election_rows_from_values, leading_int, parse_boundary_dataset, parse_election_rows,
    ElectionRow,
};
use crate::locate::WardIndex;
use crate::metadata::{AdminHierarchy, MappingRecord};
use crate::navigation::{NavState, NavTracker, Progress, Route, VehicleProfile};
use crate::normalize::names_match;
use crate::resolver::{body_legend, resolve_ward, LegendStats};
use crate::{LatLng, WardFeature};

/// Skip ward auto-detection when a body is selected and the position
/// moved less than this (meters) since the previous fix.
pub const AUTO_DETECT_MOVE_M: f64 = 50.0;

// ============================================================================
// Engine Output Types
// ============================================================================

/// Election data attached to a located ward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ElectionLookup {
    /// Election dataset has not arrived (or failed to load).
    NotLoaded,
    /// Dataset loaded but has nothing for this ward — rendered as an
    /// explicit "data missing" state.
    Missing,
    Found { result: WardResult },
}

/// A located ward with its election data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct WardLookup {
    pub district: String,
    pub lsgd: String,
    pub lsgd_type: String,
    pub ward_no: String,
    pub ward_name: String,
    pub election: ElectionLookup,
}

/// Raised when a position fix lands in a different local body than the
/// current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct BodyChange {
    pub district: String,
    pub body: String,
    pub body_type: String,
}

/// Outcome of one position fix: navigation progress (when navigating)
/// and any auto-detected body change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PositionOutcome {
    pub progress: Option<Progress>,
    pub body_change: Option<BodyChange>,
}

/// A routing query for the host to run against the routing provider.
/// The engine never performs the network call itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RouteRequest {
    pub origin: LatLng,
    pub destination: LatLng,
    pub profile: VehicleProfile,
}

/// One entry of the selected body's ward list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct WardRef {
    pub ward_no: String,
    pub ward_name: String,
}

/// Current district/type/body selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Selection {
    pub district: Option<String>,
    pub body_type: Option<String>,
    pub body: Option<String>,
}

// ============================================================================
// Ward Map Engine
// ============================================================================

/// The composing session object. See the module docs for ownership.
pub struct WardMapEngine {
    index: Option<WardIndex>,
    hierarchy: Option<AdminHierarchy>,
    /// True when `hierarchy` was derived from the boundary dataset (and
    /// must be re-derived when boundaries reload).
    hierarchy_derived: bool,
    elections: Option<ElectionResults>,
    selection: Selection,
    last_position: Option<LatLng>,
    tracker: NavTracker,
}

impl Default for WardMapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WardMapEngine {
    pub fn new() -> Self {
        Self {
            index: None,
            hierarchy: None,
            hierarchy_derived: false,
            elections: None,
            selection: Selection::default(),
            last_position: None,
            tracker: NavTracker::new(),
        }
    }

    // ========================================================================
    // Dataset Loading
    // ========================================================================

    /// Install a boundary dataset, replacing any previous one. When no
    /// dedicated metadata dataset is loaded, the hierarchy is derived
    /// from these features.
    pub fn load_boundaries(&mut self, features: Vec<WardFeature>) {
        info!("loaded {} boundary features", features.len());
        if self.hierarchy.is_none() || self.hierarchy_derived {
            self.hierarchy = Some(AdminHierarchy::from_features(&features));
            self.hierarchy_derived = true;
        }
        self.index = Some(WardIndex::new(features));
    }

    /// Parse and install a boundary dataset from GeoJSON or NDJSON
    /// text. Returns the feature count.
    pub fn load_boundaries_text(&mut self, text: &str) -> Result<usize> {
        let features = parse_boundary_dataset(text)?;
        let count = features.len();
        self.load_boundaries(features);
        Ok(count)
    }

    /// Install the dedicated metadata dataset. Takes precedence over
    /// the hierarchy derived from boundaries.
    pub fn set_hierarchy(&mut self, hierarchy: AdminHierarchy) {
        self.hierarchy = Some(hierarchy);
        self.hierarchy_derived = false;
    }

    /// Build the hierarchy from the administrative mapping dataset (the
    /// fallback when neither metadata nor boundaries are available yet).
    pub fn load_mapping_fallback(&mut self, records: &[MappingRecord]) {
        debug!("building hierarchy from {} mapping records", records.len());
        self.set_hierarchy(AdminHierarchy::from_mapping(records));
    }

    /// Aggregate and install election rows, replacing any previous
    /// results.
    pub fn load_elections(&mut self, rows: &[ElectionRow]) {
        let results = aggregate_elections(rows);
        info!(
            "election data processed: NDA {} / UDF {} / LDF {} / OTH {}",
            results.totals.nda, results.totals.udf, results.totals.ldf, results.totals.oth
        );
        self.elections = Some(results);
    }

    /// Parse and install election rows from a JSON array of records.
    /// Returns the resolved row count.
    pub fn load_elections_text(&mut self, text: &str) -> Result<usize> {
        let rows = parse_election_rows(text)?;
        let count = rows.len();
        self.load_elections(&rows);
        Ok(count)
    }

    /// Install election rows from already-parsed JSON values.
    pub fn load_elections_values(&mut self, values: &[serde_json::Value]) -> usize {
        let rows = election_rows_from_values(values);
        let count = rows.len();
        self.load_elections(&rows);
        count
    }

    pub fn boundaries_loaded(&self) -> bool {
        self.index.is_some()
    }

    pub fn elections_loaded(&self) -> bool {
        self.elections.is_some()
    }

    pub fn hierarchy(&self) -> Option<&AdminHierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn election_results(&self) -> Option<&ElectionResults> {
        self.elections.as_ref()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn select(&mut self, district: &str, body_type: &str, body: &str) {
        self.selection = Selection {
            district: Some(district.to_string()),
            body_type: Some(body_type.to_string()),
            body: Some(body.to_string()),
        };
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Ward list for the selected body, sorted by numeric ward number.
    pub fn wards_of_selected_body(&self) -> Vec<WardRef> {
        let (Some(index), Some(district), Some(body)) = (
            self.index.as_ref(),
            self.selection.district.as_deref(),
            self.selection.body.as_deref(),
        ) else {
            return Vec::new();
        };

        let mut wards: Vec<WardRef> = index
            .features()
            .iter()
            .filter(|f| {
                names_match(&f.properties.district, district)
                    && names_match(&f.properties.lsgd, body)
            })
            .map(|f| WardRef {
                ward_no: f.properties.ward_no.clone(),
                ward_name: f.properties.ward_name.clone(),
            })
            .collect();
        wards.sort_by_key(|w| leading_int(&w.ward_no).unwrap_or(0));
        wards
    }

    /// Seat legend for the selected body, `None` until a body is
    /// selected and election data covers it.
    pub fn legend(&self) -> Option<LegendStats> {
        let results = self.elections.as_ref()?;
        let district = self.selection.district.as_deref()?;
        let body = self.selection.body.as_deref()?;
        body_legend(results, district, body)
    }

    /// Bounding box over the selected body's ward geometry — what the
    /// map fits its viewport to after a selection.
    pub fn selected_body_bounds(&self) -> Option<crate::Bounds> {
        let index = self.index.as_ref()?;
        let district = self.selection.district.as_deref()?;
        let body = self.selection.body.as_deref()?;

        let points: Vec<LatLng> = index
            .features()
            .iter()
            .filter(|f| {
                names_match(&f.properties.district, district)
                    && names_match(&f.properties.lsgd, body)
            })
            .flat_map(|f| f.geometry.exterior_points())
            .collect();
        compute_bounds(&points)
    }

    // ========================================================================
    // Ward Resolution
    // ========================================================================

    /// Which ward contains this coordinate, with its election data.
    pub fn resolve_ward_at(&self, lat: f64, lng: f64) -> Option<WardLookup> {
        let index = self.index.as_ref()?;
        // Geometry is [lng, lat]; callers hand us {lat, lng}
        let feature = index.locate(lng, lat)?;
        let p = &feature.properties;

        let election = match self.elections.as_ref() {
            None => ElectionLookup::NotLoaded,
            Some(results) => match resolve_ward(results, &p.district, &p.lsgd, &p.ward_no) {
                Some(result) => ElectionLookup::Found {
                    result: result.clone(),
                },
                None => ElectionLookup::Missing,
            },
        };

        Some(WardLookup {
            district: p.district.clone(),
            lsgd: p.lsgd.clone(),
            lsgd_type: p.lsgd_type.clone(),
            ward_no: p.ward_no.clone(),
            ward_name: p.ward_name.clone(),
            election,
        })
    }

    /// Election result for a (district, body, ward) key. `None` both
    /// when the dataset is missing the key and when it never loaded;
    /// [`elections_loaded`] distinguishes the two.
    ///
    /// [`elections_loaded`]: WardMapEngine::elections_loaded
    pub fn resolve_ward_by_key(
        &self,
        district: &str,
        lsgd: &str,
        ward_no: &str,
    ) -> Option<WardResult> {
        let results = self.elections.as_ref()?;
        resolve_ward(results, district, lsgd, ward_no).cloned()
    }

    /// Like [`resolve_ward_at`], but non-finite coordinates and a
    /// missing boundary dataset are errors instead of a silent `None`
    /// (a lookup miss stays `Ok(None)`).
    ///
    /// [`resolve_ward_at`]: WardMapEngine::resolve_ward_at
    pub fn resolve_ward_at_checked(&self, lat: f64, lng: f64) -> Result<Option<WardLookup>> {
        let position = LatLng::new(lat, lng);
        if !position.is_valid() {
            return Err(crate::WardMapError::InvalidCoordinates {
                latitude: lat,
                longitude: lng,
            });
        }
        self.index.as_ref().ok_or_not_loaded("boundaries")?;
        Ok(self.resolve_ward_at(lat, lng))
    }

    // ========================================================================
    // Position Updates
    // ========================================================================

    /// Feed one position fix: drives navigation progress and ward
    /// auto-detection.
    ///
    /// Auto-detection runs when no body is selected or the position
    /// moved more than [`AUTO_DETECT_MOVE_M`] since the previous fix;
    /// a detected body differing from the selection (under name
    /// normalization) updates the selection and reports a
    /// [`BodyChange`].
    pub fn on_position_update(
        &mut self,
        lat: f64,
        lng: f64,
        speed_mps: f64,
        now_ms: i64,
    ) -> PositionOutcome {
        let position = LatLng::new(lat, lng);
        let moved = self
            .last_position
            .map(|prev| haversine_distance(&prev, &position))
            .unwrap_or(f64::INFINITY);
        self.last_position = Some(position);

        let progress = self.tracker.on_position_update(position, speed_mps, now_ms);

        let mut body_change = None;
        let should_detect =
            self.index.is_some() && (moved > AUTO_DETECT_MOVE_M || self.selection.body.is_none());
        if should_detect {
            if let Some(feature) = self.index.as_ref().and_then(|i| i.locate(lng, lat)) {
                let p = &feature.properties;
                let current = self.selection.body.as_deref().unwrap_or("");
                if !names_match(current, &p.lsgd) {
                    debug!("auto-detected local body: {}", p.lsgd);
                    self.selection = Selection {
                        district: Some(p.district.clone()),
                        body_type: Some(p.lsgd_type.clone()),
                        body: Some(p.lsgd.clone()),
                    };
                    body_change = Some(BodyChange {
                        district: p.district.clone(),
                        body: p.lsgd.clone(),
                        body_type: p.lsgd_type.clone(),
                    });
                }
            }
        }

        PositionOutcome {
            progress,
            body_change,
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Start a navigation session, discarding any previous one. Returns
    /// the routing query the host should run; the resolved route comes
    /// back through [`tracker_set_route`].
    ///
    /// [`tracker_set_route`]: WardMapEngine::tracker_set_route
    pub fn tracker_start(
        &mut self,
        origin: LatLng,
        destination: LatLng,
        profile: VehicleProfile,
        now_ms: i64,
    ) -> RouteRequest {
        info!("navigation started ({:?})", profile);
        self.tracker.start(destination, profile, now_ms);
        RouteRequest {
            origin,
            destination,
            profile,
        }
    }

    /// Install a resolved route (initial or re-route).
    pub fn tracker_set_route(&mut self, route: Route, now_ms: i64) {
        self.tracker.set_route(route, now_ms);
    }

    /// Switch vehicle profile; when a session is active, returns the
    /// re-routing query for the new profile.
    pub fn tracker_set_profile(&mut self, profile: VehicleProfile) -> Option<RouteRequest> {
        self.tracker.set_profile(profile);
        if self.tracker.state() != NavState::Navigating {
            return None;
        }
        Some(RouteRequest {
            origin: self.last_position?,
            destination: self.tracker.destination()?,
            profile,
        })
    }

    /// Routing query for a re-route from the last known position (the
    /// host calls this on a `RerouteNeeded` event).
    pub fn reroute_request(&self) -> Option<RouteRequest> {
        if self.tracker.state() != NavState::Navigating {
            return None;
        }
        Some(RouteRequest {
            origin: self.last_position?,
            destination: self.tracker.destination()?,
            profile: self.tracker.profile(),
        })
    }

    pub fn tracker_set_panned_away(&mut self, panned: bool) {
        self.tracker.set_panned_away(panned);
    }

    pub fn tracker_state(&self) -> NavState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &NavTracker {
        &self.tracker
    }

    /// End the navigation session and drop its route state.
    pub fn tracker_exit(&mut self) {
        info!("navigation exited");
        self.tracker.exit();
    }
}

// ============================================================================
// Global Engine Singleton
// ============================================================================

/// Global engine instance.
///
/// This singleton allows FFI calls to access a shared engine without
/// passing state back and forth across the FFI boundary.
pub static ENGINE: Lazy<Mutex<WardMapEngine>> = Lazy::new(|| {
    Mutex::new(WardMapEngine::new())
});

/// Get a lock on the global engine.
pub fn with_engine<F, R>(f: F) -> R
where
    F: FnOnce(&mut WardMapEngine) -> R,
{
    let mut engine = ENGINE.lock().unwrap();
    f(&mut engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::TurnInstruction;
    use crate::{WardGeometry, WardProperties};
    use geo::{LineString, Polygon};

    fn square_ward(
        district: &str,
        lsgd: &str,
        ward_no: &str,
        origin: (f64, f64),
    ) -> WardFeature {
        let (x, y) = origin;
        let ring = LineString::from(vec![
            (x, y),
            (x + 0.1, y),
            (x + 0.1, y + 0.1),
            (x, y + 0.1),
            (x, y),
        ]);
        WardFeature {
            properties: WardProperties {
                district: district.to_string(),
                lsgd: lsgd.to_string(),
                lsgd_type: "Grama Panchayat".to_string(),
                ward_no: ward_no.to_string(),
                ward_name: format!("{} Ward {}", lsgd, ward_no),
            },
            geometry: WardGeometry::Polygon(Polygon::new(ring, vec![])),
        }
    }

    fn election_row(district: &str, lsgd: &str, ward_no: u32, front: &str) -> ElectionRow {
        ElectionRow {
            district: district.to_string(),
            lsgd: lsgd.to_string(),
            ward_no,
            rank: 1,
            front: front.to_string(),
            candidate: "Winner".to_string(),
            party: "P".to_string(),
            votes: 500,
        }
    }

    fn loaded_engine() -> WardMapEngine {
        let mut engine = WardMapEngine::new();
        engine.load_boundaries(vec![
            square_ward("Palakkad", "Ala", "1", (76.0, 10.0)),
            square_ward("Palakkad", "Ala", "2", (76.1, 10.0)),
            square_ward("Thrissur", "Kodungallur", "1", (76.0, 10.2)),
        ]);
        engine
    }

    #[test]
    fn test_resolve_ward_at_before_elections() {
        let engine = loaded_engine();
        let lookup = engine.resolve_ward_at(10.05, 76.05).unwrap();
        assert_eq!(lookup.lsgd, "Ala");
        assert_eq!(lookup.ward_no, "1");
        assert_eq!(lookup.election, ElectionLookup::NotLoaded);

        assert!(engine.resolve_ward_at(12.0, 78.0).is_none());
    }

    #[test]
    fn test_resolve_ward_at_with_elections() {
        let mut engine = loaded_engine();
        engine.load_elections(&[election_row("Palakkad", "Ala Grama Panchayat", 1, "LDF")]);

        let lookup = engine.resolve_ward_at(10.05, 76.05).unwrap();
        match lookup.election {
            ElectionLookup::Found { result } => {
                assert_eq!(result.winner.unwrap().name, "Winner");
            }
            other => panic!("expected Found, got {:?}", other),
        }

        // Ward 2 has boundaries but no election rows
        let lookup = engine.resolve_ward_at(10.05, 76.15).unwrap();
        assert_eq!(lookup.election, ElectionLookup::Missing);
    }

    #[test]
    fn test_resolve_ward_by_key_degrades() {
        let mut engine = loaded_engine();
        assert!(engine.resolve_ward_by_key("Palakkad", "Ala", "G01").is_none());
        assert!(!engine.elections_loaded());

        engine.load_elections(&[election_row("Palakkad", "Ala", 1, "LDF")]);
        assert!(engine.resolve_ward_by_key("Palakkad", "Ala", "G01").is_some());
        assert!(engine.resolve_ward_by_key("Palakkad", "Absent", "1").is_none());
    }

    #[test]
    fn test_checked_resolution_error_classes() {
        let empty = WardMapEngine::new();
        assert!(matches!(
            empty.resolve_ward_at_checked(10.0, 76.0),
            Err(crate::WardMapError::DatasetNotLoaded { .. })
        ));

        let engine = loaded_engine();
        assert!(matches!(
            engine.resolve_ward_at_checked(f64::NAN, 76.0),
            Err(crate::WardMapError::InvalidCoordinates { .. })
        ));
        // A plain miss is not an error
        assert!(engine.resolve_ward_at_checked(12.0, 78.0).unwrap().is_none());
        assert!(engine.resolve_ward_at_checked(10.05, 76.05).unwrap().is_some());
    }

    #[test]
    fn test_hierarchy_derivation_and_precedence() {
        let mut engine = loaded_engine();
        let hierarchy = engine.hierarchy().unwrap();
        assert_eq!(hierarchy.district_names(), vec!["Palakkad", "Thrissur"]);

        // A dedicated metadata dataset takes precedence and survives a
        // boundary reload
        engine.set_hierarchy(AdminHierarchy::from_mapping(&[MappingRecord {
            district: "Palakkad".to_string(),
            local_body: "Ala".to_string(),
            body_type: Some("Grama Panchayat".to_string()),
        }]));
        engine.load_boundaries(vec![square_ward("Kollam", "Oachira", "1", (76.5, 9.0))]);
        assert_eq!(engine.hierarchy().unwrap().district_names(), vec!["Palakkad"]);
    }

    #[test]
    fn test_boundary_reload_rederives_hierarchy() {
        let mut engine = loaded_engine();
        engine.load_boundaries(vec![square_ward("Kollam", "Oachira", "1", (76.5, 9.0))]);
        assert_eq!(engine.hierarchy().unwrap().district_names(), vec!["Kollam"]);
    }

    #[test]
    fn test_auto_detect_body_change() {
        let mut engine = loaded_engine();

        // First fix: no selection yet, detection runs
        let outcome = engine.on_position_update(10.05, 76.05, 0.0, 0);
        let change = outcome.body_change.unwrap();
        assert_eq!(change.body, "Ala");
        assert_eq!(engine.selection().body.as_deref(), Some("Ala"));

        // A few meters away: movement gate suppresses re-detection
        let outcome = engine.on_position_update(10.0501, 76.05, 0.0, 1_000);
        assert!(outcome.body_change.is_none());

        // Into another district's body
        let outcome = engine.on_position_update(10.25, 76.05, 0.0, 2_000);
        assert_eq!(outcome.body_change.unwrap().body, "Kodungallur");
    }

    #[test]
    fn test_wards_of_selected_body_sorted_numerically() {
        let mut engine = WardMapEngine::new();
        engine.load_boundaries(vec![
            square_ward("Palakkad", "Ala", "10", (76.0, 10.0)),
            square_ward("Palakkad", "Ala", "2", (76.1, 10.0)),
            square_ward("Palakkad", "Ala", "G01", (76.2, 10.0)),
        ]);
        engine.select("Palakkad", "Grama Panchayat", "Ala Grama Panchayat");

        let wards = engine.wards_of_selected_body();
        let numbers: Vec<&str> = wards.iter().map(|w| w.ward_no.as_str()).collect();
        assert_eq!(numbers, vec!["G01", "2", "10"]);
    }

    #[test]
    fn test_selected_body_bounds() {
        let mut engine = loaded_engine();
        assert!(engine.selected_body_bounds().is_none());

        engine.select("Palakkad", "Grama Panchayat", "Ala");
        let bounds = engine.selected_body_bounds().unwrap();
        // Both Ala wards: 76.0..76.2 x 10.0..10.1
        assert!((bounds.min_lng - 76.0).abs() < 1e-9);
        assert!((bounds.max_lng - 76.2).abs() < 1e-9);
        assert!((bounds.max_lat - 10.1).abs() < 1e-9);
    }

    #[test]
    fn test_legend_for_selection() {
        let mut engine = loaded_engine();
        engine.load_elections(&[
            election_row("Palakkad", "Ala", 1, "LDF"),
            election_row("Palakkad", "Ala", 2, "UDF"),
        ]);
        assert!(engine.legend().is_none());

        engine.select("Palakkad", "Grama Panchayat", "Ala");
        let legend = engine.legend().unwrap();
        assert_eq!(legend.ldf, 1);
        assert_eq!(legend.udf, 1);

        engine.select("Palakkad", "Grama Panchayat", "Elsewhere Entirely");
        assert!(engine.legend().is_none());
    }

    #[test]
    fn test_navigation_flow_through_engine() {
        let mut engine = loaded_engine();
        let origin = LatLng::new(10.0, 76.0);
        let destination = LatLng::new(10.04, 76.0);

        let request = engine.tracker_start(origin, destination, VehicleProfile::Walk, 0);
        assert_eq!(request.profile, VehicleProfile::Walk);
        assert_eq!(engine.tracker_state(), NavState::Navigating);

        let coordinates: Vec<LatLng> = (0..=40)
            .map(|i| LatLng::new(10.0 + i as f64 * 0.001, 76.0))
            .collect();
        engine.tracker_set_route(
            Route {
                instructions: vec![TurnInstruction {
                    text: "Head north".to_string(),
                    target: destination,
                    coord_index: 40,
                }],
                coordinates,
                total_distance: 4450.0,
                total_time: 3200.0,
            },
            0,
        );

        let outcome = engine.on_position_update(10.02, 76.0, 1.5, 1_000);
        let progress = outcome.progress.unwrap();
        assert_eq!(progress.state, NavState::Navigating);

        // Off-route fix produces a re-route request with current state
        let outcome = engine.on_position_update(10.02, 76.01, 1.5, 20_000);
        assert!(outcome
            .progress
            .unwrap()
            .events
            .contains(&crate::navigation::NavEvent::RerouteNeeded));
        let request = engine.reroute_request().unwrap();
        assert_eq!(request.destination, destination);
        assert_eq!(request.origin, LatLng::new(10.02, 76.01));

        engine.tracker_exit();
        assert_eq!(engine.tracker_state(), NavState::Idle);
        assert!(engine.reroute_request().is_none());
    }

    #[test]
    fn test_profile_switch_requests_reroute() {
        let mut engine = loaded_engine();
        assert!(engine.tracker_set_profile(VehicleProfile::Bus).is_none());

        engine.on_position_update(10.0, 76.0, 0.0, 0);
        engine.tracker_start(
            LatLng::new(10.0, 76.0),
            LatLng::new(10.04, 76.0),
            VehicleProfile::Car,
            0,
        );
        let request = engine.tracker_set_profile(VehicleProfile::Walk).unwrap();
        assert_eq!(request.profile, VehicleProfile::Walk);
    }

    #[test]
    fn test_with_engine_singleton() {
        with_engine(|engine| {
            engine.tracker_exit();
            assert_eq!(engine.tracker_state(), NavState::Idle);
        });
    }
}
