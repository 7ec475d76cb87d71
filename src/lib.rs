//! # Ward Mapper
//!
//! Core engine for a Kerala ward-boundary map viewer.
//!
//! This library provides:
//! - Point-in-polygon ward location over boundary datasets
//! - Cross-dataset name normalization and fuzzy key matching
//! - Election result aggregation (per-ward, per-body, state-wide)
//! - Turn-by-turn navigation progress tracking
//!
//! ## Features
//!
//! - **`http`** - Enable HTTP clients for the routing (OSRM) and
//!   geocoding (Nominatim) providers
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use geo::{LineString, Polygon};
//! use ward_mapper::{WardFeature, WardGeometry, WardIndex, WardProperties};
//!
//! // One square ward near Palakkad
//! let ring = LineString::from(vec![
//!     (76.0, 10.0),
//!     (76.1, 10.0),
//!     (76.1, 10.1),
//!     (76.0, 10.1),
//!     (76.0, 10.0),
//! ]);
//! let ward = WardFeature {
//!     properties: WardProperties {
//!         district: "Palakkad".to_string(),
//!         lsgd: "Ala".to_string(),
//!         lsgd_type: "Grama Panchayat".to_string(),
//!         ward_no: "1".to_string(),
//!         ward_name: "Ala North".to_string(),
//!     },
//!     geometry: WardGeometry::Polygon(Polygon::new(ring, vec![])),
//! };
//!
//! let index = WardIndex::new(vec![ward]);
//! let hit = index.locate(76.05, 10.05);
//! assert_eq!(hit.unwrap().properties.lsgd, "Ala");
//! assert!(index.locate(75.0, 9.0).is_none());
//! ```

use geo::{BoundingRect, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, WardMapError};

// Geographic utilities (distance, bounds calculations)
pub mod geo_utils;
pub use geo_utils::haversine_distance;

// Identity normalization of administrative names
pub mod normalize;
pub use normalize::normalize_name;

// Dataset ingestion (field aliases, GeoJSON/NDJSON parsing)
pub mod ingest;
pub use ingest::{parse_boundary_dataset, parse_election_rows, parse_mapping_dataset, ElectionRow};

// Point-in-polygon ward location
pub mod locate;
pub use locate::{locate_linear, WardIndex};

// District -> Type -> Local Body hierarchy
pub mod metadata;
pub use metadata::{AdminHierarchy, MappingRecord};

// Election result aggregation
pub mod elections;
pub use elections::{
    aggregate_elections, CandidateRecord, ElectionResults, Front, FrontTally, WardResult,
};

// Fuzzy cross-dataset lookup
pub mod resolver;
pub use resolver::{body_legend, resolve_ward, LegendStats};

// Navigation progress tracking
pub mod navigation;
pub use navigation::{
    Maneuver, NavEvent, NavState, NavTracker, Progress, Route, TurnInstruction, VehicleProfile,
};

// Stateful engine composing the components (singleton for FFI use)
pub mod engine;
pub use engine::{with_engine, BodyChange, ElectionLookup, RouteRequest, WardMapEngine, ENGINE};

// HTTP clients for routing/geocoding providers
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{GeocodeClient, GeocodeResult, OsrmRouter};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("WardMapperRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use ward_mapper::LatLng;
/// let point = LatLng::new(10.8505, 76.2711); // Kerala centroid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the coordinate is valid.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box over a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from coordinates. Returns `None` for an empty slice.
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Attributes carried by one ward boundary feature.
///
/// Fields missing from the source record are ingested as empty strings;
/// the metadata builder skips such features and display layers supply
/// their own placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct WardProperties {
    pub district: String,
    /// Local body name (panchayat, municipality, corporation).
    pub lsgd: String,
    /// Administrative type label as shipped by the dataset.
    pub lsgd_type: String,
    pub ward_no: String,
    pub ward_name: String,
}

/// Ward boundary geometry.
///
/// Ring coordinates are `[lng, lat]` pairs, first ring exterior, any
/// further rings holes. Unexpected geometry types are carried as
/// `Unsupported` and treated as never containing a point.
#[derive(Debug, Clone, PartialEq)]
pub enum WardGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    /// Geometry type the viewer does not handle (e.g. LineString).
    Unsupported(String),
}

impl WardGeometry {
    /// Bounding rectangle, `None` for unsupported or empty geometry.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            WardGeometry::Polygon(p) => p.bounding_rect(),
            WardGeometry::MultiPolygon(mp) => mp.bounding_rect(),
            WardGeometry::Unsupported(_) => None,
        }
    }

    /// Exterior ring vertices as coordinates (all parts for a
    /// MultiPolygon). Empty for unsupported geometry.
    pub fn exterior_points(&self) -> Vec<LatLng> {
        let rings: Vec<&Polygon<f64>> = match self {
            WardGeometry::Polygon(p) => vec![p],
            WardGeometry::MultiPolygon(mp) => mp.0.iter().collect(),
            WardGeometry::Unsupported(_) => Vec::new(),
        };
        rings
            .iter()
            .flat_map(|p| p.exterior().0.iter())
            .map(|c| LatLng::new(c.y, c.x))
            .collect()
    }
}

/// One ward boundary feature: attributes plus geometry.
///
/// Immutable once loaded; the engine replaces the whole feature set on
/// dataset reload rather than mutating individual features.
#[derive(Debug, Clone, PartialEq)]
pub struct WardFeature {
    pub properties: WardProperties,
    pub geometry: WardGeometry,
}

// ============================================================================
// Tests
// ============================================================================
