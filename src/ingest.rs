//! Dataset ingestion: loosely-typed source records into typed ones.
//!
//! The source datasets disagree on field spellings (`Ward_No` vs
//! `WardNumber`, `ward_code` vs `Ward Code`, ...), so every logical
//! field resolves through an ordered alias list exactly once, here.
//! Downstream code only ever sees the typed records.
//!
//! Malformed rows and features are skipped, never fatal: a bad line in
//! a 20k-feature dataset should cost one feature, not the load.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::{Result, WardMapError};
use crate::metadata::MappingRecord;
use crate::{WardFeature, WardGeometry, WardProperties};

// ============================================================================
// Field Aliases
// ============================================================================

const DISTRICT_ALIASES: &[&str] = &["District"];
const LSGD_ALIASES: &[&str] = &["LSGD"];
const LSGD_TYPE_ALIASES: &[&str] = &["Lsgd_Type"];
const WARD_NO_ALIASES: &[&str] = &["Ward_No", "WardNumber", "ward_no"];
const WARD_NAME_ALIASES: &[&str] = &["Ward_Name", "WardName", "ward_name"];

const ROW_LSGD_ALIASES: &[&str] = &["LSGI Name", "LSGD Name"];
const ROW_WARD_CODE_ALIASES: &[&str] = &["ward_code", "Ward Code"];
const ROW_CANDIDATE_ALIASES: &[&str] = &["Candidate Name English", "Candidate"];
const ROW_PARTY_ALIASES: &[&str] = &["Party Name English", "Party"];
const ROW_VOTES_ALIASES: &[&str] = &["Candidate Total_votes", "Votes"];

/// Resolve a logical field through its alias list.
///
/// The first alias present with a non-empty string (or any number) wins.
fn field_str(props: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        match props.get(*alias) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Leading integer value of a string, discarding any non-digit prefix.
///
/// Ward codes arrive as "01", "1", or letter-prefixed "G01"; all three
/// parse to 1. Returns `None` when the string contains no digits.
pub fn leading_int(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ============================================================================
// Boundary Features
// ============================================================================

/// Extract typed ward attributes from a GeoJSON properties object.
/// Missing fields become empty strings.
pub fn ward_properties_from_value(props: &Value) -> WardProperties {
    let empty = Map::new();
    let map = props.as_object().unwrap_or(&empty);
    WardProperties {
        district: field_str(map, DISTRICT_ALIASES).unwrap_or_default(),
        lsgd: field_str(map, LSGD_ALIASES).unwrap_or_default(),
        lsgd_type: field_str(map, LSGD_TYPE_ALIASES).unwrap_or_default(),
        ward_no: field_str(map, WARD_NO_ALIASES).unwrap_or_default(),
        ward_name: field_str(map, WARD_NAME_ALIASES).unwrap_or_default(),
    }
}

fn parse_ring(value: &Value) -> Option<LineString<f64>> {
    let pairs = value.as_array()?;
    let mut coords = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let pair = pair.as_array()?;
        if pair.len() < 2 {
            return None;
        }
        coords.push(Coord {
            x: pair[0].as_f64()?,
            y: pair[1].as_f64()?,
        });
    }
    if coords.len() < 3 {
        return None;
    }
    Some(LineString::new(coords))
}

fn parse_polygon(rings: &Value) -> Option<Polygon<f64>> {
    let rings = rings.as_array()?;
    let mut iter = rings.iter();
    let exterior = parse_ring(iter.next()?)?;
    // Interior rings are stored but never consulted by containment
    let interiors: Vec<LineString<f64>> = iter.filter_map(parse_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Parse a GeoJSON geometry object into ward geometry.
///
/// Anything that is not a well-formed Polygon or MultiPolygon comes
/// back as `Unsupported`, which the locator treats as never containing
/// a point.
pub fn ward_geometry_from_value(geometry: &Value) -> WardGeometry {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("missing");
    let coordinates = match geometry.get("coordinates") {
        Some(c) => c,
        None => return WardGeometry::Unsupported(kind.to_string()),
    };

    match kind {
        "Polygon" => match parse_polygon(coordinates) {
            Some(p) => WardGeometry::Polygon(p),
            None => WardGeometry::Unsupported(kind.to_string()),
        },
        "MultiPolygon" => {
            let polygons: Vec<Polygon<f64>> = coordinates
                .as_array()
                .map(|parts| parts.iter().filter_map(parse_polygon).collect())
                .unwrap_or_default();
            if polygons.is_empty() {
                WardGeometry::Unsupported(kind.to_string())
            } else {
                WardGeometry::MultiPolygon(MultiPolygon::new(polygons))
            }
        }
        other => WardGeometry::Unsupported(other.to_string()),
    }
}

/// Parse one GeoJSON feature. Returns `None` when the value is not an
/// object at all; a feature without usable geometry is kept (its
/// attributes still feed the metadata builder).
pub fn ward_feature_from_value(feature: &Value) -> Option<WardFeature> {
    let obj = feature.as_object()?;
    let properties = obj
        .get("properties")
        .map(ward_properties_from_value)
        .unwrap_or_else(|| ward_properties_from_value(&Value::Null));
    let geometry = obj
        .get("geometry")
        .map(ward_geometry_from_value)
        .unwrap_or_else(|| WardGeometry::Unsupported("missing".to_string()));
    Some(WardFeature {
        properties,
        geometry,
    })
}

/// Parse a boundary dataset from text.
///
/// Accepts a GeoJSON `FeatureCollection` or newline-delimited JSON with
/// one feature per line (the dataset has shipped in both forms). Bad
/// NDJSON lines are skipped with a log entry.
pub fn parse_boundary_dataset(text: &str) -> Result<Vec<WardFeature>> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if let Some(features) = value.get("features").and_then(Value::as_array) {
            let parsed: Vec<WardFeature> =
                features.iter().filter_map(ward_feature_from_value).collect();
            debug!("parsed {} features from FeatureCollection", parsed.len());
            return Ok(parsed);
        }
        return Err(WardMapError::DatasetUnreadable {
            message: "JSON value is not a FeatureCollection".to_string(),
        });
    }

    // NDJSON: one feature per line
    let mut parsed = Vec::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                if let Some(feature) = ward_feature_from_value(&value) {
                    parsed.push(feature);
                } else {
                    skipped += 1;
                }
            }
            Err(_) => skipped += 1,
        }
    }
    if parsed.is_empty() {
        return Err(WardMapError::DatasetUnreadable {
            message: "no parseable features".to_string(),
        });
    }
    if skipped > 0 {
        warn!("skipped {} unparseable NDJSON lines", skipped);
    }
    Ok(parsed)
}

// ============================================================================
// Election Rows
// ============================================================================

/// One election result row, already field-resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionRow {
    pub district: String,
    pub lsgd: String,
    /// Ward number, canonicalized from the source ward code ("G01" -> 1).
    pub ward_no: u32,
    /// Rank from the source data (1 = winner); 0 when absent.
    pub rank: u32,
    /// Front label, upper-cased and trimmed; empty never occurs ("OTH"
    /// is substituted at resolution).
    pub front: String,
    pub candidate: String,
    pub party: String,
    pub votes: u32,
}

/// Resolve one election row from a parsed record.
///
/// Rows with unresolvable district, body, or ward code are dropped
/// (`None`); every other field degrades to a default instead.
pub fn election_row_from_value(value: &Value) -> Option<ElectionRow> {
    let map = value.as_object()?;

    let district = field_str(map, DISTRICT_ALIASES)?;
    let lsgd = field_str(map, ROW_LSGD_ALIASES)?;
    let ward_no = leading_int(&field_str(map, ROW_WARD_CODE_ALIASES)?)?;

    let rank = field_str(map, &["Rank"])
        .and_then(|s| leading_int(&s))
        .unwrap_or(0);
    let front = field_str(map, &["Front"])
        .unwrap_or_else(|| "OTH".to_string())
        .trim()
        .to_uppercase();
    let candidate = field_str(map, ROW_CANDIDATE_ALIASES).unwrap_or_default();
    let party = field_str(map, ROW_PARTY_ALIASES).unwrap_or_default();
    let votes = field_str(map, ROW_VOTES_ALIASES)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);

    Some(ElectionRow {
        district,
        lsgd,
        ward_no,
        rank,
        front,
        candidate,
        party,
        votes,
    })
}

/// Resolve a batch of parsed records, dropping malformed rows silently.
pub fn election_rows_from_values(values: &[Value]) -> Vec<ElectionRow> {
    let rows: Vec<ElectionRow> = values.iter().filter_map(election_row_from_value).collect();
    let dropped = values.len() - rows.len();
    if dropped > 0 {
        debug!("dropped {} unresolvable election rows", dropped);
    }
    rows
}

/// Parse an election dataset from a JSON array of row objects.
pub fn parse_election_rows(text: &str) -> Result<Vec<ElectionRow>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| WardMapError::DatasetUnreadable {
            message: e.to_string(),
        })?;
    let values = value
        .as_array()
        .ok_or_else(|| WardMapError::DatasetUnreadable {
            message: "election dataset is not a JSON array".to_string(),
        })?;
    Ok(election_rows_from_values(values))
}

// ============================================================================
// Administrative Mapping (fallback metadata source)
// ============================================================================

/// Parse the administrative mapping dataset:
/// `{ "<district>": [ { "LocalBody": ..., "Type": ... }, ... ], ... }`.
pub fn parse_mapping_dataset(text: &str) -> Result<Vec<MappingRecord>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| WardMapError::DatasetUnreadable {
            message: e.to_string(),
        })?;
    let map = value
        .as_object()
        .ok_or_else(|| WardMapError::DatasetUnreadable {
            message: "mapping dataset is not a JSON object".to_string(),
        })?;

    let mut records = Vec::new();
    for (district, bodies) in map {
        let Some(bodies) = bodies.as_array() else {
            continue;
        };
        for body in bodies {
            let Some(body) = body.as_object() else {
                continue;
            };
            let Some(local_body) = field_str(body, &["LocalBody"]) else {
                continue;
            };
            records.push(MappingRecord {
                district: district.clone(),
                local_body,
                body_type: field_str(body, &["Type"]),
            });
        }
    }
    Ok(records)
}
