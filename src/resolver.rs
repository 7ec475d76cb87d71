//! Fuzzy cross-dataset lookup.
//!
//! Boundary features and election rows spell their keys independently,
//! so lookups match in priority order: exact on the normalized name,
//! then substring containment in either direction on the raw names,
//! and for ward numbers integer-value equality ("01" matches "1").
//! First match in iteration order wins. A miss is `None`, which callers
//! render as an explicit "data missing" state — never an error.

use serde::{Deserialize, Serialize};

use crate::elections::{BodyResults, DistrictResults, ElectionResults, Front, WardResult};
use crate::ingest::leading_int;
use crate::normalize::normalize_name;

fn find_by_name<'a, T>(items: &'a [T], name: &str, item_name: impl Fn(&T) -> &str) -> Option<&'a T> {
    let key = normalize_name(name);
    if let Some(found) = items.iter().find(|item| normalize_name(item_name(item)) == key) {
        return Some(found);
    }
    // Substring fallback works on the raw spellings
    items
        .iter()
        .find(|item| item_name(item).contains(name) || name.contains(item_name(item)))
}

/// Locate a district's results by fuzzy name match.
pub fn find_district<'a>(results: &'a ElectionResults, name: &str) -> Option<&'a DistrictResults> {
    find_by_name(&results.districts, name, |d| d.name.as_str())
}

/// Locate a body's results within a district by fuzzy name match.
pub fn find_body<'a>(district: &'a DistrictResults, name: &str) -> Option<&'a BodyResults> {
    find_by_name(&district.bodies, name, |b| b.name.as_str())
}

/// Locate a ward by integer value of its code ("G01" and "01" both
/// match ward 1).
pub fn find_ward<'a>(body: &'a BodyResults, ward_no: &str) -> Option<&'a WardResult> {
    let number = leading_int(ward_no)?;
    body.ward(number)
}

/// Resolve a ward's election result from independently-spelled keys.
///
/// Returns `None` when any level misses after fuzzy matching.
///
/// # Example
/// ```
/// use ward_mapper::{aggregate_elections, resolve_ward, ElectionRow};
///
/// let rows = vec![ElectionRow {
///     district: "Palakkad".to_string(),
///     lsgd: "Ala".to_string(),
///     ward_no: 1,
///     rank: 1,
///     front: "LDF".to_string(),
///     candidate: "A. Kumar".to_string(),
///     party: "CPI(M)".to_string(),
///     votes: 812,
/// }];
/// let results = aggregate_elections(&rows);
///
/// // Boundary data spells the body with its type suffix and a
/// // letter-prefixed ward code
/// let ward = resolve_ward(&results, "Palakkad", "Ala Grama Panchayat", "G01");
/// assert!(ward.is_some());
/// ```
pub fn resolve_ward<'a>(
    results: &'a ElectionResults,
    district: &str,
    lsgd: &str,
    ward_no: &str,
) -> Option<&'a WardResult> {
    let district = find_district(results, district)?;
    let body = find_body(district, lsgd)?;
    find_ward(body, ward_no)
}

/// Per-front seat summary for one body's legend.
///
/// IND is broken out as its own display bucket; tied wards and every
/// other minor front fold into OTH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LegendStats {
    pub nda: u32,
    pub udf: u32,
    pub ldf: u32,
    pub ind: u32,
    pub oth: u32,
}

/// Seat summary over one body's ward winners, `None` when the body is
/// absent from the election data (the legend hides itself).
pub fn body_legend(results: &ElectionResults, district: &str, lsgd: &str) -> Option<LegendStats> {
    let district = find_district(results, district)?;
    let body = find_body(district, lsgd)?;

    let mut stats = LegendStats::default();
    for ward in &body.wards {
        let Some(winner) = &ward.winner else {
            continue;
        };
        match winner.front {
            Front::Nda => stats.nda += 1,
            Front::Udf => stats.udf += 1,
            Front::Ldf => stats.ldf += 1,
            Front::Ind => stats.ind += 1,
            _ => stats.oth += 1,
        }
    }
    Some(stats)
}
