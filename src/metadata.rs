//! District -> Type -> Local Body hierarchy used by the selector UI.
//!
//! Built once per dataset load from the ward boundary features, or from
//! the administrative mapping dataset when the boundary dataset is
//! unavailable. Read-only afterward.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::WardFeature;

/// One record of the administrative mapping (fallback) dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MappingRecord {
    pub district: String,
    pub local_body: String,
    /// Administrative type; inferred from the body name when absent.
    pub body_type: Option<String>,
}

/// Local bodies of one administrative type, lexically sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TypeBodies {
    pub name: String,
    pub bodies: Vec<String>,
}

/// Administrative types of one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct DistrictTypes {
    pub name: String,
    pub types: Vec<TypeBodies>,
}

/// The full District -> Type -> Local Body hierarchy.
///
/// Invariant: every (district, type, body) triple corresponds to at
/// least one ward; empty bodies, types, and districts are pruned.
/// Districts, types, and bodies are lexically sorted, so the result is
/// independent of the order features arrive in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct AdminHierarchy {
    pub districts: Vec<DistrictTypes>,
}

/// Title-case a type label for display grouping ("GRAMA PANCHAYAT" ->
/// "Grama Panchayat"). Display normalization only — never use this for
/// identity comparison (that is [`crate::normalize_name`]).
pub fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Infer an administrative type from a local-body name, for mapping
/// records that carry none.
fn infer_body_type(local_body: &str) -> &'static str {
    if local_body.contains("Corporation") {
        "Corporation"
    } else if local_body.contains("Municipality") {
        "Municipality"
    } else if local_body.contains("District Panchayat") {
        "District Panchayat"
    } else if local_body.contains("Block Panchayat") {
        "Block Panchayat"
    } else {
        "Grama Panchayat"
    }
}

impl AdminHierarchy {
    /// Build the hierarchy from ward boundary features.
    ///
    /// Features missing district, body, or type are skipped. A ward
    /// counter per (district, type, body) gates emission, so a triple
    /// only appears when at least one ward backs it.
    pub fn from_features(features: &[WardFeature]) -> Self {
        let mut counts: BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>> =
            BTreeMap::new();

        for feature in features {
            let p = &feature.properties;
            if p.district.is_empty() || p.lsgd.is_empty() || p.lsgd_type.is_empty() {
                continue;
            }
            let type_label = title_case(&p.lsgd_type);
            *counts
                .entry(p.district.clone())
                .or_default()
                .entry(type_label)
                .or_default()
                .entry(p.lsgd.clone())
                .or_insert(0) += 1;
        }

        Self::from_counts(counts)
    }

    /// Build the hierarchy from the administrative mapping dataset.
    ///
    /// Records with no type infer one from the body name. Duplicates
    /// collapse; output ordering matches [`from_features`].
    ///
    /// [`from_features`]: AdminHierarchy::from_features
    pub fn from_mapping(records: &[MappingRecord]) -> Self {
        let mut counts: BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>> =
            BTreeMap::new();

        for record in records {
            if record.district.is_empty() || record.local_body.is_empty() {
                continue;
            }
            let type_label = match record.body_type.as_deref() {
                Some(t) if !t.trim().is_empty() => title_case(t.trim()),
                _ => infer_body_type(&record.local_body).to_string(),
            };
            *counts
                .entry(record.district.clone())
                .or_default()
                .entry(type_label)
                .or_default()
                .entry(record.local_body.clone())
                .or_insert(0) += 1;
        }

        Self::from_counts(counts)
    }

    fn from_counts(counts: BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>>) -> Self {
        let mut districts = Vec::new();
        for (district, types) in counts {
            let mut out_types = Vec::new();
            for (type_label, bodies) in types {
                let bodies: Vec<String> = bodies
                    .into_iter()
                    .filter(|(_, count)| *count > 0)
                    .map(|(body, _)| body)
                    .collect();
                if !bodies.is_empty() {
                    out_types.push(TypeBodies {
                        name: type_label,
                        bodies,
                    });
                }
            }
            if !out_types.is_empty() {
                districts.push(DistrictTypes {
                    name: district,
                    types: out_types,
                });
            }
        }
        Self { districts }
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// District names in presentation order.
    pub fn district_names(&self) -> Vec<&str> {
        self.districts.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn district(&self, name: &str) -> Option<&DistrictTypes> {
        self.districts.iter().find(|d| d.name == name)
    }

    /// Type labels available in a district.
    pub fn types_of(&self, district: &str) -> Vec<&str> {
        self.district(district)
            .map(|d| d.types.iter().map(|t| t.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Local bodies of the given type within a district.
    pub fn bodies_of(&self, district: &str, type_label: &str) -> Vec<&str> {
        self.district(district)
            .and_then(|d| d.types.iter().find(|t| t.name == type_label))
            .map(|t| t.bodies.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
