//! Identity normalization of administrative names.
//!
//! The three source datasets (ward boundaries, administrative metadata,
//! election results) spell the same district and local-body names
//! differently: varying case, stray whitespace, historical spellings,
//! and administrative-type suffixes that one dataset carries and
//! another drops. `normalize_name` folds all of those away so names can
//! be compared for identity.
//!
//! This is strictly a comparison key: display strings always use the
//! dataset's own spelling, never the normalized form.

/// Administrative-type suffixes stripped from local-body names.
///
/// Checked in order; the two-word forms come first so "GRAMA PANCHAYAT"
/// is removed whole rather than leaving a dangling "GRAMA".
const TYPE_SUFFIXES: [&str; 6] = [
    "GRAMA PANCHAYAT",
    "GRAMA PANCHAYATH",
    "PANCHAYAT",
    "PANCHAYATH",
    "MUNICIPALITY",
    "CORPORATION",
];

/// Canonicalize an administrative name for cross-dataset comparison.
///
/// Trims, uppercases, strips any trailing administrative-type suffix,
/// then folds known historical/alternate spellings. Empty input yields
/// an empty string. Idempotent.
///
/// # Example
/// ```
/// use ward_mapper::normalize_name;
/// assert_eq!(normalize_name("Ala Grama Panchayat"), normalize_name("ALA"));
/// assert_eq!(normalize_name(""), "");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let mut s = raw.trim().to_uppercase();
    if s.is_empty() {
        return s;
    }

    for suffix in TYPE_SUFFIXES {
        if let Some(stripped) = s.strip_suffix(suffix) {
            if stripped.ends_with(' ') {
                s = stripped.trim_end().to_string();
            }
        }
    }

    // Historical / alternate spellings seen across the datasets.
    // Applied after suffix stripping so suffixed variants fold too.
    match s.as_str() {
        "KASARAGOD" => "KASARGOD".to_string(),
        "THIRUVANATHAPURAM" => "THIRUVANANTHAPURAM".to_string(),
        _ => s,
    }
}

/// Compare two names for identity under normalization.
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}
