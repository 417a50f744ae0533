//! Entity and presentation-parameter extraction.

use regex::Regex;
use std::sync::LazyLock;

// <int>/<int>, signs allowed, internal whitespace tolerated
static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+)\s*/\s*(-?\d+)").unwrap());

// <int>,<int>,<int> — the geometric tuple signal doubles as the entity
static TRIANGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\b").unwrap());

// "return up to N" / "up to N" / "max_items N" / "max items N"
static MAX_ITEMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:return\s+up\s+to|up\s+to|max[_ ]items)\s+(\d+)\b").unwrap());

/// First fraction pattern in the query, normalized to `num/den`.
pub fn extract_fraction(query: &str) -> Option<String> {
    let caps = FRACTION_RE.captures(query)?;
    Some(format!("{}/{}", &caps[1], &caps[2]))
}

/// First triangle pattern in the query, normalized to `a,b,c`.
pub fn extract_triangle(query: &str) -> Option<String> {
    let caps = TRIANGLE_RE.captures(query)?;
    Some(format!("{},{},{}", &caps[1], &caps[2], &caps[3]))
}

/// True if the query contains a three-integer comma tuple.
pub fn has_triangle_tuple(query: &str) -> bool {
    TRIANGLE_RE.is_match(query)
}

/// Result-cap hint, unclamped. The interpreter clamps to [1, 200].
pub fn extract_max_items(lower: &str) -> Option<usize> {
    let caps = MAX_ITEMS_RE.captures(lower)?;
    caps[1].parse().ok()
}
