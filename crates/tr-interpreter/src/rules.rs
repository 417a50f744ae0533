//! Keyword rule tables for domain selection and predicate-bit activation.
//!
//! The tables are closed and ordered; matching is substring containment on
//! the lowercased query. Multiple keywords may activate the same bit —
//! activation is idempotent, so rule order never affects the final bit set.

/// Substring signals that select the geometric domain. A three-integer
/// comma tuple in the query is the fourth signal, matched by regex in
/// `entity`.
pub const GEOMETRIC_SIGNALS: &[&str] = &["in ge", "universe\":\"ge\"", "triangle"];

/// One keyword family activating a predicate bit.
#[derive(Debug, Clone, Copy)]
pub struct BitRule {
    pub bit: u8,
    pub any_of: &'static [&'static str],
}

/// Fractional-domain bit rules. Bit 2 additionally has a compound rule
/// ("denominator"-word plus a "6") in `denominator_mentions_six`.
pub const FRACTIONAL_BIT_RULES: &[BitRule] = &[
    BitRule {
        bit: 0,
        any_of: &["positive"],
    },
    BitRule {
        bit: 1,
        any_of: &["integer"],
    },
    BitRule {
        bit: 2,
        any_of: &["den<=6", "den ≤ 6", "den≤6", "<= 6", "≤ 6"],
    },
    BitRule {
        bit: 3,
        any_of: &["even", "num_even"],
    },
    BitRule {
        bit: 4,
        any_of: &["den_mod3", "den mod 3", "den%3", "den % 3"],
    },
    BitRule {
        bit: 5,
        any_of: &["proper"],
    },
    BitRule {
        bit: 6,
        any_of: &["num_abs<=5", "num_abs ≤ 5", "abs<=5", "abs ≤ 5"],
    },
];

/// Geometric-domain bit rules. Bit 0 additionally has a compound rule
/// ("perimeter"-word plus a "20" bound) in `perimeter_bounded_by_twenty`.
pub const GEOMETRIC_BIT_RULES: &[BitRule] = &[
    BitRule {
        bit: 0,
        any_of: &["perim<=20", "perim ≤ 20"],
    },
    BitRule {
        bit: 3,
        any_of: &["primitive"],
    },
    BitRule {
        bit: 4,
        any_of: &["right"],
    },
];

/// Check if the text contains any of the given patterns.
pub fn matches_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// Compound fractional rule for bit 2: a denominator word together with a 6.
pub fn denominator_mentions_six(lower: &str) -> bool {
    matches_any(lower, &["denominator", "den<=", "den <= ", "den≤"]) && lower.contains('6')
}

/// Compound geometric rule for bit 0: a perimeter word together with a
/// bound of 20.
pub fn perimeter_bounded_by_twenty(lower: &str) -> bool {
    matches_any(lower, &["perimeter", "perim"]) && matches_any(lower, &["<= 20", "≤ 20", "perim<=20"])
}
