//! Per-domain bit legends.
//!
//! Bit indices are stable and domain-scoped: a bit's meaning never changes
//! across requests, and new predicates may only be appended.

use crate::domain::Domain;

/// One named predicate at a fixed bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPredicate {
    pub bit: u8,
    pub name: &'static str,
    pub meaning: &'static str,
}

pub const FRACTIONAL_LEGEND: [BitPredicate; 7] = [
    BitPredicate {
        bit: 0,
        name: "positive",
        meaning: "numerator is strictly positive",
    },
    BitPredicate {
        bit: 1,
        name: "rat_int",
        meaning: "element is an integer-valued rational",
    },
    BitPredicate {
        bit: 2,
        name: "den<=6",
        meaning: "denominator is at most 6",
    },
    BitPredicate {
        bit: 3,
        name: "num_even",
        meaning: "numerator is even",
    },
    BitPredicate {
        bit: 4,
        name: "den_mod3",
        meaning: "denominator is divisible by 3",
    },
    BitPredicate {
        bit: 5,
        name: "proper",
        meaning: "|numerator| is less than the denominator",
    },
    BitPredicate {
        bit: 6,
        name: "num_abs<=5",
        meaning: "|numerator| is at most 5",
    },
];

pub const GEOMETRIC_LEGEND: [BitPredicate; 7] = [
    BitPredicate {
        bit: 0,
        name: "perim<=20",
        meaning: "perimeter is at most 20",
    },
    BitPredicate {
        bit: 1,
        name: "isosceles",
        meaning: "at least two sides are equal",
    },
    BitPredicate {
        bit: 2,
        name: "equilateral",
        meaning: "all three sides are equal",
    },
    BitPredicate {
        bit: 3,
        name: "primitive",
        meaning: "gcd of the three sides is 1",
    },
    BitPredicate {
        bit: 4,
        name: "right",
        meaning: "a² + b² = c²",
    },
    BitPredicate {
        bit: 5,
        name: "acute",
        meaning: "a² + b² > c²",
    },
    BitPredicate {
        bit: 6,
        name: "obtuse",
        meaning: "a² + b² < c²",
    },
];

/// The legend for a domain.
pub fn legend(domain: Domain) -> &'static [BitPredicate; 7] {
    match domain {
        Domain::Fractional => &FRACTIONAL_LEGEND,
        Domain::Geometric => &GEOMETRIC_LEGEND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_indices_match_positions() {
        for (i, p) in FRACTIONAL_LEGEND.iter().enumerate() {
            assert_eq!(p.bit as usize, i);
        }
        for (i, p) in GEOMETRIC_LEGEND.iter().enumerate() {
            assert_eq!(p.bit as usize, i);
        }
    }

    #[test]
    fn legend_is_domain_scoped() {
        assert_eq!(legend(Domain::Fractional)[2].name, "den<=6");
        assert_eq!(legend(Domain::Geometric)[4].name, "right");
    }
}
