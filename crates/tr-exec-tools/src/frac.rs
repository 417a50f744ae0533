//! Reduced fractions and the certified fractional universe.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A fraction in lowest terms. Invariant: `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frac {
    pub num: i32,
    pub den: i32,
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    if a == 0 { 1 } else { a }
}

impl Frac {
    /// Reduce `num/den` to lowest terms with a positive denominator.
    /// Returns None when `den` is 0.
    pub fn new_reduced(num: i32, den: i32) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let (mut n, mut d) = (num, den);
        if d < 0 {
            n = -n;
            d = -d;
        }
        let g = gcd(n, d);
        Some(Self {
            num: n / g,
            den: d / g,
        })
    }

    /// Parse `"a/b"` into a reduced fraction.
    pub fn parse(s: &str) -> Option<Self> {
        let (num, den) = s.trim().split_once('/')?;
        Self::new_reduced(num.trim().parse().ok()?, den.trim().parse().ok()?)
    }

    /// Fixed 8-byte big-endian encoding used for set digests.
    pub fn canonical_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0..4].copy_from_slice(&self.num.to_be_bytes());
        out[4..8].copy_from_slice(&self.den.to_be_bytes());
        out
    }

    /// Exact numeric comparison via cross-multiplication.
    pub fn cmp_value(&self, other: &Frac) -> Ordering {
        let lhs = i64::from(self.num) * i64::from(other.den);
        let rhs = i64::from(other.num) * i64::from(self.den);
        lhs.cmp(&rhs)
    }

    pub fn abs_num(&self) -> i32 {
        self.num.abs()
    }

    /// Exact |self − target| as an unreduced (numerator, denominator) pair.
    pub fn abs_distance(&self, target: &Frac) -> (i64, i64) {
        let a = i64::from(target.num);
        let b = i64::from(target.den);
        let c = i64::from(self.num);
        let d = i64::from(self.den);
        ((a * d - b * c).abs(), b * d)
    }
}

impl std::fmt::Display for Frac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Canonical total order used for sets, digest leaves, and witness
/// tie-breaks: numeric value, then |numerator|, then denominator, then sign.
pub fn canonical_cmp(a: &Frac, b: &Frac) -> Ordering {
    a.cmp_value(b)
        .then_with(|| a.abs_num().cmp(&b.abs_num()))
        .then_with(|| a.den.cmp(&b.den))
        .then_with(|| a.num.cmp(&b.num))
}

/// Compare two exact distances returned by `abs_distance`.
pub fn dist_lt(x: (i64, i64), y: (i64, i64)) -> bool {
    x.0 * y.1 < y.0 * x.1
}

/// Build the certified universe exactly: denominators 1..=200, numerators
/// −200..=200, reduced to unique fractions, canonically sorted.
pub fn build_universe() -> Vec<Frac> {
    let mut set: BTreeSet<(i32, i32)> = BTreeSet::new();
    for den in 1..=200 {
        for num in -200..=200 {
            // den ranges over positive values only, so reduction never fails
            if let Some(f) = Frac::new_reduced(num, den) {
                set.insert((f.num, f.den));
            }
        }
    }
    let mut universe: Vec<Frac> = set
        .into_iter()
        .map(|(num, den)| Frac { num, den })
        .collect();
    universe.sort_by(canonical_cmp);
    universe
}
