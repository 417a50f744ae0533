//! Query → interpretation → candidate assembly.

use std::collections::BTreeSet;

use tr_protocol::{CandidateSet, Domain, Metric, Op, Trace};

use crate::entity;
use crate::rules;

/// Default result cap for the geometric `RETURN_SET`.
const DEFAULT_MAX_ITEMS: usize = 20;
const MAX_ITEMS_FLOOR: usize = 1;
const MAX_ITEMS_CEIL: usize = 200;

/// What the interpreter read out of a query. Everything downstream —
/// candidate assembly included — is a pure function of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub domain: Domain,
    /// Extracted or default entity in canonical spelling.
    pub entity: String,
    /// Activated predicate bits, ascending. A set, so keyword order can
    /// never affect the outcome.
    pub bits: BTreeSet<u8>,
    /// Result cap, clamped to [1, 200]. Rendered in geometric traces only.
    pub max_items: usize,
    /// Witness-inclusion flag. Rendered in geometric traces only.
    pub include_witness: bool,
}

/// Interpret a query. Total: every input, the empty string included, yields
/// a well-formed interpretation with the domain default entity when no
/// pattern is found.
pub fn interpret(query: &str) -> Interpretation {
    let lower = query.to_lowercase();

    // Priority rule, not a parser: the first geometric signal wins,
    // otherwise the domain is fractional.
    let domain = if rules::matches_any(&lower, rules::GEOMETRIC_SIGNALS)
        || entity::has_triangle_tuple(query)
    {
        Domain::Geometric
    } else {
        Domain::Fractional
    };

    let entity = match domain {
        Domain::Fractional => entity::extract_fraction(query),
        Domain::Geometric => entity::extract_triangle(query),
    }
    .unwrap_or_else(|| domain.default_entity().to_string());

    let mut bits = BTreeSet::new();
    let table = match domain {
        Domain::Fractional => rules::FRACTIONAL_BIT_RULES,
        Domain::Geometric => rules::GEOMETRIC_BIT_RULES,
    };
    for rule in table {
        if rules::matches_any(&lower, rule.any_of) {
            bits.insert(rule.bit);
        }
    }
    match domain {
        Domain::Fractional => {
            if rules::denominator_mentions_six(&lower) {
                bits.insert(2);
            }
        }
        Domain::Geometric => {
            if rules::perimeter_bounded_by_twenty(&lower) {
                bits.insert(0);
            }
        }
    }

    let max_items = entity::extract_max_items(&lower)
        .unwrap_or(DEFAULT_MAX_ITEMS)
        .clamp(MAX_ITEMS_FLOOR, MAX_ITEMS_CEIL);
    let include_witness =
        lower.contains("include witness") || lower.contains("include_witness");

    let interpretation = Interpretation {
        domain,
        entity,
        bits,
        max_items,
        include_witness,
    };
    tracing::debug!(
        domain = %interpretation.domain,
        entity = %interpretation.entity,
        bits = ?interpretation.bits,
        "query interpreted"
    );
    interpretation
}

impl Interpretation {
    /// Assemble the fixed skeleton with the bit operations in the given
    /// order: leading structural op, bit ops, witness, trailing return.
    fn skeleton(&self, bit_order: impl Iterator<Item = u8>) -> Trace {
        let mut ops = Vec::with_capacity(self.bits.len() + 3);
        match self.domain {
            Domain::Fractional => {
                ops.push(Op::Load {
                    elem: self.entity.clone(),
                });
                for bit in bit_order {
                    ops.push(Op::MaskBit { bit, val: 1 });
                }
                ops.push(Op::WitnessNearest {
                    target: self.entity.clone(),
                    metric: None,
                });
                ops.push(Op::ReturnSet {
                    max_items: None,
                    include_witness: None,
                });
            }
            Domain::Geometric => {
                ops.push(Op::StartElem {
                    elem: self.entity.clone(),
                });
                for bit in bit_order {
                    ops.push(Op::SetBit { i: bit, b: 1 });
                }
                ops.push(Op::WitnessNearest {
                    target: self.entity.clone(),
                    metric: Some(Metric::AbsDiff),
                });
                ops.push(Op::ReturnSet {
                    max_items: Some(self.max_items),
                    include_witness: Some(self.include_witness),
                });
            }
        }
        Trace::new(ops)
    }

    /// The admissible serializations: bit operations ascending (candidate A)
    /// and descending (candidate B). Bit-setting order is semantically
    /// commutative, so both serializations denote the same trace; with zero
    /// or one active bits the pair collapses to a single member.
    pub fn candidates(&self) -> CandidateSet {
        let ascending = self.skeleton(self.bits.iter().copied());
        let descending = self.skeleton(self.bits.iter().rev().copied());
        CandidateSet::from_pair(ascending, descending)
    }
}

/// Interpret a query and assemble its candidate set in one step.
pub fn candidates(query: &str) -> CandidateSet {
    interpret(query).candidates()
}
