//! Trace operations and their canonical text form.
//!
//! The canonical rendering is the wire language the decoder constrains the
//! model to: one operation per line, fixed parameter order, no extra
//! whitespace. `Display` and `FromStr` round-trip that form exactly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProtocolError;

/// Witness distance metric. `ABS_DIFF` is the only metric the grammar
/// admits in this version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "ABS_DIFF")]
    AbsDiff,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AbsDiff => "ABS_DIFF",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trace operation. Immutable once constructed.
///
/// Fractional traces use `LOAD`/`MASK_BIT` and render the witness as
/// `target=`; geometric traces use `START_ELEM`/`SET_BIT` and render the
/// witness as `target_elem=` with an explicit metric plus a bounded
/// `RETURN_SET`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Op {
    #[serde(rename = "LOAD")]
    Load { elem: String },

    #[serde(rename = "START_ELEM")]
    StartElem { elem: String },

    #[serde(rename = "MASK_BIT")]
    MaskBit { bit: u8, val: u8 },

    #[serde(rename = "SET_BIT")]
    SetBit { i: u8, b: u8 },

    #[serde(rename = "WITNESS_NEAREST")]
    WitnessNearest {
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metric: Option<Metric>,
    },

    #[serde(rename = "RETURN_SET")]
    ReturnSet {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        include_witness: Option<bool>,
    },
}

impl Op {
    /// Name of the operation as it appears in the canonical text form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD",
            Self::StartElem { .. } => "START_ELEM",
            Self::MaskBit { .. } => "MASK_BIT",
            Self::SetBit { .. } => "SET_BIT",
            Self::WitnessNearest { .. } => "WITNESS_NEAREST",
            Self::ReturnSet { .. } => "RETURN_SET",
        }
    }

    /// True for the bit-setting operations whose relative order is
    /// semantically commutative.
    pub fn is_bit_op(&self) -> bool {
        matches!(self, Self::MaskBit { .. } | Self::SetBit { .. })
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load { elem } => write!(f, "LOAD {elem}"),
            Self::StartElem { elem } => write!(f, "START_ELEM {elem}"),
            Self::MaskBit { bit, val } => write!(f, "MASK_BIT bit={bit} val={val}"),
            Self::SetBit { i, b } => write!(f, "SET_BIT i={i} b={b}"),
            Self::WitnessNearest { target, metric } => match metric {
                Some(m) => write!(f, "WITNESS_NEAREST target_elem={target} metric={m}"),
                None => write!(f, "WITNESS_NEAREST target={target}"),
            },
            Self::ReturnSet {
                max_items,
                include_witness,
            } => {
                write!(f, "RETURN_SET")?;
                if let Some(n) = max_items {
                    write!(f, " max_items={n}")?;
                }
                if let Some(w) = include_witness {
                    write!(f, " include_witness={w}")?;
                }
                Ok(())
            }
        }
    }
}

/// Split a `key=value` token, returning the value when the key matches.
fn kv<'a>(token: &'a str, key: &str) -> Option<&'a str> {
    token
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
}

fn parse_num<T: FromStr>(token: &str, key: &str, line: &str) -> Result<T, ProtocolError> {
    kv(token, key)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ProtocolError::Malformed(line.to_string()))
}

impl FromStr for Op {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(ProtocolError::EmptyTrace)?;
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("LOAD", [elem]) => Ok(Self::Load {
                elem: (*elem).to_string(),
            }),
            ("START_ELEM", [elem]) => Ok(Self::StartElem {
                elem: (*elem).to_string(),
            }),
            ("MASK_BIT", [bit, val]) => Ok(Self::MaskBit {
                bit: parse_num(bit, "bit", line)?,
                val: parse_num(val, "val", line)?,
            }),
            ("SET_BIT", [i, b]) => Ok(Self::SetBit {
                i: parse_num(i, "i", line)?,
                b: parse_num(b, "b", line)?,
            }),
            ("WITNESS_NEAREST", [target]) => {
                let target = kv(target, "target")
                    .ok_or_else(|| ProtocolError::Malformed(line.to_string()))?;
                Ok(Self::WitnessNearest {
                    target: target.to_string(),
                    metric: None,
                })
            }
            ("WITNESS_NEAREST", [target, metric]) => {
                let target = kv(target, "target_elem")
                    .ok_or_else(|| ProtocolError::Malformed(line.to_string()))?;
                let metric = match kv(metric, "metric") {
                    Some("ABS_DIFF") => Metric::AbsDiff,
                    _ => return Err(ProtocolError::Malformed(line.to_string())),
                };
                Ok(Self::WitnessNearest {
                    target: target.to_string(),
                    metric: Some(metric),
                })
            }
            ("RETURN_SET", []) => Ok(Self::ReturnSet {
                max_items: None,
                include_witness: None,
            }),
            ("RETURN_SET", [max_items, include_witness]) => Ok(Self::ReturnSet {
                max_items: Some(parse_num(max_items, "max_items", line)?),
                include_witness: Some(parse_num(include_witness, "include_witness", line)?),
            }),
            ("LOAD" | "START_ELEM" | "MASK_BIT" | "SET_BIT" | "WITNESS_NEAREST" | "RETURN_SET", _) => {
                Err(ProtocolError::Malformed(line.to_string()))
            }
            _ => Err(ProtocolError::UnknownOp(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fractional_ops() {
        assert_eq!(
            Op::Load {
                elem: "7/200".into()
            }
            .to_string(),
            "LOAD 7/200"
        );
        assert_eq!(
            Op::MaskBit { bit: 2, val: 1 }.to_string(),
            "MASK_BIT bit=2 val=1"
        );
        assert_eq!(
            Op::WitnessNearest {
                target: "7/200".into(),
                metric: None
            }
            .to_string(),
            "WITNESS_NEAREST target=7/200"
        );
        assert_eq!(
            Op::ReturnSet {
                max_items: None,
                include_witness: None
            }
            .to_string(),
            "RETURN_SET"
        );
    }

    #[test]
    fn render_geometric_ops() {
        assert_eq!(
            Op::StartElem {
                elem: "5,12,13".into()
            }
            .to_string(),
            "START_ELEM 5,12,13"
        );
        assert_eq!(Op::SetBit { i: 4, b: 1 }.to_string(), "SET_BIT i=4 b=1");
        assert_eq!(
            Op::WitnessNearest {
                target: "5,12,13".into(),
                metric: Some(Metric::AbsDiff)
            }
            .to_string(),
            "WITNESS_NEAREST target_elem=5,12,13 metric=ABS_DIFF"
        );
        assert_eq!(
            Op::ReturnSet {
                max_items: Some(20),
                include_witness: Some(false)
            }
            .to_string(),
            "RETURN_SET max_items=20 include_witness=false"
        );
    }

    #[test]
    fn parse_roundtrips_canonical_lines() {
        let lines = [
            "LOAD 7/200",
            "MASK_BIT bit=2 val=1",
            "WITNESS_NEAREST target=7/200",
            "RETURN_SET",
            "START_ELEM 5,12,13",
            "SET_BIT i=4 b=1",
            "WITNESS_NEAREST target_elem=5,12,13 metric=ABS_DIFF",
            "RETURN_SET max_items=20 include_witness=false",
        ];
        for line in lines {
            let op: Op = line.parse().unwrap();
            assert_eq!(op.to_string(), line);
        }
    }

    #[test]
    fn parse_rejects_unknown_op() {
        let err = "FROBNICATE x=1".parse::<Op>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOp(_)));
    }

    #[test]
    fn parse_rejects_malformed_args() {
        assert!("MASK_BIT bit=2".parse::<Op>().is_err());
        assert!("SET_BIT i=x b=1".parse::<Op>().is_err());
        assert!("WITNESS_NEAREST elem=1/2".parse::<Op>().is_err());
        assert!(
            "WITNESS_NEAREST target_elem=5,12,13 metric=COSINE"
                .parse::<Op>()
                .is_err()
        );
    }

    #[test]
    fn serde_tagged_form_matches_op_names() {
        let op = Op::SetBit { i: 4, b: 1 };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "SET_BIT");
        assert_eq!(json["i"], 4);

        let back: Op = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn serde_skips_absent_presentation_fields() {
        let op = Op::ReturnSet {
            max_items: None,
            include_witness: None,
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(!json.contains("max_items"));
        assert!(!json.contains("include_witness"));
    }
}
