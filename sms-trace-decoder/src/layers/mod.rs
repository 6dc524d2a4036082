//! Per-layer decoding stages
//!
//! Each submodule reads one protocol layer of a tshark frame and refines the
//! Signaling Event produced by the stages before it:
//!
//! - `capture`: `frame` layer (timestamp, frame number)
//! - `tcap`: transaction framing (phase, transaction id)
//! - `map`: GSM MAP component (operation, MSISDN, IMSI, error)
//! - `sms`: GSM SMS TPDU (MO destination MSISDN)
//! - `routing`: M3UA / MTP3 point codes

pub(crate) mod capture;
pub(crate) mod map;
pub(crate) mod routing;
pub(crate) mod sms;
pub(crate) mod tcap;

use crate::types::DecodeError;
use serde_json::Value;

/// Look up `key` in an object node
///
/// tshark turns repeated keys into arrays; for those the first element is
/// searched.
pub(crate) fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => items.first().and_then(|first| child(first, key)),
        _ => None,
    }
}

/// Follow a path of keys from `node`
pub(crate) fn path<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(node, |current, key| child(current, key))
}

/// Read a scalar field as a string (first element for repeated fields)
pub(crate) fn scalar_str(node: &Value) -> Option<&str> {
    match node {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(scalar_str),
        _ => None,
    }
}

/// Parse a numeric tshark field
pub(crate) fn parse_u32(node: &Value, field: &'static str) -> Result<u32, DecodeError> {
    let parsed = match node {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => scalar_str(node).and_then(|s| s.trim().parse::<u32>().ok()),
    };

    parsed.ok_or_else(|| DecodeError::InvalidField {
        field,
        value: node.to_string(),
    })
}

/// True for nodes that carry no data (`null`, `{}`, `[]`, `""`)
pub(crate) fn is_empty(node: &Value) -> bool {
    match node {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
