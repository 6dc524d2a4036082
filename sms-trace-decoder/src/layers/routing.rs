//! Link routing layer: originating / destination point codes
//!
//! SIGTRAN captures carry the point codes in the M3UA protocol data block;
//! classic SS7 captures carry them in the MTP3 routing label.

use super::{child, parse_u32};
use crate::schema::{normalize_keys, PROTOCOL_DATA, ROUTING_REWRITES};
use crate::types::{DecodeError, PointCode, SignalingEvent};
use serde_json::{Map, Value};

const M3UA: &str = "m3ua";
const M3UA_OPC: &str = "m3ua.protocol_data_opc";
const M3UA_DPC: &str = "m3ua.protocol_data_dpc";
const MTP3: &str = "mtp3";
const MTP3_OPC: &str = "mtp3.opc";
const MTP3_DPC: &str = "mtp3.dpc";

/// Refine an event with its routing point codes
pub(crate) fn refine(layers: &Map<String, Value>, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    if let Some(m3ua) = layers.get(M3UA) {
        let protocol_data = match m3ua {
            Value::Object(tree) => normalize_keys(tree, ROUTING_REWRITES).remove(PROTOCOL_DATA),
            _ => None,
        };

        return match protocol_data {
            Some(data) => {
                let origin = point_code(&data, M3UA_OPC)?;
                let destination = point_code(&data, M3UA_DPC)?;
                Ok(event.with_point_codes(origin, destination))
            }
            None => {
                log::debug!("{}: M3UA layer without protocol data", event.transaction_id);
                Ok(event)
            }
        };
    }

    if let Some(mtp3) = layers.get(MTP3) {
        let origin = point_code(mtp3, MTP3_OPC)?;
        let destination = point_code(mtp3, MTP3_DPC)?;
        return Ok(event.with_point_codes(origin, destination));
    }

    Err(DecodeError::MissingRouting)
}

fn point_code(tree: &Value, field: &'static str) -> Result<Option<PointCode>, DecodeError> {
    child(tree, field)
        .map(|raw| parse_u32(raw, field).map(PointCode))
        .transpose()
}
