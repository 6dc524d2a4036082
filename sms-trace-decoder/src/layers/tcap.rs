//! `tcap` layer: dialogue phase and transaction id

use super::{child, scalar_str};
use crate::codes::TransactionPhase;
use crate::types::DecodeError;
use serde_json::{Map, Value};

const LAYER: &str = "tcap";
const TID: &str = "tcap.tid";

/// The three mutually exclusive framing elements
const FRAMING: [(&str, TransactionPhase); 3] = [
    ("tcap.begin_element", TransactionPhase::Begin),
    ("tcap.continue_element", TransactionPhase::Continue),
    ("tcap.end_element", TransactionPhase::End),
];

/// Read the transaction framing of a frame
pub(crate) fn framing(layers: &Map<String, Value>) -> Result<(TransactionPhase, String), DecodeError> {
    let tcap = layers.get(LAYER).ok_or(DecodeError::MissingTransaction)?;

    let (phase, element) = FRAMING
        .iter()
        .find_map(|(key, phase)| child(tcap, key).map(|element| (*phase, element)))
        .ok_or(DecodeError::MissingTransaction)?;

    let tid = child(element, TID)
        .and_then(scalar_str)
        .map(str::trim)
        .filter(|tid| !tid.is_empty())
        .ok_or(DecodeError::MissingTransaction)?;

    Ok((phase, tid.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layers(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_each_phase() {
        for (key, phase) in FRAMING {
            let mut tcap = Map::new();
            tcap.insert(key.to_string(), json!({"tcap.tid": "09:eb:27:bb"}));
            let mut frame = Map::new();
            frame.insert("tcap".to_string(), Value::Object(tcap));

            assert_eq!(framing(&frame), Ok((phase, "09:eb:27:bb".to_string())));
        }
    }

    #[test]
    fn test_repeated_tid_takes_first() {
        let frame = layers(json!({
            "tcap": {"tcap.continue_element": {"tcap.tid": ["47:6b:c9:c3", "11:22:33:44"]}}
        }));
        assert_eq!(framing(&frame).unwrap().1, "47:6b:c9:c3");
    }

    #[test]
    fn test_missing_framing() {
        assert_eq!(framing(&layers(json!({}))), Err(DecodeError::MissingTransaction));
        assert_eq!(
            framing(&layers(json!({"tcap": {"tcap.abort_element": {}}}))),
            Err(DecodeError::MissingTransaction)
        );
        assert_eq!(
            framing(&layers(json!({"tcap": {"tcap.begin_element": {"tcap.tid": ""}}}))),
            Err(DecodeError::MissingTransaction)
        );
    }
}
