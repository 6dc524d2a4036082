//! `gsm_sms` layer: SMS transport refinement
//!
//! Only SMS-SUBMIT (mobile originated) TPDUs change the event: their
//! TP-Destination-Address is the MSISDN the message is sent to.

use super::{child, scalar_str};
use crate::codes::MessageTypeIndicator;
use crate::schema::{normalize_keys, SMS_TRANSPORT_REWRITES, TP_DESTINATION_ADDRESS};
use crate::types::{DecodeError, SignalingEvent};
use serde_json::Value;

pub(crate) const LAYER: &str = "gsm_sms";
const TP_MTI: &str = "gsm_sms.tp-mti";
const TP_DA: &str = "gsm_sms.tp-da";

/// Refine an event with the SMS transport layer
///
/// Takes the event by reference: every error from this stage is
/// [`DecodeError::MalformedSmsTransport`], and the caller keeps the
/// unrefined event when one occurs.
pub(crate) fn refine(sms: &Value, event: &SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    let tree = sms
        .as_object()
        .ok_or_else(|| malformed(event, "layer is not an object"))?;
    let tree = normalize_keys(tree, SMS_TRANSPORT_REWRITES);

    let code = tree
        .get(TP_MTI)
        .and_then(scalar_str)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .ok_or_else(|| malformed(event, "missing or invalid TP-MTI"))?;
    let mti = MessageTypeIndicator::from_code(code)
        .ok_or_else(|| malformed(event, &format!("unknown TP-MTI {}", code)))?;

    match mti {
        MessageTypeIndicator::MobileTerminated | MessageTypeIndicator::StatusReport => Ok(event.clone()),
        MessageTypeIndicator::MobileOriginated => {
            let destination = tree
                .get(TP_DESTINATION_ADDRESS)
                .and_then(|address| child(address, TP_DA))
                .and_then(scalar_str)
                .ok_or_else(|| malformed(event, "SMS-SUBMIT without TP-Destination-Address"))?;
            Ok(event.clone().with_msisdn(destination))
        }
    }
}

fn malformed(event: &SignalingEvent, reason: &str) -> DecodeError {
    DecodeError::MalformedSmsTransport(format!("{}: {}", event.transaction_id, reason))
}
