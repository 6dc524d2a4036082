//! `gsm_map` layer: operation, subscriber identifiers and outcome
//!
//! Begin/Continue frames must carry an invoke component; End frames carry a
//! returnResultLast, a returnError, or nothing at all. Short message forward
//! invokes are additionally resolved through their SM-RP-DA parameter, whose
//! key spelling differs between the `gsm_map.sm.*` and `gsm_old.*` families.

use super::{child, is_empty, parse_u32, path, scalar_str};
use crate::codes::{DestinationAddressKind, ErrorCode, Operation, TransactionPhase};
use crate::types::{DecodeError, SignalingEvent};
use serde_json::{Map, Value};

const LAYER: &str = "gsm_map";
const COMPONENT_TREE: &str = "gsm_map.old.Component_tree";
const INVOKE: &str = "gsm_old.invoke_element";
const RETURN_RESULT_LAST: &str = "gsm_old.returnResultLast_element";
const RETURN_ERROR: &str = "gsm_old.returnError_element";
const RESULT_TREE: &str = "gsm_old.resultretres_element";
const OPCODE_TREE: &str = "gsm_old.opCode_tree";
const ERROR_CODE_TREE: &str = "gsm_old.errorCode_tree";
const LOCAL_VALUE: &str = "gsm_old.localValue";
const IMSI: &str = "e212.imsi";
const MSISDN: &str = "e164.msisdn";
const MSISDN_TREES: [&str; 2] = ["gsm_map.sm.msisdn_tree", "gsm_old.msisdn_tree"];
const SM_RP_DA: &str = "sm_RP_DA";

/// Key pair of one SM-RP-DA spelling family
struct RpDaKeys {
    kind: &'static str,
    tree: &'static str,
}

/// Newer family first: it wins when both are present
static RP_DA_FAMILIES: [RpDaKeys; 2] = [
    RpDaKeys { kind: "gsm_map.sm.sm_RP_DA", tree: "gsm_map.sm.sm_RP_DA_tree" },
    RpDaKeys { kind: "gsm_old.sm_RP_DA", tree: "gsm_old.sm_RP_DA_tree" },
];

/// Refine an event with the MAP component of its frame
pub(crate) fn refine(layers: &Map<String, Value>, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    let component = layers.get(LAYER).and_then(|map| child(map, COMPONENT_TREE));

    match event.phase {
        TransactionPhase::Begin | TransactionPhase::Continue => {
            let invoke = component
                .and_then(|c| child(c, INVOKE))
                .ok_or(DecodeError::MissingInvoke)?;
            decode_invoke(invoke, event)
        }
        TransactionPhase::End => decode_end(component, event),
    }
}

fn decode_invoke(invoke: &Value, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    let operation = operation(invoke)?.ok_or(DecodeError::MissingField(OPCODE_TREE))?;
    let event = event.with_operation(operation);

    match operation {
        Operation::SendRoutingInfoForSm => {
            let msisdn = MSISDN_TREES
                .iter()
                .find_map(|tree| path(invoke, &[*tree, MSISDN]))
                .and_then(scalar_str)
                .ok_or(DecodeError::MissingField(MSISDN))?;
            Ok(event.with_msisdn(msisdn))
        }
        Operation::MoForwardSm | Operation::MtForwardSm => resolve_destination(invoke, event),
        _ => Ok(event),
    }
}

/// Operation embedded in a component, `None` when it carries no opcode
fn operation(component: &Value) -> Result<Option<Operation>, DecodeError> {
    let Some(raw) = path(component, &[OPCODE_TREE, LOCAL_VALUE]) else {
        return Ok(None);
    };

    let code = parse_u32(raw, LOCAL_VALUE)?;
    Operation::from_opcode(code)
        .map(Some)
        .ok_or(DecodeError::UnknownOperation(code))
}

/// Resolve the SM-RP-DA of a forward short message invoke
fn resolve_destination(invoke: &Value, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    let (keys, raw) = RP_DA_FAMILIES
        .iter()
        .find_map(|keys| child(invoke, keys.kind).map(|raw| (keys, raw)))
        .ok_or(DecodeError::MissingField(SM_RP_DA))?;

    let code = parse_u32(raw, keys.kind)?;
    let kind = DestinationAddressKind::from_code(code)
        .ok_or(DecodeError::UnknownDestinationAddressKind(code))?;

    match kind {
        DestinationAddressKind::Imsi => {
            let tree = child(invoke, keys.tree)
                .or_else(|| RP_DA_FAMILIES.iter().find_map(|other| child(invoke, other.tree)))
                .ok_or(DecodeError::MissingField(SM_RP_DA))?;
            let imsi = child(tree, IMSI)
                .and_then(scalar_str)
                .ok_or(DecodeError::MissingField(IMSI))?;
            Ok(event.with_destination_kind(kind).with_imsi(imsi))
        }
        DestinationAddressKind::Lmsi => {
            log::warn!("{}: LMSI destination address is not supported", event.transaction_id);
            Ok(event.with_destination_kind(kind))
        }
        DestinationAddressKind::Msisdn | DestinationAddressKind::ServiceCentreAddress => {
            log::debug!(
                "{}: SM-RP-DA kind {} ({}) carries no identifier",
                event.transaction_id,
                kind,
                kind.code()
            );
            Ok(event.with_destination_kind(kind))
        }
        DestinationAddressKind::RoamingNumber => Err(DecodeError::UnknownDestinationAddressKind(code)),
    }
}

fn decode_end(component: Option<&Value>, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    if let Some(result) = component.and_then(|c| child(c, RETURN_RESULT_LAST)) {
        return decode_result(result, event);
    }

    if let Some(error) = component.and_then(|c| child(c, RETURN_ERROR)) {
        return decode_error(error, event);
    }

    // Bare End: acknowledgement without a component
    Ok(event.with_operation(Operation::ResultLast))
}

/// Decode a returnResultLast component
///
/// An opcode inside the result replaces `ResultLast`. SRI-for-SM results
/// that echo opcode 45 therefore decode as `SendRoutingInfoForSm` and are
/// not picked up as responses by the chain builder; see "Opcode inside a
/// result" in DESIGN.md.
fn decode_result(result: &Value, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    let event = event.with_operation(Operation::ResultLast);
    let tree = child(result, RESULT_TREE).unwrap_or(result);

    if is_empty(tree) {
        return Ok(event);
    }

    let event = match child(tree, IMSI).and_then(scalar_str) {
        Some(imsi) => event.with_imsi(imsi),
        None => event,
    };

    match operation(tree)? {
        Some(operation) => Ok(event.with_operation(operation)),
        None => Ok(event),
    }
}

fn decode_error(error: &Value, event: SignalingEvent) -> Result<SignalingEvent, DecodeError> {
    let raw = path(error, &[ERROR_CODE_TREE, LOCAL_VALUE])
        .or_else(|| child(error, LOCAL_VALUE))
        .ok_or(DecodeError::MissingField(ERROR_CODE_TREE))?;

    let code = parse_u32(raw, LOCAL_VALUE)?;
    let error_code = ErrorCode::from_code(code).unwrap_or_else(|| {
        log::warn!("{}: unmapped MAP error code {}", event.transaction_id, code);
        ErrorCode::Unknown
    });

    Ok(event.with_error(error_code))
}
