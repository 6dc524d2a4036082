//! Frame Decoding Engine
//!
//! Turns one tshark frame (`-T json` shape) into one Signaling Event. The
//! decode is a pipeline of pure stages; each stage receives the event built
//! so far and returns a refined copy:
//!
//! 1. capture layer: timestamp (required)
//! 2. TCAP layer: phase + transaction id (required, creates the event)
//! 3. MAP layer: operation and subscriber identifiers
//! 4. SMS transport layer, when present (failures are logged, not raised)
//! 5. routing layer: point codes (layer required)

use crate::layers::{capture, map, routing, sms, tcap};
use crate::types::{DecodeError, SignalingEvent};
use serde_json::{Map, Value};

const SOURCE: &str = "_source";
const LAYERS: &str = "layers";

/// Frame decoder - stateless, one frame in, one event out
pub struct FrameDecoder;

impl FrameDecoder {
    /// Decode a tshark frame into a Signaling Event
    ///
    /// # Arguments
    /// * `frame` - Either a full tshark frame (`{"_source": {"layers": ...}}`)
    ///   or its bare `layers` object
    ///
    /// # Returns
    /// * `Ok(SignalingEvent)` with transaction id and phase always set
    /// * `Err(DecodeError)` naming the first required structure that is missing
    pub fn decode(frame: &Value) -> Result<SignalingEvent, DecodeError> {
        let layers = Self::layers(frame).ok_or(DecodeError::MissingLayers)?;

        let time = capture::timestamp(layers)?;
        let (phase, transaction_id) = tcap::framing(layers)?;
        let event = SignalingEvent::new(time, transaction_id, phase)
            .with_frame_number(capture::frame_number(layers));

        let event = map::refine(layers, event)?;

        let event = match layers.get(sms::LAYER) {
            Some(layer) => match sms::refine(layer, &event) {
                Ok(refined) => refined,
                Err(e) if e.is_recoverable() => {
                    log::warn!("Skipping SMS transport refinement: {}", e);
                    event
                }
                Err(e) => return Err(e),
            },
            None => event,
        };

        let event = routing::refine(layers, event)?;

        log::trace!(
            "Decoded {} {} tid={} msisdn={:?} {}",
            event.phase,
            event.operation,
            event.transaction_id,
            event.msisdn,
            event.identity
        );

        Ok(event)
    }

    /// The `layers` object of a frame, accepting bare layer objects too
    pub fn layers(frame: &Value) -> Option<&Map<String, Value>> {
        match frame.get(SOURCE) {
            Some(source) => source.get(LAYERS).and_then(Value::as_object),
            None => frame.as_object(),
        }
    }

    /// `frame.number` of a frame, for diagnostics on frames that fail to decode
    pub fn frame_number(frame: &Value) -> Option<u64> {
        Self::layers(frame).and_then(capture::frame_number)
    }
}
