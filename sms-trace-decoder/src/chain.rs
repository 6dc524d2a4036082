//! Chain Builder
//!
//! Reconstructs the delivery chain of one MSISDN from an [`EventStore`]:
//!
//! 1. primary events carrying the MSISDN (SRI-for-SM, MO forward)
//! 2. their responses: same transaction, `ResultLast` or `Error`
//! 3. mobile-terminated forwards addressed to an IMSI learned in step 2
//! 4. the `ResultLast` responses of those forwards
//!
//! The union is deduplicated by [`EventId`] and ordered by capture time, ties
//! broken by insertion order.

use crate::codes::Operation;
use crate::store::{EventId, EventStore};
use crate::types::{PointCode, SignalingEvent};
use serde::Serialize;
use std::collections::BTreeSet;

/// Time-ordered events correlated to one MSISDN
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chain {
    msisdn: String,
    events: Vec<SignalingEvent>,
}

impl Chain {
    pub fn msisdn(&self) -> &str {
        &self.msisdn
    }

    pub fn events(&self) -> &[SignalingEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<&SignalingEvent> {
        self.events.first()
    }

    /// Point codes of the first event, used as the chain's route
    pub fn route(&self) -> Option<(Option<PointCode>, Option<PointCode>)> {
        self.first()
            .map(|event| (event.origin_point_code, event.destination_point_code))
    }
}

/// Builds chains over a populated store
pub struct ChainBuilder<'a> {
    store: &'a EventStore,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(store: &'a EventStore) -> Self {
        Self { store }
    }

    /// Build the chain of `msisdn`
    ///
    /// Never fails: an MSISDN with no primary events yields an empty chain.
    pub fn build(&self, msisdn: &str) -> Chain {
        let primaries = self.store.ids_by_msisdn(msisdn);
        if primaries.is_empty() {
            log::debug!("No events for MSISDN {}", msisdn);
            return Chain {
                msisdn: msisdn.to_string(),
                events: Vec::new(),
            };
        }

        let responses = self.primary_responses(primaries);
        let queries = self.secondary_queries(&responses);
        let secondary = self.secondary_responses(&queries);

        let selected: BTreeSet<EventId> = primaries
            .iter()
            .chain(&responses)
            .chain(&queries)
            .chain(&secondary)
            .copied()
            .collect();

        let mut ordered: Vec<(EventId, &SignalingEvent)> = selected
            .into_iter()
            .filter_map(|id| self.store.get(id).map(|event| (id, event)))
            .collect();
        ordered.sort_by_key(|(id, event)| (event.time, *id));

        log::debug!(
            "Chain for {}: {} primary, {} responses, {} MT forwards, {} MT responses",
            msisdn,
            primaries.len(),
            responses.len(),
            queries.len(),
            secondary.len()
        );

        Chain {
            msisdn: msisdn.to_string(),
            events: ordered.into_iter().map(|(_, event)| event.clone()).collect(),
        }
    }

    /// Responses to SRI-for-SM and MO forward primaries
    fn primary_responses(&self, primaries: &[EventId]) -> Vec<EventId> {
        primaries
            .iter()
            .filter_map(|id| self.store.get(*id))
            .filter(|event| {
                matches!(event.operation, Operation::SendRoutingInfoForSm | Operation::MoForwardSm)
            })
            .flat_map(|event| self.same_transaction(event, |op| op.is_response()))
            .collect()
    }

    /// MT forwards addressed to an IMSI returned by a primary response
    fn secondary_queries(&self, responses: &[EventId]) -> Vec<EventId> {
        responses
            .iter()
            .filter_map(|id| self.store.get(*id))
            .filter_map(SignalingEvent::imsi)
            .flat_map(|imsi| self.store.ids_by_imsi(imsi))
            .copied()
            .filter(|id| self.store.get(*id).is_some_and(SignalingEvent::is_mt_delivery))
            .collect()
    }

    /// Acknowledgements of the MT forwards
    fn secondary_responses(&self, queries: &[EventId]) -> Vec<EventId> {
        queries
            .iter()
            .filter_map(|id| self.store.get(*id))
            .flat_map(|event| self.same_transaction(event, |op| op == Operation::ResultLast))
            .collect()
    }

    fn same_transaction<F>(&self, event: &SignalingEvent, accept: F) -> Vec<EventId>
    where
        F: Fn(Operation) -> bool,
    {
        self.store
            .ids_by_transaction_id(&event.transaction_id)
            .iter()
            .copied()
            .filter(|id| self.store.get(*id).is_some_and(|e| accept(e.operation)))
            .collect()
    }
}
