//! Event Store
//!
//! Append-only collection of Signaling Events with secondary indices by
//! transaction id, MSISDN, IMSI and operation. Index entries are [`EventId`]s
//! into the master sequence, so lookups return events in insertion order.

use crate::codes::Operation;
use crate::types::SignalingEvent;
use serde::Serialize;
use std::collections::HashMap;

/// Position of an event in its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventId(usize);

impl EventId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Indexed store of decoded events
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<SignalingEvent>,
    transaction_index: HashMap<String, Vec<EventId>>,
    msisdn_index: HashMap<String, Vec<EventId>>,
    imsi_index: HashMap<String, Vec<EventId>>,
    operation_index: HashMap<Operation, Vec<EventId>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and index it
    ///
    /// The same event added twice is stored (and indexed) twice.
    pub fn add(&mut self, event: SignalingEvent) -> EventId {
        let id = EventId(self.events.len());
        self.index(id, &event);
        self.events.push(event);
        id
    }

    fn index(&mut self, id: EventId, event: &SignalingEvent) {
        self.transaction_index
            .entry(event.transaction_id.clone())
            .or_default()
            .push(id);

        // Empty identifiers would join unrelated dialogues
        if let Some(msisdn) = event.msisdn.as_deref().filter(|m| !m.is_empty()) {
            self.msisdn_index.entry(msisdn.to_string()).or_default().push(id);
        }

        // Error names share the identity slot and are never indexed
        if let Some(imsi) = event.imsi().filter(|i| !i.is_empty()) {
            self.imsi_index.entry(imsi.to_string()).or_default().push(id);
        }

        self.operation_index.entry(event.operation).or_default().push(id);
    }

    pub fn get(&self, id: EventId) -> Option<&SignalingEvent> {
        self.events.get(id.0)
    }

    /// All events in insertion order
    pub fn all(&self) -> std::slice::Iter<'_, SignalingEvent> {
        self.events.iter()
    }

    /// All events with their ids, in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (EventId, &SignalingEvent)> + '_ {
        self.events.iter().enumerate().map(|(i, event)| (EventId(i), event))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn by_transaction_id(&self, transaction_id: &str) -> Vec<&SignalingEvent> {
        self.resolve(self.ids_by_transaction_id(transaction_id))
    }

    pub fn by_msisdn(&self, msisdn: &str) -> Vec<&SignalingEvent> {
        self.resolve(self.ids_by_msisdn(msisdn))
    }

    pub fn by_imsi(&self, imsi: &str) -> Vec<&SignalingEvent> {
        self.resolve(self.ids_by_imsi(imsi))
    }

    pub fn by_operation(&self, operation: Operation) -> Vec<&SignalingEvent> {
        self.resolve(self.ids_by_operation(operation))
    }

    pub(crate) fn ids_by_transaction_id(&self, transaction_id: &str) -> &[EventId] {
        self.transaction_index.get(transaction_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn ids_by_msisdn(&self, msisdn: &str) -> &[EventId] {
        self.msisdn_index.get(msisdn).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn ids_by_imsi(&self, imsi: &str) -> &[EventId] {
        self.imsi_index.get(imsi).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn ids_by_operation(&self, operation: Operation) -> &[EventId] {
        self.operation_index.get(&operation).map(Vec::as_slice).unwrap_or(&[])
    }

    fn resolve(&self, ids: &[EventId]) -> Vec<&SignalingEvent> {
        ids.iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Recompute every index from the master sequence
    pub fn rebuild_indices(&mut self) {
        self.transaction_index.clear();
        self.msisdn_index.clear();
        self.imsi_index.clear();
        self.operation_index.clear();

        let events = std::mem::take(&mut self.events);
        for (i, event) in events.iter().enumerate() {
            self.index(EventId(i), event);
        }
        self.events = events;
    }

    /// Get statistics about the stored events
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            num_events: self.events.len(),
            num_transactions: self.transaction_index.len(),
            num_msisdns: self.msisdn_index.len(),
            num_imsis: self.imsi_index.len(),
        }
    }
}

impl Extend<SignalingEvent> for EventStore {
    fn extend<T: IntoIterator<Item = SignalingEvent>>(&mut self, iter: T) {
        for event in iter {
            self.add(event);
        }
    }
}

/// Statistics about an event store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Total number of events
    pub num_events: usize,
    /// Distinct transaction ids
    pub num_transactions: usize,
    /// Distinct MSISDNs
    pub num_msisdns: usize,
    /// Distinct IMSIs
    pub num_imsis: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{ErrorCode, TransactionPhase};
    use chrono::{TimeZone, Utc};

    fn event(secs: i64, tid: &str, phase: TransactionPhase) -> SignalingEvent {
        SignalingEvent::new(Utc.timestamp_opt(secs, 0).unwrap(), tid, phase)
    }

    fn sample_store() -> EventStore {
        let mut store = EventStore::new();
        store.add(
            event(1, "T1", TransactionPhase::Begin)
                .with_operation(Operation::SendRoutingInfoForSm)
                .with_msisdn("79003350829"),
        );
        store.add(
            event(2, "T1", TransactionPhase::End)
                .with_operation(Operation::ResultLast)
                .with_imsi("250991234567890"),
        );
        store.add(
            event(3, "T2", TransactionPhase::Begin)
                .with_operation(Operation::MtForwardSm)
                .with_imsi("250991234567890"),
        );
        store
    }

    #[test]
    fn test_empty_store() {
        let store = EventStore::new();
        assert!(store.is_empty());
        assert!(store.by_msisdn("79003350829").is_empty());
        assert_eq!(store.all().count(), 0);
    }

    #[test]
    fn test_lookups_in_insertion_order() {
        let store = sample_store();
        assert_eq!(store.len(), 3);

        let t1 = store.by_transaction_id("T1");
        assert_eq!(t1.len(), 2);
        assert_eq!(t1[0].phase, TransactionPhase::Begin);
        assert_eq!(t1[1].phase, TransactionPhase::End);

        let imsi = store.by_imsi("250991234567890");
        assert_eq!(imsi.len(), 2);
        assert_eq!(imsi[0].transaction_id, "T1");
        assert_eq!(imsi[1].transaction_id, "T2");

        assert_eq!(store.by_msisdn("79003350829").len(), 1);
        assert_eq!(store.by_operation(Operation::MtForwardSm).len(), 1);
        assert!(store.by_operation(Operation::Error).is_empty());
        assert!(store.by_transaction_id("T9").is_empty());
    }

    #[test]
    fn test_ids_and_get() {
        let mut store = EventStore::new();
        let first = store.add(event(1, "a", TransactionPhase::Begin));
        let second = store.add(event(2, "b", TransactionPhase::End));

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(store.get(second).unwrap().transaction_id, "b");
        assert!(store.get(EventId(5)).is_none());

        let ids: Vec<_> = store.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_duplicate_add_kept_twice() {
        let mut store = EventStore::new();
        let duplicated = event(1, "T1", TransactionPhase::Begin).with_msisdn("79003350829");
        store.add(duplicated.clone());
        store.add(duplicated);

        assert_eq!(store.all().count(), 2);
        assert_eq!(store.by_msisdn("79003350829").len(), 2);
        assert_eq!(store.by_transaction_id("T1").len(), 2);
    }

    #[test]
    fn test_error_name_not_indexed_as_imsi() {
        let mut store = EventStore::new();
        store.add(event(1, "T1", TransactionPhase::End).with_error(ErrorCode::AbsentSubscriberSm));

        assert!(store.by_imsi("AbsentSubscriberSm").is_empty());
        assert_eq!(store.by_operation(Operation::Error).len(), 1);
    }

    #[test]
    fn test_empty_identifiers_not_indexed() {
        let mut store = EventStore::new();
        store.add(event(1, "T1", TransactionPhase::Begin).with_msisdn(""));
        store.add(event(2, "T1", TransactionPhase::End).with_imsi(""));

        assert!(store.by_msisdn("").is_empty());
        assert!(store.by_imsi("").is_empty());
        assert_eq!(store.by_transaction_id("T1").len(), 2);

        let stats = store.stats();
        assert_eq!(stats.num_msisdns, 0);
        assert_eq!(stats.num_imsis, 0);
    }

    #[test]
    fn test_rebuild_indices_is_idempotent() {
        let mut store = sample_store();
        let before = store.stats();

        store.rebuild_indices();
        store.rebuild_indices();

        assert_eq!(store.stats(), before);
        assert_eq!(store.by_imsi("250991234567890").len(), 2);
        assert_eq!(store.by_transaction_id("T1").len(), 2);
    }

    #[test]
    fn test_extend_and_stats() {
        let mut store = EventStore::new();
        store.extend(vec![
            event(1, "a", TransactionPhase::Begin).with_msisdn("1"),
            event(2, "a", TransactionPhase::End).with_imsi("2"),
        ]);

        let stats = store.stats();
        assert_eq!(stats.num_events, 2);
        assert_eq!(stats.num_transactions, 1);
        assert_eq!(stats.num_msisdns, 1);
        assert_eq!(stats.num_imsis, 1);
    }
}
