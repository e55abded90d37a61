use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::event::EventRecord;

/// An event held locally while the broker is unreachable.
#[derive(Debug, Clone)]
pub(crate) struct PendingEvent {
    pub(crate) record: EventRecord,
    pub(crate) enqueued_at: DateTime<Utc>,
    pub(crate) attempts: u32,
}

impl PendingEvent {
    pub(crate) fn new(record: EventRecord) -> Self {
        Self {
            record,
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }
}

/// Bounded FIFO of events awaiting replay.
///
/// When full, the oldest entry is evicted; every eviction is counted
/// and logged, never silent.
#[derive(Debug)]
pub(crate) struct PendingBuffer {
    events: VecDeque<PendingEvent>,
    capacity: usize,
    evicted: u64,
}

impl PendingBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    pub(crate) fn push(&mut self, event: PendingEvent) {
        if self.events.len() >= self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                self.evicted += 1;
                tracing::warn!(
                    event_type = %evicted.record.event_type,
                    enqueued_at = %evicted.enqueued_at,
                    "pending buffer full; evicting oldest event"
                );
                metrics::counter!("broker_buffer_evictions_total").increment(1);
            }
        }
        self.events.push_back(event);
    }

    /// Requeue an event at the head after a failed replay.
    ///
    /// If the buffer filled up in the meantime the requeued entry is
    /// itself the oldest, so it is the one dropped.
    pub(crate) fn push_front(&mut self, event: PendingEvent) {
        if self.events.len() >= self.capacity {
            self.evicted += 1;
            tracing::warn!(
                event_type = %event.record.event_type,
                "pending buffer full; dropping requeued event"
            );
            metrics::counter!("broker_buffer_evictions_total").increment(1);
            return;
        }
        self.events.push_front(event);
    }

    pub(crate) fn pop(&mut self) -> Option<PendingEvent> {
        self.events.pop_front()
    }

    /// Count an event dropped outside of the push path, e.g. after its
    /// replay attempts are exhausted.
    pub(crate) fn record_eviction(&mut self) {
        self.evicted += 1;
        metrics::counter!("broker_buffer_evictions_total").increment(1);
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn evicted_count(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(seq: i64) -> PendingEvent {
        PendingEvent::new(EventRecord::new("order.reserved", json!({"seq": seq})))
    }

    fn seqs(buffer: &mut PendingBuffer) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(pending) = buffer.pop() {
            out.push(pending.record.payload["seq"].as_i64().unwrap());
        }
        out
    }

    #[test]
    fn drains_in_fifo_order() {
        let mut buffer = PendingBuffer::new(10);
        buffer.push(event(1));
        buffer.push(event(2));
        buffer.push(event(3));

        assert_eq!(buffer.len(), 3);
        assert_eq!(seqs(&mut buffer), vec![1, 2, 3]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut buffer = PendingBuffer::new(2);
        buffer.push(event(1));
        buffer.push(event(2));
        buffer.push(event(3));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.evicted_count(), 1);
        assert_eq!(seqs(&mut buffer), vec![2, 3]);
    }

    #[test]
    fn requeued_event_drains_first() {
        let mut buffer = PendingBuffer::new(10);
        buffer.push(event(1));
        buffer.push(event(2));

        let mut head = buffer.pop().unwrap();
        head.attempts += 1;
        buffer.push_front(head);

        assert_eq!(seqs(&mut buffer), vec![1, 2]);
    }

    #[test]
    fn requeue_into_full_buffer_drops_and_counts() {
        let mut buffer = PendingBuffer::new(1);
        buffer.push(event(1));

        let head = buffer.pop().unwrap();
        buffer.push(event(2));
        buffer.push_front(head);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.evicted_count(), 1);
        assert_eq!(seqs(&mut buffer), vec![2]);
    }

    #[test]
    fn explicit_evictions_are_counted() {
        let mut buffer = PendingBuffer::new(10);
        buffer.push(event(1));
        buffer.pop();
        buffer.record_eviction();

        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.evicted_count(), 1);
    }
}
