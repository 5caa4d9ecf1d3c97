//! Latency instrumentation: monotonic stamps and pipeline counters.
//!
//! All stamps share one process-wide monotonic epoch so stage deltas are
//! meaningful across threads. Counters are relaxed atomics; they are
//! advisory and never synchronize data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds since the process monotonic epoch.
///
/// The epoch is pinned on first use; values are only meaningful as
/// differences, never as wall-clock times.
#[inline]
pub fn mono_ns() -> u64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Per-event stage latencies, computed by the consumer at dequeue time.
///
/// Deltas saturate at zero: a feed whose monotonic epoch differs from
/// ours (or a zero exchange stamp) yields zero for that stage rather
/// than a garbage value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatencyBreakdown {
    pub exchange_to_udp_ns: u64,
    pub udp_to_enqueue_ns: u64,
    pub enqueue_to_dequeue_ns: u64,
}

impl LatencyBreakdown {
    /// Measure the three pipeline stages of `event`, dequeued at
    /// `dequeued_mono_ns`.
    pub fn measure(event: &crate::event::Event, dequeued_mono_ns: u64) -> Self {
        let exchange_to_udp_ns = if event.exchange_mono_ns > 0 {
            event.udp_rx_mono_ns.saturating_sub(event.exchange_mono_ns)
        } else {
            0
        };
        Self {
            exchange_to_udp_ns,
            udp_to_enqueue_ns: event.enqueued_mono_ns.saturating_sub(event.udp_rx_mono_ns),
            enqueue_to_dequeue_ns: dequeued_mono_ns.saturating_sub(event.enqueued_mono_ns),
        }
    }

    /// End-to-end latency: the sum of the three stages.
    #[inline]
    pub fn total_ns(&self) -> u64 {
        self.exchange_to_udp_ns + self.udp_to_enqueue_ns + self.enqueue_to_dequeue_ns
    }
}

/// Cross-thread pipeline counters.
///
/// The ingest thread owns the push/drop/parse counters, the consumer
/// owns the rest; all updates are relaxed.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub events_pushed: AtomicU64,
    pub events_dropped: AtomicU64,
    pub parse_errors: AtomicU64,

    pub events_consumed: AtomicU64,
    pub duplicate_orders: AtomicU64,
    pub unknown_orders: AtomicU64,
    pub unknown_sides: AtomicU64,
    pub unknown_events: AtomicU64,
    pub publish_errors: AtomicU64,

    total_exchange_to_udp_ns: AtomicU64,
    total_udp_to_enqueue_ns: AtomicU64,
    total_enqueue_to_dequeue_ns: AtomicU64,
    total_end_to_end_ns: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event's stage latencies into the running totals.
    pub fn record_latency(&self, latency: &LatencyBreakdown) {
        self.total_exchange_to_udp_ns
            .fetch_add(latency.exchange_to_udp_ns, Ordering::Relaxed);
        self.total_udp_to_enqueue_ns
            .fetch_add(latency.udp_to_enqueue_ns, Ordering::Relaxed);
        self.total_enqueue_to_dequeue_ns
            .fetch_add(latency.enqueue_to_dequeue_ns, Ordering::Relaxed);
        self.total_end_to_end_ns
            .fetch_add(latency.total_ns(), Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter. Individually coherent only;
    /// the set is not a consistent cut under concurrency.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_pushed: self.events_pushed.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            events_consumed: self.events_consumed.load(Ordering::Relaxed),
            duplicate_orders: self.duplicate_orders.load(Ordering::Relaxed),
            unknown_orders: self.unknown_orders.load(Ordering::Relaxed),
            unknown_sides: self.unknown_sides.load(Ordering::Relaxed),
            unknown_events: self.unknown_events.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
            total_exchange_to_udp_ns: self.total_exchange_to_udp_ns.load(Ordering::Relaxed),
            total_udp_to_enqueue_ns: self.total_udp_to_enqueue_ns.load(Ordering::Relaxed),
            total_enqueue_to_dequeue_ns: self.total_enqueue_to_dequeue_ns.load(Ordering::Relaxed),
            total_end_to_end_ns: self.total_end_to_end_ns.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`PipelineStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub events_pushed: u64,
    pub events_dropped: u64,
    pub parse_errors: u64,
    pub events_consumed: u64,
    pub duplicate_orders: u64,
    pub unknown_orders: u64,
    pub unknown_sides: u64,
    pub unknown_events: u64,
    pub publish_errors: u64,
    pub total_exchange_to_udp_ns: u64,
    pub total_udp_to_enqueue_ns: u64,
    pub total_enqueue_to_dequeue_ns: u64,
    pub total_end_to_end_ns: u64,
}

impl StatsSnapshot {
    /// Mean end-to-end latency over the consumed events, in nanoseconds.
    pub fn avg_total_ns(&self) -> u64 {
        if self.events_consumed == 0 {
            0
        } else {
            self.total_end_to_end_ns / self.events_consumed
        }
    }

    /// Mean ring-resident time over the consumed events, in nanoseconds.
    pub fn avg_queue_ns(&self) -> u64 {
        if self.events_consumed == 0 {
            0
        } else {
            self.total_enqueue_to_dequeue_ns / self.events_consumed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn test_mono_ns_is_monotonic() {
        let a = mono_ns();
        let b = mono_ns();
        assert!(b >= a);
    }

    #[test]
    fn test_latency_breakdown() {
        let event = Event {
            exchange_mono_ns: 100,
            udp_rx_mono_ns: 150,
            enqueued_mono_ns: 180,
            ..Event::default()
        };
        let latency = LatencyBreakdown::measure(&event, 250);

        assert_eq!(latency.exchange_to_udp_ns, 50);
        assert_eq!(latency.udp_to_enqueue_ns, 30);
        assert_eq!(latency.enqueue_to_dequeue_ns, 70);
        assert_eq!(latency.total_ns(), 150);
    }

    #[test]
    fn test_latency_saturates_on_epoch_mismatch() {
        // Feed monotonic clock ahead of ours.
        let event = Event {
            exchange_mono_ns: 1_000_000,
            udp_rx_mono_ns: 500,
            enqueued_mono_ns: 600,
            ..Event::default()
        };
        let latency = LatencyBreakdown::measure(&event, 400);

        assert_eq!(latency.exchange_to_udp_ns, 0);
        assert_eq!(latency.udp_to_enqueue_ns, 100);
        assert_eq!(latency.enqueue_to_dequeue_ns, 0);
    }

    #[test]
    fn test_zero_exchange_stamp_is_ignored() {
        let event = Event {
            exchange_mono_ns: 0,
            udp_rx_mono_ns: 500,
            enqueued_mono_ns: 600,
            ..Event::default()
        };
        let latency = LatencyBreakdown::measure(&event, 700);
        assert_eq!(latency.exchange_to_udp_ns, 0);
        assert_eq!(latency.total_ns(), 200);
    }

    #[test]
    fn test_stats_snapshot_averages() {
        let stats = PipelineStats::new();
        stats.events_consumed.store(4, Ordering::Relaxed);
        stats.record_latency(&LatencyBreakdown {
            exchange_to_udp_ns: 10,
            udp_to_enqueue_ns: 10,
            enqueue_to_dequeue_ns: 20,
        });
        stats.record_latency(&LatencyBreakdown {
            exchange_to_udp_ns: 0,
            udp_to_enqueue_ns: 20,
            enqueue_to_dequeue_ns: 20,
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_end_to_end_ns, 80);
        assert_eq!(snapshot.avg_total_ns(), 20);
        assert_eq!(snapshot.avg_queue_ns(), 10);
    }

    #[test]
    fn test_empty_snapshot_averages_are_zero() {
        let snapshot = PipelineStats::new().snapshot();
        assert_eq!(snapshot.avg_total_ns(), 0);
        assert_eq!(snapshot.avg_queue_ns(), 0);
    }
}
