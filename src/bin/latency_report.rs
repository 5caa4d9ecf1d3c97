//! Latency report for the book hot path and the ring round trip.
//!
//! Measures dispatch cost per event kind and push+pop pairs through the
//! ring, then prints hdrhistogram percentiles.

use std::sync::Arc;
use std::time::Instant;

use hdrhistogram::Histogram;

use bookcast::{Engine, Event, EventKind, NullPublisher, PipelineStats, Side};

const ITERATIONS: usize = 200_000;
const WARMUP: usize = 10_000;

fn percentiles(label: &str, histogram: &Histogram<u64>) {
    println!("--- {label} ---");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("Max:    {:6} ns", histogram.max());
}

fn generate_events(count: usize) -> Vec<Event> {
    let mut events = Vec::with_capacity(count);
    for i in 0..count {
        let order_id = format!("ord-{i}");
        let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
        let price = 100.0 + (i % 50) as f64 * 0.25;
        events.push(Event::order(
            EventKind::AddOrder,
            "BENCH",
            &order_id,
            side,
            price,
            10,
        ));
    }
    events
}

fn main() {
    println!("Preparing latency report ({ITERATIONS} iterations)...");

    let mut engine = Engine::new(Arc::new(PipelineStats::new()));
    let mut publisher = NullPublisher;
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 10_000_000, 3).unwrap();

    let events = generate_events(ITERATIONS + WARMUP);

    // Warm the branch predictor and fault in book storage.
    for event in &events[..WARMUP] {
        std::hint::black_box(engine.process_event(event, &mut publisher));
    }

    let run_start = Instant::now();
    for event in &events[WARMUP..] {
        let start = Instant::now();
        std::hint::black_box(engine.process_event(event, &mut publisher));
        histogram
            .record(start.elapsed().as_nanos() as u64)
            .unwrap_or(());
    }
    let elapsed = run_start.elapsed();

    println!(
        "Throughput: {:.2} events/sec",
        ITERATIONS as f64 / elapsed.as_secs_f64()
    );
    percentiles("book dispatch (add)", &histogram);

    // Ring round trip: one push immediately followed by one pop.
    let (mut producer, mut consumer) = bookcast::ring::new::<u64>(1024);
    let mut ring_histogram = Histogram::<u64>::new_with_bounds(1, 1_000_000, 3).unwrap();

    for i in 0..ITERATIONS as u64 {
        let start = Instant::now();
        producer.push(i).unwrap();
        std::hint::black_box(consumer.pop().unwrap());
        ring_histogram
            .record(start.elapsed().as_nanos() as u64)
            .unwrap_or(());
    }
    percentiles("ring push+pop", &ring_histogram);
}
