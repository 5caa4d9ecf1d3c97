//! Benchmark harness using Criterion for latency measurement.
//!
//! Measures:
//! - Book add / cancel / modify
//! - Top-of-book reads
//! - Datagram decode
//! - Ring push+pop

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use bookcast::{feed, ring, Event, EventKind, OrderBook, Side};

fn bench_add_order(c: &mut Criterion) {
    let mut book = OrderBook::with_capacity("BENCH", 1 << 20);
    let mut order_id = 0u64;

    c.bench_function("book_add_order", |b| {
        b.iter(|| {
            order_id += 1;
            let price = 100.0 + (order_id % 100) as f64 * 0.25;
            black_box(book.add_order(
                &format!("a{order_id}"),
                Side::Bid,
                price,
                100,
                order_id,
            ))
        })
    });
}

fn bench_cancel_order(c: &mut Criterion) {
    let mut book = OrderBook::with_capacity("BENCH", 1 << 16);
    let mut order_id = 0u64;

    c.bench_function("book_cancel_order", |b| {
        b.iter(|| {
            // Add a fresh order, then cancel it; the pair keeps the book
            // at steady state.
            order_id += 1;
            let id = format!("c{order_id}");
            let price = 100.0 + (order_id % 100) as f64 * 0.25;
            book.add_order(&id, Side::Ask, price, 100, order_id).unwrap();
            black_box(book.cancel_order(&id))
        })
    });
}

fn bench_modify_order(c: &mut Criterion) {
    let mut book = OrderBook::with_capacity("BENCH", 1 << 16);
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for i in 0..10_000u64 {
        let price = 100.0 + (i % 100) as f64 * 0.25;
        book.add_order(&format!("m{i}"), Side::Bid, price, 100, i)
            .unwrap();
    }

    c.bench_function("book_modify_order", |b| {
        b.iter(|| {
            let target = format!("m{}", rng.gen_range(0..10_000u64));
            let new_size = rng.gen_range(1..500);
            black_box(book.modify_order(&target, new_size))
        })
    });
}

fn bench_top_of_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_of_book");

    for levels in [10u64, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let mut book = OrderBook::new("BENCH");
            for i in 0..levels {
                book.add_order(
                    &format!("b{i}"),
                    Side::Bid,
                    50.0 + i as f64 * 0.01,
                    10,
                    i,
                )
                .unwrap();
                book.add_order(
                    &format!("a{i}"),
                    Side::Ask,
                    100.0 + i as f64 * 0.01,
                    10,
                    i,
                )
                .unwrap();
            }

            b.iter(|| {
                black_box(book.best_bid());
                black_box(book.best_ask());
                black_box(book.quote_imbalance())
            })
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let datagram = br#"{"event_type":"ADD_ORDER","symbol":"AAPL","exchange":"SIM","order_id":"AAPL_12345","side":"BID","price":150.25,"size":500,"timestamp":1700000000000000000,"sequence_number":42,"exchange_mono_ns":123456789}"#;

    c.bench_function("feed_decode", |b| {
        b.iter(|| black_box(feed::decode(black_box(datagram))))
    });
}

fn bench_ring_push_pop(c: &mut Criterion) {
    let (mut producer, mut consumer) = ring::new::<u64>(1024);

    c.bench_function("ring_push_pop_u64", |b| {
        b.iter(|| {
            producer.push(black_box(42)).unwrap();
            black_box(consumer.pop().unwrap())
        })
    });

    let (mut event_producer, mut event_consumer) = ring::new::<Event>(1024);
    let template = Event::order(EventKind::AddOrder, "AAPL", "AAPL_1", Side::Bid, 150.0, 10);

    c.bench_function("ring_push_pop_event", |b| {
        b.iter(|| {
            event_producer.push(black_box(template.clone())).unwrap();
            black_box(event_consumer.pop().unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_add_order,
    bench_cancel_order,
    bench_modify_order,
    bench_top_of_book,
    bench_decode,
    bench_ring_push_pop
);
criterion_main!(benches);
