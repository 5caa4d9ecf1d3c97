//! bookcastd - the feed-to-multicast pipeline daemon.
//!
//! Thread topology:
//! - main thread: UDP ingest, sole producer on the ring
//! - consumer thread: order books, latency accounting, publisher I/O
//!
//! SIGINT/SIGTERM set the shared shutdown flag; both loops exit at their
//! next iteration and the consumer drains the ring before returning.

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use bookcast::{
    Config, Engine, InitError, MulticastPublisher, PipelineStats, RingSink, UdpIngress,
};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(Config::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "initialization failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), InitError> {
    info!(?config, "starting bookcast pipeline");

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .map_err(InitError::Signal)?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .map_err(InitError::Signal)?;

    let stats = Arc::new(PipelineStats::new());

    let mut publisher = MulticastPublisher::new(
        config.publish_group,
        config.publish_port,
        config.publish_ttl,
        Arc::clone(&stats),
    )?;

    let (producer, mut consumer) = bookcast::ring::new(config.ring_capacity);

    let mut ingress = UdpIngress::bind(
        config.feed_group,
        config.feed_port,
        Arc::clone(&shutdown),
        Arc::clone(&stats),
    )?;

    let consumer_shutdown = Arc::clone(&shutdown);
    let consumer_stats = Arc::clone(&stats);
    let pin_consumer = config.pin_consumer;
    let consumer_thread = thread::Builder::new()
        .name("bookcast-consumer".to_owned())
        .spawn(move || {
            let mut engine = Engine::new(consumer_stats);
            engine.run(
                &mut consumer,
                &mut publisher,
                &consumer_shutdown,
                pin_consumer,
            );
        })
        .expect("failed to spawn consumer thread");

    // Ingest on the main thread: the sole producer.
    let mut sink = RingSink::new(producer, Arc::clone(&stats));
    ingress.run(&mut sink);

    consumer_thread.join().expect("consumer thread panicked");

    let snapshot = stats.snapshot();
    info!(
        pushed = snapshot.events_pushed,
        dropped = snapshot.events_dropped,
        consumed = snapshot.events_consumed,
        parse_errors = snapshot.parse_errors,
        duplicate_orders = snapshot.duplicate_orders,
        unknown_orders = snapshot.unknown_orders,
        publish_errors = snapshot.publish_errors,
        avg_total_ns = snapshot.avg_total_ns(),
        "pipeline stopped"
    );
    Ok(())
}
