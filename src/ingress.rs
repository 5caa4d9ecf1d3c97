//! Ingress adapter - receives feed datagrams and produces events.
//!
//! Owns the receive socket and runs on the ingest thread, which is the
//! sole producer on the ring. The socket is non-blocking; when it has no
//! data the loop sleeps briefly instead of spinning, and it polls the
//! shutdown flag on every iteration.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{error, info, warn};

use crate::error::InitError;
use crate::event::Event;
use crate::feed;
use crate::ring::{Producer, PushError};
use crate::stats::{mono_ns, PipelineStats};

/// Pause when the socket reports no data; keeps the loop responsive
/// without a hot spin.
const IDLE_SLEEP: Duration = Duration::from_micros(100);

/// Receiver of decoded events, taken by the ingress adapter.
pub trait EventSink {
    fn on_event(&mut self, event: Event);
}

/// The ring's producing end as an [`EventSink`].
///
/// Stamps `enqueued_mono_ns` immediately before the push. A full ring
/// drops the event; the drop is counted, never retried or blocked on.
pub struct RingSink {
    producer: Producer<Event>,
    stats: Arc<PipelineStats>,
}

impl RingSink {
    pub fn new(producer: Producer<Event>, stats: Arc<PipelineStats>) -> Self {
        Self { producer, stats }
    }
}

impl EventSink for RingSink {
    fn on_event(&mut self, mut event: Event) {
        event.enqueued_mono_ns = mono_ns();
        match self.producer.push(event) {
            Ok(()) => {
                self.stats.events_pushed.fetch_add(1, Ordering::Relaxed);
            }
            Err(PushError::Full(_)) => {
                self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// UDP feed listener, unicast or multicast.
pub struct UdpIngress {
    socket: UdpSocket,
    shutdown: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
}

impl UdpIngress {
    /// Bind `0.0.0.0:<port>` with `SO_REUSEADDR` and, when `group` is
    /// set, join that multicast group on the default interface. The
    /// socket is non-blocking.
    pub fn bind(
        group: Option<Ipv4Addr>,
        port: u16,
        shutdown: Arc<AtomicBool>,
        stats: Arc<PipelineStats>,
    ) -> Result<Self, InitError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(InitError::IngressSocket)?;
        socket
            .set_reuse_address(true)
            .map_err(InitError::IngressSocket)?;

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        socket
            .bind(&addr.into())
            .map_err(InitError::IngressSocket)?;

        if let Some(group) = group {
            socket
                .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
                .map_err(|source| InitError::MulticastJoin { group, source })?;
        }

        socket
            .set_nonblocking(true)
            .map_err(InitError::IngressSocket)?;

        let socket: UdpSocket = socket.into();
        match group {
            Some(group) => info!(%group, port, "joined feed multicast group"),
            None => info!(port, "listening for unicast feed"),
        }

        Ok(Self {
            socket,
            shutdown,
            stats,
        })
    }

    /// The bound local address (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive datagrams until shutdown or a fatal socket error.
    ///
    /// Each datagram is stamped with `udp_rx_mono_ns` right after the
    /// receive call, decoded, and handed to `sink`. Malformed datagrams
    /// are counted and dropped.
    pub fn run<S: EventSink>(&mut self, sink: &mut S) {
        let mut buf = [0u8; 2048];

        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, _peer)) => {
                    let udp_rx_mono_ns = mono_ns();
                    match feed::decode(&buf[..len]) {
                        Ok(mut event) => {
                            event.udp_rx_mono_ns = udp_rx_mono_ns;
                            sink.on_event(event);
                        }
                        Err(err) => {
                            self.stats.parse_errors.fetch_add(1, Ordering::Relaxed);
                            warn!(%err, len, "dropped malformed datagram");
                        }
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(IDLE_SLEEP);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    error!(%err, "fatal ingress socket error");
                    break;
                }
            }

            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
        }

        info!("ingress loop stopped");
    }
}
