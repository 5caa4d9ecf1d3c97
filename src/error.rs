//! Startup errors.
//!
//! Per-event failures (parse, book, publish) are counted and recovered
//! locally; only initialization failures surface as `Result`s and abort
//! the process with a non-zero exit.

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Failure to bring the pipeline up.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create or bind the ingress socket: {0}")]
    IngressSocket(#[source] io::Error),

    #[error("failed to join multicast group {group}: {source}")]
    MulticastJoin {
        group: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("failed to create the egress socket: {0}")]
    EgressSocket(#[source] io::Error),

    #[error("failed to install the signal handler: {0}")]
    Signal(#[source] io::Error),
}
