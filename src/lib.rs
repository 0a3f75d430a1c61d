//! Fire-and-forget [StatsD](https://github.com/statsd/statsd) metrics.
//!
//! A [Client] sends counters, gauges and timings as plaintext StatsD lines, one datagram per
//! metric, to a server at `localhost:8125` by default:
//!
//! ```text
//! <name>:<value>|<type>[|@<rate>]
//! ```
//!
//! Delivery is best effort. The socket is dialed lazily on the first metric and reused from
//! then on; dial and write failures are logged at debug level through [log] and otherwise
//! ignored, so recording a metric never fails and never blocks on the network.
//!
//! By default every metric is sent twice: under its own name, and under `<name>.<host>`
//! where `<host>` is the local host name. This can be disabled with
//! [ClientBuilder::append_host].
//!
//! Sampling is driven by [Options]: with a rate below 1.0 a call is only sent with that
//! probability, and sent lines carry the `|@<rate>` annotation so the server can scale
//! them back up.
//!
//! ### Example
//!
//! ```no_run
//! use statsd_emitter::{Client, Options};
//!
//! # fn main() -> cadence::MetricResult<()> {
//! let client = Client::new()?;
//!
//! let mut timer = client.timer();
//! for _ in 0..10 {
//!     timer.reset();
//!
//!     // Do work
//!
//!     let took = timer.send(["work.duration"]);
//!     timer.send_with_options(&Options::sampled(0.25), ["work.duration.sampled"]);
//!
//!     println!("took {} seconds", took.as_secs_f64());
//! }
//!
//! client.incr("stats.success");
//! # Ok(())
//! # }
//! ```
//!
//! Applications running on Tokio can keep socket writes off their own tasks by handing the
//! client a [TokioUdpMetricSink] (or, on Unix, a [TokioUnixMetricSink]).

use std::{
    future::Future,
    pin::Pin,
};

pub mod builder;
pub mod client;
pub mod sampler;
pub mod timer;
pub mod transport;
pub mod udp;
#[cfg(unix)]
pub mod unix;
pub mod wire;
mod worker;

pub use crate::{
    builder::{
        ClientBuilder,
        SinkBuilder,
    },
    client::Client,
    sampler::Options,
    timer::Timer,
    transport::{
        Dial,
        UdpDialer,
    },
    udp::TokioUdpMetricSink,
};

#[cfg(unix)]
pub use crate::unix::TokioUnixMetricSink;

/// Default StatsD server address.
pub const DEFAULT_ADDRESS: &str = "localhost:8125";

/// Default capacity of the metric queue of the asynchronous sinks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Future that sends queued metrics; returned along with the asynchronous sinks.
pub type MetricFuture = Pin<Box<dyn Future<Output = ()> + Send + Sync + 'static>>;
