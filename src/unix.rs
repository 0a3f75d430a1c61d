#![allow(clippy::type_complexity)]

//! Queued metric sink that sends datagrams over a Unix socket from a Tokio task.

use cadence::{
    MetricResult,
    MetricSink,
};

use std::{
    io::Result,
    panic::{
        RefUnwindSafe,
        UnwindSafe,
    },
    path::Path,
};

use tokio::{
    net::UnixDatagram,
    sync::mpsc::{
        channel,
        Sender,
    },
};

use crate::{
    builder::SinkBuilder,
    define_worker,
    worker::TrySend,
    MetricFuture,
};

impl<T: AsRef<Path> + Send + Sync + Unpin + 'static> SinkBuilder<T, UnixDatagram> {
    /// Creates a customized instance of the [`TokioUnixMetricSink`](crate::unix::TokioUnixMetricSink).
    ///
    /// # Errors
    ///
    /// Returns an error when the configured queue capacity is 0.
    pub fn build(self) -> MetricResult<(TokioUnixMetricSink, MetricFuture)> {
        self.check_queue_cap()?;

        let (tx, rx) = channel(self.queue_cap);
        let worker_fut = worker(rx, self.sock, self.addr);

        Ok((TokioUnixMetricSink { tx }, Box::pin(worker_fut)))
    }
}

/// Metric sink that allows clients to enqueue metrics without blocking, and sends each of
/// them as a separate datagram over a Unix domain socket using the Tokio runtime.
///
/// The same polling rules as for [`TokioUdpMetricSink`](crate::udp::TokioUdpMetricSink) apply.
///
/// ### Example
///
/// ```no_run
/// use statsd_emitter::{Client, TokioUnixMetricSink};
/// use tokio::{spawn, net::UnixDatagram};
///
/// # #[tokio::main]
/// # async fn main() -> cadence::MetricResult<()> {
/// let socket = UnixDatagram::unbound()?;
/// let (sink, process) = TokioUnixMetricSink::from("/var/run/statsd.sock", socket)?;
///
/// let processing_job = spawn(process);
///
/// {
///     let client = Client::builder().sink(sink).build()?;
///     client.incr("some.counter");
/// }
///
/// processing_job.await.unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TokioUnixMetricSink {
    tx: Sender<String>,
}

// we don't let tx panic
impl UnwindSafe for TokioUnixMetricSink {}
impl RefUnwindSafe for TokioUnixMetricSink {}

impl TokioUnixMetricSink {
    /// Creates a new metric sink for the given statsd socket path using an unbound Unix socket.
    /// Other sink parameters are defaulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be built. With the default settings this
    /// does not happen; the path is only used once metrics are sent.
    pub fn from<T: AsRef<Path> + Send + Sync + Unpin + 'static>(
        path: T,
        socket: UnixDatagram,
    ) -> MetricResult<(Self, MetricFuture)> {
        Self::builder(path, socket).build()
    }

    /// Returns a builder for creating a new metric sink for the given statsd socket path
    /// using an unbound Unix socket.
    pub fn builder<T: AsRef<Path> + Send + Sync + Unpin + 'static>(
        path: T,
        socket: UnixDatagram,
    ) -> SinkBuilder<T, UnixDatagram> {
        SinkBuilder::new(path, socket)
    }
}

impl TrySend for TokioUnixMetricSink {
    fn sender(&self) -> &Sender<String> {
        &self.tx
    }
}

impl MetricSink for TokioUnixMetricSink {
    fn emit(&self, metric: &str) -> Result<usize> {
        self.try_send(metric.to_string())?;
        Ok(metric.len())
    }
}

define_worker!(
    UnixDatagram,
    impl AsRef<Path> + Unpin,
    impl AsRef<Path> + Unpin
);
