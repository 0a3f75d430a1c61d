//! Queued metric sink that sends datagrams over UDP from a Tokio task.

use cadence::{
    ErrorKind as MetricErrorKind,
    MetricError,
    MetricResult,
    MetricSink,
};

use std::{
    io::Result,
    net::{
        SocketAddr,
        ToSocketAddrs,
    },
    panic::{
        RefUnwindSafe,
        UnwindSafe,
    },
};

use tokio::{
    net::UdpSocket,
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

impl<T: ToSocketAddrs> SinkBuilder<T, UdpSocket> {
    /// Creates a customized instance of the [`TokioUdpMetricSink`](crate::udp::TokioUdpMetricSink).
    ///
    /// # Errors
    ///
    /// Returns an error when the queue capacity is 0 or the address does not resolve.
    pub fn build(self) -> MetricResult<(TokioUdpMetricSink, MetricFuture)> {
        self.check_queue_cap()?;

        let mut addrs = self.addr.to_socket_addrs()?;
        let addr = addrs.next().ok_or_else(|| {
            MetricError::from((MetricErrorKind::InvalidInput, "No socket addresses yielded"))
        })?;

        let (tx, rx) = channel(self.queue_cap);
        let worker_fut = worker(rx, self.sock, addr);

        Ok((TokioUdpMetricSink { tx }, Box::pin(worker_fut)))
    }
}

/// Metric sink that allows clients to enqueue metrics without blocking, and sends each
/// of them as a separate UDP datagram using the Tokio runtime.
///
/// Exceeding the configured queue capacity results in a `WouldBlock` error, which the
/// [Client](crate::Client) logs and drops like any other write failure.
///
/// ## Important!
/// The application is responsible for polling the processing future created along with the
/// sink (e.g., spawning it on the Tokio runtime), and should wait for it to complete *after*
/// dropping every client that uses the sink.
///
/// ### Example
///
/// ```no_run
/// use statsd_emitter::{Client, TokioUdpMetricSink};
/// use tokio::{spawn, net::UdpSocket};
///
/// # #[tokio::main]
/// # async fn main() -> cadence::MetricResult<()> {
/// let socket = UdpSocket::bind("0.0.0.0:0").await?;
/// let (sink, process) = TokioUdpMetricSink::from("metrics.example.com:8125", socket)?;
///
/// let processing_job = spawn(process);
///
/// {
///     let client = Client::builder().sink(sink).build()?;
///     client.incr("some.counter");
///     client.gauge("some.thing", 7);
/// }
///
/// processing_job.await.unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TokioUdpMetricSink {
    tx: Sender<String>,
}

// we don't let tx panic
impl UnwindSafe for TokioUdpMetricSink {}
impl RefUnwindSafe for TokioUdpMetricSink {}

impl TokioUdpMetricSink {
    /// Creates a new metric sink for the given statsd host using a previously bound UDP socket.
    /// Other sink parameters are defaulted.
    ///
    /// # Errors
    ///
    /// Returns an error when the host does not resolve to any socket address.
    pub fn from<T: ToSocketAddrs>(
        host: T,
        socket: UdpSocket,
    ) -> MetricResult<(Self, MetricFuture)> {
        Self::builder(host, socket).build()
    }

    /// Returns a builder for creating a new metric sink for the given statsd host
    /// using a previously bound UDP socket.
    pub fn builder<T: ToSocketAddrs>(host: T, socket: UdpSocket) -> SinkBuilder<T, UdpSocket> {
        SinkBuilder::new(host, socket)
    }
}

impl TrySend for TokioUdpMetricSink {
    fn sender(&self) -> &Sender<String> {
        &self.tx
    }
}

impl MetricSink for TokioUdpMetricSink {
    fn emit(&self, metric: &str) -> Result<usize> {
        self.try_send(metric.to_string())?;
        Ok(metric.len())
    }
}

define_worker!(UdpSocket, SocketAddr);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Client;
    use log::debug;
    use tokio::spawn;

    #[tokio::test]
    async fn from() -> MetricResult<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let result = TokioUdpMetricSink::from("127.0.0.1:8125", socket);

        assert!(result.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn from_bad_address() -> MetricResult<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let result = TokioUdpMetricSink::from("bad address", socket);

        assert!(result.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn zero_queue_cap() -> MetricResult<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let mut builder = TokioUdpMetricSink::builder("127.0.0.1:8125", socket);
        builder.queue_cap(0);

        assert!(builder.build().is_err());

        Ok(())
    }

    #[tokio::test]
    async fn emit() -> MetricResult<()> {
        pretty_env_logger::try_init().ok();

        let server_socket = UdpSocket::bind("127.0.0.1:0").await?;
        let server_addr = server_socket.local_addr()?;

        debug!("server socket: {}", server_addr);

        let socket = UdpSocket::bind("0.0.0.0:0").await?;

        debug!("local socket: {}", socket.local_addr()?);

        let (sink, fut) =
            TokioUdpMetricSink::from(format!("127.0.0.1:{}", server_addr.port()), socket)?;

        let worker = spawn(fut);

        const MSG: &str = "foo:1|c";
        let n = sink.emit(MSG)?;
        assert_eq!(MSG.len(), n);

        let mut buf = [0; 8192];
        let (received, addr) = server_socket.recv_from(&mut buf).await?;

        debug!(
            "received {} bytes from {} with {}",
            received,
            addr,
            String::from_utf8_lossy(&buf[..received])
        );

        assert_eq!(MSG.len(), received);
        assert_eq!(MSG, String::from_utf8_lossy(&buf[..received]));

        drop(sink);
        worker.await.unwrap();
        Ok(())
    }

    #[tokio::test]
    async fn client_with_host_suffix() -> MetricResult<()> {
        pretty_env_logger::try_init().ok();

        let server_socket = UdpSocket::bind("127.0.0.1:0").await?;
        let server_addr = server_socket.local_addr()?;

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let (sink, fut) =
            TokioUdpMetricSink::from(format!("127.0.0.1:{}", server_addr.port()), socket)?;

        let worker = spawn(fut);

        {
            let client = Client::builder().host("web01").sink(sink).build()?;
            client.gauge("page.size", 10);
        }

        let mut buf = [0; 8192];
        let (received, _) = server_socket.recv_from(&mut buf).await?;
        assert_eq!("page.size:10|g", String::from_utf8_lossy(&buf[..received]));

        let (received, _) = server_socket.recv_from(&mut buf).await?;
        assert_eq!(
            "page.size.web01:10|g",
            String::from_utf8_lossy(&buf[..received])
        );

        worker.await.unwrap();
        Ok(())
    }
}
