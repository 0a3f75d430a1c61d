//! Lazily established, cached metric sink.

use cadence::{
    ErrorKind as MetricErrorKind,
    MetricError,
    MetricResult,
    MetricSink,
    UdpMetricSink,
};

use log::*;
use parking_lot::RwLock;
use std::{
    net::{
        Ipv4Addr,
        Ipv6Addr,
        SocketAddr,
        ToSocketAddrs,
        UdpSocket,
    },
    sync::Arc,
};

/// A sink shared between all users of a client.
pub type SharedSink = Arc<dyn MetricSink + Send + Sync>;

/// Establishes a new sink. Called whenever the cache is empty.
pub trait Dial: Send + Sync {
    fn dial(&self) -> MetricResult<Box<dyn MetricSink + Send + Sync>>;
}

impl<F> Dial for F
where
    F: Fn() -> MetricResult<Box<dyn MetricSink + Send + Sync>> + Send + Sync,
{
    fn dial(&self) -> MetricResult<Box<dyn MetricSink + Send + Sync>> {
        self()
    }
}

/// Dials a StatsD server over UDP.
///
/// The address is resolved on every dial and the first result is used. The local socket
/// is bound to the unspecified address of the same family and set to non-blocking.
#[derive(Clone, Debug)]
pub struct UdpDialer {
    addr: String,
}

impl UdpDialer {
    pub fn new<T: Into<String>>(addr: T) -> Self {
        Self { addr: addr.into() }
    }
}

impl Dial for UdpDialer {
    fn dial(&self) -> MetricResult<Box<dyn MetricSink + Send + Sync>> {
        let mut addrs = self.addr.to_socket_addrs()?;
        let addr = addrs.next().ok_or_else(|| {
            MetricError::from((MetricErrorKind::InvalidInput, "No socket addresses yielded"))
        })?;

        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;

        debug!("dialed {} ({})", self.addr, addr);

        Ok(Box::new(UdpMetricSink::from(addr, socket)?))
    }
}

/// Holds at most one sink, dialing it on first use.
///
/// Once cached, the sink is kept for the life of the cache. Write failures leave it in
/// place unless `reconnect_on_error` is set, in which case the failing sink is dropped
/// and the next call dials again.
pub(crate) struct SinkCache {
    dialer: Option<Box<dyn Dial>>,
    sink: RwLock<Option<SharedSink>>,
    reconnect_on_error: bool,
}

impl SinkCache {
    pub(crate) fn new(dialer: Box<dyn Dial>, reconnect_on_error: bool) -> Self {
        Self {
            dialer: Some(dialer),
            sink: RwLock::new(None),
            reconnect_on_error,
        }
    }

    /// A cache that never dials and always hands out `sink`.
    pub(crate) fn with_sink(sink: SharedSink) -> Self {
        Self {
            dialer: None,
            sink: RwLock::new(Some(sink)),
            reconnect_on_error: false,
        }
    }

    /// Returns the cached sink, dialing one if there is none.
    pub(crate) fn ensure(&self) -> MetricResult<SharedSink> {
        if let Some(sink) = self.sink.read().as_ref() {
            return Ok(sink.clone());
        }

        let mut slot = self.sink.write();
        if let Some(sink) = slot.as_ref() {
            return Ok(sink.clone());
        }

        let dialer = self.dialer.as_ref().ok_or_else(|| {
            MetricError::from((MetricErrorKind::InvalidInput, "No sink and no dialer"))
        })?;

        let sink: SharedSink = Arc::from(dialer.dial()?);
        *slot = Some(sink.clone());
        Ok(sink)
    }

    /// Writes one message. Errors are logged and otherwise ignored.
    pub(crate) fn write(&self, sink: &SharedSink, msg: &str) {
        trace!("write: {}", msg);

        if let Err(e) = sink.emit(msg) {
            debug!("failed to send metric: {:?}", e);

            if self.reconnect_on_error {
                self.invalidate(sink);
            }
        }
    }

    fn invalidate(&self, failed: &SharedSink) {
        let mut slot = self.sink.write();
        if slot.as_ref().map_or(false, |sink| Arc::ptr_eq(sink, failed)) {
            debug!("dropping failed sink");
            *slot = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.sink.read().is_none()
    }
}
