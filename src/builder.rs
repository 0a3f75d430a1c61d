//! Builders for configuring clients and asynchronous metric sinks.

use cadence::{
    ErrorKind as MetricErrorKind,
    MetricError,
    MetricResult,
    MetricSink,
};

use std::sync::Arc;

use crate::{
    client::Client,
    sampler::{
        Options,
        Sampler,
    },
    transport::{
        Dial,
        SinkCache,
        UdpDialer,
    },
    DEFAULT_ADDRESS,
    DEFAULT_QUEUE_CAPACITY,
};

/// ClientBuilder allows you to override the default configuration before creating a
/// [Client](crate::Client).
///
/// ```no_run
/// use statsd_emitter::{Client, Options};
///
/// # fn main() -> cadence::MetricResult<()> {
/// let client = Client::builder()
///     .address("metrics.example.com:8125")
///     .append_host(false)
///     .options(Options::sampled(0.5))
///     .build()?;
///
/// client.incr("some.counter");
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    address: String,
    append_host: bool,
    host: Option<String>,
    options: Options,
    dialer: Option<Box<dyn Dial>>,
    sink: Option<Arc<dyn MetricSink + Send + Sync>>,
    reconnect_on_error: bool,
    seed: Option<u64>,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            append_host: true,
            host: None,
            options: Options::default(),
            dialer: None,
            sink: None,
            reconnect_on_error: false,
            seed: None,
        }
    }

    /// Sets the `host:port` of the StatsD server (default: [DEFAULT_ADDRESS](crate::DEFAULT_ADDRESS)).
    pub fn address<T: Into<String>>(mut self, address: T) -> Self {
        self.address = address.into();
        self
    }

    /// Sets whether every metric is also sent with the local host name appended to its
    /// name (default: `true`).
    pub fn append_host(mut self, append_host: bool) -> Self {
        self.append_host = append_host;
        self
    }

    /// Uses the given host name instead of resolving the local one.
    pub fn host<T: Into<String>>(mut self, host: T) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the options used by calls that don't take their own (default: always send,
    /// unsampled).
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Drops a sink after a failed write so that the next metric dials a new one
    /// (default: `false`, the first sink is kept for the life of the client).
    pub fn reconnect_on_error(mut self, reconnect_on_error: bool) -> Self {
        self.reconnect_on_error = reconnect_on_error;
        self
    }

    /// Seeds the sampling random source, making sampling decisions reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Uses a custom dialer instead of dialing [address](Self::address) over UDP.
    pub fn dialer<D: Dial + 'static>(mut self, dialer: D) -> Self {
        self.dialer = Some(Box::new(dialer));
        self
    }

    /// Sends every metric to an already established sink. No dialing takes place,
    /// and the address, dialer and reconnect settings are ignored.
    pub fn sink<S: MetricSink + Send + Sync + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Creates the client.
    ///
    /// # Errors
    ///
    /// Returns an error when no host name was given and the local host name is empty or
    /// not valid UTF-8.
    pub fn build(self) -> MetricResult<Client> {
        let host = match self.host {
            Some(host) => host,
            None => local_host()?,
        };

        let sampler = match self.seed {
            Some(seed) => Sampler::seeded(seed),
            None => Sampler::new(),
        };

        let transport = match self.sink {
            Some(sink) => SinkCache::with_sink(sink),
            None => {
                let dialer: Box<dyn Dial> = match self.dialer {
                    Some(dialer) => dialer,
                    None => Box::new(UdpDialer::new(self.address)),
                };

                SinkCache::new(dialer, self.reconnect_on_error)
            }
        };

        Ok(Client::from_parts(
            host,
            self.append_host,
            self.options,
            sampler,
            transport,
        ))
    }
}

fn local_host() -> MetricResult<String> {
    let host = gethostname::gethostname().into_string().map_err(|_| {
        MetricError::from((MetricErrorKind::InvalidInput, "Host name is not valid UTF-8"))
    })?;

    if host.is_empty() {
        return Err(MetricError::from((
            MetricErrorKind::InvalidInput,
            "Host name is empty",
        )));
    }

    Ok(host)
}

/// SinkBuilder allows you to override various default parameter values before creating an
/// instance of the desired queued metric sink.
#[derive(Debug)]
pub struct SinkBuilder<T, S> {
    pub(crate) addr: T,
    pub(crate) sock: S,
    pub(crate) queue_cap: usize,
}

impl<T, S> SinkBuilder<T, S> {
    pub(crate) fn new(addr: T, sock: S) -> Self {
        Self {
            addr,
            sock,
            queue_cap: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Sets the maximum metric queue capacity (default: [DEFAULT_QUEUE_CAPACITY](crate::DEFAULT_QUEUE_CAPACITY)).
    pub fn queue_cap(&mut self, queue_cap: usize) -> &mut Self {
        self.queue_cap = queue_cap;
        self
    }

    pub(crate) fn check_queue_cap(&self) -> MetricResult<()> {
        if self.queue_cap == 0 {
            return Err(MetricError::from((
                MetricErrorKind::InvalidInput,
                "Queue capacity must be greater than 0",
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() -> MetricResult<()> {
        let client = ClientBuilder::new().build()?;

        assert!(client.append_host());
        assert!(!client.host().is_empty());
        assert_eq!(Options::default(), client.default_options());

        Ok(())
    }

    #[test]
    fn overrides() -> MetricResult<()> {
        let client = ClientBuilder::new()
            .host("web01")
            .append_host(false)
            .options(Options::sampled(0.5))
            .build()?;

        assert!(!client.append_host());
        assert_eq!("web01", client.host());
        assert_eq!(Options::sampled(0.5), client.default_options());

        Ok(())
    }

    #[test]
    fn zero_queue_cap() {
        let mut builder = SinkBuilder::new((), ());
        assert!(builder.check_queue_cap().is_ok());

        builder.queue_cap(0);
        assert!(builder.check_queue_cap().is_err());
    }
}
