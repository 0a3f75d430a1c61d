//! The metric emitter.

use log::*;
use std::{
    fmt,
    sync::Arc,
    time::Duration,
};

use crate::{
    builder::ClientBuilder,
    sampler::{
        Decision,
        Options,
        Sampler,
    },
    timer::Timer,
    transport::SinkCache,
    wire::{
        self,
        MetricValue,
    },
};

/// Sends counters, gauges and timings to a StatsD server.
///
/// Every operation is best effort: sampling may drop it, and dial or write failures are
/// logged at debug level and otherwise ignored. Nothing is ever returned to the caller
/// about delivery.
///
/// When host name appending is enabled (the default), every message is sent twice: once
/// under its own name, and once under `<name>.<host>`.
///
/// Clients are cheap to clone; clones share the same sink and random source.
///
/// ### Example
///
/// ```no_run
/// use statsd_emitter::{Client, Options};
/// use std::time::Duration;
///
/// # fn main() -> cadence::MetricResult<()> {
/// let client = Client::new()?;
///
/// client.incr("stats.success");
/// client.gauge("page.size", 10);
/// client.time("work.duration", Duration::from_millis(250));
/// client.incr_with_options("stats.sampled", &Options::sampled(0.5));
///
/// let timer = client.timer();
/// // Do work
/// let took = timer.send(["work.duration", "work.duration.all"]);
/// println!("took {:?}", took);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    host: String,
    append_host: bool,
    options: Options,
    sampler: Sampler,
    transport: SinkCache,
}

impl Client {
    /// Creates a client with the default configuration, sending to
    /// [DEFAULT_ADDRESS](crate::DEFAULT_ADDRESS) with host name appending enabled.
    ///
    /// # Errors
    ///
    /// Returns an error when the local host name cannot be determined.
    pub fn new() -> cadence::MetricResult<Self> {
        Self::builder().build()
    }

    /// Returns a builder for configuring a new client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        host: String,
        append_host: bool,
        options: Options,
        sampler: Sampler,
        transport: SinkCache,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                append_host,
                options,
                sampler,
                transport,
            }),
        }
    }

    /// Host name appended to metric names.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Whether metrics are also sent under `<name>.<host>`.
    pub fn append_host(&self) -> bool {
        self.inner.append_host
    }

    /// Options used by the calls that don't take their own.
    pub fn default_options(&self) -> Options {
        self.inner.options
    }

    /// Increments a counter by one.
    pub fn incr(&self, name: &str) {
        self.incr_with_options(name, &self.inner.options);
    }

    /// Increments a counter by one, sampled according to `options`.
    pub fn incr_with_options(&self, name: &str, options: &Options) {
        self.emit([name], MetricValue::Counter, options);
    }

    /// Increments a counter by one, sampled at `rate`.
    #[deprecated = "please use `incr_with_options` instead"]
    pub fn incr_sampled(&self, name: &str, rate: f64) {
        self.incr_with_options(name, &Options::sampled(rate));
    }

    /// Sets a gauge to an arbitrary value.
    pub fn gauge(&self, name: &str, value: i64) {
        self.gauge_with_options(name, value, &self.inner.options);
    }

    /// Sets a gauge to an arbitrary value, sampled according to `options`.
    pub fn gauge_with_options(&self, name: &str, value: i64, options: &Options) {
        self.emit([name], MetricValue::Gauge(value), options);
    }

    /// Sets a gauge to an arbitrary value, sampled at `rate`.
    #[deprecated = "please use `gauge_with_options` instead"]
    pub fn gauge_sampled(&self, name: &str, value: i64, rate: f64) {
        self.gauge_with_options(name, value, &Options::sampled(rate));
    }

    /// Sends a duration, in whole milliseconds.
    pub fn time(&self, name: &str, took: Duration) {
        self.time_with_options(name, took, &self.inner.options);
    }

    /// Sends a duration, in whole milliseconds, sampled according to `options`.
    pub fn time_with_options(&self, name: &str, took: Duration, options: &Options) {
        self.emit([name], MetricValue::Timer(took), options);
    }

    /// Sends a duration, in whole milliseconds, sampled at `rate`.
    #[deprecated = "please use `time_with_options` instead"]
    pub fn time_sampled(&self, name: &str, took: Duration, rate: f64) {
        self.time_with_options(name, took, &Options::sampled(rate));
    }

    /// Starts a [Timer] that reports through this client.
    pub fn timer(&self) -> Timer {
        Timer::new(self.clone())
    }

    /// Makes one sampling decision and, if it passes, sends the same payload to every name.
    pub(crate) fn emit<I, S>(&self, names: I, value: MetricValue, options: &Options)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffix = match self.inner.sampler.decide(options) {
            Decision::Send(suffix) => suffix,
            Decision::Drop => return,
        };

        let mut names = names.into_iter().peekable();
        if names.peek().is_none() {
            return;
        }

        let payload = wire::encode(value, &suffix);

        let transport = &self.inner.transport;
        let sink = match transport.ensure() {
            Ok(sink) => sink,
            Err(e) => {
                debug!("dropping metric, no sink: {}", e);
                return;
            }
        };

        for name in names {
            let name = name.as_ref();
            transport.write(&sink, &wire::message(name, &payload));

            if self.inner.append_host {
                transport.write(&sink, &wire::host_message(name, &self.inner.host, &payload));
            }
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.host)
            .field("append_host", &self.inner.append_host)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
