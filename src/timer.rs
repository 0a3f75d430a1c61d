use std::time::{
    Duration,
    Instant,
};

use crate::{
    client::Client,
    sampler::Options,
    wire::MetricValue,
};

/// A stopwatch that reports elapsed time through a [Client].
///
/// Sending does not stop or reset the timer, so a timer may be sent any number of times,
/// or [reset](Timer::reset) and reused across iterations of a loop.
#[derive(Clone, Debug)]
pub struct Timer {
    client: Client,
    start: Instant,
}

impl Timer {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            start: Instant::now(),
        }
    }

    /// Restarts the timer from now.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Time since the timer was created or last reset.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Sends the time elapsed since the timer started to each of `names`, using the
    /// client's default options.
    ///
    /// Returns the elapsed time, even when sampling meant nothing was sent.
    pub fn send<I, S>(&self, names: I) -> Duration
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.send_with_options(&self.client.default_options(), names)
    }

    /// Works like [send](Timer::send), with the given options. A single sampling decision
    /// covers all of `names`.
    pub fn send_with_options<I, S>(&self, options: &Options, names: I) -> Duration
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let took = self.elapsed();
        self.client.emit(names, MetricValue::Timer(took), options);
        took
    }

    /// Works like [send](Timer::send), sampled at `rate`.
    #[deprecated = "please use `send_with_options` instead"]
    pub fn send_sampled<I, S>(&self, rate: f64, names: I) -> Duration
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.send_with_options(&Options::sampled(rate), names)
    }
}
