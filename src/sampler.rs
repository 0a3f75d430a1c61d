//! Sampling decisions.

use parking_lot::Mutex;
use rand::{
    rngs::StdRng,
    Rng,
    SeedableRng,
};

/// Per-call sampling options.
///
/// The default (`rate` 1.0, `always_send` off) sends every observation without
/// a sample-rate annotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    /// Fraction of calls that should reach the server.
    pub rate: f64,
    /// Send every call while still annotating it with `rate`. Useful when the
    /// caller already does its own sampling.
    pub always_send: bool,
}

impl Options {
    /// Options sampling at `rate`.
    pub fn sampled(rate: f64) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    /// Sets the always-send override.
    pub fn always_send(mut self, always_send: bool) -> Self {
        self.always_send = always_send;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rate: 1.0,
            always_send: false,
        }
    }
}

/// Outcome of a sampling decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Nothing is sent for this call.
    Drop,
    /// Send, appending the given suffix (empty when unsampled) to the payload.
    Send(String),
}

/// Decides which observations are transmitted.
///
/// The random source is seeded once and shared by every call made through
/// the sampler.
#[derive(Debug)]
pub struct Sampler {
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Creates a sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a sampler with a fixed seed, for reproducible sampling.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws at most one value from the random source and decides whether this
    /// observation goes out.
    pub fn decide(&self, options: &Options) -> Decision {
        if options.rate == 1.0 {
            return Decision::Send(String::new());
        }

        if !options.always_send && self.rng.lock().gen::<f64>() >= options.rate {
            return Decision::Drop;
        }

        Decision::Send(suffix(options.rate))
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats the `|@rate` annotation with the shortest decimal that round-trips.
pub fn suffix(rate: f64) -> String {
    format!("|@{}", rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsampled() {
        let sampler = Sampler::new();
        for _ in 0..100 {
            assert_eq!(Decision::Send(String::new()), sampler.decide(&Options::default()));
        }
    }

    #[test]
    fn always_send() {
        let sampler = Sampler::new();
        let options = Options::sampled(0.1).always_send(true);
        for _ in 0..100 {
            assert_eq!(Decision::Send("|@0.1".to_string()), sampler.decide(&options));
        }
    }

    #[test]
    fn follows_draws() {
        const SEED: u64 = 2;
        const RATE: f64 = 0.25;

        let sampler = Sampler::seeded(SEED);
        let mut draws = StdRng::seed_from_u64(SEED);
        let options = Options::sampled(RATE);

        let mut sent = 0;
        for _ in 0..1000 {
            let expected = if draws.gen::<f64>() < RATE {
                sent += 1;
                Decision::Send("|@0.25".to_string())
            } else {
                Decision::Drop
            };

            assert_eq!(expected, sampler.decide(&options));
        }

        assert!(sent > 0 && sent < 1000);
    }

    #[test]
    fn never_below_zero() {
        let sampler = Sampler::new();
        for _ in 0..100 {
            assert_eq!(Decision::Drop, sampler.decide(&Options::sampled(0.0)));
        }
    }

    #[test]
    fn formatting() {
        assert_eq!("|@0.5", suffix(0.5));
        assert_eq!("|@0.1", suffix(0.1));
        assert_eq!("|@0.25", suffix(0.25));
        assert_eq!("|@0.001", suffix(0.001));
        assert_eq!("|@0.333", suffix(0.333));
    }
}
