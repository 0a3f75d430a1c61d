//! StatsD line encoding.
//!
//! A message is `<name>:<value>|<type><suffix>`, with no trailing newline: every message
//! goes out as its own datagram.

use std::time::Duration;

/// Kind of metric, which determines its type tag on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Timer,
}

impl MetricKind {
    /// Returns the type tag written after the `|` separator.
    pub fn tag(self) -> &'static str {
        match self {
            MetricKind::Counter => "c",
            MetricKind::Gauge => "g",
            MetricKind::Timer => "ms",
        }
    }
}

/// A single observation, ready to be encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricValue {
    /// Unit increment; the value token is always `1`.
    Counter,
    Gauge(i64),
    Timer(Duration),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter => MetricKind::Counter,
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Timer(_) => MetricKind::Timer,
        }
    }
}

/// Whole milliseconds in `took`, truncated toward zero.
pub fn millis(took: Duration) -> u128 {
    took.as_millis()
}

/// Encodes everything after the metric name: `:<value>|<type><suffix>`.
///
/// `suffix` is the sampling annotation produced by the
/// [`Sampler`](crate::sampler::Sampler), or empty.
pub fn encode(value: MetricValue, suffix: &str) -> String {
    let mut buf = itoa::Buffer::new();
    let token = match value {
        MetricValue::Counter => "1",
        MetricValue::Gauge(v) => buf.format(v),
        MetricValue::Timer(took) => buf.format(millis(took)),
    };

    let tag = value.kind().tag();
    let mut payload = String::with_capacity(1 + token.len() + 1 + tag.len() + suffix.len());
    payload.push(':');
    payload.push_str(token);
    payload.push('|');
    payload.push_str(tag);
    payload.push_str(suffix);
    payload
}

/// Joins a metric name and an encoded payload into one message.
pub fn message(name: &str, payload: &str) -> String {
    let mut msg = String::with_capacity(name.len() + payload.len());
    msg.push_str(name);
    msg.push_str(payload);
    msg
}

/// Same as [`message`], with `.<host>` appended to the metric name.
pub fn host_message(name: &str, host: &str, payload: &str) -> String {
    let mut msg = String::with_capacity(name.len() + 1 + host.len() + payload.len());
    msg.push_str(name);
    msg.push('.');
    msg.push_str(host);
    msg.push_str(payload);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter() {
        assert_eq!(":1|c", encode(MetricValue::Counter, ""));
        assert_eq!("foo:1|c|@0.5", message("foo", &encode(MetricValue::Counter, "|@0.5")));
    }

    #[test]
    fn gauge() {
        assert_eq!("foo:42|g", message("foo", &encode(MetricValue::Gauge(42), "")));
        assert_eq!(":-7|g", encode(MetricValue::Gauge(-7), ""));
        assert_eq!(
            ":-9223372036854775808|g",
            encode(MetricValue::Gauge(i64::MIN), "")
        );
    }

    #[test]
    fn timer() {
        let took = Duration::from_secs(60 * 60 + 30 * 60 + 45);
        assert_eq!(
            "foo:5445000|ms",
            message("foo", &encode(MetricValue::Timer(took), ""))
        );
    }

    #[test]
    fn timer_truncates() {
        assert_eq!(0, millis(Duration::from_micros(999)));
        assert_eq!(1, millis(Duration::from_nanos(1_999_999)));
        assert_eq!(":2|ms", encode(MetricValue::Timer(Duration::from_nanos(2_500_000)), ""));
    }

    #[test]
    fn timer_max() {
        assert_eq!(
            ":18446744073709551615999|ms",
            encode(MetricValue::Timer(Duration::MAX), "")
        );
    }

    #[test]
    fn host_suffix() {
        let payload = encode(MetricValue::Gauge(3), "");
        assert_eq!("foo.web01:3|g", host_message("foo", "web01", &payload));
    }

    #[test]
    fn tags() {
        assert_eq!("c", MetricKind::Counter.tag());
        assert_eq!("g", MetricKind::Gauge.tag());
        assert_eq!("ms", MetricKind::Timer.tag());
        assert_eq!(MetricKind::Timer, MetricValue::Timer(Duration::ZERO).kind());
    }
}
