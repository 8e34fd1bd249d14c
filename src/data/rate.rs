//! Throughput from monotonic counters that occasionally restart.

use blockwatch_types::RateSnapshot;
use chrono::TimeDelta;

use super::error::ParseError;
use super::event::Timestamp;
use super::history::BoundedHistory;

/// Derives a per-second rate and a lifetime total from a raw counter.
///
/// The source counters only grow within a run but restart from a lower value
/// when the subsystem is restarted or a resync begins. Any decrease is taken
/// as such a restart: the new reading counts in full as the first delta of
/// the new run, so `total` never goes backwards.
///
/// Replaying an identical reading adds a zero delta: `total` and
/// `per_second` are unaffected, but a `0` is pushed onto `previous`.
///
/// Restarts to a negative reading contribute nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTracker {
    initial: i64,
    current: i64,
    last_sample: Option<Timestamp>,
    pub previous: BoundedHistory,
    pub per_second: f64,
    pub total: f64,
    new: bool,
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new(BoundedHistory::default().max_len())
    }
}

impl RateTracker {
    /// Create a tracker keeping `history_len` recent deltas.
    pub fn new(history_len: usize) -> Self {
        Self {
            initial: 0,
            current: 0,
            last_sample: None,
            previous: BoundedHistory::new(history_len),
            per_second: 0.0,
            total: 0.0,
            new: true,
        }
    }

    /// Fold in a raw counter reading taken at `at`.
    ///
    /// The rate is measured from this counter's previous successful sample,
    /// so events that do not carry the counter do not shorten the interval.
    pub fn sample(
        &mut self,
        at: Timestamp,
        field: &'static str,
        raw: &str,
    ) -> Result<(), ParseError> {
        let elapsed = self.last_sample.map_or(TimeDelta::zero(), |last| at - last);
        self.calculate(elapsed, field, raw)?;
        self.last_sample = Some(at);
        Ok(())
    }

    /// Fold in a raw counter reading taken `elapsed` after the previous one.
    ///
    /// A zero or negative `elapsed` yields a rate of zero. On a parse failure
    /// nothing changes.
    pub fn calculate(
        &mut self,
        elapsed: TimeDelta,
        field: &'static str,
        raw: &str,
    ) -> Result<(), ParseError> {
        let v: i64 = raw
            .trim()
            .parse()
            .map_err(|e| ParseError::new(field, raw, e))?;
        self.record(elapsed, v);
        Ok(())
    }

    /// Fold in an already parsed reading.
    pub fn record(&mut self, elapsed: TimeDelta, v: i64) {
        if self.new {
            self.initial = v;
            self.current = v;
            self.previous.push(0.0);
            self.per_second = 0.0;
            self.total = 0.0;
            self.new = false;
            return;
        }

        let diff = if v < self.current {
            // Counter restarted: the new run contributes its full value.
            self.initial = v;
            v.max(0) as f64
        } else {
            (i128::from(v) - i128::from(self.current)) as f64
        };

        self.current = v;
        self.previous.push(diff);

        let secs = elapsed.num_microseconds().unwrap_or(0) as f64 / 1_000_000.0;
        self.per_second = if secs > 0.0 { diff / secs } else { 0.0 };

        self.total += diff;
    }

    /// Baseline reading of the current monotonic run.
    pub fn initial(&self) -> i64 {
        self.initial
    }

    /// Most recent raw reading.
    pub fn current(&self) -> i64 {
        self.current
    }

    /// Timestamp of the last reading folded in through [`RateTracker::sample`].
    pub fn last_sample(&self) -> Option<Timestamp> {
        self.last_sample
    }

    /// True until the first reading has been processed.
    pub fn is_new(&self) -> bool {
        self.new
    }

    pub fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            per_second: self.per_second,
            total: self.total,
            history: self.previous.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> RateTracker {
        RateTracker::new(5)
    }

    fn at(secs: i64) -> Timestamp {
        chrono::DateTime::parse_from_rfc3339("2017-02-15T12:57:53.000000-08:00").unwrap()
            + TimeDelta::seconds(secs)
    }

    #[test]
    fn sample_measures_from_previous_sample() {
        let mut r = rate();
        r.sample(at(0), "read", "0").unwrap();
        r.sample(at(10), "read", "1000").unwrap();

        assert_eq!(r.per_second, 100.0);
        assert_eq!(r.last_sample(), Some(at(10)));
    }

    #[test]
    fn failed_sample_keeps_previous_timestamp() {
        let mut r = rate();
        r.sample(at(0), "read", "0").unwrap();
        assert!(r.sample(at(5), "read", "garbage").is_err());
        assert_eq!(r.last_sample(), Some(at(0)));

        r.sample(at(10), "read", "500").unwrap();
        assert_eq!(r.per_second, 50.0);
    }

    #[test]
    fn extreme_readings_never_shrink_total() {
        let mut r = rate();
        r.record(TimeDelta::zero(), -1);
        r.record(TimeDelta::seconds(1), i64::MAX);
        assert!(r.total > 0.0);
        let before = r.total;

        // Restart to a negative value adds nothing
        r.record(TimeDelta::seconds(1), i64::MIN);
        assert_eq!(r.total, before);
        assert_eq!(r.per_second, 0.0);

        r.record(TimeDelta::seconds(1), i64::MAX);
        assert!(r.total >= before);
        assert!(r.total.is_finite());
    }

    #[test]
    fn first_sample_sets_baseline() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "100").unwrap();

        assert_eq!(r.initial(), 100);
        assert_eq!(r.current(), 100);
        assert_eq!(r.previous.to_vec(), vec![0.0]);
        assert_eq!(r.per_second, 0.0);
        assert_eq!(r.total, 0.0);
        assert!(!r.is_new());
    }

    #[test]
    fn monotonic_sample_accumulates() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "100").unwrap();
        r.calculate(TimeDelta::seconds(1), "read", "200").unwrap();

        assert_eq!(r.initial(), 100);
        assert_eq!(r.current(), 200);
        assert_eq!(r.previous.to_vec(), vec![0.0, 100.0]);
        assert_eq!(r.per_second, 100.0);
        assert_eq!(r.total, 100.0);
    }

    #[test]
    fn decrease_is_treated_as_restart() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "100").unwrap();
        r.calculate(TimeDelta::seconds(1), "read", "200").unwrap();
        r.calculate(TimeDelta::seconds(1), "read", "50").unwrap();

        assert_eq!(r.total, 150.0);
        assert_eq!(r.initial(), 50);
        assert_eq!(r.current(), 50);
        assert_eq!(r.per_second, 50.0);
        assert_eq!(r.previous.to_vec(), vec![0.0, 100.0, 50.0]);
    }

    #[test]
    fn rate_normalises_by_elapsed_time() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "sent", "0").unwrap();
        r.calculate(TimeDelta::milliseconds(500), "sent", "300").unwrap();
        assert_eq!(r.per_second, 600.0);
    }

    #[test]
    fn zero_or_negative_elapsed_gives_zero_rate() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "10").unwrap();

        r.calculate(TimeDelta::zero(), "read", "20").unwrap();
        assert_eq!(r.per_second, 0.0);
        assert_eq!(r.total, 10.0);

        r.calculate(TimeDelta::seconds(-2), "read", "30").unwrap();
        assert_eq!(r.per_second, 0.0);
        assert_eq!(r.total, 20.0);
    }

    #[test]
    fn replaying_same_reading_pushes_zero_delta() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "100").unwrap();
        r.calculate(TimeDelta::seconds(1), "read", "200").unwrap();
        r.calculate(TimeDelta::zero(), "read", "200").unwrap();

        assert_eq!(r.total, 100.0);
        assert_eq!(r.per_second, 0.0);
        assert_eq!(r.previous.to_vec(), vec![0.0, 100.0, 0.0]);
    }

    #[test]
    fn history_is_bounded() {
        let mut r = RateTracker::new(3);
        for (i, v) in [0, 10, 30, 60, 100].iter().enumerate() {
            r.calculate(TimeDelta::seconds(i as i64), "read", &v.to_string())
                .unwrap();
        }
        assert_eq!(r.previous.to_vec(), vec![20.0, 30.0, 40.0]);
        assert_eq!(r.total, 100.0);
    }

    #[test]
    fn parse_failure_leaves_state_untouched() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "100").unwrap();
        let before = r.clone();

        let err = r
            .calculate(TimeDelta::seconds(1), "read", "1e3")
            .unwrap_err();
        assert_eq!(err.field, "read");
        assert_eq!(r, before);
    }

    #[test]
    fn failed_first_sample_keeps_tracker_new() {
        let mut r = rate();
        assert!(r.calculate(TimeDelta::zero(), "read", "").is_err());
        assert!(r.is_new());
        assert!(r.previous.is_empty());
    }

    #[test]
    fn snapshot_copies_outputs() {
        let mut r = rate();
        r.calculate(TimeDelta::zero(), "read", "1").unwrap();
        r.calculate(TimeDelta::seconds(2), "read", "9").unwrap();

        let snap = r.snapshot();
        assert_eq!(snap.per_second, 4.0);
        assert_eq!(snap.total, 8.0);
        assert_eq!(snap.history, vec![0.0, 8.0]);
    }
}
