//! Bounded history of recent samples for sparklines.

use std::collections::VecDeque;

/// Default number of samples kept per tracker.
pub const DEFAULT_HISTORY_LEN: usize = 20;

/// A FIFO of floating-point samples with a fixed capacity.
///
/// Pushing beyond capacity evicts from the front, so the buffer always holds
/// the most recent `max_len` values, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory {
    max_len: usize,
    values: VecDeque<f64>,
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl BoundedHistory {
    /// Create an empty history holding at most `max_len` samples.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            values: VecDeque::with_capacity(max_len),
        }
    }

    /// Append a sample, evicting the oldest ones past capacity.
    pub fn push(&mut self, v: f64) {
        self.values.push_back(v);
        while self.values.len() > self.max_len {
            self.values.pop_front();
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Scale the samples to `0..=7` for an eight-level sparkline.
    ///
    /// Returns an empty Vec if there are fewer than two samples.
    pub fn sparkline_levels(&self) -> Vec<u8> {
        normalize_levels(&self.to_vec())
    }
}

/// Scale values to `0..=7` relative to their own range.
pub fn normalize_levels(values: &[f64]) -> Vec<u8> {
    if values.len() < 2 {
        return Vec::new();
    }

    let max = values.iter().copied().fold(f64::MIN, f64::max).max(1.0);
    let min = values.iter().copied().fold(f64::MAX, f64::min).min(0.0);
    let range = (max - min).max(1.0);

    values
        .iter()
        .map(|&v| {
            let normalized = ((v - min) / range * 7.0) as u8;
            normalized.min(7)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_empty() {
        let h = BoundedHistory::new(5);
        assert!(h.is_empty());
        assert_eq!(h.max_len(), 5);
    }

    #[test]
    fn push_keeps_last_max_len_values_oldest_first() {
        let mut prev = BoundedHistory::new(2);

        prev.push(10.10);
        assert_eq!(prev.to_vec(), vec![10.10]);

        prev.push(15.9);
        prev.push(200.5);
        assert_eq!(prev.to_vec(), vec![15.9, 200.5]);
    }

    #[test]
    fn history_caps_at_max_size() {
        let mut h = BoundedHistory::new(60);
        for i in 0..70 {
            h.push(i as f64);
        }
        assert_eq!(h.len(), 60);
        assert_eq!(h.iter().next(), Some(10.0));
        assert_eq!(h.iter().last(), Some(69.0));
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut h = BoundedHistory::new(0);
        h.push(1.0);
        assert!(h.is_empty());
    }

    #[test]
    fn sparkline_empty_with_single_sample() {
        let mut h = BoundedHistory::new(8);
        h.push(100.0);
        assert!(h.sparkline_levels().is_empty());
    }

    #[test]
    fn sparkline_scales_to_eight_levels() {
        let mut h = BoundedHistory::new(8);
        for v in [0.0, 50.0, 100.0] {
            h.push(v);
        }
        assert_eq!(h.sparkline_levels(), vec![0, 3, 7]);
    }

    #[test]
    fn flat_sparkline_is_uniform() {
        let levels = normalize_levels(&[100.0, 100.0, 100.0, 100.0]);
        assert_eq!(levels.len(), 4);
        assert!(levels.iter().all(|&v| v == levels[0]));
    }
}
