//! Lifetime min/max/average statistics.

use blockwatch_types::StatsSnapshot;

use super::error::ParseError;

/// Running min/max/mean/current over every sample ever seen.
///
/// Not windowed and never decays. The mean is kept incrementally, so it stays
/// accurate however many samples arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStats {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
    pub current: i64,
    samples: u64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` as a signed integer and fold it into the statistics.
    ///
    /// On a parse failure nothing changes.
    pub fn calculate(&mut self, field: &'static str, raw: &str) -> Result<(), ParseError> {
        let v: i64 = raw
            .trim()
            .parse()
            .map_err(|e| ParseError::new(field, raw, e))?;
        self.record(v);
        Ok(())
    }

    /// Fold an already parsed sample into the statistics.
    pub fn record(&mut self, v: i64) {
        self.current = v;

        if self.samples == 0 {
            self.min = v;
            self.max = v;
            self.avg = v as f64;
            self.samples = 1;
            return;
        }

        self.samples += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.avg += (v as f64 - self.avg) / self.samples as f64;
    }

    /// Number of samples folded in so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            min: self.min,
            max: self.max,
            avg: self.avg,
            current: self.current,
        }
    }
}
