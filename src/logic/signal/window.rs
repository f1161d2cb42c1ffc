//! Rolling signal window
//!
//! Fixed-capacity FIFO of dBm samples with O(1) amortized aggregates:
//! integer sum / sum of squares for mean and variance, monotonic deques
//! for min/max. A Welford accumulator tracks the whole lifetime.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::types::{
    SignalQuality, SignalSummary, Stability, Trend, TREND_MIN_SAMPLES, TREND_THRESHOLD_DB,
};
use crate::logic::frame::CaptureTime;

// ============================================================================
// RUNNING STATS (Welford)
// ============================================================================

/// Online mean / variance over every sample ever pushed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; 0.0 below two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

// ============================================================================
// SIGNAL WINDOW
// ============================================================================

#[derive(Debug, Clone)]
pub struct SignalWindow {
    capacity: usize,
    /// (sequence, dBm), oldest first
    samples: VecDeque<(u64, i8)>,
    sum: i64,
    sum_sq: i64,
    /// Increasing values; front is the window minimum
    min_q: VecDeque<(u64, i8)>,
    /// Decreasing values; front is the window maximum
    max_q: VecDeque<(u64, i8)>,
    next_seq: u64,
    lifetime: RunningStats,
    last_sample_at: CaptureTime,
}

impl SignalWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            sum: 0,
            sum_sq: 0,
            min_q: VecDeque::new(),
            max_q: VecDeque::new(),
            next_seq: 0,
            lifetime: RunningStats::new(),
            last_sample_at: CaptureTime(0),
        }
    }

    /// Append a sample, evicting the oldest when full
    pub fn push(&mut self, dbm: i8, at: CaptureTime) {
        if self.samples.len() == self.capacity {
            if let Some((seq, old)) = self.samples.pop_front() {
                self.sum -= i64::from(old);
                self.sum_sq -= i64::from(old) * i64::from(old);
                if self.min_q.front().map(|(s, _)| *s) == Some(seq) {
                    self.min_q.pop_front();
                }
                if self.max_q.front().map(|(s, _)| *s) == Some(seq) {
                    self.max_q.pop_front();
                }
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.samples.push_back((seq, dbm));
        self.sum += i64::from(dbm);
        self.sum_sq += i64::from(dbm) * i64::from(dbm);

        while self.min_q.back().map(|(_, v)| *v >= dbm).unwrap_or(false) {
            self.min_q.pop_back();
        }
        self.min_q.push_back((seq, dbm));

        while self.max_q.back().map(|(_, v)| *v <= dbm).unwrap_or(false) {
            self.max_q.pop_back();
        }
        self.max_q.push_back((seq, dbm));

        self.lifetime.push(f64::from(dbm));
        self.last_sample_at = at;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained samples, oldest first
    pub fn values(&self) -> Vec<i8> {
        self.samples.iter().map(|(_, v)| *v).collect()
    }

    pub fn last_sample_at(&self) -> CaptureTime {
        self.last_sample_at
    }

    pub fn summary(&self) -> Option<SignalSummary> {
        let n = self.samples.len();
        let (&(_, latest), &(_, min), &(_, max)) =
            (self.samples.back()?, self.min_q.front()?, self.max_q.front()?);

        let n_i = n as i64;
        let mean = self.sum as f64 / n as f64;
        // n*sumsq - sum^2 is exact in integers
        let variance = (n_i * self.sum_sq - self.sum * self.sum) as f64 / (n_i * n_i) as f64;
        let stddev = variance.max(0.0).sqrt();

        Some(SignalSummary {
            mean,
            min,
            max,
            stddev,
            median: self.median(),
            range: i16::from(max) - i16::from(min),
            sample_count: n,
            latest,
            trend: self.trend(),
            stability: Stability::from_stddev(stddev, n),
            quality: SignalQuality::from_dbm(mean),
            lifetime_count: self.lifetime.count(),
            lifetime_mean: self.lifetime.mean(),
            lifetime_stddev: self.lifetime.std_dev(),
        })
    }

    fn median(&self) -> f64 {
        let mut sorted = self.values();
        sorted.sort_unstable();
        let n = sorted.len();
        if n == 0 {
            return 0.0;
        }
        if n % 2 == 1 {
            f64::from(sorted[n / 2])
        } else {
            (f64::from(sorted[n / 2 - 1]) + f64::from(sorted[n / 2])) / 2.0
        }
    }

    /// Compare the means of the older and newer halves of the window
    fn trend(&self) -> Trend {
        let n = self.samples.len();
        if n < TREND_MIN_SAMPLES {
            return Trend::InsufficientData;
        }

        let half = n / 2;
        let older: i64 = self.samples.iter().take(half).map(|(_, v)| i64::from(*v)).sum();
        let newer: i64 = self.samples.iter().skip(half).map(|(_, v)| i64::from(*v)).sum();
        let diff = newer as f64 / (n - half) as f64 - older as f64 / half as f64;

        if diff > TREND_THRESHOLD_DB {
            Trend::Improving
        } else if diff < -TREND_THRESHOLD_DB {
            Trend::Degrading
        } else {
            Trend::Stable
        }
    }
}
