//! ---
//! wd_section: "01-core-functionality"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Bounded rolling history of telemetry samples."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use std::collections::VecDeque;

use wattdash_telemetry::Sample;

/// Number of samples retained; the oldest is evicted beyond this.
pub const HISTORY_CAPACITY: usize = 50;

/// Bounded, ordered, append-only sequence of telemetry samples.
///
/// `append` is a pure operation: it leaves the receiver untouched and
/// returns the successor buffer, so eviction order is testable without
/// timers or network. Invariant: after any append the buffer equals the
/// [`HISTORY_CAPACITY`] most-recently-appended samples in arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryBuffer {
    samples: VecDeque<Sample>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The successor buffer: the last `HISTORY_CAPACITY - 1` samples of the
    /// receiver, in order, followed by `sample`.
    #[must_use]
    pub fn append(&self, sample: Sample) -> HistoryBuffer {
        let mut samples = self.samples.clone();
        samples.push_back(sample);
        while samples.len() > HISTORY_CAPACITY {
            samples.pop_front();
        }
        HistoryBuffer { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recently appended sample, if any.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// All retained samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// The last `n` samples, oldest first; the whole buffer when `n` exceeds
    /// its length.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &Sample> {
        self.samples
            .iter()
            .skip(self.samples.len().saturating_sub(n))
    }
}
