//! ---
//! wd_section: "01-core-functionality"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Poll sequencing and the stale-response gate."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use wattdash_client::FetchError;
use wattdash_telemetry::Sample;

/// Orders poll resolutions when request latency exceeds the poll interval.
///
/// Every dispatched request gets a sequence number from [`issue`]; its
/// resolution (success or failure) passes [`admit`] only if no
/// higher-numbered request has resolved before it. Last-writer-wins by
/// sequence, not by arrival time. The hazard here is logical ordering, not
/// memory: the gate lives inside the single poll loop.
///
/// [`issue`]: SequenceGate::issue
/// [`admit`]: SequenceGate::admit
#[derive(Debug, Default)]
pub struct SequenceGate {
    issued: u64,
    resolved: Option<u64>,
}

impl SequenceGate {
    /// Assign the next sequence number at dispatch time.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a resolution with this sequence number may be applied.
    /// Admitting marks the number as the highest resolved so far.
    pub fn admit(&mut self, seq: u64) -> bool {
        match self.resolved {
            Some(highest) if seq <= highest => false,
            _ => {
                self.resolved = Some(seq);
                true
            }
        }
    }
}

/// Resolution of one dispatched poll, tagged with its sequence number.
#[derive(Debug)]
pub(crate) struct PollOutcome {
    pub seq: u64,
    pub result: Result<Sample, FetchError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase_monotonically() {
        let mut gate = SequenceGate::default();
        assert_eq!(gate.issue(), 1);
        assert_eq!(gate.issue(), 2);
        assert_eq!(gate.issue(), 3);
    }

    #[test]
    fn in_order_resolutions_are_admitted() {
        let mut gate = SequenceGate::default();
        let first = gate.issue();
        let second = gate.issue();
        assert!(gate.admit(first));
        assert!(gate.admit(second));
    }

    #[test]
    fn late_arrival_of_an_earlier_request_is_rejected() {
        let mut gate = SequenceGate::default();
        let delayed = gate.issue();
        let newer = gate.issue();
        assert!(gate.admit(newer));
        assert!(!gate.admit(delayed));
    }

    #[test]
    fn a_resolution_is_admitted_at_most_once() {
        let mut gate = SequenceGate::default();
        let seq = gate.issue();
        assert!(gate.admit(seq));
        assert!(!gate.admit(seq));
    }
}
