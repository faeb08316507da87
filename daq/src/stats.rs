// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Module statistics surfaced to the host.

use crate::verdict::Verdict;

/// Counters kept by an acquisition module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DaqStats {
    /// Frames pulled from the hardware, before filtering.
    pub hw_packets_received: u64,
    /// Frames delivered to the analysis callback.
    pub packets_received: u64,
    /// Frames rejected by the installed filter program.
    pub packets_filtered: u64,
    /// Frames transmitted through the inject path.
    pub packets_injected: u64,
    /// Raw verdict counts, indexed by the verdict's raw value.
    pub verdicts: [u64; Verdict::COUNT],
}

impl DaqStats {
    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = DaqStats::default();
    }

    /// Count one raw verdict.
    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.verdicts[verdict as usize] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_index_by_raw_value() {
        let mut stats = DaqStats::default();
        for verdict in Verdict::ALL {
            stats.record_verdict(verdict);
        }
        stats.record_verdict(Verdict::Block);
        assert_eq!(stats.verdicts[Verdict::Block as usize], 2);
        assert_eq!(stats.verdicts.iter().sum::<u64>(), 8);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut stats = DaqStats {
            hw_packets_received: 9,
            packets_received: 7,
            ..DaqStats::default()
        };
        stats.reset();
        assert_eq!(stats, DaqStats::default());
        stats.reset();
        assert_eq!(stats, DaqStats::default());
    }
}
