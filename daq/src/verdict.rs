// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Analysis verdicts and their translation to a forwarding disposition.

/// Classification returned by the analysis callback for a single frame.
///
/// The raw verdict is recorded in the statistics as-is; the acquisition
/// engine acts on its [translation](Verdict::translate) only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Verdict {
    /// Pass the packet.
    Pass = 0,
    /// Block the packet.
    Block = 1,
    /// Pass a replacement packet provided by the host.
    Replace = 2,
    /// Pass the packet and whitelist the flow.
    Whitelist = 3,
    /// Block the packet and blacklist the flow.
    Blacklist = 4,
    /// Pass the packet; the host does not want to see more of this flow.
    Ignore = 5,
    /// Hold the packet; the host will ask for it again.
    Retry = 6,
}

/// What the engine actually does with a frame after the verdict.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Forward to the bridge peer (or release when unpeered).
    Pass,
    /// Release the frame without forwarding.
    Block,
}

impl Verdict {
    /// Number of verdict variants; the length of the per-verdict counters.
    pub const COUNT: usize = 7;

    /// Every verdict, in raw order.
    pub const ALL: [Verdict; Verdict::COUNT] = [
        Verdict::Pass,
        Verdict::Block,
        Verdict::Replace,
        Verdict::Whitelist,
        Verdict::Blacklist,
        Verdict::Ignore,
        Verdict::Retry,
    ];

    /// Translate the raw verdict into the effective action.
    ///
    /// Only [`Disposition::Pass`] results in forwarding to the bridge peer;
    /// everything else releases the frame buffer.
    #[must_use]
    pub const fn translate(self) -> Disposition {
        match self {
            Verdict::Pass | Verdict::Replace | Verdict::Whitelist | Verdict::Ignore => {
                Disposition::Pass
            }
            Verdict::Block | Verdict::Blacklist | Verdict::Retry => Disposition::Block,
        }
    }
}
