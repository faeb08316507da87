// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! A tiny stand-in for the external BPF compiler, for tests.
//!
//! Understands just enough of the classic filter vocabulary (`ip`, `tcp`,
//! `udp`, `icmp`, and the match-all empty expression) to exercise the
//! filtered/unfiltered paths of an acquisition engine. Anything else fails
//! to compile, standing in for a BPF syntax error.

use crate::filter::{DataLink, FilterCompileError, FilterCompiler, FilterProgram};
use etherparse::{SlicedPacket, TransportSlice};

/// Compiler for the protocol-name filter vocabulary.
#[derive(Debug, Default, Copy, Clone)]
pub struct ProtoFilterCompiler;

/// Program produced by [`ProtoFilterCompiler`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtoFilter {
    /// The empty expression: match every frame.
    All,
    /// `ip`: match any frame with a network-layer header.
    Ip,
    /// `tcp`.
    Tcp,
    /// `udp`.
    Udp,
    /// `icmp` (v4 or v6).
    Icmp,
}

impl FilterCompiler for ProtoFilterCompiler {
    type Program = ProtoFilter;

    fn compile(
        &self,
        expr: &str,
        _snaplen: u32,
        _linktype: DataLink,
        _optimize: bool,
    ) -> Result<ProtoFilter, FilterCompileError> {
        match expr.trim() {
            "" => Ok(ProtoFilter::All),
            "ip" => Ok(ProtoFilter::Ip),
            "tcp" => Ok(ProtoFilter::Tcp),
            "udp" => Ok(ProtoFilter::Udp),
            "icmp" => Ok(ProtoFilter::Icmp),
            other => Err(FilterCompileError {
                reason: format!("syntax error in expression '{other}'"),
            }),
        }
    }
}

impl FilterProgram for ProtoFilter {
    fn matches(&self, frame: &[u8], _wirelen: u32) -> bool {
        let Ok(sliced) = SlicedPacket::from_ethernet(frame) else {
            // an unparseable frame matches nothing but the empty expression
            return matches!(self, ProtoFilter::All);
        };
        match self {
            ProtoFilter::All => true,
            ProtoFilter::Ip => sliced.net.is_some(),
            ProtoFilter::Tcp => matches!(sliced.transport, Some(TransportSlice::Tcp(_))),
            ProtoFilter::Udp => matches!(sliced.transport, Some(TransportSlice::Udp(_))),
            ProtoFilter::Icmp => matches!(
                sliced.transport,
                Some(TransportSlice::Icmpv4(_) | TransportSlice::Icmpv6(_))
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp_frame() -> Vec<u8> {
        let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 1, 1], [192, 168, 1, 2], 64)
            .udp(4000, 4001);
        let mut frame = Vec::new();
        builder.write(&mut frame, &[0xab; 16]).unwrap();
        frame
    }

    fn tcp_frame() -> Vec<u8> {
        let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(80, 4002, 1, 1024);
        let mut frame = Vec::new();
        builder.write(&mut frame, &[0xcd; 16]).unwrap();
        frame
    }

    #[test]
    fn protocol_selection() {
        let compiler = ProtoFilterCompiler;
        let udp = compiler.compile("udp", 1518, DataLink::Ethernet, true).unwrap();
        let tcp = compiler.compile("tcp", 1518, DataLink::Ethernet, true).unwrap();

        let frame = udp_frame();
        assert!(udp.matches(&frame, frame.len() as u32));
        assert!(!tcp.matches(&frame, frame.len() as u32));

        let frame = tcp_frame();
        assert!(tcp.matches(&frame, frame.len() as u32));
        assert!(!udp.matches(&frame, frame.len() as u32));
    }

    #[test]
    fn empty_expression_matches_everything() {
        let program = ProtoFilterCompiler
            .compile("", 1518, DataLink::Ethernet, true)
            .unwrap();
        assert!(program.matches(&udp_frame(), 60));
        assert!(program.matches(b"garbage", 7));
    }

    #[test]
    fn unknown_expression_is_a_compile_error() {
        let err = ProtoFilterCompiler
            .compile("port 53", 1518, DataLink::Ethernet, true)
            .unwrap_err();
        assert!(err.reason.contains("port 53"));
    }

    #[test]
    fn garbage_frames_match_no_protocol() {
        let program = ProtoFilterCompiler
            .compile("udp", 1518, DataLink::Ethernet, true)
            .unwrap();
        assert!(!program.matches(&[0u8; 4], 4));
    }
}
