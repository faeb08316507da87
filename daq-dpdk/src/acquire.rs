// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! The acquire engine: the module's inner poll loop.

use crate::BURST_SIZE;
use crate::context::DpdkDaq;
use daq::{DaqError, Disposition, FilterCompiler, FilterProgram, PktHdr, Verdict};
use pmd::{Driver, Mbuf};
use std::sync::atomic::Ordering;
use std::time::{Instant, SystemTime};
use tracing::debug;

impl<D: Driver, F: FilterCompiler> DpdkDaq<D, F> {
    /// Round-robin over the instances until enough frames were delivered,
    /// breakloop is observed, or a pass makes no progress and the idle
    /// timeout has elapsed.
    ///
    /// Frames a bridged NIC refuses stay in the peer port's deferred ring
    /// and are retried on later passes; back-pressure is not an error.
    pub(crate) fn acquire_loop<Cb>(&mut self, cnt: i32, mut callback: Cb) -> Result<usize, DaqError>
    where
        Cb: FnMut(&PktHdr, &[u8]) -> Verdict,
    {
        let ts = SystemTime::now();
        let entered = Instant::now();
        let mut delivered: usize = 0;

        while cnt <= 0 || delivered < cnt as usize {
            let mut got_one = false;
            let mut ignored_one = false;
            let mut sent_one = false;

            for position in 0..self.instances.len() {
                if self.break_loop.swap(false, Ordering::AcqRel) {
                    return Ok(delivered);
                }

                let instance = self.instances[position];
                let peer = instance.peer.map(|peer| self.instances[peer]);

                // drain-first: pending deferred frames on the peer port are
                // flushed before this instance receives anything new
                let drain_first =
                    peer.is_some_and(|peer| !self.ports[peer.port].tx_pending.is_empty());

                if !drain_first {
                    let port_id = self.ports[instance.port].id;
                    let rx_rings = self.ports[instance.port].rx_rings;
                    for _ring in 0..rx_rings {
                        let burst = if cnt > 0 {
                            BURST_SIZE.min(cnt as usize - delivered)
                        } else {
                            BURST_SIZE
                        };
                        let frames = self.driver.rx_burst(port_id, instance.queue, burst);
                        if frames.is_empty() {
                            continue;
                        }
                        if self.debug {
                            debug!(
                                port = %port_id,
                                queue = %instance.queue,
                                frames = frames.len(),
                                "receive burst"
                            );
                        }
                        for frame in frames {
                            self.stats.hw_packets_received += 1;
                            let data_len = frame.data_len();

                            let mut disposition = Disposition::Pass;
                            let mut dispatch = true;
                            if let Some(program) = &self.filter {
                                if !program.matches(frame.data(), data_len as u32) {
                                    ignored_one = true;
                                    self.stats.packets_filtered += 1;
                                    dispatch = false;
                                }
                            }
                            if dispatch {
                                got_one = true;
                                let hdr = PktHdr {
                                    ts,
                                    caplen: data_len as u32,
                                    pktlen: data_len as u32,
                                    ingress: Some(instance.index),
                                    egress: peer.map(|peer| peer.index),
                                    ingress_group: None,
                                    egress_group: None,
                                    flags: 0,
                                    opaque: 0,
                                    address_space_id: 0,
                                };
                                let verdict = callback(&hdr, frame.data());
                                self.stats.record_verdict(verdict);
                                disposition = verdict.translate();
                                self.stats.packets_received += 1;
                                delivered += 1;
                            }
                            match (disposition, peer) {
                                (Disposition::Pass, Some(peer)) => {
                                    self.ports[peer.port].tx_pending.defer(frame);
                                }
                                _ => drop(frame),
                            }
                        }
                    }
                }

                if let Some(peer) = peer {
                    let mut pending = self.ports[peer.port].tx_pending.pending();
                    if pending == 0 {
                        continue;
                    }
                    let peer_port_id = self.ports[peer.port].id;
                    let tx_rings = self.ports[peer.port].tx_rings;
                    for _ring in 0..tx_rings {
                        if pending == 0 {
                            break;
                        }
                        let offered = self.ports[peer.port].tx_pending.take();
                        let offered_len = offered.len();
                        let refused = self.driver.tx_burst(peer_port_id, peer.queue, offered);
                        let accepted = offered_len - refused.len();
                        self.ports[peer.port].tx_pending.restore(refused);
                        if accepted == 0 {
                            // back-pressure: the frames stay owned by the
                            // ring for the next pass
                            continue;
                        }
                        sent_one = true;
                        pending -= accepted;
                    }
                }
            }

            if !got_one && !ignored_one && !sent_one {
                let Some(timeout) = self.timeout else { continue };
                if entered.elapsed() > timeout {
                    return Ok(delivered);
                }
            }
        }

        Ok(delivered)
    }
}
