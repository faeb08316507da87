// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! One-shot transmission of host-supplied frames.

use crate::context::DpdkDaq;
use daq::{DaqError, FilterCompiler, PktHdr};
use pmd::{Burst, Driver, Mbuf, MbufPool};
use tracing::debug;

impl<D: Driver, F: FilterCompiler> DpdkDaq<D, F> {
    /// Transmit `payload` on the interface the header was received on, or
    /// on its bridge peer unless `reverse`.
    pub(crate) fn inject_frame(
        &mut self,
        hdr: &PktHdr,
        payload: &[u8],
        reverse: bool,
    ) -> Result<(), DaqError> {
        let Some(ingress) = hdr.ingress else {
            return Err(self.fail(
                DaqError::NoDevice,
                format_args!("inject header carries no ingress interface"),
            ));
        };
        let Some(found) = self
            .instances
            .iter()
            .position(|instance| instance.index == ingress)
        else {
            return Err(self.fail(
                DaqError::NoDevice,
                format_args!("unrecognized ingress interface specified: {ingress}"),
            ));
        };
        let target = if reverse {
            found
        } else {
            match self.instances[found].peer {
                Some(peer) => peer,
                None => {
                    return Err(self.fail(
                        DaqError::NoDevice,
                        format_args!(
                            "ingress interface {ingress} has no peer for forward injection"
                        ),
                    ));
                }
            }
        };

        let instance = self.instances[target];
        let port_id = self.ports[instance.port].id;
        let allocated = self.ports[instance.port].pool.alloc();
        let mut frame = match allocated {
            Ok(frame) => frame,
            Err(_) => {
                return Err(self.fail(
                    DaqError::NoMemory,
                    format_args!("cannot allocate memory for packet"),
                ));
            }
        };
        if let Err(err) = frame.put(payload) {
            return Err(self.fail(DaqError::Invalid, format_args!("{err}")));
        }

        let mut single = Burst::new();
        single.push(frame);
        let refused = self.driver.tx_burst(port_id, instance.queue, single);
        if !refused.is_empty() {
            // the refused buffer drops back to its pool here
            return Err(self.fail(DaqError::Again, format_args!("cannot send packet, try again")));
        }
        self.stats.packets_injected += 1;
        debug!(interface = %instance.index, octets = payload.len(), "injected frame");
        Ok(())
    }
}
