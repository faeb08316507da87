// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Module descriptor wiring: the [`DaqModule`] operations of the context.

use crate::context::DpdkDaq;
use crate::parse;
use daq::{
    Capabilities, DAQ_API_VERSION, DaqError, DaqModule, DaqState, DaqStats, DataLink,
    FilterCompiler, InterfaceIndex, ModuleInfo, ModuleKind, PktHdr, Verdict,
};
use pmd::{Driver, DriverError, PortId};
use std::sync::atomic::Ordering;
use tracing::info;

/// Version of this module.
pub const DAQ_DPDK_VERSION: u32 = 3;

impl<D: Driver, F: FilterCompiler> DaqModule for DpdkDaq<D, F> {
    const INFO: ModuleInfo = ModuleInfo {
        api_version: DAQ_API_VERSION,
        module_version: DAQ_DPDK_VERSION,
        name: "dpdk",
        kind: ModuleKind::INLINE_CAPABLE
            .union(ModuleKind::INTF_CAPABLE)
            .union(ModuleKind::MULTI_INSTANCE),
    };

    fn set_filter(&mut self, filter: &str) -> Result<(), DaqError> {
        let compiled = self
            .compiler
            .compile(filter, self.snaplen, DataLink::Ethernet, true);
        match compiled {
            Ok(program) => {
                // replaces (and drops) any previous program
                self.filter = Some(program);
                Ok(())
            }
            Err(err) => Err(self.fail(DaqError::Failure, format_args!("{err}"))),
        }
    }

    fn start(&mut self) -> Result<(), DaqError> {
        if self.state != DaqState::Initialized {
            let state = self.state;
            return Err(self.fail(
                DaqError::Invalid,
                format_args!("cannot start from state {:?}", state),
            ));
        }
        let promisc = self.promisc;
        let mut failure: Option<(PortId, DriverError)> = None;
        for port in &mut self.ports {
            if let Err(err) = port.start(&mut self.driver, promisc) {
                failure = Some((port.id, err));
                break;
            }
        }
        if let Some((port, err)) = failure {
            return Err(self.fail(
                DaqError::Failure,
                format_args!("cannot start device for port {port}: {err}"),
            ));
        }
        self.stats.reset();
        self.state = DaqState::Started;
        info!(device = %self.device, "started");
        Ok(())
    }

    fn acquire<Cb>(&mut self, cnt: i32, callback: Cb) -> Result<usize, DaqError>
    where
        Cb: FnMut(&PktHdr, &[u8]) -> Verdict,
    {
        if self.state != DaqState::Started {
            let state = self.state;
            return Err(self.fail(
                DaqError::Invalid,
                format_args!("cannot acquire from state {:?}", state),
            ));
        }
        self.acquire_loop(cnt, callback)
    }

    fn inject(&mut self, hdr: &PktHdr, payload: &[u8], reverse: bool) -> Result<(), DaqError> {
        self.inject_frame(hdr, payload, reverse)
    }

    fn breakloop(&mut self) {
        self.break_loop.store(true, Ordering::Release);
    }

    fn stop(&mut self) -> Result<(), DaqError> {
        if self.state != DaqState::Started {
            let state = self.state;
            return Err(self.fail(
                DaqError::Invalid,
                format_args!("cannot stop from state {:?}", state),
            ));
        }
        self.close();
        info!(device = %self.device, "stopped");
        Ok(())
    }

    fn shutdown(self) {
        // teardown happens in Drop, which also covers early-exit paths
    }

    fn check_status(&self) -> DaqState {
        self.state
    }

    fn stats(&self) -> DaqStats {
        self.stats.clone()
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn snaplen(&self) -> u32 {
        self.snaplen
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::BLOCK
            | Capabilities::REPLACE
            | Capabilities::INJECT
            | Capabilities::UNPRIV_START
            | Capabilities::BREAKLOOP
            | Capabilities::BPF
            | Capabilities::DEVICE_INDEX
    }

    fn datalink_type(&self) -> DataLink {
        DataLink::Ethernet
    }

    fn errbuf(&self) -> &str {
        self.errbuf.as_str()
    }

    fn set_errbuf(&mut self, message: &str) {
        self.errbuf.set(format_args!("{message}"));
    }

    fn device_index(&self, device: &str) -> Result<InterfaceIndex, DaqError> {
        let spec = parse::parse_token(device).map_err(|_| DaqError::NoDevice)?;
        self.instances
            .iter()
            .find(|instance| self.ports[instance.port].id == spec.port)
            .map(|instance| instance.index)
            .ok_or(DaqError::NoDevice)
    }
}
