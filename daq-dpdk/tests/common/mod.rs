// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Shared harness for the end-to-end tests: a module wired to the
//! in-memory driver and the protocol-name filter compiler.

#![allow(dead_code)]

use daq::filter::test_filter::ProtoFilterCompiler;
use daq::{DaqConfig, DaqMode, DaqModule, InterfaceIndex, PktHdr};
use daq_dpdk::DpdkDaq;
use pmd::TestDriver;
use std::time::SystemTime;

pub type TestDaq = DpdkDaq<TestDriver, ProtoFilterCompiler>;

pub fn config(device: &str, mode: DaqMode) -> DaqConfig {
    let mut config = DaqConfig::new(device);
    config.mode = mode;
    config.timeout_ms = 20;
    config
        .values
        .insert("dpdk_args".to_string(), "-l 0 -n 4".to_string());
    config
}

pub fn initialized(device: &str, mode: DaqMode, ports: u16) -> (TestDaq, TestDriver) {
    let driver = TestDriver::with_ports(ports);
    let handle = driver.clone();
    let daq = DpdkDaq::initialize(&config(device, mode), driver, ProtoFilterCompiler)
        .expect("initialize");
    (daq, handle)
}

pub fn started(device: &str, mode: DaqMode, ports: u16) -> (TestDaq, TestDriver) {
    let (mut daq, driver) = initialized(device, mode, ports);
    daq.start().expect("start");
    (daq, driver)
}

/// A header as the host would replay it into inject.
pub fn header_from(ingress: u32) -> PktHdr {
    PktHdr {
        ts: SystemTime::now(),
        caplen: 0,
        pktlen: 0,
        ingress: Some(InterfaceIndex(ingress)),
        egress: None,
        ingress_group: None,
        egress_group: None,
        flags: 0,
        opaque: 0,
        address_space_id: 0,
    }
}

pub fn udp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([192, 168, 1, 1], [192, 168, 1, 2], 64)
        .udp(4000, 4001);
    let mut frame = Vec::new();
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn tcp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .tcp(80, 4002, 1, 1024);
    let mut frame = Vec::new();
    builder.write(&mut frame, payload).unwrap();
    frame
}
