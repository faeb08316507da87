// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Lifecycle, configuration, and status-surface behavior.

mod common;

use common::{config, initialized, started};
use daq::filter::test_filter::ProtoFilterCompiler;
use daq::{
    Capabilities, ConfigFlags, DaqError, DaqMode, DaqModule, DaqState, DaqStats, DataLink,
    InterfaceIndex, ModuleKind, Verdict,
};
use daq_dpdk::{DAQ_DPDK_VERSION, DpdkDaq};
use pmd::{PortId, TestDriver};

type TestDaq = common::TestDaq;

#[test]
fn descriptor_record() {
    let info = <TestDaq as DaqModule>::INFO;
    assert_eq!(info.name, "dpdk");
    assert_eq!(info.module_version, DAQ_DPDK_VERSION);
    assert_eq!(
        info.kind,
        ModuleKind::INLINE_CAPABLE | ModuleKind::INTF_CAPABLE | ModuleKind::MULTI_INSTANCE
    );
}

#[test]
fn capabilities_and_datalink() {
    let (daq, _driver) = initialized("dpdk0", DaqMode::Passive, 1);
    assert_eq!(
        daq.capabilities(),
        Capabilities::BLOCK
            | Capabilities::REPLACE
            | Capabilities::INJECT
            | Capabilities::UNPRIV_START
            | Capabilities::BREAKLOOP
            | Capabilities::BPF
            | Capabilities::DEVICE_INDEX
    );
    assert_eq!(daq.datalink_type(), DataLink::Ethernet);
    assert_eq!(daq.datalink_type().dlt(), 1);
    assert_eq!(daq.snaplen(), 1518);
}

#[test]
fn initialize_requires_eal_arguments() {
    let mut config = config("dpdk0", DaqMode::Passive);
    config.values.remove("dpdk_args");
    let err = DpdkDaq::initialize(&config, TestDriver::with_ports(1), ProtoFilterCompiler)
        .unwrap_err();
    assert_eq!(err.kind, DaqError::Invalid);
    assert!(err.message.contains("EAL"));
}

#[test]
fn initialize_forwards_eal_arguments_with_dummy_argv0() {
    let (_daq, driver) = initialized("dpdk0", DaqMode::Passive, 1);
    assert_eq!(
        driver.eal_args(),
        vec!["daq-dpdk", "-l", "0", "-n", "4"]
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
    );
}

#[test]
fn initialize_requires_enumerated_ports() {
    let err = DpdkDaq::initialize(
        &config("dpdk0", DaqMode::Passive),
        TestDriver::with_ports(0),
        ProtoFilterCompiler,
    )
    .unwrap_err();
    assert_eq!(err.kind, DaqError::NoDevice);
}

#[test]
fn initialize_rejects_more_interfaces_than_ports() {
    let err = DpdkDaq::initialize(
        &config("dpdk0:dpdk1", DaqMode::Passive),
        TestDriver::with_ports(1),
        ProtoFilterCompiler,
    )
    .unwrap_err();
    assert_eq!(err.kind, DaqError::Failure);
    assert!(err.message.contains("more than 1 interfaces"));
}

#[test]
fn initialize_rejects_malformed_devices() {
    for device in [":dpdk0", "dpdk0:", "eth0", "dpdk0x", ""] {
        let err = DpdkDaq::initialize(
            &config(device, DaqMode::Passive),
            TestDriver::with_ports(4),
            ProtoFilterCompiler,
        )
        .unwrap_err();
        assert_eq!(err.kind, DaqError::Invalid, "device '{device}'");
    }
}

#[test]
fn inline_rejects_an_unpaired_interface() {
    // scenario: three interfaces cannot bridge in pairs
    let err = DpdkDaq::initialize(
        &config("dpdk0:dpdk1:dpdk2", DaqMode::Inline),
        TestDriver::with_ports(3),
        ProtoFilterCompiler,
    )
    .unwrap_err();
    assert_eq!(err.kind, DaqError::Invalid);
}

#[test]
fn inline_rejects_empty_tokens_but_passive_skips_them() {
    let err = DpdkDaq::initialize(
        &config("dpdk0::dpdk1", DaqMode::Inline),
        TestDriver::with_ports(2),
        ProtoFilterCompiler,
    )
    .unwrap_err();
    assert_eq!(err.kind, DaqError::Invalid);

    let (daq, _driver) = initialized("dpdk0::dpdk1", DaqMode::Passive, 2);
    assert_eq!(daq.device_index("dpdk1"), Ok(InterfaceIndex(1)));
}

#[test]
fn shared_port_creates_one_pool() {
    let (_daq, driver) = initialized("dpdk0:dpdk0-1", DaqMode::Passive, 2);
    assert_eq!(driver.pool_names(), vec!["MBUF_POOL0".to_string()]);
}

#[test]
fn pools_are_named_after_their_port() {
    let (_daq, driver) = initialized("dpdk0:dpdk1", DaqMode::Inline, 2);
    assert_eq!(
        driver.pool_names(),
        vec!["MBUF_POOL0".to_string(), "MBUF_POOL1".to_string()]
    );
}

#[test]
fn start_brings_ports_up_and_honors_promisc() {
    let mut config = config("dpdk0:dpdk1", DaqMode::Inline);
    config.flags |= ConfigFlags::PROMISC;
    let driver = TestDriver::with_ports(2);
    let handle = driver.clone();
    let mut daq = DpdkDaq::initialize(&config, driver, ProtoFilterCompiler).unwrap();

    assert_eq!(daq.check_status(), DaqState::Initialized);
    assert!(!handle.port_started(PortId(0)));

    daq.start().unwrap();
    assert_eq!(daq.check_status(), DaqState::Started);
    for port in [PortId(0), PortId(1)] {
        assert!(handle.port_started(port));
        assert!(handle.promisc_enabled(port));
    }
}

#[test]
fn promisc_stays_off_without_the_flag() {
    let (_daq, driver) = started("dpdk0", DaqMode::Passive, 1);
    assert!(driver.port_started(PortId(0)));
    assert!(!driver.promisc_enabled(PortId(0)));
}

#[test]
fn lifecycle_is_strict() {
    let (mut daq, _driver) = initialized("dpdk0", DaqMode::Passive, 1);

    assert_eq!(
        daq.acquire(1, |_, _| Verdict::Pass),
        Err(DaqError::Invalid)
    );
    assert_eq!(daq.stop(), Err(DaqError::Invalid));

    daq.start().unwrap();
    assert_eq!(daq.start(), Err(DaqError::Invalid));
    assert!(daq.errbuf().contains("cannot start"));

    daq.stop().unwrap();
    assert_eq!(daq.check_status(), DaqState::Stopped);
    assert_eq!(daq.stop(), Err(DaqError::Invalid));
    daq.shutdown();
}

#[test]
fn stop_releases_devices_and_buffers() {
    let (mut daq, driver) = started("dpdk0:dpdk1", DaqMode::Inline, 2);
    driver.set_tx_accept_limit(PortId(1), Some(0));
    driver.feed_rx(PortId(0), b"stuck");
    daq.acquire(1, |_, _| Verdict::Pass).unwrap();
    assert_eq!(driver.outstanding_mbufs(), 1);

    daq.stop().unwrap();
    assert_eq!(driver.outstanding_mbufs(), 0);
    assert!(!driver.port_started(PortId(0)));
    assert!(!driver.port_started(PortId(1)));
}

#[test]
fn dropping_the_context_tears_it_down() {
    let (daq, driver) = started("dpdk0", DaqMode::Passive, 1);
    drop(daq);
    assert!(!driver.port_started(PortId(0)));
}

#[test]
fn stats_reset_is_idempotent_and_zeroing() {
    let (mut daq, driver) = started("dpdk0", DaqMode::Passive, 1);
    driver.feed_rx(PortId(0), b"frame");
    daq.acquire(1, |_, _| Verdict::Pass).unwrap();
    assert_ne!(daq.stats(), DaqStats::default());

    daq.reset_stats();
    assert_eq!(daq.stats(), DaqStats::default());
    daq.reset_stats();
    assert_eq!(daq.stats(), DaqStats::default());
}

#[test]
fn set_filter_replaces_the_program() {
    let (mut daq, _driver) = initialized("dpdk0", DaqMode::Passive, 1);
    daq.set_filter("udp").unwrap();
    daq.set_filter("udp").unwrap();
    daq.set_filter("tcp").unwrap();
}

#[test]
fn set_filter_keeps_the_old_program_on_a_compile_error() {
    let (mut daq, driver) = started("dpdk0", DaqMode::Passive, 1);
    daq.set_filter("udp").unwrap();
    assert_eq!(daq.set_filter("port 53"), Err(DaqError::Failure));
    assert!(daq.errbuf().contains("filter compilation failed"));

    // the udp program is still in effect
    driver.feed_rx(PortId(0), &common::tcp_frame(b"x"));
    daq.acquire(0, |_, _| Verdict::Pass).unwrap();
    assert_eq!(daq.stats().packets_filtered, 1);
}

#[test]
fn errbuf_is_a_rolling_message() {
    let (mut daq, _driver) = initialized("dpdk0", DaqMode::Passive, 1);
    daq.set_errbuf("host message");
    assert_eq!(daq.errbuf(), "host message");
    assert_eq!(daq.stop(), Err(DaqError::Invalid));
    assert!(daq.errbuf().contains("cannot stop"));
}

#[test]
fn device_index_maps_names_to_interfaces() {
    let (daq, _driver) = initialized("dpdk0:dpdk1", DaqMode::Passive, 2);
    assert_eq!(daq.device_index("dpdk0"), Ok(InterfaceIndex(0)));
    assert_eq!(daq.device_index("dpdk1"), Ok(InterfaceIndex(1)));
    assert_eq!(daq.device_index("dpdk7"), Err(DaqError::NoDevice));
    assert_eq!(daq.device_index("eth0"), Err(DaqError::NoDevice));
}

#[test]
fn device_index_reports_the_first_instance_of_a_shared_port() {
    let (daq, _driver) = initialized("dpdk0:dpdk0-1", DaqMode::Passive, 2);
    assert_eq!(daq.device_index("dpdk0"), Ok(InterfaceIndex(0)));
}
