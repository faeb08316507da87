// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! The module context and its lifecycle.

use crate::errbuf::ErrBuf;
use crate::instance::Instance;
use crate::parse::{self, IfaceSpec};
use crate::port::{Port, pool_name};
use crate::{MBUF_CACHE_SIZE, NUM_MBUFS};
use core::fmt;
use daq::{ConfigFlags, DaqConfig, DaqError, DaqMode, DaqState, DaqStats, FilterCompiler, InterfaceIndex};
use pmd::{Driver, DriverError, PoolConfig, PortId};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::{debug, info};

/// Error returned by [`DpdkDaq::initialize`].
///
/// Initialization fails before the context (and its error buffer) exists,
/// so the message travels with the error kind instead.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct InitError {
    /// DAQ error kind.
    pub kind: DaqError,
    /// Human-readable description.
    pub message: String,
}

impl InitError {
    fn new(kind: DaqError, message: impl Into<String>) -> InitError {
        InitError {
            kind,
            message: message.into(),
        }
    }
}

/// Cross-thread handle asking a running acquire call to return.
///
/// The only operation of the context designed for invocation from another
/// thread; everything else belongs to the host's acquisition thread.
#[derive(Debug, Clone)]
pub struct BreakloopHandle(Arc<AtomicBool>);

impl BreakloopHandle {
    /// Make the current acquire call return at the next instance boundary.
    pub fn set(&self) {
        self.0.store(true, std::sync::atomic::Ordering::Release);
    }
}

/// The DPDK acquisition module context: a set of poll-mode ports and the
/// logical interfaces bound to them, driven by the host through the
/// [`daq::DaqModule`] operations.
#[derive(Debug)]
pub struct DpdkDaq<D: Driver, F: FilterCompiler> {
    pub(crate) driver: D,
    pub(crate) compiler: F,
    pub(crate) device: String,
    pub(crate) snaplen: u32,
    pub(crate) timeout: Option<Duration>,
    pub(crate) promisc: bool,
    pub(crate) debug: bool,
    pub(crate) ports: Vec<Port<D>>,
    pub(crate) instances: Vec<Instance>,
    pub(crate) intf_count: usize,
    pub(crate) filter: Option<F::Program>,
    pub(crate) stats: DaqStats,
    pub(crate) state: DaqState,
    pub(crate) break_loop: Arc<AtomicBool>,
    pub(crate) errbuf: ErrBuf,
    next_index: u32,
}

impl<D: Driver, F: FilterCompiler> DpdkDaq<D, F> {
    /// Build a context from the host configuration: one-time driver (EAL)
    /// initialization, device-string parsing, and port/instance
    /// construction with bridge pairing in inline mode.
    ///
    /// # Errors
    ///
    /// [`DaqError::Invalid`] for a missing `dpdk_args` key, rejected EAL
    /// arguments, or a malformed device string (including an unpaired
    /// interface in inline mode); [`DaqError::NoDevice`] when the runtime
    /// enumerates no ports or a bridge endpoint cannot be found;
    /// [`DaqError::NoMemory`] when a pool allocation fails. A failed
    /// initialization rolls back everything it allocated.
    pub fn initialize(config: &DaqConfig, driver: D, compiler: F) -> Result<Self, InitError> {
        let mut daq = DpdkDaq {
            driver,
            compiler,
            device: config.name.clone(),
            snaplen: config.snaplen,
            timeout: (config.timeout_ms > 0)
                .then(|| Duration::from_millis(config.timeout_ms.unsigned_abs().into())),
            promisc: config.flags.contains(ConfigFlags::PROMISC),
            debug: config.values.contains_key("debug"),
            ports: Vec::new(),
            instances: Vec::new(),
            intf_count: 0,
            filter: None,
            stats: DaqStats::default(),
            state: DaqState::Uninitialized,
            break_loop: Arc::new(AtomicBool::new(false)),
            errbuf: ErrBuf::default(),
            next_index: 0,
        };

        let Some(dpdk_args) = config.values.get("dpdk_args") else {
            return Err(InitError::new(DaqError::Invalid, "missing EAL arguments"));
        };
        let mut args = vec!["daq-dpdk".to_string()];
        args.extend(dpdk_args.split_whitespace().map(str::to_string));
        daq.driver.init(&args).map_err(|err| {
            InitError::new(DaqError::Invalid, format!("invalid EAL arguments: {err}"))
        })?;

        let dev_count = daq.driver.dev_count();
        if dev_count == 0 {
            return Err(InitError::new(DaqError::NoDevice, "no Ethernet devices"));
        }

        let specs = parse::parse_device(&daq.device, config.mode)
            .map_err(|err| InitError::new(DaqError::Invalid, err.to_string()))?;
        if specs.len() > usize::from(dev_count) {
            return Err(InitError::new(
                DaqError::Failure,
                format!("using more than {dev_count} interfaces is not valid"),
            ));
        }

        let mut unpaired = 0usize;
        for spec in specs {
            daq.create_instance(spec)?;
            daq.intf_count += 1;
            if config.mode != DaqMode::Passive {
                unpaired += 1;
                if unpaired == 2 {
                    let newest = daq.instances.len() - 1;
                    let port1 = daq.ports[daq.instances[newest - 1].port].id;
                    let port2 = daq.ports[daq.instances[newest].port].id;
                    daq.create_bridge(port1, port2).map_err(|kind| {
                        InitError::new(
                            kind,
                            format!("couldn't create the bridge between dpdk{port1} and dpdk{port2}"),
                        )
                    })?;
                    unpaired = 0;
                }
            }
        }

        if daq.instances.is_empty() || unpaired != 0 {
            return Err(InitError::new(
                DaqError::Invalid,
                format!("invalid interface specification: '{}'", daq.device),
            ));
        }

        daq.state = DaqState::Initialized;
        info!(
            device = %daq.device,
            interfaces = daq.intf_count,
            ports = daq.ports.len(),
            "initialized"
        );
        Ok(daq)
    }

    /// A handle other threads may use to interrupt acquire.
    #[must_use]
    pub fn breakloop_handle(&self) -> BreakloopHandle {
        BreakloopHandle(Arc::clone(&self.break_loop))
    }

    /// Bind a new instance to `spec`, reusing an already-open port.
    fn create_instance(&mut self, spec: IfaceSpec) -> Result<(), InitError> {
        let port = match self.ports.iter().position(|port| port.id == spec.port) {
            Some(position) => {
                self.ports[position].refcnt += 1;
                debug!(port = %spec.port, "port already open, sharing it");
                position
            }
            None => {
                let socket = self.driver.dev_socket(spec.port);
                let pool = self
                    .driver
                    .create_pool(PoolConfig {
                        name: pool_name(spec.port),
                        size: NUM_MBUFS,
                        cache_size: MBUF_CACHE_SIZE,
                        socket,
                    })
                    .map_err(|err| match err {
                        DriverError::NoMemory(_) => {
                            InitError::new(DaqError::NoMemory, "cannot create mbuf pool")
                        }
                        err => InitError::new(
                            DaqError::Failure,
                            format!("cannot create mbuf pool: {err}"),
                        ),
                    })?;
                self.ports.push(Port::new(spec.port, pool));
                self.ports.len() - 1
            }
        };
        let index = InterfaceIndex(self.next_index);
        self.next_index += 1;
        self.instances.push(Instance {
            index,
            port,
            queue: spec.queue,
            peer: None,
        });
        Ok(())
    }

    /// Pair the first unpeered instances found on `port1` and `port2`.
    fn create_bridge(&mut self, port1: PortId, port2: PortId) -> Result<(), DaqError> {
        let mut peer1 = None;
        let mut peer2 = None;
        for (position, instance) in self.instances.iter().enumerate() {
            if instance.peer.is_some() {
                continue;
            }
            let port = self.ports[instance.port].id;
            if peer1.is_none() && port == port1 {
                peer1 = Some(position);
            } else if peer2.is_none() && port == port2 {
                peer2 = Some(position);
            }
        }
        let (Some(a), Some(b)) = (peer1, peer2) else {
            return Err(DaqError::NoDevice);
        };
        self.instances[a].peer = Some(b);
        self.instances[b].peer = Some(a);
        debug!(
            a = %self.instances[a].index,
            b = %self.instances[b].index,
            port1 = %port1,
            port2 = %port2,
            "bridged instances"
        );
        Ok(())
    }

    /// Record a failure in the error buffer and hand back its kind.
    pub(crate) fn fail(&mut self, kind: DaqError, args: fmt::Arguments<'_>) -> DaqError {
        self.errbuf.set(args);
        kind
    }

    /// Release every interface and device.
    ///
    /// Peers are nulled before the instances go away, pending deferred
    /// frames are released before their device stops.
    pub(crate) fn close(&mut self) {
        for instance in &mut self.instances {
            instance.peer = None;
        }
        self.instances.clear();
        for port in &mut self.ports {
            port.release(&mut self.driver);
        }
        self.ports.clear();
        self.filter = None;
        self.state = DaqState::Stopped;
    }
}

impl<D: Driver, F: FilterCompiler> Drop for DpdkDaq<D, F> {
    fn drop(&mut self) {
        self.close();
    }
}
