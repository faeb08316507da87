// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Device-string parsing.
//!
//! The device specification is a colon-delimited list of interface tokens
//! of the form `dpdk<port>[-<queue>]`.

use crate::IFNAMSIZ;
use daq::DaqMode;
use pmd::{PortId, QueueId};

/// One parsed interface token: a port and the receive queue on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct IfaceSpec {
    pub port: PortId,
    pub queue: QueueId,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum DeviceSpecError {
    #[error("invalid interface specification: '{0}'")]
    Malformed(String),
    #[error("interface name too long ({0} characters)")]
    NameTooLong(usize),
    #[error("empty interface token is only valid in passive mode")]
    EmptyToken,
}

/// Split a device string into interface specs.
///
/// A leading or trailing colon is always invalid. Empty interior tokens
/// are skipped in passive mode; inline mode requires tokens grouped in
/// pairs, so an empty token is an error there.
pub(crate) fn parse_device(
    device: &str,
    mode: DaqMode,
) -> Result<Vec<IfaceSpec>, DeviceSpecError> {
    if device.is_empty() || device.starts_with(':') || device.ends_with(':') {
        return Err(DeviceSpecError::Malformed(device.to_string()));
    }
    let mut specs = Vec::new();
    for token in device.split(':') {
        if token.is_empty() {
            match mode {
                DaqMode::Passive => continue,
                DaqMode::Inline => return Err(DeviceSpecError::EmptyToken),
            }
        }
        if token.len() >= IFNAMSIZ {
            return Err(DeviceSpecError::NameTooLong(token.len()));
        }
        specs.push(parse_token(token)?);
    }
    Ok(specs)
}

/// Parse one `dpdk<port>[-<queue>]` token. The queue defaults to 0.
pub(crate) fn parse_token(token: &str) -> Result<IfaceSpec, DeviceSpecError> {
    let malformed = || DeviceSpecError::Malformed(token.to_string());
    let rest = token.strip_prefix("dpdk").ok_or_else(malformed)?;
    let (port, queue) = match rest.split_once('-') {
        Some((port, queue)) => (port, Some(queue)),
        None => (rest, None),
    };
    let port = port.parse::<u16>().map_err(|_| malformed())?;
    let queue = match queue {
        Some(queue) => queue.parse::<u16>().map_err(|_| malformed())?,
        None => 0,
    };
    Ok(IfaceSpec {
        port: PortId(port),
        queue: QueueId(queue),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token() {
        assert_eq!(
            parse_device("dpdk0", DaqMode::Passive).unwrap(),
            vec![IfaceSpec {
                port: PortId(0),
                queue: QueueId(0)
            }]
        );
    }

    #[test]
    fn queue_suffix_on_port_zero() {
        // shared port, distinct queues
        let specs = parse_device("dpdk0:dpdk0-1", DaqMode::Passive).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].port, specs[1].port);
        assert_eq!(specs[0].queue, QueueId(0));
        assert_eq!(specs[1].queue, QueueId(1));
    }

    #[test]
    fn multi_digit_port_and_queue() {
        assert_eq!(
            parse_token("dpdk12-34").unwrap(),
            IfaceSpec {
                port: PortId(12),
                queue: QueueId(34)
            }
        );
    }

    #[test]
    fn leading_and_trailing_colons_are_invalid() {
        assert!(matches!(
            parse_device(":dpdk0", DaqMode::Passive),
            Err(DeviceSpecError::Malformed(_))
        ));
        assert!(matches!(
            parse_device("dpdk0:", DaqMode::Passive),
            Err(DeviceSpecError::Malformed(_))
        ));
        assert!(matches!(
            parse_device("", DaqMode::Passive),
            Err(DeviceSpecError::Malformed(_))
        ));
    }

    #[test]
    fn empty_tokens_depend_on_mode() {
        let specs = parse_device("dpdk0::dpdk1", DaqMode::Passive).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(
            parse_device("dpdk0::dpdk1", DaqMode::Inline),
            Err(DeviceSpecError::EmptyToken)
        );
    }

    #[test]
    fn malformed_tokens() {
        for token in ["eth0", "dpdk", "dpdk-1", "dpdkx", "dpdk1x", "dpdk1-", "dpdk1-x"] {
            assert!(parse_token(token).is_err(), "{token} should not parse");
        }
    }

    #[test]
    fn overlong_token() {
        assert_eq!(
            parse_device("dpdk111111111111111", DaqMode::Passive),
            Err(DeviceSpecError::NameTooLong(19))
        );
    }

    #[test]
    fn fuzzed_devices_never_panic() {
        bolero::check!().with_type::<String>().for_each(|device: &String| {
            let _ = parse_device(device, DaqMode::Passive);
            let _ = parse_device(device, DaqMode::Inline);
        });
    }
}
