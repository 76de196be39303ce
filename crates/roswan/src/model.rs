//! Core types for declarative multi-WAN configuration.
//!
//! An [`Uplink`] describes one WAN link as the caller sees it: physical
//! interface, gateway, preference, relative bandwidth, and optional
//! health-check target. Uplinks are constructed by the caller, consumed by
//! composers, and never mutated.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::Error;

/// A WAN uplink.
///
/// # Example
///
/// ```
/// use roswan::Uplink;
///
/// let uplink = Uplink::new("ether1", "192.168.1.1".parse().unwrap())
///     .with_priority(1)
///     .with_weight(100)
///     .with_check_target("8.8.8.8".parse().unwrap())
///     .with_comment("fiber");
/// assert_eq!(uplink.interface(), "ether1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    pub(crate) interface: String,
    pub(crate) gateway: IpAddr,
    pub(crate) priority: u32,
    pub(crate) weight: u32,
    pub(crate) check_target: Option<IpAddr>,
    pub(crate) table: Option<String>,
    pub(crate) comment: Option<String>,
}

impl Uplink {
    /// Create an uplink on the given interface and gateway.
    ///
    /// Defaults: priority 1, weight 1, no check target, routing-table name
    /// derived from list position (`wan1`, `wan2`, ...), no comment.
    pub fn new(interface: &str, gateway: IpAddr) -> Self {
        Self {
            interface: interface.to_string(),
            gateway,
            priority: 1,
            weight: 1,
            check_target: None,
            table: None,
            comment: None,
        }
    }

    /// Set the failover priority (lower is more preferred).
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the relative bandwidth weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the health-check target address.
    pub fn with_check_target(mut self, target: IpAddr) -> Self {
        self.check_target = Some(target);
        self
    }

    /// Set an explicit routing-table (routing-mark) name.
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Set a comment carried onto the emitted route.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Get the interface name.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Get the gateway address.
    pub fn gateway(&self) -> IpAddr {
        self.gateway
    }

    /// Get the failover priority.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Get the bandwidth weight.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Get the health-check target, if set.
    pub fn check_target(&self) -> Option<IpAddr> {
        self.check_target
    }

    /// Get the explicit routing-table name, if set.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the comment, if set.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Per-connection-classifier field combination.
///
/// Selects which packet fields feed the classifier hash that buckets
/// connections across uplinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PccClassifier {
    /// Hash the source address only.
    SrcAddress,
    /// Hash the destination address only.
    DstAddress,
    /// Hash both addresses.
    BothAddresses,
    /// Hash source address and port.
    SrcAddressAndPort,
    /// Hash destination address and port.
    DstAddressAndPort,
    /// Hash both addresses and both ports.
    #[default]
    BothAddressesAndPorts,
}

impl PccClassifier {
    /// The literal classifier token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SrcAddress => "src-address",
            Self::DstAddress => "dst-address",
            Self::BothAddresses => "both-addresses",
            Self::SrcAddressAndPort => "src-address-and-port",
            Self::DstAddressAndPort => "dst-address-and-port",
            Self::BothAddressesAndPorts => "both-addresses-and-ports",
        }
    }
}

impl fmt::Display for PccClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PccClassifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "src-address" => Ok(Self::SrcAddress),
            "dst-address" => Ok(Self::DstAddress),
            "both-addresses" => Ok(Self::BothAddresses),
            "src-address-and-port" => Ok(Self::SrcAddressAndPort),
            "dst-address-and-port" => Ok(Self::DstAddressAndPort),
            "both-addresses-and-ports" => Ok(Self::BothAddressesAndPorts),
            _ => Err(Error::UnknownClassifier {
                value: s.to_string(),
            }),
        }
    }
}

/// Gateway liveness check mode for emitted routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckGateway {
    /// Probe the gateway with ICMP echo.
    #[default]
    Ping,
    /// Probe the gateway with ARP.
    Arp,
    /// No liveness check; the token is omitted from output.
    None,
}

impl CheckGateway {
    /// The literal token, or `None` when the argument should be omitted.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Ping => Some("ping"),
            Self::Arp => Some("arp"),
            Self::None => None,
        }
    }
}

impl FromStr for CheckGateway {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ping" => Ok(Self::Ping),
            "arp" => Ok(Self::Arp),
            "none" => Ok(Self::None),
            _ => Err(Error::UnknownCheckMode {
                value: s.to_string(),
            }),
        }
    }
}

/// An explicit `(every, packet)` pair for nth-packet matching.
///
/// Device counters are 1-based: `packet` must be in `1..=every`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthCounter {
    /// Match every `every`-th packet.
    pub every: u32,
    /// Which packet of the cycle to match.
    pub packet: u32,
}

impl NthCounter {
    /// Create a counter pair.
    pub fn new(every: u32, packet: u32) -> Self {
        Self { every, packet }
    }
}
