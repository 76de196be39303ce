//! Traffic-pinning composers: service ports, DNS servers, VPN peers.
//!
//! Each forces a class of traffic out one uplink regardless of the active
//! load-balancing strategy: chosen TCP/UDP services (a VoIP trunk that
//! must keep a stable source address), queries to specific DNS servers,
//! and connections to VPN endpoints whose tunnels would flap if their
//! outer flows migrated between WANs. All three emit per-match
//! mark-connection rules, one mark-routing rule, and a default route in
//! the uplink's table, with the same mark naming and section conventions
//! as the partition composers, so the output merges cleanly alongside
//! them.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::document::{Document, Section};
use crate::error::{Error, Result};
use crate::model::Uplink;
use crate::statement::Statement;

use super::{connection_mark, table_name};

/// IP protocol carrying a pinned service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

impl Protocol {
    /// The literal protocol token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            _ => Err(Error::UnknownProtocol {
                value: s.to_string(),
            }),
        }
    }
}

/// A set of destination ports on one protocol to pin to an uplink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePin {
    pub(crate) protocol: Protocol,
    pub(crate) ports: Vec<u16>,
}

impl ServicePin {
    /// Pin the given destination ports on a protocol.
    pub fn new(protocol: Protocol, ports: &[u16]) -> Self {
        Self {
            protocol,
            ports: ports.to_vec(),
        }
    }
}

/// Options for the service-port composer.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub(crate) lan_interface: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            lan_interface: "bridge".to_string(),
        }
    }
}

impl ServiceOptions {
    /// Options with the default LAN interface (`bridge`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LAN-side interface the pinned traffic arrives on.
    pub fn with_lan_interface(mut self, interface: &str) -> Self {
        self.lan_interface = interface.to_string();
        self
    }
}

/// Pin services to one uplink: one mark-connection rule per pin entry,
/// one mark-routing rule, and a default route in the uplink's table.
pub fn service_ports(
    uplink: &Uplink,
    pins: &[ServicePin],
    options: &ServiceOptions,
) -> Result<Document> {
    let table = table_name(uplink, 0);
    let mark = connection_mark(&table);

    let mut doc = Document::new();
    for pin in pins {
        let ports: Vec<String> = pin.ports.iter().map(u16::to_string).collect();
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "prerouting")
                .arg("in-interface", &options.lan_interface)
                .arg("connection-state", "new")
                .arg("protocol", pin.protocol)
                .arg("dst-port", ports.join(","))
                .arg("action", "mark-connection")
                .arg("new-connection-mark", &mark)
                .arg("passthrough", "yes"),
        );
    }
    bind_and_route(&mut doc, uplink, options, &table, &mark);
    Ok(doc)
}

/// Pin DNS traffic to one uplink: per server address, a mark-connection
/// rule for UDP and one for TCP port 53 queries to that server, then the
/// shared mark-routing rule and table route.
pub fn dns_servers(
    uplink: &Uplink,
    servers: &[IpAddr],
    options: &ServiceOptions,
) -> Result<Document> {
    let table = table_name(uplink, 0);
    let mark = connection_mark(&table);

    let mut doc = Document::new();
    for server in servers {
        for protocol in [Protocol::Udp, Protocol::Tcp] {
            doc.push(
                Section::Mangle,
                Statement::add()
                    .arg("chain", "prerouting")
                    .arg("in-interface", &options.lan_interface)
                    .arg("connection-state", "new")
                    .arg("protocol", protocol)
                    .arg("dst-address", server)
                    .arg("dst-port", 53)
                    .arg("action", "mark-connection")
                    .arg("new-connection-mark", &mark)
                    .arg("passthrough", "yes"),
            );
        }
    }
    bind_and_route(&mut doc, uplink, options, &table, &mark);
    Ok(doc)
}

/// Pin VPN peers to one uplink: per endpoint address, a mark-connection
/// rule for new connections to that endpoint, then the shared
/// mark-routing rule and table route. The outer flow of a tunnel then
/// keeps one source address no matter which balancing strategy runs
/// alongside.
pub fn vpn_peers(
    uplink: &Uplink,
    peers: &[IpAddr],
    options: &ServiceOptions,
) -> Result<Document> {
    let table = table_name(uplink, 0);
    let mark = connection_mark(&table);

    let mut doc = Document::new();
    for peer in peers {
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "prerouting")
                .arg("in-interface", &options.lan_interface)
                .arg("connection-state", "new")
                .arg("dst-address", peer)
                .arg("action", "mark-connection")
                .arg("new-connection-mark", &mark)
                .arg("passthrough", "yes"),
        );
    }
    bind_and_route(&mut doc, uplink, options, &table, &mark);
    Ok(doc)
}

/// Shared tail of every pinning composer: bind the marked connections to
/// the uplink's table and give that table its default route.
fn bind_and_route(
    doc: &mut Document,
    uplink: &Uplink,
    options: &ServiceOptions,
    table: &str,
    mark: &str,
) {
    doc.push(
        Section::Mangle,
        Statement::add()
            .arg("chain", "prerouting")
            .arg("in-interface", &options.lan_interface)
            .arg("connection-mark", mark)
            .arg("action", "mark-routing")
            .arg("new-routing-mark", table)
            .arg("passthrough", "no"),
    );
    doc.push(
        Section::Route,
        Statement::add()
            .arg("dst-address", "0.0.0.0/0")
            .arg("gateway", uplink.gateway())
            .arg("routing-mark", table)
            .arg("distance", 1)
            .quoted_opt("comment", uplink.comment()),
    );
}
