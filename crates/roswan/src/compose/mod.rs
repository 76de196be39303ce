//! Strategy composers and the dispatcher.
//!
//! Each traffic-distribution strategy has one entry point returning a
//! freshly allocated [`Document`]; [`compile`] dispatches on the closed
//! [`Strategy`] enum, so adding a strategy is caught at compile time and
//! an unrecognized value cannot silently produce an empty document.
//! Strings only enter the picture at the profile boundary, where
//! [`StrategyKind`] parsing fails fast with a descriptive error.

mod bonding;
mod ecmp;
mod failover;
mod partition;
mod service;

pub use bonding::{BondMode, BondOptions, HashPolicy, LacpRate, bonding};
pub use ecmp::{EcmpGateway, EcmpOptions, ecmp};
pub use failover::{FailoverOptions, failover};
pub use partition::{NthOptions, PccOptions, nth, pcc, pcc_weighted};
pub use service::{Protocol, ServiceOptions, ServicePin, dns_servers, service_ports, vpn_peers};

use std::fmt;
use std::str::FromStr;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::model::Uplink;
use crate::weights;

/// A traffic-distribution strategy together with its composer parameters.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Equal-share per-connection classification.
    PccEqual(PccOptions),
    /// Weighted per-connection classification.
    PccWeighted(PccOptions),
    /// Nth-packet round-robin distribution.
    Nth(NthOptions),
    /// Blended multi-gateway default route.
    Ecmp(EcmpOptions),
    /// Link aggregation of the member interfaces.
    Bonding(BondOptions),
    /// Priority-ordered failover with a health-check script.
    Failover(FailoverOptions),
    /// PCC load balancing plus failover routes and health checks.
    PccWithFailover(PccOptions, FailoverOptions),
    /// ECMP plus failover routes and health checks.
    EcmpWithFailover(EcmpOptions, FailoverOptions),
}

impl Strategy {
    /// The bare tag for this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::PccEqual(_) => StrategyKind::Pcc,
            Self::PccWeighted(_) => StrategyKind::PccWeighted,
            Self::Nth(_) => StrategyKind::Nth,
            Self::Ecmp(_) => StrategyKind::Ecmp,
            Self::Bonding(_) => StrategyKind::Bonding,
            Self::Failover(_) => StrategyKind::Failover,
            Self::PccWithFailover(..) => StrategyKind::PccFailover,
            Self::EcmpWithFailover(..) => StrategyKind::EcmpFailover,
        }
    }
}

/// Bare strategy tag, as written in profile files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// `pcc`
    Pcc,
    /// `pcc-weighted`
    PccWeighted,
    /// `nth`
    Nth,
    /// `ecmp`
    Ecmp,
    /// `bonding`
    Bonding,
    /// `failover`
    Failover,
    /// `pcc-failover`
    PccFailover,
    /// `ecmp-failover`
    EcmpFailover,
}

impl StrategyKind {
    /// The literal strategy tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pcc => "pcc",
            Self::PccWeighted => "pcc-weighted",
            Self::Nth => "nth",
            Self::Ecmp => "ecmp",
            Self::Bonding => "bonding",
            Self::Failover => "failover",
            Self::PccFailover => "pcc-failover",
            Self::EcmpFailover => "ecmp-failover",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pcc" => Ok(Self::Pcc),
            "pcc-weighted" => Ok(Self::PccWeighted),
            "nth" => Ok(Self::Nth),
            "ecmp" => Ok(Self::Ecmp),
            "bonding" => Ok(Self::Bonding),
            "failover" => Ok(Self::Failover),
            "pcc-failover" => Ok(Self::PccFailover),
            "ecmp-failover" => Ok(Self::EcmpFailover),
            _ => Err(Error::UnknownStrategy {
                value: s.to_string(),
            }),
        }
    }
}

/// Compile the configuration document for one strategy.
///
/// Composite strategies merge their component documents through
/// [`Document::assemble`] in call order.
pub fn compile(uplinks: &[Uplink], strategy: &Strategy) -> Result<Document> {
    tracing::debug!(
        uplinks = uplinks.len(),
        strategy = %strategy.kind(),
        "compiling configuration"
    );
    match strategy {
        Strategy::PccEqual(options) => pcc(uplinks, options),
        Strategy::PccWeighted(options) => pcc_weighted(uplinks, options),
        Strategy::Nth(options) => nth(uplinks, options),
        Strategy::Ecmp(options) => ecmp(&ecmp_gateways(uplinks)?, options),
        Strategy::Bonding(options) => bonding(options),
        Strategy::Failover(options) => failover(uplinks, options),
        Strategy::PccWithFailover(pcc_options, failover_options) => Ok(Document::assemble([
            pcc(uplinks, pcc_options)?,
            failover(uplinks, failover_options)?,
        ])),
        Strategy::EcmpWithFailover(ecmp_options, failover_options) => Ok(Document::assemble([
            ecmp(&ecmp_gateways(uplinks)?, ecmp_options)?,
            failover(uplinks, failover_options)?,
        ])),
    }
}

/// Build blended-route gateway entries from uplinks, reducing raw
/// bandwidth weights to their smallest ratio so a 100/50 pair repeats
/// 2/1, not 100/50.
fn ecmp_gateways(uplinks: &[Uplink]) -> Result<Vec<EcmpGateway>> {
    if uplinks.is_empty() {
        return Err(Error::NoUplinks);
    }
    let raw: Vec<u32> = uplinks.iter().map(|u| u.weight()).collect();
    let ratios = weights::normalize(&raw)?;
    Ok(uplinks
        .iter()
        .zip(ratios)
        .map(|(uplink, ratio)| EcmpGateway::from(uplink).with_weight(ratio))
        .collect())
}

/// Routing-table name for an uplink: explicit name, or `wan{position+1}`.
pub(crate) fn table_name(uplink: &Uplink, position: usize) -> String {
    match uplink.table() {
        Some(table) => table.to_string(),
        None => format!("wan{}", position + 1),
    }
}

/// Connection mark derived from a routing-table name.
pub(crate) fn connection_mark(table: &str) -> String {
    format!("{table}_conn")
}
