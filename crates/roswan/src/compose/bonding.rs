//! Link-aggregation composer.
//!
//! Assembles a single `/interface bonding` statement. The mode decides
//! which optional parameters are legal; parameters that do not apply to
//! the selected mode are omitted from output rather than erroring, so a
//! profile can carry a hash policy while the operator flips between
//! modes. The legality table lives in [`BondMode`].

use std::fmt;
use std::str::FromStr;

use crate::document::{Document, Section};
use crate::error::{Error, Result};
use crate::statement::Statement;

/// Bonding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondMode {
    /// Round-robin across members.
    #[default]
    BalanceRr,
    /// One active member, the rest standby.
    ActiveBackup,
    /// XOR of hash-policy fields selects the member.
    BalanceXor,
    /// Transmit on all members.
    Broadcast,
    /// 802.3ad link aggregation (LACP).
    Ieee802_3ad,
    /// Transmit load balancing.
    BalanceTlb,
    /// Adaptive load balancing.
    BalanceAlb,
}

impl BondMode {
    /// The literal mode token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BalanceRr => "balance-rr",
            Self::ActiveBackup => "active-backup",
            Self::BalanceXor => "balance-xor",
            Self::Broadcast => "broadcast",
            Self::Ieee802_3ad => "802.3ad",
            Self::BalanceTlb => "balance-tlb",
            Self::BalanceAlb => "balance-alb",
        }
    }

    /// Whether a `primary` member is meaningful for this mode.
    pub fn supports_primary(self) -> bool {
        self == Self::ActiveBackup
    }

    /// Whether LACP negotiation applies to this mode.
    pub fn supports_lacp(self) -> bool {
        self == Self::Ieee802_3ad
    }

    /// Whether a transmit hash policy applies: only the modes that keep
    /// multiple members simultaneously active and pick one per flow.
    pub fn supports_hash_policy(self) -> bool {
        matches!(self, Self::BalanceXor | Self::Ieee802_3ad)
    }
}

impl fmt::Display for BondMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BondMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "balance-rr" => Ok(Self::BalanceRr),
            "active-backup" => Ok(Self::ActiveBackup),
            "balance-xor" => Ok(Self::BalanceXor),
            "broadcast" => Ok(Self::Broadcast),
            "802.3ad" => Ok(Self::Ieee802_3ad),
            "balance-tlb" => Ok(Self::BalanceTlb),
            "balance-alb" => Ok(Self::BalanceAlb),
            _ => Err(Error::UnknownBondMode {
                value: s.to_string(),
            }),
        }
    }
}

/// LACP negotiation rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LacpRate {
    /// Partner transmits every 30 seconds.
    #[default]
    Every30Secs,
    /// Partner transmits every second.
    EverySecond,
}

impl LacpRate {
    /// The literal rate token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Every30Secs => "30secs",
            Self::EverySecond => "1sec",
        }
    }
}

impl FromStr for LacpRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "30secs" => Ok(Self::Every30Secs),
            "1sec" => Ok(Self::EverySecond),
            _ => Err(Error::UnknownLacpRate {
                value: s.to_string(),
            }),
        }
    }
}

/// Transmit hash policy for the multi-active modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashPolicy {
    /// Hash MAC addresses.
    #[default]
    Layer2,
    /// Hash MAC and IP addresses.
    Layer2And3,
    /// Hash IP addresses and ports.
    Layer3And4,
}

impl HashPolicy {
    /// The literal policy token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layer2 => "layer-2",
            Self::Layer2And3 => "layer-2-and-3",
            Self::Layer3And4 => "layer-3-and-4",
        }
    }
}

impl FromStr for HashPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "layer-2" => Ok(Self::Layer2),
            "layer-2-and-3" => Ok(Self::Layer2And3),
            "layer-3-and-4" => Ok(Self::Layer3And4),
            _ => Err(Error::UnknownHashPolicy {
                value: s.to_string(),
            }),
        }
    }
}

/// Options for the bonding composer.
#[derive(Debug, Clone)]
pub struct BondOptions {
    pub(crate) name: String,
    pub(crate) members: Vec<String>,
    pub(crate) mode: BondMode,
    pub(crate) primary: Option<String>,
    pub(crate) lacp_rate: Option<LacpRate>,
    pub(crate) hash_policy: Option<HashPolicy>,
    pub(crate) mii_interval_ms: Option<u32>,
    pub(crate) down_delay_ms: Option<u32>,
    pub(crate) up_delay_ms: Option<u32>,
}

impl Default for BondOptions {
    fn default() -> Self {
        Self {
            name: "bond1".to_string(),
            members: Vec::new(),
            mode: BondMode::default(),
            primary: None,
            lacp_rate: None,
            hash_policy: None,
            mii_interval_ms: None,
            down_delay_ms: None,
            up_delay_ms: None,
        }
    }
}

impl BondOptions {
    /// Create options for the given member interfaces.
    pub fn new(members: &[&str]) -> Self {
        Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Set the bonding interface name (default `bond1`).
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the bonding mode.
    pub fn with_mode(mut self, mode: BondMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the primary member (active-backup mode only).
    pub fn with_primary(mut self, primary: &str) -> Self {
        self.primary = Some(primary.to_string());
        self
    }

    /// Set the LACP rate (802.3ad mode only; defaults to 30secs there).
    pub fn with_lacp_rate(mut self, rate: LacpRate) -> Self {
        self.lacp_rate = Some(rate);
        self
    }

    /// Set the transmit hash policy (multi-active modes only).
    pub fn with_hash_policy(mut self, policy: HashPolicy) -> Self {
        self.hash_policy = Some(policy);
        self
    }

    /// Set the MII link-monitoring interval in milliseconds.
    pub fn with_mii_interval_ms(mut self, ms: u32) -> Self {
        self.mii_interval_ms = Some(ms);
        self
    }

    /// Set the delay before disabling a failed member, in milliseconds.
    pub fn with_down_delay_ms(mut self, ms: u32) -> Self {
        self.down_delay_ms = Some(ms);
        self
    }

    /// Set the delay before re-enabling a recovered member, in
    /// milliseconds.
    pub fn with_up_delay_ms(mut self, ms: u32) -> Self {
        self.up_delay_ms = Some(ms);
        self
    }
}

/// Compose a single link-aggregation statement.
pub fn bonding(options: &BondOptions) -> Result<Document> {
    if options.members.is_empty() {
        return Err(Error::NoBondMembers);
    }

    let mode = options.mode;
    let mut stmt = Statement::add()
        .arg("name", &options.name)
        .arg("slaves", options.members.join(","))
        .arg("mode", mode.as_str());

    if mode.supports_primary() {
        stmt = stmt.arg_opt("primary", options.primary.as_deref());
    }
    if mode.supports_lacp() {
        // The device negotiates LACP regardless, so the rate is always
        // pinned for 802.3ad even when the caller left it unset.
        let rate = options.lacp_rate.unwrap_or_default();
        stmt = stmt.arg("lacp-rate", rate.as_str());
    }
    if mode.supports_hash_policy() {
        stmt = stmt.arg_opt(
            "transmit-hash-policy",
            options.hash_policy.map(HashPolicy::as_str),
        );
    }
    stmt = stmt
        .arg_opt("mii-interval", options.mii_interval_ms.map(|ms| format!("{ms}ms")))
        .arg_opt("down-delay", options.down_delay_ms.map(|ms| format!("{ms}ms")))
        .arg_opt("up-delay", options.up_delay_ms.map(|ms| format!("{ms}ms")));

    let mut doc = Document::new();
    doc.push(Section::Bonding, stmt);
    Ok(doc)
}
