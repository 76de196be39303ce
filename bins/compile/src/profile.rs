//! Profile file format.
//!
//! A profile is the on-disk form of the compiler's input: the uplink
//! list, the strategy tag, and per-strategy parameters. Enum-valued
//! fields are plain strings here and parse through the library's
//! `FromStr` boundaries, so an unknown classifier, bonding mode, or
//! strategy tag fails fast with an error naming the value instead of
//! producing an empty document.

use std::net::IpAddr;

use serde::Deserialize;

use roswan::compose::{
    BondOptions, EcmpOptions, FailoverOptions, NthOptions, PccOptions,
};
use roswan::{Error, NthCounter, Result, Strategy, StrategyKind, Uplink};

/// On-disk compilation profile.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Strategy tag (`pcc`, `pcc-weighted`, `nth`, `ecmp`, `bonding`,
    /// `failover`, `pcc-failover`, `ecmp-failover`).
    pub strategy: String,

    /// LAN-side interface for the partitioning strategies.
    #[serde(default)]
    pub lan_interface: Option<String>,

    /// PCC classifier field combination.
    #[serde(default)]
    pub classifier: Option<String>,

    /// ECMP gateway liveness check mode (`ping`, `arp`, `none`).
    #[serde(default)]
    pub check_gateway: Option<String>,

    /// ECMP base distance.
    #[serde(default)]
    pub distance: Option<u32>,

    /// Failover check interval in seconds.
    #[serde(default)]
    pub check_interval_secs: Option<u32>,

    /// Failover monitoring script name.
    #[serde(default)]
    pub script_name: Option<String>,

    /// Explicit per-uplink nth counters.
    #[serde(default)]
    pub nth_counters: Vec<NthEntry>,

    /// WAN uplinks.
    #[serde(default)]
    pub uplinks: Vec<UplinkEntry>,

    /// Bonding parameters (required by the `bonding` strategy).
    #[serde(default)]
    pub bond: Option<BondEntry>,
}

/// One uplink in a profile.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UplinkEntry {
    pub interface: String,
    pub gateway: IpAddr,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub check_target: Option<IpAddr>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// An explicit nth counter pair.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NthEntry {
    pub every: u32,
    pub packet: u32,
}

/// Bonding parameters.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BondEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub slaves: Vec<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub lacp_rate: Option<String>,
    #[serde(default)]
    pub transmit_hash_policy: Option<String>,
    #[serde(default)]
    pub mii_interval_ms: Option<u32>,
    #[serde(default)]
    pub down_delay_ms: Option<u32>,
    #[serde(default)]
    pub up_delay_ms: Option<u32>,
}

impl Profile {
    /// Build the uplink list.
    pub fn uplinks(&self) -> Vec<Uplink> {
        self.uplinks
            .iter()
            .map(|entry| {
                let mut uplink = Uplink::new(&entry.interface, entry.gateway);
                if let Some(priority) = entry.priority {
                    uplink = uplink.with_priority(priority);
                }
                if let Some(weight) = entry.weight {
                    uplink = uplink.with_weight(weight);
                }
                if let Some(target) = entry.check_target {
                    uplink = uplink.with_check_target(target);
                }
                if let Some(table) = &entry.table {
                    uplink = uplink.with_table(table);
                }
                if let Some(comment) = &entry.comment {
                    uplink = uplink.with_comment(comment);
                }
                uplink
            })
            .collect()
    }

    /// Resolve the strategy tag and its parameters.
    pub fn strategy(&self) -> Result<Strategy> {
        let kind: StrategyKind = self.strategy.parse()?;
        Ok(match kind {
            StrategyKind::Pcc => Strategy::PccEqual(self.pcc_options()?),
            StrategyKind::PccWeighted => Strategy::PccWeighted(self.pcc_options()?),
            StrategyKind::Nth => Strategy::Nth(self.nth_options()),
            StrategyKind::Ecmp => Strategy::Ecmp(self.ecmp_options()?),
            StrategyKind::Bonding => Strategy::Bonding(self.bond_options()?),
            StrategyKind::Failover => Strategy::Failover(self.failover_options()),
            StrategyKind::PccFailover => {
                Strategy::PccWithFailover(self.pcc_options()?, self.failover_options())
            }
            StrategyKind::EcmpFailover => {
                Strategy::EcmpWithFailover(self.ecmp_options()?, self.failover_options())
            }
        })
    }

    fn pcc_options(&self) -> Result<PccOptions> {
        let mut options = PccOptions::default();
        if let Some(classifier) = &self.classifier {
            options = options.with_classifier(classifier.parse()?);
        }
        if let Some(lan) = &self.lan_interface {
            options = options.with_lan_interface(lan);
        }
        Ok(options)
    }

    fn nth_options(&self) -> NthOptions {
        let mut options = NthOptions::default();
        if let Some(lan) = &self.lan_interface {
            options = options.with_lan_interface(lan);
        }
        if !self.nth_counters.is_empty() {
            options = options.with_counters(
                self.nth_counters
                    .iter()
                    .map(|entry| NthCounter::new(entry.every, entry.packet))
                    .collect(),
            );
        }
        options
    }

    fn ecmp_options(&self) -> Result<EcmpOptions> {
        let mut options = EcmpOptions::default();
        if let Some(mode) = &self.check_gateway {
            options = options.with_check_gateway(mode.parse()?);
        }
        if let Some(distance) = self.distance {
            options = options.with_distance(distance);
        }
        Ok(options)
    }

    fn failover_options(&self) -> FailoverOptions {
        let mut options = FailoverOptions::default();
        if let Some(secs) = self.check_interval_secs {
            options = options.with_check_interval_secs(secs);
        }
        if let Some(name) = &self.script_name {
            options = options.with_script_name(name);
        }
        options
    }

    fn bond_options(&self) -> Result<BondOptions> {
        let entry = self.bond.as_ref().ok_or_else(|| {
            Error::InvalidProfile("bonding strategy requires a bond section".to_string())
        })?;

        let members: Vec<&str> = entry.slaves.iter().map(String::as_str).collect();
        let mut options = BondOptions::new(&members);
        if let Some(name) = &entry.name {
            options = options.with_name(name);
        }
        if let Some(mode) = &entry.mode {
            options = options.with_mode(mode.parse()?);
        }
        if let Some(primary) = &entry.primary {
            options = options.with_primary(primary);
        }
        if let Some(rate) = &entry.lacp_rate {
            options = options.with_lacp_rate(rate.parse()?);
        }
        if let Some(policy) = &entry.transmit_hash_policy {
            options = options.with_hash_policy(policy.parse()?);
        }
        if let Some(ms) = entry.mii_interval_ms {
            options = options.with_mii_interval_ms(ms);
        }
        if let Some(ms) = entry.down_delay_ms {
            options = options.with_down_delay_ms(ms);
        }
        if let Some(ms) = entry.up_delay_ms {
            options = options.with_up_delay_ms(ms);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_pcc_profile() {
        let profile: Profile = serde_yaml::from_str(
            "strategy: pcc\n\
             uplinks:\n\
             - interface: ether1\n\
             \x20 gateway: 192.168.1.1\n\
             - interface: ether2\n\
             \x20 gateway: 10.7.0.1\n",
        )
        .unwrap();
        let uplinks = profile.uplinks();
        assert_eq!(uplinks.len(), 2);
        assert!(matches!(profile.strategy().unwrap(), Strategy::PccEqual(_)));
    }

    #[test]
    fn test_unknown_strategy_fails_fast() {
        let profile: Profile = serde_yaml::from_str("strategy: telepathy\n").unwrap();
        let err = profile.strategy().unwrap_err();
        assert!(err.to_string().contains("telepathy"));
    }

    #[test]
    fn test_bonding_requires_bond_section() {
        let profile: Profile = serde_yaml::from_str("strategy: bonding\n").unwrap();
        assert!(profile.strategy().is_err());
    }

    #[test]
    fn test_bond_entry_parses_mode_strings() {
        let profile: Profile = serde_yaml::from_str(
            "strategy: bonding\n\
             bond:\n\
             \x20 slaves: [ether1, ether2]\n\
             \x20 mode: 802.3ad\n\
             \x20 lacp_rate: 1sec\n",
        )
        .unwrap();
        assert!(profile.strategy().is_ok());

        let bad: Profile = serde_yaml::from_str(
            "strategy: bonding\n\
             bond:\n\
             \x20 slaves: [ether1]\n\
             \x20 mode: balance-chaos\n",
        )
        .unwrap();
        assert!(bad.strategy().is_err());
    }
}
