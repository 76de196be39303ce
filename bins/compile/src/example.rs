//! Example command - generate example profile files.

use clap::{Args, ValueEnum};
use roswan::{Error, Result};

#[derive(Args)]
pub struct ExampleArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Example type to generate
    #[arg(short, long, value_enum, default_value = "pcc")]
    pub example: ExampleType,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Clone, ValueEnum)]
pub enum ExampleType {
    /// Equal per-connection-classifier balancing
    Pcc,
    /// Weighted per-connection-classifier balancing
    Weighted,
    /// Equal-cost multipath routing
    Ecmp,
    /// LACP link aggregation
    Bonding,
    /// Priority failover with a monitoring script
    Failover,
}

pub fn run(args: ExampleArgs) -> Result<()> {
    let example = match args.example {
        ExampleType::Pcc => PCC_EXAMPLE,
        ExampleType::Weighted => WEIGHTED_EXAMPLE,
        ExampleType::Ecmp => ECMP_EXAMPLE,
        ExampleType::Bonding => BONDING_EXAMPLE,
        ExampleType::Failover => FAILOVER_EXAMPLE,
    };

    match args.format {
        OutputFormat::Yaml => {
            println!("{}", example);
        }
        OutputFormat::Json => {
            // Convert YAML to JSON
            let value: serde_yaml::Value = serde_yaml::from_str(example)
                .map_err(|e| Error::InvalidProfile(format!("YAML parse failed: {}", e)))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

const PCC_EXAMPLE: &str = r#"# Equal per-connection-classifier balancing
# Splits new connections evenly across two uplinks.

strategy: pcc
lan_interface: bridge

uplinks:
  - interface: ether1
    gateway: 192.168.1.1
    comment: fiber
  - interface: ether2
    gateway: 10.7.0.1
    comment: cable
"#;

const WEIGHTED_EXAMPLE: &str = r#"# Weighted per-connection-classifier balancing
# Weights reduce to the smallest integer ratio before bucketing,
# so 100/50/25 partitions the classifier space 4:2:1.

strategy: pcc-weighted
lan_interface: bridge
classifier: both-addresses-and-ports

uplinks:
  - interface: ether1
    gateway: 192.168.1.1
    weight: 100
  - interface: ether2
    gateway: 10.7.0.1
    weight: 50
  - interface: ether3
    gateway: 172.16.0.1
    weight: 25
"#;

const ECMP_EXAMPLE: &str = r#"# Equal-cost multipath routing
# A single default route with each gateway repeated by weight.

strategy: ecmp
check_gateway: ping

uplinks:
  - interface: ether1
    gateway: 192.168.1.1
    weight: 2
  - interface: ether2
    gateway: 10.7.0.1
    weight: 1
"#;

const BONDING_EXAMPLE: &str = r#"# LACP link aggregation
# Requires an 802.3ad-capable switch on the far end.

strategy: bonding

bond:
  name: bond1
  slaves: [ether1, ether2]
  mode: 802.3ad
  lacp_rate: 1sec
  transmit_hash_policy: layer-3-and-4
  mii_interval_ms: 100
"#;

const FAILOVER_EXAMPLE: &str = r#"# Priority failover
# Lower priority wins; the scheduler pings each check target and
# disables routes whose uplink stops answering.

strategy: failover
check_interval_secs: 30
script_name: wan-failover

uplinks:
  - interface: ether1
    gateway: 192.168.1.1
    priority: 1
    check_target: 8.8.8.8
    comment: primary
  - interface: ether2
    gateway: 10.7.0.1
    priority: 2
    check_target: 1.1.1.1
    comment: backup
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use roswan::compile;

    #[test]
    fn test_every_example_compiles() {
        for example in [
            PCC_EXAMPLE,
            WEIGHTED_EXAMPLE,
            ECMP_EXAMPLE,
            BONDING_EXAMPLE,
            FAILOVER_EXAMPLE,
        ] {
            let profile: Profile = serde_yaml::from_str(example).unwrap();
            let doc = compile(&profile.uplinks(), &profile.strategy().unwrap()).unwrap();
            assert!(!doc.is_empty());
        }
    }
}
