//! Equal-cost multi-path composer.
//!
//! Gateways are expanded by literal repetition (count = weight) into one
//! comma-joined gateway field on a single default route; the device's own
//! per-flow hashing then biases distribution proportionally to how often a
//! gateway repeats. A flattened list of length 1 collapses to plain
//! single-gateway syntax, since some firmware rejects a degenerate
//! one-element multi-gateway route.

use crate::document::{Document, Section};
use crate::error::{Error, Result};
use crate::model::{CheckGateway, Uplink};
use crate::statement::Statement;

use super::connection_mark;

/// One blended-route gateway entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcmpGateway {
    pub(crate) gateway: std::net::IpAddr,
    pub(crate) weight: u32,
    pub(crate) interface: Option<String>,
}

impl EcmpGateway {
    /// Create a gateway entry with weight 1 and no dedicated interface.
    pub fn new(gateway: std::net::IpAddr) -> Self {
        Self {
            gateway,
            weight: 1,
            interface: None,
        }
    }

    /// Set the repetition weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Name a dedicated interface for this gateway. The composer then
    /// also emits a mark pair and a fallback route in an
    /// interface-specific table, keeping the interface independently
    /// reachable outside the blended route.
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interface = Some(interface.to_string());
        self
    }
}

impl From<&Uplink> for EcmpGateway {
    fn from(uplink: &Uplink) -> Self {
        Self {
            gateway: uplink.gateway(),
            weight: uplink.weight(),
            interface: Some(uplink.interface().to_string()),
        }
    }
}

/// Options for the ECMP composer.
#[derive(Debug, Clone)]
pub struct EcmpOptions {
    pub(crate) check_gateway: CheckGateway,
    pub(crate) distance: u32,
}

impl Default for EcmpOptions {
    fn default() -> Self {
        Self {
            check_gateway: CheckGateway::default(),
            distance: 1,
        }
    }
}

impl EcmpOptions {
    /// Options with ping checks at distance 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway liveness check mode.
    pub fn with_check_gateway(mut self, mode: CheckGateway) -> Self {
        self.check_gateway = mode;
        self
    }

    /// Set the base distance of the blended route.
    pub fn with_distance(mut self, distance: u32) -> Self {
        self.distance = distance;
        self
    }
}

/// Compose a blended multi-gateway default route.
///
/// # Example
///
/// ```
/// use roswan::compose::{ecmp, EcmpGateway, EcmpOptions};
/// use roswan::Section;
///
/// let gateways = vec![
///     EcmpGateway::new("10.0.0.1".parse().unwrap()).with_weight(2),
///     EcmpGateway::new("10.0.1.1".parse().unwrap()),
/// ];
/// let doc = ecmp(&gateways, &EcmpOptions::default()).unwrap();
/// assert!(doc.statements(Section::Route)[0].contains("gateway=10.0.0.1,10.0.0.1,10.0.1.1"));
/// ```
pub fn ecmp(gateways: &[EcmpGateway], options: &EcmpOptions) -> Result<Document> {
    if gateways.is_empty() {
        return Err(Error::NoUplinks);
    }

    let mut flattened: Vec<String> = Vec::new();
    for entry in gateways {
        for _ in 0..entry.weight {
            flattened.push(entry.gateway.to_string());
        }
    }
    if flattened.is_empty() {
        return Err(Error::AllZeroWeights);
    }

    let mut doc = Document::new();
    doc.push(
        Section::Route,
        Statement::add()
            .arg("dst-address", "0.0.0.0/0")
            .arg("gateway", flattened.join(","))
            .arg_opt("check-gateway", options.check_gateway.as_str())
            .arg("distance", options.distance),
    );

    // Dedicated-interface entries stay reachable outside the blend: tag
    // their inbound connections and give each a single-gateway table.
    for entry in gateways {
        let Some(interface) = entry.interface.as_deref() else {
            continue;
        };
        let table = format!("to_{interface}");
        let mark = connection_mark(&table);
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "input")
                .arg("in-interface", interface)
                .arg("action", "mark-connection")
                .arg("new-connection-mark", &mark),
        );
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "output")
                .arg("connection-mark", &mark)
                .arg("action", "mark-routing")
                .arg("new-routing-mark", &table),
        );
        doc.push(
            Section::Route,
            Statement::add()
                .arg("dst-address", "0.0.0.0/0")
                .arg("gateway", entry.gateway)
                .arg("routing-mark", &table)
                .arg("distance", 1),
        );
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gw(addr: &str) -> EcmpGateway {
        EcmpGateway::new(addr.parse().unwrap())
    }

    #[test]
    fn test_weight_by_repetition() {
        let doc = ecmp(
            &[gw("10.0.0.1").with_weight(2), gw("10.0.1.1")],
            &EcmpOptions::default(),
        )
        .unwrap();
        let route = &doc.statements(Section::Route)[0];
        assert!(route.contains("gateway=10.0.0.1,10.0.0.1,10.0.1.1"));
        assert!(route.contains("check-gateway=ping"));
        assert!(route.contains("distance=1"));
    }

    #[test]
    fn test_single_gateway_is_not_a_list() {
        let doc = ecmp(&[gw("10.0.0.1")], &EcmpOptions::default()).unwrap();
        let route = &doc.statements(Section::Route)[0];
        assert!(route.contains("gateway=10.0.0.1 "));
        assert!(!route.contains(','));
    }

    #[test]
    fn test_check_gateway_none_omitted() {
        let options = EcmpOptions::default().with_check_gateway(CheckGateway::None);
        let doc = ecmp(&[gw("10.0.0.1")], &options).unwrap();
        assert!(!doc.statements(Section::Route)[0].contains("check-gateway"));
    }

    #[test]
    fn test_dedicated_interface_escape_hatch() {
        let doc = ecmp(
            &[gw("10.0.0.1").with_interface("ether1"), gw("10.0.1.1")],
            &EcmpOptions::default(),
        )
        .unwrap();
        let mangle = doc.statements(Section::Mangle);
        assert_eq!(mangle.len(), 2);
        assert!(mangle[0].contains("new-connection-mark=to_ether1_conn"));
        assert!(mangle[1].contains("new-routing-mark=to_ether1"));
        let routes = doc.statements(Section::Route);
        assert_eq!(routes.len(), 2);
        assert!(routes[1].contains("routing-mark=to_ether1"));
        assert!(!routes[1].contains(','));
    }

    #[test]
    fn test_zero_weights_rejected() {
        assert!(matches!(
            ecmp(&[gw("10.0.0.1").with_weight(0)], &EcmpOptions::default()),
            Err(Error::AllZeroWeights)
        ));
        assert!(matches!(
            ecmp(&[], &EcmpOptions::default()),
            Err(Error::NoUplinks)
        ));
    }
}
