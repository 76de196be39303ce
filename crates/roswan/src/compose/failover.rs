//! Priority-ordered failover composer.
//!
//! Emits a distance ladder of checked default routes, one host route per
//! uplink pinning its probe target to its own gateway, and a scheduled
//! monitoring script that disables dead routes and re-enables recovered
//! ones. The script makes the setup self-healing even on firmware whose
//! native `check-gateway` is unreliable.
//!
//! The host-route pins matter: without them the probe to a check target
//! would itself follow the preferred default route, so a dead primary
//! could never be detected as such once traffic failed over.

use std::net::{IpAddr, Ipv4Addr};

use crate::document::{Document, Section};
use crate::error::{Error, Result};
use crate::model::Uplink;
use crate::statement::Statement;

/// Probe sample count per target per script run.
const PING_COUNT: u32 = 3;

/// Scope of the host-route pins; low enough to sit below normal unicast
/// routes so the pins never attract real traffic.
const PIN_SCOPE: u32 = 10;

/// Well-known public resolvers handed out in order to uplinks without an
/// explicit check target. Never reused: two pins sharing a /32 would let
/// one uplink's probe ride another's route, so running out is an error.
const DEFAULT_CHECK_TARGETS: [Ipv4Addr; 4] = [
    Ipv4Addr::new(8, 8, 8, 8),
    Ipv4Addr::new(1, 1, 1, 1),
    Ipv4Addr::new(9, 9, 9, 9),
    Ipv4Addr::new(208, 67, 222, 222),
];

/// Options for the failover composer.
#[derive(Debug, Clone)]
pub struct FailoverOptions {
    pub(crate) check_interval_secs: u32,
    pub(crate) script_name: String,
}

impl Default for FailoverOptions {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            script_name: "wan-failover".to_string(),
        }
    }
}

impl FailoverOptions {
    /// Options with a 30 second check interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduler interval in seconds.
    pub fn with_check_interval_secs(mut self, secs: u32) -> Self {
        self.check_interval_secs = secs;
        self
    }

    /// Set the monitoring script name (the scheduler entry is named
    /// `<script>-check`).
    pub fn with_script_name(mut self, name: &str) -> Self {
        self.script_name = name.to_string();
        self
    }
}

/// Compose priority-ordered failover with a self-healing health check.
///
/// Uplinks are stable-sorted ascending by priority; the uplink at sorted
/// position p gets distance (p+1) × 10, so equal priorities keep their
/// input order. An empty uplink list still yields a syntactically valid,
/// functionally empty script. Uplinks without an explicit check target
/// draw from [`DEFAULT_CHECK_TARGETS`]; more such uplinks than defaults
/// is an error, since every probe target must pin to exactly one gateway.
pub fn failover(uplinks: &[Uplink], options: &FailoverOptions) -> Result<Document> {
    let mut sorted: Vec<&Uplink> = uplinks.iter().collect();
    sorted.sort_by_key(|uplink| uplink.priority());

    let mut defaults = DEFAULT_CHECK_TARGETS.iter();
    let targets: Vec<IpAddr> = sorted
        .iter()
        .map(|uplink| match uplink.check_target() {
            Some(target) => Ok(target),
            None => defaults
                .next()
                .map(|resolver| IpAddr::V4(*resolver))
                .ok_or(Error::CheckTargetsExhausted {
                    available: DEFAULT_CHECK_TARGETS.len(),
                }),
        })
        .collect::<Result<_>>()?;

    let mut doc = Document::new();

    for (position, (uplink, target)) in sorted.iter().zip(&targets).enumerate() {
        let distance = (position as u32 + 1) * 10;
        doc.push(
            Section::Route,
            Statement::add()
                .arg("dst-address", "0.0.0.0/0")
                .arg("gateway", uplink.gateway())
                .arg("distance", distance)
                .arg("check-gateway", "ping")
                .arg_opt("routing-mark", uplink.table())
                .quoted_opt("comment", uplink.comment()),
        );
        // Pin the probe target to this uplink's gateway so the check
        // does not ride the default route it is meant to verify.
        doc.push(
            Section::Route,
            Statement::add()
                .arg("dst-address", format!("{target}/32"))
                .arg("gateway", uplink.gateway())
                .arg("scope", PIN_SCOPE)
                .quoted("comment", format!("health check via {}", uplink.interface())),
        );
    }

    doc.push(
        Section::Script,
        Statement::add()
            .quoted("name", options.script_name.as_str())
            .quoted("source", monitor_script(&sorted, &targets)),
    );
    doc.push(
        Section::Scheduler,
        Statement::add()
            .quoted("name", format!("{}-check", options.script_name))
            .arg("interval", interval(options.check_interval_secs))
            .quoted("on-event", options.script_name.as_str()),
    );

    Ok(doc)
}

/// Render a scheduler interval as `HH:MM:SS`.
fn interval(secs: u32) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// Build the monitoring script body.
///
/// Gateway and target addresses are baked in as literals at generation
/// time; route state (`disabled`) is read through `$` variables at the
/// device's own execution time, which is the one intentional departure
/// from byte-for-byte static output.
fn monitor_script(sorted: &[&Uplink], targets: &[IpAddr]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (index, (uplink, target)) in sorted.iter().zip(targets).enumerate() {
        let n = index + 1;
        lines.push(format!(":local gw{n} \"{}\"", uplink.gateway()));
        lines.push(format!(":local target{n} \"{target}\""));
    }
    for index in 0..sorted.len() {
        let n = index + 1;
        lines.push(format!(
            ":local up{n} ([/ping $target{n} count={PING_COUNT}] > 0)"
        ));
    }
    for index in 0..sorted.len() {
        let n = index + 1;
        lines.push(format!(
            ":foreach r in=[/ip route find dst-address=\"0.0.0.0/0\" gateway=$gw{n}] do={{"
        ));
        lines.push(format!(
            "    :if (!$up{n} && ![/ip route get $r disabled]) do={{"
        ));
        lines.push("        /ip route disable $r".to_string());
        lines.push(format!(
            "        :log warning (\"wan-failover: gateway \" . $gw{n} . \" lost, route disabled\")"
        ));
        lines.push("    }".to_string());
        lines.push(format!(
            "    :if ($up{n} && [/ip route get $r disabled]) do={{"
        ));
        lines.push("        /ip route enable $r".to_string());
        lines.push(format!(
            "        :log info (\"wan-failover: gateway \" . $gw{n} . \" recovered, route enabled\")"
        ));
        lines.push("    }".to_string());
        lines.push("}".to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uplink(interface: &str, gateway: &str, priority: u32) -> Uplink {
        Uplink::new(interface, gateway.parse().unwrap()).with_priority(priority)
    }

    #[test]
    fn test_distance_follows_priority_not_input_order() {
        let links = vec![
            uplink("ether3", "10.0.3.1", 3),
            uplink("ether1", "10.0.1.1", 1),
            uplink("ether2", "10.0.2.1", 2),
        ];
        let doc = failover(&links, &FailoverOptions::default()).unwrap();
        let defaults: Vec<&String> = doc
            .statements(Section::Route)
            .iter()
            .filter(|s| s.contains("dst-address=0.0.0.0/0"))
            .collect();
        assert!(defaults[0].contains("gateway=10.0.1.1") && defaults[0].contains("distance=10"));
        assert!(defaults[1].contains("gateway=10.0.2.1") && defaults[1].contains("distance=20"));
        assert!(defaults[2].contains("gateway=10.0.3.1") && defaults[2].contains("distance=30"));
    }

    #[test]
    fn test_stable_sort_keeps_input_order_on_ties() {
        let links = vec![
            uplink("ether1", "10.0.1.1", 1),
            uplink("ether2", "10.0.2.1", 1),
        ];
        let doc = failover(&links, &FailoverOptions::default()).unwrap();
        let defaults: Vec<&String> = doc
            .statements(Section::Route)
            .iter()
            .filter(|s| s.contains("dst-address=0.0.0.0/0"))
            .collect();
        assert!(defaults[0].contains("gateway=10.0.1.1"));
        assert!(defaults[1].contains("gateway=10.0.2.1"));
    }

    #[test]
    fn test_host_route_pins() {
        let links = vec![uplink("ether1", "10.0.1.1", 1)
            .with_check_target("8.8.4.4".parse().unwrap())];
        let doc = failover(&links, &FailoverOptions::default()).unwrap();
        let routes = doc.statements(Section::Route);
        assert!(routes[1].contains("dst-address=8.8.4.4/32"));
        assert!(routes[1].contains("gateway=10.0.1.1"));
        assert!(routes[1].contains("scope=10"));
    }

    #[test]
    fn test_default_targets_are_distinct() {
        let links = vec![
            uplink("ether1", "10.0.1.1", 1),
            uplink("ether2", "10.0.2.1", 2),
        ];
        let doc = failover(&links, &FailoverOptions::default()).unwrap();
        let routes = doc.statements(Section::Route);
        assert!(routes[1].contains("dst-address=8.8.8.8/32"));
        assert!(routes[3].contains("dst-address=1.1.1.1/32"));
    }

    #[test]
    fn test_fifth_defaulted_uplink_is_rejected() {
        let links: Vec<Uplink> = (1..=5)
            .map(|n| uplink(&format!("ether{n}"), &format!("10.0.{n}.1"), n))
            .collect();
        let err = failover(&links, &FailoverOptions::default()).unwrap_err();
        assert!(matches!(err, Error::CheckTargetsExhausted { available: 4 }));
    }

    #[test]
    fn test_explicit_targets_do_not_consume_default_slots() {
        let mut links: Vec<Uplink> = (1..=5)
            .map(|n| uplink(&format!("ether{n}"), &format!("10.0.{n}.1"), n))
            .collect();
        links[0] = links[0].clone().with_check_target("203.0.113.9".parse().unwrap());
        let doc = failover(&links, &FailoverOptions::default()).unwrap();

        let pins: Vec<&String> = doc
            .statements(Section::Route)
            .iter()
            .filter(|s| s.contains("/32"))
            .collect();
        assert_eq!(pins.len(), 5);
        assert!(pins[0].contains("dst-address=203.0.113.9/32"));
        assert!(pins[1].contains("dst-address=8.8.8.8/32"));
        assert!(pins[4].contains("dst-address=208.67.222.222/32"));
        // Every pinned /32 is distinct.
        let mut targets: Vec<&str> = pins
            .iter()
            .map(|pin| {
                pin.split("dst-address=")
                    .nth(1)
                    .and_then(|rest| rest.split(' ').next())
                    .unwrap()
            })
            .collect();
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(targets.len(), 5);
    }

    #[test]
    fn test_script_and_scheduler_emitted() {
        let links = vec![uplink("ether1", "10.0.1.1", 1)];
        let options = FailoverOptions::default().with_check_interval_secs(90);
        let doc = failover(&links, &options).unwrap();

        let script = &doc.statements(Section::Script)[0];
        assert!(script.starts_with("add name=\"wan-failover\" source=\""));
        assert!(script.contains(":local gw1 \\\"10.0.1.1\\\""));
        assert!(script.contains("count=3"));
        // Interior newlines render as trailing-backslash continuations.
        assert!(script.contains("\\\n    "));

        let scheduler = &doc.statements(Section::Scheduler)[0];
        assert!(scheduler.contains("name=\"wan-failover-check\""));
        assert!(scheduler.contains("interval=00:01:30"));
        assert!(scheduler.contains("on-event=\"wan-failover\""));
    }

    #[test]
    fn test_empty_uplinks_yield_valid_empty_script() {
        let doc = failover(&[], &FailoverOptions::default()).unwrap();
        assert!(doc.statements(Section::Route).is_empty());
        assert_eq!(doc.statements(Section::Script).len(), 1);
        assert_eq!(doc.statements(Section::Scheduler).len(), 1);
        assert_eq!(
            doc.statements(Section::Script)[0],
            "add name=\"wan-failover\" source=\"\""
        );
    }

    #[test]
    fn test_interval_rendering() {
        assert_eq!(interval(30), "00:00:30");
        assert_eq!(interval(90), "00:01:30");
        assert_eq!(interval(3600), "01:00:00");
        assert_eq!(interval(3725), "01:02:05");
    }
}
