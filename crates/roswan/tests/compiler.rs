//! End-to-end properties of the configuration compiler.
//!
//! These tests exercise the public dispatcher the way the surrounding
//! tooling does: plain uplink data in, a merged section-keyed document
//! out, with output text treated as the contract.

use roswan::compose::{
    BondMode, BondOptions, EcmpGateway, EcmpOptions, FailoverOptions, NthOptions, PccOptions,
    ecmp,
};
use roswan::{Document, Section, Strategy, Uplink, compile};

fn uplinks(n: usize) -> Vec<Uplink> {
    (0..n)
        .map(|i| {
            Uplink::new(
                &format!("ether{}", i + 1),
                format!("10.0.{}.1", i + 1).parse().unwrap(),
            )
            .with_priority(i as u32 + 1)
        })
        .collect()
}

#[test]
fn equal_pcc_emits_4n_rules_and_n_routes() {
    for n in 1..=6 {
        let doc = compile(&uplinks(n), &Strategy::PccEqual(PccOptions::default())).unwrap();
        assert_eq!(doc.statements(Section::Mangle).len(), 4 * n, "N = {n}");
        assert_eq!(doc.statements(Section::Route).len(), n, "N = {n}");
    }
}

#[test]
fn weighted_pcc_buckets_reconstruct_the_index_space() {
    let links = vec![
        Uplink::new("ether1", "10.0.1.1".parse().unwrap()).with_weight(100),
        Uplink::new("ether2", "10.0.2.1".parse().unwrap()).with_weight(50),
        Uplink::new("ether3", "10.0.3.1".parse().unwrap()).with_weight(25),
    ];
    let doc = compile(&links, &Strategy::PccWeighted(PccOptions::default())).unwrap();

    // Pull the (total, bucket, mark) triples back out of the emitted text.
    let mut buckets: Vec<(u32, String)> = Vec::new();
    let mut total = 0;
    for stmt in doc.statements(Section::Mangle) {
        let Some(rest) = stmt
            .split("per-connection-classifier=")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
        else {
            continue;
        };
        let fraction = rest.split(':').nth(1).unwrap();
        let (denominator, index) = fraction.split_once('/').unwrap();
        total = denominator.parse().unwrap();
        let mark = stmt
            .split("new-connection-mark=")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        buckets.push((index.parse().unwrap(), mark.to_string()));
    }

    // Rule count equals the reduced weight sum (4 + 2 + 1).
    assert_eq!(total, 7);
    assert_eq!(buckets.len(), 7);
    // Contiguous, non-overlapping, and grouped per interface in order.
    for (expected, (bucket, _)) in buckets.iter().enumerate() {
        assert_eq!(*bucket as usize, expected);
    }
    let marks: Vec<&str> = buckets.iter().map(|(_, mark)| mark.as_str()).collect();
    assert_eq!(
        marks,
        [
            "wan1_conn",
            "wan1_conn",
            "wan1_conn",
            "wan1_conn",
            "wan2_conn",
            "wan2_conn",
            "wan3_conn"
        ]
    );
}

#[test]
fn failover_orders_by_priority_not_input_position() {
    let links = vec![
        Uplink::new("ether1", "10.0.1.1".parse().unwrap()).with_priority(3),
        Uplink::new("ether2", "10.0.2.1".parse().unwrap()).with_priority(1),
        Uplink::new("ether3", "10.0.3.1".parse().unwrap()).with_priority(2),
    ];
    let doc = compile(&links, &Strategy::Failover(FailoverOptions::default())).unwrap();
    let defaults: Vec<&String> = doc
        .statements(Section::Route)
        .iter()
        .filter(|s| s.contains("dst-address=0.0.0.0/0"))
        .collect();

    assert_eq!(defaults.len(), 3);
    assert!(defaults[0].contains("gateway=10.0.2.1") && defaults[0].contains("distance=10"));
    assert!(defaults[1].contains("gateway=10.0.3.1") && defaults[1].contains("distance=20"));
    assert!(defaults[2].contains("gateway=10.0.1.1") && defaults[2].contains("distance=30"));
}

#[test]
fn ecmp_flattens_weights_by_repetition() {
    let gateways = vec![
        EcmpGateway::new("10.0.1.1".parse().unwrap()).with_weight(2),
        EcmpGateway::new("10.0.2.1".parse().unwrap()),
    ];
    let doc = ecmp(&gateways, &EcmpOptions::default()).unwrap();
    assert!(
        doc.statements(Section::Route)[0].contains("gateway=10.0.1.1,10.0.1.1,10.0.2.1")
    );
}

#[test]
fn bonding_mode_gates_optional_parameters() {
    let backup = compile(
        &[],
        &Strategy::Bonding(
            BondOptions::new(&["ether1", "ether2"]).with_mode(BondMode::ActiveBackup),
        ),
    )
    .unwrap();
    assert!(!backup.statements(Section::Bonding)[0].contains("primary"));

    let lacp = compile(
        &[],
        &Strategy::Bonding(
            BondOptions::new(&["ether1", "ether2"]).with_mode(BondMode::Ieee802_3ad),
        ),
    )
    .unwrap();
    assert!(lacp.statements(Section::Bonding)[0].contains("lacp-rate=30secs"));
}

#[test]
fn compilation_is_idempotent_for_every_strategy() {
    let links = uplinks(3);
    let strategies = [
        Strategy::PccEqual(PccOptions::default()),
        Strategy::PccWeighted(PccOptions::default()),
        Strategy::Nth(NthOptions::default()),
        Strategy::Ecmp(EcmpOptions::default()),
        Strategy::Bonding(BondOptions::new(&["ether1", "ether2"])),
        Strategy::Failover(FailoverOptions::default()),
        Strategy::PccWithFailover(PccOptions::default(), FailoverOptions::default()),
        Strategy::EcmpWithFailover(EcmpOptions::default(), FailoverOptions::default()),
    ];
    for strategy in &strategies {
        let first = compile(&links, strategy).unwrap();
        let second = compile(&links, strategy).unwrap();
        assert_eq!(
            first.to_script(),
            second.to_script(),
            "strategy {}",
            strategy.kind()
        );
    }
}

#[test]
fn merge_preserves_call_order_per_section() {
    let links = uplinks(2);
    let pcc_doc = compile(&links, &Strategy::PccEqual(PccOptions::default())).unwrap();
    let failover_doc = compile(&links, &Strategy::Failover(FailoverOptions::default())).unwrap();

    let merged = Document::assemble([pcc_doc.clone(), failover_doc.clone()]);
    let expected: Vec<String> = pcc_doc
        .statements(Section::Route)
        .iter()
        .chain(failover_doc.statements(Section::Route))
        .cloned()
        .collect();
    assert_eq!(merged.statements(Section::Route), expected.as_slice());
}

#[test]
fn export_groups_statements_under_section_paths() {
    let doc = compile(
        &uplinks(2),
        &Strategy::PccWithFailover(PccOptions::default(), FailoverOptions::default()),
    )
    .unwrap();
    let script = doc.to_script();

    let mangle_at = script.find("/ip firewall mangle").unwrap();
    let route_at = script.find("/ip route").unwrap();
    let script_at = script.find("/system script").unwrap();
    let scheduler_at = script.find("/system scheduler").unwrap();
    assert!(mangle_at < route_at && route_at < script_at && script_at < scheduler_at);

    // Every line is a section path, a statement, a continuation, or blank.
    for line in script.lines() {
        assert!(
            line.is_empty()
                || line.starts_with('/')
                || line.starts_with("add ")
                || line.starts_with("    "),
            "unexpected line: {line:?}"
        );
    }
}
