//! Connection-partitioning composers: PCC (equal and weighted) and NTH.
//!
//! All three emit the same four-stage mangle pattern for N uplinks:
//!
//! 1. `chain=input`: tag connections entering on each WAN interface;
//! 2. `chain=output`: route this router's replies back out the WAN the
//!    connection arrived on;
//! 3. `chain=prerouting`: partition new LAN connections across the WANs
//!    with the strategy's primitive (a classifier fraction, one discrete
//!    bucket per weight unit, or an `nth` counter pair);
//! 4. `chain=prerouting`: bind the tagged connections to their routing
//!    tables;
//!
//! followed by one default route per uplink in its own table at distance 1.
//! Only stage 3 differs between the strategies.

use crate::document::{Document, Section};
use crate::error::{Error, Result};
use crate::model::{NthCounter, PccClassifier, Uplink};
use crate::statement::Statement;
use crate::weights;

use super::{connection_mark, table_name};

/// Options for the PCC composers.
#[derive(Debug, Clone)]
pub struct PccOptions {
    pub(crate) classifier: PccClassifier,
    pub(crate) lan_interface: String,
}

impl Default for PccOptions {
    fn default() -> Self {
        Self {
            classifier: PccClassifier::default(),
            lan_interface: "bridge".to_string(),
        }
    }
}

impl PccOptions {
    /// Options with the default classifier and LAN interface (`bridge`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the classifier field combination.
    pub fn with_classifier(mut self, classifier: PccClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the LAN-side interface whose traffic is partitioned.
    pub fn with_lan_interface(mut self, interface: &str) -> Self {
        self.lan_interface = interface.to_string();
        self
    }
}

/// Options for the NTH composer.
#[derive(Debug, Clone)]
pub struct NthOptions {
    pub(crate) lan_interface: String,
    pub(crate) counters: Vec<NthCounter>,
}

impl Default for NthOptions {
    fn default() -> Self {
        Self {
            lan_interface: "bridge".to_string(),
            counters: Vec::new(),
        }
    }
}

impl NthOptions {
    /// Options with generated counters and the default LAN interface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LAN-side interface whose traffic is partitioned.
    pub fn with_lan_interface(mut self, interface: &str) -> Self {
        self.lan_interface = interface.to_string();
        self
    }

    /// Supply explicit per-uplink `(every, packet)` counters instead of
    /// the generated `(N, position+1)` defaults.
    pub fn with_counters(mut self, counters: Vec<NthCounter>) -> Self {
        self.counters = counters;
        self
    }
}

/// Stage-3 partitioning primitive.
enum Partitioner<'a> {
    PccEqual(PccClassifier),
    PccWeighted {
        classifier: PccClassifier,
        ratios: &'a [u32],
    },
    Nth(&'a [NthCounter]),
}

/// Compose equal-share PCC load balancing.
///
/// Emits exactly 4N mangle rules plus N routes for N uplinks.
pub fn pcc(uplinks: &[Uplink], options: &PccOptions) -> Result<Document> {
    compose(
        uplinks,
        &options.lan_interface,
        &Partitioner::PccEqual(options.classifier),
    )
}

/// Compose weighted PCC load balancing.
///
/// Uplink weights are reduced to their smallest integer ratio; stage 3
/// then emits one classifier rule per discrete weight unit, so the
/// partition rule count equals the reduced weight sum and uplink *k*'s
/// buckets form a contiguous range of the total index space.
pub fn pcc_weighted(uplinks: &[Uplink], options: &PccOptions) -> Result<Document> {
    let raw: Vec<u32> = uplinks.iter().map(|u| u.weight()).collect();
    let ratios = weights::normalize(&raw)?;
    compose(
        uplinks,
        &options.lan_interface,
        &Partitioner::PccWeighted {
            classifier: options.classifier,
            ratios: &ratios,
        },
    )
}

/// Compose nth-packet round-robin distribution.
///
/// Counters default to `(N, position+1)`; explicit counters must match
/// the uplink count.
pub fn nth(uplinks: &[Uplink], options: &NthOptions) -> Result<Document> {
    let counters: Vec<NthCounter> = if options.counters.is_empty() {
        (0..uplinks.len())
            .map(|i| NthCounter::new(uplinks.len() as u32, i as u32 + 1))
            .collect()
    } else if options.counters.len() == uplinks.len() {
        options.counters.clone()
    } else {
        return Err(Error::NthCounterMismatch {
            expected: uplinks.len(),
            actual: options.counters.len(),
        });
    };
    compose(uplinks, &options.lan_interface, &Partitioner::Nth(&counters))
}

fn compose(
    uplinks: &[Uplink],
    lan_interface: &str,
    partitioner: &Partitioner<'_>,
) -> Result<Document> {
    if uplinks.is_empty() {
        return Err(Error::NoUplinks);
    }

    let tables: Vec<String> = uplinks
        .iter()
        .enumerate()
        .map(|(position, uplink)| table_name(uplink, position))
        .collect();
    let marks: Vec<String> = tables.iter().map(|table| connection_mark(table)).collect();

    let mut doc = Document::new();

    // Stage 1: tag connections entering on each WAN.
    for (uplink, mark) in uplinks.iter().zip(&marks) {
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "input")
                .arg("in-interface", uplink.interface())
                .arg("action", "mark-connection")
                .arg("new-connection-mark", mark),
        );
    }

    // Stage 2: replies from this router leave via the arrival WAN.
    for (table, mark) in tables.iter().zip(&marks) {
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "output")
                .arg("connection-mark", mark)
                .arg("action", "mark-routing")
                .arg("new-routing-mark", table),
        );
    }

    // Stage 3: partition new LAN connections across the WANs.
    match partitioner {
        Partitioner::PccEqual(classifier) => {
            let total = uplinks.len();
            for (index, mark) in marks.iter().enumerate() {
                doc.push(
                    Section::Mangle,
                    partition_rule(
                        lan_interface,
                        "per-connection-classifier",
                        format!("{}:{}/{}", classifier.as_str(), total, index),
                        mark,
                    ),
                );
            }
        }
        Partitioner::PccWeighted { classifier, ratios } => {
            let total: u32 = ratios.iter().sum();
            let mut bucket = 0u32;
            for (ratio, mark) in ratios.iter().zip(&marks) {
                for _ in 0..*ratio {
                    doc.push(
                        Section::Mangle,
                        partition_rule(
                            lan_interface,
                            "per-connection-classifier",
                            format!("{}:{}/{}", classifier.as_str(), total, bucket),
                            mark,
                        ),
                    );
                    bucket += 1;
                }
            }
        }
        Partitioner::Nth(counters) => {
            for (counter, mark) in counters.iter().zip(&marks) {
                doc.push(
                    Section::Mangle,
                    partition_rule(
                        lan_interface,
                        "nth",
                        format!("{},{}", counter.every, counter.packet),
                        mark,
                    ),
                );
            }
        }
    }

    // Stage 4: bind tagged connections to their routing tables.
    for (table, mark) in tables.iter().zip(&marks) {
        doc.push(
            Section::Mangle,
            Statement::add()
                .arg("chain", "prerouting")
                .arg("in-interface", lan_interface)
                .arg("connection-mark", mark)
                .arg("action", "mark-routing")
                .arg("new-routing-mark", table)
                .arg("passthrough", "no"),
        );
    }

    // One default route per WAN in its own table.
    for (uplink, table) in uplinks.iter().zip(&tables) {
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

    Ok(doc)
}

/// A stage-3 rule: match new, non-local traffic coming in from the LAN,
/// apply the strategy's partitioning matcher, and tag the connection.
fn partition_rule(
    lan_interface: &str,
    matcher_key: &'static str,
    matcher_value: String,
    mark: &str,
) -> Statement {
    Statement::add()
        .arg("chain", "prerouting")
        .arg("in-interface", lan_interface)
        .arg("connection-state", "new")
        .arg("dst-address-type", "!local")
        .arg(matcher_key, matcher_value)
        .arg("action", "mark-connection")
        .arg("new-connection-mark", mark)
        .arg("passthrough", "yes")
}
