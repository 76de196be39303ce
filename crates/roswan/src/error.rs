//! Error types for configuration compilation.

use std::io;

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a configuration.
///
/// Optional statement fields (comments, routing-table names, check
/// targets) default silently and never error. The failure classes here
/// are unrecognized enum values at the string boundary and arithmetic
/// preconditions that would otherwise corrupt emitted syntax.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unrecognized per-connection-classifier kind.
    #[error(
        "unrecognized per-connection-classifier: {value} (expected one of \
         src-address, dst-address, both-addresses, src-address-and-port, \
         dst-address-and-port, both-addresses-and-ports)"
    )]
    UnknownClassifier {
        /// The value that failed to parse.
        value: String,
    },

    /// Unrecognized bonding mode.
    #[error(
        "unrecognized bonding mode: {value} (expected one of balance-rr, \
         active-backup, balance-xor, broadcast, 802.3ad, balance-tlb, balance-alb)"
    )]
    UnknownBondMode {
        /// The value that failed to parse.
        value: String,
    },

    /// Unrecognized LACP rate.
    #[error("unrecognized lacp-rate: {value} (expected 30secs or 1sec)")]
    UnknownLacpRate {
        /// The value that failed to parse.
        value: String,
    },

    /// Unrecognized transmit hash policy.
    #[error(
        "unrecognized transmit-hash-policy: {value} (expected one of \
         layer-2, layer-2-and-3, layer-3-and-4)"
    )]
    UnknownHashPolicy {
        /// The value that failed to parse.
        value: String,
    },

    /// Unrecognized check-gateway mode.
    #[error("unrecognized check-gateway mode: {value} (expected ping, arp or none)")]
    UnknownCheckMode {
        /// The value that failed to parse.
        value: String,
    },

    /// Unrecognized IP protocol for service pinning.
    #[error("unrecognized protocol: {value} (expected tcp or udp)")]
    UnknownProtocol {
        /// The value that failed to parse.
        value: String,
    },

    /// Unrecognized strategy tag.
    #[error(
        "unrecognized strategy: {value} (expected one of pcc, pcc-weighted, \
         nth, ecmp, bonding, failover, pcc-failover, ecmp-failover)"
    )]
    UnknownStrategy {
        /// The value that failed to parse.
        value: String,
    },

    /// The weight list was empty.
    #[error("weight list is empty")]
    EmptyWeights,

    /// Every weight in the list was zero.
    #[error("all weights are zero; ratio reduction is undefined")]
    AllZeroWeights,

    /// The composer requires at least one uplink.
    #[error("at least one uplink is required")]
    NoUplinks,

    /// Bonding requires at least one member interface.
    #[error("bonding requires at least one member interface")]
    NoBondMembers,

    /// More uplinks without an explicit check target than built-in
    /// default targets. Reusing a target would pin the same /32 to two
    /// gateways and mask one uplink's failure.
    #[error(
        "more uplinks without a check target than the {available} built-in \
         defaults; set check_target on the extras"
    )]
    CheckTargetsExhausted {
        /// Number of distinct built-in default targets.
        available: usize,
    },

    /// Explicit nth counters did not match the uplink count.
    #[error("nth counter list has {actual} entries but there are {expected} uplinks")]
    NthCounterMismatch {
        /// Number of uplinks being partitioned.
        expected: usize,
        /// Number of counters supplied.
        actual: usize,
    },

    /// A profile file could not be interpreted.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// I/O error while reading a profile or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[cfg(feature = "output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
