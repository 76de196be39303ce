//! Multi-WAN configuration compiler for RouterOS devices.
//!
//! This crate turns a declarative description of WAN uplinks and a chosen
//! traffic-distribution strategy into the exact configuration statements a
//! router's command interpreter accepts: per-connection classification
//! (equal and weighted), nth-packet rotation, equal-cost multi-path, link
//! bonding, and priority-ordered failover with a self-healing health-check
//! script.
//!
//! The compiler is a pure, synchronous transform: no sockets, no device
//! state, no clock. Identical inputs produce byte-identical output, so
//! generated artifacts can be diffed across runs and pasted into a device
//! unmodified.
//!
//! # Example
//!
//! ```
//! use roswan::compose::{FailoverOptions, PccOptions};
//! use roswan::{Strategy, Uplink, compile};
//!
//! let uplinks = vec![
//!     Uplink::new("ether1", "192.168.1.1".parse().unwrap()).with_priority(1),
//!     Uplink::new("ether2", "10.7.0.1".parse().unwrap()).with_priority(2),
//! ];
//! let doc = compile(
//!     &uplinks,
//!     &Strategy::PccWithFailover(PccOptions::default(), FailoverOptions::default()),
//! )
//! .unwrap();
//! print!("{}", doc.to_script());
//! ```
//!
//! # Features
//!
//! - `output` - JSON rendering of compiled documents

pub mod compose;
pub mod document;
pub mod error;
pub mod model;
pub mod statement;
pub mod weights;

// Re-export common types at crate root for convenience
pub use compose::{Strategy, StrategyKind, compile};
pub use document::{Document, Section};
pub use error::{Error, Result};
pub use model::{CheckGateway, NthCounter, PccClassifier, Uplink};
pub use statement::{Statement, Verb};
