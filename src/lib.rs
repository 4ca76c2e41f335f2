//! Capstan: auditable upgrade orchestration for fleets of proxied contracts.
//!
//! A single authoritative on-chain ledger tracks adopted proxies, abstract
//! contracts and staged changes; the off-chain layers reconcile declared
//! configuration against it, stage proposals idempotently, and apply them in
//! one nonce-guarded atomic batch, with quorum signature collection when the
//! ledger is owned by a threshold multisignature authority.

pub mod artifacts;
pub mod chain;
pub mod cli;
pub mod deployer;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod manifest;
pub mod net;
pub mod ops;
pub mod propose;
pub mod quorum;
pub mod reconcile;
pub mod signer;
pub mod store;
pub mod types;
pub mod wire;
