//! Network seam between the orchestration layer and a chain.
//!
//! The orchestrator only ever talks to a [`Network`]: send a transaction, make
//! a read call, fetch code, fetch a sender's transaction count, fetch a
//! balance. [`DevNetwork`] is the embedded implementation backed by the
//! in-memory chain; production backends implement the same trait out of tree.

use crate::error::OrchestratorError;
use crate::types::{Address, Bytes};
use crate::wire::{TxReceipt, TxRequest};
use async_trait::async_trait;

mod client;
mod dev;

pub use client::{AbstractProposalView, AdoptedContractView, LedgerClient};
pub use dev::DevNetwork;

/// Minimal chain access used by every off-chain component.
#[async_trait]
pub trait Network: Send + Sync {
    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, OrchestratorError>;

    async fn call(&self, to: Address, data: &[u8]) -> Result<Bytes, OrchestratorError>;

    async fn get_code(&self, address: Address) -> Result<Bytes, OrchestratorError>;

    async fn get_transaction_count(&self, address: Address) -> Result<u64, OrchestratorError>;

    async fn get_balance(&self, address: Address) -> Result<u128, OrchestratorError>;

    fn chain_id(&self) -> u64;
}
