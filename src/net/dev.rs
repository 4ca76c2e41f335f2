//! Embedded network backed by the in-memory chain.

use crate::chain::Chain;
use crate::error::OrchestratorError;
use crate::net::Network;
use crate::types::{Address, Bytes};
use crate::wire::{TxReceipt, TxRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct FaultPlan {
    /// Upcoming `send_transaction` calls that fail with a transient error.
    failing_sends: u32,
    /// When armed, the next successful send hides its transaction-count
    /// increment from this many subsequent polls.
    defer_nonce_polls: u32,
    /// Sender -> (stale visible count, polls remaining).
    stale_counts: HashMap<Address, (u64, u32)>,
}

/// In-process [`Network`] implementation around a shared [`Chain`].
///
/// Clones share the same underlying chain. Fault injection covers the two
/// transient conditions the execution driver must tolerate: dropped
/// submissions and transaction counts that lag behind inclusion.
#[derive(Clone)]
pub struct DevNetwork {
    chain: Arc<Mutex<Chain>>,
    faults: Arc<Mutex<FaultPlan>>,
    chain_id: u64,
}

impl DevNetwork {
    pub fn new(chain: Chain) -> Self {
        let chain_id = chain.chain_id();
        Self {
            chain: Arc::new(Mutex::new(chain)),
            faults: Arc::new(Mutex::new(FaultPlan::default())),
            chain_id,
        }
    }

    /// Run a closure against the underlying chain. Used by tests and the
    /// rehearsal sandbox to seed and inspect state directly.
    pub fn with_chain<R>(&self, f: impl FnOnce(&mut Chain) -> R) -> R {
        f(&mut self.chain.lock())
    }

    /// Make the next `count` submissions fail with a transient network error.
    pub fn inject_send_failures(&self, count: u32) {
        self.faults.lock().failing_sends = count;
    }

    /// Make the transaction-count increase of the next successful submission
    /// invisible for `polls` subsequent reads.
    pub fn defer_nonce_visibility(&self, polls: u32) {
        self.faults.lock().defer_nonce_polls = polls;
    }
}

#[async_trait]
impl Network for DevNetwork {
    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, OrchestratorError> {
        {
            let mut faults = self.faults.lock();
            if faults.failing_sends > 0 {
                faults.failing_sends -= 1;
                return Err(OrchestratorError::Network(
                    "connection reset during submission".into(),
                ));
            }
        }
        let mut chain = self.chain.lock();
        let before = chain.transaction_count(tx.from);
        let receipt = chain.execute(&tx)?;
        let mut faults = self.faults.lock();
        if faults.defer_nonce_polls > 0 {
            let polls = faults.defer_nonce_polls;
            faults.defer_nonce_polls = 0;
            faults.stale_counts.insert(tx.from, (before, polls));
        }
        Ok(receipt)
    }

    async fn call(&self, to: Address, data: &[u8]) -> Result<Bytes, OrchestratorError> {
        let query = crate::wire::Query::decode(data)?;
        let response = self.chain.lock().query(to, &query)?;
        Ok(response.encode())
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, OrchestratorError> {
        Ok(self.chain.lock().code_at(address))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, OrchestratorError> {
        let mut faults = self.faults.lock();
        if let Some((stale, polls)) = faults.stale_counts.get_mut(&address) {
            if *polls > 0 {
                *polls -= 1;
                return Ok(*stale);
            }
            faults.stale_counts.remove(&address);
        }
        drop(faults);
        Ok(self.chain.lock().transaction_count(address))
    }

    async fn get_balance(&self, address: Address) -> Result<u128, OrchestratorError> {
        Ok(self.chain.lock().balance_of(address))
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
