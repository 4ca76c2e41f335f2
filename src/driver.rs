//! Execution driver: the single path for every mutating call.
//!
//! Wraps submission with bounded retry and linear backoff on transient
//! failures, then polls until the sender's on-chain transaction count has
//! moved past its pre-submission value. A lagging transaction count is a
//! retryable "still pending" condition and is never conflated with
//! application failure; application failures (ledger reverts) surface
//! immediately. Because every caller funnels through [`ExecutionDriver::submit`],
//! at most one mutating operation per signer is ever in flight, which keeps
//! the signer's account nonce serialized.

use crate::error::OrchestratorError;
use crate::net::Network;
use crate::wire::{TxReceipt, TxRequest};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ExecutionDriver<'a> {
    network: &'a dyn Network,
    max_attempts: u32,
    base_delay: Duration,
}

impl<'a> ExecutionDriver<'a> {
    pub fn new(network: &'a dyn Network) -> Self {
        Self {
            network,
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Override the retry policy; tests use millisecond backoff.
    pub fn with_policy(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    pub fn network(&self) -> &'a dyn Network {
        self.network
    }

    /// Submit a transaction and wait for it to be reflected in the sender's
    /// transaction count.
    pub async fn submit(&self, tx: TxRequest) -> Result<TxReceipt, OrchestratorError> {
        let from = tx.from;
        let before = self.network.get_transaction_count(from).await?;

        let receipt = self
            .retry(|| self.network.send_transaction(tx.clone()))
            .await?;

        let network = self.network;
        self.retry(move || async move {
            let count = network.get_transaction_count(from).await?;
            if count <= before {
                return Err(OrchestratorError::NoncePending(from));
            }
            Ok(())
        })
        .await?;

        debug!(sender = %from, "transaction confirmed");
        Ok(receipt)
    }

    /// Run an operation with bounded retry and linear backoff. Only transient
    /// errors are retried; anything else aborts on first occurrence.
    pub async fn retry<T, F, Fut>(&self, mut operation: F) -> Result<T, OrchestratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempts >= self.max_attempts => {
                    return Err(OrchestratorError::RetryExhausted {
                        attempts,
                        last_error: e.to_string(),
                    })
                }
                Err(e) => {
                    warn!(
                        attempt = attempts,
                        max = self.max_attempts,
                        "retrying after transient failure: {e}"
                    );
                    tokio::time::sleep(self.base_delay * attempts).await;
                }
            }
        }
    }
}
