//! Quorum authorization for owner-gated calls.
//!
//! When the ledger's owner is a threshold multisignature contract rather than
//! a single key, owner-gated calls are routed here: compute the call's
//! domain-separated digest, sign it locally, merge with signatures collected
//! by other parties, and either submit the aggregated transaction (once the
//! threshold is met) or hand the accumulated set back for out-of-band relay.
//!
//! The protocol is stateless between invocations. A partial signature set is
//! serialized with [`encode_signatures`], relayed to the next signer, and fed
//! back in as prior signatures.
//!
//! The digest is scoped by the multisig's own transaction nonce, so any
//! collected set is invalidated as soon as one owner-side transaction
//! executes. A set collected against a contract id that is later disowned and
//! re-adopted stays valid until then; callers relaying signatures across
//! registry changes should collect afresh.

use crate::driver::ExecutionDriver;
use crate::error::OrchestratorError;
use crate::net::LedgerClient;
use crate::signer::Signer;
use crate::types::{Address, Bytes, Hash};
use crate::wire::{LedgerCall, TxData, TxReceipt, TxRequest};
use std::sync::Arc;
use tracing::info;

pub use crate::wire::SafeSignature;

/// Domain-separated digest for a quorum-authorized call.
pub fn call_digest(
    chain_id: u64,
    safe: Address,
    safe_nonce: u64,
    target: Address,
    data: &[u8],
) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"capstan/quorum/v1");
    hasher.update(&chain_id.to_be_bytes());
    hasher.update(safe.as_bytes());
    hasher.update(&safe_nonce.to_be_bytes());
    hasher.update(target.as_bytes());
    hasher.update(blake3::hash(data).as_bytes());
    *hasher.finalize().as_bytes()
}

/// Serialize a signature set for out-of-band relay (`signer:sighex,...`).
pub fn encode_signatures(signatures: &[SafeSignature]) -> String {
    signatures
        .iter()
        .map(|s| format!("{}:0x{}", s.signer, hex::encode(&s.data)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a signature set produced by [`encode_signatures`].
pub fn decode_signatures(input: &str) -> Result<Vec<SafeSignature>, OrchestratorError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(|entry| {
            let (signer, data) = entry.split_once(':').ok_or_else(|| {
                OrchestratorError::InvalidInput(format!("malformed signature entry {entry}"))
            })?;
            let signer = Address::from_hex(signer).map_err(|_| {
                OrchestratorError::InvalidInput(format!("malformed signer address {signer}"))
            })?;
            let data = hex::decode(data.strip_prefix("0x").unwrap_or(data)).map_err(|_| {
                OrchestratorError::InvalidInput("malformed signature hex".to_string())
            })?;
            Ok(SafeSignature { signer, data })
        })
        .collect()
}

/// Result of an owner-authorized submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The call executed on chain.
    Executed(TxReceipt),
    /// Not enough signatures yet; relay this set to the remaining signers.
    Pending(Vec<SafeSignature>),
}

/// Owner-authorized submission capability.
///
/// Callers stage owner-gated calls through this without branching on the
/// underlying owner type: a single-key owner submits directly, a
/// multisignature owner goes through quorum collection.
pub enum OwnerAuth {
    Direct(Arc<dyn Signer>),
    Quorum(QuorumSubmit),
}

impl OwnerAuth {
    /// Resolve the capability for the ledger's current owner: an owner
    /// address with code on chain is a multisignature contract, anything
    /// else is a directly controlled key.
    pub async fn for_owner(
        client: &LedgerClient<'_>,
        signer: Arc<dyn Signer>,
        prior_signatures: Vec<SafeSignature>,
    ) -> Result<Self, OrchestratorError> {
        let owner = client.owner().await?;
        let code = client.network().get_code(owner).await?;
        if code.is_empty() {
            Ok(OwnerAuth::Direct(signer))
        } else {
            Ok(OwnerAuth::Quorum(QuorumSubmit {
                safe: owner,
                signer,
                prior_signatures,
            }))
        }
    }

    /// Submit an owner-gated ledger call against `target`.
    pub async fn submit(
        &self,
        driver: &ExecutionDriver<'_>,
        target: Address,
        call: LedgerCall,
    ) -> Result<SubmitOutcome, OrchestratorError> {
        info!(%target, call = %call.describe(), "submitting owner-authorized call");
        match self {
            OwnerAuth::Direct(signer) => {
                let receipt = driver
                    .submit(TxRequest::new(
                        signer.address(),
                        Some(target),
                        TxData::Ledger(call),
                    ))
                    .await?;
                Ok(SubmitOutcome::Executed(receipt))
            }
            OwnerAuth::Quorum(quorum) => quorum.submit(driver, target, call.encode()).await,
        }
    }
}

/// Quorum collection state for one owner-gated call.
pub struct QuorumSubmit {
    pub safe: Address,
    pub signer: Arc<dyn Signer>,
    pub prior_signatures: Vec<SafeSignature>,
}

impl QuorumSubmit {
    async fn submit(
        &self,
        driver: &ExecutionDriver<'_>,
        target: Address,
        data: Bytes,
    ) -> Result<SubmitOutcome, OrchestratorError> {
        let network = driver.network();
        let client = LedgerClient::new(network, target);

        let owners = client.safe_owners(self.safe).await?;
        let threshold = client.safe_threshold(self.safe).await?;
        let safe_nonce = client.safe_nonce(self.safe).await?;

        let me = self.signer.address();
        if !owners.contains(&me) {
            return Err(OrchestratorError::Quorum(format!(
                "signer {me} is not an owner of {}",
                self.safe
            )));
        }
        if self.prior_signatures.iter().any(|s| s.signer == me) {
            return Err(OrchestratorError::Quorum(format!(
                "signer {me} is already included in the prior signatures"
            )));
        }
        let mut seen = self.prior_signatures.clone();
        seen.sort_by_key(|s| s.signer);
        if seen.windows(2).any(|w| w[0].signer == w[1].signer) {
            return Err(OrchestratorError::Quorum(
                "prior signatures contain a repeated signer".into(),
            ));
        }

        let digest = call_digest(network.chain_id(), self.safe, safe_nonce, target, &data);
        let signature = SafeSignature {
            signer: me,
            data: self.signer.sign_digest(&digest).await?,
        };

        let mut signatures = self.prior_signatures.clone();
        signatures.push(signature);

        if signatures.len() as u32 >= threshold {
            signatures.sort_by_key(|s| s.signer);
            info!(
                collected = signatures.len(),
                threshold, "threshold met, submitting quorum transaction"
            );
            let receipt = driver
                .submit(TxRequest::new(
                    me,
                    Some(self.safe),
                    TxData::SafeExec {
                        target,
                        data,
                        signatures,
                    },
                ))
                .await?;
            Ok(SubmitOutcome::Executed(receipt))
        } else {
            info!(
                collected = signatures.len(),
                threshold,
                "not enough signatures yet; relay this set to the remaining signers: {}",
                encode_signatures(&signatures)
            );
            Ok(SubmitOutcome::Pending(signatures))
        }
    }
}
