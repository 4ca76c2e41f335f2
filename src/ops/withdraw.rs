//! Withdrawal of the entire abstract proposal queue.

use crate::error::OrchestratorError;
use crate::ops::OpsContext;
use crate::wire::{LedgerCall, TxData, TxRequest};
use tracing::info;

/// Withdraw all abstract proposals. Proposer-gated, so it submits directly
/// from the signer rather than through the owner capability.
pub async fn withdraw_all_abstract_proposals(
    ctx: &OpsContext<'_>,
) -> Result<(), OrchestratorError> {
    let client = ctx.ledger_client()?;
    let queued = client.proposed_abstract_contracts().await?;
    if queued.is_empty() {
        return Err(OrchestratorError::InvalidInput(
            "there are no abstract contract proposals".into(),
        ));
    }

    info!(count = queued.len(), "withdrawing all abstract proposals");
    ctx.driver()
        .submit(TxRequest::new(
            ctx.signer.address(),
            Some(client.address()),
            TxData::Ledger(LedgerCall::WithdrawAllAbstractProposals),
        ))
        .await?;
    Ok(())
}
