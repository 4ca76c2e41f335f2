//! Ledger ownership transfer.

use crate::error::OrchestratorError;
use crate::ops::{confirm_or_auto, OpsContext};
use crate::quorum::{OwnerAuth, SubmitOutcome};
use crate::types::Address;
use crate::wire::LedgerCall;
use tracing::info;

/// Transfer ledger ownership, typically to a multisignature owner. The
/// ledger itself rejects the zero address and self-ownership; renouncing
/// ownership has no call at all.
pub async fn transfer_ownership(
    ctx: &OpsContext<'_>,
    new_owner: Address,
) -> Result<SubmitOutcome, OrchestratorError> {
    let client = ctx.ledger_client()?;
    let current = client.owner().await?;

    if !confirm_or_auto(
        ctx.auto_confirm,
        &format!("Transfer ledger ownership {current} -> {new_owner}?"),
    )? {
        return Err(OrchestratorError::Aborted);
    }

    info!(%current, %new_owner, "transferring ledger ownership");
    let auth = OwnerAuth::for_owner(&client, ctx.signer.clone(), ctx.prior_signatures.clone())
        .await?;
    auth.submit(
        &ctx.driver(),
        client.address(),
        LedgerCall::TransferOwnership { new_owner },
    )
    .await
}
