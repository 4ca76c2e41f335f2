//! Proposer set management.

use crate::error::OrchestratorError;
use crate::ops::OpsContext;
use crate::quorum::{OwnerAuth, SubmitOutcome};
use crate::types::Address;
use crate::wire::LedgerCall;
use tracing::info;

/// Add a proposer. Membership is pre-checked client-side so a duplicate add
/// fails before any transaction is signed.
pub async fn add_proposer(
    ctx: &OpsContext<'_>,
    proposer: Address,
) -> Result<SubmitOutcome, OrchestratorError> {
    let client = ctx.ledger_client()?;
    if client.get_upgrade_proposers().await?.contains(&proposer) {
        return Err(OrchestratorError::InvalidInput(format!(
            "{proposer} is already a proposer"
        )));
    }

    info!(%proposer, "adding proposer");
    let auth = OwnerAuth::for_owner(&client, ctx.signer.clone(), ctx.prior_signatures.clone())
        .await?;
    auth.submit(
        &ctx.driver(),
        client.address(),
        LedgerCall::AddUpgradeProposer { proposer },
    )
    .await
}

/// Remove a proposer, pre-checking that it actually is one.
pub async fn remove_proposer(
    ctx: &OpsContext<'_>,
    proposer: Address,
) -> Result<SubmitOutcome, OrchestratorError> {
    let client = ctx.ledger_client()?;
    if !client.get_upgrade_proposers().await?.contains(&proposer) {
        return Err(OrchestratorError::InvalidInput(format!(
            "{proposer} is not a proposer"
        )));
    }

    info!(%proposer, "removing proposer");
    let auth = OwnerAuth::for_owner(&client, ctx.signer.clone(), ctx.prior_signatures.clone())
        .await?;
    auth.submit(
        &ctx.driver(),
        client.address(),
        LedgerCall::RemoveUpgradeProposer { proposer },
    )
    .await
}
