//! The upgrade flow: apply all pending changes atomically.

use crate::error::OrchestratorError;
use crate::ops::{confirm_or_auto, OpsContext};
use crate::quorum::{OwnerAuth, SubmitOutcome};
use crate::wire::LedgerCall;
use tracing::info;

/// Apply every pending change against the ledger's current nonce, routed
/// through the owner capability (direct key or quorum collection). Returns
/// the partial signature set when the quorum is not yet complete.
pub async fn upgrade(
    ctx: &OpsContext<'_>,
    new_version: &str,
) -> Result<SubmitOutcome, OrchestratorError> {
    if new_version.is_empty() {
        return Err(OrchestratorError::InvalidInput(
            "new version must be set".into(),
        ));
    }

    let client = ctx.ledger_client()?;
    let driver = ctx.driver();

    let nonce = client.nonce().await?;
    let current_version = client.version().await?;
    info!(nonce, %current_version, %new_version, "preparing upgrade");

    if !confirm_or_auto(
        ctx.auto_confirm,
        &format!(
            "Confirm upgrade of contracts with pending changes ({current_version:?} -> {new_version:?}) at nonce {nonce}?"
        ),
    )? {
        return Err(OrchestratorError::Aborted);
    }

    let auth = OwnerAuth::for_owner(&client, ctx.signer.clone(), ctx.prior_signatures.clone())
        .await?;
    let call = LedgerCall::Upgrade {
        version: new_version.to_string(),
        nonce,
    };
    auth.submit(&driver, client.address(), call).await
}
