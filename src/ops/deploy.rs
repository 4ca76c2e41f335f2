//! The deploy flow: reconcile declared state, then stage the diff.

use crate::error::OrchestratorError;
use crate::manifest::Manifest;
use crate::net::LedgerClient;
use crate::ops::{bootstrap, OpsContext};
use crate::propose::propose_pending_changes;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use tracing::info;

/// Deploy new contracts and stage implementation and call changes for
/// existing ones. Idempotent: a second run against unchanged declared and
/// chain state issues no transactions.
pub async fn deploy(
    ctx: &OpsContext<'_>,
    manifest: &Manifest,
) -> Result<ReconcileOutcome, OrchestratorError> {
    manifest.validate()?;

    let ledger = bootstrap::get_or_deploy_ledger(ctx).await?;
    let proxy_admin = bootstrap::get_or_deploy_proxy_admin(ctx).await?;
    let driver = ctx.driver();
    let client = LedgerClient::new(ctx.network, ledger);

    let reconciler = Reconciler::new(
        &client,
        &driver,
        ctx.artifacts,
        ctx.signer.address(),
        proxy_admin,
        ctx.dry_run,
    );
    let outcome = reconciler.run(manifest).await?;

    if ctx.dry_run {
        info!(
            planned = outcome.planned.len(),
            "dry run complete, nothing written"
        );
        return Ok(outcome);
    }

    let issued = propose_pending_changes(
        &client,
        &driver,
        ctx.signer.address(),
        &outcome.pending,
        &outcome.addresses,
    )
    .await?;
    info!(issued, "deploy flow complete");

    Ok(outcome)
}
