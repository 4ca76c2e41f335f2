//! Find-or-deploy bootstrap for the ledger and the shared proxy admin.

use crate::error::OrchestratorError;
use crate::net::LedgerClient;
use crate::ops::OpsContext;
use crate::store::{LEDGER_ADDRESS_KEY, PROXY_ADMIN_KEY};
use crate::types::Address;
use crate::wire::{CreateData, LedgerCall, TxData, TxRequest};
use tracing::info;

/// Return the ledger recorded for this network, deploying a fresh one if no
/// record exists. A found ledger gets a sanity nonce read before use; the
/// deployer of a fresh ledger becomes its owner and first proposer.
pub async fn get_or_deploy_ledger(ctx: &OpsContext<'_>) -> Result<Address, OrchestratorError> {
    if let Some(address) = ctx.recorded_ledger()? {
        let client = LedgerClient::new(ctx.network, address);
        let nonce = client.nonce().await?;
        info!(%address, nonce, "found existing ledger");
        return Ok(address);
    }

    let driver = ctx.driver();
    let signer = ctx.signer.address();
    let proxy_admin = get_or_deploy_proxy_admin(ctx).await?;

    info!("deploying new ledger");
    let receipt = driver
        .submit(TxRequest::new(
            signer,
            None,
            TxData::Create(CreateData::Ledger {
                owner: signer,
                proxy_admin,
            }),
        ))
        .await?;
    let address = receipt.created.ok_or_else(|| {
        OrchestratorError::Network("ledger creation returned no address".into())
    })?;

    driver
        .submit(TxRequest::new(
            signer,
            Some(address),
            TxData::Ledger(LedgerCall::AddUpgradeProposer { proposer: signer }),
        ))
        .await?;

    ctx.store
        .put_address(ctx.network_name, LEDGER_ADDRESS_KEY, address)?;
    info!(%address, "deployed new ledger");
    Ok(address)
}

/// Return the shared proxy admin for this network, deploying one if needed.
/// Freshly deployed admins are owned by the signer until the first adoption
/// hands them to the ledger.
pub async fn get_or_deploy_proxy_admin(
    ctx: &OpsContext<'_>,
) -> Result<Address, OrchestratorError> {
    if let Some(address) = ctx.store.get_address(ctx.network_name, PROXY_ADMIN_KEY)? {
        return Ok(address);
    }

    let receipt = ctx
        .driver()
        .submit(TxRequest::new(
            ctx.signer.address(),
            None,
            TxData::Create(CreateData::ProxyAdmin),
        ))
        .await?;
    let address = receipt.created.ok_or_else(|| {
        OrchestratorError::Network("proxy admin creation returned no address".into())
    })?;

    ctx.store
        .put_address(ctx.network_name, PROXY_ADMIN_KEY, address)?;
    info!(%address, "deployed shared proxy admin");
    Ok(address)
}
