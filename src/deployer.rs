//! Deterministic deployment through a chain-wide singleton proxy.
//!
//! The deployment proxy lives at a fixed, well-known address and makes the
//! resulting contract address a pure function of the creation payload and a
//! 32-byte salt, independent of any account nonce. The proxy itself is
//! bootstrapped by a presigned one-time transaction from a fixed pre-funded
//! signer, so the same address holds the same code on every chain.
//!
//! Deployment is idempotent: the computed address is probed first and an
//! existing deployment is returned without broadcasting anything.

use crate::driver::ExecutionDriver;
use crate::error::OrchestratorError;
use crate::net::Network;
use crate::types::{Address, Hash};
use crate::wire::{CreateData, TxData, TxRequest};
use tracing::info;

/// Fixed address of the singleton deployment proxy.
pub const DEPLOYMENT_PROXY_ADDRESS: Address = Address([
    0x4e, 0x59, 0xb4, 0x48, 0x47, 0xb3, 0x79, 0x57, 0x85, 0x88, 0x92, 0x0c, 0xa7, 0x8f, 0xbf,
    0x26, 0xc0, 0xb4, 0x95, 0x6c,
]);

/// The exact runtime code expected at [`DEPLOYMENT_PROXY_ADDRESS`].
pub const DEPLOYMENT_PROXY_CODE: &[u8] = b"capstan/deterministic-deployment-proxy/v1";

/// Fixed signer of the presigned proxy bootstrap transaction.
pub const BOOTSTRAP_SIGNER: Address = Address([
    0x3f, 0xab, 0x18, 0x46, 0x22, 0xdc, 0x19, 0xb6, 0x10, 0x93, 0x49, 0xb9, 0x48, 0x11, 0x49,
    0x3b, 0xf2, 0xa4, 0x53, 0x62,
]);

/// Cost of the bootstrap transaction (fixed gas limit times fixed gas price).
pub const DEPLOYMENT_COST: u128 = 100_000 * 100_000_000_000;

/// Whether the deployment proxy is present. Wrong code at the fixed address
/// is not representable here; it is a fatal integrity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    Ready,
    Missing,
}

/// Compute the deployment address for a creation payload and salt.
pub fn deterministic_address(salt: &Hash, create_payload: &[u8]) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"capstan/create2/v1");
    hasher.update(DEPLOYMENT_PROXY_ADDRESS.as_bytes());
    hasher.update(salt);
    hasher.update(blake3::hash(create_payload).as_bytes());
    Address::from_hash(hasher.finalize().as_bytes())
}

/// Check the code at the fixed proxy address. Absence is recoverable (the
/// proxy can still be bootstrapped); any other code is a fatal mismatch.
pub async fn deployment_proxy_status(
    network: &dyn Network,
) -> Result<ProxyStatus, OrchestratorError> {
    let code = network.get_code(DEPLOYMENT_PROXY_ADDRESS).await?;
    if code.is_empty() {
        Ok(ProxyStatus::Missing)
    } else if code == DEPLOYMENT_PROXY_CODE {
        Ok(ProxyStatus::Ready)
    } else {
        Err(OrchestratorError::Integrity(format!(
            "unexpected code at deployment proxy address {DEPLOYMENT_PROXY_ADDRESS}"
        )))
    }
}

/// Bootstrap the deployment proxy if it is missing, then verify it.
pub async fn ensure_deployment_proxy(
    driver: &ExecutionDriver<'_>,
) -> Result<(), OrchestratorError> {
    let network = driver.network();
    if deployment_proxy_status(network).await? == ProxyStatus::Ready {
        return Ok(());
    }

    let balance = network.get_balance(BOOTSTRAP_SIGNER).await?;
    if balance < DEPLOYMENT_COST {
        return Err(OrchestratorError::Integrity(format!(
            "one-time deployment account {BOOTSTRAP_SIGNER} cannot cover the proxy deployment cost"
        )));
    }

    info!("deploying deterministic deployment proxy");
    driver
        .submit(TxRequest::new(
            BOOTSTRAP_SIGNER,
            None,
            TxData::DeployDeterministicProxy,
        ))
        .await?;

    match deployment_proxy_status(network).await? {
        ProxyStatus::Ready => Ok(()),
        ProxyStatus::Missing => Err(OrchestratorError::Integrity(
            "deployment proxy still missing after bootstrap".into(),
        )),
    }
}

/// Deploy a creation payload deterministically, returning its address.
///
/// If code already exists at the computed address the deployment is assumed
/// complete and nothing is broadcast.
pub async fn deploy_deterministic(
    driver: &ExecutionDriver<'_>,
    from: Address,
    create: &CreateData,
    salt: &Hash,
) -> Result<Address, OrchestratorError> {
    let network = driver.network();
    let payload = create.encode();
    let address = deterministic_address(salt, &payload);

    if !network.get_code(address).await?.is_empty() {
        info!(%address, "deterministic deployment already present");
        return Ok(address);
    }

    ensure_deployment_proxy(driver).await?;

    driver
        .submit(TxRequest::new(
            from,
            Some(DEPLOYMENT_PROXY_ADDRESS),
            TxData::Create2 {
                salt: *salt,
                create: create.clone(),
            },
        ))
        .await?;

    info!(%address, "deployed deterministically");
    Ok(address)
}
