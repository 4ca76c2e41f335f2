//! Top-level operation flows: deploy, status, upgrade, proposer management.
//!
//! Each flow is a thin orchestration over the reconciler, coordinator,
//! quorum authorizer and execution driver, mirroring one operator command.

use crate::artifacts::ArtifactStore;
use crate::driver::ExecutionDriver;
use crate::error::OrchestratorError;
use crate::net::{LedgerClient, Network};
use crate::quorum::SafeSignature;
use crate::signer::Signer;
use crate::store::{MetadataStore, LEDGER_ADDRESS_KEY};
use crate::types::Address;
use std::sync::Arc;
use std::time::Duration;

mod bootstrap;
mod deploy;
mod ownership;
mod proposers;
mod status;
mod upgrade;
mod withdraw;

pub use bootstrap::{get_or_deploy_ledger, get_or_deploy_proxy_admin};
pub use deploy::deploy;
pub use ownership::transfer_ownership;
pub use proposers::{add_proposer, remove_proposer};
pub use status::{protocol_status, StatusReport};
pub use upgrade::upgrade;
pub use withdraw::withdraw_all_abstract_proposals;

/// Everything an operation flow needs about its environment.
pub struct OpsContext<'a> {
    pub network: &'a dyn Network,
    pub network_name: &'a str,
    pub store: &'a MetadataStore,
    pub artifacts: &'a dyn ArtifactStore,
    pub signer: Arc<dyn Signer>,
    pub auto_confirm: bool,
    pub dry_run: bool,
    pub prior_signatures: Vec<SafeSignature>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl<'a> OpsContext<'a> {
    pub fn driver(&self) -> ExecutionDriver<'a> {
        ExecutionDriver::new(self.network).with_policy(self.retry_attempts, self.retry_delay)
    }

    /// Client for the ledger recorded for this network. Fails if no ledger
    /// has been deployed here yet.
    pub fn ledger_client(&self) -> Result<LedgerClient<'a>, OrchestratorError> {
        let address = self.recorded_ledger()?.ok_or_else(|| {
            OrchestratorError::Store(format!(
                "no ledger recorded for network {}; run deploy first",
                self.network_name
            ))
        })?;
        Ok(LedgerClient::new(self.network, address))
    }

    pub fn recorded_ledger(&self) -> Result<Option<Address>, OrchestratorError> {
        self.store.get_address(self.network_name, LEDGER_ADDRESS_KEY)
    }
}

/// Ask the operator for confirmation unless auto-confirm is set.
pub fn confirm_or_auto(auto_confirm: bool, message: &str) -> Result<bool, OrchestratorError> {
    if auto_confirm {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .interact()
        .map_err(|e| OrchestratorError::InvalidInput(format!("confirmation failed: {e}")))
}
