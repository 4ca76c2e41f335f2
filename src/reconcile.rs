//! Reconciliation of declared configuration against ledger and build state.
//!
//! For every declared contract the reconciler decides what, if anything, must
//! change on chain: nothing (content hashes match), a staged upgrade (adopted
//! proxy whose local code diverged), a fresh abstract deployment plus
//! proposal, or a brand-new proxy deployment plus adoption.
//!
//! Entries are processed in a shuffled order each run. The shuffle is purely
//! an anti-contention measure against stuck transactions on shared test
//! networks; the work itself stays strictly sequential, serialized by the
//! signer's account nonce through the execution driver.

use crate::artifacts::{stripped_code_hash, Artifact, ArtifactStore};
use crate::deployer;
use crate::driver::ExecutionDriver;
use crate::error::OrchestratorError;
use crate::manifest::{ContractEntry, Manifest};
use crate::net::LedgerClient;
use crate::types::{Address, Bytes};
use crate::wire::{ContractCall, CreateData, LedgerCall, TxData, TxRequest};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Changes that must be staged on the ledger, keyed by contract id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingChanges {
    pub new_implementations: BTreeMap<String, Address>,
    pub encoded_calls: BTreeMap<String, Bytes>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.new_implementations.is_empty() && self.encoded_calls.is_empty()
    }
}

/// Contract id -> on-chain address, for every declared entry seen this run.
pub type AddressBook = BTreeMap<String, Address>;

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub pending: PendingChanges,
    pub addresses: AddressBook,
    /// Dry-run only: human-readable actions that a real run would take.
    pub planned: Vec<String>,
}

pub struct Reconciler<'a> {
    client: &'a LedgerClient<'a>,
    driver: &'a ExecutionDriver<'a>,
    artifacts: &'a dyn ArtifactStore,
    /// Address deploys and proposals are sent from; must be a proposer.
    signer: Address,
    /// Shared proxy admin for newly deployed proxies.
    proxy_admin: Address,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        client: &'a LedgerClient<'a>,
        driver: &'a ExecutionDriver<'a>,
        artifacts: &'a dyn ArtifactStore,
        signer: Address,
        proxy_admin: Address,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            driver,
            artifacts,
            signer,
            proxy_admin,
            dry_run,
        }
    }

    pub async fn run(&self, manifest: &Manifest) -> Result<ReconcileOutcome, OrchestratorError> {
        let mut outcome = ReconcileOutcome::default();

        // Last proposal per id wins at apply time; reproduce that view here.
        let mut proposed_abstracts: HashMap<String, Address> = HashMap::new();
        for proposal in self.client.proposed_abstract_contracts().await? {
            proposed_abstracts.insert(proposal.id, proposal.address);
        }

        let mut entries: Vec<&ContractEntry> = manifest.contracts.iter().collect();
        entries.shuffle(&mut rand::thread_rng());

        for entry in entries {
            let proxy = self.client.adopted_contract_addresses(&entry.id).await?;
            if !proxy.is_zero() && !entry.is_abstract {
                self.reconcile_adopted(entry, proxy, &mut outcome).await?;
            } else if entry.is_abstract {
                self.reconcile_abstract(entry, &proposed_abstracts, &mut outcome)
                    .await?;
            } else {
                self.deploy_and_adopt(entry, &mut outcome).await?;
            }
        }

        Ok(outcome)
    }

    /// Adopted proxy: compare the on-chain implementation's stripped code
    /// hash against the local build; stage an upgrade if they differ.
    async fn reconcile_adopted(
        &self,
        entry: &ContractEntry,
        proxy: Address,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), OrchestratorError> {
        outcome.addresses.insert(entry.id.clone(), proxy);
        let artifact = self.artifacts.artifact(entry.class_name())?;

        let implementation = self.client.proxy_implementation(proxy).await?;
        if self
            .implementation_matches(&artifact, implementation)
            .await?
        {
            debug!(contract = %entry.id, %proxy, "deployed code matches local build");
            return Ok(());
        }

        info!(contract = %entry.id, %proxy, "local code changed, staging upgrade");
        if self.dry_run {
            outcome.planned.push(format!("{}: propose upgrade", entry.id));
            return Ok(());
        }

        // An already-staged implementation that matches the local build is
        // reused as the desired change, so re-runs deploy nothing new.
        let staged = self.client.get_pending_upgrade_address(proxy).await?;
        if !staged.is_zero() && self.implementation_matches(&artifact, staged).await? {
            debug!(contract = %entry.id, %staged, "staged implementation already matches local build");
            outcome
                .pending
                .new_implementations
                .insert(entry.id.clone(), staged);
            return Ok(());
        }

        let new_implementation = self.deploy_implementation(&artifact).await?;
        outcome
            .pending
            .new_implementations
            .insert(entry.id.clone(), new_implementation);
        Ok(())
    }

    /// Abstract contract: deploy (deterministically when requested) and stage
    /// a proposal unless the registered or already-proposed address is
    /// current.
    async fn reconcile_abstract(
        &self,
        entry: &ContractEntry,
        proposed: &HashMap<String, Address>,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), OrchestratorError> {
        let artifact = self.artifacts.artifact(entry.class_name())?;
        let current = self
            .client
            .get_abstract_contract_address(&entry.id)
            .await?;
        let proposal = proposed.get(&entry.id).copied();

        if !current.is_zero()
            && proposal.is_none()
            && self.implementation_matches(&artifact, current).await?
        {
            debug!(contract = %entry.id, address = %current, "deployed implementation is up to date");
            outcome.addresses.insert(entry.id.clone(), current);
            return Ok(());
        }
        if let Some(proposal) = proposal {
            if !proposal.is_zero() && self.implementation_matches(&artifact, proposal).await? {
                debug!(contract = %entry.id, address = %proposal, "proposed implementation is up to date");
                outcome.addresses.insert(entry.id.clone(), proposal);
                return Ok(());
            }
        }

        info!(contract = %entry.id, "deploying new abstract contract");
        if self.dry_run {
            outcome
                .planned
                .push(format!("{}: deploy abstract contract and propose", entry.id));
            return Ok(());
        }

        let create = CreateData::Contract {
            code: artifact.deployed_bytecode.clone(),
            constructor_args: entry.constructor_args.clone(),
        };
        let address = match entry.salt()? {
            Some(salt) => {
                debug!(contract = %entry.id, salt = %crate::types::hash_to_hex(&salt), "deploying deterministically");
                deployer::deploy_deterministic(self.driver, self.signer, &create, &salt).await?
            }
            None => {
                let receipt = self
                    .driver
                    .submit(TxRequest::new(self.signer, None, TxData::Create(create)))
                    .await?;
                receipt.created.ok_or_else(|| {
                    OrchestratorError::Network("create transaction returned no address".into())
                })?
            }
        };

        info!(contract = %entry.id, %address, "proposing abstract contract");
        self.driver
            .submit(TxRequest::new(
                self.signer,
                Some(self.client.address()),
                TxData::Ledger(LedgerCall::ProposeAbstract {
                    id: entry.id.clone(),
                    address,
                }),
            ))
            .await?;

        outcome.addresses.insert(entry.id.clone(), address);
        Ok(())
    }

    /// Unknown entry: deploy a fresh proxy and implementation, hand the proxy
    /// admin to the ledger if needed, and adopt.
    async fn deploy_and_adopt(
        &self,
        entry: &ContractEntry,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), OrchestratorError> {
        info!(contract = %entry.id, "deploying new proxy and implementation");
        if self.dry_run {
            outcome
                .planned
                .push(format!("{}: deploy proxy and adopt", entry.id));
            return Ok(());
        }

        let artifact = self.artifacts.artifact(entry.class_name())?;
        let ledger = self.client.address();
        let implementation = self.deploy_implementation(&artifact).await?;

        let receipt = self
            .driver
            .submit(TxRequest::new(
                self.signer,
                None,
                TxData::Create(CreateData::Proxy {
                    implementation,
                    admin: self.proxy_admin,
                    owner: ledger,
                }),
            ))
            .await?;
        let proxy = receipt.created.ok_or_else(|| {
            OrchestratorError::Network("proxy creation returned no address".into())
        })?;

        let admin_owner = self.client.contract_owner(self.proxy_admin).await?;
        if admin_owner != ledger {
            info!(proxy_admin = %self.proxy_admin, owner = %admin_owner, "transferring proxy admin to the ledger");
            self.driver
                .submit(TxRequest::new(
                    self.signer,
                    Some(self.proxy_admin),
                    TxData::Contract(ContractCall::new(
                        "transferOwnership",
                        vec![ledger.to_hex()],
                    )),
                ))
                .await?;
        }

        self.driver
            .submit(TxRequest::new(
                self.signer,
                Some(ledger),
                TxData::Ledger(LedgerCall::AdoptContract {
                    id: entry.id.clone(),
                    proxy,
                    proxy_admin: self.proxy_admin,
                }),
            ))
            .await?;

        info!(contract = %entry.id, %proxy, "adopted");
        outcome.addresses.insert(entry.id.clone(), proxy);
        Ok(())
    }

    async fn deploy_implementation(
        &self,
        artifact: &Artifact,
    ) -> Result<Address, OrchestratorError> {
        let receipt = self
            .driver
            .submit(TxRequest::new(
                self.signer,
                None,
                TxData::Create(CreateData::Contract {
                    code: artifact.deployed_bytecode.clone(),
                    constructor_args: Vec::new(),
                }),
            ))
            .await?;
        receipt.created.ok_or_else(|| {
            OrchestratorError::Network("create transaction returned no address".into())
        })
    }

    async fn implementation_matches(
        &self,
        artifact: &Artifact,
        address: Address,
    ) -> Result<bool, OrchestratorError> {
        let code = self.client.network().get_code(address).await?;
        if code.is_empty() {
            return Ok(false);
        }
        Ok(stripped_code_hash(&code) == artifact.code_hash())
    }
}
