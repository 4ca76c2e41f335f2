//! The authoritative on-chain upgrade ledger.
//!
//! The ledger is a registry of adopted proxied contracts and abstract
//! (non-proxied) contracts, plus the set of staged-but-unapplied changes
//! against them. Proposers stage changes; only the owner applies them, and an
//! `upgrade` applies every pending change in one atomic batch guarded by an
//! optimistic-concurrency nonce.
//!
//! Every accepted mutating call increments `nonce` by exactly one, and a
//! successful `upgrade` increments it by exactly one regardless of how many
//! sub-changes it applies. Competing proposers are serialized by that nonce:
//! an `upgrade` submitted against a stale nonce is rejected without touching
//! any state.

use crate::error::LedgerError;
use crate::types::{Address, Bytes, Hash};
use crate::wire::LedgerCall;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hard cap on concurrently adopted contracts; bounds batch iteration cost.
pub const MAX_ADOPTED_CONTRACTS: usize = 100;

/// Content identity of a contract id within the abstract registry.
pub fn contract_id_hash(id: &str) -> Hash {
    *blake3::hash(id.as_bytes()).as_bytes()
}

/// Registry record for an adopted proxied contract.
///
/// The pending change (upgrade address and/or encoded call) lives on the
/// record itself; it exists only while the proxy is adopted and is cleared on
/// withdraw, on disown, and on successful upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptedContract {
    pub id: String,
    pub proxy_admin: Address,
    pub upgrade_address: Option<Address>,
    pub encoded_call: Option<Bytes>,
}

impl AdoptedContract {
    pub fn has_pending_change(&self) -> bool {
        self.upgrade_address.is_some() || self.encoded_call.is_some()
    }
}

/// A materialized abstract contract, tracked by content identity of its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractContract {
    pub id: String,
    pub address: Address,
}

/// One entry in the append-only abstract proposal queue. The queue preserves
/// proposal order; only the most recent entry per id is materialized at apply
/// time. A zero address marks the id for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractProposal {
    pub id: String,
    pub address: Address,
}

/// The chain environment the ledger executes against.
///
/// Mutating methods act with the authority of the ledger's own address; the
/// implementation enforces that the ledger actually holds the required
/// ownership, exactly as the surrounding chain would.
pub trait ChainEnv {
    fn is_contract(&self, address: Address) -> bool;

    /// `owner()` read on an ownable contract.
    fn contract_owner(&self, address: Address) -> Result<Address, LedgerError>;

    /// `getProxyAdmin(proxy)` read through the given admin contract. Fails if
    /// the target is not a proxy managed by that admin family.
    fn admin_of_proxy(&self, proxy_admin: Address, proxy: Address) -> Result<Address, LedgerError>;

    fn proxy_implementation(&self, proxy: Address) -> Result<Address, LedgerError>;

    fn upgrade_proxy(
        &mut self,
        proxy_admin: Address,
        proxy: Address,
        implementation: Address,
    ) -> Result<(), LedgerError>;

    fn change_proxy_admin(
        &mut self,
        proxy_admin: Address,
        proxy: Address,
        new_admin: Address,
    ) -> Result<(), LedgerError>;

    fn execute_call(&mut self, target: Address, data: &[u8]) -> Result<(), LedgerError>;

    fn transfer_contract_ownership(
        &mut self,
        target: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError>;
}

/// The ledger state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    address: Address,
    owner: Address,
    version: String,
    nonce: u64,
    proposers: Vec<Address>,
    /// Adopted proxies in adoption order; batch apply iterates this.
    proxies: Vec<Address>,
    adopted: HashMap<Address, AdoptedContract>,
    /// id -> proxy for currently adopted records. Disown frees the id.
    ids: HashMap<String, Address>,
    /// Abstract registry enumeration order.
    abstract_hashes: Vec<Hash>,
    abstracts: HashMap<Hash, AbstractContract>,
    proposed_abstracts: Vec<AbstractProposal>,
}

impl Ledger {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            version: String::new(),
            nonce: 0,
            proposers: Vec::new(),
            proxies: Vec::new(),
            adopted: HashMap::new(),
            ids: HashMap::new(),
            abstract_hashes: Vec::new(),
            abstracts: HashMap::new(),
            proposed_abstracts: Vec::new(),
        }
    }

    /// Dispatch an encoded write-surface call.
    pub fn execute(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        call: &LedgerCall,
    ) -> Result<(), LedgerError> {
        match call {
            LedgerCall::AdoptContract {
                id,
                proxy,
                proxy_admin,
            } => self.adopt_contract(env, id, *proxy, *proxy_admin),
            LedgerCall::Disown { id, new_owner } => self.disown(env, caller, id, *new_owner),
            LedgerCall::ProposeUpgrade { id, implementation } => {
                self.propose_upgrade(env, caller, id, *implementation)
            }
            LedgerCall::ProposeCall { id, call_data } => {
                self.propose_call(caller, id, call_data.clone())
            }
            LedgerCall::ProposeUpgradeAndCall {
                id,
                implementation,
                call_data,
            } => self.propose_upgrade_and_call(env, caller, id, *implementation, call_data.clone()),
            LedgerCall::WithdrawChanges { id } => self.withdraw_changes(caller, id),
            LedgerCall::ProposeAbstract { id, address } => {
                self.propose_abstract(env, caller, id, *address)
            }
            LedgerCall::WithdrawAllAbstractProposals => {
                self.withdraw_all_abstract_proposals(caller)
            }
            LedgerCall::Upgrade { version, nonce } => self.upgrade(env, caller, version, *nonce),
            LedgerCall::SelfUpgrade {
                implementation,
                proxy_admin,
            } => self.self_upgrade(env, caller, *implementation, *proxy_admin),
            LedgerCall::Call { id, call_data } => self.call(env, caller, id, call_data),
            LedgerCall::AddUpgradeProposer { proposer } => {
                self.add_upgrade_proposer(caller, *proposer)
            }
            LedgerCall::RemoveUpgradeProposer { proposer } => {
                self.remove_upgrade_proposer(caller, *proposer)
            }
            LedgerCall::ChangeProxyAdmin {
                proxy_admin,
                proxy,
                new_admin,
            } => self.change_proxy_admin(env, caller, *proxy_admin, *proxy, *new_admin),
            LedgerCall::DisownProxyAdmin {
                proxy_admin,
                new_owner,
            } => self.disown_proxy_admin(env, caller, *proxy_admin, *new_owner),
            LedgerCall::TransferOwnership { new_owner } => {
                self.transfer_ownership(caller, *new_owner)
            }
        }
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::PermissionDenied(
                "caller is not the owner".into(),
            ));
        }
        Ok(())
    }

    fn ensure_proposer(&self, caller: Address) -> Result<(), LedgerError> {
        if !self.proposers.contains(&caller) {
            return Err(LedgerError::PermissionDenied("caller is not proposer".into()));
        }
        Ok(())
    }

    fn record_for_id(&self, id: &str) -> Result<Address, LedgerError> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| LedgerError::NotFound(format!("unknown contract id {id}")))
    }

    /// Register a proxy under `id`. The ledger must already own both the
    /// proxy and its admin; verified via cross-contract ownership reads.
    pub fn adopt_contract(
        &mut self,
        env: &mut dyn ChainEnv,
        id: &str,
        proxy: Address,
        proxy_admin: Address,
    ) -> Result<(), LedgerError> {
        if id.is_empty() {
            return Err(LedgerError::InvalidInput(
                "contract id must not be empty".into(),
            ));
        }
        if self.ids.contains_key(id) {
            return Err(LedgerError::Conflict(format!(
                "contract id {id} already registered"
            )));
        }
        if self.adopted.contains_key(&proxy) {
            return Err(LedgerError::Conflict(
                "proxy already adopted with a different contract id".into(),
            ));
        }
        if self.proxies.len() >= MAX_ADOPTED_CONTRACTS {
            return Err(LedgerError::CapacityExceeded);
        }

        if env.contract_owner(proxy_admin)? != self.address {
            return Err(LedgerError::PermissionDenied(
                "must be owner of proxy admin to adopt".into(),
            ));
        }
        let admin = env.admin_of_proxy(proxy_admin, proxy).map_err(|_| {
            LedgerError::InvalidInput(
                "call to determine proxy admin ownership of proxy failed".into(),
            )
        })?;
        if admin != proxy_admin {
            return Err(LedgerError::InvalidInput(
                "proxy admin is not the admin of this proxy".into(),
            ));
        }
        if env.contract_owner(proxy)? != self.address {
            return Err(LedgerError::PermissionDenied(
                "must be owner of contract to adopt".into(),
            ));
        }

        self.proxies.push(proxy);
        self.ids.insert(id.to_string(), proxy);
        self.adopted.insert(
            proxy,
            AdoptedContract {
                id: id.to_string(),
                proxy_admin,
                upgrade_address: None,
                encoded_call: None,
            },
        );
        self.nonce += 1;
        Ok(())
    }

    /// Release an adopted contract: transfer its ownership to `new_owner`,
    /// clear the record and any pending change, and free the id for reuse.
    /// Ownership of the (typically shared) proxy admin is left untouched.
    pub fn disown(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        id: &str,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        let proxy = self.record_for_id(id)?;

        env.transfer_contract_ownership(proxy, new_owner)?;

        self.adopted.remove(&proxy);
        self.ids.remove(id);
        self.proxies.retain(|p| *p != proxy);
        self.nonce += 1;
        Ok(())
    }

    pub fn propose_upgrade(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        id: &str,
        implementation: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_proposer(caller)?;
        let proxy = self.record_for_id(id)?;
        self.ensure_no_pending(proxy)?;
        self.validate_new_implementation(env, proxy, implementation)?;

        if let Some(record) = self.adopted.get_mut(&proxy) {
            record.upgrade_address = Some(implementation);
        }
        self.nonce += 1;
        Ok(())
    }

    pub fn propose_call(
        &mut self,
        caller: Address,
        id: &str,
        call_data: Bytes,
    ) -> Result<(), LedgerError> {
        self.ensure_proposer(caller)?;
        let proxy = self.record_for_id(id)?;
        self.ensure_no_pending(proxy)?;

        if let Some(record) = self.adopted.get_mut(&proxy) {
            record.encoded_call = Some(call_data);
        }
        self.nonce += 1;
        Ok(())
    }

    pub fn propose_upgrade_and_call(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        id: &str,
        implementation: Address,
        call_data: Bytes,
    ) -> Result<(), LedgerError> {
        self.ensure_proposer(caller)?;
        let proxy = self.record_for_id(id)?;
        self.ensure_no_pending(proxy)?;
        self.validate_new_implementation(env, proxy, implementation)?;

        if let Some(record) = self.adopted.get_mut(&proxy) {
            record.upgrade_address = Some(implementation);
            record.encoded_call = Some(call_data);
        }
        self.nonce += 1;
        Ok(())
    }

    pub fn withdraw_changes(&mut self, caller: Address, id: &str) -> Result<(), LedgerError> {
        self.ensure_proposer(caller)?;
        let proxy = self.record_for_id(id)?;
        let record = self
            .adopted
            .get_mut(&proxy)
            .ok_or_else(|| LedgerError::NotFound(format!("unknown contract id {id}")))?;
        if !record.has_pending_change() {
            return Err(LedgerError::NotFound(format!(
                "no pending changes for contract {id}"
            )));
        }
        record.upgrade_address = None;
        record.encoded_call = None;
        self.nonce += 1;
        Ok(())
    }

    /// Append an abstract proposal. The zero address signals deletion of the
    /// id at the next batch apply.
    pub fn propose_abstract(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        id: &str,
        address: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_proposer(caller)?;
        if id.is_empty() {
            return Err(LedgerError::InvalidInput(
                "contract id must not be empty".into(),
            ));
        }
        if !address.is_zero() && !env.is_contract(address) {
            return Err(LedgerError::InvalidInput(
                "proposed address is not a contract".into(),
            ));
        }
        self.proposed_abstracts.push(AbstractProposal {
            id: id.to_string(),
            address,
        });
        self.nonce += 1;
        Ok(())
    }

    pub fn withdraw_all_abstract_proposals(&mut self, caller: Address) -> Result<(), LedgerError> {
        self.ensure_proposer(caller)?;
        if self.proposed_abstracts.is_empty() {
            return Err(LedgerError::NotFound(
                "there are no abstract contract proposals".into(),
            ));
        }
        self.proposed_abstracts.clear();
        self.nonce += 1;
        Ok(())
    }

    /// Apply every pending change in one batch: swap implementations, run
    /// staged calls, materialize the latest abstract proposal per id, set the
    /// version, and increment the nonce exactly once.
    ///
    /// `expected_nonce` must equal the current nonce; a stale value means
    /// another mutating call landed between read and submit, and the whole
    /// batch is rejected with state untouched.
    pub fn upgrade(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        new_version: &str,
        expected_nonce: u64,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if new_version.is_empty() {
            return Err(LedgerError::InvalidInput("new version must be set".into()));
        }
        if expected_nonce != self.nonce {
            return Err(LedgerError::NonceConflict {
                expected: self.nonce,
                submitted: expected_nonce,
            });
        }

        for proxy in self.proxies.clone() {
            let (implementation, call_data, proxy_admin) = match self.adopted.get_mut(&proxy) {
                Some(record) => (
                    record.upgrade_address.take(),
                    record.encoded_call.take(),
                    record.proxy_admin,
                ),
                None => continue,
            };
            if let Some(implementation) = implementation {
                env.upgrade_proxy(proxy_admin, proxy, implementation)?;
            }
            if let Some(data) = call_data {
                env.execute_call(proxy, &data)?;
            }
        }

        // Applying the queue in order gives last-write-wins per id.
        for proposal in std::mem::take(&mut self.proposed_abstracts) {
            let hash = contract_id_hash(&proposal.id);
            if proposal.address.is_zero() {
                self.abstracts.remove(&hash);
                self.abstract_hashes.retain(|h| *h != hash);
            } else {
                if !self.abstracts.contains_key(&hash) {
                    self.abstract_hashes.push(hash);
                }
                self.abstracts.insert(
                    hash,
                    AbstractContract {
                        id: proposal.id,
                        address: proposal.address,
                    },
                );
            }
        }

        self.version = new_version.to_string();
        self.nonce += 1;
        Ok(())
    }

    /// Escape hatch for when the ledger itself owns its own proxy admin: a
    /// contract cannot upgrade its own proxy through a call routed via that
    /// proxy, so this bypasses propose/upgrade entirely.
    pub fn self_upgrade(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        implementation: Address,
        proxy_admin: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if !env.is_contract(implementation) {
            return Err(LedgerError::InvalidInput(
                "implementation address is not a contract".into(),
            ));
        }
        if env.contract_owner(proxy_admin)? != self.address {
            return Err(LedgerError::PermissionDenied(
                "must be owner of proxy admin to self upgrade".into(),
            ));
        }
        env.upgrade_proxy(proxy_admin, self.address, implementation)?;
        self.nonce += 1;
        Ok(())
    }

    /// Owner-gated immediate call on an adopted contract, bypassing the
    /// propose/apply cycle. Used for large initial-configuration batches.
    pub fn call(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        id: &str,
        call_data: &[u8],
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        let proxy = self.record_for_id(id)?;
        env.execute_call(proxy, call_data)?;
        self.nonce += 1;
        Ok(())
    }

    pub fn add_upgrade_proposer(
        &mut self,
        caller: Address,
        proposer: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if self.proposers.contains(&proposer) {
            return Err(LedgerError::Conflict(format!(
                "{proposer} is already a proposer"
            )));
        }
        self.proposers.push(proposer);
        self.nonce += 1;
        Ok(())
    }

    pub fn remove_upgrade_proposer(
        &mut self,
        caller: Address,
        proposer: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if !self.proposers.contains(&proposer) {
            return Err(LedgerError::NotFound(format!("{proposer} is not a proposer")));
        }
        self.proposers.retain(|p| *p != proposer);
        self.nonce += 1;
        Ok(())
    }

    pub fn change_proxy_admin(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        proxy_admin: Address,
        proxy: Address,
        new_admin: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if self.adopted.contains_key(&proxy) {
            return Err(LedgerError::Conflict(
                "cannot change proxy admin for owned contract".into(),
            ));
        }
        env.change_proxy_admin(proxy_admin, proxy, new_admin)?;
        self.nonce += 1;
        Ok(())
    }

    pub fn disown_proxy_admin(
        &mut self,
        env: &mut dyn ChainEnv,
        caller: Address,
        proxy_admin: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        env.transfer_contract_ownership(proxy_admin, new_owner)?;
        self.nonce += 1;
        Ok(())
    }

    /// Transfer ledger ownership. Renouncing ownership is permanently
    /// disabled; the zero address and the ledger itself are rejected.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(LedgerError::InvalidInput(
                "new owner is the zero address".into(),
            ));
        }
        if new_owner == self.address {
            return Err(LedgerError::InvalidInput("new owner is this contract".into()));
        }
        self.owner = new_owner;
        self.nonce += 1;
        Ok(())
    }

    fn ensure_no_pending(&self, proxy: Address) -> Result<(), LedgerError> {
        if let Some(record) = self.adopted.get(&proxy) {
            if record.has_pending_change() {
                return Err(LedgerError::Conflict(
                    "changes already proposed, withdraw first".into(),
                ));
            }
        }
        Ok(())
    }

    fn validate_new_implementation(
        &self,
        env: &dyn ChainEnv,
        proxy: Address,
        implementation: Address,
    ) -> Result<(), LedgerError> {
        if env.proxy_implementation(proxy)? == implementation {
            return Err(LedgerError::InvalidInput(
                "implementation address unchanged".into(),
            ));
        }
        if !env.is_contract(implementation) {
            return Err(LedgerError::InvalidInput(
                "implementation address is not a contract".into(),
            ));
        }
        Ok(())
    }

    // Read surface.

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get_upgrade_proposers(&self) -> &[Address] {
        &self.proposers
    }

    /// Proxy address for an adopted id, or the zero address if the id is not
    /// currently adopted (including after a disown freed it).
    pub fn adopted_contract_addresses(&self, id: &str) -> Address {
        self.ids.get(id).copied().unwrap_or(Address::ZERO)
    }

    pub fn get_proxies(&self) -> &[Address] {
        &self.proxies
    }

    pub fn adopted_contracts_by_proxy_address(&self, proxy: Address) -> Option<&AdoptedContract> {
        self.adopted.get(&proxy)
    }

    pub fn get_proxies_with_pending_changes(&self) -> Vec<Address> {
        self.proxies
            .iter()
            .filter(|p| {
                self.adopted
                    .get(p)
                    .map(AdoptedContract::has_pending_change)
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }

    pub fn get_pending_upgrade_address(&self, proxy: Address) -> Address {
        self.adopted
            .get(&proxy)
            .and_then(|r| r.upgrade_address)
            .unwrap_or(Address::ZERO)
    }

    pub fn get_pending_call_data(&self, proxy: Address) -> Bytes {
        self.adopted
            .get(&proxy)
            .and_then(|r| r.encoded_call.clone())
            .unwrap_or_default()
    }

    pub fn get_proposed_abstract_contracts_length(&self) -> u64 {
        self.proposed_abstracts.len() as u64
    }

    pub fn get_proposed_abstract_contract(&self, index: u64) -> Option<&AbstractProposal> {
        self.proposed_abstracts.get(index as usize)
    }

    pub fn get_abstract_contract_address(&self, id: &str) -> Address {
        self.abstracts
            .get(&contract_id_hash(id))
            .map(|a| a.address)
            .unwrap_or(Address::ZERO)
    }

    pub fn get_abstract_contract_id_hashes(&self) -> &[Hash] {
        &self.abstract_hashes
    }

    pub fn abstract_contracts_by_id_hash(&self, hash: Hash) -> Option<&AbstractContract> {
        self.abstracts.get(&hash)
    }
}
