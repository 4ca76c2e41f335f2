//! In-memory chain model hosting the upgrade ledger.
//!
//! This is the embedded network used by tests and local rehearsal runs. It
//! models exactly what the orchestration layer observes through the network
//! seam: contracts with code and an ownable owner, upgradeable proxies with
//! an admin, proxy admin contracts, threshold multisignature owners, account
//! balances and per-sender transaction counts.
//!
//! Transaction application is atomic: a failed transaction rolls the chain
//! back to its pre-transaction state, which is what gives `upgrade` its
//! all-or-nothing batch semantics.

use crate::deployer::{
    deterministic_address, BOOTSTRAP_SIGNER, DEPLOYMENT_COST, DEPLOYMENT_PROXY_ADDRESS,
    DEPLOYMENT_PROXY_CODE,
};
use crate::error::LedgerError;
use crate::ledger::{ChainEnv, Ledger};
use crate::quorum::call_digest;
use crate::signer::dev_signature;
use crate::types::{Address, Bytes};
use crate::wire::{ContractCall, CreateData, LedgerCall, Query, QueryResponse, TxData, TxReceipt, TxRequest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Marker runtime code for proxy contracts.
pub const PROXY_CODE: &[u8] = b"capstan/proxy/v1";
/// Marker runtime code for proxy admin contracts.
pub const PROXY_ADMIN_CODE: &[u8] = b"capstan/proxy-admin/v1";
/// Marker runtime code for the ledger implementation.
pub const LEDGER_CODE: &[u8] = b"capstan/ledger/v1";
/// Marker runtime code for multisignature owner contracts.
pub const SAFE_CODE: &[u8] = b"capstan/safe/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    Plain,
    ProxyAdmin,
    Proxy,
    LedgerHost,
    Safe(SafeState),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeState {
    pub owners: Vec<Address>,
    pub threshold: u32,
    pub nonce: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractState {
    pub code: Bytes,
    pub owner: Address,
    pub kind: ContractKind,
    /// Configuration state written by executed contract calls.
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProxyState {
    pub implementation: Address,
    pub admin: Address,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Chain {
    chain_id: u64,
    contracts: HashMap<Address, ContractState>,
    proxies: HashMap<Address, ProxyState>,
    ledgers: HashMap<Address, Ledger>,
    balances: HashMap<Address, u128>,
    tx_counts: HashMap<Address, u64>,
}

impl Chain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            contracts: HashMap::new(),
            proxies: HashMap::new(),
            ledgers: HashMap::new(),
            balances: HashMap::new(),
            tx_counts: HashMap::new(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Snapshot the whole chain; the rehearsal sandbox persists this between
    /// command invocations.
    pub fn to_bytes(&self) -> Bytes {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(raw)
            .map_err(|e| LedgerError::InvalidInput(format!("corrupt chain snapshot: {e}")))
    }

    pub fn fund(&mut self, address: Address, amount: u128) {
        *self.balances.entry(address).or_insert(0) += amount;
    }

    /// Install arbitrary code at an address, like a dev node's set-code
    /// cheat. Only meaningful on the embedded chain.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.contracts
            .entry(address)
            .and_modify(|c| c.code = code.clone())
            .or_insert(ContractState {
                code,
                owner: Address::ZERO,
                kind: ContractKind::Plain,
                config: BTreeMap::new(),
            });
    }

    pub fn balance_of(&self, address: Address) -> u128 {
        self.balances.get(&address).copied().unwrap_or(0)
    }

    pub fn transaction_count(&self, address: Address) -> u64 {
        self.tx_counts.get(&address).copied().unwrap_or(0)
    }

    pub fn code_at(&self, address: Address) -> Bytes {
        self.contracts
            .get(&address)
            .map(|c| c.code.clone())
            .unwrap_or_default()
    }

    pub fn contract(&self, address: Address) -> Option<&ContractState> {
        self.contracts.get(&address)
    }

    pub fn proxy(&self, address: Address) -> Option<&ProxyState> {
        self.proxies.get(&address)
    }

    pub fn ledger(&self, address: Address) -> Option<&Ledger> {
        self.ledgers.get(&address)
    }

    /// Apply a transaction atomically: on any error the chain is restored to
    /// its pre-transaction state; on success the sender's transaction count
    /// increments by one.
    pub fn execute(&mut self, tx: &TxRequest) -> Result<TxReceipt, LedgerError> {
        let snapshot = self.clone();
        match self.dispatch(tx) {
            Ok(receipt) => {
                *self.tx_counts.entry(tx.from).or_insert(0) += 1;
                Ok(receipt)
            }
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, tx: &TxRequest) -> Result<TxReceipt, LedgerError> {
        let data = TxData::decode(&tx.data).map_err(|e| LedgerError::InvalidInput(e.to_string()))?;
        match data {
            TxData::Create(create) => {
                let address = self.next_create_address(tx.from);
                self.create_at(address, tx.from, &create)?;
                Ok(TxReceipt {
                    created: Some(address),
                })
            }
            TxData::Create2 { salt, create } => {
                if tx.to != Some(DEPLOYMENT_PROXY_ADDRESS) {
                    return Err(LedgerError::InvalidInput(
                        "deterministic create must target the deployment proxy".into(),
                    ));
                }
                if self.code_at(DEPLOYMENT_PROXY_ADDRESS) != DEPLOYMENT_PROXY_CODE {
                    return Err(LedgerError::CallFailed {
                        target: DEPLOYMENT_PROXY_ADDRESS,
                        reason: "deployment proxy is not deployed".into(),
                    });
                }
                let address = deterministic_address(&salt, &create.encode());
                if self.contracts.contains_key(&address) {
                    return Err(LedgerError::Conflict(format!(
                        "contract already deployed at {address}"
                    )));
                }
                self.create_at(address, tx.from, &create)?;
                Ok(TxReceipt {
                    created: Some(address),
                })
            }
            TxData::DeployDeterministicProxy => {
                if tx.from != BOOTSTRAP_SIGNER {
                    return Err(LedgerError::PermissionDenied(
                        "deployment proxy bootstrap is a presigned one-time transaction".into(),
                    ));
                }
                let balance = self.balance_of(BOOTSTRAP_SIGNER);
                if balance < DEPLOYMENT_COST {
                    return Err(LedgerError::InvalidInput(
                        "bootstrap signer balance below deployment cost".into(),
                    ));
                }
                self.balances.insert(BOOTSTRAP_SIGNER, balance - DEPLOYMENT_COST);
                self.contracts.insert(
                    DEPLOYMENT_PROXY_ADDRESS,
                    ContractState {
                        code: DEPLOYMENT_PROXY_CODE.to_vec(),
                        owner: Address::ZERO,
                        kind: ContractKind::Plain,
                        config: BTreeMap::new(),
                    },
                );
                Ok(TxReceipt {
                    created: Some(DEPLOYMENT_PROXY_ADDRESS),
                })
            }
            TxData::Ledger(call) => {
                let target = tx
                    .to
                    .ok_or_else(|| LedgerError::InvalidInput("missing ledger address".into()))?;
                self.execute_ledger_call(tx.from, target, &call)?;
                Ok(TxReceipt { created: None })
            }
            TxData::Contract(call) => {
                let target = tx
                    .to
                    .ok_or_else(|| LedgerError::InvalidInput("missing call target".into()))?;
                self.execute_contract_call(tx.from, target, &call)?;
                Ok(TxReceipt { created: None })
            }
            TxData::SafeExec {
                target,
                data,
                signatures,
            } => {
                let safe = tx
                    .to
                    .ok_or_else(|| LedgerError::InvalidInput("missing safe address".into()))?;
                self.execute_safe_transaction(safe, target, &data, &signatures)?;
                Ok(TxReceipt { created: None })
            }
        }
    }

    fn next_create_address(&self, sender: Address) -> Address {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"capstan/create");
        hasher.update(sender.as_bytes());
        hasher.update(&self.transaction_count(sender).to_be_bytes());
        Address::from_hash(hasher.finalize().as_bytes())
    }

    fn create_at(
        &mut self,
        address: Address,
        sender: Address,
        create: &CreateData,
    ) -> Result<(), LedgerError> {
        match create {
            CreateData::Contract { code, .. } => {
                if code.is_empty() {
                    return Err(LedgerError::InvalidInput(
                        "contract code must not be empty".into(),
                    ));
                }
                self.contracts.insert(
                    address,
                    ContractState {
                        code: code.clone(),
                        owner: sender,
                        kind: ContractKind::Plain,
                        config: BTreeMap::new(),
                    },
                );
            }
            CreateData::ProxyAdmin => {
                self.contracts.insert(
                    address,
                    ContractState {
                        code: PROXY_ADMIN_CODE.to_vec(),
                        owner: sender,
                        kind: ContractKind::ProxyAdmin,
                        config: BTreeMap::new(),
                    },
                );
            }
            CreateData::Proxy {
                implementation,
                admin,
                owner,
            } => {
                if self.code_at(*implementation).is_empty() {
                    return Err(LedgerError::InvalidInput(
                        "proxy implementation is not a contract".into(),
                    ));
                }
                if !matches!(
                    self.contracts.get(admin).map(|c| &c.kind),
                    Some(ContractKind::ProxyAdmin)
                ) {
                    return Err(LedgerError::InvalidInput(
                        "proxy admin address is not a proxy admin".into(),
                    ));
                }
                self.contracts.insert(
                    address,
                    ContractState {
                        code: PROXY_CODE.to_vec(),
                        owner: *owner,
                        kind: ContractKind::Proxy,
                        config: BTreeMap::new(),
                    },
                );
                self.proxies.insert(
                    address,
                    ProxyState {
                        implementation: *implementation,
                        admin: *admin,
                    },
                );
            }
            CreateData::Ledger { owner, proxy_admin } => {
                if !matches!(
                    self.contracts.get(proxy_admin).map(|c| &c.kind),
                    Some(ContractKind::ProxyAdmin)
                ) {
                    return Err(LedgerError::InvalidInput(
                        "ledger proxy admin address is not a proxy admin".into(),
                    ));
                }
                self.contracts.insert(
                    address,
                    ContractState {
                        code: LEDGER_CODE.to_vec(),
                        owner: *owner,
                        kind: ContractKind::LedgerHost,
                        config: BTreeMap::new(),
                    },
                );
                self.proxies.insert(
                    address,
                    ProxyState {
                        implementation: address,
                        admin: *proxy_admin,
                    },
                );
                self.ledgers.insert(address, Ledger::new(address, *owner));
            }
            CreateData::Safe { owners, threshold } => {
                if owners.is_empty() || *threshold == 0 || *threshold as usize > owners.len() {
                    return Err(LedgerError::InvalidInput(
                        "safe threshold must be between 1 and the owner count".into(),
                    ));
                }
                let mut distinct = owners.clone();
                distinct.sort();
                distinct.dedup();
                if distinct.len() != owners.len() {
                    return Err(LedgerError::InvalidInput("safe owners must be distinct".into()));
                }
                self.contracts.insert(
                    address,
                    ContractState {
                        code: SAFE_CODE.to_vec(),
                        owner: Address::ZERO,
                        kind: ContractKind::Safe(SafeState {
                            owners: owners.clone(),
                            threshold: *threshold,
                            nonce: 0,
                        }),
                        config: BTreeMap::new(),
                    },
                );
            }
        }
        Ok(())
    }

    fn execute_ledger_call(
        &mut self,
        caller: Address,
        target: Address,
        call: &LedgerCall,
    ) -> Result<(), LedgerError> {
        // The ledger is taken out of the map while executing so it can borrow
        // the rest of the chain as its environment.
        let mut ledger = self
            .ledgers
            .remove(&target)
            .ok_or_else(|| LedgerError::NotFound(format!("no ledger at {target}")))?;
        let result = {
            let mut env = LedgerEnv {
                chain: self,
                ledger: target,
            };
            ledger.execute(&mut env, caller, call)
        };
        self.ledgers.insert(target, ledger);
        result
    }

    fn execute_contract_call(
        &mut self,
        caller: Address,
        target: Address,
        call: &ContractCall,
    ) -> Result<(), LedgerError> {
        let contract = self.contracts.get_mut(&target).ok_or(LedgerError::CallFailed {
            target,
            reason: "no contract at address".into(),
        })?;
        match call.method.as_str() {
            "transferOwnership" => {
                let new_owner = call
                    .args
                    .first()
                    .and_then(|a| Address::from_hex(a).ok())
                    .ok_or(LedgerError::CallFailed {
                        target,
                        reason: "transferOwnership expects an address argument".into(),
                    })?;
                if contract.owner != caller {
                    return Err(LedgerError::CallFailed {
                        target,
                        reason: "caller is not the owner".into(),
                    });
                }
                contract.owner = new_owner;
            }
            _ => {
                contract
                    .config
                    .insert(call.method.clone(), call.args.join(","));
            }
        }
        Ok(())
    }

    fn execute_safe_transaction(
        &mut self,
        safe: Address,
        target: Address,
        data: &[u8],
        signatures: &[crate::wire::SafeSignature],
    ) -> Result<(), LedgerError> {
        let state = match self.contracts.get(&safe).map(|c| &c.kind) {
            Some(ContractKind::Safe(state)) => state.clone(),
            _ => {
                return Err(LedgerError::NotFound(format!(
                    "no multisignature owner at {safe}"
                )))
            }
        };

        if (signatures.len() as u32) < state.threshold {
            return Err(LedgerError::PermissionDenied(format!(
                "{} signatures below threshold {}",
                signatures.len(),
                state.threshold
            )));
        }
        let digest = call_digest(self.chain_id, safe, state.nonce, target, data);
        let mut previous: Option<Address> = None;
        for signature in signatures {
            if let Some(prev) = previous {
                if signature.signer <= prev {
                    return Err(LedgerError::InvalidInput(
                        "signatures must be sorted by signer ascending".into(),
                    ));
                }
            }
            previous = Some(signature.signer);
            if !state.owners.contains(&signature.signer) {
                return Err(LedgerError::PermissionDenied(format!(
                    "{} is not a safe owner",
                    signature.signer
                )));
            }
            if signature.data != dev_signature(signature.signer, &digest) {
                return Err(LedgerError::PermissionDenied(format!(
                    "invalid signature from {}",
                    signature.signer
                )));
            }
        }

        if let Some(contract) = self.contracts.get_mut(&safe) {
            if let ContractKind::Safe(state) = &mut contract.kind {
                state.nonce += 1;
            }
        }

        // The inner call executes with the authority of the safe itself.
        if self.ledgers.contains_key(&target) {
            let call =
                LedgerCall::decode(data).map_err(|e| LedgerError::InvalidInput(e.to_string()))?;
            self.execute_ledger_call(safe, target, &call)
        } else {
            let call =
                ContractCall::decode(data).map_err(|e| LedgerError::InvalidInput(e.to_string()))?;
            self.execute_contract_call(safe, target, &call)
        }
    }

    /// Serve a read query against a contract.
    pub fn query(&self, to: Address, query: &Query) -> Result<QueryResponse, LedgerError> {
        if let Some(ledger) = self.ledgers.get(&to) {
            if let Query::GetProposedAbstractContract(index) = query {
                return match ledger.get_proposed_abstract_contract(*index) {
                    Some(proposal) => Ok(QueryResponse::AbstractProposal {
                        id: proposal.id.clone(),
                        address: proposal.address,
                    }),
                    None => Err(LedgerError::NotFound(format!(
                        "no proposed abstract contract at index {index}"
                    ))),
                };
            }
            if let Some(response) = Self::ledger_query(ledger, query) {
                return Ok(response);
            }
        }
        match query {
            Query::ContractOwner => {
                let contract = self
                    .contracts
                    .get(&to)
                    .ok_or_else(|| LedgerError::NotFound(format!("no contract at {to}")))?;
                Ok(QueryResponse::Address(contract.owner))
            }
            Query::ProxyImplementation => {
                let proxy = self
                    .proxies
                    .get(&to)
                    .ok_or_else(|| LedgerError::NotFound(format!("{to} is not a proxy")))?;
                Ok(QueryResponse::Address(proxy.implementation))
            }
            Query::ProxyAdminOf(proxy) => {
                let state = self
                    .proxies
                    .get(proxy)
                    .ok_or_else(|| LedgerError::NotFound(format!("{proxy} is not a proxy")))?;
                if state.admin != to {
                    return Err(LedgerError::NotFound(format!(
                        "{to} is not the admin of {proxy}"
                    )));
                }
                Ok(QueryResponse::Address(state.admin))
            }
            Query::SafeOwners | Query::SafeThreshold | Query::SafeNonce => {
                let state = match self.contracts.get(&to).map(|c| &c.kind) {
                    Some(ContractKind::Safe(state)) => state,
                    _ => {
                        return Err(LedgerError::NotFound(format!(
                            "no multisignature owner at {to}"
                        )))
                    }
                };
                Ok(match query {
                    Query::SafeOwners => QueryResponse::Addresses(state.owners.clone()),
                    Query::SafeThreshold => QueryResponse::U32(state.threshold),
                    _ => QueryResponse::U64(state.nonce),
                })
            }
            _ => Err(LedgerError::NotFound(format!("no ledger at {to}"))),
        }
    }

    fn ledger_query(ledger: &Ledger, query: &Query) -> Option<QueryResponse> {
        let response = match query {
            Query::Nonce => QueryResponse::U64(ledger.nonce()),
            Query::Version => QueryResponse::Str(ledger.version().to_string()),
            Query::Owner => QueryResponse::Address(ledger.owner()),
            Query::AdoptedContractAddresses(id) => {
                QueryResponse::Address(ledger.adopted_contract_addresses(id))
            }
            Query::GetProxies => QueryResponse::Addresses(ledger.get_proxies().to_vec()),
            Query::AdoptedContractByProxy(proxy) => {
                match ledger.adopted_contracts_by_proxy_address(*proxy) {
                    Some(record) => QueryResponse::AdoptedContract {
                        id: record.id.clone(),
                        proxy_admin: record.proxy_admin,
                        upgrade_address: record.upgrade_address.unwrap_or(Address::ZERO),
                        encoded_call: record.encoded_call.clone().unwrap_or_default(),
                    },
                    None => QueryResponse::AdoptedContract {
                        id: String::new(),
                        proxy_admin: Address::ZERO,
                        upgrade_address: Address::ZERO,
                        encoded_call: Vec::new(),
                    },
                }
            }
            Query::GetProposedAbstractContractsLength => {
                QueryResponse::U64(ledger.get_proposed_abstract_contracts_length())
            }
            Query::GetAbstractContractAddress(id) => {
                QueryResponse::Address(ledger.get_abstract_contract_address(id))
            }
            Query::GetAbstractContractIdHashes => {
                QueryResponse::Hashes(ledger.get_abstract_contract_id_hashes().to_vec())
            }
            Query::AbstractContractByIdHash(hash) => {
                match ledger.abstract_contracts_by_id_hash(*hash) {
                    Some(entry) => QueryResponse::AbstractProposal {
                        id: entry.id.clone(),
                        address: entry.address,
                    },
                    None => QueryResponse::None,
                }
            }
            Query::GetProxiesWithPendingChanges => {
                QueryResponse::Addresses(ledger.get_proxies_with_pending_changes())
            }
            Query::GetPendingUpgradeAddress(proxy) => {
                QueryResponse::Address(ledger.get_pending_upgrade_address(*proxy))
            }
            Query::GetPendingCallData(proxy) => {
                QueryResponse::Bytes(ledger.get_pending_call_data(*proxy))
            }
            Query::GetUpgradeProposers => {
                QueryResponse::Addresses(ledger.get_upgrade_proposers().to_vec())
            }
            _ => return None,
        };
        Some(response)
    }
}

struct LedgerEnv<'a> {
    chain: &'a mut Chain,
    ledger: Address,
}

impl ChainEnv for LedgerEnv<'_> {
    fn is_contract(&self, address: Address) -> bool {
        !self.chain.code_at(address).is_empty()
    }

    fn contract_owner(&self, address: Address) -> Result<Address, LedgerError> {
        self.chain
            .contracts
            .get(&address)
            .map(|c| c.owner)
            .ok_or(LedgerError::CallFailed {
                target: address,
                reason: "no contract at address".into(),
            })
    }

    fn admin_of_proxy(&self, proxy_admin: Address, proxy: Address) -> Result<Address, LedgerError> {
        if !matches!(
            self.chain.contracts.get(&proxy_admin).map(|c| &c.kind),
            Some(ContractKind::ProxyAdmin)
        ) {
            return Err(LedgerError::CallFailed {
                target: proxy_admin,
                reason: "not a proxy admin".into(),
            });
        }
        self.chain
            .proxies
            .get(&proxy)
            .map(|p| p.admin)
            .ok_or(LedgerError::CallFailed {
                target: proxy,
                reason: "not a proxy".into(),
            })
    }

    fn proxy_implementation(&self, proxy: Address) -> Result<Address, LedgerError> {
        self.chain
            .proxies
            .get(&proxy)
            .map(|p| p.implementation)
            .ok_or(LedgerError::CallFailed {
                target: proxy,
                reason: "not a proxy".into(),
            })
    }

    fn upgrade_proxy(
        &mut self,
        proxy_admin: Address,
        proxy: Address,
        implementation: Address,
    ) -> Result<(), LedgerError> {
        if self.contract_owner(proxy_admin)? != self.ledger {
            return Err(LedgerError::CallFailed {
                target: proxy_admin,
                reason: "caller is not the owner".into(),
            });
        }
        if !self.is_contract(implementation) {
            return Err(LedgerError::CallFailed {
                target: implementation,
                reason: "implementation is not a contract".into(),
            });
        }
        let state = self
            .chain
            .proxies
            .get_mut(&proxy)
            .ok_or(LedgerError::CallFailed {
                target: proxy,
                reason: "not a proxy".into(),
            })?;
        if state.admin != proxy_admin {
            return Err(LedgerError::CallFailed {
                target: proxy,
                reason: "proxy admin mismatch".into(),
            });
        }
        state.implementation = implementation;
        Ok(())
    }

    fn change_proxy_admin(
        &mut self,
        proxy_admin: Address,
        proxy: Address,
        new_admin: Address,
    ) -> Result<(), LedgerError> {
        if self.contract_owner(proxy_admin)? != self.ledger {
            return Err(LedgerError::CallFailed {
                target: proxy_admin,
                reason: "caller is not the owner".into(),
            });
        }
        if !matches!(
            self.chain.contracts.get(&new_admin).map(|c| &c.kind),
            Some(ContractKind::ProxyAdmin)
        ) {
            return Err(LedgerError::CallFailed {
                target: new_admin,
                reason: "new admin is not a proxy admin".into(),
            });
        }
        let state = self
            .chain
            .proxies
            .get_mut(&proxy)
            .ok_or(LedgerError::CallFailed {
                target: proxy,
                reason: "not a proxy".into(),
            })?;
        if state.admin != proxy_admin {
            return Err(LedgerError::CallFailed {
                target: proxy,
                reason: "proxy admin mismatch".into(),
            });
        }
        state.admin = new_admin;
        Ok(())
    }

    fn execute_call(&mut self, target: Address, data: &[u8]) -> Result<(), LedgerError> {
        let call = ContractCall::decode(data).map_err(|_| LedgerError::CallFailed {
            target,
            reason: "malformed call data".into(),
        })?;
        self.chain.execute_contract_call(self.ledger, target, &call)
    }

    fn transfer_contract_ownership(
        &mut self,
        target: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        let contract = self
            .chain
            .contracts
            .get_mut(&target)
            .ok_or(LedgerError::CallFailed {
                target,
                reason: "no contract at address".into(),
            })?;
        if contract.owner != self.ledger {
            return Err(LedgerError::CallFailed {
                target,
                reason: "caller is not the owner".into(),
            });
        }
        contract.owner = new_owner;
        Ok(())
    }
}
