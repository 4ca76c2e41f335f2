//! Wire encoding for ledger calls, contract calls, and read queries.
//!
//! Everything that crosses the network boundary is a bincode-encoded value
//! from this module: transaction payloads (`TxData`), read queries (`Query`)
//! and their responses. Pending call data stored on the ledger is the encoded
//! form of a [`ContractCall`], so the status surface can decode and render it.

use crate::error::OrchestratorError;
use crate::types::{Address, Bytes, Hash};
use serde::{Deserialize, Serialize};

/// A call against the ledger's write surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCall {
    AdoptContract {
        id: String,
        proxy: Address,
        proxy_admin: Address,
    },
    Disown {
        id: String,
        new_owner: Address,
    },
    ProposeUpgrade {
        id: String,
        implementation: Address,
    },
    ProposeCall {
        id: String,
        call_data: Bytes,
    },
    ProposeUpgradeAndCall {
        id: String,
        implementation: Address,
        call_data: Bytes,
    },
    WithdrawChanges {
        id: String,
    },
    ProposeAbstract {
        id: String,
        address: Address,
    },
    WithdrawAllAbstractProposals,
    Upgrade {
        version: String,
        nonce: u64,
    },
    SelfUpgrade {
        implementation: Address,
        proxy_admin: Address,
    },
    Call {
        id: String,
        call_data: Bytes,
    },
    AddUpgradeProposer {
        proposer: Address,
    },
    RemoveUpgradeProposer {
        proposer: Address,
    },
    ChangeProxyAdmin {
        proxy_admin: Address,
        proxy: Address,
        new_admin: Address,
    },
    DisownProxyAdmin {
        proxy_admin: Address,
        new_owner: Address,
    },
    TransferOwnership {
        new_owner: Address,
    },
}

impl LedgerCall {
    pub fn encode(&self) -> Bytes {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, OrchestratorError> {
        decode(data)
    }

    /// Human-readable rendering for confirmation prompts and logs.
    pub fn describe(&self) -> String {
        match self {
            LedgerCall::AdoptContract { id, proxy, .. } => {
                format!("adoptContract({id}, {proxy})")
            }
            LedgerCall::Disown { id, new_owner } => format!("disown({id}, {new_owner})"),
            LedgerCall::ProposeUpgrade { id, implementation } => {
                format!("proposeUpgrade({id}, {implementation})")
            }
            LedgerCall::ProposeCall { id, call_data } => {
                format!("proposeCall({id}, {})", describe_call_data(call_data))
            }
            LedgerCall::ProposeUpgradeAndCall {
                id,
                implementation,
                call_data,
            } => format!(
                "proposeUpgradeAndCall({id}, {implementation}, {})",
                describe_call_data(call_data)
            ),
            LedgerCall::WithdrawChanges { id } => format!("withdrawChanges({id})"),
            LedgerCall::ProposeAbstract { id, address } => {
                format!("proposeAbstract({id}, {address})")
            }
            LedgerCall::WithdrawAllAbstractProposals => "withdrawAllAbstractProposals()".into(),
            LedgerCall::Upgrade { version, nonce } => format!("upgrade({version}, {nonce})"),
            LedgerCall::SelfUpgrade { implementation, .. } => {
                format!("selfUpgrade({implementation})")
            }
            LedgerCall::Call { id, call_data } => {
                format!("call({id}, {})", describe_call_data(call_data))
            }
            LedgerCall::AddUpgradeProposer { proposer } => {
                format!("addUpgradeProposer({proposer})")
            }
            LedgerCall::RemoveUpgradeProposer { proposer } => {
                format!("removeUpgradeProposer({proposer})")
            }
            LedgerCall::ChangeProxyAdmin { proxy, new_admin, .. } => {
                format!("changeProxyAdmin({proxy}, {new_admin})")
            }
            LedgerCall::DisownProxyAdmin {
                proxy_admin,
                new_owner,
            } => format!("disownProxyAdmin({proxy_admin}, {new_owner})"),
            LedgerCall::TransferOwnership { new_owner } => {
                format!("transferOwnership({new_owner})")
            }
        }
    }
}

/// A method call against a managed contract, stored as pending call data and
/// executed by the ledger at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub method: String,
    pub args: Vec<String>,
}

impl ContractCall {
    pub fn new(method: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    pub fn encode(&self) -> Bytes {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, OrchestratorError> {
        decode(data)
    }

    pub fn describe(&self) -> String {
        format!("{}({})", self.method, self.args.join(", "))
    }
}

/// Render pending call data for display, falling back to hex if it does not
/// decode as a [`ContractCall`].
pub fn describe_call_data(data: &[u8]) -> String {
    match ContractCall::decode(data) {
        Ok(call) => call.describe(),
        Err(_) => format!("0x{}", hex::encode(data)),
    }
}

/// Payload of a contract-creation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateData {
    /// A plain ownable contract with the given runtime code.
    Contract {
        code: Bytes,
        constructor_args: Vec<String>,
    },
    /// A proxy admin contract.
    ProxyAdmin,
    /// An upgradeable proxy wired to an implementation and an admin.
    Proxy {
        implementation: Address,
        admin: Address,
        owner: Address,
    },
    /// An upgrade ledger instance, deployed behind a proxy.
    Ledger {
        owner: Address,
        proxy_admin: Address,
    },
    /// A threshold multisignature owner contract.
    Safe {
        owners: Vec<Address>,
        threshold: u32,
    },
}

impl CreateData {
    pub fn encode(&self) -> Bytes {
        encode(self)
    }
}

/// A signature over a quorum call digest, attributed to a signer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSignature {
    pub signer: Address,
    pub data: Bytes,
}

/// Transaction payload variants understood by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxData {
    /// Deploy a contract at a sender/nonce-derived address.
    Create(CreateData),
    /// Deploy through the deterministic deployment proxy; the resulting
    /// address is a pure function of the salt and the creation payload.
    Create2 { salt: Hash, create: CreateData },
    /// The one-shot bootstrap of the deterministic deployment proxy itself.
    DeployDeterministicProxy,
    /// A call on the ledger's write surface.
    Ledger(LedgerCall),
    /// A direct method call on a managed contract.
    Contract(ContractCall),
    /// An aggregated quorum execution through a multisignature owner.
    SafeExec {
        target: Address,
        data: Bytes,
        signatures: Vec<SafeSignature>,
    },
}

impl TxData {
    pub fn encode(&self) -> Bytes {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, OrchestratorError> {
        decode(data)
    }
}

/// A transaction request as handed to the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub value: u128,
    pub data: Bytes,
}

impl TxRequest {
    pub fn new(from: Address, to: Option<Address>, data: TxData) -> Self {
        Self {
            from,
            to,
            value: 0,
            data: data.encode(),
        }
    }
}

/// Receipt returned for an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Address of the contract created by this transaction, if any.
    pub created: Option<Address>,
}

/// Read query against the ledger or any other contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    // Ledger read surface.
    Nonce,
    Version,
    Owner,
    AdoptedContractAddresses(String),
    GetProxies,
    AdoptedContractByProxy(Address),
    GetProposedAbstractContractsLength,
    GetProposedAbstractContract(u64),
    GetAbstractContractAddress(String),
    GetAbstractContractIdHashes,
    AbstractContractByIdHash(Hash),
    GetProxiesWithPendingChanges,
    GetPendingUpgradeAddress(Address),
    GetPendingCallData(Address),
    GetUpgradeProposers,
    // Generic contract reads.
    ContractOwner,
    ProxyImplementation,
    ProxyAdminOf(Address),
    // Multisignature owner reads.
    SafeOwners,
    SafeThreshold,
    SafeNonce,
}

impl Query {
    pub fn encode(&self) -> Bytes {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, OrchestratorError> {
        decode(data)
    }
}

/// Response values for [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResponse {
    Address(Address),
    Addresses(Vec<Address>),
    U64(u64),
    U32(u32),
    Str(String),
    Bytes(Bytes),
    Hashes(Vec<Hash>),
    AbstractProposal { id: String, address: Address },
    AdoptedContract {
        id: String,
        proxy_admin: Address,
        upgrade_address: Address,
        encoded_call: Bytes,
    },
    None,
}

impl QueryResponse {
    pub fn encode(&self) -> Bytes {
        encode(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, OrchestratorError> {
        decode(data)
    }
}

fn encode<T: Serialize>(value: &T) -> Bytes {
    // bincode only fails on unrepresentable types; all wire types are plain data
    bincode::serialize(value).unwrap_or_default()
}

fn decode<'a, T: Deserialize<'a>>(data: &'a [u8]) -> Result<T, OrchestratorError> {
    bincode::deserialize(data)
        .map_err(|e| OrchestratorError::Network(format!("malformed wire payload: {e}")))
}
