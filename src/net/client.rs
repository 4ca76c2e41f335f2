//! Typed read access to a deployed ledger over the network seam.

use crate::error::OrchestratorError;
use crate::net::Network;
use crate::types::{Address, Bytes, Hash};
use crate::wire::{Query, QueryResponse};

/// View of an adopted contract record as returned over the wire. Absent
/// records come back with empty fields rather than an error, mirroring the
/// ledger's own read surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoptedContractView {
    pub id: String,
    pub proxy_admin: Address,
    pub upgrade_address: Address,
    pub encoded_call: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractProposalView {
    pub id: String,
    pub address: Address,
}

/// Read client bound to a ledger address.
pub struct LedgerClient<'a> {
    network: &'a dyn Network,
    address: Address,
}

impl<'a> LedgerClient<'a> {
    pub fn new(network: &'a dyn Network, address: Address) -> Self {
        Self { network, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn network(&self) -> &'a dyn Network {
        self.network
    }

    async fn query(&self, query: Query) -> Result<QueryResponse, OrchestratorError> {
        self.query_at(self.address, query).await
    }

    async fn query_at(
        &self,
        to: Address,
        query: Query,
    ) -> Result<QueryResponse, OrchestratorError> {
        let raw = self.network.call(to, &query.encode()).await?;
        QueryResponse::decode(&raw)
    }

    pub async fn nonce(&self) -> Result<u64, OrchestratorError> {
        expect_u64(self.query(Query::Nonce).await?)
    }

    pub async fn version(&self) -> Result<String, OrchestratorError> {
        match self.query(Query::Version).await? {
            QueryResponse::Str(s) => Ok(s),
            other => Err(unexpected(other)),
        }
    }

    pub async fn owner(&self) -> Result<Address, OrchestratorError> {
        expect_address(self.query(Query::Owner).await?)
    }

    pub async fn adopted_contract_addresses(
        &self,
        id: &str,
    ) -> Result<Address, OrchestratorError> {
        expect_address(
            self.query(Query::AdoptedContractAddresses(id.to_string()))
                .await?,
        )
    }

    pub async fn get_proxies(&self) -> Result<Vec<Address>, OrchestratorError> {
        expect_addresses(self.query(Query::GetProxies).await?)
    }

    pub async fn adopted_contract_by_proxy(
        &self,
        proxy: Address,
    ) -> Result<AdoptedContractView, OrchestratorError> {
        match self.query(Query::AdoptedContractByProxy(proxy)).await? {
            QueryResponse::AdoptedContract {
                id,
                proxy_admin,
                upgrade_address,
                encoded_call,
            } => Ok(AdoptedContractView {
                id,
                proxy_admin,
                upgrade_address,
                encoded_call,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Walk the append-only abstract proposal queue in order.
    pub async fn proposed_abstract_contracts(
        &self,
    ) -> Result<Vec<AbstractProposalView>, OrchestratorError> {
        let length = expect_u64(
            self.query(Query::GetProposedAbstractContractsLength)
                .await?,
        )?;
        let mut proposals = Vec::with_capacity(length as usize);
        for index in 0..length {
            match self.query(Query::GetProposedAbstractContract(index)).await? {
                QueryResponse::AbstractProposal { id, address } => {
                    proposals.push(AbstractProposalView { id, address })
                }
                other => return Err(unexpected(other)),
            }
        }
        Ok(proposals)
    }

    pub async fn get_abstract_contract_address(
        &self,
        id: &str,
    ) -> Result<Address, OrchestratorError> {
        expect_address(
            self.query(Query::GetAbstractContractAddress(id.to_string()))
                .await?,
        )
    }

    pub async fn get_abstract_contract_id_hashes(&self) -> Result<Vec<Hash>, OrchestratorError> {
        match self.query(Query::GetAbstractContractIdHashes).await? {
            QueryResponse::Hashes(hashes) => Ok(hashes),
            other => Err(unexpected(other)),
        }
    }

    pub async fn abstract_contract_by_id_hash(
        &self,
        hash: Hash,
    ) -> Result<Option<AbstractProposalView>, OrchestratorError> {
        match self.query(Query::AbstractContractByIdHash(hash)).await? {
            QueryResponse::AbstractProposal { id, address } => {
                Ok(Some(AbstractProposalView { id, address }))
            }
            QueryResponse::None => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_proxies_with_pending_changes(
        &self,
    ) -> Result<Vec<Address>, OrchestratorError> {
        expect_addresses(self.query(Query::GetProxiesWithPendingChanges).await?)
    }

    pub async fn get_pending_upgrade_address(
        &self,
        proxy: Address,
    ) -> Result<Address, OrchestratorError> {
        expect_address(self.query(Query::GetPendingUpgradeAddress(proxy)).await?)
    }

    pub async fn get_pending_call_data(&self, proxy: Address) -> Result<Bytes, OrchestratorError> {
        match self.query(Query::GetPendingCallData(proxy)).await? {
            QueryResponse::Bytes(bytes) => Ok(bytes),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_upgrade_proposers(&self) -> Result<Vec<Address>, OrchestratorError> {
        expect_addresses(self.query(Query::GetUpgradeProposers).await?)
    }

    // Generic contract reads, routed through the same query surface.

    pub async fn contract_owner(&self, address: Address) -> Result<Address, OrchestratorError> {
        expect_address(self.query_at(address, Query::ContractOwner).await?)
    }

    pub async fn proxy_implementation(
        &self,
        proxy: Address,
    ) -> Result<Address, OrchestratorError> {
        expect_address(self.query_at(proxy, Query::ProxyImplementation).await?)
    }

    pub async fn safe_owners(&self, safe: Address) -> Result<Vec<Address>, OrchestratorError> {
        expect_addresses(self.query_at(safe, Query::SafeOwners).await?)
    }

    pub async fn safe_threshold(&self, safe: Address) -> Result<u32, OrchestratorError> {
        match self.query_at(safe, Query::SafeThreshold).await? {
            QueryResponse::U32(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn safe_nonce(&self, safe: Address) -> Result<u64, OrchestratorError> {
        expect_u64(self.query_at(safe, Query::SafeNonce).await?)
    }
}

fn expect_address(response: QueryResponse) -> Result<Address, OrchestratorError> {
    match response {
        QueryResponse::Address(address) => Ok(address),
        other => Err(unexpected(other)),
    }
}

fn expect_addresses(response: QueryResponse) -> Result<Vec<Address>, OrchestratorError> {
    match response {
        QueryResponse::Addresses(addresses) => Ok(addresses),
        other => Err(unexpected(other)),
    }
}

fn expect_u64(response: QueryResponse) -> Result<u64, OrchestratorError> {
    match response {
        QueryResponse::U64(value) => Ok(value),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: QueryResponse) -> OrchestratorError {
    OrchestratorError::Network(format!("unexpected query response: {response:?}"))
}
