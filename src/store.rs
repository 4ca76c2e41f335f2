//! Persisted per-network deployment metadata.
//!
//! One small record per target network, keyed `network/key`, holding the
//! addresses that later runs must find again: the deployed ledger and the
//! shared proxy admin. This is what turns deployment into "find or deploy".

use crate::error::OrchestratorError;
use crate::types::Address;
use std::path::Path;

/// Key for the deployed ledger's address.
pub const LEDGER_ADDRESS_KEY: &str = "ledger_address";
/// Key for the shared proxy admin's address.
pub const PROXY_ADMIN_KEY: &str = "proxy_admin_address";

pub struct MetadataStore {
    db: sled::Db,
}

impl MetadataStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        let db = sled::open(path)
            .map_err(|e| OrchestratorError::Store(format!("failed to open metadata store: {e}")))?;
        Ok(Self { db })
    }

    fn record_key(network: &str, key: &str) -> String {
        format!("{network}/{key}")
    }

    pub fn get(&self, network: &str, key: &str) -> Result<Option<String>, OrchestratorError> {
        let value = self
            .db
            .get(Self::record_key(network, key))
            .map_err(|e| OrchestratorError::Store(format!("failed to read metadata: {e}")))?;
        match value {
            Some(raw) => String::from_utf8(raw.to_vec())
                .map(Some)
                .map_err(|e| OrchestratorError::Store(format!("corrupt metadata value: {e}"))),
            None => Ok(None),
        }
    }

    pub fn put(&self, network: &str, key: &str, value: &str) -> Result<(), OrchestratorError> {
        self.db
            .insert(Self::record_key(network, key), value.as_bytes())
            .map_err(|e| OrchestratorError::Store(format!("failed to write metadata: {e}")))?;
        self.db
            .flush()
            .map_err(|e| OrchestratorError::Store(format!("failed to flush metadata: {e}")))?;
        Ok(())
    }

    pub fn get_address(
        &self,
        network: &str,
        key: &str,
    ) -> Result<Option<Address>, OrchestratorError> {
        match self.get(network, key)? {
            Some(raw) => Address::from_hex(&raw).map(Some).map_err(|e| {
                OrchestratorError::Store(format!("corrupt address in metadata: {e}"))
            }),
            None => Ok(None),
        }
    }

    pub fn put_address(
        &self,
        network: &str,
        key: &str,
        address: Address,
    ) -> Result<(), OrchestratorError> {
        self.put(network, key, &address.to_hex())
    }
}
