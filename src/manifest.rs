//! Declared contract configuration.
//!
//! The manifest is the operator's statement of what the fleet should look
//! like: an ordered list of contract entries, each naming an id, a build
//! class, and whether the contract is abstract (implementation-only, no
//! proxy) and/or deterministically deployed. Reconciliation diffs this
//! declaration against the ledger.

use crate::error::OrchestratorError;
use crate::types::{parse_hash, Hash, EMPTY_SALT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Deterministic deployment request: a bare flag (zero salt) or a fixed
/// 32-byte hex salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeterministicSpec {
    Flag(bool),
    Salt(String),
}

/// One declared contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEntry {
    pub id: String,

    /// Build class; defaults to the id.
    #[serde(default)]
    pub class_name: Option<String>,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub deterministic: Option<DeterministicSpec>,

    #[serde(default)]
    pub constructor_args: Vec<String>,
}

impl ContractEntry {
    pub fn class_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or(&self.id)
    }

    pub fn is_deterministic(&self) -> bool {
        !matches!(
            self.deterministic,
            None | Some(DeterministicSpec::Flag(false))
        )
    }

    /// Salt for deterministic deployment, if requested.
    pub fn salt(&self) -> Result<Option<Hash>, OrchestratorError> {
        match &self.deterministic {
            None | Some(DeterministicSpec::Flag(false)) => Ok(None),
            Some(DeterministicSpec::Flag(true)) => Ok(Some(EMPTY_SALT)),
            Some(DeterministicSpec::Salt(salt)) => parse_hash(salt).map(Some).map_err(|_| {
                OrchestratorError::InvalidInput(format!(
                    "contract {}: salt must be a 0x-prefixed 32 byte hex string",
                    self.id
                ))
            }),
        }
    }
}

/// The declared contract list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, OrchestratorError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Manifest(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, OrchestratorError> {
        let manifest: Manifest = toml::from_str(raw)
            .map_err(|e| OrchestratorError::Manifest(format!("failed to parse manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn get(&self, id: &str) -> Option<&ContractEntry> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        let mut seen = HashSet::new();
        for entry in &self.contracts {
            if entry.id.is_empty() {
                return Err(OrchestratorError::Manifest(
                    "contract id must not be empty".into(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(OrchestratorError::Manifest(format!(
                    "duplicate contract id {}",
                    entry.id
                )));
            }
            if entry.is_deterministic() && !entry.is_abstract {
                return Err(OrchestratorError::Manifest(format!(
                    "contract {} is deterministic but not abstract - only both or neither are supported",
                    entry.id
                )));
            }
            if !entry.constructor_args.is_empty() && !entry.is_abstract {
                return Err(OrchestratorError::Manifest(format!(
                    "contract {} has constructor args but is not abstract, this is not supported",
                    entry.id
                )));
            }
            entry.salt()?;
        }
        Ok(())
    }
}
