//! Build artifact access and content identity.
//!
//! The build system is an external collaborator; this module only consumes
//! its output: per-class JSON artifacts with creation and runtime bytecode.
//! Content identity is the BLAKE3 hash of the runtime code with its trailing
//! metadata section stripped, so rebuilds that only change embedded metadata
//! do not register as code changes.

use crate::error::OrchestratorError;
use crate::types::{Bytes, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Build output for one contract class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub class_name: String,
    #[serde(with = "hex_bytes")]
    pub bytecode: Bytes,
    #[serde(with = "hex_bytes")]
    pub deployed_bytecode: Bytes,
}

impl Artifact {
    /// Metadata-stripped hash of the runtime code.
    pub fn code_hash(&self) -> Hash {
        stripped_code_hash(&self.deployed_bytecode)
    }
}

/// Hash runtime code with its metadata section removed.
///
/// The metadata section is suffix-encoded: the last two bytes are the
/// big-endian length of the section that precedes them. Code without a
/// plausible suffix is hashed whole.
pub fn stripped_code_hash(code: &[u8]) -> Hash {
    let effective = match code {
        [.., hi, lo] => {
            let metadata_len = u16::from_be_bytes([*hi, *lo]) as usize + 2;
            if metadata_len <= code.len() {
                &code[..code.len() - metadata_len]
            } else {
                code
            }
        }
        _ => code,
    };
    *blake3::hash(effective).as_bytes()
}

/// Source of build artifacts, keyed by contract class name.
pub trait ArtifactStore {
    fn artifact(&self, class_name: &str) -> Result<Artifact, OrchestratorError>;
}

/// Artifacts laid out as `<ClassName>.json` files under a build directory.
pub struct DirArtifacts {
    root: PathBuf,
}

impl DirArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactStore for DirArtifacts {
    fn artifact(&self, class_name: &str) -> Result<Artifact, OrchestratorError> {
        let wanted = format!("{class_name}.json");
        for entry in WalkDir::new(&self.root).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_file() && entry.file_name().to_string_lossy() == wanted {
                let raw = std::fs::read(entry.path()).map_err(|e| {
                    OrchestratorError::Artifact(format!(
                        "failed to read {}: {e}",
                        entry.path().display()
                    ))
                })?;
                return serde_json::from_slice(&raw).map_err(|e| {
                    OrchestratorError::Artifact(format!(
                        "failed to parse {}: {e}",
                        entry.path().display()
                    ))
                });
            }
        }
        Err(OrchestratorError::Artifact(format!(
            "no artifact for class {class_name} under {}",
            self.root.display()
        )))
    }
}

/// In-memory artifact store for tests and rehearsal runs.
#[derive(Default)]
pub struct MemoryArtifacts {
    artifacts: HashMap<String, Artifact>,
}

impl MemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_name: &str, bytecode: &[u8], deployed_bytecode: &[u8]) {
        self.artifacts.insert(
            class_name.to_string(),
            Artifact {
                class_name: class_name.to_string(),
                bytecode: bytecode.to_vec(),
                deployed_bytecode: deployed_bytecode.to_vec(),
            },
        );
    }
}

impl ArtifactStore for MemoryArtifacts {
    fn artifact(&self, class_name: &str) -> Result<Artifact, OrchestratorError> {
        self.artifacts
            .get(class_name)
            .cloned()
            .ok_or_else(|| OrchestratorError::Artifact(format!("no artifact for class {class_name}")))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        hex::decode(raw.strip_prefix("0x").unwrap_or(&raw)).map_err(serde::de::Error::custom)
    }
}
