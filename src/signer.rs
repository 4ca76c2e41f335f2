//! Signing seam.
//!
//! Key management is not this crate's business: hardware wallets, mnemonic
//! derivation and remote signers all live behind [`Signer`]. [`KeySigner`] is
//! the development implementation whose signatures the embedded chain accepts.

use crate::error::OrchestratorError;
use crate::types::{Address, Bytes, Hash};
use async_trait::async_trait;

/// An identity that can sign call digests.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_digest(&self, digest: &Hash) -> Result<Bytes, OrchestratorError>;
}

/// Signature scheme of the embedded development chain: a keyed hash binding
/// the signer identity to the digest. Not a real cryptographic signature;
/// production networks verify their own schemes behind [`Signer`].
pub fn dev_signature(signer: Address, digest: &Hash) -> Bytes {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"capstan/dev-signature/v1");
    hasher.update(signer.as_bytes());
    hasher.update(digest);
    hasher.finalize().as_bytes().to_vec()
}

/// Development signer for the embedded chain.
#[derive(Debug, Clone)]
pub struct KeySigner {
    address: Address,
}

impl KeySigner {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Derive a stable address from a seed string.
    pub fn from_seed(seed: &str) -> Self {
        let hash = blake3::hash(seed.as_bytes());
        Self {
            address: Address::from_hash(hash.as_bytes()),
        }
    }
}

#[async_trait]
impl Signer for KeySigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_digest(&self, digest: &Hash) -> Result<Bytes, OrchestratorError> {
        Ok(dev_signature(self.address, digest))
    }
}
