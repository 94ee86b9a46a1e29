//! Ed25519 account signer.

use crate::ledger::AccountSigner;
use credentials_core::crypto::{Signer, SigningKey};
use credentials_core::{AccountAddress, SignatureBytes};
use std::fmt;

/// An [`AccountSigner`] backed by an in-memory Ed25519 key.
///
/// The account address is `0x` followed by the hex public key.
pub struct KeypairSigner {
    signer: Signer,
    address: AccountAddress,
}

impl KeypairSigner {
    pub fn new(signing_key: SigningKey) -> Self {
        Self::from_signer(Signer::new(signing_key))
    }

    /// Generate a fresh random account (tests and demos).
    pub fn generate() -> Self {
        Self::from_signer(Signer::generate())
    }

    /// Derive the account from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(&seed))
    }

    fn from_signer(signer: Signer) -> Self {
        let address = signer.address();
        Self { signer, address }
    }
}

impl AccountSigner for KeypairSigner {
    fn address(&self) -> AccountAddress {
        self.address.clone()
    }

    fn sign(&self, payload: &[u8]) -> SignatureBytes {
        self.signer.sign(payload)
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("address", &self.address)
            .finish()
    }
}
