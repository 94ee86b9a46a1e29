//! Cryptographic primitives for schemas, issuers, and submissions.

use crate::types::{AccountAddress, IssuerHash, SignatureBytes, H256};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};

type Blake2b256 = Blake2b<U32>;

/// Compute the BLAKE2b hash of data with a 32-byte output.
pub fn blake2b_256(data: &[u8]) -> H256 {
    let hash = Blake2b256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    H256(out)
}

/// Derive an issuer's identity from its name.
pub fn issuer_hash(name: &str) -> IssuerHash {
    blake2b_256(name.as_bytes())
}

/// Render a verifying key as a ledger account address.
pub fn address_from_key(key: &VerifyingKey) -> AccountAddress {
    AccountAddress(format!("0x{}", hex::encode(key.as_bytes())))
}

/// Parse a ledger account address back into its verifying key.
///
/// Returns `None` when the address is not a `0x`-prefixed Ed25519 public key.
pub fn key_from_address(address: &AccountAddress) -> Option<VerifyingKey> {
    let digits = address.as_str().strip_prefix("0x")?;
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes).ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

/// Verify an Ed25519 signature made by the account at `address`.
pub fn verify(address: &AccountAddress, message: &[u8], signature: &SignatureBytes) -> bool {
    use ed25519_dalek::Verifier;

    let Some(key) = key_from_address(address) else {
        return false;
    };
    let signature = Signature::from_bytes(signature.as_ref());
    key.verify(message, &signature).is_ok()
}

/// A signer that can create Ed25519 signatures.
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    /// Create a new signer from a signing key.
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Generate a new random signing key.
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> SignatureBytes {
        use ed25519_dalek::Signer as _;
        SignatureBytes(self.signing_key.sign(message).to_bytes())
    }

    /// Get the verifying (public) key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The account address this signer controls.
    pub fn address(&self) -> AccountAddress {
        address_from_key(&self.verifying_key())
    }
}
