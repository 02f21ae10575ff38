//! Keypairs and detached transaction signatures
//!
//! Signatures are Ed25519 over the SHA-256 hash of the canonical message
//! bytes. A wallet's address is its verifying key; derived addresses fail
//! [`verify`] unconditionally because they are not valid curve points.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use types::keys::Address;

/// Byte width of a detached signature.
pub const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 keypair controlling a wallet address.
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS entropy source.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a fixed seed. Test fixtures use this for
    /// repeatable addresses.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// The wallet address: the verifying key's bytes.
    pub fn address(&self) -> Address {
        Address::new(self.signing.verifying_key().to_bytes())
    }

    /// Sign `message`, hashing it first.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let hash: [u8; 32] = Sha256::digest(message).into();
        Signature::new(self.signing.sign(&hash).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret half.
        write!(f, "Keypair({:?})", self.address())
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..8])
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify `signature` over `message` for the wallet at `address`.
///
/// Returns false for bad signatures and for addresses that are not valid
/// verifying keys, derived addresses included.
pub fn verify(address: &Address, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(address.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    let hash: [u8; 32] = Sha256::digest(message).into();
    key.verify(&hash, &sig).is_ok()
}
