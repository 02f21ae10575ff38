//! Deterministic derived addresses
//!
//! A derived address is the SHA-256 digest of its seeds, the deriving
//! program's id, and a domain tag, accepted only when the digest is not a
//! valid ed25519 point. Off-curve means no keypair can ever sign for the
//! address; the only authority over it is a program presenting the matching
//! seeds at execution time. That property is what lets a program hold
//! custody of accounts nobody else can touch.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use types::keys::Address;

use crate::errors::DeriveError;

/// Most seeds one derivation may combine, the salt included.
pub const MAX_SEEDS: usize = 16;

/// Longest single seed, in bytes.
pub const MAX_SEED_LEN: usize = 32;

const DERIVE_TAG: &[u8] = b"DerivedAddress";
const PROGRAM_TAG: &[u8] = b"ProgramAddress";

/// True when no ed25519 keypair can produce signatures for `address`.
pub fn is_off_curve(address: &Address) -> bool {
    VerifyingKey::from_bytes(address.as_bytes()).is_err()
}

/// Derive the address for `seeds` under `program_id`.
///
/// Fails when a seed violates the length caps, or when the digest lands on
/// the curve. Callers that need a guaranteed result scan with
/// [`find_derived_address`] and persist the salt it returns.
pub fn derive_address(seeds: &[&[u8]], program_id: &Address) -> Result<Address, DeriveError> {
    if seeds.len() > MAX_SEEDS {
        return Err(DeriveError::TooManySeeds {
            count: seeds.len(),
            max: MAX_SEEDS,
        });
    }
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(DeriveError::SeedTooLong {
                len: seed.len(),
                max: MAX_SEED_LEN,
            });
        }
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(DERIVE_TAG);
    let address = Address::new(hasher.finalize().into());

    if is_off_curve(&address) {
        Ok(address)
    } else {
        Err(DeriveError::OnCurve)
    }
}

/// Find the first off-curve derivation for `seeds`, scanning a one-byte
/// salt downward from 255. Returns the address and the salt that produced
/// it; re-deriving with the salt appended as the final seed reproduces the
/// address exactly.
///
/// # Panics
/// Panics if no salt yields an off-curve digest, which would take roughly
/// 2^256 bad luck. `seeds` must leave room for the salt under [`MAX_SEEDS`].
pub fn find_derived_address(seeds: &[&[u8]], program_id: &Address) -> (Address, u8) {
    for salt in (0..=u8::MAX).rev() {
        let salt_seed = [salt];
        let mut salted: Vec<&[u8]> = seeds.to_vec();
        salted.push(&salt_seed);
        if let Ok(address) = derive_address(&salted, program_id) {
            return (address, salt);
        }
    }
    panic!("no viable salt for derived address");
}

/// The id a program is registered under, derived from its name alone.
pub fn program_address(name: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(PROGRAM_TAG);
    hasher.update(name.as_bytes());
    Address::new(hasher.finalize().into())
}
