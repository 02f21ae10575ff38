//! Address derivations for offer records and their vaults.
//!
//! Both are pure functions of public inputs: the maker's address and the
//! offer id fix the record address, and the record address plus the
//! offered asset fix the vault. Anyone can recompute them; nothing about
//! an offer's location needs to be communicated out of band.

use ledger::derive;
use ledger::token;
use types::keys::Address;

/// Seed prefix for offer record addresses.
pub const OFFER_SEED: &[u8] = b"offer";

/// Derived address of the offer record for `(maker, id)`, with the salt
/// that produced it.
pub fn offer_address(maker: &Address, id: u64) -> (Address, u8) {
    derive::find_derived_address(
        &[OFFER_SEED, maker.as_bytes(), &id.to_le_bytes()],
        &crate::id(),
    )
}

/// Address of the vault: the offer record's own holding of `asset_a`.
pub fn vault_address(offer: &Address, asset_a: &Address) -> Address {
    token::holding_address(offer, asset_a).0
}
