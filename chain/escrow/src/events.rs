//! Events emitted by the escrow program.
//!
//! Events are staged with the write-set: a transaction that aborts emits
//! nothing. Payloads are JSON so off-ledger consumers can decode them
//! without this crate's codecs.

use serde::{Deserialize, Serialize};
use types::keys::Address;

/// An offer went live: the vault is funded and the record is readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCreated {
    pub offer: Address,
    pub id: u64,
    pub maker: Address,
    pub asset_a: Address,
    pub asset_b: Address,
    pub offered_amount_a: u64,
    pub wanted_amount_b: u64,
}

/// An offer settled: both legs executed and the record is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSettled {
    pub offer: Address,
    pub id: u64,
    pub maker: Address,
    pub taker: Address,
    pub asset_a: Address,
    pub asset_b: Address,
    /// Entire vault balance handed to the taker.
    pub settled_amount_a: u64,
    pub paid_amount_b: u64,
}

/// Enum wrapper for all escrow events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    OfferCreated(OfferCreated),
    OfferSettled(OfferSettled),
}

impl EscrowEvent {
    /// Serialize for an event payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode an event payload emitted by this program.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
