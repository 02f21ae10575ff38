//! Escrow Program for Trustless Asset Swaps
//!
//! A maker locks an amount of one asset in a vault and publishes a
//! binding offer naming the amount of another asset wanted in return.
//! Any taker who pays that amount receives the locked funds in the same
//! transaction; nobody holds custody in between, and an offer settles
//! exactly once.
//!
//! # Modules
//! - `address`: Derivations for offer records and vaults
//! - `state`: The persisted offer record
//! - `instruction`: Wire format and instruction builders
//! - `processor`: The on-ledger program
//! - `events`: Events emitted at creation and settlement
//! - `error`: Escrow error taxonomy with stable codes
//! - `client`: Maker/taker client with confirm-and-retry sends
//!
//! # Version
//! v0.1.0 — Initial implementation

use ledger::derive;
use types::keys::Address;

pub mod address;
pub mod client;
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;

/// Address the escrow program is registered under.
pub fn id() -> Address {
    derive::program_address("escrow")
}

/// Escrow ABI version — frozen after release
pub const ESCROW_ABI_VERSION: &str = "1.0.0";
