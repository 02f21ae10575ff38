//! Deterministic Settlement Ledger
//!
//! This crate implements an in-memory ledger runtime: an explicit
//! address-keyed account store, signed transactions bound to recent
//! blockhashes, slot-ordered execution with atomic per-transaction commit,
//! derived addresses for program custody, and a built-in fungible-token
//! program. Programs plug in through a registry and see ledger state only
//! through the accounts their instructions name.
//!
//! # Modules
//! - `account`: accounts, the address-keyed store, storage deposits
//! - `codec`: little-endian wire codec shared by layouts and arguments
//! - `derive`: seeded, off-curve derived addresses
//! - `errors`: error taxonomy
//! - `instruction`: instructions and account metas
//! - `runtime`: the ledger itself, staged execution, program dispatch
//! - `signing`: keypairs and detached signatures
//! - `token`: built-in fungible-token program
//! - `transaction`: messages, signatures, transaction ids

pub mod account;
pub mod codec;
pub mod derive;
pub mod errors;
pub mod instruction;
pub mod runtime;
pub mod signing;
pub mod token;
pub mod transaction;

/// Runtime ABI version — frozen after release
pub const LEDGER_ABI_VERSION: &str = "1.0.0";
