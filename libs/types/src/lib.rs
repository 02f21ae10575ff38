//! Types library for the settlement ledger
//!
//! This library provides the core type definitions shared by the ledger
//! runtime and the programs that run on it, ensuring type safety and
//! deterministic behavior.
//!
//! # Modules
//! - `keys`: 32-byte addresses (wallets, programs, mints, derived storage)
//! - `numeric`: raw/display amount conversion keyed to mint decimals

// Public modules
pub mod keys;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::keys::*;
    pub use crate::numeric::*;
}
