//! Escrow error taxonomy.
//!
//! Every rejection the program can produce maps to one of five stable
//! codes, carried across the program boundary as a custom program error
//! so clients can recover the variant from a transaction status.

use ledger::errors::ProgramError;
use thiserror::Error;

/// First custom code; escrow codes occupy 6000..=6004.
pub const ERROR_CODE_BASE: u32 = 6000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowError {
    /// The funding leg could not be covered in full.
    #[error("insufficient funds for the requested amount")]
    InsufficientFunds,

    /// A live offer already occupies the derived address for this id.
    #[error("offer address is already in use")]
    AddressAlreadyInUse,

    /// No live offer record at the derived address.
    #[error("offer record not found")]
    RecordNotFound,

    /// A supplied account disagrees with the offer record.
    #[error("account does not match the offer record")]
    AssetMismatch,

    /// Zero amounts, or the two assets are the same.
    #[error("malformed offer arguments")]
    MalformedArguments,
}

impl EscrowError {
    /// Stable wire code for this variant.
    pub const fn code(&self) -> u32 {
        match self {
            EscrowError::InsufficientFunds => ERROR_CODE_BASE,
            EscrowError::AddressAlreadyInUse => ERROR_CODE_BASE + 1,
            EscrowError::RecordNotFound => ERROR_CODE_BASE + 2,
            EscrowError::AssetMismatch => ERROR_CODE_BASE + 3,
            EscrowError::MalformedArguments => ERROR_CODE_BASE + 4,
        }
    }

    /// Recover the variant from a wire code.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            6000 => Some(EscrowError::InsufficientFunds),
            6001 => Some(EscrowError::AddressAlreadyInUse),
            6002 => Some(EscrowError::RecordNotFound),
            6003 => Some(EscrowError::AssetMismatch),
            6004 => Some(EscrowError::MalformedArguments),
            _ => None,
        }
    }
}

impl From<EscrowError> for ProgramError {
    fn from(error: EscrowError) -> Self {
        ProgramError::Custom {
            code: error.code(),
            message: error.to_string(),
        }
    }
}
