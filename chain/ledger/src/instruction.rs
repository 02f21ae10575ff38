//! Instructions and the account metas that scope them
//!
//! The meta list is the security boundary: the runtime hands a program
//! exactly the accounts its instruction names, in exactly that order, with
//! exactly the privileges the transaction granted. Programs never reach
//! ledger state any other way.

use serde::{Deserialize, Serialize};
use types::keys::Address;

/// One account an instruction touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub address: Address,
    /// Transaction carries (or a calling program proves) a signature.
    pub is_signer: bool,
    /// The program may change the account.
    pub is_writable: bool,
}

impl AccountMeta {
    /// Writable, signature required.
    pub fn signer(address: Address) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable: true,
        }
    }

    /// Signature required, no writes.
    pub fn readonly_signer(address: Address) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable: false,
        }
    }

    /// Writable, no signature.
    pub fn writable(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: true,
        }
    }

    /// Read-only.
    pub fn readonly(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: false,
        }
    }
}

/// A single program invocation: which program, which accounts, what bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Address, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}
