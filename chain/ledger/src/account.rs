//! Accounts, the address-keyed store, and storage deposits
//!
//! Every persisted entity on the ledger is an [`Account`] in an explicit
//! [`AccountStore`]. Execution receives the store as an argument and reaches
//! accounts no other way, which keeps state transitions testable in memory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::keys::Address;

/// A single ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Balance in lamports, the ledger's native unit.
    pub lamports: u64,
    /// Program-defined payload. Empty for plain wallets.
    pub data: Vec<u8>,
    /// The program allowed to mutate `data` and debit `lamports`.
    pub owner: Address,
}

impl Account {
    /// A data-less account holding only lamports.
    pub fn wallet(lamports: u64, owner: Address) -> Self {
        Self {
            lamports,
            data: Vec::new(),
            owner,
        }
    }

    /// Byte footprint of the payload.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

/// The global account map, keyed by address.
#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: HashMap<Address, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.accounts.get_mut(address)
    }

    pub fn insert(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    pub fn remove(&mut self, address: &Address) -> Option<Account> {
        self.accounts.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Lamports at `address`, zero when vacant.
    pub fn lamports(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.lamports).unwrap_or(0)
    }

    /// Sum of all lamports on the ledger. Conservation checks compare this
    /// across transitions.
    pub fn total_lamports(&self) -> u128 {
        self.accounts.values().map(|a| a.lamports as u128).sum()
    }
}

/// Storage deposit schedule.
///
/// An account must hold the deposit for its byte footprint for as long as it
/// exists; closing the account returns the deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rent {
    /// Deposit charged per stored byte.
    pub lamports_per_byte: u64,
    /// Flat byte overhead counted for every account.
    pub account_overhead: u64,
}

impl Rent {
    /// Deposit required for an account with `data_len` payload bytes.
    pub fn minimum_balance(&self, data_len: usize) -> u64 {
        self.account_overhead
            .saturating_add(data_len as u64)
            .saturating_mul(self.lamports_per_byte)
    }
}

impl Default for Rent {
    fn default() -> Self {
        Self {
            lamports_per_byte: 10,
            account_overhead: 128,
        }
    }
}
