//! Maker and taker client over an in-process ledger.
//!
//! Every send follows the same contract: build the transaction against
//! the freshest blockhash, submit, advance a slot, then read the
//! recorded status. Only expiry is retried, and each retry rebuilds
//! from current state; a semantic rejection is final and surfaces with
//! the transaction logs attached.

use ledger::errors::{LedgerError, ProgramError};
use ledger::runtime::{Ledger, TransactionStatus};
use ledger::signing::Keypair;
use ledger::transaction::{Message, Transaction};
use thiserror::Error;
use tracing::{debug, warn};
use types::keys::Address;

use crate::address::offer_address;
use crate::error::EscrowError;
use crate::instruction;
use crate::state::Offer;

/// Attempts per send before giving up on expiry.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No live record at the derived address for `(maker, id)`.
    #[error("no live offer for maker {maker} with id {id}")]
    OfferNotFound { maker: Address, id: u64 },

    /// The ledger refused the transaction at submission.
    #[error("transaction rejected at submission: {0}")]
    Rejected(#[from] LedgerError),

    /// The transaction executed and failed; retrying would not help.
    #[error("transaction failed: {error}")]
    Failed {
        error: LedgerError,
        logs: Vec<String>,
    },

    /// Every attempt expired before execution.
    #[error("gave up after {attempts} expired attempts")]
    RetriesExhausted { attempts: usize },
}

impl ClientError {
    /// The escrow rejection behind this error, when there is one.
    pub fn escrow_reason(&self) -> Option<EscrowError> {
        match self {
            ClientError::Failed {
                error:
                    LedgerError::Instruction {
                        source: ProgramError::Custom { code, .. },
                        ..
                    },
                ..
            } => EscrowError::from_code(*code),
            _ => None,
        }
    }
}

pub struct EscrowClient {
    max_attempts: usize,
}

impl Default for EscrowClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EscrowClient {
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Lock funds and publish an offer. Returns the record address.
    pub fn create_offer(
        &self,
        ledger: &mut Ledger,
        maker: &Keypair,
        id: u64,
        asset_a: Address,
        asset_b: Address,
        offered_amount_a: u64,
        wanted_amount_b: u64,
    ) -> Result<Address, ClientError> {
        let maker_address = maker.address();
        let (offer, _) = offer_address(&maker_address, id);
        self.send_and_confirm(ledger, |ledger| {
            let ix = instruction::make_offer(
                maker_address,
                id,
                asset_a,
                asset_b,
                offered_amount_a,
                wanted_amount_b,
            );
            Ok(Transaction::new(
                Message::new(ledger.latest_blockhash(), vec![ix]),
                &[maker],
            ))
        })?;
        debug!(%offer, id, "offer created");
        Ok(offer)
    }

    /// Settle an offer as the taker. The record is re-read on every
    /// attempt, so an offer settled by someone else in the meantime
    /// surfaces as `OfferNotFound` instead of a stale settlement.
    pub fn accept_offer(
        &self,
        ledger: &mut Ledger,
        taker: &Keypair,
        maker: Address,
        id: u64,
    ) -> Result<TransactionStatus, ClientError> {
        let taker_address = taker.address();
        let status = self.send_and_confirm(ledger, |ledger| {
            let record = fetch_offer_record(ledger, maker, id)?;
            let ix = instruction::take_offer(
                taker_address,
                maker,
                id,
                record.asset_a,
                record.asset_b,
            );
            Ok(Transaction::new(
                Message::new(ledger.latest_blockhash(), vec![ix]),
                &[taker],
            ))
        })?;
        debug!(id, %maker, "offer settled");
        Ok(status)
    }

    /// Read the live record for `(maker, id)`.
    pub fn fetch_offer(
        &self,
        ledger: &Ledger,
        maker: Address,
        id: u64,
    ) -> Result<Offer, ClientError> {
        fetch_offer_record(ledger, maker, id)
    }

    /// The subset of `ids` that is still live for `maker`.
    pub fn open_offers(&self, ledger: &Ledger, maker: Address, ids: &[u64]) -> Vec<Offer> {
        ids.iter()
            .filter_map(|id| fetch_offer_record(ledger, maker, *id).ok())
            .collect()
    }

    fn send_and_confirm<F>(
        &self,
        ledger: &mut Ledger,
        mut build: F,
    ) -> Result<TransactionStatus, ClientError>
    where
        F: FnMut(&mut Ledger) -> Result<Transaction, ClientError>,
    {
        for attempt in 1..=self.max_attempts {
            let tx = build(ledger)?;
            let hash = ledger.submit(tx)?;
            ledger.advance_slot();
            let status = match ledger.status(&hash) {
                Some(status) => status.clone(),
                None => continue,
            };
            match &status.result {
                Ok(()) => return Ok(status),
                Err(LedgerError::BlockhashExpired { .. }) => {
                    warn!(attempt, tx = %hash, "expired before execution, rebuilding");
                    continue;
                }
                Err(error) => {
                    return Err(ClientError::Failed {
                        error: error.clone(),
                        logs: status.logs.clone(),
                    })
                }
            }
        }
        Err(ClientError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }
}

fn fetch_offer_record(ledger: &Ledger, maker: Address, id: u64) -> Result<Offer, ClientError> {
    let (offer, _) = offer_address(&maker, id);
    let account = ledger
        .account(&offer)
        .ok_or(ClientError::OfferNotFound { maker, id })?;
    if account.owner != crate::id() {
        return Err(ClientError::OfferNotFound { maker, id });
    }
    Offer::unpack(&account.data).map_err(|_| ClientError::OfferNotFound { maker, id })
}
