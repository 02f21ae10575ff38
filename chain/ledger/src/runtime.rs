//! The ledger runtime: ordered blocks, atomic execution, program dispatch
//!
//! Submission verifies signatures and replay up front and queues the
//! transaction; `advance_slot` seals the next block and executes the queue
//! strictly in arrival order, so the ledger is a global total order over
//! state transitions. Each transaction runs against a staged write-set
//! layered over the committed store: every account write, creation,
//! deletion, and emitted event lands in the stage, and the stage commits
//! only if every instruction succeeds. A failed transaction leaves nothing
//! behind but its status and logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};
use types::keys::Address;

use crate::account::{Account, AccountStore, Rent};
use crate::derive;
use crate::errors::{LedgerError, ProgramError};
use crate::instruction::{AccountMeta, Instruction};
use crate::token;
use crate::transaction::{BlockHash, Transaction, TxHash};

/// Owner of plain wallet accounts.
pub fn system_id() -> Address {
    derive::program_address("system")
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for a ledger instance.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Slots a blockhash stays valid after the slot that issued it.
    pub blockhash_validity_slots: u64,
    /// Deepest allowed cross-program call chain, the top level included.
    pub max_call_depth: usize,
    /// Storage deposit schedule.
    pub rent: Rent,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            blockhash_validity_slots: 150,
            max_call_depth: 4,
            rent: Rent::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Programs and execution results
// ---------------------------------------------------------------------------

/// A program executable by the runtime.
///
/// Implementations see only the accounts their instruction names, through
/// the [`InvokeContext`]; there is no other path to ledger state.
pub trait Program {
    fn execute(&self, ctx: &mut InvokeContext<'_, '_>, data: &[u8]) -> Result<(), ProgramError>;
}

/// An event a program emitted during a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub program: Address,
    /// Program-defined encoding; the escrow program writes JSON.
    pub payload: Vec<u8>,
}

/// Outcome of a processed transaction.
#[derive(Debug, Clone)]
pub struct TransactionStatus {
    pub hash: TxHash,
    pub slot: u64,
    pub block_time: DateTime<Utc>,
    pub result: Result<(), LedgerError>,
    /// Kept for failed transactions too; diagnosis needs them.
    pub logs: Vec<String>,
    /// Present only when the transaction committed.
    pub events: Vec<EmittedEvent>,
}

impl TransactionStatus {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

// ---------------------------------------------------------------------------
// Staged write-set
// ---------------------------------------------------------------------------

/// Copy-on-write view over the committed store.
///
/// `None` marks a staged deletion. Nothing reaches the real store until the
/// whole transaction has succeeded.
struct StagedAccounts<'a> {
    base: &'a AccountStore,
    writes: HashMap<Address, Option<Account>>,
}

impl<'a> StagedAccounts<'a> {
    fn new(base: &'a AccountStore) -> Self {
        Self {
            base,
            writes: HashMap::new(),
        }
    }

    fn get(&self, address: &Address) -> Option<Account> {
        match self.writes.get(address) {
            Some(entry) => entry.clone(),
            None => self.base.get(address).cloned(),
        }
    }

    fn set(&mut self, address: Address, account: Account) {
        self.writes.insert(address, Some(account));
    }

    fn delete(&mut self, address: Address) {
        self.writes.insert(address, None);
    }

    fn into_writes(self) -> HashMap<Address, Option<Account>> {
        self.writes
    }
}

// ---------------------------------------------------------------------------
// Invoke context
// ---------------------------------------------------------------------------

/// A program's window onto one instruction.
///
/// Account access is by meta index only; an account the instruction did not
/// name cannot be read or written, which makes the meta list the security
/// boundary for authority checks.
pub struct InvokeContext<'a, 'b> {
    program_id: Address,
    metas: Vec<AccountMeta>,
    staged: &'b mut StagedAccounts<'a>,
    programs: &'b HashMap<Address, Box<dyn Program>>,
    config: &'b LedgerConfig,
    logs: &'b mut Vec<String>,
    events: &'b mut Vec<EmittedEvent>,
    depth: usize,
}

impl<'a, 'b> InvokeContext<'a, 'b> {
    /// Id of the program currently executing.
    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// Number of accounts the instruction names.
    pub fn account_count(&self) -> usize {
        self.metas.len()
    }

    fn meta(&self, index: usize) -> Result<&AccountMeta, ProgramError> {
        self.metas
            .get(index)
            .ok_or(ProgramError::AccountIndexOutOfBounds {
                index,
                provided: self.metas.len(),
            })
    }

    /// Address at `index`.
    pub fn address(&self, index: usize) -> Result<Address, ProgramError> {
        Ok(self.meta(index)?.address)
    }

    /// Whether the transaction, or a calling program via seeds, signed for
    /// the account at `index`.
    pub fn is_signer(&self, index: usize) -> Result<bool, ProgramError> {
        Ok(self.meta(index)?.is_signer)
    }

    /// Error unless the account at `index` signed.
    pub fn require_signer(&self, index: usize) -> Result<(), ProgramError> {
        if !self.is_signer(index)? {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Ok(())
    }

    /// Error unless the account at `index` is writable.
    pub fn require_writable(&self, index: usize) -> Result<(), ProgramError> {
        let meta = self.meta(index)?;
        if !meta.is_writable {
            return Err(ProgramError::AccountNotWritable {
                address: meta.address,
            });
        }
        Ok(())
    }

    /// Current staged state of the account at `index`; `None` when vacant.
    pub fn account(&self, index: usize) -> Result<Option<Account>, ProgramError> {
        let address = self.address(index)?;
        Ok(self.staged.get(&address))
    }

    /// Overwrite the account at `index`.
    ///
    /// Changing data or the owner requires the executing program to own the
    /// account. Reducing lamports additionally admits a signing data-less
    /// wallet, whose signature is its spend authorization. Pure credits need
    /// only writability.
    pub fn set_account(&mut self, index: usize, account: Account) -> Result<(), ProgramError> {
        let meta = self.meta(index)?.clone();
        if !meta.is_writable {
            return Err(ProgramError::AccountNotWritable {
                address: meta.address,
            });
        }
        let current = self
            .staged
            .get(&meta.address)
            .ok_or(ProgramError::AccountNotFound {
                address: meta.address,
            })?;
        let owns = current.owner == self.program_id;
        let untouched_shape =
            account.data == current.data && account.owner == current.owner;
        if !untouched_shape && !owns {
            return Err(ProgramError::InvalidAccountOwner {
                address: meta.address,
            });
        }
        let wallet_spend = meta.is_signer && current.data.is_empty();
        if account.lamports < current.lamports && !owns && !wallet_spend {
            return Err(ProgramError::InvalidAccountOwner {
                address: meta.address,
            });
        }
        self.staged.set(meta.address, account);
        Ok(())
    }

    /// Allocate a zero-filled account at `index`, owned by `owner`, its
    /// storage deposit debited from `payer_index`.
    ///
    /// The payer must be owned by the executing program, or be a signing
    /// data-less wallet. Programs must verify derived addresses before
    /// allocating at them; the runtime only checks vacancy and funding.
    pub fn create_account(
        &mut self,
        index: usize,
        payer_index: usize,
        space: usize,
        owner: Address,
    ) -> Result<(), ProgramError> {
        self.require_writable(index)?;
        self.require_writable(payer_index)?;
        let address = self.address(index)?;
        if self.staged.get(&address).is_some() {
            return Err(ProgramError::AccountAlreadyInUse { address });
        }

        let payer_meta = self.meta(payer_index)?.clone();
        let mut payer =
            self.staged
                .get(&payer_meta.address)
                .ok_or(ProgramError::AccountNotFound {
                    address: payer_meta.address,
                })?;
        let may_debit =
            payer.owner == self.program_id || (payer_meta.is_signer && payer.data.is_empty());
        if !may_debit {
            return Err(ProgramError::InvalidAccountOwner {
                address: payer_meta.address,
            });
        }

        let deposit = self.config.rent.minimum_balance(space);
        if payer.lamports < deposit {
            return Err(ProgramError::InsufficientFundsForRent {
                required: deposit,
                available: payer.lamports,
            });
        }
        payer.lamports -= deposit;
        self.staged.set(payer_meta.address, payer);
        self.staged.set(
            address,
            Account {
                lamports: deposit,
                data: vec![0; space],
                owner,
            },
        );
        Ok(())
    }

    /// Remove the account at `index`, its lamports refunded to
    /// `refund_index`. Only the owning program may close.
    pub fn close_account(&mut self, index: usize, refund_index: usize) -> Result<(), ProgramError> {
        self.require_writable(index)?;
        self.require_writable(refund_index)?;
        let address = self.address(index)?;
        let refund_address = self.address(refund_index)?;
        if refund_address == address {
            return Err(ProgramError::InvalidCloseRefund);
        }
        let account = self
            .staged
            .get(&address)
            .ok_or(ProgramError::AccountNotFound { address })?;
        if account.owner != self.program_id {
            return Err(ProgramError::InvalidAccountOwner { address });
        }
        self.staged.delete(address);
        self.credit(refund_address, account.lamports);
        Ok(())
    }

    /// Call another program.
    ///
    /// Each entry of `signer_seeds` derives, under the calling program's id,
    /// an address the callee may treat as signed. Every other privilege the
    /// inner instruction claims must already be held by the caller.
    pub fn invoke(
        &mut self,
        instruction: &Instruction,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<(), ProgramError> {
        if self.depth >= self.config.max_call_depth {
            return Err(ProgramError::CallDepthExceeded);
        }

        let mut proved: Vec<Address> = Vec::with_capacity(signer_seeds.len());
        for seeds in signer_seeds {
            proved.push(derive::derive_address(seeds, &self.program_id)?);
        }

        for meta in &instruction.accounts {
            let grant = self.metas.iter().find(|m| m.address == meta.address);
            let proved_here = proved.contains(&meta.address);
            let may_sign = proved_here || grant.map(|m| m.is_signer).unwrap_or(false);
            let may_write = grant.map(|m| m.is_writable).unwrap_or(false);
            if (meta.is_signer && !may_sign) || (meta.is_writable && !may_write) {
                return Err(ProgramError::PrivilegeEscalation {
                    address: meta.address,
                });
            }
        }

        let program =
            self.programs
                .get(&instruction.program_id)
                .ok_or(ProgramError::UnsupportedProgram {
                    program_id: instruction.program_id,
                })?;
        let mut inner = InvokeContext {
            program_id: instruction.program_id,
            metas: instruction.accounts.clone(),
            staged: &mut *self.staged,
            programs: self.programs,
            config: self.config,
            logs: &mut *self.logs,
            events: &mut *self.events,
            depth: self.depth + 1,
        };
        program.execute(&mut inner, &instruction.data)
    }

    /// Append a line to the transaction log.
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.logs
            .push(format!("[{:.8}] {}", self.program_id.to_hex(), line));
    }

    /// Emit an event. Staged with the write-set: kept on commit, dropped on
    /// abort.
    pub fn emit(&mut self, payload: Vec<u8>) {
        self.events.push(EmittedEvent {
            program: self.program_id,
            payload,
        });
    }

    fn credit(&mut self, address: Address, lamports: u64) {
        match self.staged.get(&address) {
            Some(mut account) => {
                account.lamports = account.lamports.saturating_add(lamports);
                self.staged.set(address, account);
            }
            // Credits materialize plain wallets at vacant addresses.
            None => {
                self.staged.set(address, Account::wallet(lamports, system_id()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A deterministic, totally ordered ledger.
pub struct Ledger {
    config: LedgerConfig,
    store: AccountStore,
    programs: HashMap<Address, Box<dyn Program>>,
    slot: u64,
    block_time: DateTime<Utc>,
    latest_blockhash: BlockHash,
    /// Blockhash issued per slot, for validity checks.
    recent_blockhashes: HashMap<BlockHash, u64>,
    pending: VecDeque<Transaction>,
    statuses: HashMap<TxHash, TransactionStatus>,
    seen: HashSet<TxHash>,
}

impl Ledger {
    /// Fresh ledger at slot zero, with the token program registered.
    pub fn new(config: LedgerConfig) -> Self {
        let genesis = BlockHash::genesis();
        let mut recent_blockhashes = HashMap::new();
        recent_blockhashes.insert(genesis, 0);
        let mut ledger = Self {
            config,
            store: AccountStore::new(),
            programs: HashMap::new(),
            slot: 0,
            block_time: Utc::now(),
            latest_blockhash: genesis,
            recent_blockhashes,
            pending: VecDeque::new(),
            statuses: HashMap::new(),
            seen: HashSet::new(),
        };
        ledger.register_program(token::id(), token::TokenProgram);
        ledger
    }

    /// Register `program` at `program_id`.
    pub fn register_program(&mut self, program_id: Address, program: impl Program + 'static) {
        self.programs.insert(program_id, Box::new(program));
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn latest_blockhash(&self) -> BlockHash {
        self.latest_blockhash
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Committed state of `address`.
    pub fn account(&self, address: &Address) -> Option<Account> {
        self.store.get(address).cloned()
    }

    /// The committed store, for read-only inspection.
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Status of a processed transaction.
    pub fn status(&self, hash: &TxHash) -> Option<&TransactionStatus> {
        self.statuses.get(hash)
    }

    /// Number of transactions processed so far.
    pub fn processed_count(&self) -> usize {
        self.statuses.len()
    }

    /// Credit lamports to `address`, creating a wallet account if vacant.
    pub fn airdrop(&mut self, address: Address, lamports: u64) {
        match self.store.get_mut(&address) {
            Some(account) => account.lamports = account.lamports.saturating_add(lamports),
            None => self
                .store
                .insert(address, Account::wallet(lamports, system_id())),
        }
    }

    /// Verify and enqueue. Queued order is execution order.
    pub fn submit(&mut self, tx: Transaction) -> Result<TxHash, LedgerError> {
        let hash = tx.hash();
        if self.seen.contains(&hash) {
            return Err(LedgerError::AlreadyProcessed);
        }
        tx.verify()?;
        self.check_blockhash(&tx)?;
        self.seen.insert(hash);
        debug!(tx = %hash, queued = self.pending.len() + 1, "transaction accepted");
        self.pending.push_back(tx);
        Ok(hash)
    }

    /// Seal the next block: bump the slot, stamp the time, refresh the
    /// blockhash, then execute every queued transaction in arrival order.
    /// Returns the new slot.
    pub fn advance_slot(&mut self) -> u64 {
        self.slot += 1;
        self.block_time = Utc::now();
        self.latest_blockhash = self.latest_blockhash.next(self.slot);
        self.recent_blockhashes
            .insert(self.latest_blockhash, self.slot);

        let batch: Vec<Transaction> = self.pending.drain(..).collect();
        for tx in batch {
            self.process_transaction(tx);
        }
        self.slot
    }

    fn check_blockhash(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let issued_slot = self
            .recent_blockhashes
            .get(&tx.message.recent_blockhash)
            .copied()
            .ok_or(LedgerError::UnknownBlockhash)?;
        if self.slot.saturating_sub(issued_slot) > self.config.blockhash_validity_slots {
            return Err(LedgerError::BlockhashExpired {
                issued_slot,
                current_slot: self.slot,
            });
        }
        Ok(())
    }

    fn process_transaction(&mut self, tx: Transaction) {
        let hash = tx.hash();
        let mut logs = Vec::new();
        let mut events = Vec::new();
        let result = self.execute(&tx, &mut logs, &mut events);
        if result.is_err() {
            events.clear();
        }
        match &result {
            Ok(()) => debug!(slot = self.slot, tx = %hash, "transaction committed"),
            Err(error) => warn!(slot = self.slot, tx = %hash, %error, "transaction aborted"),
        }
        self.statuses.insert(
            hash,
            TransactionStatus {
                hash,
                slot: self.slot,
                block_time: self.block_time,
                result,
                logs,
                events,
            },
        );
    }

    fn execute(
        &mut self,
        tx: &Transaction,
        logs: &mut Vec<String>,
        events: &mut Vec<EmittedEvent>,
    ) -> Result<(), LedgerError> {
        // Validity is re-checked here: the queue may outlive the window.
        self.check_blockhash(tx)?;

        let mut staged = StagedAccounts::new(&self.store);
        for (index, instruction) in tx.message.instructions.iter().enumerate() {
            let program = self.programs.get(&instruction.program_id).ok_or_else(|| {
                LedgerError::Instruction {
                    index,
                    source: ProgramError::UnsupportedProgram {
                        program_id: instruction.program_id,
                    },
                }
            })?;
            let mut ctx = InvokeContext {
                program_id: instruction.program_id,
                metas: instruction.accounts.clone(),
                staged: &mut staged,
                programs: &self.programs,
                config: &self.config,
                logs: &mut *logs,
                events: &mut *events,
                depth: 1,
            };
            program
                .execute(&mut ctx, &instruction.data)
                .map_err(|source| LedgerError::Instruction { index, source })?;
        }

        for (address, entry) in staged.into_writes() {
            match entry {
                Some(account) => self.store.insert(address, account),
                None => {
                    self.store.remove(&address);
                }
            }
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
