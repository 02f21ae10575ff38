//! Error taxonomy for the ledger runtime
//!
//! One enum per concern: transaction admission (`LedgerError`), program
//! execution (`ProgramError`), the built-in token program (`TokenError`),
//! wire encoding (`CodecError`), and address derivation (`DeriveError`).

use thiserror::Error;
use types::keys::Address;

/// Reasons a transaction is rejected at submission or aborted at execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Signature verification failed for {address}")]
    SignatureVerification { address: Address },

    #[error("Missing signature for {address}")]
    MissingSignature { address: Address },

    #[error("Blockhash was never issued by this ledger")]
    UnknownBlockhash,

    #[error("Blockhash expired: issued at slot {issued_slot}, current slot {current_slot}")]
    BlockhashExpired { issued_slot: u64, current_slot: u64 },

    #[error("Transaction already processed")]
    AlreadyProcessed,

    #[error("Instruction {index} failed: {source}")]
    Instruction { index: usize, source: ProgramError },
}

/// Failures raised while a program executes.
///
/// Program-specific rejections travel as `Custom` with a stable numeric
/// code; everything else is a runtime rule the executing program violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgramError {
    #[error("No program registered at {program_id}")]
    UnsupportedProgram { program_id: Address },

    #[error("Missing required signature")]
    MissingRequiredSignature,

    #[error("Account {address} is not writable")]
    AccountNotWritable { address: Address },

    #[error("Instruction names account index {index} but only {provided} accounts were supplied")]
    AccountIndexOutOfBounds { index: usize, provided: usize },

    #[error("Account not found: {address}")]
    AccountNotFound { address: Address },

    #[error("Account already in use: {address}")]
    AccountAlreadyInUse { address: Address },

    #[error("Account {address} is not owned by the executing program")]
    InvalidAccountOwner { address: Address },

    #[error("Derived address mismatch: expected {expected}, found {found}")]
    InvalidDerivedAddress { expected: Address, found: Address },

    #[error("Insufficient lamports for storage deposit: required {required}, available {available}")]
    InsufficientFundsForRent { required: u64, available: u64 },

    #[error("Close refund target must differ from the closed account")]
    InvalidCloseRefund,

    #[error("Cross-program call depth exceeded")]
    CallDepthExceeded,

    #[error("Privilege escalation for {address}: caller holds no such grant")]
    PrivilegeEscalation { address: Address },

    #[error("Address derivation failed: {0}")]
    Derive(#[from] DeriveError),

    #[error("Malformed instruction data: {0}")]
    InstructionData(#[from] CodecError),

    #[error("Token program error: {0}")]
    Token(#[from] TokenError),

    #[error("Program error {code}: {message}")]
    Custom { code: u32, message: String },
}

/// Failures specific to the built-in fungible-token program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Insufficient token balance: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Holding mint does not match the expected mint")]
    MintMismatch,

    #[error("Signer does not own the source holding")]
    OwnerMismatch,

    #[error("Signer is not the mint authority")]
    InvalidMintAuthority,

    #[error("Decimals exceed the supported maximum: {decimals} > {max}")]
    InvalidDecimals { decimals: u8, max: u8 },

    #[error("Arithmetic overflow in balance update")]
    Overflow,

    #[error("Holding still carries a balance")]
    NonZeroBalance,

    #[error("Account data is not a valid token record")]
    InvalidAccountData,
}

/// Failures decoding or encoding wire bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Unexpected end of input: needed {needed} more bytes")]
    UnexpectedEnd { needed: usize },

    #[error("Trailing bytes after decode: {remaining}")]
    TrailingBytes { remaining: usize },

    #[error("Unknown discriminator: {value}")]
    UnknownDiscriminator { value: u8 },

    #[error("String exceeds maximum length: {len} > {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("String is not valid UTF-8")]
    InvalidUtf8,
}

/// Failures deriving an address from seeds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeriveError {
    #[error("Too many seeds: {count} > {max}")]
    TooManySeeds { count: usize, max: usize },

    #[error("Seed exceeds maximum length: {len} > {max}")]
    SeedTooLong { len: usize, max: usize },

    #[error("Derived address landed on the ed25519 curve")]
    OnCurve,
}
