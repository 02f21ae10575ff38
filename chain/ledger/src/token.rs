//! Built-in fungible-token program
//!
//! Assets are described by a mint (supply, decimals, issuing authority);
//! balances live in holdings, one account per (owner, mint) pair, always at
//! the derived address for that pair. Holdings are owned by this program;
//! the logical owner recorded in the holding authorizes transfers by
//! signature, which is exactly what lets another program own a holding
//! through a derived address it can sign for.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::keys::Address;
use types::numeric;

use crate::account::Account;
use crate::codec::{ByteReader, ByteWriter};
use crate::derive;
use crate::errors::{CodecError, ProgramError, TokenError};
use crate::instruction::{AccountMeta, Instruction};
use crate::runtime::{InvokeContext, Program};

/// Address the token program is registered under.
pub fn id() -> Address {
    derive::program_address("token")
}

/// Seed prefix for holding addresses.
pub const HOLDING_SEED: &[u8] = b"holding";

/// Derived address of `owner`'s holding for `mint`, with its salt.
pub fn holding_address(owner: &Address, mint: &Address) -> (Address, u8) {
    derive::find_derived_address(&[HOLDING_SEED, owner.as_bytes(), mint.as_bytes()], &id())
}

// ---------------------------------------------------------------------------
// State layouts
// ---------------------------------------------------------------------------

/// On-ledger description of a fungible asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub supply: u64,
    pub decimals: u8,
    /// Only this address may issue new units.
    pub authority: Address,
}

impl Mint {
    /// Packed width: supply, decimals, authority.
    pub const LEN: usize = 8 + 1 + 32;

    pub fn pack(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(Self::LEN);
        writer.write_u64(self.supply);
        writer.write_u8(self.decimals);
        writer.write_address(&self.authority);
        writer.into_bytes()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(data);
        let mint = Self {
            supply: reader.read_u64()?,
            decimals: reader.read_u8()?,
            authority: reader.read_address()?,
        };
        reader.finish()?;
        Ok(mint)
    }

    /// Display units for a raw amount of this mint.
    pub fn ui_amount(&self, raw: u64) -> Decimal {
        numeric::ui_amount(raw, self.decimals)
    }
}

/// One owner's balance of one mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub mint: Address,
    /// The authority whose signature moves this balance.
    pub owner: Address,
    pub amount: u64,
}

impl Holding {
    /// Packed width: mint, owner, amount.
    pub const LEN: usize = 32 + 32 + 8;

    pub fn pack(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(Self::LEN);
        writer.write_address(&self.mint);
        writer.write_address(&self.owner);
        writer.write_u64(self.amount);
        writer.into_bytes()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(data);
        let holding = Self {
            mint: reader.read_address()?,
            owner: reader.read_address()?,
            amount: reader.read_u64()?,
        };
        reader.finish()?;
        Ok(holding)
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

const TAG_CREATE_MINT: u8 = 0;
const TAG_CREATE_HOLDING: u8 = 1;
const TAG_MINT_TO: u8 = 2;
const TAG_TRANSFER: u8 = 3;
const TAG_CLOSE_HOLDING: u8 = 4;

/// Wire form of token instructions: a one-byte discriminator, then u64
/// arguments little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenInstruction {
    /// Accounts: `[mint WS, payer WS, authority]`
    CreateMint { decimals: u8 },
    /// Accounts: `[holding W, owner, mint, payer WS]`
    CreateHolding,
    /// Accounts: `[mint W, holding W, authority S]`
    MintTo { amount: u64 },
    /// Accounts: `[source W, destination W, authority S]`
    Transfer { amount: u64 },
    /// Accounts: `[holding W, refund W, owner S]`
    CloseHolding,
}

impl TokenInstruction {
    pub fn pack(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        match self {
            Self::CreateMint { decimals } => {
                writer.write_u8(TAG_CREATE_MINT);
                writer.write_u8(*decimals);
            }
            Self::CreateHolding => writer.write_u8(TAG_CREATE_HOLDING),
            Self::MintTo { amount } => {
                writer.write_u8(TAG_MINT_TO);
                writer.write_u64(*amount);
            }
            Self::Transfer { amount } => {
                writer.write_u8(TAG_TRANSFER);
                writer.write_u64(*amount);
            }
            Self::CloseHolding => writer.write_u8(TAG_CLOSE_HOLDING),
        }
        writer.into_bytes()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(data);
        let instruction = match reader.read_u8()? {
            TAG_CREATE_MINT => Self::CreateMint {
                decimals: reader.read_u8()?,
            },
            TAG_CREATE_HOLDING => Self::CreateHolding,
            TAG_MINT_TO => Self::MintTo {
                amount: reader.read_u64()?,
            },
            TAG_TRANSFER => Self::Transfer {
                amount: reader.read_u64()?,
            },
            TAG_CLOSE_HOLDING => Self::CloseHolding,
            value => return Err(CodecError::UnknownDiscriminator { value }),
        };
        reader.finish()?;
        Ok(instruction)
    }
}

// ---------------------------------------------------------------------------
// Instruction builders
// ---------------------------------------------------------------------------

/// Create the mint account for a new asset. The mint signs for its own
/// address; `payer` funds the storage deposit.
pub fn create_mint(mint: Address, payer: Address, authority: Address, decimals: u8) -> Instruction {
    Instruction::new(
        id(),
        vec![
            AccountMeta::signer(mint),
            AccountMeta::signer(payer),
            AccountMeta::readonly(authority),
        ],
        TokenInstruction::CreateMint { decimals }.pack(),
    )
}

/// Create `owner`'s holding for `mint` at its derived address.
pub fn create_holding(owner: Address, mint: Address, payer: Address) -> Instruction {
    let (holding, _) = holding_address(&owner, &mint);
    Instruction::new(
        id(),
        vec![
            AccountMeta::writable(holding),
            AccountMeta::readonly(owner),
            AccountMeta::readonly(mint),
            AccountMeta::signer(payer),
        ],
        TokenInstruction::CreateHolding.pack(),
    )
}

/// Issue `amount` new units into `destination`. Signed by the mint
/// authority.
pub fn mint_to(mint: Address, destination: Address, authority: Address, amount: u64) -> Instruction {
    Instruction::new(
        id(),
        vec![
            AccountMeta::writable(mint),
            AccountMeta::writable(destination),
            AccountMeta::readonly_signer(authority),
        ],
        TokenInstruction::MintTo { amount }.pack(),
    )
}

/// Move `amount` from `source` to `destination`. Signed by the source
/// owner, whether by transaction signature or by a calling program's seeds.
pub fn transfer(
    source: Address,
    destination: Address,
    authority: Address,
    amount: u64,
) -> Instruction {
    Instruction::new(
        id(),
        vec![
            AccountMeta::writable(source),
            AccountMeta::writable(destination),
            AccountMeta::readonly_signer(authority),
        ],
        TokenInstruction::Transfer { amount }.pack(),
    )
}

/// Remove an empty holding, refunding its storage deposit to `refund`.
pub fn close_holding(holding: Address, refund: Address, owner: Address) -> Instruction {
    Instruction::new(
        id(),
        vec![
            AccountMeta::writable(holding),
            AccountMeta::writable(refund),
            AccountMeta::readonly_signer(owner),
        ],
        TokenInstruction::CloseHolding.pack(),
    )
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// The runtime-registered token program.
pub struct TokenProgram;

impl Program for TokenProgram {
    fn execute(&self, ctx: &mut InvokeContext<'_, '_>, data: &[u8]) -> Result<(), ProgramError> {
        match TokenInstruction::unpack(data)? {
            TokenInstruction::CreateMint { decimals } => process_create_mint(ctx, decimals),
            TokenInstruction::CreateHolding => process_create_holding(ctx),
            TokenInstruction::MintTo { amount } => process_mint_to(ctx, amount),
            TokenInstruction::Transfer { amount } => process_transfer(ctx, amount),
            TokenInstruction::CloseHolding => process_close_holding(ctx),
        }
    }
}

fn process_create_mint(ctx: &mut InvokeContext<'_, '_>, decimals: u8) -> Result<(), ProgramError> {
    if decimals > numeric::MAX_DECIMALS {
        return Err(TokenError::InvalidDecimals {
            decimals,
            max: numeric::MAX_DECIMALS,
        }
        .into());
    }
    // The mint signs for its own address, so nobody can occupy another
    // wallet's address with a mint.
    ctx.require_signer(0)?;
    ctx.create_account(0, 1, Mint::LEN, id())?;

    let authority = ctx.address(2)?;
    let record = Mint {
        supply: 0,
        decimals,
        authority,
    };
    write_record(ctx, 0, record.pack())
}

fn process_create_holding(ctx: &mut InvokeContext<'_, '_>) -> Result<(), ProgramError> {
    let owner = ctx.address(1)?;
    let mint_address = ctx.address(2)?;
    // The mint must exist before anyone can hold it.
    load_mint(ctx, 2)?;

    let given = ctx.address(0)?;
    let (expected, _) = holding_address(&owner, &mint_address);
    if given != expected {
        return Err(ProgramError::InvalidDerivedAddress {
            expected,
            found: given,
        });
    }

    ctx.create_account(0, 3, Holding::LEN, id())?;
    let record = Holding {
        mint: mint_address,
        owner,
        amount: 0,
    };
    write_record(ctx, 0, record.pack())
}

fn process_mint_to(ctx: &mut InvokeContext<'_, '_>, amount: u64) -> Result<(), ProgramError> {
    let mint_address = ctx.address(0)?;
    let mut mint = load_mint(ctx, 0)?;
    let mut holding = load_holding(ctx, 1)?;

    if ctx.address(2)? != mint.authority {
        return Err(TokenError::InvalidMintAuthority.into());
    }
    ctx.require_signer(2)?;
    if holding.mint != mint_address {
        return Err(TokenError::MintMismatch.into());
    }

    mint.supply = mint
        .supply
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;
    holding.amount = holding
        .amount
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;

    write_record(ctx, 0, mint.pack())?;
    write_record(ctx, 1, holding.pack())
}

fn process_transfer(ctx: &mut InvokeContext<'_, '_>, amount: u64) -> Result<(), ProgramError> {
    let mut source = load_holding(ctx, 0)?;
    let mut destination = load_holding(ctx, 1)?;

    if source.mint != destination.mint {
        return Err(TokenError::MintMismatch.into());
    }
    if ctx.address(2)? != source.owner {
        return Err(TokenError::OwnerMismatch.into());
    }
    ctx.require_signer(2)?;
    if source.amount < amount {
        return Err(TokenError::InsufficientFunds {
            required: amount,
            available: source.amount,
        }
        .into());
    }
    // A transfer onto itself is a no-op once the checks above pass.
    if ctx.address(0)? == ctx.address(1)? {
        return Ok(());
    }

    source.amount -= amount;
    destination.amount = destination
        .amount
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;

    write_record(ctx, 0, source.pack())?;
    write_record(ctx, 1, destination.pack())
}

fn process_close_holding(ctx: &mut InvokeContext<'_, '_>) -> Result<(), ProgramError> {
    let holding = load_holding(ctx, 0)?;
    if ctx.address(2)? != holding.owner {
        return Err(TokenError::OwnerMismatch.into());
    }
    ctx.require_signer(2)?;
    if holding.amount != 0 {
        return Err(TokenError::NonZeroBalance.into());
    }
    ctx.close_account(0, 1)
}

// ---------------------------------------------------------------------------
// Account loading
// ---------------------------------------------------------------------------

fn load_mint(ctx: &InvokeContext<'_, '_>, index: usize) -> Result<Mint, ProgramError> {
    let data = load_owned_data(ctx, index)?;
    Mint::unpack(&data).map_err(|_| TokenError::InvalidAccountData.into())
}

fn load_holding(ctx: &InvokeContext<'_, '_>, index: usize) -> Result<Holding, ProgramError> {
    let data = load_owned_data(ctx, index)?;
    Holding::unpack(&data).map_err(|_| TokenError::InvalidAccountData.into())
}

fn load_owned_data(ctx: &InvokeContext<'_, '_>, index: usize) -> Result<Vec<u8>, ProgramError> {
    let address = ctx.address(index)?;
    let account = ctx
        .account(index)?
        .ok_or(ProgramError::AccountNotFound { address })?;
    if account.owner != id() {
        return Err(ProgramError::InvalidAccountOwner { address });
    }
    Ok(account.data)
}

fn write_record(
    ctx: &mut InvokeContext<'_, '_>,
    index: usize,
    data: Vec<u8>,
) -> Result<(), ProgramError> {
    let address = ctx.address(index)?;
    let mut account = ctx
        .account(index)?
        .ok_or(ProgramError::AccountNotFound { address })?;
    account.data = data;
    ctx.set_account(index, account)
}
