//! Escrow program: offer creation and atomic settlement.
//!
//! The program never trusts a supplied account list. Every derived
//! account is recomputed from the maker, the offer id and the assets,
//! and compared against what the transaction named; a mismatch rejects
//! the instruction before any movement. Funds only move through the
//! token program, with the offer record itself signing for the vault
//! via its derivation seeds.

use ledger::errors::{ProgramError, TokenError};
use ledger::runtime::{InvokeContext, Program};
use ledger::token::{self, Holding, Mint};
use types::keys::Address;

use crate::address::{offer_address, vault_address, OFFER_SEED};
use crate::error::EscrowError;
use crate::events::{EscrowEvent, OfferCreated, OfferSettled};
use crate::instruction::EscrowInstruction;
use crate::state::Offer;

/// Account order for `MakeOffer`.
mod make_accounts {
    pub const MAKER: usize = 0;
    pub const ASSET_A: usize = 1;
    pub const ASSET_B: usize = 2;
    pub const MAKER_HOLDING_A: usize = 3;
    pub const OFFER: usize = 4;
    pub const VAULT: usize = 5;
    pub const TOKEN_PROGRAM: usize = 6;
}

/// Account order for `TakeOffer`.
mod take_accounts {
    pub const TAKER: usize = 0;
    pub const MAKER: usize = 1;
    pub const ASSET_A: usize = 2;
    pub const ASSET_B: usize = 3;
    pub const TAKER_HOLDING_A: usize = 4;
    pub const TAKER_HOLDING_B: usize = 5;
    pub const MAKER_HOLDING_B: usize = 6;
    pub const OFFER: usize = 7;
    pub const VAULT: usize = 8;
    pub const TOKEN_PROGRAM: usize = 9;
}

/// The runtime-registered escrow program.
pub struct EscrowProgram;

impl Program for EscrowProgram {
    fn execute(&self, ctx: &mut InvokeContext<'_, '_>, data: &[u8]) -> Result<(), ProgramError> {
        match EscrowInstruction::unpack(data)? {
            EscrowInstruction::MakeOffer {
                id,
                offered_amount_a,
                wanted_amount_b,
            } => process_make_offer(ctx, id, offered_amount_a, wanted_amount_b),
            EscrowInstruction::TakeOffer => process_take_offer(ctx),
        }
    }
}

fn process_make_offer(
    ctx: &mut InvokeContext<'_, '_>,
    id: u64,
    offered_amount_a: u64,
    wanted_amount_b: u64,
) -> Result<(), ProgramError> {
    use make_accounts as ix;

    let maker = ctx.address(ix::MAKER)?;
    let asset_a = ctx.address(ix::ASSET_A)?;
    let asset_b = ctx.address(ix::ASSET_B)?;

    if offered_amount_a == 0 || wanted_amount_b == 0 || asset_a == asset_b {
        return Err(EscrowError::MalformedArguments.into());
    }
    ctx.require_signer(ix::MAKER)?;
    require_token_program(ctx, ix::TOKEN_PROGRAM)?;
    require_mint(ctx, ix::ASSET_A)?;
    require_mint(ctx, ix::ASSET_B)?;

    let (offer, bump) = offer_address(&maker, id);
    let vault = vault_address(&offer, &asset_a);
    let (maker_holding_a, _) = token::holding_address(&maker, &asset_a);
    require_address(ctx, ix::OFFER, offer)?;
    require_address(ctx, ix::VAULT, vault)?;
    require_address(ctx, ix::MAKER_HOLDING_A, maker_holding_a)?;

    // One live offer per (maker, id).
    if ctx.account(ix::OFFER)?.is_some() {
        return Err(EscrowError::AddressAlreadyInUse.into());
    }

    ctx.create_account(ix::OFFER, ix::MAKER, Offer::LEN, crate::id())?;
    let record = Offer {
        id,
        maker,
        asset_a,
        asset_b,
        wanted_amount_b,
        bump,
    };
    write_record(ctx, ix::OFFER, record.pack())?;

    // The vault is the record's own holding; creating it and locking the
    // funds both go through the token program.
    ctx.invoke(&token::create_holding(offer, asset_a, maker), &[])?;
    let funding = token::transfer(maker_holding_a, vault, maker, offered_amount_a);
    ctx.invoke(&funding, &[]).map_err(map_funding_error)?;

    ctx.log(format!("offer {} by {} is live", id, maker));
    let event = EscrowEvent::OfferCreated(OfferCreated {
        offer,
        id,
        maker,
        asset_a,
        asset_b,
        offered_amount_a,
        wanted_amount_b,
    });
    ctx.emit(event.to_bytes());
    Ok(())
}

fn process_take_offer(ctx: &mut InvokeContext<'_, '_>) -> Result<(), ProgramError> {
    use take_accounts as ix;

    let taker = ctx.address(ix::TAKER)?;
    ctx.require_signer(ix::TAKER)?;
    require_token_program(ctx, ix::TOKEN_PROGRAM)?;

    let offer = ctx.address(ix::OFFER)?;
    let record = load_offer(ctx, ix::OFFER)?;

    // Every supplied account must agree with the record.
    if ctx.address(ix::MAKER)? != record.maker
        || ctx.address(ix::ASSET_A)? != record.asset_a
        || ctx.address(ix::ASSET_B)? != record.asset_b
    {
        return Err(EscrowError::AssetMismatch.into());
    }
    let (taker_holding_a, _) = token::holding_address(&taker, &record.asset_a);
    let (taker_holding_b, _) = token::holding_address(&taker, &record.asset_b);
    let (maker_holding_b, _) = token::holding_address(&record.maker, &record.asset_b);
    if ctx.address(ix::TAKER_HOLDING_A)? != taker_holding_a
        || ctx.address(ix::TAKER_HOLDING_B)? != taker_holding_b
        || ctx.address(ix::MAKER_HOLDING_B)? != maker_holding_b
    {
        return Err(EscrowError::AssetMismatch.into());
    }
    let vault = vault_address(&offer, &record.asset_a);
    require_address(ctx, ix::VAULT, vault)?;

    // Pay the maker, creating their receiving holding on demand with the
    // taker covering the deposit.
    if ctx.account(ix::MAKER_HOLDING_B)?.is_none() {
        ctx.invoke(
            &token::create_holding(record.maker, record.asset_b, taker),
            &[],
        )?;
    }
    let payment = token::transfer(taker_holding_b, maker_holding_b, taker, record.wanted_amount_b);
    ctx.invoke(&payment, &[]).map_err(map_funding_error)?;

    // Release the whole vault to the taker, the record signing for its
    // vault through the seeds that derived it.
    if ctx.account(ix::TAKER_HOLDING_A)?.is_none() {
        ctx.invoke(&token::create_holding(taker, record.asset_a, taker), &[])?;
    }
    let vault_account = ctx
        .account(ix::VAULT)?
        .ok_or(ProgramError::AccountNotFound { address: vault })?;
    let settled_amount_a = Holding::unpack(&vault_account.data)
        .map_err(|_| ProgramError::Token(TokenError::InvalidAccountData))?
        .amount;

    let id_bytes = record.id.to_le_bytes();
    let bump = [record.bump];
    let seeds: &[&[u8]] = &[OFFER_SEED, record.maker.as_bytes(), &id_bytes, &bump];
    ctx.invoke(
        &token::transfer(vault, taker_holding_a, offer, settled_amount_a),
        &[seeds],
    )?;
    // Vault deposit to the taker, record deposit to the maker.
    ctx.invoke(&token::close_holding(vault, taker, offer), &[seeds])?;
    ctx.close_account(ix::OFFER, ix::MAKER)?;

    ctx.log(format!("offer {} settled by {}", record.id, taker));
    let event = EscrowEvent::OfferSettled(OfferSettled {
        offer,
        id: record.id,
        maker: record.maker,
        taker,
        asset_a: record.asset_a,
        asset_b: record.asset_b,
        settled_amount_a,
        paid_amount_b: record.wanted_amount_b,
    });
    ctx.emit(event.to_bytes());
    Ok(())
}

// ---------------------------------------------------------------------------
// Account loading
// ---------------------------------------------------------------------------

fn load_offer(ctx: &InvokeContext<'_, '_>, index: usize) -> Result<Offer, ProgramError> {
    let address = ctx.address(index)?;
    let account = ctx.account(index)?.ok_or(EscrowError::RecordNotFound)?;
    if account.owner != crate::id() {
        return Err(EscrowError::RecordNotFound.into());
    }
    let record = Offer::unpack(&account.data).map_err(|_| EscrowError::RecordNotFound)?;
    // A real record sits at its own derivation.
    let (expected, _) = offer_address(&record.maker, record.id);
    if expected != address {
        return Err(EscrowError::RecordNotFound.into());
    }
    Ok(record)
}

fn require_mint(ctx: &InvokeContext<'_, '_>, index: usize) -> Result<(), ProgramError> {
    let address = ctx.address(index)?;
    let account = ctx
        .account(index)?
        .ok_or(ProgramError::AccountNotFound { address })?;
    if account.owner != token::id() {
        return Err(ProgramError::InvalidAccountOwner { address });
    }
    Mint::unpack(&account.data).map_err(|_| ProgramError::Token(TokenError::InvalidAccountData))?;
    Ok(())
}

fn require_token_program(ctx: &InvokeContext<'_, '_>, index: usize) -> Result<(), ProgramError> {
    let given = ctx.address(index)?;
    if given != token::id() {
        return Err(ProgramError::UnsupportedProgram { program_id: given });
    }
    Ok(())
}

fn require_address(
    ctx: &InvokeContext<'_, '_>,
    index: usize,
    expected: Address,
) -> Result<(), ProgramError> {
    let found = ctx.address(index)?;
    if found != expected {
        return Err(ProgramError::InvalidDerivedAddress { expected, found });
    }
    Ok(())
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

/// A funding transfer that fails because the payer's holding is missing
/// or short surfaces as the escrow's own insufficient-funds code.
fn map_funding_error(error: ProgramError) -> ProgramError {
    match error {
        ProgramError::Token(TokenError::InsufficientFunds { .. })
        | ProgramError::AccountNotFound { .. } => EscrowError::InsufficientFunds.into(),
        other => other,
    }
}
