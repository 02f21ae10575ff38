//! Escrow instruction wire format and builders.
//!
//! `TakeOffer` carries no arguments: the taker consents to whatever the
//! offer record states, and the builders recompute every derived account
//! from public inputs. A taker needs only `(maker, id)` and the two
//! asset addresses to construct a settlement.

use ledger::codec::{ByteReader, ByteWriter};
use ledger::errors::CodecError;
use ledger::instruction::{AccountMeta, Instruction};
use ledger::token;
use types::keys::Address;

use crate::address::{offer_address, vault_address};

const TAG_MAKE_OFFER: u8 = 0;
const TAG_TAKE_OFFER: u8 = 1;

/// Wire form of escrow instructions: a one-byte discriminator, then u64
/// arguments little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Accounts: `[maker WS, asset_a, asset_b, maker_holding_a W,
    /// offer W, vault W, token_program]`
    MakeOffer {
        id: u64,
        offered_amount_a: u64,
        wanted_amount_b: u64,
    },
    /// Accounts: `[taker WS, maker W, asset_a, asset_b, taker_holding_a W,
    /// taker_holding_b W, maker_holding_b W, offer W, vault W,
    /// token_program]`
    TakeOffer,
}

impl EscrowInstruction {
    pub fn pack(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        match self {
            Self::MakeOffer {
                id,
                offered_amount_a,
                wanted_amount_b,
            } => {
                writer.write_u8(TAG_MAKE_OFFER);
                writer.write_u64(*id);
                writer.write_u64(*offered_amount_a);
                writer.write_u64(*wanted_amount_b);
            }
            Self::TakeOffer => writer.write_u8(TAG_TAKE_OFFER),
        }
        writer.into_bytes()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(data);
        let instruction = match reader.read_u8()? {
            TAG_MAKE_OFFER => Self::MakeOffer {
                id: reader.read_u64()?,
                offered_amount_a: reader.read_u64()?,
                wanted_amount_b: reader.read_u64()?,
            },
            TAG_TAKE_OFFER => Self::TakeOffer,
            value => return Err(CodecError::UnknownDiscriminator { value }),
        };
        reader.finish()?;
        Ok(instruction)
    }
}

// ---------------------------------------------------------------------------
// Instruction builders
// ---------------------------------------------------------------------------

/// Publish an offer: lock `offered_amount_a` of `asset_a` in a fresh
/// vault and record the `wanted_amount_b` price. Signed by the maker,
/// who also funds both storage deposits.
pub fn make_offer(
    maker: Address,
    id: u64,
    asset_a: Address,
    asset_b: Address,
    offered_amount_a: u64,
    wanted_amount_b: u64,
) -> Instruction {
    let (offer, _) = offer_address(&maker, id);
    let vault = vault_address(&offer, &asset_a);
    let (maker_holding_a, _) = token::holding_address(&maker, &asset_a);
    Instruction::new(
        crate::id(),
        vec![
            AccountMeta::signer(maker),
            AccountMeta::readonly(asset_a),
            AccountMeta::readonly(asset_b),
            AccountMeta::writable(maker_holding_a),
            AccountMeta::writable(offer),
            AccountMeta::writable(vault),
            AccountMeta::readonly(token::id()),
        ],
        EscrowInstruction::MakeOffer {
            id,
            offered_amount_a,
            wanted_amount_b,
        }
        .pack(),
    )
}

/// Settle the offer `(maker, id)`: pay the wanted amount of `asset_b`
/// and receive the vault's entire `asset_a` balance. Signed by the
/// taker alone.
pub fn take_offer(
    taker: Address,
    maker: Address,
    id: u64,
    asset_a: Address,
    asset_b: Address,
) -> Instruction {
    let (offer, _) = offer_address(&maker, id);
    let vault = vault_address(&offer, &asset_a);
    let (taker_holding_a, _) = token::holding_address(&taker, &asset_a);
    let (taker_holding_b, _) = token::holding_address(&taker, &asset_b);
    let (maker_holding_b, _) = token::holding_address(&maker, &asset_b);
    Instruction::new(
        crate::id(),
        vec![
            AccountMeta::signer(taker),
            AccountMeta::writable(maker),
            AccountMeta::readonly(asset_a),
            AccountMeta::readonly(asset_b),
            AccountMeta::writable(taker_holding_a),
            AccountMeta::writable(taker_holding_b),
            AccountMeta::writable(maker_holding_b),
            AccountMeta::writable(offer),
            AccountMeta::writable(vault),
            AccountMeta::readonly(token::id()),
        ],
        EscrowInstruction::TakeOffer.pack(),
    )
}
