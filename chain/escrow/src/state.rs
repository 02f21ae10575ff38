//! Persisted offer record.

use ledger::codec::{ByteReader, ByteWriter};
use ledger::errors::CodecError;
use serde::{Deserialize, Serialize};
use types::keys::Address;

/// Everything a taker needs to settle, written at offer creation and
/// deleted at settlement. The offered amount is not stored; the vault
/// balance is the single source of truth for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Maker-chosen discriminator, unique per maker among live offers.
    pub id: u64,
    pub maker: Address,
    /// Asset locked in the vault.
    pub asset_a: Address,
    /// Asset the maker wants in return.
    pub asset_b: Address,
    /// Exact amount of `asset_b` the taker must pay.
    pub wanted_amount_b: u64,
    /// Salt that derived the record address; settlement signs with it.
    pub bump: u8,
}

impl Offer {
    /// Packed width: id, maker, asset_a, asset_b, wanted_amount_b, bump.
    pub const LEN: usize = 8 + 32 + 32 + 32 + 8 + 1;

    pub fn pack(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(Self::LEN);
        writer.write_u64(self.id);
        writer.write_address(&self.maker);
        writer.write_address(&self.asset_a);
        writer.write_address(&self.asset_b);
        writer.write_u64(self.wanted_amount_b);
        writer.write_u8(self.bump);
        writer.into_bytes()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(data);
        let offer = Self {
            id: reader.read_u64()?,
            maker: reader.read_address()?,
            asset_a: reader.read_address()?,
            asset_b: reader.read_address()?,
            wanted_amount_b: reader.read_u64()?,
            bump: reader.read_u8()?,
        };
        reader.finish()?;
        Ok(offer)
    }
}
