//! Transactions: canonically encoded messages plus their signatures
//!
//! A message binds an instruction list to a recent blockhash; the blockhash
//! bounds how long the signed bytes stay submittable, measured in ledger
//! progress rather than wall clock. The transaction id is the SHA-256 digest
//! of the message bytes and every signature, so a re-signed message is a new
//! transaction.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use types::keys::Address;

use crate::codec::ByteWriter;
use crate::errors::LedgerError;
use crate::instruction::Instruction;
use crate::signing::{self, Keypair, Signature};

// ---------------------------------------------------------------------------
// Hashes
// ---------------------------------------------------------------------------

/// Hash identifying a block; refreshed every slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// The hash the ledger starts from at slot zero.
    pub fn genesis() -> Self {
        Self(Sha256::digest(b"ledger-genesis").into())
    }

    /// The hash for the block following this one.
    pub fn next(&self, slot: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(slot.to_le_bytes());
        Self(hasher.finalize().into())
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}..)", &hex::encode(self.0)[..8])
    }
}

/// Transaction id: digest of message bytes and signatures.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({}..)", &self.to_hex()[..8])
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| serde::de::Error::custom("transaction hash must be 32 bytes"))?;
        Ok(Self(bytes))
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The signed payload: a recent blockhash and the instruction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub recent_blockhash: BlockHash,
    pub instructions: Vec<Instruction>,
}

impl Message {
    pub fn new(recent_blockhash: BlockHash, instructions: Vec<Instruction>) -> Self {
        Self {
            recent_blockhash,
            instructions,
        }
    }

    /// Canonical byte encoding. Every signer signs exactly these bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_bytes(self.recent_blockhash.as_bytes());
        writer.write_u32(self.instructions.len() as u32);
        for instruction in &self.instructions {
            writer.write_address(&instruction.program_id);
            writer.write_u32(instruction.accounts.len() as u32);
            for meta in &instruction.accounts {
                writer.write_address(&meta.address);
                writer.write_u8(meta.is_signer as u8);
                writer.write_u8(meta.is_writable as u8);
            }
            writer.write_u32(instruction.data.len() as u32);
            writer.write_bytes(&instruction.data);
        }
        writer.into_bytes()
    }

    /// Every address some meta marks as signer, deduplicated, in a stable
    /// order.
    pub fn required_signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = Vec::new();
        for instruction in &self.instructions {
            for meta in &instruction.accounts {
                if meta.is_signer && !signers.contains(&meta.address) {
                    signers.push(meta.address);
                }
            }
        }
        signers
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A message plus one signature per required signer.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub message: Message,
    /// Keyed by signer address; `BTreeMap` keeps the id computation stable.
    pub signatures: BTreeMap<Address, Signature>,
}

impl Transaction {
    /// Sign `message` with every keypair in `signers`.
    pub fn new(message: Message, signers: &[&Keypair]) -> Self {
        let bytes = message.to_bytes();
        let signatures = signers
            .iter()
            .map(|keypair| (keypair.address(), keypair.sign(&bytes)))
            .collect();
        Self {
            message,
            signatures,
        }
    }

    /// The transaction id.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(self.message.to_bytes());
        for (address, signature) in &self.signatures {
            hasher.update(address.as_bytes());
            hasher.update(signature.to_bytes());
        }
        TxHash::new(hasher.finalize().into())
    }

    /// Check that every required signer provided a valid signature over the
    /// canonical message bytes.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let bytes = self.message.to_bytes();
        for address in self.message.required_signers() {
            let signature = self
                .signatures
                .get(&address)
                .ok_or(LedgerError::MissingSignature { address })?;
            if !signing::verify(&address, &bytes, signature) {
                return Err(LedgerError::SignatureVerification { address });
            }
        }
        Ok(())
    }
}
