//! Holder registry accounts.
//!
//! Layout of a registry account (270 bytes):
//!
//! | offset | size | field                      |
//! |--------|------|----------------------------|
//! | 0      | 8    | discriminator (ignored)    |
//! | 8      | 32   | owner                      |
//! | 40     | 8    | total burned, u64 LE       |
//! | 48     | 1    | rank                       |
//! | 49     | 221  | metadata, slots and bump   |
//!
//! Only the first [`HEAD_SIZE`] bytes are decoded.

use crate::{ledger::Ledger, Result};
use borsh1::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use thiserror::Error as ThisError;

pub const ACCOUNT_SIZE: usize = 270;
pub const HEAD_SIZE: usize = 49;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record is {len} bytes, need at least {}", HEAD_SIZE)]
    TooShort { len: usize },
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[derive(BorshDeserialize)]
#[borsh(crate = "borsh1")]
struct RecordHead {
    _discriminator: [u8; 8],
    owner: [u8; 32],
    total_burned: u64,
    rank: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderRecord {
    pub owner: Pubkey,
    pub total_burned: u64,
    pub rank: u8,
}

impl HolderRecord {
    pub fn decode(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        if data.len() < HEAD_SIZE {
            return Err(DecodeError::TooShort { len: data.len() });
        }
        let head = RecordHead::deserialize(&mut &data[..HEAD_SIZE])
            .map_err(|error| DecodeError::Malformed(error.to_string()))?;
        Ok(Self {
            owner: Pubkey::new_from_array(head.owner),
            total_burned: head.total_burned,
            rank: head.rank,
        })
    }

    pub fn rank_title(&self) -> RankTitle {
        RankTitle(self.rank)
    }
}

/// Display name of a rank byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankTitle(pub u8);

impl fmt::Display for RankTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const TITLES: [&str; 10] = [
            "Initiate",
            "Believer",
            "Devotee",
            "Guardian",
            "Keeper",
            "Oracle",
            "Architect",
            "Sage",
            "Ascended",
            "Eternal",
        ];
        match TITLES.get(self.0 as usize) {
            Some(title) => f.write_str(title),
            None => write!(f, "Rank {}", self.0),
        }
    }
}

/// Decode every account, skipping the ones that fail.
pub fn decode_accounts<'a, I>(accounts: I) -> Vec<HolderRecord>
where
    I: IntoIterator<Item = (&'a Pubkey, &'a [u8])>,
{
    accounts
        .into_iter()
        .filter_map(|(pubkey, data)| match HolderRecord::decode(data) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!("skipping registry account {}: {}", pubkey, error);
                None
            }
        })
        .collect()
}

pub struct RegistryDecoder<'a, L: ?Sized> {
    ledger: &'a L,
    program_id: Pubkey,
    account_size: u64,
}

impl<'a, L: Ledger + ?Sized> RegistryDecoder<'a, L> {
    pub fn new(ledger: &'a L, program_id: Pubkey, account_size: u64) -> Self {
        Self {
            ledger,
            program_id,
            account_size,
        }
    }

    /// Fetch all registry accounts and decode them in the order returned.
    pub async fn scan(&self) -> Result<Vec<HolderRecord>> {
        tracing::info!("fetching holders from program {}", self.program_id);
        let accounts = self
            .ledger
            .get_program_accounts_by_size(&self.program_id, self.account_size)
            .await?;
        tracing::info!("processing {} registry accounts", accounts.len());
        let holders = decode_accounts(
            accounts
                .iter()
                .map(|(pubkey, account)| (pubkey, account.data.as_slice())),
        );
        tracing::info!("found {} holders", holders.len());
        Ok(holders)
    }
}
