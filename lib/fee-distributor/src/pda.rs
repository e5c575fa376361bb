//! Program-derived addresses.

use crate::{Error, Result};
use solana_sdk::pubkey::{Pubkey, MAX_SEEDS, MAX_SEED_LEN};

pub const CREATOR_VAULT_SEED: &[u8] = b"creator_vault";
pub const BONDING_CURVE_CREATOR_VAULT_SEED: &[u8] = b"creator-vault";
pub const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";

/// An off-curve address found from `seeds` and the bump under `owner_program`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAddress {
    pub seeds: Vec<Vec<u8>>,
    pub owner_program: Pubkey,
    pub address: Pubkey,
    pub bump: u8,
}

impl DerivedAddress {
    /// Seeds are checked against the protocol limits before searching: at most
    /// `MAX_SEEDS - 1` seeds (one slot is taken by the bump) of at most
    /// `MAX_SEED_LEN` bytes each.
    pub fn derive(seeds: &[&[u8]], owner_program: &Pubkey) -> Result<Self> {
        if seeds.len() >= MAX_SEEDS {
            return Err(Error::InvalidSeeds(format!(
                "{} seeds given, at most {} allowed",
                seeds.len(),
                MAX_SEEDS - 1
            )));
        }
        if let Some((i, seed)) = seeds
            .iter()
            .enumerate()
            .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
        {
            return Err(Error::InvalidSeeds(format!(
                "seed #{} is {} bytes, at most {} allowed",
                i,
                seed.len(),
                MAX_SEED_LEN
            )));
        }

        let (address, bump) = Pubkey::try_find_program_address(seeds, owner_program)
            .ok_or(Error::NoViableBump(*owner_program))?;

        Ok(Self {
            seeds: seeds.iter().map(|s| s.to_vec()).collect(),
            owner_program: *owner_program,
            address,
            bump,
        })
    }
}

/// Authority over the creator's fee vault in the AMM program.
pub fn vault_authority(creator: &Pubkey, amm_program: &Pubkey) -> Result<DerivedAddress> {
    DerivedAddress::derive(&[CREATOR_VAULT_SEED, creator.as_ref()], amm_program)
}

/// Native creator vault of the bonding-curve program.
pub fn bonding_curve_creator_vault(
    creator: &Pubkey,
    fee_program: &Pubkey,
) -> Result<DerivedAddress> {
    DerivedAddress::derive(
        &[BONDING_CURVE_CREATOR_VAULT_SEED, creator.as_ref()],
        fee_program,
    )
}

pub fn event_authority(program: &Pubkey) -> Result<DerivedAddress> {
    DerivedAddress::derive(&[EVENT_AUTHORITY_SEED], program)
}

pub fn associated_token_address(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Result<DerivedAddress> {
    DerivedAddress::derive(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &spl_associated_token_account::ID,
    )
}
