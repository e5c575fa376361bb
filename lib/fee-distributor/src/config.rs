use crate::utils::sol_to_lamports;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::{pubkey, pubkey::Pubkey};
use std::time::Duration;

pub const FEE_PROGRAM_ID: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
pub const AMM_PROGRAM_ID: Pubkey = pubkey!("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA");
pub const REGISTRY_PROGRAM_ID: Pubkey = pubkey!("rnc2fycemiEgj4YbMSuwKFpdV6nkJonojCXib3j2by6");
pub const WSOL_MINT: Pubkey = spl_token::native_mint::ID;

/// On-chain programs the distributor talks to.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramIds {
    /// Bonding-curve program, owner of the native creator vault.
    #[serde_as(as = "DisplayFromStr")]
    pub fee_program: Pubkey,
    /// AMM program, owner of the token creator vault and target of the claim.
    #[serde_as(as = "DisplayFromStr")]
    pub amm_program: Pubkey,
    /// Holder registry program.
    #[serde_as(as = "DisplayFromStr")]
    pub registry_program: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub quote_mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub token_program: Pubkey,
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self {
            fee_program: FEE_PROGRAM_ID,
            amm_program: AMM_PROGRAM_ID,
            registry_program: REGISTRY_PROGRAM_ID,
            quote_mint: WSOL_MINT,
            token_program: spl_token::ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributorConfig {
    pub programs: ProgramIds,
    /// Claims below this amount are skipped.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_claim_sol: Decimal,
    /// Share of the claimed amount passed on to holders.
    #[serde(with = "rust_decimal::serde::float")]
    pub distribution_ratio: Decimal,
    pub min_payout_lamports: u64,
    pub payout_delay_ms: u64,
    /// Exact data length of a registry account.
    pub registry_account_size: u64,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            programs: ProgramIds::default(),
            min_claim_sol: Self::default_min_claim_sol(),
            distribution_ratio: Self::default_distribution_ratio(),
            min_payout_lamports: Self::default_min_payout_lamports(),
            payout_delay_ms: Self::default_payout_delay_ms(),
            registry_account_size: Self::default_registry_account_size(),
        }
    }
}

impl DistributorConfig {
    pub fn default_min_claim_sol() -> Decimal {
        Decimal::new(1, 2)
    }

    pub fn default_distribution_ratio() -> Decimal {
        Decimal::new(8, 1)
    }

    pub fn default_min_payout_lamports() -> u64 {
        5000
    }

    pub fn default_payout_delay_ms() -> u64 {
        500
    }

    pub fn default_registry_account_size() -> u64 {
        crate::registry::ACCOUNT_SIZE as u64
    }

    pub fn min_claim_lamports(&self) -> crate::Result<u64> {
        sol_to_lamports(self.min_claim_sol)
    }

    pub fn payout_delay(&self) -> Duration {
        Duration::from_millis(self.payout_delay_ms)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(
            self.distribution_ratio >= Decimal::ZERO && self.distribution_ratio <= Decimal::ONE,
            "distribution_ratio must be between 0 and 1, got {}",
            self.distribution_ratio
        );
        anyhow::ensure!(
            self.min_claim_sol >= Decimal::ZERO,
            "min_claim_sol must not be negative, got {}",
            self.min_claim_sol
        );
        Ok(())
    }
}
