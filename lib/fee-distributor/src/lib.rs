//! Claim creator fees from an AMM vault and share them with registry holders.
//!
//! Table of contents:
//! - [`config`]: program ids, thresholds and ratios.
//! - [`ledger`]: the reads and writes consumed from the ledger.
//! - [`pda`]: program-derived addresses.
//! - [`balance`]: vault balance inspection.
//! - [`claim`]: claim transaction assembly.
//! - [`registry`]: holder registry decoding.
//! - [`allocation`]: pro-rata reward allocation.
//! - [`payout`]: sequential payout dispatch.
//! - [`distributor`]: the collect-then-distribute cycle.

pub mod allocation;
pub mod balance;
pub mod claim;
pub mod config;
pub mod distributor;
pub mod error;
pub mod ledger;
pub mod payout;
pub mod pda;
pub mod registry;
pub mod utils;

pub use allocation::{AllocationPlan, RewardAllocation, RewardAllocator};
pub use balance::{BalanceInspector, VaultBalance};
pub use claim::{ClaimPlan, ClaimTransactionBuilder};
pub use config::{DistributorConfig, ProgramIds};
pub use distributor::{
    ClaimedAmount, CollectOutcome, CycleReport, FeeDistributor, VaultReport,
};
pub use error::{Error, Result};
pub use ledger::{Ledger, TokenAmount};
pub use payout::{BatchOutcome, PayoutDispatcher, PayoutOutcome, PayoutStatus};
pub use pda::DerivedAddress;
pub use registry::{HolderRecord, RankTitle, RegistryDecoder};

pub mod prelude {
    pub use crate::ledger::Ledger;
    pub use solana_sdk::{
        hash::Hash, instruction::Instruction, pubkey::Pubkey, signature::Signature,
        signer::keypair::Keypair, signer::Signer, transaction::Transaction,
    };
}
