//! Collect-then-distribute cycle.

use crate::{
    allocation::RewardAllocator,
    balance::{BalanceInspector, VaultBalance},
    claim::ClaimTransactionBuilder,
    config::DistributorConfig,
    ledger::Ledger,
    payout::{BatchOutcome, PayoutDispatcher},
    pda,
    registry::RegistryDecoder,
    utils::{lamports_to_sol, token_amount_to_lamports},
    Error, Result,
};
use solana_sdk::{
    pubkey::Pubkey,
    signature::Signature,
    signer::{keypair::Keypair, Signer},
};
use std::sync::Arc;

/// Lamports claimed in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClaimedAmount(pub u64);

impl ClaimedAmount {
    pub const ZERO: Self = Self(0);

    pub fn lamports(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectOutcome {
    /// The fee vault has not been created yet.
    VaultMissing,
    NothingToClaim,
    BelowThreshold { claimable: u64, threshold: u64 },
    Claimed {
        amount: u64,
        signature: Signature,
        created_destination: bool,
    },
}

impl CollectOutcome {
    pub fn claimed(&self) -> ClaimedAmount {
        match self {
            CollectOutcome::Claimed { amount, .. } => ClaimedAmount(*amount),
            _ => ClaimedAmount::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultReport {
    pub creator: Pubkey,
    /// Token vault of the AMM program, the one that gets claimed.
    pub amm_vault: Pubkey,
    pub amm_balance: VaultBalance,
    /// Native creator vault of the bonding-curve program.
    pub bonding_curve_vault: Pubkey,
    pub bonding_curve_balance: VaultBalance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub collect: CollectOutcome,
    /// `None` when nothing was claimed.
    pub distribution: Option<BatchOutcome>,
}

pub struct FeeDistributor<L: ?Sized> {
    config: DistributorConfig,
    signer: Arc<Keypair>,
    ledger: Arc<L>,
}

impl<L: Ledger + ?Sized> FeeDistributor<L> {
    /// Fails if `config` does not pass [`DistributorConfig::validate`].
    pub fn new(config: DistributorConfig, signer: Arc<Keypair>, ledger: Arc<L>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            signer,
            ledger,
        })
    }

    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    pub fn creator(&self) -> Pubkey {
        self.signer.pubkey()
    }

    /// Read both creator vaults without claiming anything.
    pub async fn inspect(&self) -> Result<VaultReport> {
        let creator = self.creator();
        let inspector = BalanceInspector::new(&*self.ledger);

        let amm_vault = ClaimTransactionBuilder::new(&self.config)
            .vault(&creator)?
            .address;
        let amm_balance = inspector.token_balance(&amm_vault).await?;

        let bonding_curve_vault =
            pda::bonding_curve_creator_vault(&creator, &self.config.programs.fee_program)?
                .address;
        let bonding_curve_balance = inspector.native_balance(&bonding_curve_vault).await?;

        Ok(VaultReport {
            creator,
            amm_vault,
            amm_balance,
            bonding_curve_vault,
            bonding_curve_balance,
        })
    }

    /// Claim the AMM creator vault if it holds at least the configured minimum.
    pub async fn collect(&self) -> Result<CollectOutcome> {
        let creator = self.creator();
        tracing::info!("creator wallet: {}", creator);

        let builder = ClaimTransactionBuilder::new(&self.config);
        let vault = builder.vault(&creator)?.address;
        let balance = BalanceInspector::new(&*self.ledger)
            .token_balance(&vault)
            .await?;

        if !balance.exists {
            tracing::info!("vault {} not created yet, no fees", vault);
            return Ok(CollectOutcome::VaultMissing);
        }

        let claimable = token_amount_to_lamports(balance.claimable, balance.decimals)?;
        tracing::info!("claimable: {} SOL in vault {}", lamports_to_sol(claimable), vault);

        if claimable == 0 {
            tracing::info!("no fees to claim");
            return Ok(CollectOutcome::NothingToClaim);
        }

        let threshold = self.config.min_claim_lamports()?;
        if claimable < threshold {
            tracing::info!(
                "skipping claim, {} SOL is below the {} SOL threshold",
                lamports_to_sol(claimable),
                lamports_to_sol(threshold)
            );
            return Ok(CollectOutcome::BelowThreshold {
                claimable,
                threshold,
            });
        }

        let plan = builder.prepare(&*self.ledger, &creator).await?;
        let signature = builder
            .submit(&*self.ledger, &self.signer, &plan, claimable)
            .await?;
        tracing::info!(
            %signature,
            "claimed {} SOL from vault {}",
            lamports_to_sol(claimable),
            vault
        );

        Ok(CollectOutcome::Claimed {
            amount: claimable,
            signature,
            created_destination: plan.create_destination,
        })
    }

    /// Pay holders their share of `claimed`.
    pub async fn distribute(&self, claimed: ClaimedAmount) -> Result<BatchOutcome> {
        if claimed.is_zero() {
            return Ok(BatchOutcome::default());
        }

        let holders = RegistryDecoder::new(
            &*self.ledger,
            self.config.programs.registry_program,
            self.config.registry_account_size,
        )
        .scan()
        .await?;

        let plan = RewardAllocator::new(
            self.config.distribution_ratio,
            self.config.min_payout_lamports,
        )
        .allocate(claimed.lamports(), &holders)?;

        tracing::info!(
            "claimed {} SOL, distributable {} SOL, {} holders",
            lamports_to_sol(claimed.lamports()),
            lamports_to_sol(plan.distributable),
            holders.len()
        );
        for allocation in &plan.allocations {
            tracing::debug!(
                "{}: {}, {} burned, {} SOL",
                allocation.owner,
                crate::registry::RankTitle(allocation.rank),
                allocation.total_burned,
                lamports_to_sol(allocation.lamports)
            );
        }
        if plan.skipped > 0 {
            tracing::warn!(
                "{} holders skipped, reward below {} SOL minimum",
                plan.skipped,
                lamports_to_sol(self.config.min_payout_lamports)
            );
        }
        if plan.is_empty() {
            tracing::warn!("no holders qualify for rewards");
            return Ok(BatchOutcome {
                skipped_below_floor: plan.skipped,
                ..<_>::default()
            });
        }

        tracing::info!(
            "sending {} SOL to {} holders",
            lamports_to_sol(plan.total_lamports()),
            plan.allocations.len()
        );
        let dispatcher =
            PayoutDispatcher::new(&*self.ledger, &self.signer, self.config.payout_delay());
        let mut batch = dispatcher.dispatch(&plan.allocations).await;
        batch.skipped_below_floor = plan.skipped;
        Ok(batch)
    }

    /// Collect, then distribute whatever was claimed.
    ///
    /// A distribution error after a confirmed claim is returned as
    /// [`Error::DistributionFailed`], carrying the claimed amount and the claim
    /// signature.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let collect = self.collect().await?;
        let distribution = match &collect {
            CollectOutcome::Claimed {
                amount, signature, ..
            } => {
                let batch = self
                    .distribute(ClaimedAmount(*amount))
                    .await
                    .map_err(|error| {
                        tracing::error!(
                            %signature,
                            "claimed {} SOL but distribution failed",
                            lamports_to_sol(*amount)
                        );
                        Error::DistributionFailed {
                            claimed: *amount,
                            signature: *signature,
                            reason: error.to_string(),
                        }
                    })?;
                Some(batch)
            }
            _ => {
                tracing::info!("no fees claimed, skipping distribution");
                None
            }
        };
        Ok(CycleReport {
            collect,
            distribution,
        })
    }
}
