use crate::{registry::HolderRecord, utils::apply_ratio, Result};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardAllocation {
    pub owner: Pubkey,
    pub rank: u8,
    pub total_burned: u64,
    pub lamports: u64,
    pub included: bool,
}

/// Result of splitting a claimed amount between holders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    pub distributable: u64,
    pub total_weight: u128,
    /// Included allocations only, in registry order.
    pub allocations: Vec<RewardAllocation>,
    /// Holders whose share fell below the payout floor.
    pub skipped: usize,
}

impl AllocationPlan {
    pub fn total_lamports(&self) -> u64 {
        self.allocations.iter().map(|a| a.lamports).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

pub struct RewardAllocator {
    ratio: Decimal,
    min_payout_lamports: u64,
}

impl RewardAllocator {
    pub fn new(ratio: Decimal, min_payout_lamports: u64) -> Self {
        Self {
            ratio,
            min_payout_lamports,
        }
    }

    /// Split `ratio` of `claimed` lamports between `holders` in proportion to
    /// their burned amount.
    ///
    /// Shares are rounded down. Shares below the payout floor are dropped and
    /// are not handed to the remaining holders.
    pub fn allocate(&self, claimed: u64, holders: &[HolderRecord]) -> Result<AllocationPlan> {
        let distributable = apply_ratio(claimed, self.ratio)?;
        let total_weight = holders.iter().map(|h| h.total_burned as u128).sum::<u128>();

        if total_weight == 0 {
            return Ok(AllocationPlan {
                distributable,
                ..<_>::default()
            });
        }

        let mut allocations = Vec::with_capacity(holders.len());
        let mut skipped = 0;
        for holder in holders {
            // share <= distributable, so it fits in u64
            let lamports =
                (holder.total_burned as u128 * distributable as u128 / total_weight) as u64;
            if lamports < self.min_payout_lamports {
                tracing::debug!(
                    "skipping {}: share of {} lamports is below the floor",
                    holder.owner,
                    lamports
                );
                skipped += 1;
                continue;
            }
            allocations.push(RewardAllocation {
                owner: holder.owner,
                rank: holder.rank,
                total_burned: holder.total_burned,
                lamports,
                included: true,
            });
        }

        Ok(AllocationPlan {
            distributable,
            total_weight,
            allocations,
            skipped,
        })
    }
}
