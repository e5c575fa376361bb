use crate::{
    allocation::RewardAllocation, ledger::Ledger, utils::lamports_to_sol,
    utils::sign_transaction, Result,
};
use solana_sdk::{
    signature::Signature,
    signer::{keypair::Keypair, Signer},
};
use solana_system_interface::instruction::transfer;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutStatus {
    Succeeded(Signature),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutOutcome {
    pub allocation: RewardAllocation,
    pub status: PayoutStatus,
}

impl PayoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, PayoutStatus::Succeeded(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_below_floor: usize,
    /// Lamports of the successful transfers.
    pub distributed_lamports: u64,
    pub outcomes: Vec<PayoutOutcome>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    fn record(&mut self, outcome: PayoutOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
            self.distributed_lamports += outcome.allocation.lamports;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// Sends one transfer per allocation, one at a time.
pub struct PayoutDispatcher<'a, L: ?Sized> {
    ledger: &'a L,
    signer: &'a Keypair,
    delay: Duration,
}

impl<'a, L: Ledger + ?Sized> PayoutDispatcher<'a, L> {
    pub fn new(ledger: &'a L, signer: &'a Keypair, delay: Duration) -> Self {
        Self {
            ledger,
            signer,
            delay,
        }
    }

    async fn send(&self, allocation: &RewardAllocation) -> Result<Signature> {
        let instruction = transfer(&self.signer.pubkey(), &allocation.owner, allocation.lamports);
        let blockhash = self.ledger.get_latest_blockhash().await?;
        let tx = sign_transaction(&[instruction], self.signer, blockhash)?;
        self.ledger.send_transaction(&tx).await
    }

    /// Attempt every allocation exactly once. A failed transfer is recorded
    /// and does not stop the batch. `delay` is awaited between submissions.
    pub async fn dispatch(&self, allocations: &[RewardAllocation]) -> BatchOutcome {
        let mut batch = BatchOutcome {
            outcomes: Vec::with_capacity(allocations.len()),
            ..<_>::default()
        };

        for (i, allocation) in allocations.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let status = match self.send(allocation).await {
                Ok(signature) => {
                    tracing::info!(
                        recipient = %allocation.owner,
                        %signature,
                        "sent {} SOL",
                        lamports_to_sol(allocation.lamports)
                    );
                    PayoutStatus::Succeeded(signature)
                }
                Err(error) => {
                    tracing::error!(
                        recipient = %allocation.owner,
                        "failed to send {} SOL: {}",
                        lamports_to_sol(allocation.lamports),
                        error
                    );
                    PayoutStatus::Failed(error.to_string())
                }
            };
            batch.record(PayoutOutcome {
                allocation: *allocation,
                status,
            });
        }

        tracing::info!(
            "distribution complete: {} successful, {} failed, {} SOL sent",
            batch.succeeded,
            batch.failed,
            lamports_to_sol(batch.distributed_lamports)
        );
        batch
    }
}
