//! Claims the creator fee vault of the configured wallet and pays a share of
//! the proceeds to burn registry holders.
//!
//! The wallet is read from `WALLET_PRIVATE_KEY` (base58). A `.env` file in the
//! working directory is loaded if present.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fee_distributor::{
    utils::lamports_to_sol, BatchOutcome, CollectOutcome, Error, FeeDistributor, PayoutStatus,
    VaultBalance,
};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "fee-distributor-agent")]
#[command(about = "Claim creator fees and share them with burn registry holders")]
struct Args {
    /// TOML config file, `-` to read it from stdin
    #[arg(short, long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Claim the vault and distribute the rewards
    #[default]
    Run,
    /// Print the creator vault balances without sending anything
    Inspect,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = Config::load(args.config.as_deref());
    let filter = match &config {
        Ok(config) => config.log_filter.clone(),
        Err(_) => Config::default_log_filter(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("{}", error);
            std::process::exit(1);
        }
    };

    if let Err(error) = run(args.command.unwrap_or_default(), config).await {
        tracing::error!("{:#}", error);
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let signer = Arc::new(config::keypair_from_env()?);
    tracing::info!("using rpc {}", config.rpc_url);
    let rpc = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));
    let distributor = FeeDistributor::new(config.distributor, signer, rpc)?;

    match command {
        Command::Run => {
            let report = match distributor.run_cycle().await {
                Ok(report) => report,
                Err(Error::DistributionFailed {
                    claimed,
                    signature,
                    reason,
                }) => {
                    anyhow::bail!(
                        "{} SOL claimed in {} were not distributed: {}",
                        lamports_to_sol(claimed),
                        signature,
                        reason
                    );
                }
                Err(error) => return Err(error).context("fee distribution cycle failed"),
            };
            log_collect(&report.collect);
            if let Some(batch) = &report.distribution {
                log_batch(batch);
            }
        }
        Command::Inspect => {
            let report = distributor
                .inspect()
                .await
                .context("failed to read creator vaults")?;
            tracing::info!("creator: {}", report.creator);
            log_vault("amm vault", &report.amm_vault, &report.amm_balance);
            log_vault(
                "bonding curve vault",
                &report.bonding_curve_vault,
                &report.bonding_curve_balance,
            );
        }
    }
    Ok(())
}

fn log_collect(outcome: &CollectOutcome) {
    match outcome {
        CollectOutcome::VaultMissing => tracing::info!("nothing claimed, vault does not exist"),
        CollectOutcome::NothingToClaim => tracing::info!("nothing claimed, vault is empty"),
        CollectOutcome::BelowThreshold {
            claimable,
            threshold,
        } => tracing::info!(
            "nothing claimed, {} SOL is below {} SOL",
            lamports_to_sol(*claimable),
            lamports_to_sol(*threshold)
        ),
        CollectOutcome::Claimed {
            amount, signature, ..
        } => tracing::info!(%signature, "claimed {} SOL", lamports_to_sol(*amount)),
    }
}

fn log_batch(batch: &BatchOutcome) {
    for outcome in &batch.outcomes {
        if let PayoutStatus::Failed(reason) = &outcome.status {
            tracing::warn!(
                "unpaid: {} SOL to {}: {}",
                lamports_to_sol(outcome.allocation.lamports),
                outcome.allocation.owner,
                reason
            );
        }
    }
    tracing::info!(
        "paid {} holders, {} failed, {} below minimum, {} SOL total",
        batch.succeeded,
        batch.failed,
        batch.skipped_below_floor,
        lamports_to_sol(batch.distributed_lamports)
    );
}

fn log_vault(name: &str, address: &Pubkey, balance: &VaultBalance) {
    if !balance.exists {
        tracing::info!("{} {}: not created", name, address);
        return;
    }
    tracing::info!(
        "{} {}: balance={}, reserved={}, claimable={}",
        name,
        address,
        balance.raw_balance,
        balance.reserve_floor,
        balance.claimable
    );
}
