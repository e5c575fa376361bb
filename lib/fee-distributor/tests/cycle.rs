use anyhow::anyhow;
use async_trait::async_trait;
use fee_distributor::{
    claim::ClaimTransactionBuilder, pda, prelude::*, registry::ACCOUNT_SIZE, CollectOutcome,
    ClaimedAmount, DistributorConfig, Error, FeeDistributor, PayoutDispatcher, PayoutStatus, RewardAllocation,
    TokenAmount,
};
use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::{RpcError, RpcResponseErrorData},
};
use solana_sdk::account::Account;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

const SOL: u64 = 1_000_000_000;

#[derive(Default)]
struct MockLedger {
    accounts: HashMap<Pubkey, Account>,
    token_balances: HashMap<Pubkey, TokenAmount>,
    registry: Vec<(Pubkey, Account)>,
    /// Indices of `send_transaction` calls that fail.
    fail_sends: HashSet<usize>,
    fail_reads: bool,
    fail_scan: bool,
    /// Error returned by failing sends, a plain transport error if unset.
    send_error: Option<fn() -> Error>,
    sent: Mutex<Vec<Transaction>>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockLedger {
    fn call(&self, name: &'static str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(name);
        if self.fail_reads {
            return Err(Error::custom(anyhow!("connection refused")));
        }
        Ok(())
    }

    fn called(&self, name: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| *c == name)
    }

    fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    fn with_token_vault(mut self, vault: Pubkey, amount: u64) -> Self {
        self.accounts.insert(vault, account(2_039_280, 165));
        self.token_balances.insert(
            vault,
            TokenAmount {
                amount,
                decimals: 9,
            },
        );
        self
    }

    fn with_holders(mut self, holders: &[(Pubkey, u64)]) -> Self {
        for (owner, burned) in holders {
            let holder = Account {
                data: record(owner, *burned),
                ..account(2_770_560, 0)
            };
            self.registry.push((Pubkey::new_unique(), holder));
        }
        self
    }
}

fn account(lamports: u64, data_len: usize) -> Account {
    Account {
        lamports,
        data: vec![0; data_len],
        owner: Pubkey::new_unique(),
        executable: false,
        rent_epoch: 0,
    }
}

fn record(owner: &Pubkey, total_burned: u64) -> Vec<u8> {
    let mut data = vec![0u8; ACCOUNT_SIZE];
    data[..8].copy_from_slice(&[7; 8]);
    data[8..40].copy_from_slice(owner.as_ref());
    data[40..48].copy_from_slice(&total_burned.to_le_bytes());
    data[48] = 2;
    data
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, Error> {
        self.call("get_account")?;
        Ok(self.accounts.get(pubkey).cloned())
    }

    async fn get_token_account_balance(&self, pubkey: &Pubkey) -> Result<TokenAmount, Error> {
        self.call("get_token_account_balance")?;
        self.token_balances
            .get(pubkey)
            .copied()
            .ok_or_else(|| Error::custom(anyhow!("could not find account")))
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, Error> {
        self.call("get_minimum_balance_for_rent_exemption")?;
        Ok((128 + data_len as u64) * 6960)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Error> {
        self.call("get_latest_blockhash")?;
        Ok(Hash::new_unique())
    }

    async fn get_program_accounts_by_size(
        &self,
        _: &Pubkey,
        _: u64,
    ) -> Result<Vec<(Pubkey, Account)>, Error> {
        self.call("get_program_accounts")?;
        if self.fail_scan {
            return Err(Error::custom(anyhow!("scan timed out")));
        }
        Ok(self.registry.clone())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, Error> {
        self.calls.lock().unwrap().push("send_transaction");
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len();
        sent.push(tx.clone());
        if self.fail_sends.contains(&index) {
            return Err(match self.send_error {
                Some(error) => error(),
                None => Error::custom(anyhow!("insufficient funds for rent")),
            });
        }
        Ok(tx.signatures[0])
    }
}

fn config() -> DistributorConfig {
    DistributorConfig {
        payout_delay_ms: 0,
        ..<_>::default()
    }
}

fn amm_vault(config: &DistributorConfig, creator: &Pubkey) -> Pubkey {
    ClaimTransactionBuilder::new(config)
        .vault(creator)
        .unwrap()
        .address
}

/// Recipient and lamports of a single system transfer transaction.
fn transfer_of(tx: &Transaction) -> (Pubkey, u64) {
    let ix = &tx.message.instructions[0];
    let recipient = tx.message.account_keys[ix.accounts[1] as usize];
    let lamports = u64::from_le_bytes(ix.data[4..12].try_into().unwrap());
    (recipient, lamports)
}

fn setup(
    ledger: impl FnOnce(&DistributorConfig, Pubkey) -> MockLedger,
) -> (FeeDistributor<MockLedger>, Arc<MockLedger>) {
    tracing_subscriber::fmt::try_init().ok();
    let config = config();
    let keypair = Keypair::new();
    let ledger = Arc::new(ledger(&config, keypair.pubkey()));
    (
        FeeDistributor::new(config, Arc::new(keypair), ledger.clone()).unwrap(),
        ledger,
    )
}

#[tokio::test]
async fn test_claim_and_distribute_two_holders() {
    let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
    let (distributor, ledger) = setup(|config, creator| {
        MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&[(a, 60), (b, 40)])
    });

    let report = distributor.run_cycle().await.unwrap();
    let CollectOutcome::Claimed {
        amount,
        created_destination,
        ..
    } = report.collect
    else {
        panic!("expected a claim, got {:?}", report.collect);
    };
    assert_eq!(amount, SOL);
    assert!(created_destination);

    let batch = report.distribution.unwrap();
    assert_eq!(batch.succeeded, 2);
    assert_eq!(batch.failed, 0);
    assert_eq!(batch.skipped_below_floor, 0);
    assert_eq!(batch.distributed_lamports, 800_000_000);

    let sent = ledger.sent();
    assert_eq!(sent.len(), 3);
    // create account, claim, close
    assert_eq!(sent[0].message.instructions.len(), 3);
    assert_eq!(transfer_of(&sent[1]), (a, 480_000_000));
    assert_eq!(transfer_of(&sent[2]), (b, 320_000_000));
}

#[tokio::test]
async fn test_single_holder_takes_all() {
    let holder = Pubkey::new_unique();
    let (distributor, ledger) = setup(|config, creator| {
        MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), 20_000_000)
            .with_holders(&[(holder, 1)])
    });

    let report = distributor.run_cycle().await.unwrap();
    assert_eq!(report.collect.claimed().lamports(), 20_000_000);
    let batch = report.distribution.unwrap();
    assert_eq!(batch.succeeded, 1);
    assert!(batch.outcomes[0].allocation.included);
    assert_eq!(batch.outcomes[0].allocation.lamports, 16_000_000);
    assert_eq!(transfer_of(&ledger.sent()[1]), (holder, 16_000_000));
}

#[tokio::test]
async fn test_below_threshold_skips_distribution() {
    let (distributor, ledger) = setup(|config, creator| {
        MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), 5_000_000)
            .with_holders(&[(Pubkey::new_unique(), 1)])
    });

    let report = distributor.run_cycle().await.unwrap();
    assert_eq!(
        report.collect,
        CollectOutcome::BelowThreshold {
            claimable: 5_000_000,
            threshold: 10_000_000
        }
    );
    assert!(report.collect.claimed().is_zero());
    assert!(report.distribution.is_none());
    assert!(!ledger.called("get_program_accounts"));
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn test_holder_below_floor_is_skipped() {
    let (big, small) = (Pubkey::new_unique(), Pubkey::new_unique());
    let (distributor, ledger) = setup(|config, creator| {
        MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), 10_000_000)
            .with_holders(&[(big, 1_000_000), (small, 1)])
    });

    let batch = distributor.run_cycle().await.unwrap().distribution.unwrap();
    assert_eq!(batch.skipped_below_floor, 1);
    assert_eq!(batch.succeeded, 1);
    let big_share = (1_000_000u128 * 8_000_000 / 1_000_001) as u64;
    let small_share = (8_000_000u128 / 1_000_001) as u64;
    assert_eq!(batch.distributed_lamports, big_share);
    assert!(batch.distributed_lamports + small_share <= 8_000_000);
    assert_eq!(ledger.sent().len(), 2);
}

#[tokio::test]
async fn test_failed_payout_does_not_stop_batch() {
    let holders = (0..4).map(|_| (Pubkey::new_unique(), 25)).collect::<Vec<_>>();
    let (distributor, ledger) = setup(|config, creator| MockLedger {
        // send #0 is the claim, #2 is the second payout
        fail_sends: [2].into(),
        ..MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&holders)
    });

    let batch = distributor.run_cycle().await.unwrap().distribution.unwrap();
    assert_eq!(batch.succeeded, 3);
    assert_eq!(batch.failed, 1);
    assert_eq!(batch.attempted(), 4);
    assert_eq!(batch.outcomes.len(), 4);
    assert_eq!(batch.distributed_lamports, 3 * 200_000_000);
    for (outcome, (owner, _)) in batch.outcomes.iter().zip(&holders) {
        assert_eq!(outcome.allocation.owner, *owner);
    }
    match &batch.outcomes[1].status {
        PayoutStatus::Failed(reason) => assert!(reason.contains("insufficient funds"), "{reason}"),
        status => panic!("expected failure, got {status:?}"),
    }
    assert!(batch.outcomes[3].is_success());
    assert_eq!(ledger.sent().len(), 5);
}

#[tokio::test]
async fn test_failed_claim_aborts_cycle() {
    let (distributor, ledger) = setup(|config, creator| MockLedger {
        fail_sends: [0].into(),
        ..MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&[(Pubkey::new_unique(), 1)])
    });

    let err = distributor.run_cycle().await.unwrap_err();
    match err {
        Error::ClaimFailed { amount, reason, .. } => {
            assert_eq!(amount, SOL);
            assert!(reason.contains("insufficient funds"), "{reason}");
        }
        err => panic!("expected claim failure, got {err}"),
    }
    assert!(!ledger.called("get_program_accounts"));
    assert_eq!(ledger.sent().len(), 1);
}

#[tokio::test]
async fn test_existing_destination_is_not_created() {
    let (distributor, ledger) = setup(|config, creator| {
        let destination =
            pda::associated_token_address(&creator, &config.programs.quote_mint, &config.programs.token_program)
                .unwrap()
                .address;
        let mut ledger = MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&[(Pubkey::new_unique(), 1)]);
        ledger.accounts.insert(destination, account(2_039_280, 165));
        ledger
    });

    let outcome = distributor.collect().await.unwrap();
    assert!(matches!(
        outcome,
        CollectOutcome::Claimed {
            created_destination: false,
            ..
        }
    ));
    assert_eq!(ledger.sent()[0].message.instructions.len(), 2);
}

#[tokio::test]
async fn test_missing_vault() {
    let (distributor, ledger) = setup(|_, _| MockLedger::default());
    let report = distributor.run_cycle().await.unwrap();
    assert_eq!(report.collect, CollectOutcome::VaultMissing);
    assert!(report.distribution.is_none());
    assert!(!ledger.called("get_token_account_balance"));
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn test_empty_vault() {
    let (distributor, _) =
        setup(|config, creator| MockLedger::default().with_token_vault(amm_vault(config, &creator), 0));
    assert_eq!(
        distributor.collect().await.unwrap(),
        CollectOutcome::NothingToClaim
    );
}

#[tokio::test]
async fn test_transport_error_is_reported() {
    let (distributor, ledger) = setup(|_, _| MockLedger {
        fail_reads: true,
        ..Default::default()
    });
    let err = distributor.run_cycle().await.unwrap_err();
    assert!(err.to_string().contains("connection refused"), "{err}");
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_registry_records_are_skipped() {
    let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
    let (distributor, ledger) = setup(|config, creator| {
        let mut ledger = MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&[(a, 50)]);
        ledger
            .registry
            .push((Pubkey::new_unique(), account(1_000_000, 30)));
        ledger.with_holders(&[(b, 50)])
    });

    let batch = distributor.run_cycle().await.unwrap().distribution.unwrap();
    assert_eq!(batch.succeeded, 2);
    let sent = ledger.sent();
    assert_eq!(transfer_of(&sent[1]), (a, 400_000_000));
    assert_eq!(transfer_of(&sent[2]), (b, 400_000_000));
}

#[tokio::test]
async fn test_zero_weight_registry() {
    let (distributor, ledger) = setup(|config, creator| {
        MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&[(Pubkey::new_unique(), 0)])
    });

    let batch = distributor.run_cycle().await.unwrap().distribution.unwrap();
    assert_eq!(batch.attempted(), 0);
    assert_eq!(batch.skipped_below_floor, 0);
    assert_eq!(ledger.sent().len(), 1);
}

#[tokio::test]
async fn test_inspect_native_vault() {
    let (distributor, _) = setup(|config, creator| {
        let vault = pda::bonding_curve_creator_vault(&creator, &config.programs.fee_program)
            .unwrap()
            .address;
        let mut ledger = MockLedger::default();
        ledger.accounts.insert(vault, account(2 * SOL, 0));
        ledger
    });

    let report = distributor.inspect().await.unwrap();
    assert!(!report.amm_balance.exists);
    assert!(report.bonding_curve_balance.exists);
    assert_eq!(report.bonding_curve_balance.reserve_floor, 890_880);
    assert_eq!(report.bonding_curve_balance.claimable, 2 * SOL - 890_880);
}

#[tokio::test(start_paused = true)]
async fn test_payouts_are_throttled() {
    let ledger = MockLedger::default();
    let signer = Keypair::new();
    let allocations = (0..3)
        .map(|_| RewardAllocation {
            owner: Pubkey::new_unique(),
            rank: 0,
            total_burned: 1,
            lamports: 10_000,
            included: true,
        })
        .collect::<Vec<_>>();

    let start = tokio::time::Instant::now();
    let batch = PayoutDispatcher::new(&ledger, &signer, Duration::from_millis(500))
        .dispatch(&allocations)
        .await;
    assert_eq!(batch.succeeded, 3);
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert!(start.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_failed_distribution_keeps_claim() {
    let (distributor, ledger) = setup(|config, creator| MockLedger {
        fail_scan: true,
        ..MockLedger::default()
            .with_token_vault(amm_vault(config, &creator), SOL)
            .with_holders(&[(Pubkey::new_unique(), 1)])
    });

    let err = distributor.run_cycle().await.unwrap_err();
    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    match &err {
        Error::DistributionFailed {
            claimed,
            signature,
            reason,
        } => {
            assert_eq!(*claimed, SOL);
            assert_eq!(*signature, sent[0].signatures[0]);
            assert!(reason.contains("scan timed out"), "{reason}");
        }
        err => panic!("expected distribution failure, got {err}"),
    }
    let message = err.to_string();
    assert!(message.contains(&SOL.to_string()), "{message}");
    assert!(message.contains(&sent[0].signatures[0].to_string()), "{message}");

    // distribute on its own reports the plain transport error
    let err = distributor.distribute(ClaimedAmount(SOL)).await.unwrap_err();
    assert!(matches!(err, Error::Any(_)), "{err}");
}

#[tokio::test]
async fn test_claim_failure_names_instruction() {
    fn simulation_error() -> Error {
        ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: -32002,
            message: "Transaction simulation failed: Error processing Instruction 1: \
                      custom program error: 0x1771"
                .to_owned(),
            data: RpcResponseErrorData::Empty,
        }))
        .into()
    }

    let (distributor, ledger) = setup(|config, creator| MockLedger {
        fail_sends: [0].into(),
        send_error: Some(simulation_error),
        ..MockLedger::default().with_token_vault(amm_vault(config, &creator), SOL)
    });

    match distributor.collect().await.unwrap_err() {
        Error::ClaimFailed {
            amount,
            vault,
            reason,
        } => {
            assert_eq!(amount, SOL);
            assert_eq!(vault, amm_vault(distributor.config(), &distributor.creator()));
            assert!(reason.starts_with("collect creator fee failed"), "{reason}");
            assert!(reason.contains("0x1771"), "{reason}");
        }
        err => panic!("expected claim failure, got {err}"),
    }
    // destination was missing, so the claim is the second instruction
    assert_eq!(ledger.sent()[0].message.instructions.len(), 3);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = DistributorConfig {
        distribution_ratio: rust_decimal_macros::dec!(1.5),
        ..config()
    };
    let result = FeeDistributor::new(
        config,
        Arc::new(Keypair::new()),
        Arc::new(MockLedger::default()),
    );
    assert!(result.is_err());
}
