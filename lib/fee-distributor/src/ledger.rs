//! Reads and writes the distributor needs from the ledger.
//!
//! [`Ledger`] is implemented for the nonblocking [`RpcClient`]; every method is
//! a single round trip and nothing is retried here.

use crate::{Error, Result};
use async_trait::async_trait;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::{
    config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    filter::RpcFilterType,
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};

/// Raw token balance of a token account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub amount: u64,
    pub decimals: u8,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// `None` if the account does not exist.
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>>;

    async fn get_token_account_balance(&self, pubkey: &Pubkey) -> Result<TokenAmount>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// All accounts owned by `program_id` whose data is exactly `data_size` bytes.
    async fn get_program_accounts_by_size(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<(Pubkey, Account)>>;

    /// Submit a signed transaction and wait for confirmation.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature>;
}

#[async_trait]
impl Ledger for RpcClient {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        Ok(self
            .get_account_with_commitment(pubkey, self.commitment())
            .await?
            .value)
    }

    async fn get_token_account_balance(&self, pubkey: &Pubkey) -> Result<TokenAmount> {
        let balance = RpcClient::get_token_account_balance(self, pubkey).await?;
        let amount = balance
            .amount
            .parse::<u64>()
            .map_err(|_| Error::InvalidTokenAmount {
                account: *pubkey,
                amount: balance.amount.clone(),
            })?;
        Ok(TokenAmount {
            amount,
            decimals: balance.decimals,
        })
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        Ok(RpcClient::get_minimum_balance_for_rent_exemption(self, data_len).await?)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(RpcClient::get_latest_blockhash(self).await?)
    }

    async fn get_program_accounts_by_size(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::DataSize(data_size)]),
            account_config: RpcAccountInfoConfig {
                commitment: Some(CommitmentConfig::confirmed()),
                ..Default::default()
            },
            ..Default::default()
        };
        Ok(self
            .get_program_accounts_with_config(program_id, config)
            .await?)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        tracing::trace!("submitting transaction");
        Ok(self.send_and_confirm_transaction(tx).await?)
    }
}
