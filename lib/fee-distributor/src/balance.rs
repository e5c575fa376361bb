use crate::{ledger::Ledger, utils::SOL_DECIMALS, Result};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultBalance {
    pub exists: bool,
    pub raw_balance: u64,
    pub reserve_floor: u64,
    pub claimable: u64,
    pub decimals: u8,
}

impl VaultBalance {
    pub fn new(raw_balance: u64, reserve_floor: u64, decimals: u8) -> Self {
        Self {
            exists: true,
            raw_balance,
            reserve_floor,
            claimable: raw_balance.saturating_sub(reserve_floor),
            decimals,
        }
    }

    /// Balance of an account that does not exist.
    pub fn missing() -> Self {
        Self {
            exists: false,
            raw_balance: 0,
            reserve_floor: 0,
            claimable: 0,
            decimals: SOL_DECIMALS,
        }
    }
}

pub struct BalanceInspector<'a, L: ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> BalanceInspector<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Lamports held by `account` above its rent-exempt minimum.
    pub async fn native_balance(&self, account: &Pubkey) -> Result<VaultBalance> {
        let Some(info) = self.ledger.get_account(account).await? else {
            tracing::debug!("account {} does not exist", account);
            return Ok(VaultBalance::missing());
        };
        let reserve_floor = self
            .ledger
            .get_minimum_balance_for_rent_exemption(info.data.len())
            .await?;
        let balance = VaultBalance::new(info.lamports, reserve_floor, SOL_DECIMALS);
        tracing::debug!(
            "native balance of {}: lamports={}, data_len={}, rent_exempt={}, claimable={}",
            account,
            info.lamports,
            info.data.len(),
            reserve_floor,
            balance.claimable
        );
        Ok(balance)
    }

    /// Token balance of a token account. Token accounts keep their rent
    /// reserve in lamports, so the whole token amount is claimable.
    pub async fn token_balance(&self, account: &Pubkey) -> Result<VaultBalance> {
        if self.ledger.get_account(account).await?.is_none() {
            tracing::debug!("token account {} does not exist", account);
            return Ok(VaultBalance::missing());
        }
        let amount = self.ledger.get_token_account_balance(account).await?;
        tracing::debug!(
            "token balance of {}: amount={}, decimals={}",
            account,
            amount.amount,
            amount.decimals
        );
        Ok(VaultBalance::new(amount.amount, 0, amount.decimals))
    }
}
