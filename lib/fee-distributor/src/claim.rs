//! Claim transaction: create the creator's wrapped SOL account if needed,
//! collect the creator fee into it, then close it to unwrap.

use crate::{
    config::DistributorConfig,
    error::find_failed_instruction,
    ledger::Ledger,
    pda::{self, DerivedAddress},
    utils::sign_transaction,
    Error, Result,
};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Signature,
    signer::{keypair::Keypair, Signer},
};
use spl_associated_token_account::instruction::create_associated_token_account;

/// Discriminator of the AMM program's `collect_coin_creator_fee` instruction.
pub const COLLECT_CREATOR_FEE_DISCRIMINATOR: [u8; 8] = [160, 57, 89, 42, 181, 139, 43, 66];

#[derive(Debug, Clone)]
pub struct ClaimPlan {
    pub creator: Pubkey,
    pub vault_authority: DerivedAddress,
    /// Token account of the vault authority holding the fees.
    pub vault: DerivedAddress,
    /// Creator's token account the fees are moved into before unwrapping.
    pub destination: DerivedAddress,
    pub event_authority: DerivedAddress,
    pub create_destination: bool,
    pub instructions: Vec<Instruction>,
}

impl ClaimPlan {
    /// Name of the instruction at `index`, for error reports.
    pub fn instruction_name(&self, index: usize) -> &'static str {
        let index = if self.create_destination {
            index
        } else {
            index + 1
        };
        match index {
            0 => "create destination account",
            1 => "collect creator fee",
            2 => "close destination account",
            _ => "unknown instruction",
        }
    }
}

pub struct ClaimTransactionBuilder<'a> {
    config: &'a DistributorConfig,
}

impl<'a> ClaimTransactionBuilder<'a> {
    pub fn new(config: &'a DistributorConfig) -> Self {
        Self { config }
    }

    /// Address of the fee vault for `creator`.
    pub fn vault(&self, creator: &Pubkey) -> Result<DerivedAddress> {
        let programs = &self.config.programs;
        let authority = pda::vault_authority(creator, &programs.amm_program)?;
        pda::associated_token_address(
            &authority.address,
            &programs.quote_mint,
            &programs.token_program,
        )
    }

    /// Build the instructions without touching the ledger.
    pub fn plan(&self, creator: &Pubkey, create_destination: bool) -> Result<ClaimPlan> {
        let programs = &self.config.programs;
        let vault_authority = pda::vault_authority(creator, &programs.amm_program)?;
        let vault = pda::associated_token_address(
            &vault_authority.address,
            &programs.quote_mint,
            &programs.token_program,
        )?;
        let destination =
            pda::associated_token_address(creator, &programs.quote_mint, &programs.token_program)?;
        let event_authority = pda::event_authority(&programs.amm_program)?;

        let mut instructions = Vec::with_capacity(3);

        if create_destination {
            instructions.push(create_associated_token_account(
                creator,
                creator,
                &programs.quote_mint,
                &programs.token_program,
            ));
        }

        // account order is part of the program's ABI
        instructions.push(Instruction {
            program_id: programs.amm_program,
            accounts: vec![
                AccountMeta::new_readonly(programs.quote_mint, false),
                AccountMeta::new_readonly(programs.token_program, false),
                AccountMeta::new_readonly(*creator, false),
                AccountMeta::new_readonly(vault_authority.address, false),
                AccountMeta::new(vault.address, false),
                AccountMeta::new(destination.address, false),
                AccountMeta::new_readonly(event_authority.address, false),
                AccountMeta::new_readonly(programs.amm_program, false),
            ],
            data: COLLECT_CREATOR_FEE_DISCRIMINATOR.to_vec(),
        });

        instructions.push(
            spl_token::instruction::close_account(
                &programs.token_program,
                &destination.address,
                creator,
                creator,
                &[],
            )
            .map_err(Error::custom)?,
        );

        Ok(ClaimPlan {
            creator: *creator,
            vault_authority,
            vault,
            destination,
            event_authority,
            create_destination,
            instructions,
        })
    }

    /// Build the instructions, creating the destination account only if it
    /// does not exist yet.
    pub async fn prepare<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        creator: &Pubkey,
    ) -> Result<ClaimPlan> {
        let destination = pda::associated_token_address(
            creator,
            &self.config.programs.quote_mint,
            &self.config.programs.token_program,
        )?;
        let create_destination = ledger.get_account(&destination.address).await?.is_none();
        if create_destination {
            tracing::info!("creating token account {}", destination.address);
        }
        self.plan(creator, create_destination)
    }

    /// Sign and submit all instructions of `plan` as one transaction.
    pub async fn submit<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        signer: &Keypair,
        plan: &ClaimPlan,
        amount: u64,
    ) -> Result<Signature> {
        let submit = async {
            let blockhash = ledger.get_latest_blockhash().await?;
            let tx = sign_transaction(&plan.instructions, signer, blockhash)?;
            ledger.send_transaction(&tx).await
        };
        submit.await.map_err(|error| {
            let reason = match &error {
                Error::SolanaClient(e) => match find_failed_instruction(e) {
                    Some(index) => format!("{} failed: {}", plan.instruction_name(index), error),
                    None => error.to_string(),
                },
                _ => error.to_string(),
            };
            Error::ClaimFailed {
                amount,
                vault: plan.vault.address,
                reason,
            }
        })
    }
}
