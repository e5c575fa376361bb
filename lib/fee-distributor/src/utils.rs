use crate::Error;
use rust_decimal::{
    prelude::{MathematicalOps, ToPrimitive},
    Decimal,
};
use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, native_token::LAMPORTS_PER_SOL,
    signer::keypair::Keypair, signer::Signer, transaction::Transaction,
};

pub const SOL_DECIMALS: u8 = 9;

pub fn sol_to_lamports(amount: Decimal) -> crate::Result<u64> {
    if amount < Decimal::ZERO {
        return Err(Error::custom(anyhow::anyhow!("amount is negative")));
    }
    amount
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .and_then(|d| d.floor().to_u64())
        .ok_or(Error::AmountOverflow)
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(lamports as i128, SOL_DECIMALS as u32)
}

/// Convert a raw token amount of a mint with `decimals` into lamports.
///
/// Wrapped SOL has 9 decimals, in which case this is the identity.
pub fn token_amount_to_lamports(amount: u64, decimals: u8) -> crate::Result<u64> {
    match decimals.cmp(&SOL_DECIMALS) {
        std::cmp::Ordering::Equal => Ok(amount),
        std::cmp::Ordering::Less => Decimal::TEN
            .checked_powu((SOL_DECIMALS - decimals) as u64)
            .and_then(|scale| Decimal::from(amount).checked_mul(scale))
            .and_then(|d| d.to_u64())
            .ok_or(Error::AmountOverflow),
        std::cmp::Ordering::Greater => Decimal::TEN
            .checked_powu((decimals - SOL_DECIMALS) as u64)
            .and_then(|scale| Decimal::from(amount).checked_div(scale))
            .and_then(|d| d.floor().to_u64())
            .ok_or(Error::AmountOverflow),
    }
}

/// Multiply a lamport amount by a ratio, rounding down.
pub fn apply_ratio(lamports: u64, ratio: Decimal) -> crate::Result<u64> {
    Decimal::from(lamports)
        .checked_mul(ratio)
        .and_then(|d| d.floor().to_u64())
        .ok_or(Error::AmountOverflow)
}

/// Build a transaction paid for and signed by `signer` alone.
pub fn sign_transaction(
    instructions: &[Instruction],
    signer: &Keypair,
    recent_blockhash: Hash,
) -> crate::Result<Transaction> {
    let message =
        Message::new_with_blockhash(instructions, Some(&signer.pubkey()), &recent_blockhash);
    let mut tx = Transaction::new_unsigned(message);
    tx.try_sign(&[signer], recent_blockhash)?;
    Ok(tx)
}
