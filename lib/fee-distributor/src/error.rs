use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::{RpcError, RpcResponseErrorData},
    response::RpcSimulateTransactionResult,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature, signer::SignerError};
use std::result::Result as StdResult;
use thiserror::Error as ThisError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Any(#[from] anyhow::Error),
    #[error("{}", verbose_solana_error(.0))]
    SolanaClient(#[from] Box<ClientError>),
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),
    #[error("no viable bump seed found for program {0}")]
    NoViableBump(Pubkey),
    #[error("invalid token amount {amount:?} for account {account}")]
    InvalidTokenAmount { account: Pubkey, amount: String },
    #[error("amount overflow")]
    AmountOverflow,
    #[error("claim of {amount} lamports from vault {vault} failed: {reason}")]
    ClaimFailed {
        amount: u64,
        vault: Pubkey,
        reason: String,
    },
    /// The claim went through but the holders were not paid.
    #[error("claimed {claimed} lamports in {signature} but distribution failed: {reason}")]
    DistributionFailed {
        claimed: u64,
        signature: Signature,
        reason: String,
    },
}

impl From<ClientError> for Error {
    fn from(error: ClientError) -> Self {
        Error::SolanaClient(Box::new(error))
    }
}

impl Error {
    pub fn custom<E: Into<anyhow::Error>>(e: E) -> Self {
        Error::Any(e.into())
    }
}

/// Render an RPC error together with the simulation logs, if any.
pub fn verbose_solana_error(err: &ClientError) -> String {
    use std::fmt::Write;
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        code,
        message,
        data,
    }) = err.kind()
    {
        let mut s = String::new();
        writeln!(s, "{} ({})", message, code).ok();
        if let RpcResponseErrorData::SendTransactionPreflightFailure(
            RpcSimulateTransactionResult {
                logs: Some(logs), ..
            },
        ) = data
        {
            for (i, log) in logs.iter().enumerate() {
                writeln!(s, "{}: {}", i + 1, log).ok();
            }
        }
        s
    } else {
        err.to_string()
    }
}

/// Index of the instruction that failed simulation, parsed from the RPC message.
pub fn find_failed_instruction(err: &ClientError) -> Option<usize> {
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError { message, .. }) = err.kind() {
        let s = message
            .strip_prefix("Transaction simulation failed: Error processing Instruction ")?;
        let index = s
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>();
        index.parse().ok()
    } else {
        None
    }
}
