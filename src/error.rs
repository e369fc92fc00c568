use std::fmt::Display;

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::PendingTransactionError,
    sol_types, transports,
};
use alloy_sol_types::{Panic, Revert, SolError};

/// Call/transaction revert reason, decoded from the standard `Error(string)`
/// or `Panic(uint256)` payloads when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    Message(String),
    Raw(Bytes),
    Unknown,
}

impl Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertReason::Message(msg) => write!(f, "{msg}"),
            RevertReason::Raw(data) => write!(f, "{data}"),
            RevertReason::Unknown => write!(f, "unknown reason"),
        }
    }
}

/// Error returned by the contract client, the indexer or the wallet.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transaction ran out of gas")]
    OutOfGas,

    #[error("transaction reverted: {0}")]
    Reverted(RevertReason),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction timed out")]
    Timeout,

    #[error("indexer error: {0}")]
    Indexer(String),

    #[error("invalid indexer value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("value does not fit decimal representation: {0}")]
    Overflow(U256),

    #[error("wallet is not connected")]
    NotConnected,

    #[error("wallet account mismatch, expected: {expected}, got: {actual}")]
    AccountMismatch { expected: Address, actual: Address },
}

impl From<PendingTransactionError> for DashboardError {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::FailedToRegister => Self::Fatal(value.to_string()),
            PendingTransactionError::TransportError(rpc_err) => Self::from(rpc_err),
            PendingTransactionError::Recv(_) => Self::Transport(value.to_string()),
            PendingTransactionError::TxWatcher(err) => match err {
                alloy::providers::WatchTxError::Timeout => Self::Timeout,
            },
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for DashboardError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                // Node error codes are not standardized, so classify by
                // code and message the same way most providers report them
                let msg = resp.message.to_ascii_lowercase();
                if resp.code == -32603 && (msg.contains("gas") || msg.contains("oog")) {
                    Self::OutOfGas
                } else if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else if resp.code == 3 || msg.contains("reverted") {
                    Self::Reverted(RevertReason::from(value))
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<sol_types::Error> for DashboardError {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Indexer(value.to_string())
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for RevertReason {
    fn from(value: transports::RpcError<E>) -> Self {
        match value.as_error_resp().and_then(|payload| payload.as_revert_data()) {
            Some(data) => RevertReason::from(data),
            None => match value.as_error_resp() {
                Some(payload) => Self::Message(payload.message.to_string()),
                None => Self::Unknown,
            },
        }
    }
}

impl From<Bytes> for RevertReason {
    fn from(value: Bytes) -> Self {
        if value.is_empty() {
            return Self::Unknown;
        }
        if let Ok(revert) = Revert::abi_decode(&value) {
            return Self::Message(revert.reason);
        }
        match Panic::abi_decode(&value) {
            Ok(panic) => Self::Message(format!("panic code {:#x}", panic.code)),
            Err(_) => Self::Raw(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_reason_from_error_string() {
        let data = Bytes::from(Revert {
            reason: "SY: bond not matured".to_string(),
        }
        .abi_encode());
        assert_eq!(
            RevertReason::from(data),
            RevertReason::Message("SY: bond not matured".to_string())
        );
    }

    #[test]
    fn test_revert_reason_from_panic() {
        let data = Bytes::from(
            Panic {
                code: U256::from(0x11),
            }
            .abi_encode(),
        );
        assert_eq!(
            RevertReason::from(data),
            RevertReason::Message("panic code 0x11".to_string())
        );
    }

    #[test]
    fn test_revert_reason_from_garbage() {
        assert_eq!(RevertReason::from(Bytes::new()), RevertReason::Unknown);
        let data = Bytes::from_static(&[0xde, 0xad]);
        assert_eq!(RevertReason::from(data.clone()), RevertReason::Raw(data));
    }
}
