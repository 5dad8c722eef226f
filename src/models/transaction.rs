use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// The kind of on-chain operation a transaction represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Swap,
    Deposit,
    Withdraw,
    Borrow,
    Repay,
}

/// A single transaction row from the history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_hash: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub token_in: String,
    pub token_out: String,
    /// Amounts are decimal strings; the backend never truncates them to floats
    pub amount_in: String,
    pub amount_out: String,
    #[serde(default)]
    pub price: Option<String>,
    pub status: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

/// Classified transaction status, for display grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
    Unknown,
}

impl Transaction {
    /// Classify the free-form status field. Unrecognized statuses are kept
    /// rather than rejected, so a new backend status never breaks decoding.
    pub fn status_kind(&self) -> TransactionStatus {
        match self.status.to_ascii_lowercase().as_str() {
            "completed" => TransactionStatus::Completed,
            "pending" => TransactionStatus::Pending,
            "failed" => TransactionStatus::Failed,
            _ => TransactionStatus::Unknown,
        }
    }
}

/// One page of transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total_pages: u32,
}
