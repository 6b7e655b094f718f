//! Append-only journal records and the per-user balances they move.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Completed,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_address: String,
    pub amount: i64,
    pub total_cents: i64,
    pub status: TxStatus,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transfer {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_address: String,
    /// Set when `to_address` belongs to a registered user.
    pub to_user_id: Option<Uuid>,
    pub token_address: String,
    pub amount: i64,
    pub status: TxStatus,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfflineTransfer {
    pub id: Uuid,
    pub to_user_id: Uuid,
    pub from_cashier_id: Uuid,
    pub token_address: String,
    pub amount: i64,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Balance {
    pub user_id: Uuid,
    pub token_address: String,
    pub amount: i64,
}

/// History entry; serialized with a `type` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transaction {
    Purchase(Purchase),
    Transfer(Transfer),
    OfflineTransfer(OfflineTransfer),
}

impl Transaction {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Transaction::Purchase(p) => p.timestamp,
            Transaction::Transfer(t) => t.timestamp,
            Transaction::OfflineTransfer(o) => o.timestamp,
        }
    }
}

// Drafts carry what the caller decided; the store settles them against the
// locked token/balance rows.

#[derive(Debug, Clone)]
pub struct PurchaseDraft {
    pub user_id: Uuid,
    pub token_address: String,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct TransferDraft {
    pub from_user_id: Uuid,
    pub to_address: String,
    pub to_user_id: Option<Uuid>,
    pub token_address: String,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct OfflineTransferDraft {
    pub to_user_id: Uuid,
    pub from_cashier_id: Uuid,
    pub token_address: String,
    pub amount: i64,
}
