use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An application account and the wallet bound to it.
///
/// Secrets never leave the service through `Serialize`; the profile endpoint
/// exposes the custodial key explicitly through [`WalletInfo`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lower-cased; unique across accounts.
    pub email: String,
    pub phone: Option<String>,
    pub wallet_address: String,
    #[serde(skip_serializing, default)]
    pub wallet_private_key: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// True when the service generated (and holds) the wallet key.
    pub fn is_custodial(&self) -> bool {
        self.wallet_private_key.is_some()
    }

    pub fn wallet(&self) -> WalletInfo {
        WalletInfo {
            address: self.wallet_address.clone(),
            private_key: self.wallet_private_key.clone(),
            custodial: self.is_custodial(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletInfo {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub custodial: bool,
}

/// Bearer session. Only the SHA-256 of the token is kept.
#[derive(Debug, Clone)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
