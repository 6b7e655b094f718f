use crate::domain::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which purchase channels a token accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaleMode {
    Online,
    Offline,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleChannel {
    /// Paid purchase by the participant.
    Online,
    /// Cashier grant at the venue, no payment validation.
    Offline,
}

impl SaleMode {
    pub fn allows(self, channel: SaleChannel) -> bool {
        matches!(
            (self, channel),
            (SaleMode::Both, _)
                | (SaleMode::Online, SaleChannel::Online)
                | (SaleMode::Offline, SaleChannel::Offline)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SaleMode::Online => "online",
            SaleMode::Offline => "offline",
            SaleMode::Both => "both",
        }
    }
}

impl fmt::Display for SaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(SaleMode::Online),
            "offline" => Ok(SaleMode::Offline),
            "both" => Ok(SaleMode::Both),
            other => Err(LedgerError::validation(format!("unknown sale mode '{}'", other))),
        }
    }
}

impl fmt::Display for SaleChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleChannel::Online => f.write_str("online"),
            SaleChannel::Offline => f.write_str("offline"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Token {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub contract_address: String,
    pub price_cents: i64,
    pub initial_supply: i64,
    pub total_sold: i64,
    pub sale_mode: SaleMode,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Headroom left for sales and grants.
    pub fn remaining(&self) -> i64 {
        self.initial_supply - self.total_sold
    }
}
