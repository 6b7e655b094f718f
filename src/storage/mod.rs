//! Persistence seam for the ledger.
//!
//! Every mutating ledger operation (`record_*`) is atomic in the store: the
//! journal row, the token counter and the balances change together or not at
//! all.

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use crate::domain::error::LedgerResult;
use crate::domain::model::{
    Balance, Event, OfflineTransfer, OfflineTransferDraft, Purchase, PurchaseDraft, Session,
    Token, Transfer, TransferDraft, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Cheap liveness check used by `/api/health`.
    async fn ping(&self) -> LedgerResult<()>;

    // --- accounts ---
    async fn insert_user(&self, user: &User) -> LedgerResult<()>;
    async fn user_by_id(&self, id: Uuid) -> LedgerResult<Option<User>>;
    /// `email` must already be lower-cased.
    async fn user_by_email(&self, email: &str) -> LedgerResult<Option<User>>;
    /// `address` must already be normalized.
    async fn user_by_wallet(&self, address: &str) -> LedgerResult<Option<User>>;

    async fn insert_session(&self, session: &Session) -> LedgerResult<()>;
    /// Resolves a session that has not expired at `now`.
    async fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> LedgerResult<Option<User>>;
    /// Deletes sessions expired at `now`; returns how many were removed.
    async fn prune_sessions(&self, now: DateTime<Utc>) -> LedgerResult<u64>;

    // --- catalog ---
    async fn insert_event(&self, event: &Event) -> LedgerResult<()>;
    async fn event_by_id(&self, id: Uuid) -> LedgerResult<Option<Event>>;
    /// Newest first.
    async fn events_by_organizer(&self, organizer_id: Uuid) -> LedgerResult<Vec<Event>>;
    /// Active events ordered by date.
    async fn active_events(&self) -> LedgerResult<Vec<Event>>;
    async fn set_event_active(&self, id: Uuid, is_active: bool) -> LedgerResult<Event>;

    async fn insert_token(&self, token: &Token) -> LedgerResult<()>;
    /// Oldest first.
    async fn tokens_for_event(&self, event_id: Uuid) -> LedgerResult<Vec<Token>>;
    async fn token_by_address(&self, address: &str) -> LedgerResult<Option<Token>>;
    async fn set_token_active(&self, address: &str, is_active: bool) -> LedgerResult<Token>;

    // --- ledger ---
    /// Non-zero balances of a user.
    async fn balances_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Balance>>;
    async fn record_purchase(&self, draft: PurchaseDraft) -> LedgerResult<(Purchase, Token)>;
    async fn record_transfer(&self, draft: TransferDraft) -> LedgerResult<Transfer>;
    async fn record_offline_transfer(
        &self,
        draft: OfflineTransferDraft,
    ) -> LedgerResult<(OfflineTransfer, Token)>;

    // --- journal ---
    async fn purchases_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Purchase>>;
    /// Transfers sent by the user.
    async fn transfers_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Transfer>>;
    /// Offline grants received by the user.
    async fn offline_transfers_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<OfflineTransfer>>;
}
