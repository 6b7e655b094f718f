//! PostgreSQL store.
//!
//! Tables and indexes are created on connect. Ledger operations lock the
//! token row (`FOR UPDATE`) first, which serializes every counter and balance
//! change for that token, then settle through `domain::ledger` and commit.

use crate::domain::error::{LedgerError, LedgerResult};
use crate::domain::ledger;
use crate::domain::model::{
    Balance, Event, OfflineTransfer, OfflineTransferDraft, Purchase, PurchaseDraft, SaleMode,
    Session, Token, Transfer, TransferDraft, TxStatus, User,
};
use crate::storage::LedgerStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        wallet_address TEXT NOT NULL,
        wallet_private_key TEXT,
        password_hash TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_wallet_address_key ON users (wallet_address)",
    "CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users (id),
        expires_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS sessions_user_id_idx ON sessions (user_id)",
    "CREATE INDEX IF NOT EXISTS sessions_expires_at_idx ON sessions (expires_at)",
    "CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY,
        organizer_id UUID NOT NULL REFERENCES users (id),
        name TEXT NOT NULL,
        description TEXT,
        location TEXT,
        date TIMESTAMPTZ NOT NULL,
        contract_address TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS events_organizer_id_idx ON events (organizer_id)",
    "CREATE INDEX IF NOT EXISTS events_date_idx ON events (date)",
    "CREATE INDEX IF NOT EXISTS events_is_active_idx ON events (is_active)",
    "CREATE TABLE IF NOT EXISTS tokens (
        id UUID PRIMARY KEY,
        event_id UUID NOT NULL REFERENCES events (id),
        name TEXT NOT NULL,
        contract_address TEXT NOT NULL UNIQUE,
        price_cents BIGINT NOT NULL CHECK (price_cents > 0),
        initial_supply BIGINT NOT NULL CHECK (initial_supply > 0),
        total_sold BIGINT NOT NULL DEFAULT 0,
        sale_mode TEXT NOT NULL CHECK (sale_mode IN ('online', 'offline', 'both')),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL,
        CHECK (total_sold >= 0 AND total_sold <= initial_supply)
    )",
    "CREATE INDEX IF NOT EXISTS tokens_event_id_idx ON tokens (event_id)",
    "CREATE INDEX IF NOT EXISTS tokens_is_active_idx ON tokens (is_active)",
    "CREATE TABLE IF NOT EXISTS balances (
        user_id UUID NOT NULL REFERENCES users (id),
        token_address TEXT NOT NULL REFERENCES tokens (contract_address),
        amount BIGINT NOT NULL CHECK (amount >= 0),
        PRIMARY KEY (user_id, token_address)
    )",
    "CREATE TABLE IF NOT EXISTS purchases (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users (id),
        token_address TEXT NOT NULL,
        amount BIGINT NOT NULL CHECK (amount > 0),
        total_cents BIGINT NOT NULL,
        status TEXT NOT NULL,
        tx_hash TEXT NOT NULL,
        occurred_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS purchases_user_id_idx ON purchases (user_id)",
    "CREATE INDEX IF NOT EXISTS purchases_token_address_idx ON purchases (token_address)",
    "CREATE INDEX IF NOT EXISTS purchases_occurred_at_idx ON purchases (occurred_at)",
    "CREATE TABLE IF NOT EXISTS transfers (
        id UUID PRIMARY KEY,
        from_user_id UUID NOT NULL REFERENCES users (id),
        to_address TEXT NOT NULL,
        to_user_id UUID,
        token_address TEXT NOT NULL,
        amount BIGINT NOT NULL CHECK (amount > 0),
        status TEXT NOT NULL,
        tx_hash TEXT NOT NULL,
        occurred_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS transfers_from_user_id_idx ON transfers (from_user_id)",
    "CREATE INDEX IF NOT EXISTS transfers_to_address_idx ON transfers (to_address)",
    "CREATE INDEX IF NOT EXISTS transfers_occurred_at_idx ON transfers (occurred_at)",
    "CREATE TABLE IF NOT EXISTS offline_transfers (
        id UUID PRIMARY KEY,
        to_user_id UUID NOT NULL REFERENCES users (id),
        from_cashier_id UUID NOT NULL REFERENCES users (id),
        token_address TEXT NOT NULL,
        amount BIGINT NOT NULL CHECK (amount > 0),
        tx_hash TEXT NOT NULL,
        occurred_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS offline_transfers_to_user_id_idx ON offline_transfers (to_user_id)",
    "CREATE INDEX IF NOT EXISTS offline_transfers_from_cashier_id_idx ON offline_transfers (from_cashier_id)",
    "CREATE INDEX IF NOT EXISTS offline_transfers_occurred_at_idx ON offline_transfers (occurred_at)",
];

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // unique_violation
            if db_err.code().as_deref() == Some("23505") {
                let msg = match db_err.constraint() {
                    Some("users_email_key") => "Email is already registered".to_string(),
                    Some("users_wallet_address_key") => {
                        "Wallet is already linked to another account".to_string()
                    }
                    Some("tokens_contract_address_key") => {
                        "Token contract address is already registered".to_string()
                    }
                    Some(other) => format!("Duplicate value violates '{}'", other),
                    None => db_err.message().to_string(),
                };
                return LedgerError::Conflict(msg);
            }
        }
        LedgerError::Storage(anyhow::Error::new(err))
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        wallet_address: row.try_get("wallet_address")?,
        wallet_private_key: row.try_get("wallet_private_key")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event_from_row(row: &PgRow) -> Result<Event, sqlx::Error> {
    Ok(Event {
        id: row.try_get("id")?,
        organizer_id: row.try_get("organizer_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        date: row.try_get("date")?,
        contract_address: row.try_get("contract_address")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn token_from_row(row: &PgRow) -> Result<Token, sqlx::Error> {
    let sale_mode: String = row.try_get("sale_mode")?;
    let sale_mode: SaleMode = sale_mode
        .parse()
        .map_err(|e: LedgerError| sqlx::Error::Decode(e.to_string().into()))?;
    Ok(Token {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        name: row.try_get("name")?,
        contract_address: row.try_get("contract_address")?,
        price_cents: row.try_get("price_cents")?,
        initial_supply: row.try_get("initial_supply")?,
        total_sold: row.try_get("total_sold")?,
        sale_mode,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn purchase_from_row(row: &PgRow) -> Result<Purchase, sqlx::Error> {
    Ok(Purchase {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        token_address: row.try_get("token_address")?,
        amount: row.try_get("amount")?,
        total_cents: row.try_get("total_cents")?,
        status: TxStatus::Completed,
        tx_hash: row.try_get("tx_hash")?,
        timestamp: row.try_get("occurred_at")?,
    })
}

fn transfer_from_row(row: &PgRow) -> Result<Transfer, sqlx::Error> {
    Ok(Transfer {
        id: row.try_get("id")?,
        from_user_id: row.try_get("from_user_id")?,
        to_address: row.try_get("to_address")?,
        to_user_id: row.try_get("to_user_id")?,
        token_address: row.try_get("token_address")?,
        amount: row.try_get("amount")?,
        status: TxStatus::Completed,
        tx_hash: row.try_get("tx_hash")?,
        timestamp: row.try_get("occurred_at")?,
    })
}

fn offline_transfer_from_row(row: &PgRow) -> Result<OfflineTransfer, sqlx::Error> {
    Ok(OfflineTransfer {
        id: row.try_get("id")?,
        to_user_id: row.try_get("to_user_id")?,
        from_cashier_id: row.try_get("from_cashier_id")?,
        token_address: row.try_get("token_address")?,
        amount: row.try_get("amount")?,
        tx_hash: row.try_get("tx_hash")?,
        timestamp: row.try_get("occurred_at")?,
    })
}

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Connects and makes sure every table and index exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: PgPool) -> anyhow::Result<Self> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&pool).await?;
        }
        tracing::info!(statements = SCHEMA.len(), "database schema ensured");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_user(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> LedgerResult<()> {
        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        exists.map(|_| ()).ok_or(LedgerError::NotFound("User"))
    }

    /// Locks the token row and reports whether its event is active.
    async fn lock_token(
        tx: &mut Transaction<'_, Postgres>,
        address: &str,
    ) -> LedgerResult<(Token, bool)> {
        let row = sqlx::query(
            "SELECT t.*, e.is_active AS event_active
             FROM tokens t JOIN events e ON e.id = t.event_id
             WHERE t.contract_address = $1
             FOR UPDATE OF t",
        )
        .bind(address)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(LedgerError::NotFound("Token"))?;
        let token = token_from_row(&row)?;
        let event_active: bool = row.try_get("event_active")?;
        Ok((token, event_active))
    }

    async fn load_balance(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        token_address: &str,
    ) -> LedgerResult<Balance> {
        let amount: Option<i64> = sqlx::query_scalar(
            "SELECT amount FROM balances WHERE user_id = $1 AND token_address = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(token_address)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(Balance {
            user_id,
            token_address: token_address.to_string(),
            amount: amount.unwrap_or(0),
        })
    }

    async fn store_balance(tx: &mut Transaction<'_, Postgres>, balance: &Balance) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO balances (user_id, token_address, amount) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, token_address) DO UPDATE SET amount = EXCLUDED.amount",
        )
        .bind(balance.user_id)
        .bind(&balance.token_address)
        .bind(balance.amount)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn store_total_sold(tx: &mut Transaction<'_, Postgres>, token: &Token) -> LedgerResult<()> {
        sqlx::query("UPDATE tokens SET total_sold = $1 WHERE id = $2")
            .bind(token.total_sold)
            .bind(token.id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn ping(&self) -> LedgerResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, phone, wallet_address, wallet_private_key, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.wallet_address)
        .bind(&user.wallet_private_key)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> LedgerResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn user_by_email(&self, email: &str) -> LedgerResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn user_by_wallet(&self, address: &str) -> LedgerResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE wallet_address = $1 ORDER BY created_at LIMIT 1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn insert_session(&self, session: &Session) -> LedgerResult<()> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token_hash)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> LedgerResult<Option<User>> {
        let row = sqlx::query(
            "SELECT u.* FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = $1 AND s.expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn prune_sessions(&self, now: DateTime<Utc>) -> LedgerResult<u64> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn insert_event(&self, event: &Event) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO events (id, organizer_id, name, description, location, date, contract_address, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(event.id)
        .bind(event.organizer_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(&event.contract_address)
        .bind(event.is_active)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn event_by_id(&self, id: Uuid) -> LedgerResult<Option<Event>> {
        let row = sqlx::query("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(event_from_row).transpose()?)
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> LedgerResult<Vec<Event>> {
        let rows = sqlx::query("SELECT * FROM events WHERE organizer_id = $1 ORDER BY created_at DESC")
            .bind(organizer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(event_from_row).collect::<Result<_, _>>()?)
    }

    async fn active_events(&self) -> LedgerResult<Vec<Event>> {
        let rows = sqlx::query("SELECT * FROM events WHERE is_active ORDER BY date ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(event_from_row).collect::<Result<_, _>>()?)
    }

    async fn set_event_active(&self, id: Uuid, is_active: bool) -> LedgerResult<Event> {
        let row = sqlx::query("UPDATE events SET is_active = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound("Event"))?;
        Ok(event_from_row(&row)?)
    }

    async fn insert_token(&self, token: &Token) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO tokens (id, event_id, name, contract_address, price_cents, initial_supply, total_sold, sale_mode, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(token.id)
        .bind(token.event_id)
        .bind(&token.name)
        .bind(&token.contract_address)
        .bind(token.price_cents)
        .bind(token.initial_supply)
        .bind(token.total_sold)
        .bind(token.sale_mode.as_str())
        .bind(token.is_active)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn tokens_for_event(&self, event_id: Uuid) -> LedgerResult<Vec<Token>> {
        let rows = sqlx::query("SELECT * FROM tokens WHERE event_id = $1 ORDER BY created_at ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(token_from_row).collect::<Result<_, _>>()?)
    }

    async fn token_by_address(&self, address: &str) -> LedgerResult<Option<Token>> {
        let row = sqlx::query("SELECT * FROM tokens WHERE contract_address = $1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(token_from_row).transpose()?)
    }

    async fn set_token_active(&self, address: &str, is_active: bool) -> LedgerResult<Token> {
        let row = sqlx::query(
            "UPDATE tokens SET is_active = $2 WHERE contract_address = $1 RETURNING *",
        )
        .bind(address)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::NotFound("Token"))?;
        Ok(token_from_row(&row)?)
    }

    async fn balances_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Balance>> {
        let rows = sqlx::query(
            "SELECT user_id, token_address, amount FROM balances
             WHERE user_id = $1 AND amount > 0 ORDER BY token_address",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Balance {
                user_id: row.try_get("user_id")?,
                token_address: row.try_get("token_address")?,
                amount: row.try_get("amount")?,
            });
        }
        Ok(out)
    }

    async fn record_purchase(&self, draft: PurchaseDraft) -> LedgerResult<(Purchase, Token)> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_user(&mut tx, draft.user_id).await?;
        let (mut token, event_active) = Self::lock_token(&mut tx, &draft.token_address).await?;
        let mut buyer = Self::load_balance(&mut tx, draft.user_id, &token.contract_address).await?;

        let purchase = ledger::settle_purchase(&mut token, event_active, &mut buyer, &draft, Utc::now())?;

        Self::store_total_sold(&mut tx, &token).await?;
        Self::store_balance(&mut tx, &buyer).await?;
        sqlx::query(
            "INSERT INTO purchases (id, user_id, token_address, amount, total_cents, status, tx_hash, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(purchase.id)
        .bind(purchase.user_id)
        .bind(&purchase.token_address)
        .bind(purchase.amount)
        .bind(purchase.total_cents)
        .bind(purchase.status.as_str())
        .bind(&purchase.tx_hash)
        .bind(purchase.timestamp)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok((purchase, token))
    }

    async fn record_transfer(&self, draft: TransferDraft) -> LedgerResult<Transfer> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_user(&mut tx, draft.from_user_id).await?;
        let (token, event_active) = Self::lock_token(&mut tx, &draft.token_address).await?;
        let mut sender = Self::load_balance(&mut tx, draft.from_user_id, &token.contract_address).await?;
        let mut recipient = match draft.to_user_id {
            Some(uid) => {
                Self::ensure_user(&mut tx, uid).await?;
                Some(Self::load_balance(&mut tx, uid, &token.contract_address).await?)
            }
            None => None,
        };

        let transfer = ledger::settle_transfer(
            &token,
            event_active,
            &mut sender,
            recipient.as_mut(),
            &draft,
            Utc::now(),
        )?;

        Self::store_balance(&mut tx, &sender).await?;
        if let Some(recipient) = &recipient {
            Self::store_balance(&mut tx, recipient).await?;
        }
        sqlx::query(
            "INSERT INTO transfers (id, from_user_id, to_address, to_user_id, token_address, amount, status, tx_hash, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(transfer.id)
        .bind(transfer.from_user_id)
        .bind(&transfer.to_address)
        .bind(transfer.to_user_id)
        .bind(&transfer.token_address)
        .bind(transfer.amount)
        .bind(transfer.status.as_str())
        .bind(&transfer.tx_hash)
        .bind(transfer.timestamp)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(transfer)
    }

    async fn record_offline_transfer(
        &self,
        draft: OfflineTransferDraft,
    ) -> LedgerResult<(OfflineTransfer, Token)> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_user(&mut tx, draft.to_user_id).await?;
        let (mut token, event_active) = Self::lock_token(&mut tx, &draft.token_address).await?;
        let mut recipient = Self::load_balance(&mut tx, draft.to_user_id, &token.contract_address).await?;

        let grant = ledger::settle_offline_transfer(
            &mut token,
            event_active,
            &mut recipient,
            &draft,
            Utc::now(),
        )?;

        Self::store_total_sold(&mut tx, &token).await?;
        Self::store_balance(&mut tx, &recipient).await?;
        sqlx::query(
            "INSERT INTO offline_transfers (id, to_user_id, from_cashier_id, token_address, amount, tx_hash, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(grant.id)
        .bind(grant.to_user_id)
        .bind(grant.from_cashier_id)
        .bind(&grant.token_address)
        .bind(grant.amount)
        .bind(&grant.tx_hash)
        .bind(grant.timestamp)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok((grant, token))
    }

    async fn purchases_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Purchase>> {
        let rows = sqlx::query("SELECT * FROM purchases WHERE user_id = $1 ORDER BY occurred_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(purchase_from_row).collect::<Result<_, _>>()?)
    }

    async fn transfers_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Transfer>> {
        let rows = sqlx::query("SELECT * FROM transfers WHERE from_user_id = $1 ORDER BY occurred_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(transfer_from_row).collect::<Result<_, _>>()?)
    }

    async fn offline_transfers_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<OfflineTransfer>> {
        let rows = sqlx::query("SELECT * FROM offline_transfers WHERE to_user_id = $1 ORDER BY occurred_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(offline_transfer_from_row).collect::<Result<_, _>>()?)
    }
}
