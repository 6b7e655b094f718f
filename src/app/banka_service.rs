//! The BanKa service.
//!
//! Sits between the HTTP handlers and the ledger store. It owns everything
//! that is not a ledger invariant: input validation, wallet creation,
//! password hashing, sessions, organizer authorization and address
//! derivation. Ledger mutations are delegated to the store's atomic
//! `record_*` operations.

use crate::crypto::hashing::{derive_address, generate_session_token, hash_session_token};
use crate::crypto::{password, to_checksum_address, Wallet};
use crate::domain::error::{LedgerError, LedgerResult};
use crate::domain::ledger::{ensure_positive, normalize_address};
use crate::domain::model::{
    Balance, Event, EventWithTokens, OfflineTransfer, OfflineTransferDraft, Purchase,
    PurchaseDraft, SaleMode, Session, Token, Transaction, Transfer, TransferDraft, User,
    WalletInfo,
};
use crate::infra::config::ZERO_ADDRESS;
use crate::storage::LedgerStore;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Address of a wallet the user already controls; skips custodial wallet creation.
    #[serde(default)]
    pub external_wallet: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub external_wallet: Option<String>,
}

/// Registration without credentials (kiosk flow).
#[derive(Deserialize, Debug, ToSchema)]
pub struct UserRegister {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct EventCreate {
    pub name: String,
    /// RFC 3339, naive ISO-8601 (taken as UTC) or `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct TokenCreate {
    pub name: String,
    pub price_cents: i64,
    pub initial_supply: i64,
    #[serde(default)]
    pub sale_mode: SaleMode,
    /// Address of an already deployed token contract. Derived when absent.
    #[serde(default)]
    pub contract_address: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ActiveUpdate {
    pub is_active: bool,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct TokenPurchase {
    pub token_address: String,
    pub amount: i64,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct TokenTransfer {
    pub to_address: String,
    pub token_address: String,
    pub amount: i64,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct OfflineTransferRequest {
    pub to_user_id: Uuid,
    pub token_address: String,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct Profile {
    pub user: User,
    pub wallet: WalletInfo,
    pub events: Vec<EventWithTokens>,
    pub balances: Vec<Balance>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct VendorQr {
    pub vendor_address: String,
    pub qr_data: String,
    pub display_name: String,
}

pub struct BankaService {
    store: Arc<dyn LedgerStore>,
    factory_address: String,
    session_ttl: chrono::Duration,
}

impl BankaService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        factory_address: Option<String>,
        session_ttl_hours: i64,
    ) -> LedgerResult<Self> {
        let factory_address = match factory_address {
            Some(addr) => normalize_address(&addr)?,
            None => ZERO_ADDRESS.to_string(),
        };
        let session_ttl = chrono::Duration::try_hours(session_ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                LedgerError::validation(format!(
                    "session lifetime of {} hours is out of range",
                    session_ttl_hours
                ))
            })?;
        Ok(Self {
            store,
            factory_address,
            session_ttl,
        })
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn factory_address(&self) -> &str {
        &self.factory_address
    }

    // --- accounts ---

    pub async fn register(&self, req: RegisterRequest) -> LedgerResult<AuthSession> {
        let name = required_text(&req.name, "name", 100)?;
        let email = normalize_email(&req.email)?;
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LedgerError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(LedgerError::conflict(format!("Email '{}' is already registered", email)));
        }
        let external_wallet = match req.external_wallet.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => {
                let addr = normalize_address(addr)?;
                if self.store.user_by_wallet(&addr).await?.is_some() {
                    return Err(LedgerError::conflict(format!(
                        "Wallet {} is already linked to another account",
                        to_checksum_address(&addr)
                    )));
                }
                Some(addr)
            }
            _ => None,
        };

        let password_hash = hash_blocking(req.password).await?;
        let user = self.new_user(name, email, req.phone, external_wallet, Some(password_hash));
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, wallet = %user.wallet_address, custodial = user.is_custodial(), "user registered");

        let token = self.open_session(user.id).await?;
        Ok(AuthSession { user, token })
    }

    pub async fn register_legacy(&self, req: UserRegister) -> LedgerResult<User> {
        let name = required_text(&req.name, "name", 100)?;
        let email = normalize_email(&req.email)?;
        let user = self.new_user(name, email, req.phone, None, None);
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, wallet = %user.wallet_address, "user registered without credentials");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> LedgerResult<AuthSession> {
        let invalid = || LedgerError::Unauthorized("Invalid email or password".to_string());
        let email = normalize_email(&req.email).map_err(|_| invalid())?;
        let user = self.store.user_by_email(&email).await?.ok_or_else(invalid)?;
        let stored = user.password_hash.clone().ok_or_else(invalid)?;

        let candidate = req.password;
        let ok = tokio::task::spawn_blocking(move || password::verify_password(&candidate, &stored))
            .await
            .map_err(|e| LedgerError::Storage(anyhow::anyhow!("password check aborted: {}", e)))?;
        if !ok {
            tracing::warn!(user_id = %user.id, "login rejected");
            return Err(invalid());
        }

        // Accounts bound to an external wallet must log in from that wallet.
        if let Some(external) = req.external_wallet.as_deref() {
            let external = normalize_address(external)?;
            if !user.is_custodial() && external != user.wallet_address {
                return Err(LedgerError::conflict("Connected wallet does not match this account"));
            }
        }

        let token = self.open_session(user.id).await?;
        tracing::info!(user_id = %user.id, "login");
        Ok(AuthSession { user, token })
    }

    pub async fn authenticate(&self, bearer: &str) -> LedgerResult<User> {
        let token = bearer.trim();
        if token.is_empty() {
            return Err(LedgerError::Unauthorized("Missing bearer token".to_string()));
        }
        self.store
            .session_user(&hash_session_token(token), Utc::now())
            .await?
            .ok_or_else(|| LedgerError::Unauthorized("Invalid or expired token".to_string()))
    }

    pub async fn profile(&self, user: User) -> LedgerResult<Profile> {
        let events = self.list_organizer_events(&user).await?;
        let balances = self.store.balances_for_user(user.id).await?;
        let mut wallet = user.wallet();
        wallet.address = to_checksum_address(&wallet.address);
        Ok(Profile {
            user,
            wallet,
            events,
            balances,
        })
    }

    pub async fn get_user(&self, user_id: Uuid) -> LedgerResult<(User, Vec<Balance>)> {
        let user = self.require_user(user_id).await?;
        let balances = self.store.balances_for_user(user_id).await?;
        Ok((user, balances))
    }

    // --- catalog ---

    pub async fn create_event(&self, organizer: &User, req: EventCreate) -> LedgerResult<Event> {
        let name = required_text(&req.name, "name", 100)?;
        let date = parse_event_date(&req.date)?;
        let id = Uuid::new_v4();
        let factory = address_bytes(&self.factory_address);
        let event = Event {
            id,
            organizer_id: organizer.id,
            name,
            description: optional_text(req.description),
            location: optional_text(req.location),
            date,
            contract_address: derive_address("event", &[&factory, id.as_bytes()]),
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.insert_event(&event).await?;
        tracing::info!(event_id = %event.id, organizer_id = %organizer.id, "event created");
        Ok(event)
    }

    pub async fn list_organizer_events(&self, organizer: &User) -> LedgerResult<Vec<EventWithTokens>> {
        let events = self.store.events_by_organizer(organizer.id).await?;
        self.with_tokens(events).await
    }

    pub async fn list_public_events(&self) -> LedgerResult<Vec<EventWithTokens>> {
        let events = self.store.active_events().await?;
        self.with_tokens(events).await
    }

    pub async fn get_event(&self, event_id: Uuid) -> LedgerResult<EventWithTokens> {
        let event = self.require_event(event_id).await?;
        let tokens = self.store.tokens_for_event(event.id).await?;
        Ok(EventWithTokens { event, tokens })
    }

    pub async fn event_tokens(&self, event_id: Uuid) -> LedgerResult<Vec<Token>> {
        let event = self.require_event(event_id).await?;
        self.store.tokens_for_event(event.id).await
    }

    pub async fn create_token(
        &self,
        caller: &User,
        event_id: Uuid,
        req: TokenCreate,
    ) -> LedgerResult<Token> {
        let event = self.require_event(event_id).await?;
        if event.organizer_id != caller.id {
            return Err(LedgerError::Forbidden(
                "Only the event organizer can create tokens".to_string(),
            ));
        }
        let name = required_text(&req.name, "name", 50)?;
        ensure_positive(req.price_cents, "price_cents")?;
        ensure_positive(req.initial_supply, "initial_supply")?;

        let id = Uuid::new_v4();
        let contract_address = match req.contract_address.as_deref() {
            Some(addr) => normalize_address(addr)?,
            None => {
                let event_addr = address_bytes(&event.contract_address);
                derive_address("token", &[&event_addr, id.as_bytes()])
            }
        };
        let token = Token {
            id,
            event_id: event.id,
            name,
            contract_address,
            price_cents: req.price_cents,
            initial_supply: req.initial_supply,
            total_sold: 0,
            sale_mode: req.sale_mode,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.insert_token(&token).await?;
        tracing::info!(
            token_id = %token.id,
            event_id = %event.id,
            address = %token.contract_address,
            supply = token.initial_supply,
            sale_mode = %token.sale_mode,
            "token created"
        );
        Ok(token)
    }

    /// Opens or closes an event for trading. Organizer only.
    pub async fn set_event_active(
        &self,
        caller: &User,
        event_id: Uuid,
        is_active: bool,
    ) -> LedgerResult<Event> {
        let event = self.require_event(event_id).await?;
        if event.organizer_id != caller.id {
            return Err(LedgerError::Forbidden(
                "Only the event organizer can change its status".to_string(),
            ));
        }
        let event = self.store.set_event_active(event.id, is_active).await?;
        tracing::info!(event_id = %event.id, is_active, "event status changed");
        Ok(event)
    }

    /// Opens or closes a single token for trading. Organizer only.
    pub async fn set_token_active(
        &self,
        caller: &User,
        token_address: &str,
        is_active: bool,
    ) -> LedgerResult<Token> {
        let token_address = normalize_address(token_address)?;
        let token = self
            .store
            .token_by_address(&token_address)
            .await?
            .ok_or(LedgerError::NotFound("Token"))?;
        let event = self.require_event(token.event_id).await?;
        if event.organizer_id != caller.id {
            return Err(LedgerError::Forbidden(
                "Only the event organizer can change token status".to_string(),
            ));
        }
        let token = self.store.set_token_active(&token_address, is_active).await?;
        tracing::info!(token = %token.contract_address, is_active, "token status changed");
        Ok(token)
    }

    // --- ledger ---

    pub async fn purchase(&self, user_id: Uuid, req: TokenPurchase) -> LedgerResult<Purchase> {
        self.require_user(user_id).await?;
        let token_address = normalize_address(&req.token_address)?;
        let (purchase, token) = self
            .store
            .record_purchase(PurchaseDraft {
                user_id,
                token_address,
                amount: req.amount,
            })
            .await?;
        tracing::info!(
            user_id = %user_id,
            token = %token.contract_address,
            amount = purchase.amount,
            total_cents = purchase.total_cents,
            total_sold = token.total_sold,
            "tokens purchased"
        );
        Ok(purchase)
    }

    /// Moves the caller's own balance; `user_id` must be the caller.
    pub async fn transfer(
        &self,
        caller: &User,
        user_id: Uuid,
        req: TokenTransfer,
    ) -> LedgerResult<Transfer> {
        if caller.id != user_id {
            return Err(LedgerError::Forbidden(
                "Tokens can only be transferred from your own account".to_string(),
            ));
        }
        let token_address = normalize_address(&req.token_address)?;
        let to_address = normalize_address(&req.to_address)?;
        let to_user_id = self.store.user_by_wallet(&to_address).await?.map(|u| u.id);
        let transfer = self
            .store
            .record_transfer(TransferDraft {
                from_user_id: user_id,
                to_address,
                to_user_id,
                token_address,
                amount: req.amount,
            })
            .await?;
        tracing::info!(
            from = %user_id,
            to = %transfer.to_address,
            internal = transfer.to_user_id.is_some(),
            amount = transfer.amount,
            "tokens transferred"
        );
        Ok(transfer)
    }

    pub async fn offline_transfer(
        &self,
        cashier: &User,
        req: OfflineTransferRequest,
    ) -> LedgerResult<OfflineTransfer> {
        let token_address = normalize_address(&req.token_address)?;
        let token = self
            .store
            .token_by_address(&token_address)
            .await?
            .ok_or(LedgerError::NotFound("Token"))?;
        let event = self.require_event(token.event_id).await?;
        if event.organizer_id != cashier.id {
            return Err(LedgerError::Forbidden(
                "Only the event organizer can issue offline transfers".to_string(),
            ));
        }
        self.require_user(req.to_user_id).await?;

        let (grant, token) = self
            .store
            .record_offline_transfer(OfflineTransferDraft {
                to_user_id: req.to_user_id,
                from_cashier_id: cashier.id,
                token_address,
                amount: req.amount,
            })
            .await?;
        tracing::info!(
            cashier = %cashier.id,
            to = %grant.to_user_id,
            token = %token.contract_address,
            amount = grant.amount,
            total_sold = token.total_sold,
            "offline transfer issued"
        );
        Ok(grant)
    }

    /// Purchases, sent transfers and received offline grants, newest first.
    pub async fn transactions(&self, user_id: Uuid) -> LedgerResult<Vec<Transaction>> {
        self.require_user(user_id).await?;
        let mut all: Vec<Transaction> = Vec::new();
        all.extend(
            self.store
                .purchases_for_user(user_id)
                .await?
                .into_iter()
                .map(Transaction::Purchase),
        );
        all.extend(
            self.store
                .transfers_for_user(user_id)
                .await?
                .into_iter()
                .map(Transaction::Transfer),
        );
        all.extend(
            self.store
                .offline_transfers_for_user(user_id)
                .await?
                .into_iter()
                .map(Transaction::OfflineTransfer),
        );
        all.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        Ok(all)
    }

    // --- helpers ---

    fn new_user(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        external_wallet: Option<String>,
        password_hash: Option<String>,
    ) -> User {
        let (wallet_address, wallet_private_key) = match external_wallet {
            Some(addr) => (addr, None),
            None => {
                let wallet = Wallet::generate();
                (wallet.address, Some(wallet.private_key))
            }
        };
        User {
            id: Uuid::new_v4(),
            name,
            email,
            phone: optional_text(phone),
            wallet_address,
            wallet_private_key,
            password_hash,
            created_at: Utc::now(),
        }
    }

    async fn open_session(&self, user_id: Uuid) -> LedgerResult<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| LedgerError::validation("session expiry is out of range"))?;
        let pruned = self.store.prune_sessions(now).await?;
        if pruned > 0 {
            tracing::debug!(pruned, "expired sessions removed");
        }
        let token = generate_session_token();
        self.store
            .insert_session(&Session {
                token_hash: hash_session_token(&token),
                user_id,
                expires_at,
            })
            .await?;
        Ok(token)
    }

    async fn require_user(&self, id: Uuid) -> LedgerResult<User> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or(LedgerError::NotFound("User"))
    }

    async fn require_event(&self, id: Uuid) -> LedgerResult<Event> {
        self.store
            .event_by_id(id)
            .await?
            .ok_or(LedgerError::NotFound("Event"))
    }

    async fn with_tokens(&self, events: Vec<Event>) -> LedgerResult<Vec<EventWithTokens>> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            let tokens = self.store.tokens_for_event(event.id).await?;
            out.push(EventWithTokens { event, tokens });
        }
        Ok(out)
    }
}

pub fn vendor_qr(vendor_address: &str) -> LedgerResult<VendorQr> {
    let normalized = normalize_address(vendor_address)?;
    let checksum = to_checksum_address(&normalized);
    Ok(VendorQr {
        qr_data: format!("banka://pay/{}", checksum),
        display_name: format!("Vendor {}...", &checksum[..8]),
        vendor_address: checksum,
    })
}

async fn hash_blocking(plain: String) -> LedgerResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| LedgerError::Storage(anyhow::anyhow!("password hashing aborted: {}", e)))?
        .map_err(LedgerError::Storage)
}

fn address_bytes(address: &str) -> Vec<u8> {
    hex::decode(address.trim_start_matches("0x")).unwrap_or_default()
}

fn required_text(value: &str, field: &str, max_len: usize) -> LedgerResult<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > max_len {
        return Err(LedgerError::validation(format!(
            "{} must be between 1 and {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn normalize_email(email: &str) -> LedgerResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(LedgerError::validation(format!("invalid email '{}'", email)));
    }
    Ok(email)
}

/// Accepts RFC 3339, naive ISO-8601 date-times (UTC) and plain dates.
pub fn parse_event_date(raw: &str) -> LedgerResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(LedgerError::validation(format!("invalid event date '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedgerStore;

    fn service() -> BankaService {
        BankaService::new(Arc::new(MemoryLedgerStore::new()), None, 24).unwrap()
    }

    async fn register(svc: &BankaService, email: &str) -> AuthSession {
        svc.register(RegisterRequest {
            name: "Ana".into(),
            email: email.into(),
            password: "TestPassword123".into(),
            phone: None,
            external_wallet: None,
        })
        .await
        .unwrap()
    }

    #[test]
    fn event_dates_accept_frontend_formats() {
        assert!(parse_event_date("2025-06-01T20:00:00Z").is_ok());
        assert!(parse_event_date("2025-06-01T20:00:00.123456").is_ok());
        assert!(parse_event_date("2025-06-01T20:00").is_ok());
        assert_eq!(
            parse_event_date("2025-06-01").unwrap().to_rfc3339(),
            "2025-06-01T00:00:00+00:00"
        );
        assert!(parse_event_date("next friday").is_err());
    }

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(normalize_email(" Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("ana").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ana@example").is_err());
    }

    #[test]
    fn qr_payload_uses_checksummed_address() {
        let qr = vendor_qr("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(qr.qr_data, "banka://pay/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(qr.display_name, "Vendor 0x5aAeb6...");
        assert!(vendor_qr("vendor-1").is_err());
    }

    #[tokio::test]
    async fn email_uniqueness_is_case_insensitive() {
        let svc = service();
        register(&svc, "ana@example.com").await;
        let err = svc
            .register(RegisterRequest {
                name: "Ana 2".into(),
                email: "ANA@example.com".into(),
                password: "AnotherPass1".into(),
                phone: None,
                external_wallet: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_and_session_resolution() {
        let svc = service();
        let session = register(&svc, "bob@example.com").await;
        let again = svc
            .login(LoginRequest {
                email: "BOB@example.com".into(),
                password: "TestPassword123".into(),
                external_wallet: None,
            })
            .await
            .unwrap();
        assert_ne!(session.token, again.token);
        let user = svc.authenticate(&again.token).await.unwrap();
        assert_eq!(user.id, session.user.id);

        let bad = svc
            .login(LoginRequest {
                email: "bob@example.com".into(),
                password: "wrong-password".into(),
                external_wallet: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(bad, LedgerError::Unauthorized(_)));
        assert!(svc.authenticate("deadbeef").await.is_err());
    }

    #[tokio::test]
    async fn external_wallet_skips_custodial_key() {
        let svc = service();
        let session = svc
            .register(RegisterRequest {
                name: "Carla".into(),
                email: "carla@example.com".into(),
                password: "TestPassword123".into(),
                phone: None,
                external_wallet: Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into()),
            })
            .await
            .unwrap();
        assert!(!session.user.is_custodial());
        assert_eq!(session.user.wallet_address, "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");

        let mismatch = svc
            .login(LoginRequest {
                email: "carla@example.com".into(),
                password: "TestPassword123".into(),
                external_wallet: Some("0x1234567890123456789012345678901234567890".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(mismatch, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_the_organizer_creates_tokens_and_grants() {
        let svc = service();
        let org = register(&svc, "org@example.com").await.user;
        let other = register(&svc, "other@example.com").await.user;
        let event = svc
            .create_event(
                &org,
                EventCreate {
                    name: "Festa".into(),
                    date: "2025-06-01".into(),
                    description: None,
                    location: Some("Lisboa".into()),
                },
            )
            .await
            .unwrap();

        let req = || TokenCreate {
            name: "CERVEJA".into(),
            price_cents: 500,
            initial_supply: 100,
            sale_mode: SaleMode::Both,
            contract_address: None,
        };
        assert!(matches!(
            svc.create_token(&other, event.id, req()).await.unwrap_err(),
            LedgerError::Forbidden(_)
        ));
        let token = svc.create_token(&org, event.id, req()).await.unwrap();
        assert_eq!(token.total_sold, 0);

        let grant = OfflineTransferRequest {
            to_user_id: other.id,
            token_address: token.contract_address.clone(),
            amount: 3,
        };
        assert!(matches!(
            svc.offline_transfer(&other, grant).await.unwrap_err(),
            LedgerError::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn transfer_to_registered_wallet_credits_recipient() {
        let svc = service();
        let org = register(&svc, "org2@example.com").await.user;
        let buyer = register(&svc, "buyer@example.com").await.user;
        let vendor = register(&svc, "vendor@example.com").await.user;
        let event = svc
            .create_event(
                &org,
                EventCreate {
                    name: "Feira".into(),
                    date: "2025-07-01T10:00:00Z".into(),
                    description: None,
                    location: None,
                },
            )
            .await
            .unwrap();
        let token = svc
            .create_token(
                &org,
                event.id,
                TokenCreate {
                    name: "FICHA".into(),
                    price_cents: 250,
                    initial_supply: 10,
                    sale_mode: SaleMode::Online,
                    contract_address: None,
                },
            )
            .await
            .unwrap();

        svc.purchase(
            buyer.id,
            TokenPurchase {
                token_address: token.contract_address.clone(),
                amount: 4,
            },
        )
        .await
        .unwrap();
        let transfer = svc
            .transfer(
                &buyer,
                buyer.id,
                TokenTransfer {
                    to_address: to_checksum_address(&vendor.wallet_address),
                    token_address: token.contract_address.clone(),
                    amount: 3,
                },
            )
            .await
            .unwrap();
        assert_eq!(transfer.to_user_id, Some(vendor.id));

        let (_, buyer_bal) = svc.get_user(buyer.id).await.unwrap();
        let (_, vendor_bal) = svc.get_user(vendor.id).await.unwrap();
        assert_eq!(buyer_bal[0].amount, 1);
        assert_eq!(vendor_bal[0].amount, 3);

        let history = svc.transactions(buyer.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(matches!(history[0], Transaction::Transfer(_)));
    }

    #[test]
    fn session_lifetime_must_fit_the_calendar() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
        assert!(BankaService::new(store.clone(), None, 0).is_err());
        assert!(BankaService::new(store.clone(), None, 3_000_000_000).is_err());
        assert!(BankaService::new(store, None, 24 * 365).is_ok());
    }

    #[tokio::test]
    async fn transfers_only_move_the_callers_balance() {
        let svc = service();
        let owner = register(&svc, "owner@example.com").await.user;
        let thief = register(&svc, "thief@example.com").await.user;
        let err = svc
            .transfer(
                &thief,
                owner.id,
                TokenTransfer {
                    to_address: thief.wallet_address.clone(),
                    token_address: "0x1234567890123456789012345678901234567890".into(),
                    amount: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn external_wallet_links_to_one_account() {
        let svc = service();
        let req = |email: &str| RegisterRequest {
            name: "Dora".into(),
            email: email.into(),
            password: "TestPassword123".into(),
            phone: None,
            external_wallet: Some("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".into()),
        };
        svc.register(req("dora@example.com")).await.unwrap();
        let err = svc.register(req("dora2@example.com")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn closed_events_and_tokens_stop_trading() {
        let svc = service();
        let org = register(&svc, "org3@example.com").await.user;
        let buyer = register(&svc, "buyer3@example.com").await.user;
        let event = svc
            .create_event(
                &org,
                EventCreate {
                    name: "Romaria".into(),
                    date: "2025-08-15".into(),
                    description: None,
                    location: None,
                },
            )
            .await
            .unwrap();
        let token = svc
            .create_token(
                &org,
                event.id,
                TokenCreate {
                    name: "BIFANA".into(),
                    price_cents: 400,
                    initial_supply: 10,
                    sale_mode: SaleMode::Both,
                    contract_address: None,
                },
            )
            .await
            .unwrap();
        let buy = || TokenPurchase {
            token_address: token.contract_address.clone(),
            amount: 1,
        };

        assert!(matches!(
            svc.set_token_active(&buyer, &token.contract_address, false).await.unwrap_err(),
            LedgerError::Forbidden(_)
        ));
        let closed = svc.set_token_active(&org, &token.contract_address, false).await.unwrap();
        assert!(!closed.is_active);
        assert!(matches!(
            svc.purchase(buyer.id, buy()).await.unwrap_err(),
            LedgerError::Inactive("Token")
        ));
        svc.set_token_active(&org, &token.contract_address, true).await.unwrap();
        svc.purchase(buyer.id, buy()).await.unwrap();

        svc.set_event_active(&org, event.id, false).await.unwrap();
        assert!(matches!(
            svc.purchase(buyer.id, buy()).await.unwrap_err(),
            LedgerError::Inactive("Event")
        ));
        assert!(svc.list_public_events().await.unwrap().is_empty());
        assert_eq!(svc.list_organizer_events(&org).await.unwrap().len(), 1);
    }
}
