//! In-process store. One write lock covers all tables, so every operation is
//! serializable. Used by the test suite and by `STORAGE=memory`.

use crate::domain::error::{LedgerError, LedgerResult};
use crate::domain::ledger;
use crate::domain::model::{
    Balance, Event, OfflineTransfer, OfflineTransferDraft, Purchase, PurchaseDraft, Session,
    Token, Transfer, TransferDraft, User,
};
use crate::storage::LedgerStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, Session>,
    events: HashMap<Uuid, Event>,
    /// Keyed by contract address.
    tokens: HashMap<String, Token>,
    balances: HashMap<(Uuid, String), i64>,
    purchases: Vec<Purchase>,
    transfers: Vec<Transfer>,
    offline_transfers: Vec<OfflineTransfer>,
}

impl Tables {
    fn balance(&self, user_id: Uuid, token_address: &str) -> Balance {
        let amount = self
            .balances
            .get(&(user_id, token_address.to_string()))
            .copied()
            .unwrap_or(0);
        Balance {
            user_id,
            token_address: token_address.to_string(),
            amount,
        }
    }

    fn put_balance(&mut self, balance: Balance) {
        self.balances
            .insert((balance.user_id, balance.token_address), balance.amount);
    }

    /// Clone of the token plus whether its event is active.
    fn tradable_token(&self, address: &str) -> LedgerResult<(Token, bool)> {
        let token = self
            .tokens
            .get(address)
            .cloned()
            .ok_or(LedgerError::NotFound("Token"))?;
        let event_active = self
            .events
            .get(&token.event_id)
            .map(|e| e.is_active)
            .unwrap_or(false);
        Ok((token, event_active))
    }

    fn ensure_user(&self, id: Uuid) -> LedgerResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(LedgerError::NotFound("User"))
        }
    }
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn ping(&self) -> LedgerResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> LedgerResult<()> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(LedgerError::conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        if t.users.values().any(|u| u.wallet_address == user.wallet_address) {
            return Err(LedgerError::conflict(format!(
                "Wallet '{}' is already linked to another account",
                user.wallet_address
            )));
        }
        if t.users.contains_key(&user.id) {
            return Err(LedgerError::conflict("User id already exists"));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> LedgerResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> LedgerResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_wallet(&self, address: &str) -> LedgerResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users
            .values()
            .find(|u| u.wallet_address == address)
            .cloned())
    }

    async fn insert_session(&self, session: &Session) -> LedgerResult<()> {
        let mut t = self.tables.write().await;
        t.ensure_user(session.user_id)?;
        t.sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn session_user(&self, token_hash: &str, now: DateTime<Utc>) -> LedgerResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.sessions
            .get(token_hash)
            .filter(|s| s.expires_at > now)
            .and_then(|s| t.users.get(&s.user_id))
            .cloned())
    }

    async fn prune_sessions(&self, now: DateTime<Utc>) -> LedgerResult<u64> {
        let mut t = self.tables.write().await;
        let before = t.sessions.len();
        t.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - t.sessions.len()) as u64)
    }

    async fn insert_event(&self, event: &Event) -> LedgerResult<()> {
        let mut t = self.tables.write().await;
        t.ensure_user(event.organizer_id)?;
        if t.events.contains_key(&event.id) {
            return Err(LedgerError::conflict("Event id already exists"));
        }
        t.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn event_by_id(&self, id: Uuid) -> LedgerResult<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> LedgerResult<Vec<Event>> {
        let t = self.tables.read().await;
        let mut events: Vec<Event> = t
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn active_events(&self) -> LedgerResult<Vec<Event>> {
        let t = self.tables.read().await;
        let mut events: Vec<Event> = t.events.values().filter(|e| e.is_active).cloned().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(events)
    }

    async fn set_event_active(&self, id: Uuid, is_active: bool) -> LedgerResult<Event> {
        let mut t = self.tables.write().await;
        let event = t.events.get_mut(&id).ok_or(LedgerError::NotFound("Event"))?;
        event.is_active = is_active;
        Ok(event.clone())
    }

    async fn insert_token(&self, token: &Token) -> LedgerResult<()> {
        let mut t = self.tables.write().await;
        if !t.events.contains_key(&token.event_id) {
            return Err(LedgerError::NotFound("Event"));
        }
        if t.tokens.contains_key(&token.contract_address) {
            return Err(LedgerError::conflict(format!(
                "Token contract address '{}' is already registered",
                token.contract_address
            )));
        }
        t.tokens
            .insert(token.contract_address.clone(), token.clone());
        Ok(())
    }

    async fn tokens_for_event(&self, event_id: Uuid) -> LedgerResult<Vec<Token>> {
        let t = self.tables.read().await;
        let mut tokens: Vec<Token> = t
            .tokens
            .values()
            .filter(|tok| tok.event_id == event_id)
            .cloned()
            .collect();
        tokens.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tokens)
    }

    async fn token_by_address(&self, address: &str) -> LedgerResult<Option<Token>> {
        Ok(self.tables.read().await.tokens.get(address).cloned())
    }

    async fn set_token_active(&self, address: &str, is_active: bool) -> LedgerResult<Token> {
        let mut t = self.tables.write().await;
        let token = t.tokens.get_mut(address).ok_or(LedgerError::NotFound("Token"))?;
        token.is_active = is_active;
        Ok(token.clone())
    }

    async fn balances_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Balance>> {
        let t = self.tables.read().await;
        let mut balances: Vec<Balance> = t
            .balances
            .iter()
            .filter(|((uid, _), amount)| *uid == user_id && **amount > 0)
            .map(|((uid, addr), amount)| Balance {
                user_id: *uid,
                token_address: addr.clone(),
                amount: *amount,
            })
            .collect();
        balances.sort_by(|a, b| a.token_address.cmp(&b.token_address));
        Ok(balances)
    }

    async fn record_purchase(&self, draft: PurchaseDraft) -> LedgerResult<(Purchase, Token)> {
        let mut t = self.tables.write().await;
        t.ensure_user(draft.user_id)?;
        let (mut token, event_active) = t.tradable_token(&draft.token_address)?;
        let mut buyer = t.balance(draft.user_id, &token.contract_address);

        let purchase = ledger::settle_purchase(&mut token, event_active, &mut buyer, &draft, Utc::now())?;

        t.put_balance(buyer);
        t.tokens
            .insert(token.contract_address.clone(), token.clone());
        t.purchases.push(purchase.clone());
        Ok((purchase, token))
    }

    async fn record_transfer(&self, draft: TransferDraft) -> LedgerResult<Transfer> {
        let mut t = self.tables.write().await;
        t.ensure_user(draft.from_user_id)?;
        let (token, event_active) = t.tradable_token(&draft.token_address)?;
        let mut sender = t.balance(draft.from_user_id, &token.contract_address);
        let mut recipient = match draft.to_user_id {
            Some(uid) => {
                t.ensure_user(uid)?;
                Some(t.balance(uid, &token.contract_address))
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

        t.put_balance(sender);
        if let Some(recipient) = recipient {
            t.put_balance(recipient);
        }
        t.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn record_offline_transfer(
        &self,
        draft: OfflineTransferDraft,
    ) -> LedgerResult<(OfflineTransfer, Token)> {
        let mut t = self.tables.write().await;
        t.ensure_user(draft.to_user_id)?;
        let (mut token, event_active) = t.tradable_token(&draft.token_address)?;
        let mut recipient = t.balance(draft.to_user_id, &token.contract_address);

        let grant = ledger::settle_offline_transfer(
            &mut token,
            event_active,
            &mut recipient,
            &draft,
            Utc::now(),
        )?;

        t.put_balance(recipient);
        t.tokens
            .insert(token.contract_address.clone(), token.clone());
        t.offline_transfers.push(grant.clone());
        Ok((grant, token))
    }

    async fn purchases_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Purchase>> {
        let t = self.tables.read().await;
        Ok(t.purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn transfers_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Transfer>> {
        let t = self.tables.read().await;
        Ok(t.transfers
            .iter()
            .filter(|tr| tr.from_user_id == user_id)
            .cloned()
            .collect())
    }

    async fn offline_transfers_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<OfflineTransfer>> {
        let t = self.tables.read().await;
        Ok(t.offline_transfers
            .iter()
            .filter(|o| o.to_user_id == user_id)
            .cloned()
            .collect())
    }
}
