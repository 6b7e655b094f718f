//! Ledger rules shared by every store.
//!
//! Stores load the affected rows under their own lock (SQL `FOR UPDATE` or the
//! in-memory write guard), apply one of the `settle_*` functions, and persist
//! the mutated rows together with the returned journal record. The rules
//! never touch storage, so both stores enforce exactly the same invariants:
//!
//! - `0 <= total_sold <= initial_supply` for every token,
//! - balances never go negative,
//! - purchases only through online-capable tokens, grants only through
//!   offline-capable ones.

use crate::crypto::hashing::derive_tx_hash;
use crate::domain::error::{LedgerError, LedgerResult};
use crate::domain::model::{
    Balance, OfflineTransfer, OfflineTransferDraft, Purchase, PurchaseDraft, SaleChannel, Token,
    Transfer, TransferDraft, TxStatus,
};
use chrono::{DateTime, Utc};
use primitive_types::H160;
use uuid::Uuid;

pub fn ensure_positive(value: i64, field: &str) -> LedgerResult<()> {
    if value <= 0 {
        return Err(LedgerError::validation(format!(
            "{} must be greater than zero (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Parses a `0x`-prefixed 20-byte hex address.
pub fn parse_address(s: &str) -> LedgerResult<H160> {
    let trimmed = s.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| LedgerError::validation(format!("invalid address '{}': missing 0x prefix", s)))?;
    if hex_part.len() != 40 {
        return Err(LedgerError::validation(format!(
            "invalid address '{}': expected 40 hex characters",
            s
        )));
    }
    let bytes = hex::decode(hex_part)
        .map_err(|_| LedgerError::validation(format!("invalid address '{}': not hex", s)))?;
    Ok(H160::from_slice(&bytes))
}

/// Canonical (lower-case) form used for storage and lookups.
pub fn normalize_address(s: &str) -> LedgerResult<String> {
    let addr = parse_address(s)?;
    Ok(format!("0x{}", hex::encode(addr.as_bytes())))
}

pub fn quote_cents(price_cents: i64, amount: i64) -> LedgerResult<i64> {
    price_cents
        .checked_mul(amount)
        .ok_or_else(|| LedgerError::validation("purchase total overflows"))
}

/// Takes `amount` out of the token's remaining stock through `channel`.
pub fn reserve(
    token: &mut Token,
    event_active: bool,
    amount: i64,
    channel: SaleChannel,
) -> LedgerResult<()> {
    ensure_positive(amount, "amount")?;
    ensure_tradable(token, event_active)?;
    if !token.sale_mode.allows(channel) {
        return Err(LedgerError::SaleModeNotAllowed {
            mode: token.sale_mode.to_string(),
            channel: channel.to_string(),
        });
    }
    let remaining = token.remaining();
    if amount > remaining {
        return Err(LedgerError::InsufficientStock {
            requested: amount,
            remaining,
        });
    }
    token.total_sold += amount;
    Ok(())
}

fn ensure_tradable(token: &Token, event_active: bool) -> LedgerResult<()> {
    if !event_active {
        return Err(LedgerError::Inactive("Event"));
    }
    if !token.is_active {
        return Err(LedgerError::Inactive("Token"));
    }
    Ok(())
}

impl Balance {
    pub fn empty(user_id: Uuid, token_address: &str) -> Self {
        Self {
            user_id,
            token_address: token_address.to_string(),
            amount: 0,
        }
    }

    pub fn credit(&mut self, amount: i64) -> LedgerResult<()> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or_else(|| LedgerError::validation("balance overflows"))?;
        Ok(())
    }

    pub fn debit(&mut self, amount: i64) -> LedgerResult<()> {
        if amount > self.amount {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.amount,
            });
        }
        self.amount -= amount;
        Ok(())
    }
}

/// Online purchase: reserves stock and credits the buyer.
pub fn settle_purchase(
    token: &mut Token,
    event_active: bool,
    buyer: &mut Balance,
    draft: &PurchaseDraft,
    now: DateTime<Utc>,
) -> LedgerResult<Purchase> {
    ensure_positive(draft.amount, "amount")?;
    let total_cents = quote_cents(token.price_cents, draft.amount)?;
    reserve(token, event_active, draft.amount, SaleChannel::Online)?;
    buyer.credit(draft.amount)?;

    let id = Uuid::new_v4();
    Ok(Purchase {
        id,
        user_id: draft.user_id,
        token_address: token.contract_address.clone(),
        amount: draft.amount,
        total_cents,
        status: TxStatus::Completed,
        tx_hash: derive_tx_hash("purchase", &id),
        timestamp: now,
    })
}

/// Cashier grant: reserves stock without payment and credits the recipient.
pub fn settle_offline_transfer(
    token: &mut Token,
    event_active: bool,
    recipient: &mut Balance,
    draft: &OfflineTransferDraft,
    now: DateTime<Utc>,
) -> LedgerResult<OfflineTransfer> {
    reserve(token, event_active, draft.amount, SaleChannel::Offline)?;
    recipient.credit(draft.amount)?;

    let id = Uuid::new_v4();
    Ok(OfflineTransfer {
        id,
        to_user_id: draft.to_user_id,
        from_cashier_id: draft.from_cashier_id,
        token_address: token.contract_address.clone(),
        amount: draft.amount,
        tx_hash: derive_tx_hash("offline_transfer", &id),
        timestamp: now,
    })
}

/// Peer transfer. `recipient` is `None` when the destination wallet is not a
/// registered account; the tokens then leave the ledger.
pub fn settle_transfer(
    token: &Token,
    event_active: bool,
    sender: &mut Balance,
    recipient: Option<&mut Balance>,
    draft: &TransferDraft,
    now: DateTime<Utc>,
) -> LedgerResult<Transfer> {
    ensure_positive(draft.amount, "amount")?;
    ensure_tradable(token, event_active)?;
    if draft.to_user_id == Some(draft.from_user_id) {
        return Err(LedgerError::validation("cannot transfer to your own wallet"));
    }
    sender.debit(draft.amount)?;
    if let Some(recipient) = recipient {
        recipient.credit(draft.amount)?;
    }

    let id = Uuid::new_v4();
    Ok(Transfer {
        id,
        from_user_id: draft.from_user_id,
        to_address: draft.to_address.clone(),
        to_user_id: draft.to_user_id,
        token_address: token.contract_address.clone(),
        amount: draft.amount,
        status: TxStatus::Completed,
        tx_hash: derive_tx_hash("transfer", &id),
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SaleMode;

    fn token(mode: SaleMode, supply: i64, sold: i64) -> Token {
        Token {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            name: "DRINK".into(),
            contract_address: "0x1111111111111111111111111111111111111111".into(),
            price_cents: 500,
            initial_supply: supply,
            total_sold: sold,
            sale_mode: mode,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn purchase_increases_total_sold_by_exact_amount() {
        let mut t = token(SaleMode::Online, 100, 10);
        let user = Uuid::new_v4();
        let mut bal = Balance::empty(user, &t.contract_address);
        let draft = PurchaseDraft {
            user_id: user,
            token_address: t.contract_address.clone(),
            amount: 7,
        };
        let p = settle_purchase(&mut t, true, &mut bal, &draft, Utc::now()).unwrap();
        assert_eq!(t.total_sold, 17);
        assert_eq!(bal.amount, 7);
        assert_eq!(p.total_cents, 3500);
        assert!(p.tx_hash.starts_with("0x"));
    }

    #[test]
    fn purchase_beyond_headroom_leaves_state_untouched() {
        let mut t = token(SaleMode::Both, 10, 8);
        let user = Uuid::new_v4();
        let mut bal = Balance::empty(user, &t.contract_address);
        let draft = PurchaseDraft {
            user_id: user,
            token_address: t.contract_address.clone(),
            amount: 3,
        };
        let err = settle_purchase(&mut t, true, &mut bal, &draft, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { requested: 3, remaining: 2 }
        ));
        assert_eq!(t.total_sold, 8);
        assert_eq!(bal.amount, 0);
    }

    #[test]
    fn selling_out_exactly_is_allowed() {
        let mut t = token(SaleMode::Online, 5, 0);
        reserve(&mut t, true, 5, SaleChannel::Online).unwrap();
        assert_eq!(t.remaining(), 0);
        assert!(reserve(&mut t, true, 1, SaleChannel::Online).is_err());
    }

    #[test]
    fn offline_only_token_rejects_online_purchase() {
        let mut t = token(SaleMode::Offline, 10, 0);
        let err = reserve(&mut t, true, 1, SaleChannel::Online).unwrap_err();
        assert!(matches!(err, LedgerError::SaleModeNotAllowed { .. }));
        assert_eq!(t.total_sold, 0);
    }

    #[test]
    fn offline_grant_credits_recipient_without_payment() {
        let mut t = token(SaleMode::Offline, 10, 0);
        let to = Uuid::new_v4();
        let mut bal = Balance::empty(to, &t.contract_address);
        let draft = OfflineTransferDraft {
            to_user_id: to,
            from_cashier_id: Uuid::new_v4(),
            token_address: t.contract_address.clone(),
            amount: 4,
        };
        let grant = settle_offline_transfer(&mut t, true, &mut bal, &draft, Utc::now()).unwrap();
        assert_eq!(bal.amount, 4);
        assert_eq!(t.total_sold, 4);
        assert_eq!(grant.amount, 4);
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        let mut t = token(SaleMode::Both, 10, 0);
        assert!(matches!(
            reserve(&mut t, true, 0, SaleChannel::Online),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            reserve(&mut t, true, -3, SaleChannel::Offline),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn inactive_event_blocks_sales() {
        let mut t = token(SaleMode::Both, 10, 0);
        let err = reserve(&mut t, false, 1, SaleChannel::Online).unwrap_err();
        assert!(matches!(err, LedgerError::Inactive("Event")));
    }

    #[test]
    fn transfer_moves_balance_between_accounts() {
        let t = token(SaleMode::Both, 10, 5);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut from = Balance { user_id: a, token_address: t.contract_address.clone(), amount: 5 };
        let mut to = Balance::empty(b, &t.contract_address);
        let draft = TransferDraft {
            from_user_id: a,
            to_address: "0x2222222222222222222222222222222222222222".into(),
            to_user_id: Some(b),
            token_address: t.contract_address.clone(),
            amount: 2,
        };
        settle_transfer(&t, true, &mut from, Some(&mut to), &draft, Utc::now()).unwrap();
        assert_eq!((from.amount, to.amount), (3, 2));
    }

    #[test]
    fn transfer_never_overdraws() {
        let t = token(SaleMode::Both, 10, 5);
        let a = Uuid::new_v4();
        let mut from = Balance { user_id: a, token_address: t.contract_address.clone(), amount: 1 };
        let draft = TransferDraft {
            from_user_id: a,
            to_address: "0x2222222222222222222222222222222222222222".into(),
            to_user_id: None,
            token_address: t.contract_address.clone(),
            amount: 2,
        };
        let err = settle_transfer(&t, true, &mut from, None, &draft, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { requested: 2, available: 1 }
        ));
        assert_eq!(from.amount, 1);
    }

    #[test]
    fn addresses_are_normalized_to_lowercase() {
        let n = normalize_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        assert_eq!(n, "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert!(normalize_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
        assert!(normalize_address("0x1234").is_err());
        assert!(normalize_address("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }
}
