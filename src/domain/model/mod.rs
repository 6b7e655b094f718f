//! Entities of the BanKa ledger: accounts, the event catalog, tokens and the journal.

pub mod event;
pub mod journal;
pub mod token;
pub mod user;

pub use event::{Event, EventWithTokens};
pub use journal::{
    Balance, OfflineTransfer, OfflineTransferDraft, Purchase, PurchaseDraft, Transaction,
    Transfer, TransferDraft, TxStatus,
};
pub use token::{SaleChannel, SaleMode, Token};
pub use user::{Session, User, WalletInfo};
