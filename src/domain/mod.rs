pub mod error;
pub mod ledger;
pub mod model;

pub use error::{LedgerError, LedgerResult};
