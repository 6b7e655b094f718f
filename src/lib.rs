pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::BankaService;
pub use domain::error::{LedgerError, LedgerResult};
pub use infra::config::Config;
pub use storage::{LedgerStore, MemoryLedgerStore, PgLedgerStore};
