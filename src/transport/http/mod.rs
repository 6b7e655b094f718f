pub mod auth;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod accounts;
    pub mod common;
    pub mod events;
    pub mod health;
    pub mod network;
    pub mod transfers;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
