pub mod hashing;
pub mod password;
pub mod wallet;

pub use wallet::{to_checksum_address, Wallet};
