pub mod banka_service;

pub use banka_service::{vendor_qr, AuthSession, BankaService, Profile, VendorQr};
