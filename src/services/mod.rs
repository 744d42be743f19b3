// Service modules
pub mod account_service;
pub mod entitlement_service;
pub mod jwt_service;
pub mod ledger_service;
pub mod receipt_service;

pub use account_service::AccountService;
pub use jwt_service::JWTService;
pub use ledger_service::LedgerService;
pub use receipt_service::{ReceiptGateway, StoreReceiptGateway};
