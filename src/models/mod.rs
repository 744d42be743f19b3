// Request/Response models
pub mod account_ext; // Extension methods for entity::accounts
pub mod common;
pub mod credits;
pub mod entitlement;
pub mod purchases;
