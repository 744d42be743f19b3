pub mod accounts;
pub mod purchase_events;

pub mod prelude {
    pub use super::accounts;
    pub use super::purchase_events;
}
