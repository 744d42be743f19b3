/// Extension methods for the accounts entity
///
/// Business-level projections that complement the persistence model in
/// entity/src/accounts.rs
use crate::models::common::{CreditBalance, SubscriptionStatus};
use entity::accounts;

pub trait AccountExt {
    /// Free + paid counters as one balance projection.
    fn balance(&self) -> CreditBalance;

    /// Parsed subscription status; unknown stored values read as `free`.
    fn status(&self) -> SubscriptionStatus;
}

impl AccountExt for accounts::Model {
    fn balance(&self) -> CreditBalance {
        CreditBalance::new(self.free_credits, self.paid_credits)
    }

    fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.subscription_status).unwrap_or(SubscriptionStatus::Free)
    }
}
