// Integration tests
//
// Database-backed tests are #[ignore]d and expect DATABASE_URL to point at
// a PostgreSQL instance; migrations are applied on first connect.

mod support;

mod ledger_test;
mod middleware_test;
mod purchase_flow_test;
mod race_condition_test;
