use crate::{
    config::Config,
    services::{AccountService, JWTService, LedgerService, ReceiptGateway, StoreReceiptGateway},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: Arc<redis::Client>,
    pub jwt_service: Arc<JWTService>,
    pub ledger_service: Arc<LedgerService>,
    pub account_service: Arc<AccountService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let db = sea_orm::Database::connect(&config.database.url).await?;

        // Connect to Redis
        let redis = Arc::new(redis::Client::open(config.redis.url.as_str())?);

        let gateway: Arc<dyn ReceiptGateway> = Arc::new(StoreReceiptGateway::new(&config.iap)?);

        Ok(Self::assemble(config, db, redis, gateway))
    }

    /// Assemble the state from pre-built collaborators.
    ///
    /// Integration tests use this to swap in a mock receipt gateway.
    pub fn assemble(
        config: Config,
        db: DatabaseConnection,
        redis: Arc<redis::Client>,
        gateway: Arc<dyn ReceiptGateway>,
    ) -> Self {
        let jwt_service = Arc::new(JWTService::new(Arc::new(config.auth.clone())));
        let ledger_service = Arc::new(LedgerService::new(db.clone()));
        let account_service = Arc::new(AccountService::new(
            db.clone(),
            gateway,
            ledger_service.clone(),
            &config.billing,
        ));

        Self {
            db,
            redis,
            jwt_service,
            ledger_service,
            account_service,
            config: Arc::new(config),
        }
    }
}
