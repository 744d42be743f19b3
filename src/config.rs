use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub iap: IAPConfig,
    pub auth: AuthConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IAPConfig {
    pub apple_shared_secret: String,
    /// "production" selects the live verifyReceipt endpoint, anything else
    /// the sandbox one.
    pub apple_environment: String,
    pub google_api_base: String,
    pub google_package_name: String,
    #[serde(default)]
    pub google_access_token: Option<String>,
    /// Bounded budget for the store verification call, in seconds.
    #[serde(default = "default_verify_timeout_seconds")]
    pub verify_timeout_seconds: u64,
}

fn default_verify_timeout_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Paid credits granted with every verified subscription purchase.
    pub subscription_grant_credits: i32,
    /// Free credits seeded into a newly provisioned account.
    pub initial_free_credits: i32,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // Build config from config.yml (required) with environment variable overrides
        let config = config::Config::builder()
            // Load config.yml (REQUIRED)
            .add_source(config::File::with_name("config").required(true))
            // Allow environment variables to override config file
            .add_source(
                config::Environment::with_prefix("BACKCOACH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
