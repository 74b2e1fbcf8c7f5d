use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub products_service_url: String,
    pub payments_service_url: String,
    pub payment_currency: String,
    /// Applied to outbound RPC calls; unset means the client waits indefinitely.
    pub rpc_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match env::var("ORDER_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => anyhow::bail!("unsupported ORDER_STORE value: {other}"),
        };
        let database_url = match store {
            StoreBackend::Postgres => Some(env::var("DATABASE_URL")?),
            StoreBackend::Memory => env::var("DATABASE_URL").ok(),
        };
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let products_service_url = env::var("PRODUCTS_SERVICE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3001".to_string());
        let payments_service_url = env::var("PAYMENTS_SERVICE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3003".to_string());
        let payment_currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string());
        let rpc_timeout = env::var("RPC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        Ok(Self {
            database_url,
            host,
            port,
            store,
            products_service_url,
            payments_service_url,
            payment_currency,
            rpc_timeout,
        })
    }
}
