use anyhow::{Context, Result};
use secrecy::SecretString;
use std::env;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub email: Option<EmailConfig>,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

/// Hosted payment gateway credentials and endpoints. Always injected into
/// the adapter at construction; the adapter never reads ambient state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub store_id: String,
    pub store_password: SecretString,
    pub api_url: String,
    pub validation_url: String,
    pub is_sandbox: bool,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    /// Public base URL used to build the gateway callback URLs.
    pub base_url: String,
    pub currency: String,
    /// Strict lifecycle mode: reserve a slot while a payment is pending and
    /// deduplicate repeated gateway callbacks. Off by default, matching the
    /// relaxed semantics the system has always had.
    pub strict_lifecycle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        let is_sandbox = env::var("GATEWAY_IS_SANDBOX")
            .map(|v| v.parse().unwrap_or(true))
            .unwrap_or(true);
        let (default_api_url, default_validation_url) = if is_sandbox {
            (
                "https://sandbox.sslcommerz.com/gwprocess/v4/api.php",
                "https://sandbox.sslcommerz.com/validator/api/validationserverAPI.php",
            )
        } else {
            (
                "https://securepay.sslcommerz.com/gwprocess/v4/api.php",
                "https://securepay.sslcommerz.com/validator/api/validationserverAPI.php",
            )
        };
        let gateway = GatewayConfig {
            store_id: env::var("GATEWAY_STORE_ID").context("GATEWAY_STORE_ID must be set")?,
            store_password: SecretString::from(
                env::var("GATEWAY_STORE_PASSWORD")
                    .context("GATEWAY_STORE_PASSWORD must be set")?,
            ),
            api_url: env::var("GATEWAY_API_URL").unwrap_or_else(|_| default_api_url.to_string()),
            validation_url: env::var("GATEWAY_VALIDATION_URL")
                .unwrap_or_else(|_| default_validation_url.to_string()),
            is_sandbox,
        };

        // SMTP is optional; without it confirmations go to the log only.
        let email = if let Ok(smtp_server) = env::var("SMTP_SERVER") {
            let smtp_port = env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Failed to parse SMTP_PORT")?;
            Some(EmailConfig {
                smtp_server,
                smtp_port,
                smtp_username: env::var("SMTP_USERNAME")
                    .context("SMTP_USERNAME must be set when SMTP_SERVER is provided")?,
                smtp_password: SecretString::from(
                    env::var("SMTP_PASSWORD")
                        .context("SMTP_PASSWORD must be set when SMTP_SERVER is provided")?,
                ),
                from_email: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "noreply@example.com".to_string()),
                from_name: env::var("EMAIL_FROM_NAME")
                    .unwrap_or_else(|_| "Workshop Registration".to_string()),
            })
        } else {
            None
        };

        let environment = match env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let app = AppConfig {
            name: env::var("APP_NAME").unwrap_or_else(|_| "Workshop Registration".to_string()),
            environment,
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "BDT".to_string()),
            strict_lifecycle: env::var("STRICT_LIFECYCLE")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
        };

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            gateway,
            email,
            app,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    #[allow(unused)]
    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }
}

use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

pub fn get() -> &'static Config {
    CONFIG.get().expect("Config is not initialized")
}
