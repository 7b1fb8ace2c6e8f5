use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/eventhub";
const DEV_JWT_SECRET: &str = "eventhub-development-secret";
/// Longest session a token may grant, one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_FROM_EMAIL: &str = "Events Hub <noreply@eventhub.local>";

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub page_size: u32,
    pub production: bool,
    pub from_email: String,
    pub smtp: Option<SmtpConfig>,
    pub reminder_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24 * 14,
            page_size: 12,
            production: false,
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            smtp: None,
            reminder_interval: Duration::from_secs(300),
        }
    }
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid value for {}, using default", key);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Session token lifetime, kept within `1..=MAX_TOKEN_TTL_HOURS` hours.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS))
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("Config: JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let smtp = env::var("SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            port: parsed_or("SMTP_PORT", 587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
        });

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parsed_or("BIND_ADDR", defaults.bind_addr),
            jwt_secret,
            token_ttl_hours: parsed_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours)
                .clamp(1, MAX_TOKEN_TTL_HOURS),
            page_size: parsed_or("PAGE_SIZE", defaults.page_size).max(1),
            production,
            from_email: env::var("DEFAULT_FROM_EMAIL").unwrap_or(defaults.from_email),
            smtp,
            reminder_interval: Duration::from_secs(parsed_or("REMINDER_INTERVAL_SECS", 300).max(1)),
        }
    }
}
