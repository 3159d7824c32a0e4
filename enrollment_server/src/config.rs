use std::env;

use chrono::Duration;
use gateway_tools::GatewayConfig;
use log::*;
use lp_common::{
    helpers::{non_blank, parse_boolean_flag},
    Secret,
    DEFAULT_CURRENCY_CODE,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_LPS_HOST: &str = "127.0.0.1";
const DEFAULT_LPS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/learning_payments.db";
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);
const DEFAULT_MAIL_FROM: &str = "Learning Platform <no-reply@localhost>";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    /// The currency that orders are placed in.
    pub currency: String,
    /// Run in mock mode even when gateway credentials are present.
    pub force_mock_mode: bool,
    pub mail: MailConfig,
    /// The time before an unpaid order is considered expired and marked as such.
    pub unpaid_order_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPS_HOST.to_string(),
            port: DEFAULT_LPS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            force_mock_mode: false,
            mail: MailConfig::default(),
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LPS_HOST").ok().unwrap_or_else(|| DEFAULT_LPS_HOST.into());
        let port = parse_port(env::var("LPS_PORT").ok());
        let database_url = non_blank(env::var("LPS_DATABASE_URL").ok()).unwrap_or_else(|| {
            warn!("🪛️ LPS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration. {e}. Reverting to the default configuration.");
            AuthConfig::default()
        });
        let gateway = GatewayConfig::new_from_env_or_default();
        let currency = non_blank(env::var("LPS_CURRENCY").ok())
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let force_mock_mode = parse_boolean_flag(env::var("LPS_FORCE_MOCK_MODE").ok(), false);
        let mail = MailConfig::from_env_or_default();
        let unpaid_order_timeout = parse_order_timeout(env::var("LPS_UNPAID_ORDER_TIMEOUT").ok());
        Self {
            host,
            port,
            database_url,
            auth,
            gateway,
            currency,
            force_mock_mode,
            mail,
            unpaid_order_timeout,
        }
    }

    /// True if the server will simulate the gateway rather than talk to it.
    pub fn is_mock_mode(&self) -> bool {
        self.force_mock_mode || !self.gateway.has_credentials()
    }
}

fn parse_port(value: Option<String>) -> u16 {
    value
        .map(|s| {
            s.trim().parse::<u16>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid port for LPS_PORT. {e} Using the default, {DEFAULT_LPS_PORT}, instead.");
                DEFAULT_LPS_PORT
            })
        })
        .unwrap_or(DEFAULT_LPS_PORT)
}

fn parse_order_timeout(value: Option<String>) -> Duration {
    value
        .ok_or_else(|| {
            info!(
                "🪛️ LPS_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| match s.trim().parse::<i64>() {
            Ok(h) if h > 0 => Ok(Duration::hours(h)),
            Ok(h) => Err(warn!("🪛️ LPS_UNPAID_ORDER_TIMEOUT must be a positive number of hours, not {h}.")),
            Err(e) => Err(warn!("🪛️ Invalid configuration value for LPS_UNPAID_ORDER_TIMEOUT. {e}")),
        })
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key that user access tokens are signed with. Tokens are issued by the platform's login service.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No access token \
             issued by the login service will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let key = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(key) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, String> {
        let secret = non_blank(env::var("LPS_JWT_SECRET").ok()).ok_or("LPS_JWT_SECRET is not set")?;
        if secret.len() < 32 {
            warn!("🪛️ LPS_JWT_SECRET is shorter than 32 characters. Consider using a longer secret.");
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  MailConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct MailConfig {
    /// Where enrollment confirmations are posted. If `None`, they are only logged.
    pub relay_url: Option<String>,
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self { relay_url: None, from: DEFAULT_MAIL_FROM.to_string() }
    }
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let relay_url = non_blank(env::var("LPS_MAIL_RELAY_URL").ok());
        if relay_url.is_none() {
            info!("🪛️ LPS_MAIL_RELAY_URL is not set. Enrollment confirmations will be logged, not sent.");
        }
        let from = non_blank(env::var("LPS_MAIL_FROM").ok()).unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        Self { relay_url, from }
    }
}
