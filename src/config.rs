use std::env;
use std::time::Duration;

/// Process configuration, read once at boot from the environment (via
/// `.env` in development, real env vars in any deployed environment).
/// Every field is resolved eagerly in [`Settings::load`] so a missing or
/// malformed value fails fast before the listener binds, rather than
/// surfacing as a panic deep in a request handler.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub gateway_mode: GatewayMode,
    pub gateway_api_base: String,
    pub gateway_api_secret: String,
    pub gateway_webhook_secret: String,
    pub rate_limit_per_minute: u32,
    pub funding_session_ttl: Duration,
    pub log_format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Live,
    Mock,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let gateway_mode = match env::var("GATEWAY_MODE").unwrap_or_else(|_| "mock".into()).as_str() {
            "live" => GatewayMode::Live,
            "mock" => GatewayMode::Mock,
            other => anyhow::bail!("GATEWAY_MODE must be \"live\" or \"mock\", got {other:?}"),
        };

        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
            gateway_mode,
            gateway_api_base: env::var("GATEWAY_API_BASE").unwrap_or_else(|_| "https://api.sandbox.payflow-gateway.test".to_string()),
            gateway_api_secret: env::var("GATEWAY_API_SECRET").unwrap_or_default(),
            gateway_webhook_secret: if gateway_mode == GatewayMode::Live {
                require_env("GATEWAY_WEBHOOK_SECRET")?
            } else {
                env::var("GATEWAY_WEBHOOK_SECRET").unwrap_or_else(|_| "test_webhook_secret".to_string())
            },
            rate_limit_per_minute: env::var("RATE_LIMIT_RPM")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_RPM must be a positive integer"))?,
            funding_session_ttl: Duration::from_secs(
                60 * env::var("FUNDING_SESSION_TTL_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("FUNDING_SESSION_TTL_MINUTES must be a positive integer"))?,
            ),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn require_env(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_joins_host_and_port() {
        let settings = Settings {
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            gateway_mode: GatewayMode::Mock,
            gateway_api_base: String::new(),
            gateway_api_secret: String::new(),
            gateway_webhook_secret: String::new(),
            rate_limit_per_minute: 1000,
            funding_session_ttl: Duration::from_secs(60),
            log_format: "pretty".to_string(),
        };
        assert_eq!(settings.addr(), "127.0.0.1:3000");
    }
}
