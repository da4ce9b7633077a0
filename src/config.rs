use serde::Deserialize;

/// Minimum length of the session signing secret, as required by cookie signing keys.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    pub secure: bool,
    pub idle_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub admin_email: String,
    pub admin_password: Option<String>,
    pub default_quota: u32,
    pub bcrypt_cost: u32,
    pub remember_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub render_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("session.secret must be at least 64 bytes")]
    WeakSecret,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.redis.url.trim().is_empty() {
            return Err(ConfigError::Missing("redis.url"));
        }
        if self.session.secret.is_empty() {
            return Err(ConfigError::Missing("session.secret"));
        }
        if self.session.secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }
        Ok(())
    }

    pub fn remember_max_age(&self) -> time::Duration {
        time::Duration::days(self.auth.remember_days)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                max_body_bytes: 64 * 1024,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1/".into(),
            },
            session: SessionConfig {
                secret: "x".repeat(MIN_SESSION_SECRET_LEN),
                cookie_name: "session".into(),
                secure: false,
                idle_minutes: 60,
            },
            auth: AuthConfig {
                admin_email: "admin@example.com".into(),
                admin_password: Some("password123".into()),
                default_quota: 3,
                bcrypt_cost: 4,
                remember_days: 365,
            },
            chart: ChartConfig {
                width: 800,
                height: 600,
                render_timeout_secs: 30,
            },
        }
    }
}
