use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret. Required, no default.
    pub secret: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Internal media address that granted publishers are redirected to.
    /// The stream id is appended as the last path segment.
    #[serde(default = "default_ingest_base_url")]
    pub ingest_base_url: String,
    /// Require the stream to belong to the authenticated publisher.
    #[serde(default = "default_enforce_ownership")]
    pub enforce_ownership: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_expiry_hours() -> u64 {
    5
}

fn default_ingest_base_url() -> String {
    "rtmp://127.0.0.1/hls-live".to_string()
}

fn default_enforce_ownership() -> bool {
    true
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/livestream")?
            .set_default("database.max_connections", 10)?
            .set_default("jwt.expiry_hours", 5)?
            .set_default("publish.ingest_base_url", default_ingest_base_url())?
            .set_default("publish.enforce_ownership", true)?
            // Older deployments export the secret under this name
            .set_override_option("jwt.secret", std::env::var("ACCESS_TOKEN_SECRET").ok())?
            .build()?;

        let config: Config = config
            .try_deserialize()
            .context("invalid configuration (is JWT__SECRET or ACCESS_TOKEN_SECRET set?)")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.trim().is_empty() {
            bail!("jwt.secret must not be empty");
        }
        if self.jwt.expiry_hours == 0 {
            bail!("jwt.expiry_hours must be greater than zero");
        }
        if self.publish.ingest_base_url.trim().is_empty() {
            bail!("publish.ingest_base_url must not be empty");
        }
        Ok(())
    }
}
