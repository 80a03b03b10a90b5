//! Configuration module

use serde::Deserialize;

/// Prefixes checked, in order, for the Arduino client credentials.
/// The second one is the name used by browser-exposed deployments.
const CREDENTIAL_ENV_PREFIXES: [&str; 2] = ["ARDUINO_", "NEXT_PUBLIC_ARDUINO_"];

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub arduino: ArduinoConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which collection is fetched first when building the device view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// `/things` + properties per thing, grouped by device id afterwards
    #[default]
    Things,
    /// `/devices` + things per device + properties per thing
    Devices,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArduinoConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub strategy: AggregationStrategy,
}

impl Default for ArduinoConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            audience: default_audience(),
            auth_url: default_auth_url(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            strategy: AggregationStrategy::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_audience() -> String {
    "https://api2.arduino.cc/iot".to_string()
}

fn default_auth_url() -> String {
    "https://api2.arduino.cc/iot/v1".to_string()
}

fn default_api_url() -> String {
    "https://api2.arduino.cc/iot/v2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// First non-empty `<prefix><name>` variable among the credential prefixes
fn credential_from_env(name: &str) -> Option<String> {
    first_non_empty(
        CREDENTIAL_ENV_PREFIXES
            .iter()
            .map(|prefix| std::env::var(format!("{prefix}{name}")).ok()),
    )
}

fn first_non_empty(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("VIEWER").separator("__"))
            .set_override_option("arduino.client_id", credential_from_env("CLIENT_ID"))?
            .set_override_option(
                "arduino.client_secret",
                credential_from_env("CLIENT_SECRET"),
            )?
            .build()?;

        let config: Config = settings.try_deserialize()?;

        if config.arduino.client_id.is_empty() || config.arduino.client_secret.is_empty() {
            tracing::warn!(
                "Arduino client credentials are not set; every fetch will fail with an authentication error"
            );
        }

        Ok(config)
    }
}
