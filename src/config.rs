/*!
 * Inhouse bot config file
 */

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub db_config: DbConfig,
    pub tracing_config: Option<TracingConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct DbConfig {
    /// Database URL
    pub database_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TracingConfig {
    /// Jaeger agent endpoint, like `127.0.0.1:6831`
    pub jaeger: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    pub filter: Option<String>,
}

pub fn load_config(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    parse_config(&std::fs::read_to_string(path)?)
}

pub fn parse_config(raw: &str) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(toml::from_str(raw)?)
}
