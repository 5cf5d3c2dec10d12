use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "BUDGET";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub insights: InsightsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// No URL selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub max_upload_bytes: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

// Keeps the key out of startup logs.
impl std::fmt::Debug for InsightsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightsConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
            },
            import: ImportConfig {
                max_upload_bytes: 10 * 1024 * 1024,
            },
            insights: InsightsConfig {
                endpoint: None,
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = AppConfig::default();
    builder
        .set_default("server.host", defaults.server.host)?
        .set_default("server.port", i64::from(defaults.server.port))?
        .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
        .set_default("import.max_upload_bytes", defaults.import.max_upload_bytes as i64)?
        .set_default("insights.model", defaults.insights.model)?
        .set_default("insights.timeout_secs", defaults.insights.timeout_secs as i64)
}

impl AppConfig {
    /// Defaults, then `config/default.toml`, then `BUDGET__*` variables, then
    /// `DATABASE_URL`, `SERVER_HOST`, `SERVER_PORT` and `INSIGHTS_API_KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .map(i64::from);

        with_defaults(config::Config::builder())?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", port)?
            .set_override_option("insights.api_key", std::env::var("INSIGHTS_API_KEY").ok())?
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        with_defaults(config::Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.import.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.insights.model, "gpt-4o-mini");
        assert!(config.insights.endpoint.is_none());
    }

    #[test]
    fn document_overrides_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [database]
            url = "postgres://localhost/budget"

            [insights]
            endpoint = "https://api.example.com/v1/chat/completions"
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/budget"));
        assert_eq!(config.insights.timeout_secs, 30);
        assert!(!format!("{:?}", config.insights).contains("sk-test"));
    }

    // The only test in the crate that touches these variables.
    #[test]
    fn environment_layers_override_the_file() {
        std::env::set_var("BUDGET__SERVER__PORT", "9100");
        std::env::set_var("BUDGET__INSIGHTS__ENDPOINT", "http://insights.local/v1");
        std::env::remove_var("SERVER_PORT");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.insights.endpoint.as_deref(),
            Some("http://insights.local/v1")
        );

        std::env::set_var("SERVER_PORT", "9200");
        assert_eq!(AppConfig::load().unwrap().server.port, 9200);

        std::env::set_var("SERVER_PORT", "not-a-port");
        assert_eq!(AppConfig::load().unwrap().server.port, 9100);

        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("BUDGET__SERVER__PORT");
        std::env::remove_var("BUDGET__INSIGHTS__ENDPOINT");
    }
}
