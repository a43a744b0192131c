use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;

/// Environment variable prefix for config overrides (`SCRIBE_HTTP__PORT=9000`).
pub const ENV_PREFIX: &str = "SCRIBE";

/// Legacy single-variable port override honoured by older deployments.
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScribeConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Attach a permissive CORS layer so browser frontends can call the API.
    pub cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    pub backend: String,
    /// Upper bound on a single classify call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: "stub".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ScribeConfig {
    /// Load from an optional TOML file, then apply `SCRIBE_*` and `PORT`
    /// overrides from the process environment.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Same as [`ScribeConfig::load`], but reads overrides from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(
        path: &str,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let port = match &env {
            Some(vars) => vars.get(PORT_ENV).cloned(),
            None => std::env::var(PORT_ENV).ok(),
        }
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>().map(i64::from).map_err(|e| {
                ConfigError::Message(format!("invalid {} value {:?}: {}", PORT_ENV, p, e))
            })
        })
        .transpose()?;

        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("http.port", port)?
            .build()?;
        s.try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}
