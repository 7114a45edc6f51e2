use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub classifier: ClassifierServiceSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest multipart body accepted on `/upload`.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Set to true when the frontend is served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Deserialize, Clone, Debug)]
pub struct ClassifierServiceSettings {
    /// Base origin of the classification service, without a trailing path.
    #[serde(default = "default_classifier_url")]
    pub base_url: String,
    /// Per-request timeout. Requests are unbounded when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ClassifierServiceSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ClassifierServiceSettings {
    fn default() -> Self {
        Self {
            base_url: default_classifier_url(),
            request_timeout_secs: None,
        }
    }
}

fn default_classifier_url() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Deserialize, Clone, Debug)]
pub struct UploadSettings {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Seconds before an unfinished upload stops blocking the next one.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl UploadSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_stale_after_secs() -> u64 {
    300
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".txt".to_string(), ".pdf".to_string(), ".docx".to_string()]
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g. http://tempo:4317). Spans are not exported when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;

    // Running from the workspace root or from inside the crate both work.
    let configuration_directory = if base_path.ends_with("classifier-frontend") {
        base_path.join("config")
    } else {
        base_path.join("classifier-frontend").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 3000)?
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("upload.allowed_extensions"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
