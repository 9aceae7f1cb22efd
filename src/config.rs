//! Configuration module

use std::env;
use std::fmt;
use std::path::PathBuf;

/// File name of the serialized classifier inside the model directory
pub const MODEL_FILE: &str = "iris_clf.json";

/// File name of the metadata record inside the model directory
pub const METADATA_FILE: &str = "metadata.json";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding the training artifacts
    pub model_dir: PathBuf,

    /// Basic-auth username
    pub auth_user: String,

    /// Basic-auth password
    pub auth_pass: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_dir: PathBuf::from("models"),
            auth_user: "student".to_string(),
            auth_pass: "password".to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("model_dir", &self.model_dir)
            .field("auth_user", &self.auth_user)
            .field("auth_pass", &"***")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),

            auth_user: env::var("APP_USER").unwrap_or(defaults.auth_user),

            auth_pass: env::var("APP_PASS").unwrap_or(defaults.auth_pass),
        }
    }

    /// Path of the serialized model
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }

    /// Path of the metadata record
    pub fn metadata_path(&self) -> PathBuf {
        self.model_dir.join(METADATA_FILE)
    }
}
