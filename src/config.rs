//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` but can be specified
//! via the `-f` flag or the `FILEGATE_CONFIG` environment variable; all
//! defaults are usable without any file at all.
//!
//! Sources are merged in order (later overrides earlier):
//!
//! 1. **YAML config file** - base configuration
//! 2. **Environment variables** - `FILEGATE_`-prefixed, `__` for nesting
//!    (e.g. `FILEGATE_STORAGE__TYPE=memory` sets `storage.type`)
//!
//! ```bash
//! # Override server port
//! FILEGATE_PORT=8080
//!
//! # Point the storage client at an emulator
//! FILEGATE_STORAGE__TYPE=gcs
//! FILEGATE_STORAGE__API_BASE=http://localhost:4443
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FILEGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables; every field has a usable
/// default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Object-storage backend configuration
    pub storage: StorageConfig,
    /// Resource limits for protecting system capacity
    pub limits: LimitsConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
            cors: CorsConfig::default(),
            enable_otel_export: false,
        }
    }
}

/// Object-storage backend selection.
///
/// `gcs` is the production backend; `memory` keeps objects in-process and is
/// meant for local development.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Google Cloud Storage over the JSON API
    Gcs {
        /// Bucket all three operations run against
        #[serde(default = "default_bucket")]
        bucket: String,
        /// Base URL of the storage API (override to point at an emulator)
        #[serde(default = "default_api_base")]
        api_base: Url,
        /// Base URL used when constructing public object links
        #[serde(default = "default_public_base")]
        public_base: Url,
        /// Static bearer token sent with every API call, if set
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_token: Option<String>,
    },
    /// In-process object store (development/testing)
    Memory {
        #[serde(default = "default_bucket")]
        bucket: String,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Gcs {
            bucket: default_bucket(),
            api_base: default_api_base(),
            public_base: default_public_base(),
            auth_token: None,
        }
    }
}

impl StorageConfig {
    /// Name of the configured bucket
    pub fn bucket(&self) -> &str {
        match self {
            StorageConfig::Gcs { bucket, .. } => bucket,
            StorageConfig::Memory { bucket } => bucket,
        }
    }
}

fn default_bucket() -> String {
    "testing_app_files".to_string()
}

fn default_api_base() -> Url {
    Url::parse("https://storage.googleapis.com").expect("static URL")
}

fn default_public_base() -> Url {
    Url::parse(crate::storage::DEFAULT_PUBLIC_BASE).expect("static URL")
}

/// Resource limits for protecting system capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            // Whole files are buffered in memory before the storage write
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests; ignored with a wildcard origin
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
        }
    }
}

/// A single allowed CORS origin.
///
/// Either a wildcard (`*`) allowing all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Self::figment(args).extract()
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file (absent file yields empty data)
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            .merge(Env::prefixed("FILEGATE_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args_for(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn defaults_load_without_a_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args_for("does-not-exist.yaml"))?;
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 8080);
            assert_eq!(config.storage.bucket(), "testing_app_files");
            assert!(matches!(config.storage, StorageConfig::Gcs { .. }));
            assert!(!config.enable_otel_export);
            Ok(())
        });
    }

    #[test]
    fn yaml_selects_memory_backend() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 9000
storage:
  type: memory
  bucket: scratch
"#,
            )?;

            let config = Config::load(&args_for("test.yaml"))?;
            assert_eq!(config.port, 9000);
            assert!(matches!(config.storage, StorageConfig::Memory { .. }));
            assert_eq!(config.storage.bucket(), "scratch");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 9000\n")?;
            jail.set_env("FILEGATE_PORT", "9001");
            jail.set_env("FILEGATE_HOST", "127.0.0.1");

            let config = Config::load(&args_for("test.yaml"))?;
            assert_eq!(config.port, 9001);
            assert_eq!(config.bind_address(), "127.0.0.1:9001");
            Ok(())
        });
    }

    #[test]
    fn gcs_backend_accepts_emulator_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
storage:
  type: gcs
  bucket: testing_app_files
  api_base: http://localhost:4443
  auth_token: sekrit
"#,
            )?;

            let config = Config::load(&args_for("test.yaml"))?;
            match config.storage {
                StorageConfig::Gcs {
                    api_base,
                    public_base,
                    auth_token,
                    ..
                } => {
                    assert_eq!(api_base.as_str(), "http://localhost:4443/");
                    // Public links keep the canonical host even against an emulator
                    assert_eq!(public_base.as_str(), "https://storage.googleapis.com/");
                    assert_eq!(auth_token.as_deref(), Some("sekrit"));
                }
                other => panic!("unexpected backend: {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn wildcard_cors_origin_parses() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
cors:
  allowed_origins:
    - "*"
"#,
            )?;

            let config = Config::load(&args_for("test.yaml"))?;
            assert!(matches!(config.cors.allowed_origins[..], [CorsOrigin::Wildcard]));
            Ok(())
        });
    }
}
