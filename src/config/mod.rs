//! TOML configuration.
//!
//! ```toml
//! [source.devel]
//! readonly_uri = "mysql://reader:pw@host/topmed_pheno_devel"
//! lock_uri = "mysql://locker:pw@host/topmed_pheno_devel"
//! lock_wait_timeout = "1h"
//!
//! [destination]
//! endpoint = "ws://localhost:8000"
//! namespace = "pheno"
//! database = "inventory"
//! username = "root"
//! password = "root"
//!
//! [backup]
//! program = "surreal"
//! args = ["export", "--conn", "http://localhost:8000", "backup.surql"]
//! ```

pub mod duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use destination_store::SurrealOpts;
use mysql_source::SourceOpts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use duration::parse_duration_to_secs;

/// Source database environment a pass runs against.
///
/// `Test` is the only environment that allows import-only and update-only
/// passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    Devel,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Test => "test",
            Self::Devel => "devel",
            Self::Production => "production",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub readonly_uri: String,
    pub lock_uri: String,
    #[serde(default)]
    pub lock_wait_timeout: Option<String>,
}

impl SourceConfig {
    pub fn to_opts(&self) -> Result<SourceOpts> {
        let lock_wait_timeout = self
            .lock_wait_timeout
            .as_deref()
            .map(parse_duration_to_secs)
            .transpose()
            .context("Invalid lock_wait_timeout")?;
        Ok(SourceOpts {
            readonly_uri: self.readonly_uri.clone(),
            lock_uri: self.lock_uri.clone(),
            lock_wait_timeout,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub test: Option<SourceConfig>,
    pub devel: Option<SourceConfig>,
    pub production: Option<SourceConfig>,
}

fn default_username() -> String {
    "root".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl DestinationConfig {
    /// Whether this destination is the in-process store.
    pub fn is_memory(&self) -> bool {
        self.endpoint == "mem://"
    }

    pub fn to_opts(&self) -> SurrealOpts {
        SurrealOpts {
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            namespace: self.namespace.clone(),
            database: self.database.clone(),
        }
    }
}

/// External command run before a pass mutates anything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub source: SourcesConfig,
    pub destination: DestinationConfig,
    /// Required for a pass unless it runs with `--no-backup`.
    #[serde(default)]
    pub backup: Option<BackupConfig>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct DestinationOverrides {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        const SCHEMES: [&str; 5] = ["ws://", "wss://", "http://", "https://", "mem://"];
        if !SCHEMES
            .iter()
            .any(|scheme| self.destination.endpoint.starts_with(scheme))
        {
            bail!(
                "Unsupported destination endpoint '{}'; expected one of {}",
                self.destination.endpoint,
                SCHEMES.join(", ")
            );
        }
        if let Some(backup) = &self.backup {
            if backup.program.trim().is_empty() {
                bail!("[backup] program must not be empty");
            }
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: DestinationOverrides) {
        if let Some(endpoint) = overrides.endpoint {
            self.destination.endpoint = endpoint;
        }
        if let Some(username) = overrides.username {
            self.destination.username = username;
        }
        if let Some(password) = overrides.password {
            self.destination.password = password;
        }
    }

    /// Connection settings for `environment`.
    pub fn source_for(&self, environment: Environment) -> Result<SourceOpts> {
        let source = match environment {
            Environment::Test => &self.source.test,
            Environment::Devel => &self.source.devel,
            Environment::Production => &self.source.production,
        };
        source
            .as_ref()
            .ok_or_else(|| anyhow!("No [source.{environment}] section in the config file"))?
            .to_opts()
    }
}
