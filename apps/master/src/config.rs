//! Master configuration.
//!
//! Stored as TOML, by default at `~/.config/enginedock/master.toml`.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use enginedock_receiver::ReceiverConfig;
use serde::{Deserialize, Serialize};

/// Master configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the upload server listens on.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Root for stored artifacts (`<dir>/lib/<kind>/<name>`). `~` is expanded.
    #[serde(default = "default_working_directory")]
    pub working_directory: String,

    /// Maximum upload body size in bytes. Unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_limit: Option<usize>,

    /// Bearer token -> principal name.
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

fn default_listen() -> String {
    "127.0.0.1:9000".into()
}

fn default_working_directory() -> String {
    "~/.enginedock".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            working_directory: default_working_directory(),
            body_limit: None,
            tokens: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Tokens live in this file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Builds the receiver configuration.
    pub fn receiver_config(&self) -> anyhow::Result<ReceiverConfig> {
        let listen: SocketAddr = self
            .listen
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.listen))?;

        Ok(ReceiverConfig {
            listen,
            working_directory: enginedock_file_ops::expand_home(&self.working_directory),
            body_limit: self.body_limit,
        })
    }
}

/// Returns the default configuration file path.
fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("enginedock")
        .join("master.toml")
}
