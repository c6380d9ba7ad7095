//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field except the server host has a default.

use serde::{Deserialize, Serialize};

use super::nickname::generate_nickname;

/// Root of `irc.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address of the IRC server.
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Who we register as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_nickname")]
    pub nick: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default = "default_user")]
    pub realname: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            nick: default_nickname(),
            user: default_user(),
            pass: None,
            realname: default_user(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Skip the confirmation prompt.
    #[serde(default)]
    pub auto_connect: bool,
    #[serde(default = "default_true")]
    pub reply_ping: bool,
    #[serde(default = "default_true")]
    pub reply_ctcp_version: bool,
    #[serde(default = "default_version_string")]
    pub version_string: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            auto_connect: false,
            reply_ping: true,
            reply_ctcp_version: true,
            version_string: default_version_string(),
        }
    }
}

/// Protocol transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
        }
    }
}

fn default_nickname() -> String {
    generate_nickname()
}
fn default_user() -> String {
    "ircx".to_string()
}
fn default_port() -> u16 {
    6667
}
fn default_true() -> bool {
    true
}
fn default_version_string() -> String {
    format!("ircx {} - Rust IRC client", env!("CARGO_PKG_VERSION"))
}
fn default_log_dir() -> String {
    "~/.local/share/ircx/logs".to_string()
}
