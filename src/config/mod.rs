//! Startup settings: command line first, config file otherwise.
//!
//! `ircx HOST PORT [NICK] [USER] [PASS] [auto]` takes everything from the
//! command line. Without HOST and PORT the settings come from a TOML file:
//! `--config PATH`, else `./irc.toml`, else `<config dir>/ircx/config.toml`.

pub mod model;
pub mod nickname;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::irc::connection::Credentials;
pub use model::{AppConfig, BehaviorConfig, LoggingConfig};

const DEFAULT_NICK: &str = "aion";
const DEFAULT_USER: &str = "ircx";
const LOCAL_CONFIG: &str = "irc.toml";

#[derive(Debug, Parser)]
#[command(name = "ircx", version, about = "A minimal terminal IRC client")]
pub struct Cli {
    /// IRC server host
    pub host: Option<String>,
    /// IRC server port
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,
    /// Nickname [default: aion]
    pub nick: Option<String>,
    /// User ident [default: ircx]
    pub user: Option<String>,
    /// Server password
    pub pass: Option<String>,
    /// `auto` connects without asking for confirmation
    #[arg(value_parser = ["auto"])]
    pub mode: Option<String>,
    /// Config file to use when HOST and PORT are not given
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Log protocol traffic and connection events to stderr
    #[arg(short, long)]
    pub debug: bool,
}

/// Everything the session needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub behavior: BehaviorConfig,
    pub logging: LoggingConfig,
}

pub fn load_settings(cli: &Cli) -> Result<Settings> {
    if let (Some(host), Some(port)) = (&cli.host, cli.port) {
        return Ok(settings_from_cli(cli, host, port));
    }

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config_path(),
    };
    let config = load_config(&path)?;
    settings_from_config(config)
}

fn settings_from_cli(cli: &Cli, host: &str, port: u16) -> Settings {
    let user = cli.user.clone().unwrap_or_else(|| DEFAULT_USER.to_string());
    Settings {
        host: host.to_string(),
        port,
        credentials: Credentials {
            nick: cli.nick.clone().unwrap_or_else(|| DEFAULT_NICK.to_string()),
            realname: user.clone(),
            user,
            pass: normalize_pass(cli.pass.clone()),
        },
        behavior: BehaviorConfig {
            auto_connect: cli.mode.is_some(),
            ..BehaviorConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

fn settings_from_config(config: AppConfig) -> Result<Settings> {
    if config.server.host.trim().is_empty() {
        bail!("Configuration is missing [server] host");
    }
    if config.server.port == 0 {
        bail!("Configuration has an invalid [server] port: 0");
    }
    if config.identity.nick.is_empty() || config.identity.user.is_empty() {
        bail!("Configuration needs a non-empty [identity] nick and user");
    }

    Ok(Settings {
        host: config.server.host,
        port: config.server.port,
        credentials: Credentials {
            nick: config.identity.nick,
            user: config.identity.user,
            pass: normalize_pass(config.identity.pass),
            realname: config.identity.realname,
        },
        behavior: config.behavior,
        logging: config.logging,
    })
}

fn normalize_pass(pass: Option<String>) -> Option<String> {
    pass.filter(|p| !p.is_empty())
}

fn config_path() -> PathBuf {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ircx")
        .join("config.toml")
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Couldn't open configuration file {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
    Ok(config)
}
