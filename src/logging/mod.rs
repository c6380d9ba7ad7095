//! Diagnostics and protocol transcripts.
//!
//! Diagnostics go through `tracing` to stderr so they never mix with the
//! console on stdout. When enabled, the transcript records every protocol
//! line to a daily file named `<host>_<date>.log` in the configured log
//! directory (default: `~/.local/share/ircx/logs/`).

use crate::config::LoggingConfig;
use crate::irc::connection::LineObserver;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `debug`.
pub fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Appends inbound (`<<`) and outbound (`>>`) lines to a per-server daily
/// log file.
///
/// The file is reopened when the date changes. Failing to open it is
/// reported through `tracing`; write failures are ignored.
pub struct Transcript {
    log_dir: PathBuf,
    target: String,
    file: Mutex<Option<(String, fs::File)>>,
}

impl Transcript {
    /// Returns `None` when transcripts are disabled.
    pub fn new(config: &LoggingConfig, host: &str) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        // Sanitize host for filename
        let target: String = host
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();

        Some(Self {
            log_dir: expand_home(&config.log_dir),
            target,
            file: Mutex::new(None),
        })
    }

    fn write(&self, direction: &str, line: &str) {
        let now = chrono::Local::now();
        let filename = format!("{}_{}.log", self.target, now.format("%Y-%m-%d"));

        let Ok(mut slot) = self.file.lock() else {
            return;
        };

        let current = matches!(slot.as_ref(), Some((name, _)) if *name == filename);
        if !current {
            let _ = fs::create_dir_all(&self.log_dir);
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.log_dir.join(&filename))
            {
                Ok(file) => *slot = Some((filename, file)),
                Err(e) => {
                    tracing::warn!(error = %e, dir = %self.log_dir.display(), "cannot open transcript");
                    *slot = None;
                    return;
                }
            }
        }

        if let Some((_, file)) = slot.as_mut() {
            let _ = writeln!(file, "[{}] {} {}", now.format("%H:%M:%S"), direction, line);
        }
    }
}

impl LineObserver for Transcript {
    fn inbound(&self, line: &str) {
        self.write("<<", line);
    }

    fn outbound(&self, line: &str) {
        self.write(">>", line);
    }
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(dir),
        },
        None => PathBuf::from(dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_transcript() {
        let config = LoggingConfig::default();
        assert!(Transcript::new(&config, "irc.example.net").is_none());
    }

    #[test]
    fn test_transcript_writes_both_directions() {
        let dir = std::env::temp_dir().join(format!("ircx-transcript-{}", std::process::id()));
        let config = LoggingConfig {
            enabled: true,
            log_dir: dir.to_string_lossy().into_owned(),
        };
        let transcript = Transcript::new(&config, "irc.example.net:bad/name").unwrap();
        transcript.outbound("NICK aion");
        transcript.inbound(":srv 001 aion :Welcome");

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("irc.example.net_bad_name_"), "{}", name);

        let contents = fs::read_to_string(&entries[0]).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert!(lines[0].ends_with(">> NICK aion"));
        assert!(lines[1].ends_with("<< :srv 001 aion :Welcome"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/log/ircx"), PathBuf::from("/var/log/ircx"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/logs"), home.join("logs"));
        }
    }
}
