//! Command-line and environment configuration.

use std::net::SocketAddr;

use changes::{ChangeHookConfig, DEFAULT_SSH_HOST};
use clap::{Parser, ValueEnum};
use listener::{DEFAULT_BODY_LIMIT, DEFAULT_HOOK_PATH};

/// Output format of diagnostic logs (written to stderr).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pushhook")]
#[command(about = "Turns push webhooks into ordered change records for a CI scheduler", long_about = None)]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "PUSHHOOK_BIND", default_value = "127.0.0.1:8010")]
    pub bind: SocketAddr,

    /// Route the webhook is served on
    #[arg(long, env = "PUSHHOOK_PATH", default_value = DEFAULT_HOOK_PATH, value_parser = parse_route)]
    pub path: String,

    /// user@host prefix of git clone URLs
    #[arg(long, env = "PUSHHOOK_SSH_HOST", default_value = DEFAULT_SSH_HOST)]
    pub ssh_host: String,

    /// Largest webhook request body accepted, in bytes
    #[arg(long, env = "PUSHHOOK_MAX_BODY", default_value_t = DEFAULT_BODY_LIMIT)]
    pub max_body: usize,

    /// Log output format
    #[arg(long, env = "PUSHHOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Returns the settings for the change hook.
    pub fn hook_config(&self) -> ChangeHookConfig {
        ChangeHookConfig {
            ssh_host: self.ssh_host.clone(),
        }
    }
}

fn parse_route(value: &str) -> Result<String, String> {
    if value.starts_with('/') && value.len() > 1 {
        Ok(value.to_string())
    } else {
        Err(format!("route must start with '/' and name a path, got '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["pushhook"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8010".parse().unwrap());
        assert_eq!(config.path, "/change_hook/bitbucket");
        assert_eq!(config.hook_config(), ChangeHookConfig::default());
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.max_body, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "pushhook",
            "--bind",
            "0.0.0.0:9000",
            "--path",
            "/hooks/push",
            "--ssh-host",
            "git@git.example.com",
            "--log-format",
            "json",
            "--max-body",
            "4096",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.path, "/hooks/push");
        assert_eq!(config.hook_config().ssh_host, "git@git.example.com");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_body, 4096);
    }

    #[test]
    fn test_rejects_relative_route() {
        assert!(Config::try_parse_from(["pushhook", "--path", "change_hook"]).is_err());
        assert!(Config::try_parse_from(["pushhook", "--path", "/"]).is_err());
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        assert!(Config::try_parse_from(["pushhook", "--bind", "localhost"]).is_err());
    }
}
