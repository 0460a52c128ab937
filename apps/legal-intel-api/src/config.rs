//! Runtime configuration
//!
//! Command-line flags fall back to environment variables (after `.env` is
//! loaded), then to defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

/// Minimum HS256 secret length in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted access token lifetime (30 days)
pub const MAX_TOKEN_TTL_MINUTES: u64 = 30 * 24 * 60;

/// Default upload limit (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Command-line arguments for the legal intel server
#[derive(Parser, Debug, Clone)]
#[command(name = "legal-intel-api")]
#[command(about = "Legal document analysis and dashboard API")]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// SQLite connection string (defaults to the platform data directory)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// HS256 signing secret for access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value = "30")]
    pub token_ttl_minutes: u64,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: usize,

    /// JSON rule table replacing the built-in classifier rules
    #[arg(long, env = "LEGAL_INTEL_RULES")]
    pub rules: Option<PathBuf>,

    /// Comma-separated CORS origins; empty allows any origin
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Settings the request handlers need
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl_minutes: u64,
    pub max_file_size: usize,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Self {
            jwt_secret: args.jwt_secret.clone(),
            token_ttl_minutes: args.token_ttl_minutes,
            max_file_size: args.max_file_size,
            allowed_origins: args
                .allowed_origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!(
                "JWT secret must be at least {} bytes (got {})",
                MIN_JWT_SECRET_LEN,
                self.jwt_secret.len()
            );
        }
        if self.token_ttl_minutes == 0 {
            bail!("Token lifetime must be at least one minute");
        }
        if self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            bail!(
                "Token lifetime must be at most {} minutes (got {})",
                MAX_TOKEN_TTL_MINUTES,
                self.token_ttl_minutes
            );
        }
        if self.max_file_size == 0 {
            bail!("Maximum file size must be positive");
        }
        Ok(())
    }

    /// Saturates rather than wrapping when called on an unvalidated config
    pub fn token_ttl_seconds(&self) -> u64 {
        self.token_ttl_minutes.checked_mul(60).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["legal-intel-api", "--jwt-secret", "0123456789abcdef0123456789abcdef"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.port, 8000);
        assert_eq!(args.host, "0.0.0.0");

        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.token_ttl_minutes, 30);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.token_ttl_seconds(), 1800);
    }

    #[test]
    fn test_allowed_origins_split_on_commas() {
        let args = parse(&[
            "--allowed-origins",
            "http://localhost:3000, https://dash.example.com",
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "https://dash.example.com"]
        );
    }

    #[test]
    fn test_short_secret_rejected() {
        let args = Args::try_parse_from(["legal-intel-api", "--jwt-secret", "too-short"]).unwrap();
        assert!(Config::from_args(&args).is_err());
    }

    #[test]
    fn test_token_lifetime_is_bounded() {
        let max = MAX_TOKEN_TTL_MINUTES.to_string();
        let config = Config::from_args(&parse(&["--token-ttl-minutes", &max])).unwrap();
        assert_eq!(config.token_ttl_seconds(), MAX_TOKEN_TTL_MINUTES * 60);

        let too_long = (MAX_TOKEN_TTL_MINUTES + 1).to_string();
        assert!(Config::from_args(&parse(&["--token-ttl-minutes", &too_long])).is_err());
        assert!(Config::from_args(&parse(&["--token-ttl-minutes", "0"])).is_err());
    }

    #[test]
    fn test_ttl_seconds_saturates_instead_of_overflowing() {
        let config = Config {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            token_ttl_minutes: u64::MAX,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_origins: Vec::new(),
        };
        assert!(config.validate().is_err());
        assert_eq!(config.token_ttl_seconds(), u64::MAX);
    }

    #[test]
    fn test_bind_addr() {
        let args = parse(&["--host", "127.0.0.1", "--port", "9100"]);
        assert_eq!(args.bind_addr().unwrap().to_string(), "127.0.0.1:9100");
    }
}
