//! Environment-sourced runtime configuration.
//!
//! Mirrors `shipper::auth`'s resolution style (read, trim, validate) but
//! for the handful of env vars spec §6 names: `GITHUB_TOKEN` and
//! `EIFL_PUBLIC_URL` are read here; `EIFL_ENCRYPTION_KEY` is read lazily by
//! `eifl_encrypt::derived_key` itself, since that value is cached
//! process-wide independent of any `EnvConfig` instance.

use std::env;
use std::time::Duration;

/// Default scheduler tick period (spec §4.E: "default 60 s").
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

/// Runtime configuration resolved once at startup from the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Injected as `oauth2:<token>@` userinfo into `github.com` clone
    /// URLs (spec §4.H step 6 / §6).
    pub github_token: Option<String>,
    /// Base URL used by collaborator-facing status callbacks. Not
    /// consumed by anything in this crate directly — carried through for
    /// the out-of-scope HTTP facade.
    pub public_url: Option<String>,
    pub tick_period: Duration,
}

impl EnvConfig {
    /// Read configuration from the process environment, falling back to
    /// the documented defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            github_token: non_empty_env("GITHUB_TOKEN"),
            public_url: non_empty_env("EIFL_PUBLIC_URL"),
            tick_period: tick_period_from_env().unwrap_or(DEFAULT_TICK_PERIOD),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn tick_period_from_env() -> Option<Duration> {
    let raw = non_empty_env("EIFL_SCHEDULER_TICK_SECONDS")?;
    let secs: u64 = raw.parse().ok()?;
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_unset() {
        temp_env::with_vars(
            [
                ("GITHUB_TOKEN", None::<&str>),
                ("EIFL_PUBLIC_URL", None),
                ("EIFL_SCHEDULER_TICK_SECONDS", None),
            ],
            || {
                let config = EnvConfig::from_env();
                assert_eq!(config.github_token, None);
                assert_eq!(config.public_url, None);
                assert_eq!(config.tick_period, DEFAULT_TICK_PERIOD);
            },
        );
    }

    #[test]
    fn reads_configured_values() {
        temp_env::with_vars(
            [
                ("GITHUB_TOKEN", Some("ghp_abc123")),
                ("EIFL_PUBLIC_URL", Some("https://ci.example.com")),
                ("EIFL_SCHEDULER_TICK_SECONDS", Some("30")),
            ],
            || {
                let config = EnvConfig::from_env();
                assert_eq!(config.github_token.as_deref(), Some("ghp_abc123"));
                assert_eq!(config.public_url.as_deref(), Some("https://ci.example.com"));
                assert_eq!(config.tick_period, Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn blank_env_vars_are_treated_as_unset() {
        temp_env::with_var("GITHUB_TOKEN", Some("   "), || {
            assert_eq!(EnvConfig::from_env().github_token, None);
        });
    }
}
