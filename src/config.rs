// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{defaults, templates};
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL the default component templates are resolved against
    pub template_path: String,
    /// Upper bound on a single component reconcile, fetches and writes included
    pub reconcile_timeout: Duration,
    /// Delay before retrying a reconcile that failed with a retryable error
    pub requeue_interval: Duration,
    /// How long a workload may stay unready before it is reported Unhealthy
    pub unhealthy_grace: Duration,
    pub fetch_timeout: Duration,
    /// Apply the operator's CRDs on startup
    pub install_crds: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            template_path: templates::DEFAULT_BASE.to_string(),
            reconcile_timeout: Duration::from_secs(defaults::RECONCILE_TIMEOUT_SECS),
            requeue_interval: Duration::from_secs(defaults::REQUEUE_SECS),
            unhealthy_grace: Duration::from_secs(defaults::UNHEALTHY_GRACE_SECS),
            fetch_timeout: Duration::from_secs(defaults::FETCH_TIMEOUT_SECS),
            install_crds: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let template_path = env::var("TEMPLATE_PATH")
            .unwrap_or_else(|_| templates::DEFAULT_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        // Disable when the CRDs are managed outside the operator, e.g. by a Helm chart
        let install_crds: bool = env::var("INSTALL_CRDS")
            .unwrap_or("true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Config {
            template_path,
            reconcile_timeout: secs_from_env(
                "RECONCILE_TIMEOUT_SECS",
                defaults::RECONCILE_TIMEOUT_SECS,
            )?,
            requeue_interval: secs_from_env("REQUEUE_SECS", defaults::REQUEUE_SECS)?,
            unhealthy_grace: secs_from_env("UNHEALTHY_GRACE_SECS", defaults::UNHEALTHY_GRACE_SECS)?,
            fetch_timeout: secs_from_env("FETCH_TIMEOUT_SECS", defaults::FETCH_TIMEOUT_SECS)?,
            install_crds,
        })
    }
}

fn secs_from_env(key: &str, default: u64) -> Result<Duration> {
    match env::var(key) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", key, value))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.template_path, templates::DEFAULT_BASE);
        assert_eq!(config.reconcile_timeout, Duration::from_secs(60));
        assert_eq!(config.unhealthy_grace, Duration::from_secs(300));
        assert!(config.install_crds);
    }

    #[test]
    fn test_secs_from_env_falls_back_to_default() {
        let secs = secs_from_env("NESTPLANE_TEST_UNSET_SECS", 42).unwrap();
        assert_eq!(secs, Duration::from_secs(42));
    }

    #[test]
    fn test_secs_from_env_rejects_non_numbers() {
        env::set_var("NESTPLANE_TEST_BAD_SECS", "soon");
        let err = secs_from_env("NESTPLANE_TEST_BAD_SECS", 1).unwrap_err();
        assert!(err.to_string().contains("NESTPLANE_TEST_BAD_SECS"));
    }
}
