//! Smoke test configuration

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names
pub const WAZUH_URL: &str = "WAZUH_URL";
pub const WAZUH_USER: &str = "WAZUH_USER";
pub const WAZUH_PASS: &str = "WAZUH_PASS";
pub const API_TOKEN: &str = "API_TOKEN";
pub const API_URL: &str = "API_URL";
pub const API_USER: &str = "API_USER";
pub const API_PASS: &str = "API_PASS";
pub const DEBUG: &str = "DEBUG";
pub const SMOKE_LOG_FILE: &str = "SMOKE_LOG_FILE";
pub const CHROME_PATH: &str = "CHROME_PATH";

const DEFAULT_LOG_FILE: &str = "health_check.log";

/// Configuration read once from the environment at startup.
///
/// Every field is optional at load time; each check verifies the fields it
/// needs before doing any work.
#[derive(Debug, Clone, Default)]
pub struct SmokeConfig {
    /// Dashboard URL
    pub wazuh_url: Option<String>,

    /// Dashboard user
    pub wazuh_user: Option<String>,

    /// Dashboard password
    pub wazuh_pass: Option<String>,

    /// Pre-supplied API token, if one was already generated
    pub api_token: Option<String>,

    /// API base URL
    pub api_url: Option<String>,

    /// API user
    pub api_user: Option<String>,

    /// API password
    pub api_pass: Option<String>,

    /// Verbose debug printing and logging
    pub debug: bool,

    /// Log file the audit sink appends to
    pub log_file: PathBuf,

    /// Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<PathBuf>,

    /// Per-call bounds
    pub timeouts: Timeouts,
}

/// Per-call timeouts. There is no global deadline.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Wait for the dashboard login form
    pub dashboard_form: Duration,

    /// HTTP probe of a dashboard that reports it is not ready
    pub not_ready_probe: Duration,

    /// Wait for each login form element and the post-login menu
    pub login_element: Duration,

    /// Each REST API call
    pub api_request: Duration,

    /// Poll interval for browser waits
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dashboard_form: Duration::from_secs(100),
            not_ready_probe: Duration::from_secs(100),
            login_element: Duration::from_secs(10),
            api_request: Duration::from_secs(50),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl SmokeConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            wazuh_url: get(WAZUH_URL),
            wazuh_user: get(WAZUH_USER),
            wazuh_pass: get(WAZUH_PASS),
            api_token: get(API_TOKEN),
            api_url: get(API_URL),
            api_user: get(API_USER),
            api_pass: get(API_PASS),
            debug: get(DEBUG).is_some(),
            log_file: get(SMOKE_LOG_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            chrome_path: get(CHROME_PATH).map(PathBuf::from),
            timeouts: Timeouts::default(),
        }
    }

    /// Dashboard URL, user and password, if all three are set
    pub fn dashboard_credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.wazuh_url.as_deref()?,
            self.wazuh_user.as_deref()?,
            self.wazuh_pass.as_deref()?,
        ))
    }

    /// API URL, user and password, if all three are set
    pub fn api_credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.api_url.as_deref()?,
            self.api_user.as_deref()?,
            self.api_pass.as_deref()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let config = SmokeConfig::from_lookup(lookup(&[]));
        assert!(config.wazuh_url.is_none());
        assert!(config.api_token.is_none());
        assert!(!config.debug);
        assert_eq!(config.log_file, PathBuf::from("health_check.log"));
        assert!(config.dashboard_credentials().is_none());
        assert!(config.api_credentials().is_none());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = SmokeConfig::from_lookup(lookup(&[(WAZUH_URL, ""), (DEBUG, "")]));
        assert!(config.wazuh_url.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn test_credentials_require_all_three() {
        let config = SmokeConfig::from_lookup(lookup(&[
            (API_URL, "https://wazuh:55000"),
            (API_USER, "wazuh-wui"),
        ]));
        assert!(config.api_credentials().is_none());

        let config = SmokeConfig::from_lookup(lookup(&[
            (API_URL, "https://wazuh:55000"),
            (API_USER, "wazuh-wui"),
            (API_PASS, "secret"),
            (DEBUG, "1"),
        ]));
        assert_eq!(
            config.api_credentials(),
            Some(("https://wazuh:55000", "wazuh-wui", "secret"))
        );
        assert!(config.debug);
    }

    #[test]
    fn test_default_timeouts() {
        let t = Timeouts::default();
        assert_eq!(t.dashboard_form, Duration::from_secs(100));
        assert_eq!(t.login_element, Duration::from_secs(10));
        assert_eq!(t.api_request, Duration::from_secs(50));
    }
}
