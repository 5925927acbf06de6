//! Application configuration
//!
//! One YAML document with a section per concern. Every section has
//! defaults, so an empty or missing file is a valid configuration.

use action_primitives::ActionTimeouts;
use rosterbot_core_types::SiteLayout;
use rosterbot_scheduler::RunPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const ENV_WEBDRIVER_URL: &str = "ROSTERBOT_WEBDRIVER_URL";
pub const ENV_START_URL: &str = "ROSTERBOT_START_URL";
pub const ENV_USERNAME: &str = "ROSTERBOT_USERNAME";
pub const ENV_PASSWORD: &str = "ROSTERBOT_PASSWORD";
pub const ENV_SPECIAL_LIST: &str = "ROSTERBOT_SPECIAL_LIST";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub webdriver: WebDriverConfig,
    pub site: SiteConfig,
    pub login: LoginConfig,
    pub timeouts: ActionTimeouts,
    pub run: RunPolicy,
    /// Names that need an operator decision before enrollment.
    pub special_list: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebDriverConfig {
    pub url: String,
    pub browser_name: String,
    pub headless: bool,
    pub request_timeout_ms: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4444".to_string(),
            browser_name: "chrome".to_string(),
            headless: false,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Page that shows the login form, or the events tree when already
    /// authenticated.
    pub start_url: Option<String>,
    pub layout: SiteLayout,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoginConfig {
    pub username_field: String,
    pub password_field: String,
    pub login_button_id: String,
    /// Button pressed once after logging in to pick the workspace.
    pub continue_button_name: Option<String>,
    /// Environment variables holding the credentials.
    pub username_env: String,
    pub password_env: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username_field: "login".to_string(),
            password_field: "password".to_string(),
            login_button_id: "loginButton".to_string(),
            continue_button_name: Some("selectPosButton".to_string()),
            username_env: ENV_USERNAME.to_string(),
            password_env: ENV_PASSWORD.to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginConfig {
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials_with(|key| env::var(key).ok())
    }

    pub fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
        let username = lookup(&self.username_env).filter(|v| !v.is_empty())?;
        let password = lookup(&self.password_env).filter(|v| !v.is_empty())?;
        Some(Credentials { username, password })
    }
}

impl Config {
    /// Apply `ROSTERBOT_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| env::var(key).ok());
    }

    pub fn apply_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_WEBDRIVER_URL).filter(|v| !v.is_empty()) {
            self.webdriver.url = url;
        }
        if let Some(url) = lookup(ENV_START_URL).filter(|v| !v.is_empty()) {
            self.site.start_url = Some(url);
        }
        if let Some(path) = lookup(ENV_SPECIAL_LIST).filter(|v| !v.is_empty()) {
            self.special_list = Some(PathBuf::from(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterbot_scheduler::CarryOver;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let raw = "run:\n  carry_over: full-roster\n  low_attendance_threshold: 2\nsite:\n  layout:\n    waitlist_marker: Wait list\n";
        let config: Config = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.run.carry_over, CarryOver::FullRoster);
        assert_eq!(config.run.low_attendance_threshold, 2);
        assert_eq!(config.run.fallback_slots, 4);
        assert_eq!(config.site.layout.waitlist_marker, "Wait list");
        assert_eq!(config.site.layout.roster_body_id, "table-body");
        assert_eq!(config.webdriver, WebDriverConfig::default());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_WEBDRIVER_URL, "http://grid:4444"),
            (ENV_SPECIAL_LIST, "/tmp/special.txt"),
            (ENV_START_URL, ""),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides_with(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.webdriver.url, "http://grid:4444");
        assert_eq!(config.special_list, Some(PathBuf::from("/tmp/special.txt")));
        assert_eq!(config.site.start_url, None);
    }

    #[test]
    fn credentials_need_both_variables() {
        let login = LoginConfig::default();
        assert!(login
            .credentials_with(|key| (key == ENV_USERNAME).then(|| "coach".to_string()))
            .is_none());
        let creds = login
            .credentials_with(|key| {
                Some(if key == ENV_USERNAME { "coach" } else { "hunter2" }.to_string())
            })
            .unwrap();
        assert_eq!(creds.username, "coach");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
