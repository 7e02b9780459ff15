//! The four ordered health checks

use std::fmt;

use tracing::debug;

use crate::api::{ApiReply, WazuhApi};
use crate::browser::{BrowserDriver, ElementState};
use crate::config::{self, SmokeConfig};
use crate::error::{SmokeError, SmokeResult};
use crate::logger::{LogLevel, SimpleLogger};
use crate::report::Reporter;

/// Text served by the dashboard while it is still starting
pub const NOT_READY_MARKER: &str = "Wazuh dashboard server is not ready yet";

/// Substring the dashboard page title must contain
pub const TITLE_MARKER: &str = "Wazuh";

pub const LOGIN_FORM: &str = "[class='euiForm']";
pub const USERNAME_INPUT: &str = "[aria-label='username_input']";
pub const PASSWORD_INPUT: &str = "[aria-label='password_input']";
pub const LOGIN_BUTTON: &str = "[class='euiButton__text']";
/// Navigation toggle only rendered for an authenticated session
pub const MENU_TOGGLE: &str = "[data-test-subj='toggleNavButton']";

/// A check in the fixed run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    DashboardPresence,
    InteractiveLogin,
    ApiAuthentication,
    ApiVersion,
}

impl CheckKind {
    /// Run order
    pub const ALL: [CheckKind; 4] = [
        CheckKind::DashboardPresence,
        CheckKind::InteractiveLogin,
        CheckKind::ApiAuthentication,
        CheckKind::ApiVersion,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::DashboardPresence => "Dashboard test",
            CheckKind::InteractiveLogin => "Login test",
            CheckKind::ApiAuthentication => "API health test",
            CheckKind::ApiVersion => "API version test",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared context for one run: configuration, the auth token, the log sink,
/// console output, the browser and the API client.
pub struct HealthCheck<D: BrowserDriver> {
    config: SmokeConfig,
    auth_token: Option<String>,
    log: SimpleLogger,
    reporter: Reporter,
    driver: D,
    api: WazuhApi,
}

impl<D: BrowserDriver> HealthCheck<D> {
    pub fn new(config: SmokeConfig, log: SimpleLogger, reporter: Reporter, driver: D, api: WazuhApi) -> Self {
        let auth_token = config.api_token.clone();
        Self {
            config,
            auth_token,
            log,
            reporter,
            driver,
            api,
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn log(&self) -> &SimpleLogger {
        &self.log
    }

    pub fn reporter(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Release the browser. Safe to call more than once.
    pub async fn close(&mut self) -> SmokeResult<()> {
        self.driver.close().await
    }

    /// Run a single check
    pub async fn run(&mut self, check: CheckKind) -> SmokeResult<bool> {
        debug!("Running check: {}", check);
        match check {
            CheckKind::DashboardPresence => self.dashboard_present().await,
            CheckKind::InteractiveLogin => self.interactive_login().await,
            CheckKind::ApiAuthentication => self.api_authenticate().await,
            CheckKind::ApiVersion => self.api_version().await,
        }
    }

    /// The login page loads, carries the product title and shows its form.
    ///
    /// A missing URL fails the check without ending the run.
    pub async fn dashboard_present(&mut self) -> SmokeResult<bool> {
        let Some(url) = self.config.wazuh_url.clone() else {
            self.reporter.error("url invalid or not supplied");
            self.log.log(LogLevel::Critical, "Invalid url supplied");
            return Ok(false);
        };

        self.driver.goto(&url).await?;
        let title = self.driver.title().await?;

        if title.is_empty() && self.driver.page_source().await?.contains(NOT_READY_MARKER) {
            self.probe_not_ready(&url).await?;
        }

        if !title.contains(TITLE_MARKER) {
            self.log.log(LogLevel::Error, "Title not found");
            self.reporter.plain("Wazuh title not detected");
            return Ok(false);
        }

        let wait = self
            .driver
            .wait_for(LOGIN_FORM, ElementState::Clickable, self.config.timeouts.dashboard_form)
            .await;
        if let Err(e) = wait {
            if !e.is_timeout() {
                return Err(e);
            }
            if self.config.debug {
                self.reporter.debug(&e.to_string());
            }
            self.log.log(LogLevel::Error, "Login form not found");
            self.reporter.plain("could not find login");
            return Ok(false);
        }

        self.log.log(LogLevel::Info, "Dashboard, Title Found");
        self.reporter.success("Title, Dashboard found");
        Ok(true)
    }

    /// Re-fetch a dashboard that rendered its "not ready" page over plain
    /// HTTP. Only logs; the check's outcome is unchanged.
    async fn probe_not_ready(&mut self, url: &str) -> SmokeResult<()> {
        let body = self
            .api
            .fetch_page(url, self.config.timeouts.not_ready_probe)
            .await?;
        if body.contains(NOT_READY_MARKER) {
            self.log.log(
                LogLevel::Error,
                "Something went wrong in the Dashboard deployment process",
            );
        }
        Ok(())
    }

    /// Log in through the form and wait for the navigation menu.
    ///
    /// Missing dashboard credentials end the run.
    pub async fn interactive_login(&mut self) -> SmokeResult<bool> {
        let Some((_, user, pass)) = self.config.dashboard_credentials() else {
            self.reporter.error("Missing WAZUH env variables ..");
            self.log.log(LogLevel::Critical, "Missing Wazuh Env Variables");
            return Err(SmokeError::MissingConfig(format!(
                "{}, {}, {}",
                config::WAZUH_URL,
                config::WAZUH_USER,
                config::WAZUH_PASS
            )));
        };
        let (user, pass) = (user.to_string(), pass.to_string());

        match self.submit_login(&user, &pass).await {
            Ok(()) => {
                self.log.log(LogLevel::Info, "Dashboard Drop Down Menu Found");
                Ok(true)
            }
            Err(e) if e.is_timeout() => {
                if self.config.debug {
                    self.reporter.debug(&e.to_string());
                }
                self.log.log(LogLevel::Error, "Form Elements not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn submit_login(&mut self, user: &str, pass: &str) -> SmokeResult<()> {
        let wait = self.config.timeouts.login_element;

        self.driver.wait_for(USERNAME_INPUT, ElementState::Visible, wait).await?;
        self.driver.wait_for(PASSWORD_INPUT, ElementState::Visible, wait).await?;
        self.driver.wait_for(LOGIN_BUTTON, ElementState::Clickable, wait).await?;

        self.driver.type_text(USERNAME_INPUT, user).await?;
        self.driver.type_text(PASSWORD_INPUT, pass).await?;

        // The dashboard rejects programmatic form submission; click instead.
        self.driver.click(LOGIN_BUTTON).await?;

        self.driver.wait_for(MENU_TOGGLE, ElementState::Visible, wait).await?;
        self.log.log(LogLevel::Info, "Form Elements Found");
        Ok(())
    }

    /// Obtain an auth token with basic credentials.
    ///
    /// Missing API credentials end the run.
    pub async fn api_authenticate(&mut self) -> SmokeResult<bool> {
        let Some((url, user, pass)) = self.config.api_credentials() else {
            self.reporter.error("Missing WAZUH API env variables ..");
            self.log.log(LogLevel::Critical, "Missing Wazuh API Env Variables");
            return Err(SmokeError::MissingConfig(format!(
                "{}, {}, {}",
                config::API_URL,
                config::API_USER,
                config::API_PASS
            )));
        };

        let reply = self
            .api
            .authenticate(url, user, pass, self.config.timeouts.api_request)
            .await?;

        match reply {
            ApiReply::Ok(token) => {
                self.auth_token = Some(token);
                self.reporter.plain("\t[SUCCESS] Wazuh API auth token obtained");
                self.log.log(LogLevel::Info, "API TOKEN Found");
                Ok(true)
            }
            ApiReply::Rejected { status, error } => {
                debug!("Token request rejected with {}", status);
                if self.config.debug {
                    self.log.log(
                        LogLevel::Debug,
                        &format!("TOKEN REQUEST: title {}, reason: {}", error.title, error.detail),
                    );
                    self.reporter
                        .plain(&format!("\t[DEBUG] title {}, reason: {}", error.title, error.detail));
                }
                Ok(false)
            }
        }
    }

    /// Read the API version with the token from [`Self::api_authenticate`]
    /// or `API_TOKEN`. Without a token nothing is sent.
    pub async fn api_version(&mut self) -> SmokeResult<bool> {
        let Some(token) = self.auth_token.clone() else {
            self.log.log(LogLevel::Error, "Missing Wazuh TOKEN");
            self.reporter.error("Missing AUTH_TOKEN");
            return Ok(false);
        };

        let Some(url) = self.config.api_url.clone() else {
            self.reporter.error("Missing WAZUH API env variables ..");
            self.log.log(LogLevel::Critical, "Missing Wazuh API Env Variables");
            return Err(SmokeError::MissingConfig(config::API_URL.to_string()));
        };

        let reply = self
            .api
            .version(&url, &token, self.config.timeouts.api_request)
            .await?;

        match reply {
            ApiReply::Ok(data) => {
                self.reporter.plain(&format!(
                    "\t[INFO] title: {}, API version: {}, hostname: {}, license: {}",
                    data.title, data.api_version, data.hostname, data.license_url
                ));
                self.log.log(
                    LogLevel::Info,
                    &format!(
                        "api_version_request: version: {} hostname: {}",
                        data.api_version, data.hostname
                    ),
                );
                Ok(true)
            }
            ApiReply::Rejected { status, error } => {
                debug!("Version request rejected with {}", status);
                if self.config.debug {
                    self.reporter
                        .plain(&format!("\t[DEBUG] title {}, reason: {}", error.title, error.detail));
                    self.log.log(
                        LogLevel::Error,
                        &format!("API_VERSION_REQUEST: title {}, reason: {}", error.title, error.detail),
                    );
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_order_and_labels() {
        let labels: Vec<&str> = CheckKind::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec!["Dashboard test", "Login test", "API health test", "API version test"]
        );
    }
}
