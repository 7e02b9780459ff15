//! Wazuh smoke tests
//!
//! This crate drives a headless Chrome session against the Wazuh dashboard
//! login flow and checks the Wazuh REST API authentication and version
//! endpoints. Checks run strictly in order and the run stops at the first
//! failure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      wazuh-smoke (bin)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  runner::run(&mut HealthCheck)                              │
//! │    ├── Dashboard test    -> form present, title contains    │
//! │    ├── Login test        -> credentials typed, menu visible │
//! │    ├── API health test   -> POST /security/user/authenticate│
//! │    └── API version test  -> GET <api_url> with bearer token │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HealthCheck<D: BrowserDriver>                              │
//! │    ├── SmokeConfig (environment, read once)                 │
//! │    ├── auth token (set by API health, read by API version)  │
//! │    ├── SimpleLogger (named append-only file sink)           │
//! │    ├── Reporter ([SUCCESS]/[FAIL]/[ERROR] console lines)    │
//! │    ├── D: ChromeSession (chromiumoxide) or a test double    │
//! │    └── WazuhApi (reqwest)                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod browser;
pub mod checks;
pub mod config;
pub mod error;
pub mod logger;
pub mod report;
pub mod runner;

pub use checks::{CheckKind, HealthCheck};
pub use config::{SmokeConfig, Timeouts};
pub use error::{SmokeError, SmokeResult};
pub use logger::{LogLevel, SimpleLogger};
pub use runner::RunOutcome;
