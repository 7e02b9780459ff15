//! Wazuh smoke test entry point
//!
//! Reads everything from the environment (`WAZUH_URL`, `WAZUH_USER`,
//! `WAZUH_PASS`, `API_TOKEN`, `API_URL`, `API_USER`, `API_PASS`, `DEBUG`).
//! Exits 0 when every check passes and 1 otherwise.

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use wazuh_smoke::api::WazuhApi;
use wazuh_smoke::browser::{ChromeConfig, ChromeSession};
use wazuh_smoke::report::Reporter;
use wazuh_smoke::{runner, HealthCheck, LogLevel, SimpleLogger, SmokeConfig, SmokeResult};

const SINK_NAME: &str = "wazuh-smoke";

#[derive(Parser, Debug)]
#[command(name = "wazuh-smoke")]
#[command(version, about = "Smoke test for the Wazuh dashboard login flow and REST API")]
struct Args {}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _args = Args::parse();

    let config = SmokeConfig::from_env();

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let log = SimpleLogger::new(&config.log_file, SINK_NAME);
    // Errors here come from startup, before any check ran.
    let code = match run(config, log.clone()).await {
        Ok(code) => code,
        Err(e) => {
            log.log(LogLevel::Critical, &e.to_string());
            error!("Smoke test aborted: {}", e);
            1
        }
    };

    std::process::exit(code);
}

async fn run(config: SmokeConfig, log: SimpleLogger) -> SmokeResult<i32> {
    let api = WazuhApi::new()?;
    let session = ChromeSession::launch(ChromeConfig {
        executable: config.chrome_path.clone(),
        poll_interval: config.timeouts.poll_interval,
        ..Default::default()
    })
    .await?;

    let mut health = HealthCheck::new(config, log, Reporter::stdout(), session, api);
    Ok(runner::execute(&mut health).await)
}
