//! Runs the checks in order and stops at the first failure

use std::time::Instant;

use tracing::{error, info};

use crate::browser::BrowserDriver;
use crate::checks::{CheckKind, HealthCheck};
use crate::error::SmokeResult;
use crate::logger::LogLevel;

pub const PASSED_MESSAGE: &str = "Smoke test gracefully PASSED";
pub const SEPARATOR: &str = "-----------------------";

/// How a run ended when no check raised a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed { check: CheckKind },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Passed => 0,
            RunOutcome::Failed { .. } => 1,
        }
    }
}

/// Run every check in [`CheckKind::ALL`] order.
///
/// A check returning `false` prints a `[FAIL]` line and ends the run. A
/// fatal error is returned as-is without a `[FAIL]` line; the browser is
/// left open for the caller to release.
pub async fn run<D: BrowserDriver>(health: &mut HealthCheck<D>) -> SmokeResult<RunOutcome> {
    let start = Instant::now();

    for check in CheckKind::ALL {
        if health.run(check).await? {
            health.reporter().success(check.label());
        } else {
            health.reporter().fail(check.label());
            error!("Check failed: {}", check);
            return Ok(RunOutcome::Failed { check });
        }
    }

    health.log().log(LogLevel::Info, PASSED_MESSAGE);
    health.log().write_log("", SEPARATOR);
    health.reporter().info("all checks pass");

    info!("All checks passed ({} ms)", start.elapsed().as_millis());
    Ok(RunOutcome::Passed)
}

/// Run the checks, release the browser whatever happened, and turn the
/// result into a process exit code. Fatal errors are logged CRITICAL and
/// exit 1 like a failed check.
pub async fn execute<D: BrowserDriver>(health: &mut HealthCheck<D>) -> i32 {
    let outcome = run(health).await;

    if let Err(e) = health.close().await {
        error!("Failed to close browser: {}", e);
    }

    match outcome {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            health.log().log(LogLevel::Critical, &e.to_string());
            error!("Smoke test aborted: {}", e);
            1
        }
    }
}
