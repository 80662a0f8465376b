//! CLI mode
//!
//! Starts the expiry sweeper, runs the REPL on a blocking thread and stops
//! the sweeper again when the REPL ends or Ctrl+C arrives.

use std::time::Duration;

use tracing::info;

use crate::interfaces::cli::{CliError, Session, run_repl};
use crate::runtime::lifetime::StartupContext;
use crate::runtime::lifetime::shutdown::{perform_shutdown_tasks, wait_for_ctrl_c};

/// How the CLI session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliExit {
    /// `exit` or end of input
    Finished,
    /// Ctrl+C; the REPL thread may still be blocked on stdin
    Interrupted,
}

/// Run CLI mode
pub async fn run_cli(ctx: StartupContext) -> Result<CliExit, CliError> {
    let grace = Duration::from_secs(ctx.config.cleanup.shutdown_grace_secs);
    let sweeper_handle = ctx.sweeper.clone().start();

    let registry = ctx.registry.clone();
    let sweeper = ctx.sweeper.clone();
    let repl = tokio::task::spawn_blocking(move || {
        let mut session = Session::new(registry, Some(sweeper));
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        run_repl(&mut session, stdin.lock(), &mut stdout)
    });

    let outcome = tokio::select! {
        joined = repl => joined
            .map_err(|e| CliError::CommandError(format!("REPL task failed: {}", e)))
            .and_then(|result| result)
            .map(|()| CliExit::Finished),
        _ = wait_for_ctrl_c() => Ok(CliExit::Interrupted),
    };

    info!("Stopping background tasks...");
    perform_shutdown_tasks(sweeper_handle, grace).await;
    outcome
}
