use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use quotalink::cli::{Cli, Commands};
use quotalink::config::AppConfig;
use quotalink::interfaces::cli::ConsoleNotifier;
use quotalink::runtime::lifetime::prepare_startup;
use quotalink::runtime::modes::{CliExit, run_cli};
use quotalink::services::LinkNotifier;
use quotalink::system::{init_logging, install_panic_hook};

fn generate_config(output: &str, force: bool) -> anyhow::Result<()> {
    if Path::new(output).exists() && !force {
        anyhow::bail!("'{}' already exists, use --force to overwrite", output);
    }
    AppConfig::default().save_to_file(output)?;
    println!("{} Sample config written to {}", "✓".bold().green(), output);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // .env 中的 QL__* 变量参与配置覆盖
    dotenvy::dotenv().ok();

    if let Some(Commands::GenerateConfig { output, force }) = &cli.command {
        return generate_config(output, *force);
    }

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    let guard = init_logging(&config.logging, cli.log_level.as_deref())?;
    install_panic_hook();

    let notification = config.notification.clone();
    let ctx = prepare_startup(config, |users| -> Arc<dyn LinkNotifier> {
        Arc::new(ConsoleNotifier::new(notification, users.clone()))
    })?;

    match run_cli(ctx).await {
        Ok(CliExit::Finished) => Ok(()),
        Ok(CliExit::Interrupted) => {
            // REPL 线程仍阻塞在 stdin 上，先刷日志再直接退出
            drop(guard);
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("{}", e.format_colored());
            drop(guard);
            std::process::exit(1);
        }
    }
}
