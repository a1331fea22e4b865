mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::ffi::OsStr;
use std::path::Path;

use clap::{Parser, ValueEnum};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let mut cli = Cli::parse();
    let cfg = config::load_config_or_default();

    // Config supplies the output format when -o is absent
    if cli.global.output.is_none() {
        cli.global.output = OutputFormat::from_str(&cfg.defaults.output, true).ok();
    }

    let log_file = cli.global.log_file.clone().or_else(|| cfg.defaults.log_file.clone());
    let _log_guard = init_tracing(&cli.global, log_file.as_deref());

    if let Err(err) = run(cli, &cfg).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(global: &GlobalOpts, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = if global.quiet {
        "error"
    } else {
        match global.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("retroport.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli, cfg: &config::Config) -> Result<(), CliError> {
    tracing::debug!(command = ?cli.command, "dispatching command");
    let global = &cli.global;

    match cli.command {
        Command::Setup(args) => commands::setup::handle(&args, cfg, global).await,
        Command::Echo { message } => {
            commands::echo::handle(&message, global);
            Ok(())
        }
        Command::Vendors => {
            commands::vendors::handle(global);
            Ok(())
        }
        Command::Ports(args) => commands::ports::handle(&args, cfg, global),
        Command::Bridge(args) => commands::bridge::handle(&args, cfg, global).await,
        Command::Config(args) => commands::config_cmd::handle(args, cfg, global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "retroport", &mut std::io::stdout());
            Ok(())
        }
    }
}
