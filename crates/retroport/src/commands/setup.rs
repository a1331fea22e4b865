//! `retroport setup`: one complete port-forward run.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use retroport_core::{
    CancellationToken, DemoService, PortForwardService, PortForwarder, SetupResponse,
};

use crate::cli::{GlobalOpts, OutputFormat, SetupArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &SetupArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let profile = config::active_profile(global, cfg)?;
    let request = config::setup_request(args, profile)?;
    let format = global.output();

    let spinner = spinner(&format, global.quiet, &request.router_type);

    let response = if args.demo {
        DemoService.start_port_forward(request).await
    } else {
        let engine_config = config::engine_config(cfg, profile.map(|(_, p)| p), global, args)?;
        let engine = PortForwarder::new(engine_config);
        let cancel = cancel_token(args.cancel_after);
        engine.start_port_forward_with_cancel(request, cancel).await
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let out = output::render_single(&format, &response, detail, |r| r.ports.join("\n"));
    output::print_output(&out, global.quiet);

    if response.success {
        Ok(())
    } else {
        Err(CliError::SetupFailed {
            message: response.error.unwrap_or_else(|| "unknown error".into()),
        })
    }
}

/// Cancelled by Ctrl-C or, when given, after `after_secs`.
fn cancel_token(after_secs: Option<u64>) -> CancellationToken {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling setup");
            on_signal.cancel();
        }
    });

    if let Some(secs) = after_secs {
        let on_timer = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            debug!(secs, "cancel-after elapsed");
            on_timer.cancel();
        });
    }

    cancel
}

fn spinner(format: &OutputFormat, quiet: bool, router: &str) -> Option<ProgressBar> {
    if quiet || !matches!(format, OutputFormat::Table) || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Configuring {router} router..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn detail(r: &SetupResponse) -> String {
    let mut out = format!("Status:  {}", output::status_mark(r.success));
    if let Some(ip) = r.ip {
        let _ = write!(out, "\nTarget:  {ip}");
    }
    if !r.ports.is_empty() {
        let _ = write!(out, "\nOpened:  {}", r.ports.join(", "));
    }
    if let Some(ref error) = r.error {
        let _ = write!(out, "\nError:   {error}");
    }
    out
}
