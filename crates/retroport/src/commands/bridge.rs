//! `retroport bridge`: JSON-lines front-end protocol on stdin/stdout.
//!
//! Each input line is `{"id": .., "method": .., "params": ..}`; each
//! output line is `{"id": .., "result": ..}` or `{"id": .., "error": ..}`.
//! Requests are served one at a time, in order.

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use retroport_core::{DemoService, PortForwardService, PortForwarder, RouterConfig};

use crate::cli::{BridgeArgs, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct BridgeRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

pub async fn handle(args: &BridgeArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    if args.demo {
        info!("bridge serving demo backend");
        serve(&DemoService, stdin, stdout).await
    } else {
        // Requests name their own router, so no profile applies.
        let engine = PortForwarder::new(config::base_engine_config(cfg, None, global)?);
        info!("bridge serving router backend");
        serve(&engine, stdin, stdout).await
    }
}

/// Answer requests from `reader` until EOF.
pub async fn serve<S, R, W>(service: &S, reader: R, mut writer: W) -> Result<(), CliError>
where
    S: PortForwardService,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = dispatch(service, line).await;
        writer.write_all(reply.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    debug!("bridge input closed");
    Ok(())
}

async fn dispatch<S: PortForwardService>(service: &S, line: &str) -> Value {
    let req: BridgeRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => return json!({ "id": null, "error": format!("invalid request: {e}") }),
    };
    debug!(method = %req.method, "bridge request");

    match req.method.as_str() {
        "start_port_forward" | "startPortForward" => {
            match serde_json::from_value::<RouterConfig>(req.params) {
                Ok(config) => {
                    let response = service.start_port_forward(config).await;
                    json!({ "id": req.id, "result": response })
                }
                Err(e) => json!({ "id": req.id, "error": format!("invalid params: {e}") }),
            }
        }
        "echo" => {
            let message = match req.params {
                Value::String(s) => s,
                other => other
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            };
            json!({ "id": req.id, "result": service.echo(&message) })
        }
        other => json!({ "id": req.id, "error": format!("unknown method: {other}") }),
    }
}
