/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::control
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Serve the local control channel: line-delimited JSON
    requests over a Unix-domain socket, answered with the
    UpdateInfo record.

  Security / Safety Notes:
    The socket lives in the user's runtime directory with
    default permissions; no remote exposure.

  Dependencies:
    tokio for the listener, serde_json for framing.

  Operational Scope:
    Accepts `checkForUpdates` (runs a fresh check) and
    `getUpdateInfo` (serves the stored record). Client errors
    are answered in-band and never terminate the daemon.

  Revision History:
    2025-06-12 COD  Authored control channel.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit request vocabulary, unknown input rejected
    - Per-connection isolation via task spawning
    - In-band error reporting to clients
============================================================*/

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use crate::checker::UpdateChecker;
use crate::error::{Result, VigilError};
use crate::logger::Logger;

/// Requests accepted over the control socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
pub enum ControlRequest {
    #[serde(rename = "checkForUpdates")]
    CheckForUpdates,
    #[serde(rename = "getUpdateInfo")]
    GetUpdateInfo,
}

#[derive(Debug, Serialize)]
struct ControlError<'a> {
    error: &'a str,
}

/// Bind the control socket and serve requests until the process exits.
pub async fn serve(
    checker: Arc<UpdateChecker>,
    socket_path: &Path,
    logger: Arc<Logger>,
) -> Result<()> {
    if let Some(parent) = socket_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            VigilError::Filesystem(format!(
                "Failed to create socket directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    // A stale socket from a previous run blocks bind.
    match tokio::fs::remove_file(socket_path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(VigilError::Filesystem(format!(
                "Failed to remove stale socket {}: {err}",
                socket_path.display()
            )))
        }
    }

    let listener = UnixListener::bind(socket_path).map_err(|err| {
        VigilError::Runtime(format!(
            "Failed to bind control socket {}: {err}",
            socket_path.display()
        ))
    })?;
    logger.info(
        "CONTROL",
        format!("Control socket listening at {}", socket_path.display()),
    );

    loop {
        let (stream, _addr) = listener.accept().await.map_err(|err| {
            VigilError::Runtime(format!("Control socket accept failed: {err}"))
        })?;
        let checker = checker.clone();
        let logger = logger.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(checker, stream).await {
                logger.debug("CONTROL", format!("Client connection ended: {err}"));
            }
        });
    }
}

async fn handle_connection(
    checker: Arc<UpdateChecker>,
    stream: tokio::net::UnixStream,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|err| VigilError::Runtime(format!("Control read failed: {err}")))?
    {
        if line.trim().is_empty() {
            continue;
        }
        let mut reply = handle_request(&checker, &line).await;
        reply.push('\n');
        writer
            .write_all(reply.as_bytes())
            .await
            .map_err(|err| VigilError::Runtime(format!("Control write failed: {err}")))?;
    }
    Ok(())
}

/// Decode one request line and produce the JSON reply body.
pub async fn handle_request(checker: &UpdateChecker, line: &str) -> String {
    let info = match serde_json::from_str::<ControlRequest>(line) {
        Ok(ControlRequest::CheckForUpdates) => checker.check_for_updates().await,
        Ok(ControlRequest::GetUpdateInfo) => checker.stored_update_info().await,
        Err(err) => {
            let message = format!("Unrecognised control request: {err}");
            return serde_json::to_string(&ControlError { error: &message })
                .unwrap_or_else(|_| r#"{"error":"internal encoding failure"}"#.to_string());
        }
    };
    serde_json::to_string(&info)
        .unwrap_or_else(|_| r#"{"error":"internal encoding failure"}"#.to_string())
}
