//! Healthcheck client
//!
//! Used by `--healthcheck` to ask a running instance whether it is healthy.
//! The instance answers `GET /healthcheck` with `{"ok": true}`.

use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::common::error::{AppError, Result};
use crate::common::net::listen_address;

const TIMEOUT: Duration = Duration::from_secs(5);

/// `http://<listen>:<port>/healthcheck`
pub fn healthcheck_url(listen: &str, port: u16) -> String {
    format!("http://{}/healthcheck", listen_address(listen, port))
}

/// Query the healthcheck endpoint of the instance listening on `listen:port`
///
/// Succeeds only if the response body is a JSON object with `"ok": true`.
pub async fn check(listen: &str, port: u16) -> Result<()> {
    let url = healthcheck_url(listen, port);
    debug!("healthcheck against {}", url);

    let failed = |reason: String| AppError::Healthcheck {
        url: url.clone(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(|e| failed(e.to_string()))?;
    let body: Value = client
        .get(&url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?
        .json()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if body.get("ok") == Some(&Value::Bool(true)) {
        Ok(())
    } else {
        Err(failed(format!("unexpected response {}", body)))
    }
}
