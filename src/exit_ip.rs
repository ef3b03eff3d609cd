//! Exit address lookup through the local Tor SOCKS port.

use std::time::Duration;

use reqwest::{Client, Proxy};
use tracing::debug;

use crate::error::{Result, TorError};

/// SOCKS URL for a local Tor port. `socks5h` resolves names through Tor too.
pub fn socks_url(port: u16) -> String {
    format!("socks5h://127.0.0.1:{}", port)
}

/// Fetch `check_url` through Tor and return the trimmed body.
pub async fn fetch_exit_ip(port: u16, check_url: &str, timeout: Duration) -> Result<String> {
    let client = Client::builder()
        .proxy(Proxy::all(socks_url(port))?)
        .timeout(timeout)
        .build()?;

    debug!("Fetching {} via {}", check_url, socks_url(port));
    let response = client.get(check_url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TorError::Network(format!("IP check returned {}", status)));
    }

    let body = response.text().await?;
    let ip = body.trim();
    if ip.is_empty() {
        return Err(TorError::Network(
            "IP check returned an empty body".to_string(),
        ));
    }
    Ok(ip.to_string())
}
