//! Local port availability checks.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TorError};

/// Default connect timeout for [`is_port_free`].
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Check whether nothing is listening on `127.0.0.1:<port>`.
///
/// Fails closed: input that is not a valid port number reports "not free".
/// A successful connect means the port is taken; refusal or timeout means free.
pub fn is_port_free(port: &str, timeout: Duration) -> bool {
    let port = match validate_port(port) {
        Ok(port) => port,
        Err(_) => return false,
    };

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_) => {
            debug!("Port {} is in use", port);
            false
        }
        Err(e) => {
            debug!("Port {} looks free ({})", port, e);
            true
        }
    }
}

/// Parse a user-entered port: ASCII digits only, 1-65535.
pub fn validate_port(input: &str) -> Result<u16> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TorError::InvalidInput(format!("not a port number: {:?}", input)));
    }
    match input.parse::<u16>() {
        Ok(0) | Err(_) => Err(TorError::InvalidInput(format!(
            "port out of range: {}",
            input
        ))),
        Ok(port) => Ok(port),
    }
}
