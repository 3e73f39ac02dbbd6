//! # Listener Configuration
//!
//! Bind address handling for the CLI.

use std::net::SocketAddr;

/// Parse a host and port into a socket address.
///
/// IPv6 hosts are bracketed before the port is appended.
pub fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, std::net::AddrParseError> {
    let addr_str = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    }
    else {
        format!("{}:{}", host, port)
    };
    addr_str.parse()
}
