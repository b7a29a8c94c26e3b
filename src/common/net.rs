//! Network utility functions
//!
//! This module provides utility functions for network operations.

use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use log::{debug, error};
use socket2::{Domain, Protocol, Socket, Type};

use super::error::{AppError, Result};

/// Parse a socket address
///
/// # Arguments
///
/// * `addr` - The address string to parse
///
/// # Returns
///
/// The parsed `SocketAddr`, or the first address a host name resolves to
pub fn parse_socket_addr(addr: &str) -> Result<SocketAddr> {
    resolve_socket_addrs(addr)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Other(format!("Failed to parse address: {}", addr)))
}

/// Every socket address `addr` stands for
///
/// A literal address yields itself; a host name yields each resolved address,
/// so `localhost` may give both `127.0.0.1` and `::1`.
pub fn resolve_socket_addrs(addr: &str) -> Result<Vec<SocketAddr>> {
    if let Ok(socket_addr) = SocketAddr::from_str(addr) {
        return Ok(vec![socket_addr]);
    }

    let addrs: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|e| AppError::Other(format!("Failed to parse address {}: {}", addr, e)))?
        .collect();
    if addrs.is_empty() {
        return Err(AppError::Other(format!("Failed to parse address: {}", addr)));
    }
    Ok(addrs)
}

/// Join a listen host and port into `host:port`, bracketing bare IPv6 hosts
///
/// An empty host means every IPv4 interface.
pub fn listen_address(host: &str, port: u16) -> String {
    if host.is_empty() {
        format!("0.0.0.0:{}", port)
    } else if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Check whether a TCP listen address can be bound
///
/// Binds a listening socket on every address `addr` resolves to and releases
/// them immediately. Returns `false` if the address cannot be resolved or any
/// resolved address is already in use.
pub fn is_listen_address_free(addr: &str) -> bool {
    debug!("checking availability of tcp address: {}", addr);

    let socket_addrs = match resolve_socket_addrs(addr) {
        Ok(socket_addrs) => socket_addrs,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    socket_addrs.into_iter().all(|socket_addr| match bind_listener(socket_addr) {
        // Dropping the socket closes it
        Ok(_socket) => true,
        Err(e) => {
            error!("cannot listen on {} ({}): {}", addr, socket_addr, e);
            false
        }
    })
}

fn bind_listener(addr: SocketAddr) -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    // Same semantics as a regular server listener: a port lingering in
    // TIME_WAIT is still considered free
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;
    Ok(socket)
}
