//! Common module
//!
//! This module contains shared types, errors, and utility functions used throughout the application.

pub mod error;
pub mod log;
pub mod net;

// Re-export commonly used types and functions
pub use error::{AppError, Result};
pub use self::log::{init_logger, set_log_level};
pub use net::{is_listen_address_free, listen_address, parse_socket_addr, resolve_socket_addrs};
