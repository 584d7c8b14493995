//! cvx - Async client for Keyence CV-X vision controllers
//!
//! The controller speaks a line-oriented ASCII protocol over TCP: one
//! command in flight at a time, replies echoed with the command token,
//! errors reported as `ER,<cmd>,<code>` lines.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `cvx-core`: Error taxonomy, line framing, reply representation
//! - `cvx-transport`: TCP transport with connect timeout
//! - `cvx-client`: Connection manager, command correlator, typed
//!   command wrappers
//!
//! # Usage
//!
//! ```no_run
//! use cvx::client::CvxClient;
//! use std::net::IpAddr;
//!
//! # async fn run() {
//! let client = CvxClient::with_target("192.168.0.10".parse::<IpAddr>().unwrap(), 8500);
//! let code = client.trigger1().await;
//! println!("T1: {code:?}");
//! # }
//! ```

// Re-export core types
pub use cvx_core::{CvxError, CvxResult, ErrorCode, Response};

// Re-export client API
pub mod client {
    pub use cvx_client::*;
}

// Re-export transport layer
pub mod transport {
    pub use cvx_transport::*;
}
