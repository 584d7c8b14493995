//! Client implementation for CV-series vision controllers
//!
//! The controller speaks a line-oriented ASCII command/response protocol
//! over one TCP connection and accepts exactly one command at a time.
//! This crate owns that connection: it frames incoming bytes into reply
//! lines, serializes concurrent command submissions into a single
//! in-flight request, correlates each reply line with the command that
//! produced it, and resolves every call with a typed [`Response`] within
//! the configured time budget.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cvx_client::{ClientOptions, CvxClient};
//!
//! # async fn run() {
//! let client = CvxClient::with_target("192.168.0.10".parse().unwrap(), 8500);
//! let response = client.execute("RM", None).await;
//! if response.is_success() {
//!     println!("mode field: {:?}", response.field(1));
//! }
//! # }
//! ```
//!
//! Connection loss, busy admission, and timeouts are ordinary outcomes
//! reported through [`cvx_core::ErrorCode`]; no call returns an `Err`.

pub mod client;
pub mod commands;
pub mod events;
pub mod options;

mod reader;
mod router;

pub use client::CvxClient;
pub use commands::{DeviceTime, RunMode};
pub use events::ClientEvent;
pub use options::{AdmissionPolicy, ClientOptions};

pub use cvx_core::{ErrorCode, Response};
