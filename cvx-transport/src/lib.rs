//! Transport layer for CV-series vision controllers
//!
//! The controller speaks its command protocol over a single TCP
//! connection; this crate provides the connect-with-timeout settings and
//! the stream handle the client crate builds on.

pub mod tcp;

pub use tcp::{TcpSettings, TcpTransport};
