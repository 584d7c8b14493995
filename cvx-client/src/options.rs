//! Client configuration

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Policy for acquiring the single in-flight command slot.
///
/// A caller that finds another command in flight retries the claim up to
/// `max_attempts` times, sleeping `retry_interval` between attempts,
/// before giving up with `CommandBusy`. The defaults bound the total wait
/// to roughly 100 ms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            retry_interval: Duration::from_millis(1),
        }
    }
}

impl AdmissionPolicy {
    /// Fail immediately when another command is in flight
    pub fn no_wait() -> Self {
        Self {
            max_attempts: 1,
            retry_interval: Duration::ZERO,
        }
    }
}

/// Configuration for a [`CvxClient`](crate::CvxClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Controller address. Commands fail with `NoConnection` until set.
    pub address: Option<IpAddr>,
    /// Controller command port (factory default 8500).
    pub port: u16,
    /// Budget for one command from send to correlated reply.
    pub command_timeout: Duration,
    /// Budget for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Admission retry policy.
    pub admission: AdmissionPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            address: None,
            port: 8500,
            command_timeout: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(5),
            admission: AdmissionPolicy::default(),
        }
    }
}

impl ClientOptions {
    /// Options targeting `address:port` with defaults for everything else
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self {
            address: Some(address),
            port,
            ..Self::default()
        }
    }

    /// Set the command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the admission policy
    pub fn admission(mut self, policy: AdmissionPolicy) -> Self {
        self.admission = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_admission_bounds_total_wait() {
        let policy = AdmissionPolicy::default();
        let total = policy.retry_interval * policy.max_attempts;
        assert_eq!(total, Duration::from_millis(100));
    }

    #[test]
    fn test_builder_style_options() {
        let options = ClientOptions::new("127.0.0.1".parse().unwrap(), 8500)
            .command_timeout(Duration::from_millis(250))
            .admission(AdmissionPolicy::no_wait());
        assert_eq!(options.command_timeout, Duration::from_millis(250));
        assert_eq!(options.admission.max_attempts, 1);
    }
}
