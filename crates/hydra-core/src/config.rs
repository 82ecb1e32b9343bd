use std::time::Duration;

use crate::error::ConfigError;

/// Construction-time broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub address: String,
    pub port: u16,
    pub client_timeout: Duration,
    pub max_clients: usize,
    pub heartbeat_check_interval: Duration,
    pub max_message_bytes: usize,
}

impl BrokerConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        let client_timeout = Duration::from_secs_f64(30.0);
        Self {
            address: address.into(),
            port,
            client_timeout,
            max_clients: 100,
            heartbeat_check_interval: default_prune_interval(client_timeout),
            max_message_bytes: 65536,
        }
    }

    #[must_use]
    pub fn with_client_timeout(mut self, timeout: Duration) -> Self {
        self.client_timeout = timeout;
        self.heartbeat_check_interval = default_prune_interval(timeout);
        self
    }

    #[must_use]
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    #[must_use]
    pub fn with_heartbeat_check_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_check_interval = interval;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("tcp://{}:{}", self.address, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.max_message_bytes == 0 {
            return Err(ConfigError::ZeroMaxMessageBytes);
        }
        let timeout = self.client_timeout.as_secs_f64();
        let interval = self.heartbeat_check_interval.as_secs_f64();
        if timeout < 3.0 * interval {
            return Err(ConfigError::TimeoutTooShort { timeout, interval });
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 5556)
    }
}

/// `timeout / 3`, floored at one second.
fn default_prune_interval(timeout: Duration) -> Duration {
    let third = timeout.as_secs_f64() / 3.0;
    Duration::from_secs_f64(third.max(1.0))
}
