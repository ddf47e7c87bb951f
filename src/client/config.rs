// Session configuration: SMSC endpoint, bind credentials, and the timing
// knobs for keepalive, response correlation, and long-message reassembly.

use crate::client::types::RateLimit;
use crate::transport::{Dial, TcpDialer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Authentication material for the bind handshake.
#[derive(Debug, Clone, Default)]
pub struct BindCredentials {
    /// ESME identity, at most 15 characters.
    pub system_id: String,
    /// At most 8 characters.
    pub password: String,
    /// ESME category, at most 12 characters; many SMSCs ignore it.
    pub system_type: String,
    /// Address range this receiver serves; usually empty.
    pub address_range: String,
    pub addr_ton: crate::datatypes::TypeOfNumber,
    pub addr_npi: crate::datatypes::NumericPlanIndicator,
}

impl BindCredentials {
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn with_address_range(mut self, address_range: impl Into<String>) -> Self {
        self.address_range = address_range.into();
        self
    }
}

/// Everything a session needs to run. Construct with [`SessionConfig::new`]
/// and adjust with the `with_*` methods; the defaults suit most SMSCs.
#[derive(Clone)]
pub struct SessionConfig {
    /// SMSC endpoint, `host:port`.
    pub addr: String,
    pub credentials: BindCredentials,

    /// How often an enquire_link probe is sent while bound.
    pub enquire_link_period: Duration,
    /// Silence threshold: no inbound traffic for this long means the
    /// connection is dead.
    pub enquire_link_timeout: Duration,
    /// Deadline for each submit/query response.
    pub response_timeout: Duration,
    /// Grace period for the unbind_resp during close().
    pub unbind_timeout: Duration,

    /// Maximum simultaneously outstanding requests; 0 means unbounded.
    pub window_size: usize,
    /// Optional submission throttle, consulted before each request.
    pub rate_limit: Option<Arc<dyn RateLimit>>,

    /// Reassemble inbound UDH-concatenated messages before delivery.
    pub merge_long_messages: bool,
    /// How often stale partial messages are swept.
    pub merge_check_interval: Duration,
    /// Partial messages older than this are discarded.
    pub merge_stale_after: Duration,

    /// Capacity of the status stream; oldest events drop when full.
    pub status_buffer: usize,

    /// Connection factory; replace to add TLS or custom socket setup.
    pub dialer: Arc<dyn Dial>,
}

impl SessionConfig {
    pub fn new(addr: impl Into<String>, credentials: BindCredentials) -> Self {
        let enquire_link_period = Duration::from_secs(10);
        Self {
            addr: addr.into(),
            credentials,
            enquire_link_period,
            enquire_link_timeout: enquire_link_period * 3,
            response_timeout: Duration::from_secs(1),
            unbind_timeout: Duration::from_secs(1),
            window_size: 0,
            rate_limit: None,
            merge_long_messages: true,
            merge_check_interval: Duration::from_secs(1),
            merge_stale_after: Duration::from_secs(300),
            status_buffer: 32,
            dialer: Arc::new(TcpDialer),
        }
    }

    /// Set the keepalive period; the timeout follows at three periods
    /// unless overridden afterwards.
    pub fn with_enquire_link_period(mut self, period: Duration) -> Self {
        self.enquire_link_period = period;
        self.enquire_link_timeout = period * 3;
        self
    }

    pub fn with_enquire_link_timeout(mut self, timeout: Duration) -> Self {
        self.enquire_link_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Arc<dyn RateLimit>) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn without_long_message_merge(mut self) -> Self {
        self.merge_long_messages = false;
        self
    }

    pub fn with_merge_check_interval(mut self, interval: Duration) -> Self {
        self.merge_check_interval = interval;
        self
    }

    pub fn with_merge_stale_after(mut self, ttl: Duration) -> Self {
        self.merge_stale_after = ttl;
        self
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dial>) -> Self {
        self.dialer = dialer;
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("addr", &self.addr)
            .field("system_id", &self.credentials.system_id)
            .field("enquire_link_period", &self.enquire_link_period)
            .field("enquire_link_timeout", &self.enquire_link_timeout)
            .field("response_timeout", &self.response_timeout)
            .field("window_size", &self.window_size)
            .field("rate_limited", &self.rate_limit.is_some())
            .field("merge_long_messages", &self.merge_long_messages)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::new("localhost:2775", BindCredentials::new("id", "pw"));
        assert_eq!(config.enquire_link_period, Duration::from_secs(10));
        assert_eq!(config.enquire_link_timeout, Duration::from_secs(30));
        assert_eq!(config.response_timeout, Duration::from_secs(1));
        assert_eq!(config.window_size, 0);
        assert!(config.merge_long_messages);
        assert_eq!(config.merge_check_interval, Duration::from_secs(1));
        assert_eq!(config.merge_stale_after, Duration::from_secs(300));
    }

    #[test]
    fn period_override_scales_timeout() {
        let config = SessionConfig::new("smsc:2775", BindCredentials::new("id", "pw"))
            .with_enquire_link_period(Duration::from_secs(1));
        assert_eq!(config.enquire_link_timeout, Duration::from_secs(3));

        let config = config.with_enquire_link_timeout(Duration::from_secs(5));
        assert_eq!(config.enquire_link_timeout, Duration::from_secs(5));
        assert_eq!(config.enquire_link_period, Duration::from_secs(1));
    }
}
