//! Fluent construction of a [`SocketWriter`] over a TCP or TLS endpoint.

use std::time::Duration;

use crate::{
    config::{DEFAULT_CONNECT_TIMEOUT, WriterOptions},
    error::{BuildError, WriterError},
    transport::{Endpoint, EndpointDialer, TlsOptions},
    writer::SocketWriter,
};

/// Writer connected to a fixed [`Endpoint`].
pub type EndpointWriter = SocketWriter<EndpointDialer>;

#[derive(Clone, Debug, Default)]
struct TlsConfig {
    domain: Option<String>,
    insecure: bool,
}

/// Builder validating configuration before dialing the collector.
///
/// `build` dials eagerly and fails when the collector is unreachable; use
/// [`SocketWriter::new`] directly for a writer that connects lazily.
#[derive(Clone, Debug, Default)]
pub struct WriterBuilder {
    host: Option<String>,
    port: u16,
    tls: Option<TlsConfig>,
    connect_timeout: Option<Duration>,
    options: WriterOptions,
}

impl WriterBuilder {
    /// Create a builder with default retry and retention settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Target collector address.
    pub fn with_addr(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    /// Enable TLS, optionally overriding the handshake domain (defaults to
    /// the host) and certificate validation (skipped when `insecure`).
    pub fn with_tls(mut self, domain: Option<String>, insecure: bool) -> Self {
        self.tls = Some(TlsConfig { domain, insecure });
        self
    }

    /// Override the maximum number of reconnection attempts.
    pub fn with_max_reconnect(mut self, max_reconnect: u32) -> Self {
        self.options.retry.max_reconnect = max_reconnect;
        self
    }

    /// Override the delay between reconnection attempts.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.options.retry.reconnect_delay = delay;
        self
    }

    /// Override the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Override the pending-frame capacity.
    pub fn with_pending_capacity(mut self, capacity: usize) -> Self {
        self.options.pending_capacity = capacity;
        self
    }

    /// Override the close grace period.
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.options.close_grace = grace;
        self
    }

    /// Override the close guard-acquisition timeout.
    pub fn with_close_lock_timeout(mut self, timeout: Duration) -> Self {
        self.options.close_lock_timeout = timeout;
        self
    }

    fn validated(self) -> Result<(EndpointDialer, WriterOptions), BuildError> {
        let Some(host) = self.host else {
            return Err(BuildError::InvalidConfig(
                "a collector address is required".into(),
            ));
        };
        if host.is_empty() {
            return Err(BuildError::InvalidConfig("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(BuildError::InvalidConfig(
                "port must be greater than zero".into(),
            ));
        }
        if self.options.pending_capacity == 0 {
            return Err(BuildError::InvalidConfig(
                "pending_capacity must be greater than zero".into(),
            ));
        }
        if self.options.retry.reconnect_delay.is_zero() {
            return Err(BuildError::InvalidConfig(
                "reconnect_delay must be greater than zero".into(),
            ));
        }
        let tls = self.tls.map(|tls| TlsOptions {
            domain: tls.domain.unwrap_or_else(|| host.clone()),
            insecure_skip_verify: tls.insecure,
        });
        let endpoint = Endpoint {
            host,
            port: self.port,
            tls,
        };
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        Ok((EndpointDialer::new(endpoint, connect_timeout), self.options))
    }

    /// Validate the configuration and dial the collector.
    pub fn build(self) -> Result<EndpointWriter, BuildError> {
        let (dialer, options) = self.validated()?;
        SocketWriter::connect(dialer, options).map_err(|err| match err {
            WriterError::Dial(io) => BuildError::Io(io),
            other => BuildError::InvalidConfig(other.to_string()),
        })
    }

    /// Validate the configuration without connecting.
    ///
    /// Useful when the collector may be down at startup; the writer dials on
    /// first use.
    pub fn build_lazy(self) -> Result<EndpointWriter, BuildError> {
        let (dialer, options) = self.validated()?;
        Ok(SocketWriter::new(dialer, options))
    }
}
