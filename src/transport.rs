//! Connection establishment for the stream writer.
//!
//! `Endpoint` describes where frames go; `connect_endpoint` turns it into an
//! [`ActiveConnection`], upgrading to TLS when the endpoint carries
//! [`TlsOptions`]. The [`Dial`] trait is the single seam through which the
//! writer obtains connections, so the plaintext and encrypted variants share
//! one retry implementation and tests can substitute scripted transports.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    sync::Arc,
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

/// Remote collector address plus optional transport security.
///
/// Immutable for the lifetime of a writer.
#[derive(Clone, Debug)]
pub struct Endpoint {
    /// Hostname or IP address of the collector.
    pub host: String,
    /// TCP port number.
    pub port: u16,
    /// TLS configuration; `None` sends plaintext.
    pub tls: Option<TlsOptions>,
}

impl Endpoint {
    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }
}

/// TLS handshake options.
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// A raw stream connection owned by the writer.
///
/// `send` is a single raw write and may be short; the writer layers retry and
/// short-write detection on top. `shutdown_handle` hands out a cheap handle
/// that can tear the connection down from another thread, which is how a
/// best-effort close interrupts a send blocked inside the retry loop.
pub trait Connection: Send + 'static {
    /// Perform one raw write, returning the number of bytes accepted.
    fn send(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Handle for tearing the connection down out-of-band.
    fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::noop()
    }
}

/// Capability to obtain a fresh connection to a fixed destination.
///
/// One socket (and, for TLS, one handshake) per call; no pooling and no
/// internal retry. Retry belongs entirely to the writer.
pub trait Dial: Send + Sync {
    /// Connection type produced by this dialer.
    type Conn: Connection;

    /// Open a new connection to the configured destination.
    fn dial(&self) -> io::Result<Self::Conn>;
}

/// Out-of-band teardown handle for an open connection.
pub struct ShutdownHandle(HandleKind);

enum HandleKind {
    Socket(TcpStream),
    Hook(Arc<dyn Fn() + Send + Sync>),
    Noop,
}

impl ShutdownHandle {
    /// Handle backed by a duplicated socket descriptor.
    pub fn socket(stream: TcpStream) -> Self {
        Self(HandleKind::Socket(stream))
    }

    /// Handle invoking an arbitrary teardown hook (used by test transports).
    pub fn from_fn(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self(HandleKind::Hook(Arc::new(hook)))
    }

    /// Handle that does nothing.
    pub fn noop() -> Self {
        Self(HandleKind::Noop)
    }

    /// Tear the connection down; blocked reads and writes fail immediately.
    pub fn shutdown(&self) {
        match &self.0 {
            HandleKind::Socket(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
            }
            HandleKind::Hook(hook) => hook(),
            HandleKind::Noop => {}
        }
    }
}

impl std::fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.0 {
            HandleKind::Socket(_) => "Socket",
            HandleKind::Hook(_) => "Hook",
            HandleKind::Noop => "Noop",
        };
        f.debug_tuple("ShutdownHandle").field(&kind).finish()
    }
}

/// Live connection to a collector, plaintext or encrypted.
pub enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ActiveConnection {
    fn tcp_ref(&self) -> &TcpStream {
        match self {
            ActiveConnection::PlainTcp(stream) => stream,
            ActiveConnection::Tls(stream) => stream.get_ref(),
        }
    }
}

impl Connection for ActiveConnection {
    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        let n = match self {
            ActiveConnection::PlainTcp(stream) => stream.write(frame)?,
            ActiveConnection::Tls(stream) => stream.write(frame)?,
        };
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush()?,
            ActiveConnection::Tls(stream) => stream.flush()?,
        }
        Ok(n)
    }

    fn shutdown_handle(&self) -> ShutdownHandle {
        match self.tcp_ref().try_clone() {
            Ok(stream) => ShutdownHandle::socket(stream),
            Err(_) => ShutdownHandle::noop(),
        }
    }
}

fn connect_tcp(endpoint: &Endpoint, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in endpoint.socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!(
                "no addresses resolved for {}:{}",
                endpoint.host, endpoint.port
            ),
        )
    }))
}

/// Open a connection to `endpoint`, performing the TLS upgrade when
/// configured.
///
/// Handshake failures surface as plain [`io::Error`] values, indistinguishable
/// from a refused TCP connection; callers must not branch on the difference.
/// The handshake itself is bounded by `connect_timeout` through temporary
/// socket read/write timeouts, lifted again once the session is established.
pub fn connect_endpoint(
    endpoint: &Endpoint,
    connect_timeout: Duration,
) -> io::Result<ActiveConnection> {
    let stream = connect_tcp(endpoint, connect_timeout)?;
    match &endpoint.tls {
        Some(tls) => {
            let connector = tls.connector()?;
            stream.set_read_timeout(Some(connect_timeout))?;
            stream.set_write_timeout(Some(connect_timeout))?;
            let stream = connector
                .connect(&tls.domain, stream)
                .map_err(io::Error::other)?;
            let tcp_ref = stream.get_ref();
            tcp_ref.set_read_timeout(None)?;
            tcp_ref.set_write_timeout(None)?;
            Ok(ActiveConnection::Tls(Box::new(stream)))
        }
        None => Ok(ActiveConnection::PlainTcp(stream)),
    }
}

/// Production dialer connecting to a fixed [`Endpoint`].
#[derive(Clone, Debug)]
pub struct EndpointDialer {
    endpoint: Endpoint,
    connect_timeout: Duration,
}

impl EndpointDialer {
    /// Create a dialer for `endpoint` with the given connect timeout.
    pub fn new(endpoint: Endpoint, connect_timeout: Duration) -> Self {
        Self {
            endpoint,
            connect_timeout,
        }
    }

    /// The endpoint this dialer connects to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Dial for EndpointDialer {
    type Conn = ActiveConnection;

    fn dial(&self) -> io::Result<ActiveConnection> {
        connect_endpoint(&self.endpoint, self.connect_timeout)
    }
}
