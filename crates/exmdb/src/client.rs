//! [`ExmdbClient`]: the single-socket connection, framing, and
//! dispatch layer (spec.md §4.5/§5/§6).

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use exmdb_proto::io_buffer::IoBuffer;
use exmdb_proto::requests;
use exmdb_proto::response_code::ResponseCode;

use crate::error::{Error, Result};

/// When set, a `DISPATCH_ERROR` response triggers one silent
/// `reconnect()` before the error is re-raised to the caller.
pub const AUTO_RECONNECT: u32 = 1 << 0;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// What a `send` write closure is allowed to return: nothing, or a
/// fallible wire-serialization result. Lets [`ExmdbClient::send`] accept
/// both the infallible request writers (`Connect`, `Ping`, ...) and the
/// ones that serialize a restriction or propval list and can fail.
pub trait WriteOutcome {
    fn into_result(self) -> exmdb_proto::error::Result<()>;
}

impl WriteOutcome for () {
    fn into_result(self) -> exmdb_proto::error::Result<()> {
        Ok(())
    }
}

impl WriteOutcome for exmdb_proto::error::Result<()> {
    fn into_result(self) -> exmdb_proto::error::Result<()> {
        self
    }
}

/// `{host, port, prefix, is_private}`: everything needed to dial and
/// identify a store on the exmdb server (spec.md §3).
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub prefix: String,
    pub is_private: bool,
}

/// Builds an [`ExmdbClient`] without exposing any configuration
/// surface beyond what spec.md §3 already names.
pub struct ExmdbClientBuilder {
    params: ConnectionParams,
    flags: u32,
}

impl ExmdbClientBuilder {
    pub fn new(host: impl Into<String>, port: u16, prefix: impl Into<String>, is_private: bool) -> Self {
        ExmdbClientBuilder {
            params: ConnectionParams {
                host: host.into(),
                port,
                prefix: prefix.into(),
                is_private,
            },
            flags: 0,
        }
    }

    #[must_use]
    pub fn auto_reconnect(mut self) -> Self {
        self.flags |= AUTO_RECONNECT;
        self
    }

    pub fn connect(self) -> Result<ExmdbClient> {
        let mut client = ExmdbClient {
            stream: None,
            params: self.params,
            flags: self.flags,
        };
        client.connect()?;
        Ok(client)
    }
}

/// Owns exactly one socket. See spec.md §5: single-threaded, blocking,
/// strictly one outstanding request at a time.
pub struct ExmdbClient {
    stream: Option<TcpStream>,
    params: ConnectionParams,
    flags: u32,
}

impl ExmdbClient {
    pub fn builder(host: impl Into<String>, port: u16, prefix: impl Into<String>, is_private: bool) -> ExmdbClientBuilder {
        ExmdbClientBuilder::new(host, port, prefix, is_private)
    }

    /// Resolves `host:port` and tries each address in turn, the whole
    /// attempt bounded by one shared 3 s budget rather than 3 s per
    /// address: issues `Connect` on the first address that accepts
    /// within whatever's left of the budget.
    pub fn connect(&mut self) -> Result<()> {
        suppress_sigpipe();
        let stream = self.dial()?;
        self.stream = Some(stream);
        self.send_connect()?;
        Ok(())
    }

    fn dial(&self) -> Result<TcpStream> {
        let addrs: Vec<SocketAddr> = (self.params.host.as_str(), self.params.port)
            .to_socket_addrs()
            .map_err(|e| Error::Connection(format!("resolving {}: {e}", self.params.host)))?
            .collect();
        let deadline = Instant::now() + CONNECT_TIMEOUT;
        let mut last_err = None;
        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                last_err.get_or_insert_with(|| {
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "connect budget exhausted")
                });
                break;
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => {
                    log::debug!("exmdb: connected to {addr}");
                    return Ok(stream);
                }
                Err(e) => {
                    log::debug!("exmdb: connect to {addr} failed: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(Error::Connection(match last_err {
            Some(e) => format!("no reachable address for {}: {e}", self.params.host),
            None => format!("no addresses resolved for {}", self.params.host),
        }))
    }

    fn send_connect(&mut self) -> Result<()> {
        let prefix = self.params.prefix.clone();
        let is_private = self.params.is_private;
        self.send(|buf| requests::session::write(buf, &prefix, is_private))?;
        Ok(())
    }

    /// A cheap liveness probe (SPEC_FULL.md supplement, not in
    /// spec.md's catalog): confirms the connection still answers
    /// before an AUTO_RECONNECT-sensitive batch.
    pub fn ping(&mut self) -> Result<()> {
        self.send(requests::ping::write)?;
        Ok(())
    }

    /// Clears the scratch buffer, frames `write_body`'s output as a
    /// request, transmits it, and reads back a typed response body.
    ///
    /// `write_body` may be infallible (most calls) or return
    /// `exmdb_proto::Result<()>` (the calls that serialize a
    /// restriction or propval list, which can fail). [`WriteOutcome`]
    /// lets both shapes go through the same method.
    ///
    /// On `DISPATCH_ERROR` with [`AUTO_RECONNECT`] set, attempts one
    /// silent [`reconnect`](Self::reconnect) before re-raising the
    /// error to the caller — the failed call itself is never retried.
    pub fn send<F, O>(&mut self, write_body: F) -> Result<IoBuffer>
    where
        F: FnOnce(&mut IoBuffer) -> O,
        O: WriteOutcome,
    {
        let mut buf = IoBuffer::new();
        buf.start();
        write_body(&mut buf).into_result()?;
        buf.finalize();
        self.transact(&buf.into_vec())
    }

    fn transact(&mut self, frame: &[u8]) -> Result<IoBuffer> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        log::trace!("exmdb: sending {} bytes", frame.len());
        stream
            .write_all(frame)
            .map_err(|e| Error::Connection(format!("send: {e}")))?;

        let mut header = [0u8; 5];
        Self::read_exact(stream, &mut header)?;
        let status = header[0];
        let length = u32::from_le_bytes(header[1..5].try_into().unwrap()) as usize;

        let mut body = vec![0u8; length];
        Self::read_exact(stream, &mut body)?;

        let code = ResponseCode::try_from(status).map_err(Error::UnknownProtocol)?;
        log::trace!("exmdb: response status {code}, {length} body bytes");
        if !code.is_success() {
            if code == ResponseCode::DispatchError && self.flags & AUTO_RECONNECT != 0 {
                log::warn!("exmdb: dispatch error, attempting one silent reconnect");
                self.reconnect();
            }
            return Err(Error::Protocol(code));
        }
        Ok(IoBuffer::from_vec(body))
    }

    fn read_exact(stream: &mut TcpStream, buf: &mut [u8]) -> Result<()> {
        stream
            .read_exact(buf)
            .map_err(|e| Error::Connection(format!("recv: {e}")))
    }

    /// Attempts a fresh connection with the stored parameters and
    /// re-issues `Connect`. On any failure the existing connection is
    /// left intact and this returns `false`.
    pub fn reconnect(&mut self) -> bool {
        match self.dial() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.send_connect().is_ok()
            }
            Err(e) => {
                log::debug!("exmdb: reconnect failed: {e}");
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.stream = None;
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

#[cfg(unix)]
fn suppress_sigpipe() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    });
}

#[cfg(not(unix))]
fn suppress_sigpipe() {}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Accepts one connection, reads the `Connect` request, replies
    /// success-ack, then answers exactly one further request with
    /// `status`/`body`.
    fn spawn_single_reply_server(status: u8, body: Vec<u8>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            drain_one_request(&mut stream);
            stream.write_all(&[0, 0, 0, 0, 0]).unwrap(); // Connect ack

            drain_one_request(&mut stream);
            let mut header = vec![status];
            header.extend_from_slice(&(body.len() as u32).to_le_bytes());
            stream.write_all(&header).unwrap();
            stream.write_all(&body).unwrap();
        });
        port
    }

    fn drain_one_request(stream: &mut TcpStream) {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).unwrap();
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).unwrap();
    }

    #[test]
    fn connect_and_send_round_trips_a_success_response() {
        let port = spawn_single_reply_server(0, vec![0xde, 0xad]);
        let mut client = ExmdbClient::builder("127.0.0.1", port, "exmdb", true)
            .connect()
            .unwrap();

        let response = client.send(|buf| buf.push_u8(0x42)).unwrap();
        assert_eq!(response.as_slice(), &[0xde, 0xad]);
    }

    #[test]
    fn send_surfaces_protocol_error_on_non_zero_status() {
        let port = spawn_single_reply_server(1, Vec::new());
        let mut client = ExmdbClient::builder("127.0.0.1", port, "exmdb", true)
            .connect()
            .unwrap();

        let err = client.send(|buf| buf.push_u8(0x42)).unwrap_err();
        assert!(matches!(err, Error::Protocol(ResponseCode::AccessDeny)));
    }

    #[test]
    fn send_before_connect_reports_not_connected() {
        let mut client = ExmdbClient {
            stream: None,
            params: ConnectionParams {
                host: "127.0.0.1".into(),
                port: 0,
                prefix: "exmdb".into(),
                is_private: true,
            },
            flags: 0,
        };
        let err = client.send(|buf| buf.push_u8(0)).unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
