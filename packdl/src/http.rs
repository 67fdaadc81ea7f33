//! HTTP transport abstraction for testability.
//!
//! Every network request made by the catalog resolver, the update checker and
//! the download engine goes through [`HttpTransport`]. Production code uses
//! [`ReqwestTransport`]; tests substitute in-memory implementations.

use std::io::{self, ErrorKind, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_LENGTH, LINK, RANGE};
use thiserror::Error;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bytes forwarded per message from a range body reader thread.
const RANGE_READ_SIZE: usize = 16 * 1024;

/// Messages buffered between a range body reader thread and its consumer.
const RANGE_QUEUE_DEPTH: usize = 4;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("packdl/", env!("CARGO_PKG_VERSION"));

/// Result type for transport operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors that can occur while talking to a remote server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// A fully buffered response to a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
    /// Value of the `Link` header(s), joined with `, ` when repeated.
    pub link: Option<String>,
}

/// A streaming response to a byte-range GET request.
pub struct RangeResponse {
    /// HTTP status code (206 when the server honoured the range).
    pub status: u16,
    /// Response body, read incrementally by the chunk worker.
    pub body: Box<dyn Read + Send>,
}

impl RangeResponse {
    /// Whether the server answered with `206 Partial Content`.
    pub fn is_partial(&self) -> bool {
        self.status == 206
    }
}

impl std::fmt::Debug for RangeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// Implementations must report non-2xx responses as [`HttpError::Status`].
pub trait HttpTransport: Send + Sync {
    /// Performs a GET request and buffers the whole body.
    fn get(&self, url: &str) -> HttpResult<HttpResponse>;

    /// Performs a HEAD request and returns the reported `Content-Length`.
    ///
    /// Returns `Ok(None)` when the server does not report a length.
    fn content_length(&self, url: &str) -> HttpResult<Option<u64>>;

    /// Performs a GET request for the inclusive byte range `[start, end]`.
    fn get_range(&self, url: &str, start: u64, end: u64) -> HttpResult<RangeResponse>;
}

/// Real HTTP transport implementation using reqwest.
///
/// Metadata requests (HEAD, catalog pages) are bounded by the full timeout.
/// Range requests use the same value as an idle timeout: the response headers
/// and every subsequent body read must arrive within it, while the chunk as a
/// whole may stream for as long as data keeps flowing.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> HttpResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> HttpResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn send(url: &str, request: RequestBuilder, timeout: Duration) -> HttpResult<Response> {
    let response = request.send().map_err(|e| request_error(url, &e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

fn request_error(url: &str, error: &reqwest::Error, timeout: Duration) -> HttpError {
    if error.is_timeout() {
        timeout_error(url, timeout)
    } else {
        HttpError::Request {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

fn timeout_error(url: &str, timeout: Duration) -> HttpError {
    HttpError::Timeout {
        url: url.to_string(),
        timeout_secs: timeout.as_secs(),
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        let response = send(url, self.client.get(url).timeout(self.timeout), self.timeout)?;

        let status = response.status().as_u16();
        let links: Vec<&str> = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let link = (!links.is_empty()).then(|| links.join(", "));

        let body = response
            .bytes()
            .map_err(|e| request_error(url, &e, self.timeout))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
            link,
        })
    }

    fn content_length(&self, url: &str) -> HttpResult<Option<u64>> {
        let response = send(url, self.client.head(url).timeout(self.timeout), self.timeout)?;

        // Read the header directly: HEAD responses carry no body, so the
        // body size hint is not the resource length.
        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok()))
    }

    fn get_range(&self, url: &str, start: u64, end: u64) -> HttpResult<RangeResponse> {
        let request = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={}-{}", start, end));

        // The request runs on its own thread so a server that stalls before or
        // during the body cannot block the caller past the idle timeout.
        let (sender, receiver) = mpsc::sync_channel(RANGE_QUEUE_DEPTH);
        let owned_url = url.to_string();
        let timeout = self.timeout;
        thread::Builder::new()
            .name("range-reader".to_string())
            .spawn(move || read_range(&owned_url, request, timeout, sender))
            .map_err(|e| HttpError::Request {
                url: url.to_string(),
                reason: format!("failed to start range reader: {}", e),
            })?;

        let status = match receiver.recv_timeout(timeout) {
            Ok(RangeMessage::Started(result)) => result?,
            Ok(_) => {
                return Err(HttpError::Request {
                    url: url.to_string(),
                    reason: "range body arrived before the response status".to_string(),
                })
            }
            Err(RecvTimeoutError::Timeout) => return Err(timeout_error(url, timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(HttpError::Request {
                    url: url.to_string(),
                    reason: "range reader exited before responding".to_string(),
                })
            }
        };

        Ok(RangeResponse {
            status,
            body: Box::new(IdleTimeoutBody::new(url, receiver, timeout)),
        })
    }
}

/// What a range reader thread hands to its consumer.
enum RangeMessage {
    Started(HttpResult<u16>),
    Data(Vec<u8>),
    Failed(io::Error),
    Finished,
}

/// Send the range request and forward the body until it ends or the
/// consumer goes away.
fn read_range(
    url: &str,
    request: RequestBuilder,
    timeout: Duration,
    sender: SyncSender<RangeMessage>,
) {
    let mut response = match send(url, request, timeout) {
        Ok(response) => response,
        Err(e) => {
            let _ = sender.send(RangeMessage::Started(Err(e)));
            return;
        }
    };
    if sender
        .send(RangeMessage::Started(Ok(response.status().as_u16())))
        .is_err()
    {
        return;
    }

    let mut buffer = vec![0u8; RANGE_READ_SIZE];
    loop {
        let message = match response.read(&mut buffer) {
            Ok(0) => RangeMessage::Finished,
            Ok(n) => RangeMessage::Data(buffer[..n].to_vec()),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => RangeMessage::Failed(e),
        };
        let last = !matches!(message, RangeMessage::Data(_));
        if sender.send(message).is_err() || last {
            return;
        }
    }
}

/// Range body that fails with [`ErrorKind::TimedOut`] when no data arrives
/// within the idle timeout.
struct IdleTimeoutBody {
    url: String,
    receiver: Receiver<RangeMessage>,
    timeout: Duration,
    pending: Vec<u8>,
    offset: usize,
    finished: bool,
}

impl IdleTimeoutBody {
    fn new(url: &str, receiver: Receiver<RangeMessage>, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            receiver,
            timeout,
            pending: Vec::new(),
            offset: 0,
            finished: false,
        }
    }
}

impl Read for IdleTimeoutBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.offset >= self.pending.len() {
            if self.finished {
                return Ok(0);
            }
            match self.receiver.recv_timeout(self.timeout) {
                Ok(RangeMessage::Data(data)) => {
                    self.pending = data;
                    self.offset = 0;
                }
                Ok(RangeMessage::Finished) => self.finished = true,
                Ok(RangeMessage::Failed(e)) => return Err(e),
                Ok(RangeMessage::Started(_)) => {
                    return Err(io::Error::other("duplicate response status"))
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(
                        ErrorKind::TimedOut,
                        timeout_error(&self.url, self.timeout),
                    ))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "range reader stopped unexpectedly",
                    ))
                }
            }
        }

        let n = buf.len().min(self.pending.len() - self.offset);
        buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}
