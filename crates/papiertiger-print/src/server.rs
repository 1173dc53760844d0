// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP transport adapter — one HTTP POST per TCP connection.
//
// IPP is transported over HTTP POST (RFC 8010 §3), but a full HTTP server
// is unnecessary overhead for a single-endpoint printer: we parse the HTTP
// framing just enough to extract the IPP payload, then respond with a
// minimal HTTP/1.1 200 OK wrapping the IPP response body.
//
// # Body framing
//
// Three cases, in the order they are tried:
//
//   1. `Content-Length: N` — read exactly N body bytes.
//   2. `Transfer-Encoding: chunked` — see `unwrap_chunked_body`.  Some
//      mobile print clients declare chunked encoding but then write the
//      IPP message as one raw frame with no chunk-size lines, so the raw
//      frame sniff runs BEFORE standard chunk parsing.  This ordering is a
//      workaround for those clients, not general HTTP behaviour.
//   3. Neither header — read until the peer half-closes.
//
// A request with no HTTP envelope at all is treated as raw IPP over TCP
// (some clients and most test harnesses speak it).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use papiertiger_core::error::{PrinterError, Result};
use papiertiger_core::types::ServerStatus;

use crate::codec::{decode, STATUS_CLIENT_ERROR_BAD_REQUEST};
use crate::dispatch::{error_response, Dispatcher};

/// Maximum bytes to read from a connection before rejecting it.
/// Prevents unbounded memory consumption from misbehaving clients.
const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// Maximum bytes of HTTP headers before we give up looking for the
/// header/body separator.
const MAX_HEADER_BYTES: usize = 16 * 1024;

// ---------------------------------------------------------------------------
// Minimal HTTP envelope
// ---------------------------------------------------------------------------

/// Body framing declared by the HTTP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    /// `Content-Length` was present.
    Length(usize),
    /// `Transfer-Encoding: chunked` was present (and wins over a length).
    Chunked,
    /// Neither header — body runs to EOF.
    ReadToEof,
}

/// Result of parsing a minimal HTTP POST request for IPP.
struct HttpEnvelope {
    /// Offset where the HTTP body (IPP payload) begins.
    body_offset: usize,
    framing: BodyFraming,
}

/// Parse the bare minimum of an HTTP/1.1 request to find the body.
///
/// Returns `None` if the buffer contains no header terminator (in which
/// case the payload is treated as raw IPP).
fn parse_http_envelope(data: &[u8]) -> Option<HttpEnvelope> {
    let header_end = find_subsequence(data, b"\r\n\r\n")?;
    let body_offset = header_end + 4;

    let headers = String::from_utf8_lossy(&data[..header_end]);
    let mut content_length = None;
    let mut chunked = false;

    for line in headers.lines() {
        let lower = line.to_ascii_lowercase();
        if lower.starts_with("content-length:") {
            content_length = line.split(':').nth(1).and_then(|v| v.trim().parse().ok());
        } else if lower.starts_with("transfer-encoding:")
            && lower.contains("chunked")
        {
            chunked = true;
        }
    }

    let framing = if chunked {
        BodyFraming::Chunked
    } else if let Some(n) = content_length {
        BodyFraming::Length(n)
    } else {
        BodyFraming::ReadToEof
    };

    Some(HttpEnvelope {
        body_offset,
        framing,
    })
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Chunked transfer decoding
// ---------------------------------------------------------------------------

/// Unwrap a body declared as chunked.
///
/// Raw-frame sniff first: if the first byte is an IPP version-major (0x01
/// or 0x02), the client sent the message unframed despite the header and
/// the whole buffer is the body.  Only then is standard chunk framing
/// attempted.  Client-specific workaround — see the module docs.
fn unwrap_chunked_body(body: &[u8]) -> Result<Vec<u8>> {
    if matches!(body.first(), Some(0x01) | Some(0x02)) {
        debug!(bytes = body.len(), "chunked body carries a raw IPP frame");
        return Ok(body.to_vec());
    }
    decode_chunked(body)
}

/// Decode a standard chunked transfer body (RFC 9112 §7.1):
/// hex chunk-size line, CRLF-terminated chunk data, zero-size terminator,
/// optional trailer lines.
fn decode_chunked(body: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut pos = 0;

    loop {
        let line_end = find_subsequence(&body[pos..], b"\r\n")
            .ok_or_else(|| PrinterError::TransportFraming("missing chunk-size line".into()))?;
        let size_line = &body[pos..pos + line_end];

        // Chunk extensions after ';' are ignored.
        let size_str = std::str::from_utf8(size_line)
            .map_err(|_| PrinterError::TransportFraming("non-ASCII chunk-size line".into()))?;
        let size_str = size_str.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16).map_err(|_| {
            PrinterError::TransportFraming(format!("invalid chunk size {size_str:?}"))
        })?;

        pos += line_end + 2;

        if size == 0 {
            // Terminal chunk; trailer lines (if any) are ignored.
            return Ok(out);
        }

        if pos + size > body.len() {
            return Err(PrinterError::TransportFraming("truncated chunk data".into()));
        }
        out.extend_from_slice(&body[pos..pos + size]);
        pos += size;

        if body.get(pos..pos + 2) != Some(b"\r\n") {
            return Err(PrinterError::TransportFraming(
                "chunk data not CRLF-terminated".into(),
            ));
        }
        pos += 2;
    }
}

// ---------------------------------------------------------------------------
// IppServer
// ---------------------------------------------------------------------------

/// The embedded IPP print server.
///
/// Binds a TCP listener and serves one IPP request per connection, each in
/// its own task.  Created in `Stopped` state; [`IppServer::start`] begins
/// accepting.
pub struct IppServer {
    port: u16,
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
    /// Counter of currently active TCP connections.
    active_connections: Arc<AtomicU32>,
    /// Actual bound address, available once started (the configured port
    /// may be 0 for an ephemeral port in tests).
    local_addr: Option<SocketAddr>,
}

impl IppServer {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            active_connections: Arc::new(AtomicU32::new(0)),
            local_addr: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// The bound socket address, once the server has started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Number of currently active client connections.
    pub fn active_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Bind `0.0.0.0:{port}` and start accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is already in use or the listener
    /// cannot be created — fatal at startup, there is nothing to retry.
    pub async fn start(&mut self, dispatcher: Arc<Dispatcher>) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(port = self.port, "IPP server already running");
            return Ok(());
        }

        self.status = ServerStatus::Starting;

        let bind_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| PrinterError::Server(format!("bind {bind_addr}: {e}")))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| PrinterError::Server(format!("local_addr: {e}")))?;
        self.local_addr = Some(local_addr);

        info!(addr = %local_addr, "IPP print server listening");

        let shutdown = Arc::clone(&self.shutdown_signal);
        let connections = Arc::clone(&self.active_connections);

        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, connections, dispatcher).await;
        });

        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Gracefully stop the server.
    ///
    /// Signals the accept loop to exit and awaits its completion.
    /// Connections that are mid-transfer are allowed to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(port = self.port, "stopping IPP print server");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| PrinterError::Server(format!("task join: {e}")))?;
        }

        self.status = ServerStatus::Stopped;
        self.local_addr = None;
        info!(port = self.port, "IPP print server stopped");
        Ok(())
    }

    async fn accept_loop(
        listener: TcpListener,
        shutdown: Arc<Notify>,
        connections: Arc<AtomicU32>,
        dispatcher: Arc<Dispatcher>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming IPP connection");
                            let dispatcher = Arc::clone(&dispatcher);
                            let connections = Arc::clone(&connections);
                            tokio::spawn(async move {
                                connections.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) =
                                    handle_connection(stream, peer_addr, dispatcher).await
                                {
                                    warn!(
                                        peer = %peer_addr,
                                        error = %e,
                                        "connection handler error"
                                    );
                                }
                                connections.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection handling
// ---------------------------------------------------------------------------

/// Handle a single incoming TCP connection: read one request, strip the
/// HTTP framing, decode the IPP payload, dispatch, respond, done.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
) -> Result<()> {
    let body = match read_request_body(&mut stream, peer_addr).await {
        Ok(Some(body)) => body,
        Ok(None) => {
            debug!(peer = %peer_addr, "empty request — closing connection");
            return Ok(());
        }
        Err(PrinterError::TransportFraming(reason)) => {
            warn!(peer = %peer_addr, error = %reason, "bad chunked framing");
            send_http_error(&mut stream, 400, "Bad Request").await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let request = match decode(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(peer = %peer_addr, error = %e, "malformed IPP request");
            let response = error_response(
                STATUS_CLIENT_ERROR_BAD_REQUEST,
                0, // no valid request-id
                &format!("malformed IPP request: {e}"),
            );
            send_response(&mut stream, &response).await?;
            return Ok(());
        }
    };

    debug!(
        peer = %peer_addr,
        version = %format!("{}.{}", request.version_major, request.version_minor),
        operation = %format!("0x{:04X}", request.code),
        request_id = request.request_id,
        groups = request.groups.len(),
        doc_bytes = request.data.len(),
        "parsed IPP request"
    );

    let response = dispatcher.dispatch(&request, peer_addr);
    send_response(&mut stream, &response).await?;

    info!(
        peer = %peer_addr,
        operation = %format!("0x{:04X}", request.code),
        response_bytes = response.len(),
        "IPP response sent"
    );

    Ok(())
}

/// Read one request from the stream and return the IPP payload, applying
/// the HTTP framing rules described in the module docs.  `Ok(None)` means
/// the peer sent nothing.
async fn read_request_body(
    stream: &mut TcpStream,
    peer_addr: SocketAddr,
) -> Result<Option<Vec<u8>>> {
    let mut buf: Vec<u8> = Vec::with_capacity(8192);

    // Phase 1: accumulate until we see the end of the HTTP headers, the
    // peer closes, or the header cap is hit.
    let header_end = loop {
        if let Some(end) = find_subsequence(&buf, b"\r\n\r\n") {
            break Some(end);
        }
        if buf.len() >= MAX_HEADER_BYTES {
            break None;
        }
        let n = read_some(stream, &mut buf, peer_addr).await?;
        if n == 0 {
            break None;
        }
    };

    let envelope = header_end.and_then(|_| parse_http_envelope(&buf));

    let Some(envelope) = envelope else {
        // No HTTP envelope — drain the stream and treat it as raw IPP.
        read_to_eof(stream, &mut buf, peer_addr).await?;
        if buf.is_empty() {
            return Ok(None);
        }
        debug!(peer = %peer_addr, "no HTTP envelope — treating as raw IPP");
        return Ok(Some(buf));
    };

    match envelope.framing {
        BodyFraming::Length(len) => {
            let total = envelope.body_offset + len;
            if total > MAX_REQUEST_BYTES {
                return Err(PrinterError::Server(format!(
                    "declared body of {len} bytes exceeds limit"
                )));
            }
            while buf.len() < total {
                let n = read_some(stream, &mut buf, peer_addr).await?;
                if n == 0 {
                    return Err(PrinterError::Server(format!(
                        "peer closed mid-body ({} of {total} bytes)",
                        buf.len()
                    )));
                }
            }
            Ok(Some(buf[envelope.body_offset..total].to_vec()))
        }
        BodyFraming::Chunked => {
            read_to_eof(stream, &mut buf, peer_addr).await?;
            let body = &buf[envelope.body_offset..];
            if body.is_empty() {
                return Ok(None);
            }
            unwrap_chunked_body(body).map(Some)
        }
        BodyFraming::ReadToEof => {
            read_to_eof(stream, &mut buf, peer_addr).await?;
            let body = buf[envelope.body_offset..].to_vec();
            if body.is_empty() {
                Ok(None)
            } else {
                Ok(Some(body))
            }
        }
    }
}

/// Read one chunk from the stream into `buf`, enforcing the request cap.
async fn read_some(
    stream: &mut TcpStream,
    buf: &mut Vec<u8>,
    peer_addr: SocketAddr,
) -> Result<usize> {
    if buf.len() >= MAX_REQUEST_BYTES {
        return Err(PrinterError::Server(format!(
            "request from {peer_addr} exceeds {MAX_REQUEST_BYTES} bytes"
        )));
    }
    let mut chunk = [0u8; 8192];
    let n = stream
        .read(&mut chunk)
        .await
        .map_err(|e| PrinterError::Server(format!("read from {peer_addr}: {e}")))?;
    buf.extend_from_slice(&chunk[..n]);
    Ok(n)
}

/// Drain the stream until EOF (the peer half-closing its write side).
async fn read_to_eof(
    stream: &mut TcpStream,
    buf: &mut Vec<u8>,
    peer_addr: SocketAddr,
) -> Result<()> {
    loop {
        let n = read_some(stream, buf, peer_addr).await?;
        if n == 0 {
            return Ok(());
        }
    }
}

/// Send an IPP response wrapped in a minimal HTTP/1.1 200 OK.
async fn send_response(stream: &mut TcpStream, ipp_body: &[u8]) -> Result<()> {
    let http_response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/ipp\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        ipp_body.len()
    );

    stream
        .write_all(http_response.as_bytes())
        .await
        .map_err(|e| PrinterError::Server(format!("write HTTP headers: {e}")))?;
    stream
        .write_all(ipp_body)
        .await
        .map_err(|e| PrinterError::Server(format!("write IPP body: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| PrinterError::Server(format!("flush: {e}")))?;

    Ok(())
}

/// Send an HTTP-level error (used for transport framing failures, where no
/// IPP response is meaningful).
async fn send_http_error(stream: &mut TcpStream, code: u16, reason: &str) -> Result<()> {
    let http_response = format!(
        "HTTP/1.1 {code} {reason}\r\n\
         Content-Length: 0\r\n\
         Connection: close\r\n\
         \r\n"
    );
    stream
        .write_all(http_response.as_bytes())
        .await
        .map_err(|e| PrinterError::Server(format!("write HTTP error: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| PrinterError::Server(format!("flush: {e}")))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use papiertiger_core::config::PrinterConfig;
    use papiertiger_core::types::{JobId, JobState};

    use crate::codec::{
        testutil::build_test_request, OP_PRINT_JOB, STATUS_OK, TAG_JOB_ATTRIBUTES,
        VALUE_TAG_KEYWORD, VALUE_TAG_NAME,
    };
    use crate::store::JobStore;

    // -- HTTP envelope parsing ----------------------------------------------

    #[test]
    fn envelope_with_content_length() {
        let http = b"POST /printers/papiertiger HTTP/1.1\r\n\
                     Host: 192.168.1.5:6310\r\n\
                     Content-Type: application/ipp\r\n\
                     Content-Length: 42\r\n\
                     \r\n\
                     <ipp body here>";
        let envelope = parse_http_envelope(http).expect("envelope");
        assert_eq!(envelope.framing, BodyFraming::Length(42));
        assert_eq!(&http[envelope.body_offset..], b"<ipp body here>");
    }

    #[test]
    fn envelope_with_chunked_encoding() {
        let http = b"POST / HTTP/1.1\r\n\
                     Transfer-Encoding: chunked\r\n\
                     \r\nbody";
        let envelope = parse_http_envelope(http).expect("envelope");
        assert_eq!(envelope.framing, BodyFraming::Chunked);
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let http = b"POST / HTTP/1.1\r\n\
                     Content-Length: 10\r\n\
                     Transfer-Encoding: chunked\r\n\
                     \r\n";
        let envelope = parse_http_envelope(http).expect("envelope");
        assert_eq!(envelope.framing, BodyFraming::Chunked);
    }

    #[test]
    fn envelope_without_framing_headers_reads_to_eof() {
        let http = b"POST / HTTP/1.1\r\nHost: x\r\n\r\n";
        let envelope = parse_http_envelope(http).expect("envelope");
        assert_eq!(envelope.framing, BodyFraming::ReadToEof);
    }

    #[test]
    fn raw_ipp_has_no_envelope() {
        let raw = build_test_request(OP_PRINT_JOB, 1, &[], &[]);
        assert!(parse_http_envelope(&raw).is_none());
    }

    #[test]
    fn find_subsequence_basic() {
        assert_eq!(find_subsequence(b"hello world", b"world"), Some(6));
        assert_eq!(find_subsequence(b"hello world", b"hello"), Some(0));
        assert_eq!(find_subsequence(b"hello world", b"xyz"), None);
    }

    // -- chunked decoding ---------------------------------------------------

    #[test]
    fn decode_chunked_concatenates_chunks_in_order() {
        let body = b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n";
        let decoded = decode_chunked(body).expect("decode");
        assert_eq!(decoded, b"hello, world");
    }

    #[test]
    fn decode_chunked_handles_hex_sizes_and_extensions() {
        // 0x10 = 16 bytes, with a chunk extension to ignore.
        let body = b"10;name=value\r\nABCDEFGHIJKLMNOP\r\n0\r\n\r\n";
        let decoded = decode_chunked(body).expect("decode");
        assert_eq!(decoded, b"ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn decode_chunked_rejects_bad_size_line() {
        let body = b"zz\r\ndata\r\n0\r\n\r\n";
        assert!(matches!(
            decode_chunked(body),
            Err(PrinterError::TransportFraming(_))
        ));
    }

    #[test]
    fn decode_chunked_rejects_truncated_chunk() {
        let body = b"A\r\nshort\r\n";
        assert!(matches!(
            decode_chunked(body),
            Err(PrinterError::TransportFraming(_))
        ));
    }

    #[test]
    fn decode_chunked_rejects_missing_crlf_after_data() {
        let body = b"4\r\ndataXX0\r\n\r\n";
        assert!(matches!(
            decode_chunked(body),
            Err(PrinterError::TransportFraming(_))
        ));
    }

    #[test]
    fn chunked_body_starting_with_version_bytes_is_raw_frame() {
        // IPP 2.0 message: the 0x02 version-major byte triggers the
        // raw-frame sniff even though the client declared chunked.
        let mut raw = build_test_request(OP_PRINT_JOB, 9, &[], b"doc");
        raw[0] = 0x02;
        raw[1] = 0x00;
        let unwrapped = unwrap_chunked_body(&raw).expect("unwrap");
        assert_eq!(unwrapped, raw);
    }

    #[test]
    fn chunked_body_without_version_prefix_is_chunk_decoded() {
        let body = b"3\r\nabc\r\n0\r\n\r\n";
        let unwrapped = unwrap_chunked_body(body).expect("unwrap");
        assert_eq!(unwrapped, b"abc");
    }

    // -- server lifecycle ---------------------------------------------------

    #[test]
    fn new_server_is_stopped() {
        let server = IppServer::new(6310);
        assert_eq!(server.status(), ServerStatus::Stopped);
        assert_eq!(server.port(), 6310);
        assert_eq!(server.active_connections(), 0);
        assert!(server.local_addr().is_none());
    }

    // -- end-to-end over real TCP -------------------------------------------

    fn test_dispatcher() -> Arc<Dispatcher> {
        let store = Arc::new(JobStore::new(None));
        let config = Arc::new(PrinterConfig::default());
        Arc::new(Dispatcher::new(store, config))
    }

    async fn start_test_server(dispatcher: Arc<Dispatcher>) -> (IppServer, SocketAddr) {
        let mut server = IppServer::new(0); // ephemeral port
        server.start(dispatcher).await.expect("start");
        let addr = server.local_addr().expect("bound");
        let addr = SocketAddr::from(([127, 0, 0, 1], addr.port()));
        (server, addr)
    }

    /// POST a body and return the IPP payload of the HTTP response.
    async fn post(addr: SocketAddr, headers: &str, body: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(headers.as_bytes()).await.expect("write headers");
        stream.write_all(body).await.expect("write body");
        stream.shutdown().await.expect("shutdown write side");

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.expect("read response");

        let body_start =
            find_subsequence(&response, b"\r\n\r\n").expect("response header end") + 4;
        response[body_start..].to_vec()
    }

    #[tokio::test]
    async fn print_job_over_http_with_content_length() {
        let dispatcher = test_dispatcher();
        let (mut server, addr) = start_test_server(Arc::clone(&dispatcher)).await;

        let attrs = vec![
            (VALUE_TAG_NAME, "job-name", b"Network Doc" as &[u8]),
            (VALUE_TAG_KEYWORD, "document-format", b"application/pdf"),
        ];
        let ipp = build_test_request(OP_PRINT_JOB, 11, &attrs, b"%PDF-1.4 data");
        let headers = format!(
            "POST /printers/papiertiger HTTP/1.1\r\n\
             Host: test\r\n\
             Content-Type: application/ipp\r\n\
             Content-Length: {}\r\n\
             \r\n",
            ipp.len()
        );

        let response = post(addr, &headers, &ipp).await;
        let parsed = decode(&response).expect("decode response");
        assert_eq!(parsed.code, STATUS_OK);
        assert_eq!(parsed.request_id, 11);

        let job = dispatcher.store().get(JobId(1)).expect("stored job");
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.data, b"%PDF-1.4 data");
        assert_eq!(job.name, "Network Doc");

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn chunked_post_with_raw_ipp_frame_is_accepted() {
        let dispatcher = test_dispatcher();
        let (mut server, addr) = start_test_server(Arc::clone(&dispatcher)).await;

        // IPP 2.0 frame sent raw inside a "chunked" body, the way some
        // mobile clients do.
        let mut ipp = build_test_request(OP_PRINT_JOB, 12, &[], b"mobile doc");
        ipp[0] = 0x02;
        ipp[1] = 0x00;
        let headers = "POST / HTTP/1.1\r\n\
                       Content-Type: application/ipp\r\n\
                       Transfer-Encoding: chunked\r\n\
                       \r\n";

        let response = post(addr, headers, &ipp).await;
        let parsed = decode(&response).expect("decode response");
        assert_eq!(parsed.code, STATUS_OK);

        let job = dispatcher.store().get(JobId(1)).expect("stored job");
        assert_eq!(job.data, b"mobile doc");

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn chunked_post_with_real_chunks_is_decoded() {
        let dispatcher = test_dispatcher();
        let (mut server, addr) = start_test_server(Arc::clone(&dispatcher)).await;

        let ipp = build_test_request(OP_PRINT_JOB, 13, &[], b"chunky");
        // Split the frame into two proper chunks.
        let (a, b) = ipp.split_at(10);
        let mut body = Vec::new();
        body.extend_from_slice(format!("{:x}\r\n", a.len()).as_bytes());
        body.extend_from_slice(a);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("{:x}\r\n", b.len()).as_bytes());
        body.extend_from_slice(b);
        body.extend_from_slice(b"\r\n0\r\n\r\n");

        let headers = "POST / HTTP/1.1\r\n\
                       Transfer-Encoding: chunked\r\n\
                       \r\n";

        let response = post(addr, headers, &body).await;
        let parsed = decode(&response).expect("decode response");
        assert_eq!(parsed.code, STATUS_OK);
        assert_eq!(
            dispatcher.store().get(JobId(1)).expect("job").data,
            b"chunky"
        );

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn invalid_chunk_framing_gets_http_400() {
        let dispatcher = test_dispatcher();
        let (mut server, addr) = start_test_server(dispatcher).await;

        let headers = "POST / HTTP/1.1\r\n\
                       Transfer-Encoding: chunked\r\n\
                       \r\n";
        // Not a version byte, not a hex chunk-size line.
        let body = b"Znot-chunked-at-all";

        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(headers.as_bytes()).await.expect("headers");
        stream.write_all(body).await.expect("body");
        stream.shutdown().await.expect("shutdown");

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.expect("read");
        let status_line = response.split(|&b| b == b'\r').next().unwrap_or(&[]);
        assert_eq!(status_line, b"HTTP/1.1 400 Bad Request");

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn raw_ipp_without_http_envelope_is_served() {
        let dispatcher = test_dispatcher();
        let (mut server, addr) = start_test_server(Arc::clone(&dispatcher)).await;

        let ipp = build_test_request(OP_PRINT_JOB, 14, &[], b"bare tcp");
        let response = post(addr, "", &ipp).await;
        let parsed = decode(&response).expect("decode response");
        assert_eq!(parsed.code, STATUS_OK);
        assert!(parsed
            .groups
            .iter()
            .any(|g| g.delimiter == TAG_JOB_ATTRIBUTES));

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn malformed_ipp_body_gets_ipp_bad_request_response() {
        let dispatcher = test_dispatcher();
        let (mut server, addr) = start_test_server(dispatcher).await;

        let headers = "POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\n";
        let response = post(addr, headers, b"\x01\x01\x00").await;
        let parsed = decode(&response).expect("decode response");
        assert_eq!(parsed.code, STATUS_CLIENT_ERROR_BAD_REQUEST);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dispatcher = test_dispatcher();
        let (mut server, _addr) = start_test_server(dispatcher).await;
        server.stop().await.expect("first stop");
        server.stop().await.expect("second stop");
        assert_eq!(server.status(), ServerStatus::Stopped);
    }
}
