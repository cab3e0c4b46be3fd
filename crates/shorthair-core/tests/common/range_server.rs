//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body at any path. Responds to HEAD with
//! Content-Length and Accept-Ranges: bytes; responds to GET with Range with
//! 206 Partial Content. Counts range GETs so tests can check the split.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Whether to send `Accept-Ranges: bytes`, independent of `support_ranges`
    /// (so a server can advertise ranges and then ignore them).
    pub advertise_ranges: bool,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            advertise_ranges: true,
        }
    }
}

pub struct RangeServer {
    base: String,
    range_gets: Arc<AtomicUsize>,
}

impl RangeServer {
    /// URL of `name` on this server, e.g. "http://127.0.0.1:12345/name".
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base, name)
    }

    /// Number of GET requests that carried a Range header.
    pub fn range_gets(&self) -> usize {
        self.range_gets.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (HEAD blocked, ranges missing, etc.).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let range_gets = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&range_gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &body, opts, &counter));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}/", port),
        range_gets,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, range_gets: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            let _ = stream
                .write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}\r\n",
            total, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream
            .write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let (status, content_range, slice) = match range.filter(|_| opts.support_ranges) {
        Some((start, end_incl)) => {
            range_gets.fetch_add(1, Ordering::SeqCst);
            let end_incl = end_incl.min(total.saturating_sub(1));
            if total == 0 || start > end_incl {
                (
                    "416 Range Not Satisfiable",
                    format!("bytes */{}", total),
                    &body[0..0],
                )
            } else {
                let slice = &body[start as usize..=end_incl as usize];
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end_incl, total),
                    slice,
                )
            }
        }
        None => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            body,
        ),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\n{}\r\n",
        status,
        slice.len(),
        content_range,
        accept_ranges
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("");
    let range = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("range"))
        .and_then(|(_, value)| {
            let (a, b) = value.trim().strip_prefix("bytes=")?.split_once('-')?;
            let start = a.trim().parse::<u64>().ok()?;
            let end = match b.trim() {
                "" => u64::MAX,
                e => e.parse::<u64>().ok()?,
            };
            Some((start, end))
        });
    (method, range)
}
