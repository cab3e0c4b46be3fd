//! Streaming range GET.
//!
//! curl runs on tokio's blocking pool and pushes each body chunk through a
//! bounded channel; the async side reads that channel as an `AsyncRead`. The
//! channel bound is the backpressure: a full queue parks the curl thread
//! inside its write callback. Dropping the reader closes the channel, the
//! next callback returns 0 and curl aborts the transfer.

use std::cell::Cell;
use std::io;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;

use super::{HttpOptions, RangeBody};
use crate::error::FetchError;
use crate::fetch_head::{header_value, parse_status_line};
use crate::segmenter::ByteRange;

/// Chunks (curl hands out at most 16 KiB each) buffered ahead of the reader.
const CHUNK_QUEUE_DEPTH: usize = 16;

/// Outcome of the final header block: the body length the server declared, or
/// why the body will not be read.
type HeadVerdict = Result<Option<u64>, FetchError>;

pub(super) async fn open_range(
    url: &str,
    range: ByteRange,
    options: &HttpOptions,
) -> Result<RangeBody, FetchError> {
    let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_QUEUE_DEPTH);
    let (head_tx, head_rx) = oneshot::channel();
    let url = url.to_string();
    let options = options.clone();
    tokio::task::spawn_blocking(move || transfer(&url, range, &options, head_tx, chunk_tx));

    let declared = match head_rx.await {
        Ok(verdict) => verdict?,
        Err(_) => {
            return Err(FetchError::Task(format!(
                "range {} transfer ended before its headers",
                range
            )))
        }
    };
    tracing::trace!(range = %range, declared = ?declared, "range response accepted");

    let reader = StreamReader::new(ReceiverStream::new(chunk_rx));
    Ok(RangeBody::new(Box::new(reader), declared.unwrap_or_else(|| range.len())))
}

fn transfer(
    url: &str,
    range: ByteRange,
    options: &HttpOptions,
    head_tx: oneshot::Sender<HeadVerdict>,
    chunk_tx: mpsc::Sender<io::Result<Bytes>>,
) {
    let head_tx = Cell::new(Some(head_tx));
    let last_status = Cell::new(0u32);
    let result = perform(url, range, options, &head_tx, &last_status, &chunk_tx);

    match (result, head_tx.take()) {
        (Ok(()), None) => {}
        // The transfer ended on a header block we never accepted (say, a
        // redirect curl did not follow).
        (Ok(()), Some(tx)) => {
            let _ = tx.send(Err(FetchError::RangeIgnored {
                start: range.start,
                end: range.end,
                status: last_status.get(),
            }));
        }
        (Err(e), Some(tx)) => {
            let _ = tx.send(Err(e.into()));
        }
        (Err(e), None) => {
            if chunk_tx.is_closed() {
                tracing::trace!(range = %range, "reader dropped, transfer aborted");
            } else {
                let _ = chunk_tx.blocking_send(Err(io::Error::other(e)));
            }
        }
    }
}

fn perform(
    url: &str,
    range: ByteRange,
    options: &HttpOptions,
    head_tx: &Cell<Option<oneshot::Sender<HeadVerdict>>>,
    last_status: &Cell<u32>,
    chunk_tx: &mpsc::Sender<io::Result<Bytes>>,
) -> Result<(), curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.low_speed_limit(options.low_speed_limit)?;
    easy.low_speed_time(options.low_speed_time)?;
    easy.range(&range.to_string())?;

    let declared = Cell::new(None::<u64>);
    let mut transfer = easy.transfer();
    transfer.header_function(|data| {
        let line = String::from_utf8_lossy(data);
        if let Some(code) = parse_status_line(&line) {
            last_status.set(code);
            declared.set(None);
            return true;
        }
        if !line.trim().is_empty() {
            if let Some(n) = header_value(&line, "content-length").and_then(|v| v.parse().ok()) {
                declared.set(Some(n));
            }
            return true;
        }

        // Blank line: one header block is complete.
        let code = last_status.get();
        if (100..200).contains(&code) || (300..400).contains(&code) {
            return true;
        }
        match head_tx.take() {
            Some(tx) if code == 206 => {
                let _ = tx.send(Ok(declared.get()));
                true
            }
            Some(tx) => {
                let _ = tx.send(Err(FetchError::RangeIgnored {
                    start: range.start,
                    end: range.end,
                    status: code,
                }));
                false
            }
            None => true,
        }
    })?;
    transfer.write_function(|data| {
        match chunk_tx.blocking_send(Ok(Bytes::copy_from_slice(data))) {
            Ok(()) => Ok(data.len()),
            Err(_) => Ok(0),
        }
    })?;
    transfer.perform()?;
    Ok(())
}
