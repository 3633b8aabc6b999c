use anyhow::Context;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";
const CONTENT_LENGTH: &str = "Content-Length";
const CONTENT_TYPE: &str = "Content-Type";
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Serializes a response into its exact wire form.
///
/// Any `Content-Length` the handler set is replaced with the real body
/// length. `Content-Type` defaults to `text/plain` when absent.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    let mut has_content_type = false;
    for (k, v) in &resp.headers {
        if k.eq_ignore_ascii_case(CONTENT_LENGTH) {
            continue;
        }
        has_content_type |= k.eq_ignore_ascii_case(CONTENT_TYPE);
        write_header(&mut buf, k, v);
    }
    if !has_content_type {
        write_header(&mut buf, CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
    }
    write_header(&mut buf, CONTENT_LENGTH, &resp.body.len().to_string());

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);

    buf
}

fn write_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// A serialized response together with how much of it has reached the sink.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    /// Writes every remaining byte, looping over partial writes.
    pub async fn write_to<W>(&mut self, sink: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = sink
                .write(&self.buffer[self.written..])
                .await
                .context("failed to write response")?;

            if n == 0 {
                anyhow::bail!("connection closed while writing");
            }

            self.written += n;
        }

        sink.flush().await.context("failed to flush response")?;
        Ok(())
    }
}
