// Copyright (c) 2026 proc-disasm Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Content-Length framed JSON messages, as used by DAP and JSON-RPC over stdio.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::{self, BufRead, BufReader, Write};

pub trait Transport {
    /// Next message, or `None` on a clean end of stream.
    fn read_message(&mut self) -> Result<Option<Value>>;
    fn write_message(&mut self, msg: &Value) -> Result<()>;
}

/// Framed transport over any reader/writer pair.
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
}

pub type StdioTransport = StreamTransport<BufReader<io::Stdin>, io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        StreamTransport::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> StreamTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Transport for StreamTransport<R, W> {
    fn read_message(&mut self) -> Result<Option<Value>> {
        // Read headers until an empty line
        let mut content_length: Option<usize> = None;
        let mut first = true;
        loop {
            let mut header_line = String::new();
            let n = self.reader.read_line(&mut header_line)?;
            if n == 0 {
                if first {
                    return Ok(None);
                }
                bail!("EOF while reading header");
            }
            first = false;
            let header_trim = header_line.trim();
            if header_trim.is_empty() {
                break; // end of headers
            }
            if header_trim.to_lowercase().starts_with("content-length") {
                if let Some(idx) = header_trim.find(':') {
                    let num = header_trim[idx + 1..].trim();
                    content_length = Some(num.parse::<usize>()?);
                }
            }
            // ignore other headers
        }

        let len = content_length.context("Missing Content-Length header")?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        let v: Value = serde_json::from_slice(&buf)?;
        Ok(Some(v))
    }

    fn write_message(&mut self, msg: &Value) -> Result<()> {
        write_framed(&mut self.writer, msg)
    }
}

/// Serialize first, then write header and body in one go so concurrent writers
/// holding the same lock never interleave.
pub fn write_framed<W: Write>(w: &mut W, msg: &Value) -> Result<()> {
    let body = serde_json::to_vec(msg)?;
    write!(w, "Content-Length: {}\r\n\r\n", body.len())?;
    w.write_all(&body)?;
    w.flush()?;
    Ok(())
}
