/*
 * mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of oauthsasl, OAuth SASL authentication for IMAP and SMTP.
 *
 * oauthsasl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * oauthsasl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with oauthsasl.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Auth-only transport drivers. Each one carries a `SaslClient` through the
//! protocol's challenge/response framing and stops once the server accepts or rejects it.

pub mod imap;
pub mod smtp;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Longest response line either driver will buffer.
const MAX_LINE: usize = 64 * 1024;

/// Read one CRLF-terminated line; the terminator is stripped.
pub(crate) async fn read_line<S>(stream: &mut S, buf: &mut Vec<u8>) -> io::Result<String>
where
    S: AsyncRead + Unpin,
{
    buf.clear();
    loop {
        let mut b = [0u8; 1];
        let n = stream.read(&mut b).await?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"));
        }
        buf.push(b[0]);
        if buf.ends_with(b"\r\n") {
            break;
        }
        if buf.len() > MAX_LINE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "response line too long"));
        }
    }
    Ok(String::from_utf8_lossy(&buf[..buf.len() - 2]).into_owned())
}

/// Write a line (no CRLF) then CRLF.
pub(crate) async fn write_line<S>(stream: &mut S, line: &[u8]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(line).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await?;
    Ok(())
}

/// Base64 for a client response. Empty stays empty.
pub(crate) fn encode_response(response: &[u8]) -> String {
    STANDARD.encode(response)
}

/// Decode a server challenge; blank text is an empty challenge.
pub(crate) fn decode_challenge(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Vec::new());
    }
    STANDARD.decode(text).ok()
}
