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

//! IMAP AUTHENTICATE driver (RFC 9051 / RFC 4959 SASL-IR). Greeting, CAPABILITY,
//! AUTHENTICATE and LOGOUT only.

mod client;

pub use client::{connect_and_authenticate, ImapSession};

use std::io;

use thiserror::Error;

use crate::sasl::SaslError;

/// Default IMAPS port (implicit TLS).
pub const IMAPS_PORT: u16 = 993;

/// IMAP client error (network, protocol, auth).
#[derive(Debug, Error)]
pub enum ImapClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("SASL error: {0}")]
    Sasl(#[from] SaslError),
    #[error("IMAP protocol error: {0}")]
    Protocol(String),
    #[error("server does not advertise AUTH={0}")]
    MechanismNotAdvertised(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImapStatus {
    Ok,
    No,
    Bad,
}

/// One line of IMAP response: untagged `*`, continuation `+`, or tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapLine {
    Untagged {
        status: Option<ImapStatus>,
        text: String,
    },
    /// Text after `+`, trimmed.
    Continuation(String),
    Tagged {
        tag: String,
        status: Option<ImapStatus>,
        text: String,
    },
}

fn split_status(rest: &str) -> (Option<ImapStatus>, String) {
    let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
    let status = if word.eq_ignore_ascii_case("OK") {
        Some(ImapStatus::Ok)
    } else if word.eq_ignore_ascii_case("NO") {
        Some(ImapStatus::No)
    } else if word.eq_ignore_ascii_case("BAD") {
        Some(ImapStatus::Bad)
    } else {
        None
    };
    match status {
        Some(_) => (status, text.trim().to_string()),
        None => (None, rest.trim().to_string()),
    }
}

pub(crate) fn parse_line(line: &str) -> ImapLine {
    if let Some(rest) = line.strip_prefix('+') {
        return ImapLine::Continuation(rest.trim().to_string());
    }
    if let Some(rest) = line.strip_prefix('*') {
        let (status, text) = split_status(rest.trim_start());
        return ImapLine::Untagged { status, text };
    }
    let (tag, rest) = line.split_once(' ').unwrap_or((line, ""));
    let (status, text) = split_status(rest);
    ImapLine::Tagged {
        tag: tag.to_string(),
        status,
        text,
    }
}

/// Capabilities from `CAPABILITY a b c` or a `[CAPABILITY a b c] text` response code, uppercased.
pub(crate) fn parse_capabilities(text: &str) -> Vec<String> {
    const KEYWORD: &str = "CAPABILITY ";
    let list = if let Some(start) = text.find('[') {
        let inner = &text[start + 1..];
        let inner = inner.split(']').next().unwrap_or("");
        match inner.get(..KEYWORD.len()) {
            Some(k) if k.eq_ignore_ascii_case(KEYWORD) => &inner[KEYWORD.len()..],
            _ => return Vec::new(),
        }
    } else {
        match text.get(..KEYWORD.len()) {
            Some(k) if k.eq_ignore_ascii_case(KEYWORD) => &text[KEYWORD.len()..],
            _ => return Vec::new(),
        }
    };
    list.split_whitespace().map(|w| w.to_uppercase()).collect()
}
