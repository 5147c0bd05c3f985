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

//! SMTP AUTH driver (RFC 4954): greeting, EHLO, STARTTLS, AUTH, QUIT.

mod client;

pub use client::{connect_and_authenticate, SmtpSession};

use std::fmt;
use std::io;

use thiserror::Error;

use crate::sasl::SaslError;

/// Message submission port (STARTTLS).
pub const SUBMISSION_PORT: u16 = 587;
/// Implicit TLS submission port.
pub const SUBMISSIONS_PORT: u16 = 465;

/// SMTP client error (network, protocol, auth).
#[derive(Debug, Error)]
pub enum SmtpClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("SASL error: {0}")]
    Sasl(#[from] SaslError),
    #[error("SMTP protocol error: {0}")]
    Protocol(String),
    #[error("server does not advertise STARTTLS; refusing to authenticate in cleartext")]
    StartTlsUnavailable,
    #[error("server does not advertise AUTH {0}")]
    MechanismNotAdvertised(String),
    #[error("authentication failed: {code} {message}")]
    AuthenticationFailed { code: u16, message: String },
}

/// What to do when the OAuth mechanism fails or is not offered.
///
/// Only `Never` exists: the driver does not retry with AUTH LOGIN or AUTH PLAIN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordFallback {
    #[default]
    Never,
}

impl fmt::Display for PasswordFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordFallback::Never => f.write_str("never"),
        }
    }
}

/// Parsed SMTP response (code + text of each line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpResponse {
    pub fn message(&self) -> &str {
        self.lines.last().map(|s| s.as_str()).unwrap_or("")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// One physical response line: code, whether more lines follow, text.
pub(crate) fn parse_reply_line(line: &str) -> Option<(u16, bool, &str)> {
    let code: u16 = line.get(..3)?.parse().ok()?;
    let continuation = match line.as_bytes().get(3) {
        None | Some(b' ') => false,
        Some(b'-') => true,
        Some(_) => return None,
    };
    let text = line.get(4..).unwrap_or("").trim();
    Some((code, continuation, text))
}

/// Extensions from an EHLO reply that matter for authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EhloInfo {
    pub starttls: bool,
    pub auth_methods: Vec<String>,
}

impl EhloInfo {
    /// The first line is the server's domain; the rest are keywords.
    pub fn from_response(response: &SmtpResponse) -> Self {
        let mut info = EhloInfo::default();
        for line in response.lines.iter().skip(1) {
            let mut words = line.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };
            if keyword.eq_ignore_ascii_case("STARTTLS") {
                info.starttls = true;
            } else if keyword.eq_ignore_ascii_case("AUTH") {
                info.auth_methods.extend(words.map(|w| w.to_uppercase()));
            }
        }
        info
    }

    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.auth_methods.iter().any(|m| m.eq_ignore_ascii_case(mechanism))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lines() {
        assert_eq!(parse_reply_line("250-smtp.gmail.com"), Some((250, true, "smtp.gmail.com")));
        assert_eq!(parse_reply_line("235 2.7.0 Accepted"), Some((235, false, "2.7.0 Accepted")));
        assert_eq!(parse_reply_line("334 "), Some((334, false, "")));
        assert_eq!(parse_reply_line("334"), Some((334, false, "")));
        assert_eq!(parse_reply_line("hello"), None);
        assert_eq!(parse_reply_line("250x"), None);
    }

    #[test]
    fn ehlo_extensions() {
        let r = SmtpResponse {
            code: 250,
            lines: vec![
                "smtp.gmail.com at your service".to_string(),
                "SIZE 35882577".to_string(),
                "AUTH LOGIN PLAIN xoauth2 XOAUTH".to_string(),
                "starttls".to_string(),
            ],
        };
        let info = EhloInfo::from_response(&r);
        assert!(info.starttls);
        assert_eq!(info.auth_methods, vec!["LOGIN", "PLAIN", "XOAUTH2", "XOAUTH"]);
        assert!(info.supports_auth("XOAUTH2"));
        assert!(!info.supports_auth("CRAM-MD5"));
    }

    #[test]
    fn greeting_line_is_not_an_extension() {
        let r = SmtpResponse {
            code: 250,
            lines: vec!["STARTTLS.example.org".to_string()],
        };
        assert_eq!(EhloInfo::from_response(&r), EhloInfo::default());
    }

    #[test]
    fn fallback_policy() {
        assert_eq!(PasswordFallback::default(), PasswordFallback::Never);
        assert_eq!(PasswordFallback::Never.to_string(), "never");
    }
}
