/*
 * client.rs
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

//! Async IMAP session: greeting, CAPABILITY, AUTHENTICATE, LOGOUT.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use super::{parse_capabilities, parse_line, ImapClientError, ImapLine, ImapStatus};
use crate::net::{connect_implicit_tls, TlsStreamWrapper};
use crate::protocol::{decode_challenge, encode_response, read_line, write_line};
use crate::sasl::SaslClient;

/// IMAP connection between greeting and LOGOUT.
pub struct ImapSession<S> {
    stream: S,
    read_buf: Vec<u8>,
    capabilities: Vec<String>,
    tag_counter: u32,
    authenticated: bool,
}

impl<S> ImapSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Read the greeting and learn capabilities (from the greeting or a CAPABILITY command).
    pub async fn start(stream: S) -> Result<Self, ImapClientError> {
        let mut session = Self {
            stream,
            read_buf: Vec::with_capacity(1024),
            capabilities: Vec::new(),
            tag_counter: 0,
            authenticated: false,
        };
        let greeting = read_line(&mut session.stream, &mut session.read_buf).await?;
        trace!("S: {}", greeting);
        match parse_line(&greeting) {
            ImapLine::Untagged {
                status: Some(ImapStatus::Ok),
                text,
            } => {
                session.capabilities = parse_capabilities(&text);
            }
            _ => {
                return Err(ImapClientError::Protocol(format!(
                    "expected * OK greeting, got: {}",
                    greeting
                )))
            }
        }
        if session.capabilities.is_empty() {
            session.refresh_capabilities().await?;
        }
        debug!(capabilities = ?session.capabilities, "IMAP session started");
        Ok(session)
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// True when `AUTH=<mechanism>` was advertised.
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        let wanted = format!("AUTH={}", mechanism.to_uppercase());
        self.capabilities.iter().any(|c| *c == wanted)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Generate next tag (A0001, A0002, ...).
    fn next_tag(&mut self) -> String {
        self.tag_counter = self.tag_counter % 9999 + 1;
        format!("A{:04}", self.tag_counter)
    }

    /// Read until the tagged response for `tag`, passing untagged lines to `on_untagged`.
    async fn read_tagged<F>(
        &mut self,
        tag: &str,
        mut on_untagged: F,
    ) -> Result<(Option<ImapStatus>, String), ImapClientError>
    where
        F: FnMut(Option<ImapStatus>, &str),
    {
        loop {
            let line = read_line(&mut self.stream, &mut self.read_buf).await?;
            trace!("S: {}", line);
            match parse_line(&line) {
                ImapLine::Tagged { tag: t, status, text } if t == tag => return Ok((status, text)),
                ImapLine::Untagged { status, text } => on_untagged(status, &text),
                other => warn!(?other, "ignoring unexpected line"),
            }
        }
    }

    async fn refresh_capabilities(&mut self) -> Result<(), ImapClientError> {
        let tag = self.next_tag();
        let cmd = format!("{} CAPABILITY", tag);
        trace!("C: {}", cmd);
        write_line(&mut self.stream, cmd.as_bytes()).await?;
        let mut caps = Vec::new();
        let (status, text) = self
            .read_tagged(&tag, |_, text| {
                let found = parse_capabilities(text);
                if !found.is_empty() {
                    caps = found;
                }
            })
            .await?;
        if status != Some(ImapStatus::Ok) {
            return Err(ImapClientError::Protocol(format!("CAPABILITY failed: {}", text)));
        }
        self.capabilities = caps;
        Ok(())
    }

    /// Run AUTHENTICATE with `client`.
    ///
    /// The initial response goes on the command line when the server advertises SASL-IR,
    /// otherwise after the first `+`. Every continuation is decoded and handed to the client;
    /// its answer (possibly empty) is sent back base64-encoded.
    pub async fn authenticate<C>(&mut self, client: &mut C) -> Result<(), ImapClientError>
    where
        C: SaslClient + ?Sized,
    {
        let mechanism = client.mechanism_name();
        if !self.supports_auth(mechanism) {
            return Err(ImapClientError::MechanismNotAdvertised(mechanism.to_string()));
        }
        let sasl_ir = self.capabilities.iter().any(|c| c == "SASL-IR");
        let tag = self.next_tag();
        let mut cmd = format!("{} AUTHENTICATE {}", tag, mechanism);
        trace!("C: {}", cmd);
        if sasl_ir && client.has_initial_response() {
            let initial = client.evaluate_challenge(&[])?;
            cmd.push(' ');
            if initial.is_empty() {
                cmd.push('=');
            } else {
                cmd.push_str(&encode_response(&initial));
            }
            trace!("C: <initial response redacted>");
        }
        debug!(mechanism, sasl_ir, "IMAP AUTHENTICATE");
        write_line(&mut self.stream, cmd.as_bytes()).await?;

        loop {
            let line = read_line(&mut self.stream, &mut self.read_buf).await?;
            trace!("S: {}", line);
            match parse_line(&line) {
                ImapLine::Continuation(text) => {
                    let response = match decode_challenge(&text) {
                        None => {
                            self.cancel_authentication(&tag).await;
                            return Err(ImapClientError::Protocol(format!(
                                "invalid base64 in continuation: {}",
                                text
                            )));
                        }
                        Some(challenge) => match client.evaluate_challenge(&challenge) {
                            Ok(response) => response,
                            Err(e) => {
                                self.cancel_authentication(&tag).await;
                                return Err(e.into());
                            }
                        },
                    };
                    trace!("C: <response redacted, {} bytes>", response.len());
                    write_line(&mut self.stream, encode_response(&response).as_bytes()).await?;
                }
                ImapLine::Tagged { tag: t, status, text } if t == tag => {
                    return match status {
                        Some(ImapStatus::Ok) => {
                            let caps = parse_capabilities(&text);
                            if !caps.is_empty() {
                                self.capabilities = caps;
                            }
                            self.authenticated = true;
                            debug!(mechanism, "IMAP authentication succeeded");
                            Ok(())
                        }
                        _ => Err(ImapClientError::AuthenticationFailed(text)),
                    };
                }
                ImapLine::Untagged { text, .. } => {
                    let caps = parse_capabilities(&text);
                    if !caps.is_empty() {
                        self.capabilities = caps;
                    }
                }
                other => warn!(?other, "ignoring unexpected line"),
            }
        }
    }

    /// Abort an AUTHENTICATE exchange with `*` and consume the tagged reply. Failures here are
    /// logged; the caller reports the error that caused the abort.
    async fn cancel_authentication(&mut self, tag: &str) {
        debug!("cancelling IMAP AUTHENTICATE");
        trace!("C: *");
        let cancelled = match write_line(&mut self.stream, b"*").await {
            Ok(()) => self.read_tagged(tag, |_, _| {}).await.map(|(status, text)| {
                trace!("AUTHENTICATE cancel answered with {:?}: {}", status, text);
            }),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = cancelled {
            warn!("cancelling AUTHENTICATE failed: {}", e);
        }
    }

    /// Send LOGOUT and wait for the tagged reply. The server's `* BYE` is expected.
    pub async fn logout(mut self) -> Result<(), ImapClientError> {
        let tag = self.next_tag();
        let cmd = format!("{} LOGOUT", tag);
        trace!("C: {}", cmd);
        write_line(&mut self.stream, cmd.as_bytes()).await?;
        let (status, text) = self.read_tagged(&tag, |_, _| {}).await?;
        if status != Some(ImapStatus::Ok) {
            warn!("LOGOUT answered with {:?}: {}", status, text);
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Connect with implicit TLS, read the greeting, and authenticate with `client`.
pub async fn connect_and_authenticate<C>(
    host: &str,
    port: u16,
    client: &mut C,
) -> Result<ImapSession<TlsStreamWrapper>, ImapClientError>
where
    C: SaslClient + ?Sized,
{
    debug!(host, port, "connecting to IMAP server");
    let stream = connect_implicit_tls(host, port).await?;
    let mut session = ImapSession::start(stream).await?;
    session.authenticate(client).await?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sasl::{FixedName, XOAuth2Response};
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[test]
    fn tags_increase() {
        let mut s = ImapSession {
            stream: duplex(64).0,
            read_buf: Vec::new(),
            capabilities: Vec::new(),
            tag_counter: 0,
            authenticated: false,
        };
        assert_eq!(s.next_tag(), "A0001");
        assert_eq!(s.next_tag(), "A0002");
        s.tag_counter = 9999;
        assert_eq!(s.next_tag(), "A0001");
    }

    #[tokio::test]
    async fn greeting_without_capabilities_asks_for_them() {
        let (client_io, server_io) = duplex(4096);
        let server = tokio::spawn(async move {
            let (r, mut w) = tokio::io::split(server_io);
            let mut lines = BufReader::new(r).lines();
            w.write_all(b"* OK ready\r\n").await.unwrap();
            assert_eq!(lines.next_line().await.unwrap().unwrap(), "A0001 CAPABILITY");
            w.write_all(b"* CAPABILITY IMAP4rev1 AUTH=XOAUTH2\r\nA0001 OK done\r\n")
                .await
                .unwrap();
        });
        let session = ImapSession::start(client_io).await.unwrap();
        assert!(session.supports_auth("XOAUTH2"));
        assert!(session.supports_auth("xoauth2"));
        assert!(!session.supports_auth("XOAUTH"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn bye_greeting_is_rejected() {
        let (client_io, mut server_io) = duplex(1024);
        server_io.write_all(b"* BYE go away\r\n").await.unwrap();
        let err = ImapSession::start(client_io).await.err().unwrap();
        assert!(matches!(err, ImapClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn unadvertised_mechanism_is_refused_locally() {
        let (client_io, mut server_io) = duplex(1024);
        server_io
            .write_all(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n")
            .await
            .unwrap();
        let mut session = ImapSession::start(client_io).await.unwrap();
        let mut client = XOAuth2Response::new("tok").into_client(FixedName::new("a@b"));
        let err = session.authenticate(&mut client).await.unwrap_err();
        assert!(matches!(err, ImapClientError::MechanismNotAdvertised(ref m) if m == "XOAUTH2"));
        assert!(!client.is_complete());
    }
}
