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

//! Async SMTP session: greeting, EHLO, STARTTLS, AUTH, QUIT.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use super::{parse_reply_line, EhloInfo, PasswordFallback, SmtpClientError, SmtpResponse};
use crate::net::{connect_implicit_tls, connect_plain, PlainStream, TlsStreamWrapper};
use crate::protocol::{decode_challenge, encode_response, read_line, write_line};
use crate::sasl::SaslClient;

/// SMTP connection between greeting and QUIT.
pub struct SmtpSession<S> {
    stream: S,
    read_buf: Vec<u8>,
    ehlo_name: String,
    ehlo: EhloInfo,
    fallback: PasswordFallback,
    authenticated: bool,
}

/// Read one SMTP response (single line or multi-line) from stream.
async fn read_response<S>(
    stream: &mut S,
    buf: &mut Vec<u8>,
) -> Result<SmtpResponse, SmtpClientError>
where
    S: AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let line = read_line(stream, buf).await?;
        trace!("S: {}", line);
        let Some((code, continuation, text)) = parse_reply_line(&line) else {
            return Err(SmtpClientError::Protocol(format!("malformed reply: {}", line)));
        };
        lines.push(text.to_string());
        if !continuation {
            return Ok(SmtpResponse { code, lines });
        }
    }
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Read the 220 greeting and send EHLO.
    pub async fn start(stream: S, ehlo_name: &str) -> Result<Self, SmtpClientError> {
        let mut session = Self {
            stream,
            read_buf: Vec::with_capacity(512),
            ehlo_name: ehlo_name.to_string(),
            ehlo: EhloInfo::default(),
            fallback: PasswordFallback::Never,
            authenticated: false,
        };
        let greeting = read_response(&mut session.stream, &mut session.read_buf).await?;
        if greeting.code != 220 {
            return Err(SmtpClientError::Protocol(format!(
                "expected 220 greeting, got: {} {}",
                greeting.code,
                greeting.message()
            )));
        }
        session.ehlo().await?;
        Ok(session)
    }

    pub fn ehlo_info(&self) -> &EhloInfo {
        &self.ehlo
    }

    pub fn password_fallback(&self) -> PasswordFallback {
        self.fallback
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn command(&mut self, line: &str) -> Result<SmtpResponse, SmtpClientError> {
        trace!("C: {}", line);
        write_line(&mut self.stream, line.as_bytes()).await?;
        read_response(&mut self.stream, &mut self.read_buf).await
    }

    /// Send EHLO and record the advertised extensions.
    pub async fn ehlo(&mut self) -> Result<(), SmtpClientError> {
        let cmd = format!("EHLO {}", self.ehlo_name);
        let r = self.command(&cmd).await?;
        if !r.is_success() {
            return Err(SmtpClientError::Protocol(format!(
                "EHLO failed: {} {}",
                r.code,
                r.message()
            )));
        }
        self.ehlo = EhloInfo::from_response(&r);
        debug!(starttls = self.ehlo.starttls, auth = ?self.ehlo.auth_methods, "EHLO");
        Ok(())
    }

    /// Issue STARTTLS and check the server is ready for the handshake.
    pub async fn request_starttls(&mut self) -> Result<(), SmtpClientError> {
        if !self.ehlo.starttls {
            return Err(SmtpClientError::StartTlsUnavailable);
        }
        let r = self.command("STARTTLS").await?;
        if r.code != 220 {
            return Err(SmtpClientError::Protocol(format!(
                "STARTTLS failed: {} {}",
                r.code,
                r.message()
            )));
        }
        Ok(())
    }

    /// Run AUTH with `client`.
    ///
    /// The initial response is sent with the command. `334` challenges are decoded and handed
    /// to the client, and its answer (possibly empty) is sent back base64-encoded. A rejection
    /// ends the attempt: no password mechanism is tried afterwards.
    pub async fn authenticate<C>(&mut self, client: &mut C) -> Result<(), SmtpClientError>
    where
        C: SaslClient + ?Sized,
    {
        let mechanism = client.mechanism_name();
        debug!(mechanism, password_fallback = %self.fallback, "SMTP AUTH");
        if !self.ehlo.supports_auth(mechanism) {
            return Err(SmtpClientError::MechanismNotAdvertised(mechanism.to_string()));
        }
        let mut cmd = format!("AUTH {}", mechanism);
        trace!("C: {}", cmd);
        if client.has_initial_response() {
            let initial = client.evaluate_challenge(&[])?;
            cmd.push(' ');
            if initial.is_empty() {
                cmd.push('=');
            } else {
                cmd.push_str(&encode_response(&initial));
            }
            trace!("C: <initial response redacted>");
        }
        write_line(&mut self.stream, cmd.as_bytes()).await?;

        loop {
            let r = read_response(&mut self.stream, &mut self.read_buf).await?;
            match r.code {
                235 => {
                    self.authenticated = true;
                    debug!(mechanism, "SMTP authentication succeeded");
                    return Ok(());
                }
                334 => {
                    let text = r.message();
                    let response = match decode_challenge(text) {
                        None => {
                            let err = SmtpClientError::Protocol(format!(
                                "invalid base64 in 334 challenge: {}",
                                text
                            ));
                            self.cancel_authentication().await;
                            return Err(err);
                        }
                        Some(challenge) => match client.evaluate_challenge(&challenge) {
                            Ok(response) => response,
                            Err(e) => {
                                self.cancel_authentication().await;
                                return Err(e.into());
                            }
                        },
                    };
                    trace!("C: <response redacted, {} bytes>", response.len());
                    write_line(&mut self.stream, encode_response(&response).as_bytes()).await?;
                }
                code if code >= 400 => {
                    return Err(SmtpClientError::AuthenticationFailed {
                        code,
                        message: r.message().to_string(),
                    });
                }
                code => {
                    return Err(SmtpClientError::Protocol(format!(
                        "unexpected AUTH response: {} {}",
                        code,
                        r.message()
                    )));
                }
            }
        }
    }

    /// Abort an AUTH exchange with `*`; the server answers 501. Failures here are logged and
    /// the caller reports the error that caused the abort.
    async fn cancel_authentication(&mut self) {
        debug!("cancelling SMTP AUTH");
        match self.command("*").await {
            Ok(r) if r.code == 501 => {}
            Ok(r) => warn!("AUTH cancel answered with {} {}", r.code, r.message()),
            Err(e) => warn!("cancelling AUTH failed: {}", e),
        }
    }

    /// Send QUIT; anything but 221 is logged and ignored.
    pub async fn quit(mut self) -> Result<(), SmtpClientError> {
        let r = self.command("QUIT").await?;
        if r.code != 221 {
            warn!("QUIT answered with {} {}", r.code, r.message());
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl SmtpSession<PlainStream> {
    /// STARTTLS, TLS handshake, then EHLO again on the encrypted stream.
    pub async fn starttls(
        mut self,
        host: &str,
    ) -> Result<SmtpSession<TlsStreamWrapper>, SmtpClientError> {
        self.request_starttls().await?;
        let tls = self.stream.upgrade_to_tls(host).await?;
        let mut session = SmtpSession {
            stream: tls,
            read_buf: self.read_buf,
            ehlo_name: self.ehlo_name,
            ehlo: EhloInfo::default(),
            fallback: self.fallback,
            authenticated: false,
        };
        session.ehlo().await?;
        Ok(session)
    }
}

/// Connect (implicit TLS, or plain followed by mandatory STARTTLS) and authenticate with `client`.
pub async fn connect_and_authenticate<C>(
    host: &str,
    port: u16,
    implicit_tls: bool,
    ehlo_name: &str,
    client: &mut C,
) -> Result<SmtpSession<TlsStreamWrapper>, SmtpClientError>
where
    C: SaslClient + ?Sized,
{
    debug!(host, port, implicit_tls, "connecting to SMTP server");
    let mut session = if implicit_tls {
        let stream = connect_implicit_tls(host, port).await?;
        SmtpSession::start(stream, ehlo_name).await?
    } else {
        let plain = connect_plain(host, port).await?;
        SmtpSession::start(plain, ehlo_name).await?.starttls(host).await?
    };
    session.authenticate(client).await?;
    Ok(session)
}
