/*
 * xoauth.rs
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

//! Legacy XOAUTH SASL mechanism (OAuth 1.0a). Gmail has retired it; kept for reference
//! and for servers that still speak it.
//!
//! The initial client response is a signed pseudo HTTP request:
//!
//! ```text
//! GET https://mail.google.com/mail/b/{email}/{imap|smtp}/ oauth_signature_method="HMAC-SHA1",oauth_token="...",...,oauth_signature="..."
//! ```
//!
//! The server must not send a challenge before it; a non-empty one is a protocol violation.

use std::fmt;

use crate::oauth::{
    self, percent_encode, sign_request, OAuthConsumer, SigningError, HMAC_SHA1, VERSION_1_0,
};
use crate::uri::xoauth_request_url;

use super::{InitialResponse, NameCallback, OneShotClient, SaslError, SaslMechanism};

/// Mail protocol named in the signed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Imap,
    Smtp,
}

impl Protocol {
    /// Lowercase token used in the XOAUTH URL.
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Imap => "imap",
            Protocol::Smtp => "smtp",
        }
    }

    /// Map a transport protocol hint: `imaps` → IMAP, `smtp` → SMTP (case-insensitive).
    pub fn from_hint(hint: &str) -> Option<Self> {
        if hint.eq_ignore_ascii_case("imaps") {
            Some(Protocol::Imap)
        } else if hint.eq_ignore_ascii_case("smtp") {
            Some(Protocol::Smtp)
        } else {
            None
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where `oauth_nonce` and `oauth_timestamp` come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OAuthNonce {
    /// 16 random bytes (hex) and the current UNIX time.
    #[default]
    Random,
    /// Fixed values; output is then byte-identical across calls.
    Fixed { nonce: String, timestamp: i64 },
}

impl OAuthNonce {
    fn resolve(&self) -> Result<(String, i64), SigningError> {
        match self {
            OAuthNonce::Random => Ok((generate_nonce()?, chrono::Utc::now().timestamp())),
            OAuthNonce::Fixed { nonce, timestamp } => Ok((nonce.clone(), *timestamp)),
        }
    }
}

fn generate_nonce() -> Result<String, SigningError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(SigningError::Nonce)?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Builds signed XOAUTH strings for one consumer.
#[derive(Debug, Clone, Default)]
pub struct XoauthResponseBuilder {
    consumer: OAuthConsumer,
}

impl XoauthResponseBuilder {
    pub fn new(consumer: OAuthConsumer) -> Self {
        Self { consumer }
    }

    pub fn consumer(&self) -> &OAuthConsumer {
        &self.consumer
    }

    /// Build the response with a fresh nonce and the current time.
    pub fn build_response(
        &self,
        email: &str,
        protocol: Protocol,
        oauth_token: &str,
        oauth_token_secret: &str,
    ) -> Result<Vec<u8>, SigningError> {
        let (nonce, timestamp) = OAuthNonce::Random.resolve()?;
        self.build_response_at(email, protocol, oauth_token, oauth_token_secret, &nonce, timestamp)
    }

    /// Build the response with the given nonce and timestamp.
    pub fn build_response_at(
        &self,
        email: &str,
        protocol: Protocol,
        oauth_token: &str,
        oauth_token_secret: &str,
        nonce: &str,
        timestamp: i64,
    ) -> Result<Vec<u8>, SigningError> {
        let url = xoauth_request_url(email, protocol.name())?;

        let mut params: Vec<(String, String)> = vec![
            (oauth::OAUTH_SIGNATURE_METHOD.to_string(), HMAC_SHA1.to_string()),
            (oauth::OAUTH_TOKEN.to_string(), oauth_token.to_string()),
            (oauth::OAUTH_CONSUMER_KEY.to_string(), self.consumer.key().to_string()),
            (oauth::OAUTH_TIMESTAMP.to_string(), timestamp.to_string()),
            (oauth::OAUTH_NONCE.to_string(), nonce.to_string()),
            (oauth::OAUTH_VERSION.to_string(), VERSION_1_0.to_string()),
        ];
        sign_request("GET", &url, &mut params, self.consumer.secret(), oauth_token_secret)?;

        let fields = params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!("GET {} {}", url, fields).into_bytes())
    }
}

/// XOAUTH strategy for `OneShotClient`.
#[derive(Clone)]
pub struct XoauthResponse {
    protocol: Protocol,
    oauth_token: String,
    oauth_token_secret: String,
    builder: XoauthResponseBuilder,
    nonce: OAuthNonce,
}

impl XoauthResponse {
    pub fn new(
        protocol: Protocol,
        oauth_token: impl Into<String>,
        oauth_token_secret: impl Into<String>,
        consumer: OAuthConsumer,
    ) -> Self {
        Self {
            protocol,
            oauth_token: oauth_token.into(),
            oauth_token_secret: oauth_token_secret.into(),
            builder: XoauthResponseBuilder::new(consumer),
            nonce: OAuthNonce::Random,
        }
    }

    pub fn with_nonce(mut self, nonce: OAuthNonce) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn into_client(self, callback: impl NameCallback + 'static) -> OneShotClient<Self> {
        OneShotClient::new(self, callback)
    }
}

impl fmt::Debug for XoauthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XoauthResponse")
            .field("protocol", &self.protocol)
            .field("consumer", self.builder.consumer())
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

impl InitialResponse for XoauthResponse {
    fn mechanism(&self) -> SaslMechanism {
        SaslMechanism::XOAuth
    }

    fn oauth_token(&self) -> &str {
        &self.oauth_token
    }

    fn check_initial_challenge(&self, challenge: &[u8]) -> Result<(), SaslError> {
        if challenge.is_empty() {
            Ok(())
        } else {
            Err(SaslError::ProtocolViolation(format!(
                "unexpected server challenge ({} bytes)",
                challenge.len()
            )))
        }
    }

    fn build(&self, email: &str) -> Result<Vec<u8>, SaslError> {
        let (nonce, timestamp) = self.nonce.resolve()?;
        let bytes = self.builder.build_response_at(
            email,
            self.protocol,
            &self.oauth_token,
            &self.oauth_token_secret,
            &nonce,
            timestamp,
        )?;
        Ok(bytes)
    }
}
