/*
 * xoauth2.rs
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

//! XOAUTH2 SASL mechanism for Gmail and Outlook IMAP/SMTP.
//!
//! The XOAUTH2 mechanism is a single-shot SASL mechanism (no challenge-response rounds).
//! The initial client response is:
//!
//! ```text
//! base64("user=" {user} "\x01" "auth=Bearer " {access_token} "\x01\x01")
//! ```
//!
//! On failure the server sends one challenge carrying a JSON error; the client answers it
//! with an empty response and the server then reports the failure.
//!
//! See <https://developers.google.com/gmail/imap/xoauth2-protocol>

use super::{InitialResponse, NameCallback, OneShotClient, SaslError, SaslMechanism};

/// Build the raw XOAUTH2 initial response (before base64 encoding).
///
/// Format: `user={user}\x01auth=Bearer {access_token}\x01\x01`. No validation: the server
/// is the only party able to reject malformed input.
pub fn xoauth2_initial_response(user: &str, access_token: &str) -> Vec<u8> {
    format!("user={}\x01auth=Bearer {}\x01\x01", user, access_token).into_bytes()
}

/// XOAUTH2 strategy for `OneShotClient`: holds the bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct XOAuth2Response {
    access_token: String,
}

impl XOAuth2Response {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Client for the given token; `callback` supplies the email address.
    pub fn into_client(self, callback: impl NameCallback + 'static) -> OneShotClient<Self> {
        OneShotClient::new(self, callback)
    }
}

impl std::fmt::Debug for XOAuth2Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XOAuth2Response").finish_non_exhaustive()
    }
}

impl InitialResponse for XOAuth2Response {
    fn mechanism(&self) -> SaslMechanism {
        SaslMechanism::XOAuth2
    }

    fn oauth_token(&self) -> &str {
        &self.access_token
    }

    fn build(&self, email: &str) -> Result<Vec<u8>, SaslError> {
        Ok(xoauth2_initial_response(email, &self.access_token))
    }
}
