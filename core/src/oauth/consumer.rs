/*
 * consumer.rs
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

//! OAuth 1.0a consumer (application identity).

/// Consumer key and secret identifying the application.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConsumer {
    key: String,
    secret: String,
}

impl OAuthConsumer {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// `anonymous` / `anonymous`: the consumer Google accepted for testing XOAUTH.
    pub fn anonymous() -> Self {
        Self::new("anonymous", "anonymous")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for OAuthConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConsumer")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Default for OAuthConsumer {
    fn default() -> Self {
        Self::anonymous()
    }
}
