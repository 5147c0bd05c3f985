/*
 * credential.rs
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

//! Caller-supplied OAuth credential.

use std::collections::HashMap;

use crate::oauth::OAuthConsumer;

use super::{FixedName, SaslMechanism};

/// Property names understood by `Credential::from_props`.
pub mod props {
    pub const OAUTH2_TOKEN: &str = "mail.imaps.sasl.mechanisms.oauth2.oauthToken";
    pub const XOAUTH_TOKEN: &str = "mail.imaps.sasl.mechanisms.xoauth.oauthToken";
    pub const XOAUTH_TOKEN_SECRET: &str = "mail.imaps.sasl.mechanisms.xoauth.oauthTokenSecret";
    pub const XOAUTH_CONSUMER_KEY: &str = "mail.imaps.sasl.mechanisms.xoauth.consumerKey";
    pub const XOAUTH_CONSUMER_SECRET: &str = "mail.imaps.sasl.mechanisms.xoauth.consumerSecret";
}

/// Email plus OAuth token material. Token secret and consumer are only used by XOAUTH.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential {
    user_email: String,
    oauth_token: String,
    oauth_token_secret: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
}

impl Credential {
    pub fn new(user_email: impl Into<String>, oauth_token: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            oauth_token: oauth_token.into(),
            ..Default::default()
        }
    }

    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.oauth_token_secret = Some(secret.into());
        self
    }

    pub fn with_consumer(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.consumer_key = Some(key.into());
        self.consumer_secret = Some(secret.into());
        self
    }

    /// Read the token material `mechanism` uses from a property map. XOAUTH2 reads only the
    /// oauth2 token; XOAUTH reads the xoauth token, token secret and consumer.
    pub fn from_props(
        user_email: impl Into<String>,
        mechanism: SaslMechanism,
        map: &HashMap<String, String>,
    ) -> Self {
        let get = |key: &str| map.get(key).cloned();
        match mechanism {
            SaslMechanism::XOAuth2 => Self {
                user_email: user_email.into(),
                oauth_token: get(props::OAUTH2_TOKEN).unwrap_or_default(),
                ..Default::default()
            },
            SaslMechanism::XOAuth => Self {
                user_email: user_email.into(),
                oauth_token: get(props::XOAUTH_TOKEN).unwrap_or_default(),
                oauth_token_secret: get(props::XOAUTH_TOKEN_SECRET),
                consumer_key: get(props::XOAUTH_CONSUMER_KEY),
                consumer_secret: get(props::XOAUTH_CONSUMER_SECRET),
            },
        }
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn oauth_token(&self) -> &str {
        &self.oauth_token
    }

    pub fn oauth_token_secret(&self) -> Option<&str> {
        self.oauth_token_secret.as_deref()
    }

    /// Consumer for XOAUTH signing; the anonymous consumer unless both key and secret are set.
    pub fn consumer(&self) -> OAuthConsumer {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) => OAuthConsumer::new(key.clone(), secret.clone()),
            _ => OAuthConsumer::anonymous(),
        }
    }

    /// Identity callback answering with this credential's email.
    pub fn name_callback(&self) -> FixedName {
        FixedName::new(self.user_email.clone())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user_email", &self.user_email)
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}
