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

//! OAuth 1.0a request signing (RFC 5849), HMAC-SHA1 only. Used by the legacy XOAUTH
//! mechanism; XOAUTH2 needs nothing from here.

mod consumer;
mod signature;

pub use consumer::OAuthConsumer;
pub use signature::{
    hmac_sha1_signature, normalized_parameters, percent_encode, sign_request,
    signature_base_string,
};

pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub const OAUTH_NONCE: &str = "oauth_nonce";
pub const OAUTH_SIGNATURE: &str = "oauth_signature";
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
pub const OAUTH_TOKEN: &str = "oauth_token";
pub const OAUTH_VERSION: &str = "oauth_version";

pub const HMAC_SHA1: &str = "HMAC-SHA1";
pub const VERSION_1_0: &str = "1.0";

/// Failure while building or signing an OAuth 1.0a request.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("invalid HMAC key")]
    InvalidKey,

    #[error("cannot generate nonce: {0}")]
    Nonce(#[source] getrandom::Error),
}
