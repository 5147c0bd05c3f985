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

//! SASL client side for the OAuth mechanisms: XOAUTH2 and legacy XOAUTH.
//!
//! Both mechanisms are client-first and single-shot. The response bytes are raw; the
//! transport base64-encodes them for the wire (IMAP AUTHENTICATE, SMTP AUTH).
//!
//! - `xoauth2_initial_response` / `XoauthResponseBuilder`: the credential strings
//! - `OneShotClient`: one state machine shared by both, parameterized by `InitialResponse`
//! - `create_client`: pick a mechanism by name (and protocol hint for XOAUTH)

mod callback;
mod client;
mod credential;
mod factory;
mod mechanism;
mod xoauth;
mod xoauth2;

pub use callback::{CallbackError, FixedName, NameCallback};
pub use client::{
    property, ExchangeState, InitialResponse, NegotiatedProperty, OneShotClient, SaslClient,
};
pub use credential::{props, Credential};
pub use factory::{create_client, create_client_from_props, mechanism_names};
pub use mechanism::SaslMechanism;
pub use xoauth::{OAuthNonce, Protocol, XoauthResponse, XoauthResponseBuilder};
pub use xoauth2::{xoauth2_initial_response, XOAuth2Response};

use crate::oauth::SigningError;

/// Errors raised while producing a SASL client response.
#[derive(Debug, thiserror::Error)]
pub enum SaslError {
    /// The identity callback could not supply an email address.
    #[error("identity callback failed: {0}")]
    CallbackFailure(#[source] CallbackError),

    /// The exchange did not follow the mechanism's shape (unexpected challenge, security layer).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Building or signing the legacy XOAUTH request failed.
    #[error("cannot build XOAUTH response: {0}")]
    SigningFailure(#[from] SigningError),

    /// Operation not allowed in the current exchange state.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
}

impl From<CallbackError> for SaslError {
    fn from(e: CallbackError) -> Self {
        SaslError::CallbackFailure(e)
    }
}
