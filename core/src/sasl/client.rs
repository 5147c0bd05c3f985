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

//! One-shot SASL client state machine shared by XOAUTH2 and XOAUTH.
//!
//! States: `NotStarted -> Completed`. The only transition happens in `evaluate_challenge`
//! when the mechanism's initial response is built. After that every call answers with an
//! empty response (the server's final empty challenge is acknowledged, not an error).

use std::fmt;

use tracing::debug;

use super::{NameCallback, SaslError, SaslMechanism};

/// Per-mechanism strategy: how to turn the resolved identity into the initial response.
pub trait InitialResponse: Send {
    fn mechanism(&self) -> SaslMechanism;

    /// OAuth access token carried by this credential.
    fn oauth_token(&self) -> &str;

    /// Inspect the challenge received before the initial response. Default accepts anything.
    fn check_initial_challenge(&self, _challenge: &[u8]) -> Result<(), SaslError> {
        Ok(())
    }

    /// Build the raw (not base64) initial response for `email`.
    fn build(&self, email: &str) -> Result<Vec<u8>, SaslError>;
}

/// Exchange progress. Never goes back to `NotStarted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeState {
    NotStarted,
    Completed { email: String },
}

/// Value returned by `negotiated_property`.
pub enum NegotiatedProperty<'a> {
    Email(&'a str),
    MechanismName(&'static str),
    OAuthToken(&'a str),
    CallbackHandler(&'a dyn NameCallback),
}

/// Property names accepted by `negotiated_property`.
pub mod property {
    pub const EMAIL: &str = "Email";
    pub const MECHANISM_NAME: &str = "MechanismName";
    pub const OAUTH_TOKEN: &str = "OAuthToken";
    pub const CALLBACK_HANDLER: &str = "CallbackHandler";
}

impl NegotiatedProperty<'_> {
    /// String value, when the property has one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NegotiatedProperty::Email(s) | NegotiatedProperty::OAuthToken(s) => Some(*s),
            NegotiatedProperty::MechanismName(s) => Some(*s),
            NegotiatedProperty::CallbackHandler(_) => None,
        }
    }
}

impl fmt::Debug for NegotiatedProperty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiatedProperty::Email(s) => f.debug_tuple("Email").field(s).finish(),
            NegotiatedProperty::MechanismName(s) => {
                f.debug_tuple("MechanismName").field(s).finish()
            }
            NegotiatedProperty::OAuthToken(_) => f.write_str("OAuthToken(<redacted>)"),
            NegotiatedProperty::CallbackHandler(_) => f.write_str("CallbackHandler(..)"),
        }
    }
}

/// Client side of a SASL exchange, as driven by a transport.
pub trait SaslClient: Send {
    fn mechanism_name(&self) -> &'static str;

    fn has_initial_response(&self) -> bool;

    /// Produce the next client response for `challenge`.
    fn evaluate_challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError>;

    fn is_complete(&self) -> bool;

    /// Query a negotiated property. Fails with `IllegalState` before completion.
    fn negotiated_property(&self, name: &str) -> Result<Option<NegotiatedProperty<'_>>, SaslError>;

    /// Security-layer framing. These mechanisms never negotiate one.
    fn wrap(&mut self, outgoing: &[u8]) -> Result<Vec<u8>, SaslError>;

    /// Security-layer unframing. These mechanisms never negotiate one.
    fn unwrap(&mut self, incoming: &[u8]) -> Result<Vec<u8>, SaslError>;
}

/// The shared state machine. `R` supplies the mechanism-specific response.
pub struct OneShotClient<R> {
    response: R,
    callback: Box<dyn NameCallback>,
    state: ExchangeState,
}

impl<R: InitialResponse> OneShotClient<R> {
    pub fn new(response: R, callback: impl NameCallback + 'static) -> Self {
        Self {
            response,
            callback: Box::new(callback),
            state: ExchangeState::NotStarted,
        }
    }

    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    /// Email returned by the callback, once the exchange has completed.
    pub fn resolved_email(&self) -> Option<&str> {
        match &self.state {
            ExchangeState::Completed { email } => Some(email),
            ExchangeState::NotStarted => None,
        }
    }

    pub fn response(&self) -> &R {
        &self.response
    }
}

impl<R: InitialResponse> SaslClient for OneShotClient<R> {
    fn mechanism_name(&self) -> &'static str {
        self.response.mechanism().name()
    }

    fn has_initial_response(&self) -> bool {
        self.response.mechanism().has_initial_response()
    }

    fn evaluate_challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        if let ExchangeState::Completed { .. } = self.state {
            if !challenge.is_empty() {
                debug!(
                    mechanism = self.mechanism_name(),
                    len = challenge.len(),
                    "server data after completion, answering empty"
                );
            }
            return Ok(Vec::new());
        }

        self.response.check_initial_challenge(challenge)?;
        let email = self.callback.name()?;
        let bytes = self.response.build(&email)?;
        debug!(mechanism = self.mechanism_name(), %email, "initial response built");
        self.state = ExchangeState::Completed { email };
        Ok(bytes)
    }

    fn is_complete(&self) -> bool {
        matches!(self.state, ExchangeState::Completed { .. })
    }

    fn negotiated_property(&self, name: &str) -> Result<Option<NegotiatedProperty<'_>>, SaslError> {
        let email = match &self.state {
            ExchangeState::Completed { email } => email.as_str(),
            ExchangeState::NotStarted => {
                return Err(SaslError::IllegalState("SASL exchange not complete"))
            }
        };
        let value = match name {
            property::EMAIL => Some(NegotiatedProperty::Email(email)),
            property::MECHANISM_NAME => {
                Some(NegotiatedProperty::MechanismName(self.mechanism_name()))
            }
            property::OAUTH_TOKEN => {
                Some(NegotiatedProperty::OAuthToken(self.response.oauth_token()))
            }
            property::CALLBACK_HANDLER => {
                Some(NegotiatedProperty::CallbackHandler(self.callback.as_ref()))
            }
            _ => None,
        };
        Ok(value)
    }

    fn wrap(&mut self, _outgoing: &[u8]) -> Result<Vec<u8>, SaslError> {
        Err(SaslError::ProtocolViolation(format!(
            "{} has no security layer to wrap",
            self.mechanism_name()
        )))
    }

    fn unwrap(&mut self, _incoming: &[u8]) -> Result<Vec<u8>, SaslError> {
        Err(SaslError::ProtocolViolation(format!(
            "{} has no security layer to unwrap",
            self.mechanism_name()
        )))
    }
}

impl<R> fmt::Debug for OneShotClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShotClient")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
