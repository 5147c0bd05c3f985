/*
 * callback.rs
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

//! Identity callback: asks the caller which account (email address) to authenticate.

use std::io;

/// Why the identity callback could not produce a name.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The caller does not handle name requests.
    #[error("unsupported callback: {0}")]
    Unsupported(String),

    /// Reaching the caller failed.
    #[error("failed to execute callback: {0}")]
    Io(#[from] io::Error),
}

/// Supplies the authenticating identity. Called once per exchange.
pub trait NameCallback: Send {
    fn name(&mut self) -> Result<String, CallbackError>;
}

impl<F> NameCallback for F
where
    F: FnMut() -> Result<String, CallbackError> + Send,
{
    fn name(&mut self) -> Result<String, CallbackError> {
        self()
    }
}

/// Callback that always answers with the same email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedName(pub String);

impl FixedName {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }
}

impl NameCallback for FixedName {
    fn name(&mut self) -> Result<String, CallbackError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_name_repeats() {
        let mut cb = FixedName::new("oauth@gmail.com");
        assert_eq!(cb.name().unwrap(), "oauth@gmail.com");
        assert_eq!(cb.name().unwrap(), "oauth@gmail.com");
    }

    #[test]
    fn closure_is_a_callback() {
        let mut calls = 0;
        let mut cb = move || {
            calls += 1;
            Ok::<_, CallbackError>(format!("user{}@example.com", calls))
        };
        assert_eq!(NameCallback::name(&mut cb).unwrap(), "user1@example.com");
    }

    #[test]
    fn closure_error_propagates() {
        let mut cb = || -> Result<String, CallbackError> {
            Err(CallbackError::Unsupported("NameCallback".into()))
        };
        let err = NameCallback::name(&mut cb).unwrap_err();
        assert!(err.to_string().contains("unsupported callback"));
    }
}
