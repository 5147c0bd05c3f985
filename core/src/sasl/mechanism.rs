/*
 * mechanism.rs
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

//! SASL mechanism names.

/// Supported SASL mechanisms (client-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaslMechanism {
    /// XOAUTH2 – OAuth2 bearer token (Gmail, Outlook). Single-shot, no challenge.
    XOAuth2,
    /// XOAUTH – OAuth 1.0a signed request. Historical; Gmail no longer accepts it.
    XOAuth,
}

impl SaslMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            SaslMechanism::XOAuth2 => "XOAUTH2",
            SaslMechanism::XOAuth => "XOAUTH",
        }
    }

    /// Both mechanisms send their credential before any server challenge.
    pub fn has_initial_response(&self) -> bool {
        true
    }

    /// Exact, case-insensitive match. "XOAUTH2" never matches XOAUTH and vice versa.
    pub fn from_name(name: &str) -> Option<Self> {
        [SaslMechanism::XOAuth2, SaslMechanism::XOAuth]
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(SaslMechanism::from_name("xoauth2"), Some(SaslMechanism::XOAuth2));
        assert_eq!(SaslMechanism::from_name("XOauth"), Some(SaslMechanism::XOAuth));
    }

    #[test]
    fn from_name_does_not_trim() {
        assert_eq!(SaslMechanism::from_name(" XOAUTH2 "), None);
        assert_eq!(SaslMechanism::from_name("XOAUTH\r"), None);
    }

    #[test]
    fn from_name_rejects_others() {
        assert_eq!(SaslMechanism::from_name("PLAIN"), None);
        assert_eq!(SaslMechanism::from_name("XOAUTH3"), None);
        assert_eq!(SaslMechanism::from_name(""), None);
    }

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(SaslMechanism::XOAuth2.to_string(), "XOAUTH2");
        assert_eq!(SaslMechanism::XOAuth.to_string(), "XOAUTH");
    }
}
