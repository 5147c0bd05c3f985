/*
 * factory.rs
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

//! Mechanism selection. The caller builds the client here and hands it to the transport;
//! there is no process-wide registry.

use std::collections::HashMap;

use tracing::debug;

use super::{
    Credential, NameCallback, Protocol, SaslClient, SaslMechanism, XOAuth2Response,
    XoauthResponse,
};

/// Mechanism names this crate can create clients for.
pub fn mechanism_names() -> [&'static str; 2] {
    [SaslMechanism::XOAuth2.name(), SaslMechanism::XOAuth.name()]
}

/// Mechanism chosen from a request list, with the protocol XOAUTH signs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    XOAuth2,
    XOAuth(Protocol),
}

impl Selection {
    fn mechanism(self) -> SaslMechanism {
        match self {
            Selection::XOAuth2 => SaslMechanism::XOAuth2,
            Selection::XOAuth(_) => SaslMechanism::XOAuth,
        }
    }
}

fn select<S: AsRef<str>>(mechanisms: &[S], protocol_hint: &str) -> Option<Selection> {
    mechanisms
        .iter()
        .find_map(|requested| match SaslMechanism::from_name(requested.as_ref())? {
            SaslMechanism::XOAuth2 => Some(Selection::XOAuth2),
            SaslMechanism::XOAuth => match Protocol::from_hint(protocol_hint) {
                Some(protocol) => Some(Selection::XOAuth(protocol)),
                None => {
                    debug!(protocol_hint, "XOAUTH requested for unsupported protocol");
                    None
                }
            },
        })
}

fn build<C>(selection: Selection, credential: &Credential, callback: C) -> Box<dyn SaslClient>
where
    C: NameCallback + 'static,
{
    match selection {
        Selection::XOAuth2 => {
            debug!("selected XOAUTH2");
            let response = XOAuth2Response::new(credential.oauth_token());
            Box::new(response.into_client(callback))
        }
        Selection::XOAuth(protocol) => {
            debug!(%protocol, "selected XOAUTH");
            let response = XoauthResponse::new(
                protocol,
                credential.oauth_token(),
                credential.oauth_token_secret().unwrap_or_default(),
                credential.consumer(),
            );
            Box::new(response.into_client(callback))
        }
    }
}

/// Create a client for the first supported entry of `mechanisms`.
///
/// XOAUTH2 ignores `protocol_hint`. XOAUTH needs it to be `imaps` or `smtp`; otherwise that
/// entry is skipped. Returns `None` when nothing matches.
pub fn create_client<S, C>(
    mechanisms: &[S],
    protocol_hint: &str,
    credential: &Credential,
    callback: C,
) -> Option<Box<dyn SaslClient>>
where
    S: AsRef<str>,
    C: NameCallback + 'static,
{
    let selection = select(mechanisms, protocol_hint)?;
    Some(build(selection, credential, callback))
}

/// `create_client` with token material read from a property map (see `props`). Only the
/// keys of the selected mechanism are read. The email always comes from `callback`.
pub fn create_client_from_props<S, C>(
    mechanisms: &[S],
    protocol_hint: &str,
    props: &HashMap<String, String>,
    callback: C,
) -> Option<Box<dyn SaslClient>>
where
    S: AsRef<str>,
    C: NameCallback + 'static,
{
    let selection = select(mechanisms, protocol_hint)?;
    let credential = Credential::from_props("", selection.mechanism(), props);
    Some(build(selection, &credential, callback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sasl::FixedName;

    fn credential() -> Credential {
        Credential::new("oauth@gmail.com", "ya29.abc").with_token_secret("secret")
    }

    fn create(mechanisms: &[&str], hint: &str) -> Option<Box<dyn SaslClient>> {
        let c = credential();
        let cb = c.name_callback();
        create_client(mechanisms, hint, &c, cb)
    }

    #[test]
    fn xoauth2_selected() {
        let mut client = create(&["XOAUTH2"], "imaps").expect("client");
        assert_eq!(client.mechanism_name(), "XOAUTH2");
        let out = client.evaluate_challenge(b"").unwrap();
        assert_eq!(out, b"user=oauth@gmail.com\x01auth=Bearer ya29.abc\x01\x01".to_vec());
    }

    #[test]
    fn plain_not_supported() {
        assert!(create(&["PLAIN"], "imaps").is_none());
        assert!(create(&[], "imaps").is_none());
    }

    #[test]
    fn case_insensitive_match() {
        assert!(create(&["xoauth2"], "smtp").is_some());
        assert_eq!(create(&["xOAuth"], "smtp").unwrap().mechanism_name(), "XOAUTH");
        assert!(create(&[" XOAUTH2"], "smtp").is_none());
    }

    #[test]
    fn xoauth_needs_known_protocol() {
        assert!(create(&["XOAUTH"], "imaps").is_some());
        assert!(create(&["XOAUTH"], "SMTP").is_some());
        assert!(create(&["XOAUTH"], "imap").is_none());
        assert!(create(&["XOAUTH"], "pop3").is_none());
    }

    #[test]
    fn first_supported_entry_wins() {
        let client = create(&["PLAIN", "XOAUTH", "XOAUTH2"], "imaps").unwrap();
        assert_eq!(client.mechanism_name(), "XOAUTH");
        let client = create(&["XOAUTH", "XOAUTH2"], "pop3").unwrap();
        assert_eq!(client.mechanism_name(), "XOAUTH2");
    }

    #[test]
    fn accepts_owned_names_and_custom_callback() {
        let names = vec!["XOAUTH2".to_string()];
        let cb = FixedName::new("other@gmail.com");
        let mut client = create_client(&names, "", &credential(), cb).unwrap();
        let out = client.evaluate_challenge(b"").unwrap();
        assert!(out.starts_with(b"user=other@gmail.com\x01"));
    }

    fn token_props() -> HashMap<String, String> {
        [
            (crate::sasl::props::OAUTH2_TOKEN, "ya29.oauth2"),
            (crate::sasl::props::XOAUTH_TOKEN, "1/legacy"),
            (crate::sasl::props::XOAUTH_TOKEN_SECRET, "sec"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn respond(client: Option<Box<dyn SaslClient>>) -> String {
        let mut client = client.expect("client");
        String::from_utf8(client.evaluate_challenge(b"").unwrap()).unwrap()
    }

    #[test]
    fn from_props_map() {
        let map = token_props();
        let cb = FixedName::new("x@gmail.com");
        let out = respond(create_client_from_props(&["XOAUTH"], "smtp", &map, cb));
        assert!(out.starts_with("GET https://mail.google.com/mail/b/x@gmail.com/smtp/ "));
        assert!(create_client_from_props(&["PLAIN"], "smtp", &map, FixedName::new("x")).is_none());
    }

    #[test]
    fn from_props_signs_xoauth_with_xoauth_token() {
        let map = token_props();
        let cb = FixedName::new("x@gmail.com");
        let out = respond(create_client_from_props(&["XOAUTH"], "imaps", &map, cb));
        assert!(out.contains("oauth_token=\"1%2Flegacy\""));
        assert!(!out.contains("ya29"));
    }

    #[test]
    fn from_props_xoauth2_uses_oauth2_token() {
        let map = token_props();
        let cb = FixedName::new("x@gmail.com");
        let out = respond(create_client_from_props(&["XOAUTH2"], "imaps", &map, cb));
        assert_eq!(out, "user=x@gmail.com\x01auth=Bearer ya29.oauth2\x01\x01");
    }

    #[test]
    fn from_props_skipped_xoauth_falls_through_to_xoauth2() {
        let map = token_props();
        let cb = FixedName::new("x@gmail.com");
        let out = respond(create_client_from_props(&["XOAUTH", "XOAUTH2"], "pop3", &map, cb));
        assert!(out.ends_with("auth=Bearer ya29.oauth2\x01\x01"));
    }

    #[test]
    fn names_listed() {
        assert_eq!(mechanism_names(), ["XOAUTH2", "XOAUTH"]);
    }
}
