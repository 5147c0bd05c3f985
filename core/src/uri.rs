/*
 * uri.rs
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

//! Synthetic request URL signed by the legacy XOAUTH mechanism:
//! `https://mail.google.com/mail/b/{email}/{protocol}/`. The email is placed in the path
//! as-is (the signature base string encodes it), so it must be a valid path segment.

use crate::oauth::SigningError;

const XOAUTH_URL_PREFIX: &str = "https://mail.google.com/mail/b/";

/// Characters that would end or corrupt a path segment if left raw.
fn is_forbidden_in_segment(c: char) -> bool {
    c.is_control()
        || c.is_whitespace()
        || matches!(
            c,
            '/' | '?' | '#' | '%' | '"' | '<' | '>' | '\\' | '^' | '`' | '{' | '|' | '}' | '[' | ']'
        )
}

fn check_path_segment(what: &str, segment: &str) -> Result<(), SigningError> {
    match segment.chars().find(|&c| is_forbidden_in_segment(c)) {
        Some(c) => Err(SigningError::InvalidUrl(format!(
            "{} contains {:?}, not allowed in a URL path segment",
            what, c
        ))),
        None => Ok(()),
    }
}

/// XOAUTH request URL for `email` and the protocol token (`imap` or `smtp`).
pub fn xoauth_request_url(email: &str, protocol_name: &str) -> Result<String, SigningError> {
    check_path_segment("email", email)?;
    check_path_segment("protocol", protocol_name)?;
    if protocol_name.is_empty() {
        return Err(SigningError::InvalidUrl("empty protocol name".to_string()));
    }
    Ok(format!("{}{}/{}/", XOAUTH_URL_PREFIX, email, protocol_name))
}
