/*
 * signature.rs
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

//! HMAC-SHA1 signatures (RFC 5849 §3.4).
//!
//! 1. Percent-encode every parameter name and value, sort by name then value, join
//!    `name=value` pairs with `&`.
//! 2. Base string: `METHOD&enc(url)&enc(parameters)`.
//! 3. Key: `enc(consumer_secret)&enc(token_secret)`; signature is base64(HMAC-SHA1).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;

use super::{SigningError, OAUTH_SIGNATURE};

type HmacSha1 = Hmac<Sha1>;

/// RFC 5849 §3.6: everything except the unreserved set `ALPHA DIGIT - . _ ~`.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode per RFC 5849 §3.6 (UTF-8, uppercase hex).
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Normalized request parameters (§3.4.1.3.2).
pub fn normalized_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| k != OAUTH_SIGNATURE)
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signature base string (§3.4.1). `url` must already be normalized (no query, no fragment).
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&normalized_parameters(params))
    )
}

/// base64(HMAC-SHA1(key, base_string)) with key `enc(consumer_secret)&enc(token_secret)`.
pub fn hmac_sha1_signature(
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, SigningError> {
    let key = format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| SigningError::InvalidKey)?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Sign `params` for `method url` and append `oauth_signature` (replacing any previous one).
pub fn sign_request(
    method: &str,
    url: &str,
    params: &mut Vec<(String, String)>,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<(), SigningError> {
    params.retain(|(k, _)| k != OAUTH_SIGNATURE);
    let base = signature_base_string(method, url, params);
    let signature = hmac_sha1_signature(&base, consumer_secret, token_secret)?;
    params.push((OAUTH_SIGNATURE.to_string(), signature));
    Ok(())
}
