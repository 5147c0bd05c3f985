/*
 * lib.rs
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

//! SASL XOAUTH2 / XOAUTH client responses for IMAP and SMTP.
//!
//! - `sasl`: response builders, the one-shot client state machine, mechanism selection
//! - `oauth`: OAuth 1.0a consumer and HMAC-SHA1 request signing (legacy XOAUTH only)
//! - `protocol`: minimal IMAP AUTHENTICATE and SMTP AUTH drivers
//! - `net`: TLS connection helpers

pub mod net;
pub mod oauth;
pub mod protocol;
pub mod sasl;
pub mod uri;
