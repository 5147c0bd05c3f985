/*
 * error.rs
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

use std::io;
use std::path::PathBuf;

use oauthsasl_core::protocol::imap::ImapClientError;
use oauthsasl_core::protocol::smtp::SmtpClientError;
use oauthsasl_core::sasl::SaslError;
use thiserror::Error;

/// Top-level CLI error. Display includes the underlying cause.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot create a {mechanism} client for {protocol}")]
    NoClient {
        mechanism: &'static str,
        protocol: &'static str,
    },
    #[error(transparent)]
    Sasl(#[from] SaslError),
    #[error("IMAP: {0}")]
    Imap(#[from] ImapClientError),
    #[error("SMTP: {0}")]
    Smtp(#[from] SmtpClientError),
    #[error("{service} timed out after {secs}s")]
    Timeout { service: &'static str, secs: u64 },
}
