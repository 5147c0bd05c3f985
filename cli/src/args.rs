/*
 * args.rs
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

//! Command-line arguments. Connection options are `Option` so that an unset flag falls
//! through to the config file and then to the built-in default.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "oauthsasl",
    version,
    about = "Authenticate to IMAP and SMTP with XOAUTH2 or legacy XOAUTH"
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// JSON config file (default: $XDG_CONFIG_HOME/oauthsasl/config.json)
    #[arg(long, global = true, env = "OAUTHSASL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log every protocol step (credentials stay redacted)
    #[arg(long, global = true, env = "OAUTHSASL_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// IMAP server (implicit TLS) [default: imap.gmail.com]
    #[arg(long, global = true, env = "OAUTHSASL_IMAP_HOST")]
    pub imap_host: Option<String>,

    /// IMAP port [default: 993]
    #[arg(long, global = true, env = "OAUTHSASL_IMAP_PORT")]
    pub imap_port: Option<u16>,

    /// SMTP server [default: smtp.gmail.com]
    #[arg(long, global = true, env = "OAUTHSASL_SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP port; 465 means implicit TLS, anything else STARTTLS [default: 587]
    #[arg(long, global = true, env = "OAUTHSASL_SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// Seconds allowed for each of the IMAP and SMTP exchanges [default: 30]
    #[arg(long, global = true, env = "OAUTHSASL_TIMEOUT")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConsumerArgs {
    /// OAuth 1.0a consumer key (anonymous when unset)
    #[arg(long, env = "OAUTHSASL_CONSUMER_KEY", requires = "consumer_secret")]
    pub consumer_key: Option<String>,

    /// OAuth 1.0a consumer secret
    #[arg(long, env = "OAUTHSASL_CONSUMER_SECRET", requires = "consumer_key")]
    pub consumer_secret: Option<String>,
}

impl ConsumerArgs {
    pub fn pair(&self) -> Option<(String, String)> {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(k), Some(s)) => Some((k.clone(), s.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate to IMAP then SMTP with an OAuth 2.0 access token
    Xoauth2 { email: String, oauth_token: String },
    /// Authenticate to IMAP then SMTP with an OAuth 1.0a token (legacy)
    Xoauth {
        email: String,
        oauth_token: String,
        oauth_token_secret: String,
        #[command(flatten)]
        consumer: ConsumerArgs,
    },
    /// Print the base64 initial client response without connecting
    #[command(subcommand)]
    Response(ResponseCommand),
}

#[derive(Debug, Subcommand)]
pub enum ResponseCommand {
    Xoauth2 { email: String, oauth_token: String },
    Xoauth {
        /// Which service URL to sign
        #[arg(long, value_enum, default_value_t = ProtocolArg::Imap)]
        protocol: ProtocolArg,
        email: String,
        oauth_token: String,
        oauth_token_secret: String,
        #[command(flatten)]
        consumer: ConsumerArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Imap,
    Smtp,
}
