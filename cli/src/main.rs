/*
 * main.rs
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

//! `oauthsasl`: authenticate to IMAP and then SMTP with XOAUTH2 or legacy XOAUTH, or print
//! the initial client response.

mod args;
mod config;
mod error;

use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;
use oauthsasl_core::protocol::{imap, smtp};
use oauthsasl_core::sasl::{create_client, Credential, SaslClient, SaslMechanism};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command, ConsumerArgs, ProtocolArg, ResponseCommand};
use crate::config::{load_config, FileConfig, Settings};
use crate::error::CliError;

const EHLO_NAME: &str = "localhost";
const IMAP_HINT: &str = "imaps";
const SMTP_HINT: &str = "smtp";

/// Logs go to stderr so stdout carries only results. `--debug` forces `trace`;
/// otherwise `RUST_LOG` applies, defaulting to `info`.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn client_for(
    mechanism: SaslMechanism,
    hint: &'static str,
    credential: &Credential,
) -> Result<Box<dyn SaslClient>, CliError> {
    create_client(&[mechanism.name()], hint, credential, credential.name_callback()).ok_or(
        CliError::NoClient {
            mechanism: mechanism.name(),
            protocol: hint,
        },
    )
}

fn with_consumer(credential: Credential, cli: &ConsumerArgs, file: &FileConfig) -> Credential {
    match cli.pair().or_else(|| file.consumer()) {
        Some((key, secret)) => credential.with_consumer(key, secret),
        None => credential,
    }
}

async fn with_timeout<T, E, F>(
    service: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, CliError>
where
    F: Future<Output = Result<T, E>>,
    CliError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(CliError::from),
        Err(_) => Err(CliError::Timeout {
            service,
            secs: limit.as_secs(),
        }),
    }
}

/// IMAP first, then SMTP, each with its own one-shot client.
async fn authenticate_both(
    mechanism: SaslMechanism,
    credential: &Credential,
    settings: &Settings,
) -> Result<(), CliError> {
    let mut client = client_for(mechanism, IMAP_HINT, credential)?;
    with_timeout("IMAP", settings.timeout, async {
        let session =
            imap::connect_and_authenticate(&settings.imap_host, settings.imap_port, client.as_mut())
                .await?;
        session.logout().await
    })
    .await?;
    println!("Successfully authenticated to IMAP.");
    println!();

    let mut client = client_for(mechanism, SMTP_HINT, credential)?;
    with_timeout("SMTP", settings.timeout, async {
        let session = smtp::connect_and_authenticate(
            &settings.smtp_host,
            settings.smtp_port,
            settings.smtp_implicit_tls(),
            EHLO_NAME,
            client.as_mut(),
        )
        .await?;
        session.quit().await
    })
    .await?;
    println!("Successfully authenticated to SMTP.");
    Ok(())
}

/// Base64 of the first client message, as it would appear on the AUTHENTICATE / AUTH line.
fn print_response(
    mechanism: SaslMechanism,
    hint: &'static str,
    credential: &Credential,
) -> Result<(), CliError> {
    let mut client = client_for(mechanism, hint, credential)?;
    let initial = client.evaluate_challenge(&[])?;
    println!("{}", STANDARD.encode(initial));
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Response(ResponseCommand::Xoauth2 { email, oauth_token }) => {
            print_response(SaslMechanism::XOAuth2, IMAP_HINT, &Credential::new(email, oauth_token))
        }
        Command::Response(ResponseCommand::Xoauth {
            protocol,
            email,
            oauth_token,
            oauth_token_secret,
            consumer,
        }) => {
            let file = load_config(cli.config.as_deref())?;
            let credential = with_consumer(
                Credential::new(email, oauth_token).with_token_secret(oauth_token_secret),
                &consumer,
                &file,
            );
            let hint = match protocol {
                ProtocolArg::Imap => IMAP_HINT,
                ProtocolArg::Smtp => SMTP_HINT,
            };
            print_response(SaslMechanism::XOAuth, hint, &credential)
        }
        Command::Xoauth2 { email, oauth_token } => {
            let file = load_config(cli.config.as_deref())?;
            let settings = Settings::resolve(&cli.connection, &file);
            debug!(?settings, "resolved settings");
            let credential = Credential::new(email, oauth_token);
            authenticate_both(SaslMechanism::XOAuth2, &credential, &settings).await
        }
        Command::Xoauth {
            email,
            oauth_token,
            oauth_token_secret,
            consumer,
        } => {
            let file = load_config(cli.config.as_deref())?;
            let settings = Settings::resolve(&cli.connection, &file);
            debug!(?settings, "resolved settings");
            let credential = with_consumer(
                Credential::new(email, oauth_token).with_token_secret(oauth_token_secret),
                &consumer,
                &file,
            );
            info!("XOAUTH is Google's retired OAuth 1.0a mechanism; prefer XOAUTH2");
            authenticate_both(SaslMechanism::XOAuth, &credential, &settings).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
