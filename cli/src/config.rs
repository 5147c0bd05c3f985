/*
 * config.rs
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

//! Optional JSON config file and the merged connection settings.
//!
//! Precedence: command-line flag (or its environment variable), then the file, then the
//! built-in Gmail defaults.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use oauthsasl_core::protocol::imap::IMAPS_PORT;
use oauthsasl_core::protocol::smtp::{SUBMISSIONS_PORT, SUBMISSION_PORT};
use serde::Deserialize;
use tracing::debug;

use crate::args::ConnectionArgs;
use crate::error::CliError;

pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const APP_DIR: &str = "oauthsasl";
const CONFIG_FILE: &str = "config.json";
const LEGACY_FILE: &str = ".oauthsasl.json";

/// Contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub imap_host: Option<String>,
    pub imap_port: Option<u16>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, CliError> {
        serde_json::from_str(json).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &json)
    }

    /// Consumer key and secret, only when both are present.
    pub fn consumer(&self) -> Option<(String, String)> {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(k), Some(s)) => Some((k.clone(), s.clone())),
            _ => None,
        }
    }
}

/// Default locations in lookup order, from `XDG_CONFIG_HOME` and `HOME`.
pub fn candidate_paths(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(xdg) = xdg_config_home.filter(|v| !v.is_empty()) {
        paths.push(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
    }
    if let Some(home) = home.filter(|v| !v.is_empty()) {
        let home = PathBuf::from(home);
        paths.push(home.join(".config").join(APP_DIR).join(CONFIG_FILE));
        paths.push(home.join(LEGACY_FILE));
    }
    paths
}

/// Load the file named by `--config` (which must exist), else the first default location
/// that exists, else an empty config.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, CliError> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return FileConfig::load(path);
    }
    let candidates = candidate_paths(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    );
    match candidates.iter().find(|p| p.is_file()) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            FileConfig::load(path)
        }
        None => {
            debug!("no config file found, using defaults");
            Ok(FileConfig::default())
        }
    }
}

/// Connection settings after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub timeout: Duration,
}

impl Settings {
    pub fn resolve(flags: &ConnectionArgs, file: &FileConfig) -> Self {
        Self {
            imap_host: flags
                .imap_host
                .clone()
                .or_else(|| file.imap_host.clone())
                .unwrap_or_else(|| DEFAULT_IMAP_HOST.to_string()),
            imap_port: flags.imap_port.or(file.imap_port).unwrap_or(IMAPS_PORT),
            smtp_host: flags
                .smtp_host
                .clone()
                .or_else(|| file.smtp_host.clone())
                .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: flags.smtp_port.or(file.smtp_port).unwrap_or(SUBMISSION_PORT),
            timeout: Duration::from_secs(
                flags
                    .timeout
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// SMTP over implicit TLS on the submissions port, STARTTLS elsewhere.
    pub fn smtp_implicit_tls(&self) -> bool {
        self.smtp_port == SUBMISSIONS_PORT
    }
}
