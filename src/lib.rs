#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

//! Building blocks for the `ldap_lookup` command line utility. A single
//! authenticated connection is used to run a users search and a groups search
//! rendered from filter templates.

use serde::{Deserialize, Serialize};
use std::fmt;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

pub use std::time::Duration;
pub use tracing::{debug, error, info, trace, warn};

mod client;
mod entry;
mod filter;
mod lookup;

pub use crate::client::LdapClient;
pub use crate::entry::{AttrValue, LdapEntry};
pub use crate::filter::{escape_filter_value, parse_filter};
pub use crate::lookup::{
    run_lookup, write_json, write_report, FilterTemplate, Lookup, LookupKind,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LdapError {
    InvalidUrl,
    ResolverError,
    ConnectError,
    TlsError,
    TransportWriteError,
    TransportReadError,
    InvalidProtocolState,
    InvalidCredentials,
    BindFailed,
    FilterParseError,
    SearchFailed,
    PasswordNotFound,
    AnonymousInvalidState,
    OutputError,
}

impl fmt::Display for LdapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LdapError::InvalidUrl => write!(f, "Invalid URL"),
            LdapError::ResolverError => write!(f, "Failed to resolve hostname"),
            LdapError::ConnectError => write!(f, "Failed to connect to host"),
            LdapError::TlsError => write!(f, "Failed to establish TLS"),
            LdapError::TransportWriteError => write!(f, "Failed to write to transport"),
            LdapError::TransportReadError => write!(f, "Failed to read from transport"),
            LdapError::InvalidProtocolState => {
                write!(f, "The LDAP server sent a response we did not expect")
            }
            LdapError::InvalidCredentials => write!(f, "Invalid credentials"),
            LdapError::BindFailed => write!(f, "The server refused the bind"),
            LdapError::FilterParseError => write!(f, "Invalid search filter"),
            LdapError::SearchFailed => write!(f, "The search did not complete successfully"),
            LdapError::PasswordNotFound => write!(f, "No password was provided"),
            LdapError::AnonymousInvalidState => {
                write!(f, "A password was provided without a bind dn")
            }
            LdapError::OutputError => write!(f, "Failed to write the report"),
        }
    }
}

impl std::error::Error for LdapError {}

/// Install the stderr tracing subscriber. `verbose` raises this crate to
/// debug, otherwise `RUST_LOG` applies, defaulting to warnings only.
pub fn start_tracing(verbose: bool) {
    let fmt_layer = tracing_fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let filter_layer = if verbose {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse_lossy("ldaplookup=debug,ldap_lookup=debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(f) => f,
            Err(_) => EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy(""),
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
