use serde::Serialize;
use std::fmt;
use std::io::Write;
use tracing::{debug, error};

use crate::client::LdapClient;
use crate::entry::LdapEntry;
use crate::filter::{escape_filter_value, parse_filter};
use crate::LdapError;

const PLACEHOLDER: &str = "{0}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    Users,
    Groups,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Users => write!(f, "users"),
            LookupKind::Groups => write!(f, "groups"),
        }
    }
}

/// A search filter with `{0}` standing in for the lookup token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTemplate(String);

impl FilterTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        FilterTemplate(template.into())
    }

    /// Substitute `token` for every placeholder. The token is inserted
    /// verbatim unless `escape` is set.
    pub fn render(&self, token: &str, escape: bool) -> String {
        if escape {
            self.0.replace(PLACEHOLDER, &escape_filter_value(token))
        } else {
            self.0.replace(PLACEHOLDER, token)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lookup {
    pub kind: LookupKind,
    pub filter: String,
    pub entries: Vec<LdapEntry>,
}

pub async fn run_lookup(
    client: &mut LdapClient,
    kind: LookupKind,
    template: &FilterTemplate,
    token: &str,
    escape: bool,
) -> Result<Lookup, LdapError> {
    let filter = template.render(token, escape);
    debug!("Looking up {} with filter: {}", kind, filter);

    let entries = client.search(parse_filter(&filter)?).await?;

    Ok(Lookup {
        kind,
        filter,
        entries,
    })
}

fn output_error(e: std::io::Error) -> LdapError {
    error!(?e, "Unable to write output");
    LdapError::OutputError
}

/// Write the human readable report for one lookup.
pub fn write_report<W: Write>(
    out: &mut W,
    lookup: &Lookup,
    print_attributes: bool,
) -> Result<(), LdapError> {
    writeln!(
        out,
        "\n# Number of {} found : {}",
        lookup.kind,
        lookup.entries.len()
    )
    .map_err(output_error)?;

    if print_attributes {
        for entry in &lookup.entries {
            writeln!(out, "\ndn: {}", entry.dn).map_err(output_error)?;
            for (name, values) in &entry.attrs {
                for value in values {
                    writeln!(out, "{}: {}", name, value).map_err(output_error)?;
                }
            }
        }
    }

    out.flush().map_err(output_error)
}

pub fn write_json<W: Write>(out: &mut W, lookup: &Lookup) -> Result<(), LdapError> {
    serde_json::to_writer_pretty(&mut *out, lookup).map_err(|e| {
        error!(?e, "Unable to serialise lookup");
        LdapError::OutputError
    })?;
    writeln!(out).map_err(output_error)?;
    out.flush().map_err(output_error)
}
