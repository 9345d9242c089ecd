use base64::{engine::general_purpose, Engine as _};
use ldap3_proto::proto::LdapSearchResultEntry;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// Attributes whose values are always treated as binary, regardless of
// whether the bytes happen to be valid utf8.
const BINARY_ATTRIBUTES: &[&str] = &[
    "audio",
    "authorityrevocationlist",
    "cacertificate",
    "certificaterevocationlist",
    "crosscertificatepair",
    "javaserializeddata",
    "jpegphoto",
    "objectguid",
    "objectsid",
    "personalsignature",
    "photo",
    "thumbnaillogo",
    "thumbnailphoto",
    "usercertificate",
    "userpassword",
    "x500uniqueidentifier",
];

fn is_binary_attribute(atype: &str) -> bool {
    let mut parts = atype.split(';');
    let base = parts.next().unwrap_or_default().to_ascii_lowercase();
    parts.any(|opt| opt.eq_ignore_ascii_case("binary"))
        || BINARY_ATTRIBUTES.contains(&base.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrValue {
    Text(String),
    Binary(#[serde(serialize_with = "serialize_base64")] Vec<u8>),
}

#[allow(clippy::ptr_arg)]
fn serialize_base64<S: Serializer>(v: &Vec<u8>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&general_purpose::STANDARD.encode(v))
}

impl AttrValue {
    pub fn new(atype: &str, value: Vec<u8>) -> Self {
        if is_binary_attribute(atype) {
            return AttrValue::Binary(value);
        }
        match String::from_utf8(value) {
            Ok(s) => AttrValue::Text(s),
            Err(e) => AttrValue::Binary(e.into_bytes()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Binary(b) => f.write_str(&general_purpose::STANDARD.encode(b)),
        }
    }
}

/// A search result. Attributes iterate in lexicographic order of their
/// names, and every name appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdapEntry {
    pub dn: String,
    pub attrs: BTreeMap<String, Vec<AttrValue>>,
}

impl From<LdapSearchResultEntry> for LdapEntry {
    fn from(entry: LdapSearchResultEntry) -> Self {
        let mut attrs: BTreeMap<String, Vec<AttrValue>> = BTreeMap::new();
        for attr in entry.attributes {
            let values = attr
                .vals
                .into_iter()
                .map(|v| AttrValue::new(&attr.atype, v));
            attrs.entry(attr.atype.clone()).or_default().extend(values);
        }
        LdapEntry {
            dn: entry.dn,
            attrs,
        }
    }
}
