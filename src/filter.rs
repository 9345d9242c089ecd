use ldap3_proto::parse_ldap_filter_str;
use ldap3_proto::proto::LdapFilter;
use tracing::{error, trace};

use crate::LdapError;

/// Parse an RFC 4515 string filter, as supplied by the operator, into the
/// form sent on the wire.
pub fn parse_filter(f: &str) -> Result<LdapFilter, LdapError> {
    parse_ldap_filter_str(f.trim())
        .map(|lf| {
            trace!(?lf, "parsed filter");
            lf
        })
        .map_err(|e| {
            error!("Unable to parse filter {} - {:?}", f, e);
            LdapError::FilterParseError
        })
}

/// Escape the characters that carry meaning inside a filter value.
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(a: &str, v: &str) -> LdapFilter {
        LdapFilter::Equality(a.to_string(), v.to_string())
    }

    #[test]
    fn test_parse_default_templates() {
        assert_eq!(
            parse_filter("(&(uid=*)(objectClass=inetOrgPerson))"),
            Ok(LdapFilter::And(vec![
                LdapFilter::Present("uid".to_string()),
                eq("objectClass", "inetOrgPerson"),
            ]))
        );
        assert_eq!(
            parse_filter("(&(cn=admins)(objectClass=groupOfUniqueNames))"),
            Ok(LdapFilter::And(vec![
                eq("cn", "admins"),
                eq("objectClass", "groupOfUniqueNames"),
            ]))
        );
    }

    #[test]
    fn test_parse_nested() {
        assert_eq!(
            parse_filter("(|(uid=a)(!(uid=b)))"),
            Ok(LdapFilter::Or(vec![
                eq("uid", "a"),
                LdapFilter::Not(Box::new(eq("uid", "b"))),
            ]))
        );
        assert_eq!(parse_filter("  (uid=a)\n"), Ok(eq("uid", "a")));
    }

    #[test]
    fn test_parse_operator_templates() {
        // Any item type the directory understands must pass through.
        for f in [
            "(&(uid=*)(uidNumber>=1000))",
            "(uidNumber<=5000)",
            "(cn~=bob)",
            "(cn=jo*)",
            "(cn=a*x*z)",
        ] {
            assert!(parse_filter(f).is_ok(), "{}", f);
        }
        assert!(matches!(
            parse_filter("(cn=a*x*z)"),
            Ok(LdapFilter::Substring(a, _)) if a == "cn"
        ));
    }

    #[test]
    fn test_parse_invalid() {
        for f in ["", "(", "(uid=a", "(uid=a))", "(&(uid=a)", "(=bob)"] {
            assert_eq!(parse_filter(f), Err(LdapError::FilterParseError), "{}", f);
        }
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("alice"), "alice");
        assert_eq!(escape_filter_value("*"), "\\2a");
        assert_eq!(escape_filter_value("a)(uid=*"), "a\\29\\28uid=\\2a");
        assert_eq!(escape_filter_value("c:\\tmp"), "c:\\5ctmp");
        assert_eq!(escape_filter_value("a\0b"), "a\\00b");

        // An escaped value stays a single equality item.
        let rendered = format!("(uid={})", escape_filter_value("x)(|(uid=*"));
        assert!(matches!(
            parse_filter(&rendered),
            Ok(LdapFilter::Equality(a, _)) if a == "uid"
        ));
    }
}
