
#[derive(Debug, StructOpt)]
#[structopt(
    author,
    name = "ldap_lookup",
    about = "Simple LDAP user and group lookup tool."
)]
struct LdapLookupOpt {
    #[structopt(short, long)]
    /// Debug traces.
    verbose: bool,

    #[structopt(short = "j", long = "json")]
    /// Emit results and errors as json.
    json: bool,

    #[structopt(short = "H", long = "ldapUrl", default_value = "ldap://localhost:1389")]
    /// URL of the LDAP server. The path of the url is the search base.
    url: url::Url,

    #[structopt(short = "B", long = "bindingDN", default_value = "cn=Directory Manager")]
    /// DN of binding user.
    bind_dn: String,

    #[structopt(short = "P", long = "bindingPW", default_value = "password")]
    /// Password of binding user.
    bind_passwd: String,

    #[structopt(short = "W", long = "promptPW")]
    /// Prompt for the password of the binding user instead of using --bindingPW.
    prompt_passwd: bool,

    #[structopt(short = "u", long = "lookupUser", default_value = "*")]
    /// Name of user to lookup.
    lookup_user: String,

    #[structopt(short = "g", long = "lookupGroup", default_value = "*")]
    /// Name of group to lookup.
    lookup_group: String,

    #[structopt(
        short = "U",
        long = "userQuery",
        default_value = "(&(uid={0})(objectClass=inetOrgPerson))"
    )]
    /// LDAP user query, {0} is replaced with the user to lookup.
    user_query: String,

    #[structopt(
        short = "G",
        long = "groupQuery",
        default_value = "(&(cn={0})(objectClass=groupOfUniqueNames))"
    )]
    /// LDAP group query, {0} is replaced with the group to lookup.
    group_query: String,

    #[structopt(short = "a", long = "printAttributes")]
    /// Print attributes of all users and groups found.
    print_attributes: bool,

    #[structopt(short = "e", long = "escape")]
    /// Escape filter special characters in the lookup names before substitution.
    escape: bool,

    #[structopt(long = "tls-no-verify")]
    /// Do not verify the server certificate of ldaps:// urls.
    tls_no_verify: bool,
}

