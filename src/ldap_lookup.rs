use ldaplookup::*;
use std::io::Write;
use structopt::StructOpt;

include!("./ldap_lookup_opt.rs");

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod common;

// Always reaches stderr, whatever RUST_LOG says.
fn report_error<O: Write, E: Write>(e: LdapError, json: bool, out: &mut O, err: &mut E) {
    let _ = writeln!(err, "Unexpected error - {}", e);
    if json {
        let _ = writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&e).expect("CRITICAL: Serialisation Fault")
        );
    }
}

fn bind_credentials(opt: &LdapLookupOpt) -> Result<(String, String), LdapError> {
    if !opt.prompt_passwd {
        return Ok((opt.bind_dn.clone(), opt.bind_passwd.clone()));
    }

    if opt.bind_dn.is_empty() {
        error!("Anonymous does not take a password");
        return Err(LdapError::AnonymousInvalidState);
    }

    match rpassword::prompt_password_stderr(&format!("Enter password for {}: ", opt.bind_dn)) {
        Ok(pw) => Ok((opt.bind_dn.clone(), pw)),
        Err(e) => {
            error!("Failed to get bind password - {}", e);
            Err(LdapError::PasswordNotFound)
        }
    }
}

async fn lookup<W: Write>(opt: &LdapLookupOpt, out: &mut W) -> Result<(), LdapError> {
    let timeout = Duration::from_secs(5);

    debug!("ldap url = {}", opt.url);
    debug!("bind dn = {}", opt.bind_dn);

    let (bind_dn, bind_passwd) = bind_credentials(opt)?;

    let mut client = LdapClient::new(&opt.url, timeout, !opt.tls_no_verify).await?;

    // The first message after connect is always a bind.
    client.bind(bind_dn, bind_passwd).await?;

    let searches = [
        (
            LookupKind::Users,
            FilterTemplate::new(opt.user_query.as_str()),
            opt.lookup_user.as_str(),
        ),
        (
            LookupKind::Groups,
            FilterTemplate::new(opt.group_query.as_str()),
            opt.lookup_group.as_str(),
        ),
    ];

    // Each report is written before the next search starts.
    for (kind, template, token) in searches.iter() {
        let result = run_lookup(&mut client, *kind, template, token, opt.escape).await?;
        if opt.json {
            write_json(out, &result)?;
        } else {
            write_report(out, &result, opt.print_attributes)?;
        }
    }

    Ok(())
}

/// Run the lookups and return the process exit status.
async fn run<O: Write, E: Write>(opt: &LdapLookupOpt, out: &mut O, err: &mut E) -> i32 {
    match lookup(opt, out).await {
        Ok(()) => 0,
        Err(e) => {
            report_error(e, opt.json, out, err);
            1
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opt = LdapLookupOpt::from_args();
    ldaplookup::start_tracing(opt.verbose);
    info!("ldap lookup command line utility");

    let code = run(&opt, &mut std::io::stdout(), &mut std::io::stderr()).await;
    std::process::exit(code);
}
