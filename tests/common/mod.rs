#![allow(dead_code)]

//! An in-process directory that answers simple binds and searches with
//! canned entries.

use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use ldap3_proto::proto::{LdapFilter, LdapPartialAttribute, LdapSearchScope};
use ldap3_proto::simple::{LdapResultCode, LdapSearchResultEntry, ServerOps};
use ldap3_proto::LdapCodec;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};

pub const USER_QUERY: &str = "(&(uid={0})(objectClass=inetOrgPerson))";
pub const GROUP_QUERY: &str = "(&(cn={0})(objectClass=groupOfUniqueNames))";
pub const BIND_DN: &str = "cn=Directory Manager";
pub const BIND_PW: &str = "password";

#[derive(Default)]
pub struct MockDirectory {
    pub users: Vec<LdapSearchResultEntry>,
    pub groups: Vec<LdapSearchResultEntry>,
    pub searches: Mutex<Vec<(String, LdapSearchScope, LdapFilter)>>,
}

fn has_class(filter: &LdapFilter, class: &str) -> bool {
    match filter {
        LdapFilter::And(l) | LdapFilter::Or(l) => l.iter().any(|f| has_class(f, class)),
        LdapFilter::Equality(a, v) => a.eq_ignore_ascii_case("objectclass") && v == class,
        _ => false,
    }
}

fn is_failure(filter: &LdapFilter) -> bool {
    match filter {
        LdapFilter::And(l) | LdapFilter::Or(l) => l.iter().any(is_failure),
        LdapFilter::Equality(_, v) => v == "fail",
        _ => false,
    }
}

async fn serve_client(socket: TcpStream, directory: Arc<MockDirectory>) {
    let (r, w) = tokio::io::split(socket);
    let mut r = FramedRead::new(r, LdapCodec::default());
    let mut w = FramedWrite::new(w, LdapCodec::default());

    while let Some(Ok(msg)) = r.next().await {
        let responses = match ServerOps::try_from(msg).ok() {
            Some(ServerOps::SimpleBind(req)) => {
                if req.dn == BIND_DN && req.pw == BIND_PW {
                    vec![req.gen_success()]
                } else {
                    vec![req.gen_invalid_cred()]
                }
            }
            Some(ServerOps::Search(req)) => {
                directory.searches.lock().expect("poisoned").push((
                    req.base.clone(),
                    req.scope.clone(),
                    req.filter.clone(),
                ));

                if is_failure(&req.filter) {
                    vec![req.gen_error(LdapResultCode::UnwillingToPerform, "no".to_string())]
                } else {
                    let entries = if has_class(&req.filter, "groupOfUniqueNames") {
                        &directory.groups
                    } else {
                        &directory.users
                    };
                    let mut responses: Vec<_> = entries
                        .iter()
                        .cloned()
                        .map(|e| req.gen_result_entry(e))
                        .collect();
                    responses.push(req.gen_success());
                    responses
                }
            }
            _ => return,
        };

        for response in responses {
            if w.send(response).await.is_err() {
                return;
            }
        }
    }
}

pub async fn start_directory(directory: MockDirectory) -> (u16, Arc<MockDirectory>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("unable to bind listener");
    let port = listener.local_addr().expect("no local addr").port();
    let directory = Arc::new(directory);
    let served = directory.clone();

    tokio::spawn(async move {
        while let Ok((socket, _addr)) = listener.accept().await {
            tokio::spawn(serve_client(socket, served.clone()));
        }
    });

    (port, directory)
}

pub fn entry(dn: &str, attrs: Vec<(&str, Vec<Vec<u8>>)>) -> LdapSearchResultEntry {
    LdapSearchResultEntry {
        dn: dn.to_string(),
        attributes: attrs
            .into_iter()
            .map(|(atype, vals)| LdapPartialAttribute {
                atype: atype.to_string(),
                vals,
            })
            .collect(),
    }
}
