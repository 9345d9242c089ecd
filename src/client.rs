use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use ldap3_proto::proto::{
    LdapBindCred, LdapBindRequest, LdapDerefAliases, LdapFilter, LdapMsg, LdapOp,
    LdapResultCode, LdapSearchRequest, LdapSearchScope,
};
use ldap3_proto::LdapCodec;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use percent_encoding::percent_decode_str;
use std::fmt;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace};
use url::{Host, Url};

use crate::entry::LdapEntry;
use crate::LdapError;

const DEFAULT_LDAP_PORT: u16 = 389;
const DEFAULT_LDAPS_PORT: u16 = 636;

trait LdapStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> LdapStream for T {}

/// One authenticated session with a directory server. Requests are issued
/// strictly one at a time.
pub struct LdapClient {
    framed: Framed<Box<dyn LdapStream>, LdapCodec>,
    msgid: i32,
    basedn: String,
}

impl fmt::Debug for LdapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapClient")
            .field("msgid", &self.msgid)
            .field("basedn", &self.basedn)
            .finish()
    }
}

impl LdapClient {
    /// Connect to `ldap://` or `ldaps://` url. The path of the url, if any,
    /// is the base of every search made through this client.
    pub async fn new(url: &Url, timeout: Duration, verify_tls: bool) -> Result<Self, LdapError> {
        info!(%url, "connecting");

        let (default_port, use_tls) = match url.scheme() {
            "ldap" => (DEFAULT_LDAP_PORT, false),
            "ldaps" => (DEFAULT_LDAPS_PORT, true),
            scheme => {
                error!("Unsupported url scheme {} - expected ldap or ldaps", scheme);
                return Err(LdapError::InvalidUrl);
            }
        };

        let hostname = match url.host() {
            Some(Host::Domain(d)) => d.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => {
                error!("No host present in url {}", url);
                return Err(LdapError::InvalidUrl);
            }
        };

        let basedn = percent_decode_str(url.path().trim_start_matches('/'))
            .decode_utf8()
            .map(|s| s.into_owned())
            .map_err(|e| {
                error!(?e, "Invalid search base in url");
                LdapError::InvalidUrl
            })?;

        let addrs = url.socket_addrs(|| Some(default_port)).map_err(|e| {
            error!(?e, "Unable to resolve {}", hostname);
            LdapError::ResolverError
        })?;
        debug!(?addrs);

        let tcpstream = Self::connect_any(&addrs, timeout).await?;

        let stream: Box<dyn LdapStream> = if use_tls {
            Box::new(Self::start_tls_stream(tcpstream, &hostname, verify_tls).await?)
        } else {
            Box::new(tcpstream)
        };

        debug!("root is: {}", basedn);

        Ok(LdapClient {
            framed: Framed::new(stream, LdapCodec::default()),
            msgid: 0,
            basedn,
        })
    }

    async fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> Result<TcpStream, LdapError> {
        for addr in addrs {
            match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    trace!(%addr, "connected");
                    return Ok(stream);
                }
                Ok(Err(e)) => {
                    debug!(?e, %addr, "connection attempt failed");
                }
                Err(_) => {
                    debug!(%addr, "connection attempt timed out");
                }
            }
        }
        error!("Unable to connect to any of {:?}", addrs);
        Err(LdapError::ConnectError)
    }

    async fn start_tls_stream(
        tcpstream: TcpStream,
        hostname: &str,
        verify_tls: bool,
    ) -> Result<SslStream<TcpStream>, LdapError> {
        let mut tls_parms = SslConnector::builder(SslMethod::tls_client()).map_err(|e| {
            error!("openssl -> {:?}", e);
            LdapError::TlsError
        })?;
        if !verify_tls {
            tls_parms.set_verify(SslVerifyMode::NONE);
        }
        let tls_parms = tls_parms.build();

        let mut tlsstream = tls_parms
            .configure()
            .and_then(|mut conf| {
                conf.set_verify_hostname(verify_tls);
                conf.into_ssl(hostname)
            })
            .and_then(|tls_obj| SslStream::new(tls_obj, tcpstream))
            .map_err(|e| {
                error!("Failed to initialise TLS -> {:?}", e);
                LdapError::TlsError
            })?;

        SslStream::connect(Pin::new(&mut tlsstream))
            .await
            .map_err(|e| {
                error!("Failed to initialise TLS -> {:?}", e);
                LdapError::TlsError
            })?;

        Ok(tlsstream)
    }

    pub fn basedn(&self) -> &str {
        &self.basedn
    }

    fn next_msgid(&mut self) -> i32 {
        self.msgid += 1;
        self.msgid
    }

    async fn send(&mut self, msgid: i32, op: LdapOp) -> Result<(), LdapError> {
        let msg = LdapMsg {
            msgid,
            op,
            ctrl: vec![],
        };
        self.framed.send(msg).await.map_err(|e| {
            error!("Unable to send request -> {:?}", e);
            LdapError::TransportWriteError
        })
    }

    async fn recv(&mut self, msgid: i32) -> Result<LdapOp, LdapError> {
        match self.framed.next().await {
            Some(Ok(msg)) if msg.msgid == msgid => Ok(msg.op),
            Some(Ok(msg)) => {
                error!(
                    "Response for message {} while waiting on {} -> {:?}",
                    msg.msgid, msgid, msg.op
                );
                Err(LdapError::InvalidProtocolState)
            }
            Some(Err(e)) => {
                error!("Unable to read response -> {:?}", e);
                Err(LdapError::TransportReadError)
            }
            None => {
                error!("Connection closed by server");
                Err(LdapError::TransportReadError)
            }
        }
    }

    /// Simple bind. An empty dn and password is an anonymous bind.
    pub async fn bind(&mut self, dn: String, pw: String) -> Result<(), LdapError> {
        debug!("binding as {:?}", dn);
        let msgid = self.next_msgid();
        self.send(
            msgid,
            LdapOp::BindRequest(LdapBindRequest {
                dn,
                cred: LdapBindCred::Simple(pw),
            }),
        )
        .await?;

        match self.recv(msgid).await? {
            LdapOp::BindResponse(res) => {
                if res.res.code == LdapResultCode::Success {
                    info!("bind success");
                    Ok(())
                } else if res.res.code == LdapResultCode::InvalidCredentials {
                    error!("Invalid credentials - {}", res.res.message);
                    Err(LdapError::InvalidCredentials)
                } else {
                    error!("Bind failed {:?} - {}", res.res.code, res.res.message);
                    Err(LdapError::BindFailed)
                }
            }
            op => {
                error!("Invalid ldap response to bind -> {:?}", op);
                Err(LdapError::InvalidProtocolState)
            }
        }
    }

    /// Subtree search from the base, returning every entry in the order the
    /// server sent them.
    pub async fn search(&mut self, filter: LdapFilter) -> Result<Vec<LdapEntry>, LdapError> {
        let msgid = self.next_msgid();
        let req = LdapSearchRequest {
            base: self.basedn.clone(),
            scope: LdapSearchScope::Subtree,
            aliases: LdapDerefAliases::Always,
            sizelimit: 0,
            timelimit: 0,
            typesonly: false,
            filter,
            attrs: vec![],
        };
        self.send(msgid, LdapOp::SearchRequest(req)).await?;

        let mut entries = Vec::new();
        loop {
            match self.recv(msgid).await? {
                LdapOp::SearchResultEntry(entry) => {
                    debug!("Found node: {}", entry.dn);
                    entries.push(LdapEntry::from(entry));
                }
                LdapOp::SearchResultReference(_) => {
                    debug!("Ignoring search reference");
                }
                LdapOp::SearchResultDone(res) => {
                    if res.code == LdapResultCode::Success {
                        break;
                    }
                    error!("Search failed {:?} - {}", res.code, res.message);
                    return Err(LdapError::SearchFailed);
                }
                op => {
                    error!("Invalid ldap response state -> {:?}", op);
                    return Err(LdapError::InvalidProtocolState);
                }
            }
        }

        Ok(entries)
    }
}
