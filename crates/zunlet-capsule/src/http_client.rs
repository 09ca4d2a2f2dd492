//! HTTP transport for the capsule API.
//!
//! One HTTP/1.1 connection per request over a plain TCP stream, driven by
//! hyper's low-level client connection. Every request is bounded by the
//! session timeout; nothing is retried.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use tracing::{debug, info};

use crate::client::{CapsuleApi, CapsuleFuture};
use crate::error::{CapsuleError, CapsuleResult};
use crate::session::Session;
use crate::types::{Capsule, CapsulePage, CreateCapsuleRequest};

const API_VERSION_HEADER: &str = "OpenStack-API-Version";
const API_VERSION: &str = "container 1.32";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Capsule API client speaking HTTP to `{endpoint}/capsules`.
#[derive(Debug, Clone)]
pub struct HttpCapsuleClient {
    session: Session,
    /// `host[:port]` as written in the endpoint, for the Host header.
    authority: String,
    /// `host:port` to dial.
    connect_addr: String,
    /// Path prefix from the endpoint, without trailing slash (e.g. `/v1`).
    base_path: String,
}

impl HttpCapsuleClient {
    pub fn new(session: Session) -> CapsuleResult<Self> {
        let rest = session
            .endpoint
            .strip_prefix("http://")
            .ok_or_else(|| CapsuleError::InvalidEndpoint(session.endpoint.clone()))?;

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, format!("/{}", path.trim_end_matches('/'))),
            None => (rest, String::new()),
        };
        if authority.is_empty() {
            return Err(CapsuleError::InvalidEndpoint(session.endpoint.clone()));
        }

        let connect_addr = if authority.contains(':') {
            authority.to_string()
        } else {
            format!("{authority}:80")
        };

        debug!(endpoint = %session.endpoint, region = ?session.region, "capsule API client configured");
        Ok(Self {
            authority: authority.to_string(),
            connect_addr,
            base_path: path.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn capsules_path(&self) -> String {
        format!("{}/capsules", self.base_path)
    }

    fn capsule_path(&self, name: &str) -> String {
        format!("{}/capsules/{}", self.base_path, name)
    }

    /// Send one request and collect the full response body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> CapsuleResult<(StatusCode, Bytes)> {
        let timeout = self.session.timeout;
        tokio::time::timeout(timeout, self.send_inner(method, path, body))
            .await
            .map_err(|_| CapsuleError::Timeout(timeout))?
    }

    async fn send_inner(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> CapsuleResult<(StatusCode, Bytes)> {
        let stream = tokio::net::TcpStream::connect(&self.connect_addr)
            .await
            .map_err(transport)?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(transport)?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "capsule API connection closed with error");
            }
        });

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(path)
            .header(HOST, &self.authority)
            .header(USER_AGENT, concat!("zunlet/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .header(API_VERSION_HEADER, API_VERSION);
        if let Some(token) = &self.session.token {
            builder = builder.header(AUTH_TOKEN_HEADER, token);
        }
        let body = match body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };
        let req = builder.body(body).map_err(transport)?;

        let resp = sender.send_request(req).await.map_err(transport)?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(transport)?
            .to_bytes();

        debug!(%method, %path, %status, "capsule API request completed");
        Ok((status, bytes))
    }
}

fn transport<E: std::fmt::Display>(e: E) -> CapsuleError {
    CapsuleError::Transport(e.to_string())
}

/// Map a non-2xx response onto the error taxonomy.
fn check_status(status: StatusCode, body: &Bytes, name: &str) -> CapsuleResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::NOT_FOUND => CapsuleError::NotFound(name.to_string()),
        StatusCode::CONFLICT => CapsuleError::Conflict(name.to_string()),
        _ => CapsuleError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        },
    })
}

fn decode_capsule(body: &Bytes) -> CapsuleResult<Capsule> {
    serde_json::from_slice(body).map_err(|e| CapsuleError::Decode(e.to_string()))
}

impl CapsuleApi for HttpCapsuleClient {
    fn create<'a>(&'a self, request: &'a CreateCapsuleRequest) -> CapsuleFuture<'a, Capsule> {
        Box::pin(async move {
            let body = serde_json::to_vec(&request.to_body())
                .map_err(|e| CapsuleError::Decode(e.to_string()))?;
            let (status, bytes) = self
                .send(Method::POST, &self.capsules_path(), Some(body))
                .await?;
            check_status(status, &bytes, &request.name)?;

            // Some releases answer 202 with an empty body.
            let capsule = if bytes.is_empty() {
                Capsule {
                    meta_name: request.name.clone(),
                    ..Capsule::default()
                }
            } else {
                decode_capsule(&bytes)?
            };
            info!(name = %request.name, uuid = %capsule.uuid, "capsule create accepted");
            Ok(capsule)
        })
    }

    fn get<'a>(&'a self, name: &'a str) -> CapsuleFuture<'a, Capsule> {
        Box::pin(async move {
            let (status, bytes) = self.send(Method::GET, &self.capsule_path(name), None).await?;
            check_status(status, &bytes, name)?;
            decode_capsule(&bytes)
        })
    }

    fn list_page<'a>(&'a self, marker: Option<&'a str>) -> CapsuleFuture<'a, CapsulePage> {
        Box::pin(async move {
            let path = match marker {
                Some(marker) => format!("{}?marker={}", self.capsules_path(), marker),
                None => self.capsules_path(),
            };
            let (status, bytes) = self.send(Method::GET, &path, None).await?;
            check_status(status, &bytes, "capsules")?;
            CapsulePage::from_json(&bytes)
        })
    }

    fn delete<'a>(&'a self, name: &'a str) -> CapsuleFuture<'a, ()> {
        Box::pin(async move {
            let (status, bytes) = self
                .send(Method::DELETE, &self.capsule_path(name), None)
                .await?;
            check_status(status, &bytes, name)?;
            info!(%name, "capsule delete accepted");
            Ok(())
        })
    }
}
