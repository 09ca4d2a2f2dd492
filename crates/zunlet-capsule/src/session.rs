//! Remote API session parameters.
//!
//! Token issuance is handled outside zunlet (e.g. `openstack token issue`);
//! the session only carries what every request needs.

use std::time::Duration;

use zunlet_core::config::RemoteConfig;

use crate::error::{CapsuleError, CapsuleResult};

pub const ENV_ENDPOINT: &str = "ZUN_ENDPOINT";
pub const ENV_AUTH_TOKEN: &str = "OS_AUTH_TOKEN";
pub const ENV_REGION: &str = "OS_REGION_NAME";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq)]
pub struct Session {
    /// Capsule API base URL including the version, e.g. `http://zun:9517/v1`.
    pub endpoint: String,
    pub token: Option<String>,
    pub region: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Session {
    /// Build a session from the process environment, falling back to the
    /// `[remote]` config section for anything the environment leaves unset.
    pub fn from_env(remote: &RemoteConfig) -> CapsuleResult<Self> {
        Self::from_lookup(remote, |key| std::env::var(key).ok())
    }

    /// As [`Session::from_env`], with an injectable variable lookup.
    pub fn from_lookup<F>(remote: &RemoteConfig, lookup: F) -> CapsuleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = non_empty(ENV_ENDPOINT)
            .or_else(|| remote.endpoint.clone())
            .ok_or_else(|| {
                CapsuleError::InvalidEndpoint(format!(
                    "no capsule API endpoint; set {ENV_ENDPOINT} or remote.endpoint"
                ))
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: non_empty(ENV_AUTH_TOKEN),
            region: non_empty(ENV_REGION).or_else(|| remote.region.clone()),
            timeout: remote
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}
