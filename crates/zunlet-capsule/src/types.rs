//! Wire types for the remote capsule API.
//!
//! Read-side types (`Capsule`, `CapsuleContainer`, `Address`) are decoded
//! leniently: every field has a default so that one odd field does not make
//! a whole capsule unreadable. Write-side types (`CreateCapsuleRequest` and
//! its templates) are rendered into the capsule template body by
//! [`CreateCapsuleRequest::to_body`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CapsuleError, CapsuleResult};

/// Capsule template format version sent on create.
pub const CAPSULE_VERSION: &str = "beta";

/// Megabytes per gigabyte in the capsule template's memory field.
pub const TEMPLATE_MB_PER_GB: f64 = 1024.0;

// ── Read side ─────────────────────────────────────────────────────

/// A capsule as reported by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    #[serde(default, deserialize_with = "nullable_string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status_reason: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub meta_name: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub meta_labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub capsule_version: String,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub memory: Option<String>,
    #[serde(default, with = "crate::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Network name → addresses on that network.
    #[serde(default, deserialize_with = "nullable_btree")]
    pub addresses: BTreeMap<String, Vec<Address>>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub containers: Vec<CapsuleContainer>,
}

impl Capsule {
    /// Decode one raw listing entry.
    pub fn from_json_value(value: &serde_json::Value) -> CapsuleResult<Self> {
        Capsule::deserialize(value).map_err(|e| CapsuleError::Decode(e.to_string()))
    }
}

/// Restart policy as echoed back by the API: either a bare name or the
/// Docker-style `{"Name": ..., "MaximumRetryCount": ...}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RestartPolicy {
    Name(String),
    Detailed {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "MaximumRetryCount", default, skip_serializing_if = "Option::is_none")]
        maximum_retry_count: Option<serde_json::Value>,
    },
}

impl RestartPolicy {
    pub fn name(&self) -> &str {
        match self {
            RestartPolicy::Name(name) => name,
            RestartPolicy::Detailed { name, .. } => name,
        }
    }
}

/// A network address attached to a capsule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "nullable_string")]
    pub addr: String,
    /// IP version; the API reports it as a JSON number (4 or 6).
    #[serde(default, deserialize_with = "nullable_f64")]
    pub version: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

impl Address {
    /// A usable IPv4 address; entries without an `addr` never qualify.
    pub fn is_ipv4(&self) -> bool {
        self.version == 4.0 && !self.addr.is_empty()
    }
}

/// A container nested inside a capsule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapsuleContainer {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image: String,
    /// Newer API versions return the command as a list; it is joined.
    #[serde(default, deserialize_with = "string_or_list")]
    pub command: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status_detail: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status_reason: String,
    #[serde(default)]
    pub cpu: Option<f64>,
    /// Memory in megabytes, e.g. `"512"` or `"512M"`.
    #[serde(default, deserialize_with = "string_or_number")]
    pub memory: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub container_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub workdir: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image_pull_policy: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub environment: HashMap<String, String>,
    #[serde(default, with = "crate::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of a capsule listing.
///
/// Entries are kept as raw JSON so that a single undecodable capsule can be
/// reported and skipped without losing the rest of the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapsulePage {
    pub entries: Vec<serde_json::Value>,
    /// Marker for the next page, if the listing continues.
    pub next_marker: Option<String>,
}

impl CapsulePage {
    /// Parse a `{"capsules": [...], "next": "<url>"}` list response.
    pub fn from_json(body: &[u8]) -> CapsuleResult<Self> {
        #[derive(Deserialize)]
        struct ListBody {
            #[serde(default)]
            capsules: Vec<serde_json::Value>,
            #[serde(default)]
            next: Option<String>,
        }

        let list: ListBody =
            serde_json::from_slice(body).map_err(|e| CapsuleError::Decode(e.to_string()))?;
        Ok(Self {
            entries: list.capsules,
            next_marker: list.next.as_deref().and_then(marker_from_next),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract the `marker` query parameter from a `next` link.
fn marker_from_next(next: &str) -> Option<String> {
    let (_, query) = next.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "marker")
        .map(|(_, value)| value.to_string())
        .filter(|marker| !marker.is_empty())
}

// ── Write side ────────────────────────────────────────────────────

/// Everything needed to create one capsule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCapsuleRequest {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub template: CapsuleTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleTemplate {
    pub capsule_version: String,
    pub restart_policy: String,
    pub containers: Vec<ContainerTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerTemplate {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub work_dir: Option<String>,
    pub image_pull_policy: Option<String>,
    pub environment: BTreeMap<String, String>,
    /// CPU limit in (fractional) cores.
    pub cpu: Option<f64>,
    /// Memory limit in (decimal) gigabytes.
    pub memory_gb: Option<f64>,
}

impl ContainerTemplate {
    /// Memory in the template's megabyte unit.
    pub fn memory_mb(&self) -> Option<f64> {
        self.memory_gb.map(|gb| gb * TEMPLATE_MB_PER_GB)
    }
}

impl CreateCapsuleRequest {
    /// Render the `POST /capsules` body.
    pub fn to_body(&self) -> serde_json::Value {
        let containers: Vec<serde_json::Value> = self
            .template
            .containers
            .iter()
            .map(|c| {
                let mut requests = serde_json::Map::new();
                if let Some(cpu) = c.cpu {
                    requests.insert("cpu".to_string(), serde_json::json!(cpu));
                }
                if let Some(mb) = c.memory_mb() {
                    requests.insert("memory".to_string(), serde_json::json!(mb));
                }

                let mut container = serde_json::json!({
                    "name": c.name,
                    "image": c.image,
                    "env": c.environment,
                });
                if !c.command.is_empty() {
                    container["command"] = serde_json::json!(c.command);
                }
                if let Some(dir) = &c.work_dir {
                    container["workDir"] = serde_json::json!(dir);
                }
                if let Some(policy) = &c.image_pull_policy {
                    container["imagePullPolicy"] = serde_json::json!(policy);
                }
                if !requests.is_empty() {
                    container["resources"] = serde_json::json!({ "requests": requests });
                }
                container
            })
            .collect();

        serde_json::json!({
            "template": {
                "kind": "capsule",
                "capsuleVersion": self.template.capsule_version,
                "metadata": {
                    "name": self.name,
                    "labels": self.labels,
                },
                "spec": {
                    "restartPolicy": self.template.restart_policy,
                    "containers": containers,
                },
            }
        })
    }
}

// ── Lenient field decoders ────────────────────────────────────────

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_btree<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<Address>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Vec<Address>>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Command {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Command>::deserialize(deserializer)? {
        Some(Command::One(s)) => s,
        Some(Command::Many(parts)) => parts.join(" "),
        None => String::new(),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|v| match v {
        Scalar::Text(s) => s,
        Scalar::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPSULE_JSON: &str = r#"{
        "uuid": "cd8d0db6-ff2e-4b5e-8f0e-3e8b1c4f6a11",
        "status": "Running",
        "status_reason": null,
        "meta_name": "ns1-web",
        "meta_labels": {"PodName": "web", "Namespace": "ns1", "NodeName": "virtual-zun"},
        "restart_policy": {"Name": "always", "MaximumRetryCount": "0"},
        "cpu": 0.5,
        "memory": "256M",
        "created_at": "2018-01-12 09:37:25+00:00",
        "updated_at": "2018-01-12T09:38:01",
        "addresses": {
            "private": [
                {"addr": "fd00::5", "version": 6, "port": "a1", "subnet_id": "s6"},
                {"addr": "10.0.0.5", "version": 4, "port": "a1", "subnet_id": "s4"}
            ]
        },
        "containers": [{
            "name": "c1",
            "uuid": "0b7f4a2c-1111-4c3d-9e8f-000000000001",
            "image": "nginx",
            "command": ["nginx", "-g", "daemon off;"],
            "status": "Running",
            "status_detail": "Up 1 minute",
            "cpu": 0.5,
            "memory": 256,
            "created_at": "2018-01-12 09:37:30+00:00",
            "updated_at": null
        }]
    }"#;

    #[test]
    fn decodes_capsule_leniently() {
        let capsule: Capsule = serde_json::from_str(CAPSULE_JSON).unwrap();
        assert_eq!(capsule.meta_name, "ns1-web");
        assert_eq!(capsule.status_reason, "");
        assert_eq!(capsule.restart_policy.as_ref().unwrap().name(), "always");
        assert_eq!(capsule.memory.as_deref(), Some("256M"));
        assert!(capsule.created_at.is_some());
        assert!(capsule.updated_at.is_some());

        let c = &capsule.containers[0];
        assert_eq!(c.command, "nginx -g daemon off;");
        assert_eq!(c.memory.as_deref(), Some("256"));
        assert_eq!(c.updated_at, None);

        let v4: Vec<&Address> = capsule.addresses["private"].iter().filter(|a| a.is_ipv4()).collect();
        assert_eq!(v4.len(), 1);
        assert_eq!(v4[0].addr, "10.0.0.5");
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let capsule: Capsule = serde_json::from_str(
            r#"{
                "uuid": null,
                "status": null,
                "meta_name": "ns1-web",
                "containers": null,
                "addresses": {"private": [{"version": 4}, {"addr": "10.0.0.9", "version": null}]}
            }"#,
        )
        .unwrap();
        assert_eq!(capsule.uuid, "");
        assert_eq!(capsule.status, "");
        assert!(capsule.containers.is_empty());
        assert!(capsule.addresses["private"].iter().all(|a| !a.is_ipv4()));

        let c: CapsuleContainer = serde_json::from_str(
            r#"{"name": null, "uuid": null, "image": null, "status": null}"#,
        )
        .unwrap();
        assert_eq!(c, CapsuleContainer::default());
    }

    #[test]
    fn page_decodes_entries_independently() {
        let body = br#"{
            "capsules": [{"meta_name": "ok"}, {"meta_name": "bad", "containers": "nope"}],
            "next": "http://zun:9517/v1/capsules?limit=2&marker=abc-123"
        }"#;
        let page = CapsulePage::from_json(body).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.next_marker.as_deref(), Some("abc-123"));

        let decoded: Vec<_> = page.entries.iter().map(Capsule::from_json_value).collect();
        assert!(decoded[0].is_ok());
        assert!(matches!(decoded[1], Err(CapsuleError::Decode(_))));
    }

    #[test]
    fn page_without_next_ends_listing() {
        let page = CapsulePage::from_json(br#"{"capsules": []}"#).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_marker, None);

        let page = CapsulePage::from_json(br#"{"capsules": [], "next": null}"#).unwrap();
        assert_eq!(page.next_marker, None);
    }

    #[test]
    fn page_rejects_non_json() {
        assert!(matches!(
            CapsulePage::from_json(b"<html>"),
            Err(CapsuleError::Decode(_))
        ));
    }

    #[test]
    fn create_body_uses_template_layout() {
        let request = CreateCapsuleRequest {
            name: "ns1-web".to_string(),
            labels: HashMap::from([("PodName".to_string(), "web".to_string())]),
            template: CapsuleTemplate {
                capsule_version: CAPSULE_VERSION.to_string(),
                restart_policy: "Always".to_string(),
                containers: vec![ContainerTemplate {
                    name: "c1".to_string(),
                    image: "nginx".to_string(),
                    command: vec!["nginx".to_string()],
                    cpu: Some(0.5),
                    memory_gb: Some(0.5),
                    ..ContainerTemplate::default()
                }],
            },
        };

        let body = request.to_body();
        let template = &body["template"];
        assert_eq!(template["kind"], "capsule");
        assert_eq!(template["capsuleVersion"], "beta");
        assert_eq!(template["metadata"]["name"], "ns1-web");
        assert_eq!(template["metadata"]["labels"]["PodName"], "web");
        assert_eq!(template["spec"]["restartPolicy"], "Always");

        let container = &template["spec"]["containers"][0];
        assert_eq!(container["command"][0], "nginx");
        assert_eq!(container["resources"]["requests"]["cpu"], 0.5);
        assert_eq!(container["resources"]["requests"]["memory"], 512.0);
        assert!(container.get("workDir").is_none());
    }

    #[test]
    fn create_body_omits_unset_resources() {
        let request = CreateCapsuleRequest {
            name: "ns-a".to_string(),
            labels: HashMap::new(),
            template: CapsuleTemplate {
                capsule_version: CAPSULE_VERSION.to_string(),
                restart_policy: "Never".to_string(),
                containers: vec![ContainerTemplate {
                    name: "c".to_string(),
                    image: "busybox".to_string(),
                    ..ContainerTemplate::default()
                }],
            },
        };
        let body = request.to_body();
        assert!(body["template"]["spec"]["containers"][0].get("resources").is_none());
    }
}
