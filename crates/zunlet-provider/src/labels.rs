//! Capsule naming and the correlation labels that tie a capsule to its pod.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use zunlet_core::Pod;

use crate::error::TranslateError;

pub const LABEL_POD_NAME: &str = "PodName";
pub const LABEL_CLUSTER_NAME: &str = "ClusterName";
pub const LABEL_NODE_NAME: &str = "NodeName";
pub const LABEL_NAMESPACE: &str = "Namespace";
pub const LABEL_UID: &str = "UID";
pub const LABEL_CREATION_TIMESTAMP: &str = "CreationTimestamp";

/// Remote name of the capsule backing `namespace/name`.
///
/// Not reversible: `a-b/c` and `a/b-c` share a name. Identity is always
/// recovered from labels, never from this string.
pub fn capsule_name(namespace: &str, name: &str) -> String {
    format!("{namespace}-{name}")
}

/// Correlation labels written on create.
pub fn build_labels(pod: &Pod) -> HashMap<String, String> {
    let meta = &pod.metadata;
    let created = meta
        .creation_timestamp
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();

    HashMap::from([
        (LABEL_POD_NAME.to_string(), meta.name.clone()),
        (LABEL_CLUSTER_NAME.to_string(), meta.cluster_name.clone()),
        (LABEL_NODE_NAME.to_string(), pod.spec.node_name.clone()),
        (LABEL_NAMESPACE.to_string(), meta.namespace.clone()),
        (LABEL_UID.to_string(), meta.uid.clone()),
        (LABEL_CREATION_TIMESTAMP.to_string(), created),
    ])
}

/// Pod identity as read back from a capsule's labels.
#[derive(Debug, Clone, PartialEq)]
pub struct PodIdentity {
    pub name: String,
    pub namespace: String,
    pub node_name: String,
    pub uid: String,
    pub cluster_name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl PodIdentity {
    /// Read identity from labels. PodName, Namespace, NodeName and UID must
    /// be present; ClusterName and CreationTimestamp may be missing.
    pub fn from_labels(labels: &HashMap<String, String>) -> Result<Self, TranslateError> {
        let required = |key: &'static str| {
            labels
                .get(key)
                .cloned()
                .ok_or(TranslateError::MissingLabel(key))
        };

        Ok(Self {
            name: required(LABEL_POD_NAME)?,
            namespace: required(LABEL_NAMESPACE)?,
            node_name: required(LABEL_NODE_NAME)?,
            uid: required(LABEL_UID)?,
            cluster_name: labels.get(LABEL_CLUSTER_NAME).cloned().unwrap_or_default(),
            creation_timestamp: labels
                .get(LABEL_CREATION_TIMESTAMP)
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
        })
    }
}

/// NodeName label of a raw listing entry, read without decoding the rest.
pub fn node_name_of(entry: &serde_json::Value) -> Option<&str> {
    entry
        .get("meta_labels")?
        .get(LABEL_NODE_NAME)?
        .as_str()
}

/// `meta_name` of a raw listing entry, for log fields.
pub fn meta_name_of(entry: &serde_json::Value) -> &str {
    entry
        .get("meta_name")
        .and_then(|v| v.as_str())
        .unwrap_or("<unnamed>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zunlet_core::{ObjectMeta, PodSpec};

    fn pod() -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: "web".to_string(),
                namespace: "ns1".to_string(),
                uid: "2b0c5a2e-7d1f-4c55-9a43-0c3f0e6d1a10".to_string(),
                cluster_name: "east".to_string(),
                creation_timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
                ..ObjectMeta::default()
            },
            spec: PodSpec {
                node_name: "virtual-zun".to_string(),
                ..PodSpec::default()
            },
            ..Pod::default()
        }
    }

    #[test]
    fn name_joins_namespace_and_name() {
        assert_eq!(capsule_name("ns1", "web"), "ns1-web");
    }

    #[test]
    fn labels_round_trip_identity() {
        let labels = build_labels(&pod());
        assert_eq!(labels[LABEL_CREATION_TIMESTAMP], "2024-03-01T12:00:00Z");

        let id = PodIdentity::from_labels(&labels).unwrap();
        assert_eq!(id.name, "web");
        assert_eq!(id.namespace, "ns1");
        assert_eq!(id.node_name, "virtual-zun");
        assert_eq!(id.cluster_name, "east");
        assert_eq!(id.uid, "2b0c5a2e-7d1f-4c55-9a43-0c3f0e6d1a10");
        assert_eq!(id.creation_timestamp, pod().metadata.creation_timestamp);
    }

    #[test]
    fn missing_required_label_is_an_error() {
        let mut labels = build_labels(&pod());
        labels.remove(LABEL_NAMESPACE);
        assert!(matches!(
            PodIdentity::from_labels(&labels),
            Err(TranslateError::MissingLabel("Namespace"))
        ));
    }

    #[test]
    fn optional_labels_may_be_absent_or_unparseable() {
        let mut labels = build_labels(&pod());
        labels.remove(LABEL_CLUSTER_NAME);
        labels.insert(LABEL_CREATION_TIMESTAMP.to_string(), "yesterday".to_string());

        let id = PodIdentity::from_labels(&labels).unwrap();
        assert_eq!(id.cluster_name, "");
        assert_eq!(id.creation_timestamp, None);
    }

    #[test]
    fn reads_node_name_from_raw_entry() {
        let entry = serde_json::json!({"meta_name": "a-b", "meta_labels": {"NodeName": "n1"}});
        assert_eq!(node_name_of(&entry), Some("n1"));
        assert_eq!(meta_name_of(&entry), "a-b");

        let bare = serde_json::json!({"meta_labels": null});
        assert_eq!(node_name_of(&bare), None);
        assert_eq!(meta_name_of(&bare), "<unnamed>");
    }
}
