//! Capsule → Pod.
//!
//! Pure: everything comes from the capsule record in hand. Identity comes
//! only from the correlation labels; the capsule name is ignored.

use std::collections::BTreeMap;

use zunlet_capsule::{Capsule, CapsuleContainer};
use zunlet_core::{
    Container, ContainerStatus, EnvVar, ObjectMeta, Pod, PodPhase, PodSpec, PodStatus,
    ResourceRequirements,
};

use crate::error::TranslateError;
use crate::labels::PodIdentity;
use crate::resources::reported_limits;
use crate::state::{capsule_phase, container_phase, container_state};

/// Translate a capsule record into the pod it backs.
pub fn capsule_to_pod(capsule: &Capsule) -> Result<Pod, TranslateError> {
    let identity = PodIdentity::from_labels(&capsule.meta_labels)?;

    let mut containers = Vec::with_capacity(capsule.containers.len());
    let mut statuses = Vec::with_capacity(capsule.containers.len());
    for c in &capsule.containers {
        containers.push(pod_container(c)?);
        statuses.push(container_status(c));
    }

    Ok(Pod {
        api_version: Some("v1".to_string()),
        kind: Some("Pod".to_string()),
        metadata: ObjectMeta {
            name: identity.name,
            namespace: identity.namespace,
            uid: identity.uid,
            cluster_name: identity.cluster_name,
            creation_timestamp: identity.creation_timestamp.or(capsule.created_at),
            ..ObjectMeta::default()
        },
        spec: PodSpec {
            node_name: identity.node_name,
            restart_policy: capsule
                .restart_policy
                .as_ref()
                .map(|p| normalize_restart_policy(p.name())),
            containers,
            volumes: Vec::new(),
        },
        status: PodStatus {
            phase: Some(capsule_phase(&capsule.status)),
            pod_ip: pod_ip(capsule).unwrap_or_default(),
            start_time: capsule.updated_at.or(capsule.created_at),
            container_statuses: statuses,
            ..PodStatus::default()
        },
    })
}

/// First IPv4 address, walking networks in name order.
fn pod_ip(capsule: &Capsule) -> Option<String> {
    capsule
        .addresses
        .values()
        .flatten()
        .find(|a| a.is_ipv4())
        .map(|a| a.addr.clone())
}

/// Map the engine's restart policy names onto pod spellings.
fn normalize_restart_policy(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "always" => "Always".to_string(),
        "on-failure" | "onfailure" => "OnFailure".to_string(),
        "no" | "never" => "Never".to_string(),
        _ => name.to_string(),
    }
}

fn pod_container(c: &CapsuleContainer) -> Result<Container, TranslateError> {
    let limits = reported_limits(&c.name, c.cpu, c.memory.as_deref())?;
    let env = c
        .environment
        .iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
        })
        .collect();

    Ok(Container {
        name: c.name.clone(),
        image: c.image.clone(),
        command: if c.command.is_empty() {
            Vec::new()
        } else {
            vec![c.command.clone()]
        },
        args: Vec::new(),
        working_dir: Some(c.workdir.clone()).filter(|d| !d.is_empty()),
        image_pull_policy: Some(c.image_pull_policy.clone()).filter(|p| !p.is_empty()),
        env,
        resources: ResourceRequirements {
            requests: limits.clone(),
            limits,
        },
    })
}

fn container_status(c: &CapsuleContainer) -> ContainerStatus {
    let state = container_state(c);
    ContainerStatus {
        name: c.name.clone(),
        // No separate termination record exists; the current state doubles as it.
        last_state: Some(state.clone()),
        state: Some(state),
        ready: container_phase(&c.status) == PodPhase::Running,
        restart_count: 0,
        image: c.image.clone(),
        image_id: String::new(),
        container_id: c.container_id.clone(),
    }
}
