//! Pod → capsule creation request.

use std::collections::BTreeMap;

use zunlet_capsule::{CAPSULE_VERSION, CapsuleTemplate, ContainerTemplate, CreateCapsuleRequest};
use zunlet_core::{Container, Pod};

use crate::error::TranslateError;
use crate::labels::{build_labels, capsule_name};
use crate::resources::{cpu_cores, memory_gb};

/// Restart policy sent when the pod leaves it unset.
pub const DEFAULT_RESTART_POLICY: &str = "Always";

/// Build the creation request for `pod`.
///
/// All-or-nothing: the first bad container fails the whole pod, so nothing
/// reaches the engine for a pod that cannot be fully described.
pub fn pod_to_capsule(pod: &Pod) -> Result<CreateCapsuleRequest, TranslateError> {
    let meta = &pod.metadata;
    if meta.name.is_empty() {
        return Err(TranslateError::InvalidPod("metadata.name"));
    }
    if meta.namespace.is_empty() {
        return Err(TranslateError::InvalidPod("metadata.namespace"));
    }
    if pod.spec.containers.is_empty() {
        return Err(TranslateError::NoContainers(pod.key()));
    }

    let containers = pod
        .spec
        .containers
        .iter()
        .map(container_template)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CreateCapsuleRequest {
        name: capsule_name(&meta.namespace, &meta.name),
        labels: build_labels(pod),
        template: CapsuleTemplate {
            capsule_version: CAPSULE_VERSION.to_string(),
            restart_policy: pod
                .spec
                .restart_policy
                .clone()
                .unwrap_or_else(|| DEFAULT_RESTART_POLICY.to_string()),
            containers,
        },
    })
}

fn container_template(container: &Container) -> Result<ContainerTemplate, TranslateError> {
    let invalid = |reason: &str| TranslateError::InvalidContainer {
        container: container.name.clone(),
        reason: reason.to_string(),
    };
    if container.name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if container.image.is_empty() {
        return Err(invalid("image is empty"));
    }

    // Later entries win, as the runtime would apply them.
    let environment: BTreeMap<String, String> = container
        .env
        .iter()
        .map(|e| (e.name.clone(), e.value.clone().unwrap_or_default()))
        .collect();

    let limits = &container.resources.limits;
    Ok(ContainerTemplate {
        name: container.name.clone(),
        image: container.image.clone(),
        command: container
            .command
            .iter()
            .chain(&container.args)
            .cloned()
            .collect(),
        work_dir: container.working_dir.clone().filter(|d| !d.is_empty()),
        image_pull_policy: container.image_pull_policy.clone(),
        environment,
        cpu: cpu_cores(&container.name, limits)?,
        memory_gb: memory_gb(&container.name, limits)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zunlet_core::{
        EnvVar, ObjectMeta, PodSpec, Quantity, RESOURCE_CPU, RESOURCE_MEMORY,
        ResourceRequirements,
    };

    fn container(name: &str, image: &str) -> Container {
        Container {
            name: name.to_string(),
            image: image.to_string(),
            ..Container::default()
        }
    }

    fn pod(containers: Vec<Container>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: "web".to_string(),
                namespace: "ns1".to_string(),
                ..ObjectMeta::default()
            },
            spec: PodSpec {
                node_name: "virtual-zun".to_string(),
                containers,
                ..PodSpec::default()
            },
            ..Pod::default()
        }
    }

    #[test]
    fn nginx_scenario() {
        let mut c1 = container("c1", "nginx");
        c1.resources = ResourceRequirements {
            limits: [
                (RESOURCE_CPU.to_string(), Quantity::from("500m")),
                (RESOURCE_MEMORY.to_string(), Quantity::from("256Mi")),
            ]
            .into(),
            ..ResourceRequirements::default()
        };

        let request = pod_to_capsule(&pod(vec![c1])).unwrap();
        assert_eq!(request.name, "ns1-web");
        assert_eq!(request.template.capsule_version, "beta");
        assert_eq!(request.template.restart_policy, "Always");

        let t = &request.template.containers[0];
        assert_eq!(t.cpu, Some(0.5));
        let gb = t.memory_gb.unwrap();
        assert!((gb - 0.268).abs() < 0.001, "memory {gb}");
    }

    #[test]
    fn copies_container_fields() {
        let mut c = container("app", "busybox");
        c.command = vec!["sh".to_string(), "-c".to_string()];
        c.args = vec!["sleep 3600".to_string()];
        c.working_dir = Some("/srv".to_string());
        c.image_pull_policy = Some("IfNotPresent".to_string());
        c.env = vec![
            EnvVar { name: "MODE".to_string(), value: Some("a".to_string()) },
            EnvVar { name: "EMPTY".to_string(), value: None },
            EnvVar { name: "MODE".to_string(), value: Some("b".to_string()) },
        ];
        let mut p = pod(vec![c]);
        p.spec.restart_policy = Some("OnFailure".to_string());

        let request = pod_to_capsule(&p).unwrap();
        assert_eq!(request.template.restart_policy, "OnFailure");

        let t = &request.template.containers[0];
        assert_eq!(t.command, ["sh", "-c", "sleep 3600"]);
        assert_eq!(t.work_dir.as_deref(), Some("/srv"));
        assert_eq!(t.image_pull_policy.as_deref(), Some("IfNotPresent"));
        assert_eq!(t.environment["MODE"], "b");
        assert_eq!(t.environment["EMPTY"], "");
        assert_eq!(t.cpu, None);
        assert_eq!(t.memory_gb, None);
    }

    #[test]
    fn labels_carry_identity() {
        let request = pod_to_capsule(&pod(vec![container("c", "img")])).unwrap();
        assert_eq!(request.labels["PodName"], "web");
        assert_eq!(request.labels["Namespace"], "ns1");
        assert_eq!(request.labels["NodeName"], "virtual-zun");
    }

    #[test]
    fn pod_without_containers_is_rejected() {
        assert!(matches!(
            pod_to_capsule(&pod(vec![])),
            Err(TranslateError::NoContainers(key)) if key == "ns1/web"
        ));
    }

    #[test]
    fn one_bad_container_fails_the_pod() {
        let mut bad = container("bad", "img");
        bad.resources.limits.insert(RESOURCE_MEMORY.to_string(), Quantity::from("many"));
        let err = pod_to_capsule(&pod(vec![container("good", "img"), bad])).unwrap_err();
        assert!(matches!(err, TranslateError::Quantity { resource: "memory", .. }));

        let err = pod_to_capsule(&pod(vec![container("noimage", "")])).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidContainer { .. }));
    }

    #[test]
    fn pod_needs_name_and_namespace() {
        let mut p = pod(vec![container("c", "img")]);
        p.metadata.namespace.clear();
        assert!(matches!(
            pod_to_capsule(&p),
            Err(TranslateError::InvalidPod("metadata.namespace"))
        ));
    }
}
