//! Provider backed by the remote capsule engine.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use zunlet_capsule::{Capsule, CapsuleApi, CapsuleError, HttpCapsuleClient, Session, each_page};
use zunlet_core::config::ZunletConfig;
use zunlet_core::{NodeAddress, NodeCondition, NodeDaemonEndpoints, Pod, PodStatus, ResourceList};

use crate::error::{ProviderError, ProviderResult};
use crate::labels::{capsule_name, meta_name_of, node_name_of};
use crate::node;
use crate::provider::{Provider, ProviderFuture};
use crate::to_capsule::pod_to_capsule;
use crate::to_pod::capsule_to_pod;

/// Placeholder returned for every log request.
pub const LOGS_UNSUPPORTED: &str = "not support in Zun Provider";

/// Runs pods as capsules on the remote engine.
///
/// Holds no state beyond its configuration and the shared API client;
/// every call goes back to the engine.
pub struct ZunProvider {
    api: Arc<dyn CapsuleApi>,
    config: ZunletConfig,
}

impl ZunProvider {
    pub fn new(api: Arc<dyn CapsuleApi>, config: ZunletConfig) -> Self {
        info!(
            node = %config.node.name,
            os = %config.node.operating_system,
            port = config.node.daemon_port,
            "zun provider ready"
        );
        Self { api, config }
    }

    /// Provider talking HTTP to the endpoint named by the environment or
    /// the `[remote]` section.
    pub fn from_config(config: ZunletConfig) -> ProviderResult<Self> {
        let session = Session::from_env(&config.remote)?;
        let client = HttpCapsuleClient::new(session)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn node_name(&self) -> &str {
        &self.config.node.name
    }

    async fn fetch(&self, namespace: &str, name: &str) -> ProviderResult<Capsule> {
        Ok(self.api.get(&capsule_name(namespace, name)).await?)
    }

    async fn list_pods(&self) -> ProviderResult<Vec<Pod>> {
        // Count pages first so the result can be sized up front.
        let pages = each_page(self.api.as_ref(), |_| true).await?;

        let node_name = self.node_name();
        let mut pods = Vec::with_capacity(pages);
        let mut skipped = 0usize;
        each_page(self.api.as_ref(), |page| {
            for entry in &page.entries {
                let capsule = meta_name_of(entry);
                if node_name_of(entry) != Some(node_name) {
                    debug!(%capsule, node = ?node_name_of(entry), "capsule belongs to another node");
                    continue;
                }
                let translated = Capsule::from_json_value(entry)
                    .map_err(ProviderError::from)
                    .and_then(|c| capsule_to_pod(&c).map_err(ProviderError::from));
                match translated {
                    Ok(pod) => pods.push(pod),
                    Err(e) => {
                        skipped += 1;
                        warn!(%capsule, error = %e, "skipping unreadable capsule");
                    }
                }
            }
            true
        })
        .await?;

        debug!(pages, pods = pods.len(), skipped, "capsule listing reconciled");
        Ok(pods)
    }
}

impl Provider for ZunProvider {
    fn get_pod<'a>(&'a self, namespace: &'a str, name: &'a str) -> ProviderFuture<'a, Pod> {
        Box::pin(async move {
            let capsule = self.fetch(namespace, name).await?;
            Ok(capsule_to_pod(&capsule)?)
        })
    }

    fn get_pods(&self) -> ProviderFuture<'_, Vec<Pod>> {
        Box::pin(self.list_pods())
    }

    fn get_pod_status<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> ProviderFuture<'a, Option<PodStatus>> {
        Box::pin(async move {
            match self.get_pod(namespace, name).await {
                Ok(pod) => Ok(Some(pod.status)),
                Err(ProviderError::Remote(CapsuleError::NotFound(_))) => {
                    debug!(%namespace, %name, "pod has no capsule");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
    }

    fn create_pod<'a>(&'a self, pod: &'a Pod) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let request = pod_to_capsule(pod)?;
            let capsule = self.api.create(&request).await?;
            info!(
                pod = %pod.key(),
                capsule = %request.name,
                uuid = %capsule.uuid,
                containers = request.template.containers.len(),
                "capsule created"
            );
            Ok(())
        })
    }

    fn update_pod<'a>(&'a self, pod: &'a Pod) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            debug!(pod = %pod.key(), "live update unsupported, ignoring");
            Ok(())
        })
    }

    fn delete_pod<'a>(&'a self, pod: &'a Pod) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let name = capsule_name(&pod.metadata.namespace, &pod.metadata.name);
            self.api.delete(&name).await?;
            info!(pod = %pod.key(), capsule = %name, "capsule deleted");
            Ok(())
        })
    }

    fn get_container_logs<'a>(
        &'a self,
        namespace: &'a str,
        pod_name: &'a str,
        container_name: &'a str,
        tail: usize,
    ) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            debug!(%namespace, pod = %pod_name, container = %container_name, tail, "log retrieval unsupported");
            Ok(LOGS_UNSUPPORTED.to_string())
        })
    }

    fn capacity(&self) -> ResourceList {
        node::capacity(&self.config)
    }

    fn node_conditions(&self) -> Vec<NodeCondition> {
        node::conditions(Utc::now())
    }

    fn node_addresses(&self) -> Vec<NodeAddress> {
        node::addresses()
    }

    fn node_daemon_endpoints(&self) -> NodeDaemonEndpoints {
        node::daemon_endpoints(&self.config)
    }

    fn operating_system(&self) -> String {
        node::operating_system(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zunlet_capsule::InMemoryCapsules;
    use zunlet_core::{Container, ObjectMeta, PodSpec};

    fn provider(api: Arc<InMemoryCapsules>) -> ZunProvider {
        ZunProvider::new(api, ZunletConfig::default())
    }

    fn pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: "default".to_string(),
                uid: format!("uid-{name}"),
                ..ObjectMeta::default()
            },
            spec: PodSpec {
                node_name: "virtual-zun".to_string(),
                containers: vec![Container {
                    name: "main".to_string(),
                    image: "busybox".to_string(),
                    ..Container::default()
                }],
                ..PodSpec::default()
            },
            ..Pod::default()
        }
    }

    #[tokio::test]
    async fn bad_pod_never_reaches_the_engine() {
        let api = Arc::new(InMemoryCapsules::new());
        let p = provider(api.clone());

        let mut bad = pod("empty");
        bad.spec.containers.clear();
        let err = p.create_pod(&bad).await.unwrap_err();
        assert!(matches!(err, ProviderError::Translate(_)));
        assert!(api.is_empty());
    }

    #[tokio::test]
    async fn create_twice_surfaces_conflict() {
        let api = Arc::new(InMemoryCapsules::new());
        let p = provider(api.clone());

        p.create_pod(&pod("web")).await.unwrap();
        let err = p.create_pod(&pod("web")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Remote(CapsuleError::Conflict(_))));
    }

    #[tokio::test]
    async fn get_pod_reports_not_found_as_error() {
        let p = provider(Arc::new(InMemoryCapsules::new()));
        let err = p.get_pod("default", "ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn node_answers_come_from_config() {
        let p = provider(Arc::new(InMemoryCapsules::new()));
        assert_eq!(p.operating_system(), "Linux");
        assert_eq!(p.node_daemon_endpoints().kubelet_endpoint.port, 10250);
        assert_eq!(p.node_conditions().len(), 5);
        assert!(p.node_addresses().is_empty());
        assert_eq!(p.capacity()["pods"].as_str(), "20");
    }
}
