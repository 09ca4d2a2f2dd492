//! The workload provider capability set.

use std::future::Future;
use std::pin::Pin;

use zunlet_core::{NodeAddress, NodeCondition, NodeDaemonEndpoints, Pod, PodStatus, ResourceList};

use crate::error::ProviderResult;

/// Boxed future alias for provider operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send + 'a>>;

/// Operations a node agent dispatches to a workload backend.
///
/// Pod operations talk to the backend; node operations are static answers
/// derived from configuration. Object-safe so backends can be swapped
/// behind `Box<dyn Provider>`.
pub trait Provider: Send + Sync {
    /// Fetch one pod. A missing pod is an error.
    fn get_pod<'a>(&'a self, namespace: &'a str, name: &'a str) -> ProviderFuture<'a, Pod>;

    /// All pods placed on this node.
    fn get_pods(&self) -> ProviderFuture<'_, Vec<Pod>>;

    /// Status of one pod, or `None` when it does not exist.
    fn get_pod_status<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> ProviderFuture<'a, Option<PodStatus>>;

    fn create_pod<'a>(&'a self, pod: &'a Pod) -> ProviderFuture<'a, ()>;

    fn update_pod<'a>(&'a self, pod: &'a Pod) -> ProviderFuture<'a, ()>;

    fn delete_pod<'a>(&'a self, pod: &'a Pod) -> ProviderFuture<'a, ()>;

    fn get_container_logs<'a>(
        &'a self,
        namespace: &'a str,
        pod_name: &'a str,
        container_name: &'a str,
        tail: usize,
    ) -> ProviderFuture<'a, String>;

    fn capacity(&self) -> ResourceList;

    fn node_conditions(&self) -> Vec<NodeCondition>;

    fn node_addresses(&self) -> Vec<NodeAddress>;

    fn node_daemon_endpoints(&self) -> NodeDaemonEndpoints;

    fn operating_system(&self) -> String;
}
