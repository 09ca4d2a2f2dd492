use std::path::Path;

use serde_json::{Value, json};
use tracing::info;
use zunlet_core::Pod;
use zunlet_provider::Provider;

pub async fn list(provider: &dyn Provider) -> anyhow::Result<Value> {
    let pods = provider.get_pods().await?;
    info!(count = pods.len(), "pods listed");
    Ok(serde_json::to_value(pods)?)
}

pub async fn get(provider: &dyn Provider, namespace: &str, name: &str) -> anyhow::Result<Value> {
    let pod = provider.get_pod(namespace, name).await?;
    Ok(serde_json::to_value(pod)?)
}

pub async fn status(provider: &dyn Provider, namespace: &str, name: &str) -> anyhow::Result<Value> {
    let status = provider.get_pod_status(namespace, name).await?;
    Ok(serde_json::to_value(status)?)
}

pub async fn create(provider: &dyn Provider, file: &Path) -> anyhow::Result<Value> {
    let manifest = std::fs::read_to_string(file)?;
    let pod: Pod = serde_json::from_str(&manifest)?;
    provider.create_pod(&pod).await?;
    Ok(json!({ "created": pod.key() }))
}

pub async fn delete(provider: &dyn Provider, namespace: &str, name: &str) -> anyhow::Result<Value> {
    let mut pod = Pod::default();
    pod.metadata.namespace = namespace.to_string();
    pod.metadata.name = name.to_string();
    provider.delete_pod(&pod).await?;
    Ok(json!({ "deleted": pod.key() }))
}

pub async fn logs(
    provider: &dyn Provider,
    namespace: &str,
    pod: &str,
    container: &str,
    tail: usize,
) -> anyhow::Result<Value> {
    let logs = provider
        .get_container_logs(namespace, pod, container, tail)
        .await?;
    Ok(Value::String(logs))
}
