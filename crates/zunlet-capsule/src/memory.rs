//! In-memory capsule backend.
//!
//! Behaves like the remote API closely enough for provider tests: capsules
//! are keyed by name, listing is ordered by name and paginated with the last
//! name on a page as the marker, and unknown names yield `NotFound`.
//! Entries are stored as raw JSON so tests can plant malformed records.
//! One-shot failures can be armed on `get` and on a given `list_page` call.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::Utc;
use tracing::debug;

use crate::client::{CapsuleApi, CapsuleFuture};
use crate::error::{CapsuleError, CapsuleResult};
use crate::types::{
    Address, Capsule, CapsuleContainer, CapsulePage, CreateCapsuleRequest, RestartPolicy,
};

const DEFAULT_PAGE_SIZE: usize = 50;

pub struct InMemoryCapsules {
    capsules: Mutex<BTreeMap<String, serde_json::Value>>,
    page_size: usize,
    next_id: AtomicU64,
    list_calls: AtomicUsize,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    /// Fail the n-th `list_page` call (1-based, counted over the backend's life).
    list_page: Option<(usize, CapsuleError)>,
    get: Option<CapsuleError>,
}

impl Default for InMemoryCapsules {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCapsules {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            capsules: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            next_id: AtomicU64::new(1),
            list_calls: AtomicUsize::new(0),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Store a capsule under its `meta_name`, replacing any existing one.
    pub fn insert(&self, capsule: &Capsule) -> CapsuleResult<()> {
        let value =
            serde_json::to_value(capsule).map_err(|e| CapsuleError::Decode(e.to_string()))?;
        self.insert_raw(&capsule.meta_name, value);
        Ok(())
    }

    /// Make the `call`-th `list_page` call (1-based) fail with `error`.
    pub fn fail_list_page(&self, call: usize, error: CapsuleError) {
        self.faults().list_page = Some((call, error));
    }

    /// Make the next `get` fail with `error`.
    pub fn fail_get(&self, error: CapsuleError) {
        self.faults().get = Some(error);
    }

    /// Store an arbitrary JSON record under `name`.
    pub fn insert_raw(&self, name: &str, value: serde_json::Value) {
        self.lock().insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of `list_page` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, serde_json::Value>> {
        self.capsules.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_uuid(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("00000000-0000-4000-8000-{id:012}")
    }

    /// Materialize a request the way the engine would: it fills in the
    /// generated fields (uuid, timestamps, addresses) and starts every
    /// container in `Creating`.
    fn materialize(&self, request: &CreateCapsuleRequest) -> Capsule {
        let now = Utc::now();
        let id = self.next_id.load(Ordering::Relaxed);
        let containers = request
            .template
            .containers
            .iter()
            .map(|c| CapsuleContainer {
                name: c.name.clone(),
                uuid: self.next_uuid(),
                image: c.image.clone(),
                command: c.command.join(" "),
                status: "Creating".to_string(),
                cpu: c.cpu,
                memory: c.memory_mb().map(|mb| format!("{}M", mb.round() as u64)),
                workdir: c.work_dir.clone().unwrap_or_default(),
                image_pull_policy: c.image_pull_policy.clone().unwrap_or_default(),
                environment: c.environment.clone().into_iter().collect(),
                created_at: Some(now),
                updated_at: Some(now),
                ..CapsuleContainer::default()
            })
            .collect();

        Capsule {
            uuid: self.next_uuid(),
            status: "Pending".to_string(),
            meta_name: request.name.clone(),
            meta_labels: request.labels.clone(),
            restart_policy: Some(RestartPolicy::Name(request.template.restart_policy.clone())),
            capsule_version: request.template.capsule_version.clone(),
            created_at: Some(now),
            updated_at: Some(now),
            addresses: BTreeMap::from([(
                "private".to_string(),
                vec![Address {
                    addr: format!("10.0.{}.{}", (id / 250) % 250, id % 250 + 2),
                    version: 4.0,
                    ..Address::default()
                }],
            )]),
            containers,
            ..Capsule::default()
        }
    }
}

impl CapsuleApi for InMemoryCapsules {
    fn create<'a>(&'a self, request: &'a CreateCapsuleRequest) -> CapsuleFuture<'a, Capsule> {
        Box::pin(async move {
            if self.contains(&request.name) {
                return Err(CapsuleError::Conflict(request.name.clone()));
            }
            let capsule = self.materialize(request);
            self.insert(&capsule)?;
            debug!(name = %request.name, uuid = %capsule.uuid, "in-memory capsule created");
            Ok(capsule)
        })
    }

    fn get<'a>(&'a self, name: &'a str) -> CapsuleFuture<'a, Capsule> {
        Box::pin(async move {
            if let Some(error) = self.faults().get.take() {
                return Err(error);
            }
            let value = self
                .lock()
                .get(name)
                .cloned()
                .ok_or_else(|| CapsuleError::NotFound(name.to_string()))?;
            serde_json::from_value(value).map_err(|e| CapsuleError::Decode(e.to_string()))
        })
    }

    fn list_page<'a>(&'a self, marker: Option<&'a str>) -> CapsuleFuture<'a, CapsulePage> {
        Box::pin(async move {
            let call = self.list_calls.fetch_add(1, Ordering::Relaxed) + 1;
            {
                let mut faults = self.faults();
                if faults.list_page.as_ref().is_some_and(|(n, _)| *n == call) {
                    if let Some((_, error)) = faults.list_page.take() {
                        return Err(error);
                    }
                }
            }
            let capsules = self.lock();
            let mut remaining = capsules
                .iter()
                .filter(|(name, _)| marker.is_none_or(|m| name.as_str() > m))
                .peekable();

            let mut entries = Vec::with_capacity(self.page_size);
            let mut last = None;
            while entries.len() < self.page_size {
                match remaining.next() {
                    Some((name, value)) => {
                        entries.push(value.clone());
                        last = Some(name.clone());
                    }
                    None => break,
                }
            }

            let next_marker = if remaining.peek().is_some() { last } else { None };
            Ok(CapsulePage {
                entries,
                next_marker,
            })
        })
    }

    fn delete<'a>(&'a self, name: &'a str) -> CapsuleFuture<'a, ()> {
        Box::pin(async move {
            self.lock()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| CapsuleError::NotFound(name.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::{CAPSULE_VERSION, CapsuleTemplate, ContainerTemplate};

    fn request(name: &str) -> CreateCapsuleRequest {
        CreateCapsuleRequest {
            name: name.to_string(),
            labels: HashMap::from([("PodName".to_string(), "web".to_string())]),
            template: CapsuleTemplate {
                capsule_version: CAPSULE_VERSION.to_string(),
                restart_policy: "Always".to_string(),
                containers: vec![ContainerTemplate {
                    name: "c1".to_string(),
                    image: "nginx".to_string(),
                    memory_gb: Some(0.5),
                    ..ContainerTemplate::default()
                }],
            },
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let api = InMemoryCapsules::new();
        let created = api.create(&request("ns1-web")).await.unwrap();
        assert!(!created.uuid.is_empty());

        let fetched = api.get("ns1-web").await.unwrap();
        assert_eq!(fetched.uuid, created.uuid);
        assert_eq!(fetched.meta_labels["PodName"], "web");
        assert_eq!(fetched.containers[0].memory.as_deref(), Some("512M"));
        assert_eq!(fetched.containers[0].status, "Creating");
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let api = InMemoryCapsules::new();
        api.create(&request("ns1-web")).await.unwrap();
        let err = api.create(&request("ns1-web")).await.unwrap_err();
        assert!(matches!(err, CapsuleError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_capsule_is_not_found() {
        let api = InMemoryCapsules::new();
        assert!(api.get("nope").await.unwrap_err().is_not_found());
        assert!(api.delete("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_removes() {
        let api = InMemoryCapsules::new();
        api.create(&request("ns1-web")).await.unwrap();
        api.delete("ns1-web").await.unwrap();
        assert!(api.is_empty());
    }

    #[tokio::test]
    async fn pages_by_marker() {
        let api = InMemoryCapsules::with_page_size(2);
        for name in ["a", "b", "c"] {
            api.insert_raw(name, serde_json::json!({"meta_name": name}));
        }

        let first = api.list_page(None).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.next_marker.as_deref(), Some("b"));

        let second = api.list_page(Some("b")).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.next_marker, None);
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn armed_list_failure_fires_once_on_its_call() {
        let api = InMemoryCapsules::with_page_size(1);
        api.insert_raw("a", serde_json::json!({"meta_name": "a"}));
        api.fail_list_page(2, CapsuleError::Transport("reset".to_string()));

        assert!(api.list_page(None).await.is_ok());
        assert!(matches!(
            api.list_page(None).await,
            Err(CapsuleError::Transport(_))
        ));
        assert!(api.list_page(None).await.is_ok());
    }

    #[tokio::test]
    async fn armed_get_failure_fires_once() {
        let api = InMemoryCapsules::new();
        api.create(&request("ns1-web")).await.unwrap();
        api.fail_get(CapsuleError::Timeout(std::time::Duration::from_secs(1)));

        assert!(matches!(api.get("ns1-web").await, Err(CapsuleError::Timeout(_))));
        assert!(api.get("ns1-web").await.is_ok());
    }
}
