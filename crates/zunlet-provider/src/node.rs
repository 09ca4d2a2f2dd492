//! Node registration answers. Pure functions of configuration.

use chrono::{DateTime, Utc};
use zunlet_core::config::ZunletConfig;
use zunlet_core::{
    ConditionStatus, DaemonEndpoint, NodeAddress, NodeCondition, NodeDaemonEndpoints,
    RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_PODS, ResourceList,
};

/// Capacity advertised for the virtual node.
pub fn capacity(config: &ZunletConfig) -> ResourceList {
    ResourceList::from([
        (RESOURCE_CPU.to_string(), config.capacity.cpu()),
        (RESOURCE_MEMORY.to_string(), config.capacity.memory()),
        (RESOURCE_PODS.to_string(), config.capacity.pods()),
    ])
}

/// The fixed, always-healthy condition set, stamped with `now`.
pub fn conditions(now: DateTime<Utc>) -> Vec<NodeCondition> {
    let condition = |type_: &str, status, reason: &str, message: &str| NodeCondition {
        type_: type_.to_string(),
        status,
        last_heartbeat_time: now,
        last_transition_time: now,
        reason: reason.to_string(),
        message: message.to_string(),
    };

    vec![
        condition("Ready", ConditionStatus::True, "KubeletReady", "kubelet is ready."),
        condition(
            "OutOfDisk",
            ConditionStatus::False,
            "KubeletHasSufficientDisk",
            "kubelet has sufficient disk space available",
        ),
        condition(
            "MemoryPressure",
            ConditionStatus::False,
            "KubeletHasSufficientMemory",
            "kubelet has sufficient memory available",
        ),
        condition(
            "DiskPressure",
            ConditionStatus::False,
            "KubeletHasNoDiskPressure",
            "kubelet has no disk pressure",
        ),
        condition(
            "NetworkUnavailable",
            ConditionStatus::False,
            "RouteCreated",
            "RouteController created a route",
        ),
    ]
}

/// The virtual node has no addresses of its own.
pub fn addresses() -> Vec<NodeAddress> {
    Vec::new()
}

pub fn daemon_endpoints(config: &ZunletConfig) -> NodeDaemonEndpoints {
    NodeDaemonEndpoints {
        kubelet_endpoint: DaemonEndpoint {
            port: config.node.daemon_port,
        },
    }
}

pub fn operating_system(config: &ZunletConfig) -> String {
    config.node.operating_system.clone()
}
