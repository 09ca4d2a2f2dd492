use serde_json::{Value, json};
use zunlet_provider::Provider;

/// Everything the node registers with the control plane.
pub fn report(provider: &dyn Provider) -> Value {
    json!({
        "capacity": provider.capacity(),
        "conditions": provider.node_conditions(),
        "addresses": provider.node_addresses(),
        "daemonEndpoints": provider.node_daemon_endpoints(),
        "operatingSystem": provider.operating_system(),
    })
}
