//! zunlet-core — shared types for the zunlet capsule provider.
//!
//! - **`pod`** — the control plane's workload model (Pod, Container, status)
//! - **`node`** — node registration types (conditions, addresses, endpoints)
//! - **`quantity`** — Kubernetes-style resource quantities
//! - **`config`** — `zunlet.toml` adapter configuration

pub mod config;
pub mod node;
pub mod pod;
pub mod quantity;

pub use config::ZunletConfig;
pub use node::*;
pub use pod::*;
pub use quantity::{Quantity, QuantityError};
