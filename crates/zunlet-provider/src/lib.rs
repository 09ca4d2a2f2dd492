//! zunlet-provider — runs pods as remote capsules.
//!
//! Implements the [`Provider`] capability set on top of a
//! [`zunlet_capsule::CapsuleApi`] backend. The provider keeps no state of
//! its own: every call re-reads or re-derives from the remote engine.
//!
//! # Architecture
//!
//! ```text
//! ZunProvider (Provider)
//!   ├── to_capsule   Pod → CreateCapsuleRequest
//!   ├── to_pod       Capsule → Pod (+ container statuses)
//!   │   ├── labels     capsule name + correlation labels
//!   │   ├── resources  cores/GB/MB ↔ quantities
//!   │   └── state      remote status strings → phases / container states
//!   ├── node         static capacity, conditions, endpoints
//!   └── Arc<dyn CapsuleApi>
//! ```
//!
//! Identity flows one way: the label mapping written at create time is the
//! only source for namespace, name, node, cluster and UID when reading a
//! capsule back. The capsule name is never parsed.

pub mod error;
pub mod labels;
pub mod node;
pub mod provider;
pub mod resources;
pub mod state;
pub mod to_capsule;
pub mod to_pod;
pub mod zun;

pub use error::{ProviderError, ProviderResult, TranslateError};
pub use provider::{Provider, ProviderFuture};
pub use to_capsule::pod_to_capsule;
pub use to_pod::capsule_to_pod;
pub use zun::ZunProvider;
