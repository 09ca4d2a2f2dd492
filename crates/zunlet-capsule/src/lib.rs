//! zunlet-capsule — client side of the remote capsule API.
//!
//! A capsule is the remote engine's unit of scheduling: a named group of
//! containers with labels, addresses and a lifecycle status. This crate
//! owns the wire model and the transport; it knows nothing about pods.
//!
//! # Architecture
//!
//! ```text
//! CapsuleApi (trait, boxed futures)
//!   ├── HttpCapsuleClient   hyper/http1 against {endpoint}/capsules
//!   └── InMemoryCapsules    map-backed, for tests and dry runs
//! each_page()               marker-driven pager over list_page()
//! Session                   endpoint + token + region from env/config
//! ```

pub mod client;
pub mod error;
pub mod http_client;
pub mod memory;
pub mod session;
pub mod timestamp;
pub mod types;

pub use client::{CapsuleApi, CapsuleFuture, each_page};
pub use error::{CapsuleError, CapsuleResult};
pub use http_client::HttpCapsuleClient;
pub use memory::InMemoryCapsules;
pub use session::Session;
pub use types::*;
