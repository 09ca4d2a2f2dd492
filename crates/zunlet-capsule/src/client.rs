//! The remote capsule API contract.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::error::CapsuleResult;
use crate::types::{Capsule, CapsulePage, CreateCapsuleRequest};

/// Boxed future alias for capsule API results.
pub type CapsuleFuture<'a, T> = Pin<Box<dyn Future<Output = CapsuleResult<T>> + Send + 'a>>;

/// Request/response operations against the remote capsule engine.
///
/// Capsules are addressed by name for create, get and delete. Listing is
/// paginated by marker. Implementations must be shareable across tasks;
/// the provider holds one instance behind an `Arc` for its whole life.
pub trait CapsuleApi: Send + Sync {
    /// Submit a capsule creation request. Returns the capsule as accepted.
    fn create<'a>(&'a self, request: &'a CreateCapsuleRequest) -> CapsuleFuture<'a, Capsule>;

    /// Fetch a capsule by name.
    fn get<'a>(&'a self, name: &'a str) -> CapsuleFuture<'a, Capsule>;

    /// Fetch one page of the capsule listing, starting after `marker`.
    fn list_page<'a>(&'a self, marker: Option<&'a str>) -> CapsuleFuture<'a, CapsulePage>;

    /// Delete a capsule by name. Deleting a missing capsule is an error.
    fn delete<'a>(&'a self, name: &'a str) -> CapsuleFuture<'a, ()>;
}

/// Walk the capsule listing page by page.
///
/// `visit` returns `false` to stop early. Returns the number of pages
/// visited. A transport error on any page aborts the walk.
pub async fn each_page<F>(api: &dyn CapsuleApi, mut visit: F) -> CapsuleResult<usize>
where
    F: FnMut(CapsulePage) -> bool,
{
    let mut marker: Option<String> = None;
    let mut pages = 0;

    loop {
        let page = api.list_page(marker.as_deref()).await?;
        pages += 1;
        let next = page.next_marker.clone();
        debug!(page = pages, entries = page.len(), next = ?next, "capsule page fetched");

        if !visit(page) {
            break;
        }

        match next {
            Some(next) if marker.as_deref() == Some(next.as_str()) => {
                warn!(marker = %next, "capsule listing repeated its marker, stopping");
                break;
            }
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    Ok(pages)
}
