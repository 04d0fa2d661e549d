use std::future::Future;

use dualstore_core::{RepoError, Task};
use uuid::Uuid;

/// The abstract port every concrete store adapter satisfies (spec.md §4.1).
///
/// [`crate::DualDispatcher`] is generic over two implementors of this trait —
/// it never needs the adapters to be trait objects, so the methods are
/// expressed as native `async fn`-in-trait (return-position `impl Future`)
/// rather than pulling in `async-trait`.
pub trait TaskRepository: Send + Sync {
    /// Idempotent upsert by id.
    fn save(&self, task: Task) -> impl Future<Output = Result<(), RepoError>> + Send;

    /// Lookup by id. `Ok(None)` distinguishes "absent" from "lookup failed" —
    /// absence is never an error.
    fn get(&self, id: Uuid) -> impl Future<Output = Result<Option<Task>, RepoError>> + Send;

    /// Enumerates all tasks; order is unspecified.
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, RepoError>> + Send;

    /// Removes by id. Deleting an absent id is a no-op, not an error.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), RepoError>> + Send;
}
