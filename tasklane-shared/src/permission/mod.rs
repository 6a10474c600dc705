/// Membership-based access control
///
/// Everything in Tasklane hangs off a project, and a user may act on a
/// project, section or task exactly when they are a member of the owning
/// project. This module answers that question for a batch of ids at once.
///
/// # Components
///
/// - `evaluator`: `check_access(user, kind, ids)` and the `PermissionEvaluator`
/// - `resolver`: walks task → section → project with deduplicated, concurrent lookups
/// - `outcome`: per-id verdicts and the aggregation into one `Outcome`
/// - `batch`: id deduplication and matching for bulk fetches
///
/// # Example
///
/// ```no_run
/// use tasklane_shared::permission::{check_access, Outcome, ResourceKind};
/// use tasklane_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// match check_access(&store, user_id, ResourceKind::Task, &[task_id.to_string()]).await? {
///     Outcome::Allowed => println!("go ahead"),
///     Outcome::NotFound(ids) => println!("no such task: {ids:?}"),
///     Outcome::Forbidden(ids) => println!("not a member for: {ids:?}"),
/// }
/// # Ok(())
/// # }
/// ```

pub mod batch;
pub mod evaluator;
pub mod outcome;
pub mod resolver;

pub use batch::{collect_found, dedup_ids, parse_ids};
pub use evaluator::{check_access, PermissionEvaluator};
pub use outcome::{aggregate, MissingIds, Outcome, ResourceKind, Verdict};
pub use resolver::{HierarchyResolver, Orphan, Resolution};
