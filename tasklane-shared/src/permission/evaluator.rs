/// Permission evaluator
///
/// Decides whether a user may act on a batch of projects, sections or tasks.
/// A user may act on a resource exactly when they are a member of the project
/// that owns it. The evaluator never writes to the store.

use tracing::{debug, error};
use uuid::Uuid;

use super::outcome::{aggregate, Outcome, ResourceKind, Verdict};
use super::resolver::HierarchyResolver;
use crate::store::{EntityStore, StoreResult};

/// Checks membership-based access against an entity store
pub struct PermissionEvaluator<'a, S: EntityStore + ?Sized> {
    resolver: HierarchyResolver<'a, S>,
}

impl<'a, S: EntityStore + ?Sized> PermissionEvaluator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            resolver: HierarchyResolver::new(store),
        }
    }

    /// Checks whether `user_id` may act on every id in `ids`
    ///
    /// Unresolvable ids (nonexistent, malformed, or whose parent chain is
    /// broken) make the outcome `NotFound`, which wins over `Forbidden`. An
    /// empty batch is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub async fn check_access(
        &self,
        user_id: Uuid,
        kind: ResourceKind,
        ids: &[String],
    ) -> StoreResult<Outcome> {
        let resolution = self.resolver.resolve(kind, ids).await?;

        for orphan in resolution.orphans() {
            error!(
                kind = %orphan.kind,
                id = %orphan.id,
                parent_kind = %orphan.parent_kind,
                parent_id = %orphan.parent_id,
                "Orphaned entity: parent does not exist"
            );
        }

        let outcome = aggregate(resolution.requested().iter().map(|id| {
            let verdict = match resolution.owner_of(id) {
                None => Verdict::NotFound,
                Some(project) if project.has_member(user_id) => Verdict::Allowed,
                Some(_) => Verdict::Forbidden,
            };
            (id.as_str(), verdict)
        }));

        debug!(
            user_id = %user_id,
            kind = %kind,
            ids = resolution.requested().len(),
            outcome = ?outcome,
            "Access checked"
        );

        Ok(outcome)
    }
}

/// Shorthand for `PermissionEvaluator::new(store).check_access(..)`
pub async fn check_access<S: EntityStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    kind: ResourceKind,
    ids: &[String],
) -> StoreResult<Outcome> {
    PermissionEvaluator::new(store)
        .check_access(user_id, kind, ids)
        .await
}
