/// Hierarchy resolver
///
/// Walks task → section → project for a batch of ids. Each hop looks up the
/// distinct ids of that level concurrently and finishes before the next hop
/// starts, so two tasks in the same section cost one section lookup and one
/// project lookup.
///
/// A missing parent never aborts the walk. The ids below it are simply left
/// unresolved, and when the missing parent is referenced by an existing child
/// the broken link is recorded as an `Orphan`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;

use futures::future::try_join_all;
use tracing::debug;
use uuid::Uuid;

use super::batch::dedup_ids;
use super::outcome::{MissingIds, ResourceKind};
use crate::models::Project;
use crate::store::{EntityStore, StoreResult};

/// An existing entity whose parent does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    pub kind: ResourceKind,
    pub id: Uuid,
    pub parent_kind: ResourceKind,
    pub parent_id: Uuid,
}

impl fmt::Display for Orphan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} references missing {} {}",
            self.kind, self.id, self.parent_kind, self.parent_id
        )
    }
}

/// Everything learned while walking the hierarchy for one batch
#[derive(Debug, Clone)]
pub struct Resolution {
    requested: Vec<String>,
    owners: HashMap<String, Uuid>,
    projects: HashMap<Uuid, Project>,
    orphans: Vec<Orphan>,
}

impl Resolution {
    /// Requested ids without repeats, in first-seen order
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// The project owning `id`, if the whole chain up to it exists
    pub fn owner_of(&self, id: &str) -> Option<&Project> {
        self.owners
            .get(id)
            .and_then(|project_id| self.projects.get(project_id))
    }

    /// Requested ids that did not resolve to an existing project
    pub fn unresolved(&self) -> Vec<String> {
        self.requested
            .iter()
            .filter(|id| !self.owners.contains_key(id.as_str()))
            .cloned()
            .collect()
    }

    /// Broken parent links found along the way
    pub fn orphans(&self) -> &[Orphan] {
        &self.orphans
    }

    /// Maps every requested id to its owning project id, or names the ones
    /// that could not be resolved
    pub fn into_owner_map(self) -> Result<HashMap<String, Uuid>, MissingIds> {
        let unresolved = self.unresolved();
        if unresolved.is_empty() {
            Ok(self.owners)
        } else {
            Err(MissingIds(unresolved))
        }
    }
}

/// Looks up each distinct id once, all at the same time
async fn fetch_distinct<T, I, F, Fut>(ids: I, lookup: F) -> StoreResult<HashMap<Uuid, T>>
where
    I: IntoIterator<Item = Uuid>,
    F: Fn(Uuid) -> Fut,
    Fut: Future<Output = StoreResult<Option<T>>>,
{
    let distinct: HashSet<Uuid> = ids.into_iter().collect();

    let found = try_join_all(distinct.into_iter().map(|id| {
        let pending = lookup(id);
        async move { pending.await.map(|entity| entity.map(|entity| (id, entity))) }
    }))
    .await?;

    Ok(found.into_iter().flatten().collect())
}

/// Resolves resources to the project that owns them
pub struct HierarchyResolver<'a, S: EntityStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: EntityStore + ?Sized> HierarchyResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Walks the hierarchy for `ids` of the given kind
    ///
    /// Ids that are not UUIDs are never looked up and stay unresolved.
    ///
    /// # Errors
    ///
    /// Only a failing store aborts resolution.
    pub async fn resolve(&self, kind: ResourceKind, ids: &[String]) -> StoreResult<Resolution> {
        let requested = dedup_ids(ids);
        let parsed: Vec<(String, Uuid)> = requested
            .iter()
            .filter_map(|raw| Uuid::parse_str(raw).ok().map(|id| (raw.clone(), id)))
            .collect();

        let mut orphans = Vec::new();
        // section id -> project id, for every section seen on the way up
        let mut section_parents: HashMap<Uuid, Uuid> = HashMap::new();

        // requested id -> project id it claims to belong to
        let claimed: HashMap<Uuid, Uuid> = match kind {
            ResourceKind::Project => parsed.iter().map(|(_, id)| (*id, *id)).collect(),

            ResourceKind::Section => {
                let sections = fetch_distinct(parsed.iter().map(|(_, id)| *id), |id| {
                    self.store.find_section_by_id(id)
                })
                .await?;

                for (id, section) in &sections {
                    section_parents.insert(*id, section.project_id);
                }

                section_parents.clone()
            }

            ResourceKind::Task => {
                let tasks = fetch_distinct(parsed.iter().map(|(_, id)| *id), |id| {
                    self.store.find_task_by_id(id)
                })
                .await?;

                let sections = fetch_distinct(tasks.values().map(|t| t.section_id), |id| {
                    self.store.find_section_by_id(id)
                })
                .await?;

                for (id, section) in &sections {
                    section_parents.insert(*id, section.project_id);
                }

                let mut claimed = HashMap::with_capacity(tasks.len());
                for (task_id, task) in &tasks {
                    match section_parents.get(&task.section_id) {
                        Some(project_id) => {
                            claimed.insert(*task_id, *project_id);
                        }
                        None => orphans.push(Orphan {
                            kind: ResourceKind::Task,
                            id: *task_id,
                            parent_kind: ResourceKind::Section,
                            parent_id: task.section_id,
                        }),
                    }
                }

                claimed
            }
        };

        let projects = fetch_distinct(claimed.values().copied(), |id| {
            self.store.find_project_by_id(id)
        })
        .await?;

        for (section_id, project_id) in &section_parents {
            if !projects.contains_key(project_id) {
                orphans.push(Orphan {
                    kind: ResourceKind::Section,
                    id: *section_id,
                    parent_kind: ResourceKind::Project,
                    parent_id: *project_id,
                });
            }
        }

        let owners: HashMap<String, Uuid> = parsed
            .into_iter()
            .filter_map(|(raw, id)| {
                claimed
                    .get(&id)
                    .filter(|project_id| projects.contains_key(*project_id))
                    .map(|project_id| (raw, *project_id))
            })
            .collect();

        debug!(
            kind = %kind,
            requested = requested.len(),
            resolved = owners.len(),
            projects = projects.len(),
            "Resolved owning projects"
        );

        Ok(Resolution {
            requested,
            owners,
            projects,
            orphans,
        })
    }

    /// Maps each id to the id of its owning project
    ///
    /// The inner `Err` lists every id that could not be resolved, in request
    /// order; the outer `Err` is a store failure.
    pub async fn resolve_owning_project(
        &self,
        kind: ResourceKind,
        ids: &[String],
    ) -> StoreResult<Result<HashMap<String, Uuid>, MissingIds>> {
        Ok(self.resolve(kind, ids).await?.into_owner_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProject, CreateSection, CreateTask, CreateUser};
    use crate::store::{EntityRepository, MemoryStore};

    struct Board {
        store: MemoryStore,
        project_id: Uuid,
        section_id: Uuid,
        task_id: Uuid,
    }

    async fn board() -> Board {
        let store = MemoryStore::new();
        let owner = store
            .create_user(CreateUser {
                username: "owner".to_string(),
                email: "owner@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let project = store
            .create_project(
                owner.id,
                CreateProject {
                    name: "Board".to_string(),
                    background: None,
                    sections: Vec::new(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        let section = store
            .create_sections(project.id, CreateSection::defaults())
            .await
            .unwrap()
            .unwrap()
            .remove(0);
        let task = store
            .create_task(
                section.id,
                CreateTask {
                    name: "First".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        Board {
            store,
            project_id: project.id,
            section_id: section.id,
            task_id: task.id,
        }
    }

    #[tokio::test]
    async fn test_task_resolves_to_project() {
        let board = board().await;
        let resolver = HierarchyResolver::new(&board.store);
        let task = board.task_id.to_string();

        let owners = resolver
            .resolve_owning_project(ResourceKind::Task, &[task.clone()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(owners.get(&task), Some(&board.project_id));
    }

    #[tokio::test]
    async fn test_section_resolves_to_project() {
        let board = board().await;
        let resolver = HierarchyResolver::new(&board.store);
        let section = board.section_id.to_string();

        let owners = resolver
            .resolve_owning_project(ResourceKind::Section, &[section.clone()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(owners.get(&section), Some(&board.project_id));
    }

    #[tokio::test]
    async fn test_unresolved_ids_are_all_reported() {
        let board = board().await;
        let resolver = HierarchyResolver::new(&board.store);
        let missing = Uuid::new_v4().to_string();
        let ids = vec![
            "invalidid".to_string(),
            board.task_id.to_string(),
            missing.clone(),
        ];

        let result = resolver
            .resolve_owning_project(ResourceKind::Task, &ids)
            .await
            .unwrap();

        assert_eq!(
            result,
            Err(MissingIds(vec!["invalidid".to_string(), missing]))
        );
    }

    #[tokio::test]
    async fn test_missing_project_leaves_section_unresolved() {
        let board = board().await;
        board.store.detach_project(board.project_id).await;
        let resolver = HierarchyResolver::new(&board.store);

        let resolution = resolver
            .resolve(ResourceKind::Section, &[board.section_id.to_string()])
            .await
            .unwrap();

        assert_eq!(resolution.unresolved(), vec![board.section_id.to_string()]);
        assert_eq!(
            resolution.orphans(),
            [Orphan {
                kind: ResourceKind::Section,
                id: board.section_id,
                parent_kind: ResourceKind::Project,
                parent_id: board.project_id,
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_section_leaves_task_unresolved() {
        let board = board().await;
        board.store.detach_section(board.section_id).await;
        let resolver = HierarchyResolver::new(&board.store);

        let resolution = resolver
            .resolve(ResourceKind::Task, &[board.task_id.to_string()])
            .await
            .unwrap();

        assert_eq!(resolution.unresolved(), vec![board.task_id.to_string()]);
        assert_eq!(resolution.orphans().len(), 1);
        assert_eq!(resolution.orphans()[0].kind, ResourceKind::Task);
        assert_eq!(resolution.orphans()[0].parent_id, board.section_id);
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let board = board().await;
        let resolver = HierarchyResolver::new(&board.store);
        let project = board.project_id.to_string();

        let resolution = resolver
            .resolve(ResourceKind::Project, &[project.clone(), project.clone()])
            .await
            .unwrap();

        assert_eq!(resolution.requested(), [project.clone()]);
        assert_eq!(
            resolution.owner_of(&project).map(|p| p.id),
            Some(board.project_id)
        );
    }

    #[test]
    fn test_orphan_display() {
        let orphan = Orphan {
            kind: ResourceKind::Section,
            id: Uuid::nil(),
            parent_kind: ResourceKind::Project,
            parent_id: Uuid::nil(),
        };

        assert_eq!(
            orphan.to_string(),
            format!("section {} references missing project {}", Uuid::nil(), Uuid::nil())
        );
    }
}
