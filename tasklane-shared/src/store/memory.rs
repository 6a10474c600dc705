/// In-memory entity store
///
/// All entities live in one set of maps behind a single `tokio::sync::RwLock`.
/// Unlike PostgreSQL, where child rows are the source of truth and parent id
/// lists are derived, here both sides of every parent/child link are stored
/// and every write updates both in the same critical section.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntityRepository, EntityStore, StoreError, StoreResult};
use crate::models::project::DEFAULT_BACKGROUND;
use crate::models::{
    Comment, CreateComment, CreateProject, CreateSection, CreateTag, CreateTask, CreateUser,
    Project, Section, Tag, Task, UpdateSection, UpdateTag, UpdateTask, User,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    sections: HashMap<Uuid, Section>,
    tasks: HashMap<Uuid, Task>,
    tags: HashMap<Uuid, Tag>,
    comments: HashMap<Uuid, Comment>,
}

fn pick<T: Clone>(map: &HashMap<Uuid, T>, ids: &[Uuid]) -> Vec<T> {
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

impl State {
    fn unlink_tags(&mut self, task_id: Uuid, tag_ids: &[Uuid]) {
        for tag_id in tag_ids {
            if let Some(tag) = self.tags.get_mut(tag_id) {
                tag.tasks.retain(|id| *id != task_id);
            }
        }
    }

    fn link_tags(&mut self, task_id: Uuid, tag_ids: &[Uuid]) {
        for tag_id in tag_ids {
            if let Some(tag) = self.tags.get_mut(tag_id) {
                if !tag.tasks.contains(&task_id) {
                    tag.tasks.push(task_id);
                }
            }
        }
    }

    /// Removes a task and everything hanging off it, but not its section link
    fn remove_task(&mut self, task_id: Uuid) -> Option<Task> {
        let task = self.tasks.remove(&task_id)?;

        for comment_id in &task.comments {
            self.comments.remove(comment_id);
        }
        self.unlink_tags(task_id, &task.tags);

        Some(task)
    }
}

/// Entity store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a project record without touching anything that references it
    #[cfg(test)]
    pub(crate) async fn detach_project(&self, id: Uuid) {
        self.state.write().await.projects.remove(&id);
    }

    /// Drops a section record without touching anything that references it
    #[cfg(test)]
    pub(crate) async fn detach_section(&self, id: Uuid) {
        self.state.write().await.sections.remove(&id);
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_project_by_id(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn find_section_by_id(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(self.state.read().await.sections.get(&id).cloned())
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn find_tag_by_id(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        Ok(self.state.read().await.tags.get(&id).cloned())
    }

    async fn find_comment_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn find_projects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Project>> {
        Ok(pick(&self.state.read().await.projects, ids))
    }

    async fn find_sections_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Section>> {
        Ok(pick(&self.state.read().await.sections, ids))
    }

    async fn find_tasks_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        Ok(pick(&self.state.read().await.tasks, ids))
    }

    async fn find_tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        Ok(pick(&self.state.read().await.tags, ids))
    }

    async fn find_comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        Ok(pick(&self.state.read().await.comments, ids))
    }
}

#[async_trait]
impl EntityRepository for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        let taken = state
            .users
            .values()
            .any(|u| u.username.to_lowercase() == data.username.to_lowercase());
        if taken {
            return Err(StoreError::Duplicate("username".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            projects: Vec::new(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let wanted = username.to_lowercase();
        let state = self.state.read().await;

        Ok(state
            .users
            .values()
            .find(|u| u.username.to_lowercase() == wanted)
            .cloned())
    }

    async fn create_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
    ) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;
        let State {
            users,
            projects,
            sections,
            ..
        } = &mut *state;

        let Some(owner) = users.get_mut(&owner_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            background: data
                .background
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
            members: vec![owner_id],
            sections: Vec::new(),
            tags: Vec::new(),
            created_at: now,
        };

        for (position, data) in data.sections.into_iter().enumerate() {
            let section = Section {
                id: Uuid::new_v4(),
                project_id: project.id,
                name: data.name,
                colour: data.colour,
                icon: data.icon,
                position: position as i32,
                tasks: Vec::new(),
                created_at: now,
            };
            project.sections.push(section.id);
            sections.insert(section.id, section);
        }

        owner.projects.push(project.id);
        projects.insert(project.id, project.clone());

        Ok(Some(project))
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let state = self.state.read().await;

        Ok(state
            .users
            .get(&user_id)
            .map(|user| pick(&state.projects, &user.projects))
            .unwrap_or_default())
    }

    async fn add_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;
        let State {
            users, projects, ..
        } = &mut *state;

        let (Some(project), Some(user)) = (projects.get_mut(&project_id), users.get_mut(&user_id))
        else {
            return Ok(None);
        };

        if !project.has_member(user_id) {
            project.members.push(user_id);
            user.projects.push(project_id);
        }

        Ok(Some(project.clone()))
    }

    async fn create_sections(
        &self,
        project_id: Uuid,
        sections: Vec<CreateSection>,
    ) -> StoreResult<Option<Vec<Section>>> {
        let mut state = self.state.write().await;
        let State {
            projects,
            sections: stored,
            ..
        } = &mut *state;

        let Some(project) = projects.get_mut(&project_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let first_position = stored
            .values()
            .filter(|s| s.project_id == project_id)
            .map(|s| s.position + 1)
            .max()
            .unwrap_or(0);

        let mut created = Vec::with_capacity(sections.len());
        for (offset, data) in sections.into_iter().enumerate() {
            let section = Section {
                id: Uuid::new_v4(),
                project_id,
                name: data.name,
                colour: data.colour,
                icon: data.icon,
                position: first_position + offset as i32,
                tasks: Vec::new(),
                created_at: now,
            };
            project.sections.push(section.id);
            stored.insert(section.id, section.clone());
            created.push(section);
        }

        Ok(Some(created))
    }

    async fn list_sections(&self, project_id: Uuid) -> StoreResult<Vec<Section>> {
        let state = self.state.read().await;

        Ok(state
            .projects
            .get(&project_id)
            .map(|project| pick(&state.sections, &project.sections))
            .unwrap_or_default())
    }

    async fn update_section(
        &self,
        id: Uuid,
        data: UpdateSection,
    ) -> StoreResult<Option<Section>> {
        let mut state = self.state.write().await;

        let Some(section) = state.sections.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            section.name = name;
        }
        if let Some(colour) = data.colour {
            section.colour = colour;
        }
        if let Some(icon) = data.icon {
            section.icon = icon;
        }

        Ok(Some(section.clone()))
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        let mut state = self.state.write().await;

        let Some(section) = state.sections.remove(&id) else {
            return Ok(None);
        };

        if let Some(project) = state.projects.get_mut(&section.project_id) {
            project.sections.retain(|s| *s != id);
        }
        for task_id in &section.tasks {
            state.remove_task(*task_id);
        }

        Ok(Some(section))
    }

    async fn create_task(&self, section_id: Uuid, data: CreateTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let Some(section) = state.sections.get_mut(&section_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut tags = Vec::with_capacity(data.tags.len());
        for tag_id in data.tags {
            if !tags.contains(&tag_id) {
                tags.push(tag_id);
            }
        }

        let task = Task {
            id: Uuid::new_v4(),
            section_id,
            name: data.name,
            description: data.description,
            status: data.status.unwrap_or_default(),
            due_date: data.due_date,
            assignee_id: data.assignee_id,
            tags,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        section.tasks.push(task.id);
        state.link_tags(task.id, &task.tags);
        state.tasks.insert(task.id, task.clone());

        Ok(Some(task))
    }

    async fn list_tasks(&self, section_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;

        Ok(state
            .sections
            .get(&section_id)
            .map(|section| pick(&state.tasks, &section.tasks))
            .unwrap_or_default())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let Some(mut task) = state.tasks.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            task.name = name;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(status) = data.status {
            task.status = status;
        }
        if let Some(due_date) = data.due_date {
            task.due_date = due_date;
        }
        if let Some(assignee_id) = data.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(new_tags) = data.tags {
            state.unlink_tags(id, &task.tags);
            task.tags.clear();
            for tag_id in new_tags {
                if !task.tags.contains(&tag_id) {
                    task.tags.push(tag_id);
                }
            }
            state.link_tags(id, &task.tags);
        }
        task.updated_at = Utc::now();

        state.tasks.insert(id, task.clone());

        Ok(Some(task))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let Some(task) = state.remove_task(id) else {
            return Ok(None);
        };

        if let Some(section) = state.sections.get_mut(&task.section_id) {
            section.tasks.retain(|t| *t != id);
        }

        Ok(Some(task))
    }

    async fn create_tag(&self, project_id: Uuid, data: CreateTag) -> StoreResult<Option<Tag>> {
        let mut state = self.state.write().await;

        let Some(project) = state.projects.get_mut(&project_id) else {
            return Ok(None);
        };

        let tag = Tag {
            id: Uuid::new_v4(),
            project_id,
            name: data.name,
            colour: data.colour,
            tasks: Vec::new(),
            created_at: Utc::now(),
        };
        project.tags.push(tag.id);
        state.tags.insert(tag.id, tag.clone());

        Ok(Some(tag))
    }

    async fn update_tag(&self, id: Uuid, data: UpdateTag) -> StoreResult<Option<Tag>> {
        let mut state = self.state.write().await;

        let Some(tag) = state.tags.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            tag.name = name;
        }
        if let Some(colour) = data.colour {
            tag.colour = colour;
        }

        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        let mut state = self.state.write().await;

        let Some(tag) = state.tags.remove(&id) else {
            return Ok(None);
        };

        if let Some(project) = state.projects.get_mut(&tag.project_id) {
            project.tags.retain(|t| *t != id);
        }
        for task_id in &tag.tasks {
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.tags.retain(|t| *t != id);
            }
        }

        Ok(Some(tag))
    }

    async fn create_comment(
        &self,
        task_id: Uuid,
        data: CreateComment,
    ) -> StoreResult<Option<Comment>> {
        let mut state = self.state.write().await;

        let Some(task) = state.tasks.get_mut(&task_id) else {
            return Ok(None);
        };

        let comment = Comment {
            id: Uuid::new_v4(),
            task_id,
            owner_id: data.owner_id,
            text: data.text,
            created_at: Utc::now(),
        };
        task.comments.push(comment.id);
        state.comments.insert(comment.id, comment.clone());

        Ok(Some(comment))
    }
}
