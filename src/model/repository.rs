use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{error, info, warn};

use super::task::{Task, TaskDraft, TaskId, TaskPatch, TaskPriority};
use crate::error::RepositoryError;
use crate::io::store::Store;

/// What changed in a repository mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Added(TaskId),
    Updated(TaskId),
    /// The deleted task and every descendant removed with it.
    Deleted(Vec<TaskId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&TaskChange, &[Task])>;

/// The canonical, persisted list of tasks.
///
/// Every successful mutation writes the full list to the store exactly once
/// and then notifies each subscriber exactly once.
pub struct TaskRepository<S: Store> {
    tasks: Vec<Task>,
    store: S,
    key: String,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl<S: Store> TaskRepository<S> {
    /// Load from the store, seeding example tasks for today if nothing is stored.
    pub fn open(store: S, key: impl Into<String>) -> Self {
        let today = chrono::Local::now().date_naive();
        Self::open_with_seed(store, key, || default_tasks(today))
    }

    pub fn open_with_seed(store: S, key: impl Into<String>, seed: impl FnOnce() -> Vec<Task>) -> Self {
        let key = key.into();
        let mut repo = Self {
            tasks: Vec::new(),
            store,
            key,
            observers: Vec::new(),
            next_subscription: 0,
        };
        match repo.store.load::<Vec<Task>>(&repo.key) {
            Some(tasks) => {
                repo.tasks = tasks;
                repo.repair_parents();
                info!("loaded {} tasks", repo.tasks.len());
            }
            None => {
                repo.tasks = seed();
                info!("no saved tasks, seeded {} defaults", repo.tasks.len());
                repo.persist();
            }
        }
        repo
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn get_all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get_root_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.parent_id.is_none()).collect()
    }

    pub fn get_children(&self, parent_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.parent_id.as_deref() == Some(parent_id))
            .collect()
    }

    /// Ids of every task below `id`, nearest first. `id` itself is excluded.
    pub fn descendants(&self, id: &str) -> Vec<TaskId> {
        let mut seen = HashSet::from([id]);
        let mut found: Vec<&str> = Vec::new();
        let mut next = 0;
        let mut current = id;
        loop {
            for task in &self.tasks {
                if task.parent_id.as_deref() == Some(current) && seen.insert(task.id.as_str()) {
                    found.push(&task.id);
                }
            }
            match found.get(next) {
                Some(child) => current = *child,
                None => break,
            }
            next += 1;
        }
        found.into_iter().map(str::to_string).collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.tasks.iter().filter(|t| t.matches(&needle)).collect()
    }

    // ── Mutations ───────────────────────────────────────────────

    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, RepositoryError> {
        check_interval(draft.start, draft.end)?;
        if let Some(parent) = &draft.parent_id {
            if self.get_by_id(parent).is_none() {
                return Err(RepositoryError::ParentNotFound(parent.clone()));
            }
        }

        let task = Task::from_draft(draft);
        info!("add task '{}' ({})", task.name, task.id);
        self.tasks.push(task.clone());
        self.commit(TaskChange::Added(task.id.clone()));
        Ok(task)
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, RepositoryError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RepositoryError::TaskNotFound(id.to_string()))?;

        let mut updated = self.tasks[index].clone();
        updated.apply(patch);
        check_interval(updated.start, updated.end)?;
        if let Some(parent) = &updated.parent_id {
            self.check_parent(id, parent)?;
        }

        info!("update task '{}' ({})", updated.name, updated.id);
        self.tasks[index] = updated.clone();
        self.commit(TaskChange::Updated(updated.id.clone()));
        Ok(updated)
    }

    /// Delete a task and, first, all of its descendants. Returns the removed ids.
    pub fn delete(&mut self, id: &str) -> Result<Vec<TaskId>, RepositoryError> {
        let task = self
            .get_by_id(id)
            .ok_or_else(|| RepositoryError::TaskNotFound(id.to_string()))?;
        info!("delete task '{}' ({})", task.name, task.id);

        // Deepest first, the task itself last.
        let mut removed = self.descendants(id);
        removed.reverse();
        removed.push(id.to_string());
        let doomed: HashSet<&str> = removed.iter().map(String::as_str).collect();
        self.tasks.retain(|t| !doomed.contains(t.id.as_str()));
        self.commit(TaskChange::Deleted(removed.clone()));
        Ok(removed)
    }

    // ── Subscriptions ───────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&TaskChange, &[Task]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    // ── Internals ───────────────────────────────────────────────

    fn check_parent(&self, id: &str, parent: &str) -> Result<(), RepositoryError> {
        if self.get_by_id(parent).is_none() {
            return Err(RepositoryError::ParentNotFound(parent.to_string()));
        }
        if self.ancestry_reaches(parent, id) {
            return Err(RepositoryError::InvalidParent {
                task: id.to_string(),
                parent: parent.to_string(),
            });
        }
        Ok(())
    }

    /// Whether walking up the parent chain from `from` (inclusive) hits `target`.
    /// The walk is bounded by the task count, so a cycle elsewhere ends it.
    fn ancestry_reaches(&self, from: &str, target: &str) -> bool {
        let mut cursor = Some(from);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == target {
                return true;
            }
            steps += 1;
            if steps > self.tasks.len() {
                return false;
            }
            cursor = self.get_by_id(current).and_then(|t| t.parent_id.as_deref());
        }
        false
    }

    /// Detach parent links that point at missing tasks or lead back to the task itself.
    fn repair_parents(&mut self) {
        let ids: HashSet<TaskId> = self.tasks.iter().map(|t| t.id.clone()).collect();
        for task in &mut self.tasks {
            if let Some(parent) = &task.parent_id {
                if !ids.contains(parent) {
                    warn!("task '{}' references missing parent {}, detaching", task.name, parent);
                    task.parent_id = None;
                }
            }
        }

        // One pass suffices: once a cycle member is detached, the rest of that
        // cycle no longer reaches itself.
        for index in 0..self.tasks.len() {
            let task = &self.tasks[index];
            let cyclic = task
                .parent_id
                .as_deref()
                .is_some_and(|parent| self.ancestry_reaches(parent, &task.id));
            if cyclic {
                let task = &mut self.tasks[index];
                warn!(
                    "task '{}' is its own ancestor via parent {:?}, detaching",
                    task.name, task.parent_id
                );
                task.parent_id = None;
            }
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.key, &self.tasks) {
            error!("failed to persist tasks: {}", e);
        }
    }

    fn commit(&mut self, change: TaskChange) {
        self.persist();
        for (_, observer) in &mut self.observers {
            observer(&change, &self.tasks);
        }
    }
}

fn check_interval(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), RepositoryError> {
    if end < start {
        return Err(RepositoryError::InvalidInterval { start, end });
    }
    Ok(())
}

/// Example tasks shown on first launch.
pub fn default_tasks(today: NaiveDate) -> Vec<Task> {
    let at = |hour: u32| today.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default());
    let seed = |name: &str, from: u32, to: u32, description: &str, priority, color: &str| {
        let mut draft = TaskDraft::new(name, at(from), at(to)).with_description(description);
        draft.priority = priority;
        draft.color = color.to_string();
        Task::from_draft(draft)
    };

    vec![
        seed("Morning standup", 9, 11, "Team sync", TaskPriority::High, "#3498db"),
        seed("Project development", 14, 18, "Write code", TaskPriority::Medium, "#2ecc71"),
        seed("Code review", 19, 20, "Review open changes", TaskPriority::Medium, "#9b59b6"),
    ]
}
