//! The domain entity persisted by the dual-store core.

use uuid::Uuid;

/// Lifecycle state of a [`Task`]. Defaults to [`TaskState::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// A task managed by the service. Mutated by overwriting all fields via [`Task::save`]
/// call sites — there is no partial-update operation at the repository port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: Uuid,
    title: String,
    description: Option<String>,
    state: TaskState,
}

/// A [`Task`] field failed validation. Always a [`crate::error::RepoError::Logic`]
/// error — never retried, never counted against a circuit breaker.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TaskValidationError {
    #[error("task title must not be empty")]
    EmptyTitle,
}

impl Task {
    /// Builds a new task with a freshly generated id and [`TaskState::Pending`].
    ///
    /// Returns [`TaskValidationError::EmptyTitle`] for a blank or whitespace-only
    /// title.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Result<Self, TaskValidationError> {
        Self::with_id(Uuid::new_v4(), title, description, TaskState::default())
    }

    /// Builds a task with an explicit id and state, e.g. when reconstructing one read
    /// back from a store adapter.
    pub fn with_id(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        state: TaskState,
    ) -> Result<Self, TaskValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description,
            state,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults_to_pending() {
        let task = Task::new("write the spec", None).unwrap();
        assert_eq!(task.state(), TaskState::Pending);
        assert_eq!(task.title(), "write the spec");
        assert_eq!(task.description(), None);
    }

    #[test]
    fn empty_title_is_rejected() {
        assert_eq!(Task::new("   ", None).unwrap_err(), TaskValidationError::EmptyTitle);
    }

    #[test]
    fn with_id_preserves_the_given_id_and_state() {
        let id = Uuid::new_v4();
        let task = Task::with_id(id, "t", None, TaskState::Completed).unwrap();
        assert_eq!(task.id(), id);
        assert_eq!(task.state(), TaskState::Completed);
    }
}
