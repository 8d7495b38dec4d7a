use crate::task::Task;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.id.trim().is_empty() {
        return Err(TaskValidationError::new("task id must not be empty"));
    }

    for figure in [task.low, task.likely, task.high] {
        if !figure.is_finite() {
            return Err(TaskValidationError::new(format!(
                "task {} has a non-finite duration estimate",
                task.id
            )));
        }
        if figure < 0.0 {
            return Err(TaskValidationError::new(format!(
                "task {} has a negative duration estimate {}",
                task.id, figure
            )));
        }
    }

    if task.low > task.likely || task.likely > task.high {
        return Err(TaskValidationError::new(format!(
            "task {} estimates must satisfy low <= likely <= high (got {}/{}/{})",
            task.id, task.low, task.likely, task.high
        )));
    }

    if task.done_date.is_some() && !task.done {
        return Err(TaskValidationError::new(format!(
            "task {} has a completion date but is not marked done",
            task.id
        )));
    }

    for pred in &task.predecessors {
        if pred.trim().is_empty() {
            return Err(TaskValidationError::new(format!(
                "task {} has an empty predecessor id",
                task.id
            )));
        }
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id.as_str()) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}
