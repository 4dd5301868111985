//! Pollable handles for asynchronous deep analyses.

use std::time::Duration;

use faro_types::{TaskInfo, TaskStatus};
use moka::sync::Cache;
use uuid::Uuid;

/// TTL-bounded registry of task handles.
///
/// Deep analyses respond immediately with a pending handle; pollers read the
/// handle back until it expires.
pub struct TaskRegistry {
    tasks: Cache<String, TaskInfo>,
}

impl TaskRegistry {
    /// Registry whose handles live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            tasks: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Registry with the default 5-minute handle TTL.
    #[must_use]
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(300))
    }

    /// Fresh task id in the `analysis-{symbol}-{suffix}` shape.
    #[must_use]
    pub fn new_task_id(symbol: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("analysis-{}-{}", symbol.to_lowercase(), &suffix[..8])
    }

    /// Track a task.
    pub fn register(&self, task: TaskInfo) {
        self.tasks.insert(task.id.clone(), task);
    }

    /// Read a live task handle.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<TaskInfo> {
        self.tasks.get(id)
    }

    /// Update status and progress; `false` when the handle expired.
    pub fn update(&self, id: &str, status: TaskStatus, progress: f64) -> bool {
        match self.tasks.get(id) {
            Some(mut task) => {
                task.status = status;
                task.progress = progress.clamp(0.0, 1.0);
                self.tasks.insert(id.to_string(), task);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_get_update_roundtrip() {
        let registry = TaskRegistry::with_default_ttl();
        let id = TaskRegistry::new_task_id("AAPL");
        assert!(id.starts_with("analysis-aapl-"));

        registry.register(TaskInfo::pending(id.clone(), "equity_analysis", 30));
        let task = registry.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.resource_url, format!("faro://task/{id}"));

        assert!(registry.update(&id, TaskStatus::Running, 0.4));
        let task = registry.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert!((task.progress - 0.4).abs() < f64::EPSILON);

        assert!(!registry.update("missing", TaskStatus::Failed, 0.0));
    }

    #[test]
    fn handles_expire() {
        let registry = TaskRegistry::new(Duration::from_millis(20));
        registry.register(TaskInfo::pending("t1", "equity_analysis", 5));
        assert!(registry.get("t1").is_some());
        std::thread::sleep(Duration::from_millis(40));
        assert!(registry.get("t1").is_none());
    }
}
