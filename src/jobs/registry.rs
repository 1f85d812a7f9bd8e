use std::collections::HashSet;
use std::sync::Arc;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::models::JobDefinition;
use crate::jobs::types::JobTask;

/// Jobs to be scheduled, each paired with the task it runs
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<(JobDefinition, Arc<dyn JobTask>)>,
    names: HashSet<String>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. Job names must be unique.
    pub fn register(
        &mut self,
        definition: JobDefinition,
        task: Arc<dyn JobTask>,
    ) -> JobResult<&mut Self> {
        if !self.names.insert(definition.job_name.clone()) {
            return Err(JobError::AlreadyExists(definition.job_name));
        }

        self.jobs.push((definition, task));
        Ok(self)
    }

    pub fn jobs(&self) -> impl Iterator<Item = (&JobDefinition, &Arc<dyn JobTask>)> {
        self.jobs.iter().map(|(definition, task)| (definition, task))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::JobsConfig;
    use crate::error::AppResult;
    use crate::jobs::types::JobContext;

    #[derive(Debug)]
    struct NoopTask;

    #[async_trait]
    impl JobTask for NoopTask {
        fn task_type() -> &'static str {
            "noop"
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let jobs = JobsConfig::default();
        let mut registry = JobRegistry::new();

        registry
            .register(JobDefinition::new("noop", "0 * * * * *", &jobs), Arc::new(NoopTask))
            .unwrap();
        let err = registry
            .register(JobDefinition::new("noop", "30 * * * * *", &jobs), Arc::new(NoopTask))
            .err()
            .unwrap();

        assert!(matches!(err, JobError::AlreadyExists(name) if name == "noop"));
        assert_eq!(registry.len(), 1);
    }
}
