pub mod error;
pub mod executor;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod tasks;
pub mod types;

pub use error::{JobError, JobResult};
pub use executor::{ConcurrencyTracker, JobExecutor};
pub use models::JobDefinition;
pub use registry::JobRegistry;
pub use scheduler::JobScheduler;
pub use tasks::ProximityAlertTask;
pub use types::{JobContext, JobTask};
