use super::transitions::Workflow;
use shared_types::ContainerStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// `current` does not permit `workflow`.
    #[error("{workflow} is not allowed from status {current}")]
    InvalidTransition {
        workflow: Workflow,
        current: ContainerStatus,
    },
}
