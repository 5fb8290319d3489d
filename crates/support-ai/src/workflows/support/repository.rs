use super::domain::{ApplicationId, ApplicationState};

/// Storage abstraction so the orchestrator and service can be exercised in
/// isolation. Implementations must provide atomic whole-record saves.
pub trait StateRepository: Send + Sync {
    fn save(&self, state: &ApplicationState) -> Result<(), RepositoryError>;
    fn load(&self, id: &ApplicationId) -> Result<Option<ApplicationState>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("application state not found")]
    NotFound,
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}
