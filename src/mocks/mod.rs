//! In-memory implementations of the repository and collaborator traits for
//! unit and integration tests.

mod gateway;
mod notifier;
mod repositories;

pub use gateway::MockGateway;
pub use notifier::RecordingNotifier;
pub use repositories::InMemoryStore;
