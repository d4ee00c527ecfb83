pub mod core;
pub mod store;
pub mod types;

pub use self::core::{DaemonCore, DaemonHandle};
pub use store::{InMemoryTaskStore, TaskStore};
pub use types::{DaemonCommand, QueuedTask, TaskState};
