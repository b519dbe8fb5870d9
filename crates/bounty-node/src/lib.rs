pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod node;
pub mod storage;

pub use api::AppState;
pub use config::NodeConfig;
pub use storage::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
