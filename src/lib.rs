// TodoStore - a small to-do list with pluggable key-value persistence

pub mod codec;
pub mod config;
pub mod filter;
pub mod storage;
pub mod store;
pub mod todo;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use filter::TodoFilter;
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::{Change, OnCorrupt, TodoStore};
pub use todo::{IdGenerator, Todo, TodoId, now_ms};
